// Wipe targets: single files, directory trees, raw devices

pub mod device;
pub mod directory;
pub mod file;

pub use device::{DeviceWipeOperation, DeviceWipeOutcome};
pub use directory::{BatchGauge, DirectoryWipeScheduler, TaskSpan};
pub use file::{FileWipeOperation, FileWipeOutcome};
