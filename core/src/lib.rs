// Allow complex types where needed for report and scheduler plumbing
#![allow(clippy::type_complexity)]

pub mod algorithms;
pub mod config;
pub mod error;
pub mod io;
pub mod report;
pub mod targets;
pub mod ui;
pub mod verification;
pub mod wipe_orchestrator;

// Re-export the main entry points for convenience
pub use algorithms::{schedule_for, Pattern, ScheduledPass, WipeMethod};
pub use config::EngineConfig;
pub use error::{ErrorClass, WipeError, WipeResult};
pub use io::{PatternBufferPool, RandomBuffer};
pub use report::{TreeReport, WipeReport};
pub use targets::{DeviceWipeOperation, DirectoryWipeScheduler, FileWipeOperation};
pub use wipe_orchestrator::{TargetKind, WipeOrchestrator};

/// Hard upper bound on concurrently active file wipes in directory mode.
pub const MAX_CONCURRENCY: usize = 64;

/// Default chunk size used by every overwrite pass (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;
