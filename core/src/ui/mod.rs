pub mod progress;


pub use progress::{human_bytes, ConsoleProgress, ProgressSink, SilentProgress};
