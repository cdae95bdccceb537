/// Error taxonomy for the wipe engine
///
/// Every failure is surfaced to the immediate caller with enough context
/// (path, pass index, method) to report it precisely. Nothing is retried
/// automatically: partial-pass state is not resumable, so a caller that wants
/// a retry must rerun the whole file/device operation from pass 1.
///
/// ```text
///   open ──► size ──► pass 1 … pass N ──► close ──► delete
///    │        │          │                           │
///  Open     Size        Io / VerificationFailed    Delete
/// ```
///
/// [`ErrorClass`] groups the variants by what they mean for the data on disk,
/// which is what retry and alerting policy care about.
pub mod classification;

pub use classification::ErrorClass;

use crate::algorithms::WipeMethod;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WipeError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("insufficient privileges to open {} (run as root): {source}", .path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot determine size of {}: {source}", .path.display())]
    Size {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed on {} during pass {pass}/{total_passes} ({method}): {source}", .path.display())]
    Io {
        path: PathBuf,
        method: WipeMethod,
        pass: usize,
        total_passes: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("{} was overwritten but could not be deleted: {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported wipe method '{0}' (expected --clear, --purge or --destroy-sw)")]
    UnsupportedMethod(String),

    #[error("pattern buffer pool is not initialized")]
    PoolNotInitialized,

    #[error("buffer allocation failed: {0}")]
    Allocation(String),

    #[error("read-back of {} after pass {pass} differs at offset {offset}", .path.display())]
    VerificationFailed {
        path: PathBuf,
        pass: usize,
        offset: u64,
    },

    #[error("{} is not a regular file; refusing to overwrite it", .path.display())]
    UnsupportedEntry { path: PathBuf },

    #[error("worker wiping {} panicked", .path.display())]
    WorkerPanicked { path: PathBuf },

    #[error("could not start a worker for {}; file left untouched: {source}", .path.display())]
    WorkerSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot remove directory {}: {source}", .path.display())]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} not fully removed ({failed_entries} failed entries)", .path.display())]
    TreeIncomplete { path: PathBuf, failed_entries: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WipeError {
    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            WipeError::Open { path, .. }
            | WipeError::Permission { path, .. }
            | WipeError::Size { path, .. }
            | WipeError::Io { path, .. }
            | WipeError::Delete { path, .. }
            | WipeError::VerificationFailed { path, .. }
            | WipeError::UnsupportedEntry { path }
            | WipeError::WorkerPanicked { path }
            | WipeError::WorkerSpawn { path, .. }
            | WipeError::RemoveDir { path, .. }
            | WipeError::TreeIncomplete { path, .. } => Some(path),
            WipeError::UnsupportedMethod(_)
            | WipeError::PoolNotInitialized
            | WipeError::Allocation(_)
            | WipeError::Config(_) => None,
        }
    }

    /// What this failure means for the data on disk
    pub fn class(&self) -> ErrorClass {
        ErrorClass::of(self)
    }
}

impl From<config::ConfigError> for WipeError {
    fn from(err: config::ConfigError) -> Self {
        WipeError::Config(err.to_string())
    }
}

pub type WipeResult<T> = Result<T, WipeError>;
