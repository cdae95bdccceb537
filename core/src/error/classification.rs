/// Error classification by data state
///
/// A caller deciding whether to retry or alert needs to know what is left on
/// disk, not which syscall failed. Each [`WipeError`] therefore maps to one of
/// four classes, and the class decides the process exit code.
use super::WipeError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Nothing was modified (bad method, open/size failure, setup problem)
    Rejected,

    /// A pass started but did not complete and flush; wipe status unknown,
    /// rerun from pass 1
    OverwriteIncomplete,

    /// Data is destroyed but the directory entry is still present
    EntryRemains,

    /// Some entries of a tree were wiped, others were not
    Partial,
}

impl ErrorClass {
    pub fn of(err: &WipeError) -> Self {
        match err {
            WipeError::Open { .. }
            | WipeError::Permission { .. }
            | WipeError::Size { .. }
            | WipeError::UnsupportedMethod(_)
            | WipeError::PoolNotInitialized
            | WipeError::Allocation(_)
            | WipeError::UnsupportedEntry { .. }
            | WipeError::WorkerSpawn { .. }
            | WipeError::Config(_) => ErrorClass::Rejected,
            WipeError::Io { .. }
            | WipeError::VerificationFailed { .. }
            | WipeError::WorkerPanicked { .. } => ErrorClass::OverwriteIncomplete,
            WipeError::Delete { .. } | WipeError::RemoveDir { .. } => ErrorClass::EntryRemains,
            WipeError::TreeIncomplete { .. } => ErrorClass::Partial,
        }
    }

    /// Human-readable description of the data state
    pub fn description(&self) -> &'static str {
        match self {
            ErrorClass::Rejected => "target was not modified",
            ErrorClass::OverwriteIncomplete => "wipe status unknown; rerun from pass 1",
            ErrorClass::EntryRemains => "data destroyed but the entry still exists",
            ErrorClass::Partial => "tree partially wiped; failed entries remain",
        }
    }

    /// Process exit code for a run that ended with this class
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorClass::Rejected => 2,
            ErrorClass::OverwriteIncomplete => 3,
            ErrorClass::EntryRemains => 4,
            ErrorClass::Partial => 5,
        }
    }

    /// Whether rerunning the whole operation from pass 1 may succeed
    pub fn rerun_may_help(&self) -> bool {
        !matches!(self, ErrorClass::Rejected)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Rejected => write!(f, "Rejected"),
            ErrorClass::OverwriteIncomplete => write!(f, "OverwriteIncomplete"),
            ErrorClass::EntryRemains => write!(f, "EntryRemains"),
            ErrorClass::Partial => write!(f, "Partial"),
        }
    }
}
