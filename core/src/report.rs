// Outcome reporting for wipe runs

use crate::algorithms::WipeMethod;
use crate::error::{ErrorClass, WipeError, WipeResult};
use crate::targets::{DeviceWipeOutcome, FileWipeOutcome};
use crate::wipe_orchestrator::TargetKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Everything a directory wipe did, including per-entry failures
#[derive(Debug, Default)]
pub struct TreeReport {
    pub root: PathBuf,
    pub files_wiped: usize,
    pub links_removed: usize,
    pub bytes_overwritten: u64,
    /// Removed directories, deepest first
    pub directories_removed: Vec<PathBuf>,
    /// Directories kept because something beneath them failed
    pub directories_retained: Vec<PathBuf>,
    pub errors: Vec<WipeError>,
}

impl TreeReport {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Default::default()
        }
    }

    /// True when the root and everything under it were removed
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn a report with failures into [`WipeError::TreeIncomplete`]
    pub fn into_result(self) -> WipeResult<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(WipeError::TreeIncomplete {
                path: self.root,
                failed_entries: self.errors.len(),
            })
        }
    }
}

/// Serializable record of a single failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub path: Option<PathBuf>,
    pub class: ErrorClass,
    pub message: String,
}

impl From<&WipeError> for FailureRecord {
    fn from(err: &WipeError) -> Self {
        Self {
            path: err.path().map(Path::to_path_buf),
            class: err.class(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipeStatus {
    Completed,
    /// Some entries of a tree remain
    Incomplete,
    Failed,
}

/// Summary of one orchestrated run, printed or emitted as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WipeReport {
    pub session_id: Uuid,
    pub target: PathBuf,
    pub kind: TargetKind,
    pub method: WipeMethod,
    pub passes: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: WipeStatus,
    pub bytes_overwritten: u64,
    pub files_wiped: usize,
    pub links_removed: usize,
    pub directories_removed: usize,
    pub verified: bool,
    pub failures: Vec<FailureRecord>,
}

impl WipeReport {
    pub fn begin(kind: TargetKind, target: &Path, method: WipeMethod) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            target: target.to_path_buf(),
            kind,
            method,
            passes: method.pass_count(),
            started_at: now,
            finished_at: now,
            status: WipeStatus::Completed,
            bytes_overwritten: 0,
            files_wiped: 0,
            links_removed: 0,
            directories_removed: 0,
            verified: false,
            failures: Vec::new(),
        }
    }

    pub fn record_file(&mut self, outcome: &FileWipeOutcome) {
        self.files_wiped += 1;
        self.bytes_overwritten += outcome.stats.bytes_written;
        self.verified = outcome.stats.verified;
    }

    pub fn record_device(&mut self, outcome: &DeviceWipeOutcome) {
        self.bytes_overwritten += outcome.stats.bytes_written;
        self.verified = outcome.stats.verified;
    }

    pub fn record_tree(&mut self, tree: &TreeReport) {
        self.files_wiped += tree.files_wiped;
        self.links_removed += tree.links_removed;
        self.bytes_overwritten += tree.bytes_overwritten;
        self.directories_removed += tree.directories_removed.len();
        self.failures.extend(tree.errors.iter().map(FailureRecord::from));
        if !tree.is_complete() {
            self.status = WipeStatus::Incomplete;
        }
    }

    pub fn record_failure(&mut self, err: &WipeError) {
        self.failures.push(FailureRecord::from(err));
        self.status = WipeStatus::Failed;
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == WipeStatus::Completed
    }

    /// Class that decides the exit code, `None` on success
    pub fn error_class(&self) -> Option<ErrorClass> {
        match self.status {
            WipeStatus::Completed => None,
            WipeStatus::Incomplete => Some(ErrorClass::Partial),
            WipeStatus::Failed => self.failures.first().map(|f| f.class),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.error_class().map(|c| c.exit_code()).unwrap_or(0)
    }

    pub fn elapsed(&self) -> std::time::Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
