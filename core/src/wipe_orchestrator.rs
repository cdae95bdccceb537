// Wipe Orchestrator - Routes a target to the file, folder or disk operation
//
// Owns the pattern buffer pool for the whole run: the pool is built before
// the first pass and torn down after the last worker has finished.

use crate::algorithms::WipeMethod;
use crate::config::EngineConfig;
use crate::error::WipeResult;
use crate::io::PatternBufferPool;
use crate::report::WipeReport;
use crate::targets::{DeviceWipeOperation, DirectoryWipeScheduler, FileWipeOperation};
use crate::ui::{ConsoleProgress, ProgressSink, SilentProgress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{error, info};

/// What kind of target a path names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    File,
    Folder,
    Disk,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::File => write!(f, "file"),
            TargetKind::Folder => write!(f, "folder"),
            TargetKind::Disk => write!(f, "disk"),
        }
    }
}

/// Main entry point for a wipe run
pub struct WipeOrchestrator {
    config: EngineConfig,
    pool: PatternBufferPool,
}

impl WipeOrchestrator {
    /// Validate the configuration and fill the pattern buffers
    pub fn new(config: EngineConfig) -> WipeResult<Self> {
        config.validate()?;
        let pool = PatternBufferPool::init(config.chunk_size)?;

        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &PatternBufferPool {
        &self.pool
    }

    /// Wipe one target and report what happened.
    ///
    /// Failures are captured in the report rather than returned, so the
    /// caller always gets timing and partial counts.
    pub fn execute(&self, kind: TargetKind, path: &Path, method: WipeMethod) -> WipeReport {
        info!(
            path = %path.display(),
            kind = %kind,
            method = %method,
            passes = method.pass_count(),
            "=== Starting Wipe Operation ==="
        );

        let progress = self.progress_for(kind);
        let mut report = WipeReport::begin(kind, path, method);

        match kind {
            TargetKind::File => {
                let result = FileWipeOperation::new(&self.pool)
                    .with_progress(progress.as_ref())
                    .scrub_names(self.config.scrub_names)
                    .verify(self.config.verify)
                    .wipe(path, method);
                match result {
                    Ok(outcome) => report.record_file(&outcome),
                    Err(e) => report.record_failure(&e),
                }
            }
            TargetKind::Folder => {
                let result = DirectoryWipeScheduler::new(&self.pool)
                    .with_progress(progress.as_ref())
                    .with_max_concurrency(self.config.max_concurrency)
                    .scrub_names(self.config.scrub_names)
                    .verify(self.config.verify)
                    .wipe_tree(path, method);
                match result {
                    Ok(tree) => report.record_tree(&tree),
                    Err(e) => report.record_failure(&e),
                }
            }
            TargetKind::Disk => {
                let result = DeviceWipeOperation::new(&self.pool)
                    .with_progress(progress.as_ref())
                    .verify(self.config.verify)
                    .wipe_device(path, method);
                match result {
                    Ok(outcome) => report.record_device(&outcome),
                    Err(e) => report.record_failure(&e),
                }
            }
        }

        let report = report.finish();
        match report.error_class() {
            None => info!(
                path = %path.display(),
                bytes = report.bytes_overwritten,
                elapsed = %humantime::format_duration(report.elapsed()),
                "wipe completed"
            ),
            Some(class) => error!(
                path = %path.display(),
                class = %class,
                failures = report.failures.len(),
                "wipe did not complete: {}",
                class.description()
            ),
        }
        report
    }

    /// Release the pattern buffers
    pub fn shutdown(self) {
        drop(self);
    }

    fn progress_for(&self, kind: TargetKind) -> Box<dyn ProgressSink> {
        if !self.config.progress || !cfg!(feature = "progress-bars") {
            return Box::new(SilentProgress);
        }
        match kind {
            TargetKind::Folder => Box::new(ConsoleProgress::for_tree()),
            TargetKind::File | TargetKind::Disk => Box::new(ConsoleProgress::for_passes()),
        }
    }
}

impl Drop for WipeOrchestrator {
    fn drop(&mut self) {
        self.pool.teardown();
    }
}

/// Build an orchestrator, wipe a single target, tear down
pub fn wipe_target(
    kind: TargetKind,
    path: &Path,
    method: WipeMethod,
    config: EngineConfig,
) -> WipeResult<WipeReport> {
    let orchestrator = WipeOrchestrator::new(config)?;
    let report = orchestrator.execute(kind, path, method);
    orchestrator.shutdown();
    Ok(report)
}
