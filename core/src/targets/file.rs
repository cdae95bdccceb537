// Single-file wipe: open, overwrite in place, scrub the name, delete

use crate::algorithms::{schedule_for, WipeMethod};
use crate::error::{WipeError, WipeResult};
use crate::io::{open_read_write, FileSink, OverwritePass, PassStats, PatternBufferPool};
use crate::ui::progress::SILENT;
use crate::ui::ProgressSink;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Shortest generated replacement name
const MIN_SCRUB_NAME_LEN: usize = 8;
const SCRUB_RENAME_ATTEMPTS: usize = 3;

/// What a completed file wipe did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWipeOutcome {
    pub path: PathBuf,
    pub size: u64,
    pub passes_completed: usize,
    pub stats: PassStats,
}

/// Wipes one regular file and removes it
pub struct FileWipeOperation<'a> {
    pool: &'a PatternBufferPool,
    progress: &'a dyn ProgressSink,
    scrub_names: bool,
    verify: bool,
}

impl<'a> FileWipeOperation<'a> {
    pub fn new(pool: &'a PatternBufferPool) -> Self {
        Self {
            pool,
            progress: &SILENT,
            scrub_names: true,
            verify: false,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn scrub_names(mut self, enabled: bool) -> Self {
        self.scrub_names = enabled;
        self
    }

    pub fn verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Run every pass of `method` over `path`, then delete it.
    ///
    /// The file keeps its length during the passes. Deletion happens only
    /// after the last pass has been flushed and the handle closed. A
    /// zero-length file is deleted without any passes.
    pub fn wipe(&self, path: &Path, method: WipeMethod) -> WipeResult<FileWipeOutcome> {
        let metadata = fs::metadata(path).map_err(|source| WipeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(WipeError::UnsupportedEntry {
                path: path.to_path_buf(),
            });
        }

        let file = open_read_write(path).map_err(|source| WipeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut sink = FileSink::new(file);

        let size = sink.size_by_seek().map_err(|source| WipeError::Size {
            path: path.to_path_buf(),
            source,
        })?;

        let mut total = PassStats::default();
        let mut passes_completed = 0;

        if size == 0 {
            debug!(path = %path.display(), "empty file, deleting without passes");
        } else {
            let mut runner = OverwritePass::new(self.pool, self.progress).verify_final(self.verify);
            for pass in schedule_for(method) {
                let stats = runner.run(&mut sink, path, method, &pass, size)?;
                total.accumulate(&stats);
                passes_completed += 1;
            }
        }

        let file = sink.into_inner();
        let delete_path = if self.scrub_names {
            scrub(file, path)
        } else {
            drop(file);
            path.to_path_buf()
        };

        delete_entry(path, &delete_path)?;

        info!(
            path = %path.display(),
            method = %method,
            passes = passes_completed,
            bytes = total.bytes_written,
            "file wiped and deleted"
        );

        Ok(FileWipeOutcome {
            path: path.to_path_buf(),
            size,
            passes_completed,
            stats: total,
        })
    }
}

/// Unlink the wiped file under its current name.
///
/// A failure names `current`, the entry actually left on disk, which differs
/// from `original` once the name was scrubbed.
fn delete_entry(original: &Path, current: &Path) -> WipeResult<()> {
    fs::remove_file(current).map_err(|source| {
        if current != original {
            warn!(
                original = %original.display(),
                remains = %current.display(),
                "scrubbed file could not be deleted"
            );
        }
        WipeError::Delete {
            path: current.to_path_buf(),
            source,
        }
    })
}

/// Truncate the closed file and give it a meaningless name.
///
/// Both steps are best effort: on failure the returned path is whatever name
/// the file currently has, so deletion still targets the right entry.
fn scrub(file: File, path: &Path) -> PathBuf {
    if let Err(e) = file.set_len(0).and_then(|_| file.sync_all()) {
        warn!(path = %path.display(), error = %e, "truncate before delete failed");
    }
    drop(file);

    let Some(parent) = path.parent() else {
        return path.to_path_buf();
    };
    let name_len = path
        .file_name()
        .map(|n| n.len())
        .unwrap_or(0)
        .max(MIN_SCRUB_NAME_LEN);

    for _ in 0..SCRUB_RENAME_ATTEMPTS {
        let candidate = parent.join(random_name(name_len));
        if candidate.exists() {
            continue;
        }
        match fs::rename(path, &candidate) {
            Ok(()) => {
                debug!(from = %path.display(), to = %candidate.display(), "renamed before delete");
                return candidate;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "rename before delete failed");
                return path.to_path_buf();
            }
        }
    }

    path.to_path_buf()
}

fn random_name(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect()
}
