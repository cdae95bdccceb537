// Directory tree wipe with bounded, batched concurrency

use crate::algorithms::WipeMethod;
use crate::error::{WipeError, WipeResult};
use crate::io::PatternBufferPool;
use crate::report::TreeReport;
use crate::targets::file::{FileWipeOperation, FileWipeOutcome};
use crate::ui::progress::SILENT;
use crate::ui::ProgressSink;
use crate::MAX_CONCURRENCY;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, info, warn};

/// Start and finish ticks of one file wipe, on the gauge's own clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpan {
    pub batch: usize,
    pub started: u64,
    pub finished: u64,
}

/// Counts in-flight file wipes so the concurrency bound and the batch
/// barrier can be observed
#[derive(Debug, Default)]
pub struct BatchGauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    batches: AtomicUsize,
    tasks: AtomicUsize,
    clock: AtomicU64,
    spans: Mutex<Vec<TaskSpan>>,
}

impl BatchGauge {
    fn start_batch(&self) -> usize {
        self.batches.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn enter(&self, batch: usize) -> InFlight<'_> {
        let started = self.clock.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.tasks.fetch_add(1, Ordering::SeqCst);
        InFlight {
            gauge: self,
            batch,
            started,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running file wipes seen
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn tasks_dispatched(&self) -> usize {
        self.tasks.load(Ordering::SeqCst)
    }

    /// Every finished task, in finish order
    pub fn spans(&self) -> Vec<TaskSpan> {
        self.spans.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// True when no task of batch `n + 1` started before every task of
    /// batch `n` had finished
    pub fn batches_were_disjoint(&self) -> bool {
        let spans = self.spans();
        let mut bounds: BTreeMap<usize, (u64, u64)> = BTreeMap::new();
        for span in &spans {
            let entry = bounds.entry(span.batch).or_insert((u64::MAX, 0));
            entry.0 = entry.0.min(span.started);
            entry.1 = entry.1.max(span.finished);
        }

        bounds
            .values()
            .zip(bounds.values().skip(1))
            .all(|(earlier, later)| earlier.1 < later.0)
    }
}

struct InFlight<'a> {
    gauge: &'a BatchGauge,
    batch: usize,
    started: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let finished = self.gauge.clock.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut spans) = self.gauge.spans.lock() {
            spans.push(TaskSpan {
                batch: self.batch,
                started: self.started,
                finished,
            });
        }
        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One file to wipe, owned by the worker that runs it
struct WipeTask {
    path: PathBuf,
    method: WipeMethod,
    batch: usize,
}

/// Entries of one directory, split by how they are handled
#[derive(Default)]
struct Listing {
    directories: Vec<PathBuf>,
    files: Vec<PathBuf>,
    links: Vec<PathBuf>,
    unsupported: Vec<PathBuf>,
}

/// Wipes every regular file under a root and removes the emptied tree.
///
/// Subdirectories are processed depth-first before the files of their
/// parent. Files of one directory are dispatched in batches of at most
/// `max_concurrency` workers; a batch is fully joined before the next one
/// starts. A directory is removed only when everything beneath it was
/// removed, so a single failure keeps its whole ancestor chain in place.
pub struct DirectoryWipeScheduler<'a> {
    pool: &'a PatternBufferPool,
    progress: &'a dyn ProgressSink,
    max_concurrency: usize,
    scrub_names: bool,
    verify: bool,
    gauge: Arc<BatchGauge>,
}

impl<'a> DirectoryWipeScheduler<'a> {
    pub fn new(pool: &'a PatternBufferPool) -> Self {
        Self {
            pool,
            progress: &SILENT,
            max_concurrency: MAX_CONCURRENCY,
            scrub_names: true,
            verify: false,
            gauge: Arc::new(BatchGauge::default()),
        }
    }

    /// Clamped to `1..=MAX_CONCURRENCY`
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.clamp(1, MAX_CONCURRENCY);
        self
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

    pub fn gauge(&self) -> Arc<BatchGauge> {
        Arc::clone(&self.gauge)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Wipe the tree rooted at `root`.
    ///
    /// Fails outright only if `root` itself cannot be listed; every other
    /// failure is recorded in the returned [`TreeReport`].
    pub fn wipe_tree(&self, root: &Path, method: WipeMethod) -> WipeResult<TreeReport> {
        let metadata = fs::symlink_metadata(root).map_err(|source| WipeError::Open {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(WipeError::Open {
                path: root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        info!(
            root = %root.display(),
            method = %method,
            max_concurrency = self.max_concurrency,
            "starting tree wipe"
        );

        let mut report = TreeReport::new(root);
        self.wipe_level(root, method, &mut report)?;

        info!(
            root = %root.display(),
            files = report.files_wiped,
            failures = report.errors.len(),
            batches = self.gauge.batches(),
            peak_in_flight = self.gauge.peak(),
            "tree wipe finished"
        );

        Ok(report)
    }

    /// Returns whether `dir` and everything under it is gone
    fn wipe_level(&self, dir: &Path, method: WipeMethod, report: &mut TreeReport) -> WipeResult<bool> {
        let listing = list_entries(dir)?;
        let mut clean = true;

        for sub in &listing.directories {
            match self.wipe_level(sub, method, report) {
                Ok(removed) => clean &= removed,
                Err(e) => {
                    warn!(error = %e, "cannot descend into directory");
                    report.errors.push(e);
                    clean = false;
                }
            }
        }

        // Links are unlinked, never followed
        for link in &listing.links {
            match fs::remove_file(link) {
                Ok(()) => report.links_removed += 1,
                Err(source) => {
                    report.errors.push(WipeError::Delete {
                        path: link.clone(),
                        source,
                    });
                    clean = false;
                }
            }
        }

        for entry in &listing.unsupported {
            warn!(path = %entry.display(), "skipping special file");
            report.errors.push(WipeError::UnsupportedEntry { path: entry.clone() });
            clean = false;
        }

        clean &= self.dispatch_batches(&listing.files, method, report);

        if !clean {
            report.directories_retained.push(dir.to_path_buf());
            return Ok(false);
        }

        match fs::remove_dir(dir) {
            Ok(()) => {
                debug!(dir = %dir.display(), "directory removed");
                report.directories_removed.push(dir.to_path_buf());
                Ok(true)
            }
            Err(source) => {
                report.errors.push(WipeError::RemoveDir {
                    path: dir.to_path_buf(),
                    source,
                });
                report.directories_retained.push(dir.to_path_buf());
                Ok(false)
            }
        }
    }

    /// Run the files of one directory in joined batches
    fn dispatch_batches(&self, files: &[PathBuf], method: WipeMethod, report: &mut TreeReport) -> bool {
        let mut clean = true;

        for batch in files.chunks(self.max_concurrency) {
            let batch_no = self.gauge.start_batch();
            debug!(batch = batch_no, size = batch.len(), "dispatching batch");

            let results: Vec<(PathBuf, WipeResult<FileWipeOutcome>)> = thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|path| {
                        let task = WipeTask {
                            path: path.clone(),
                            method,
                            batch: batch_no,
                        };
                        let spawned = thread::Builder::new()
                            .name("wipe-worker".into())
                            .spawn_scoped(scope, move || self.run_task(task));
                        (path.clone(), spawned)
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(path, spawned)| {
                        let result = match spawned {
                            Ok(handle) => handle.join().unwrap_or_else(|_| {
                                Err(WipeError::WorkerPanicked { path: path.clone() })
                            }),
                            Err(source) => Err(WipeError::WorkerSpawn {
                                path: path.clone(),
                                source,
                            }),
                        };
                        (path, result)
                    })
                    .collect()
            });

            for (path, result) in results {
                match result {
                    Ok(outcome) => {
                        report.files_wiped += 1;
                        report.bytes_overwritten += outcome.stats.bytes_written;
                        self.progress.file_finished(&path, true);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "file wipe failed");
                        report.errors.push(e);
                        self.progress.file_finished(&path, false);
                        clean = false;
                    }
                }
            }
        }

        clean
    }

    fn run_task(&self, task: WipeTask) -> WipeResult<FileWipeOutcome> {
        let _slot = self.gauge.enter(task.batch);
        FileWipeOperation::new(self.pool)
            .with_progress(self.progress)
            .scrub_names(self.scrub_names)
            .verify(self.verify)
            .wipe(&task.path, task.method)
    }
}

fn list_entries(dir: &Path) -> WipeResult<Listing> {
    let open_error = |source| WipeError::Open {
        path: dir.to_path_buf(),
        source,
    };

    let mut listing = Listing::default();
    for entry in fs::read_dir(dir).map_err(open_error)? {
        let entry = entry.map_err(open_error)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|source| WipeError::Open {
            path: path.clone(),
            source,
        })?;

        if file_type.is_dir() {
            listing.directories.push(path);
        } else if file_type.is_file() {
            listing.files.push(path);
        } else if file_type.is_symlink() {
            listing.links.push(path);
        } else {
            listing.unsupported.push(path);
        }
    }

    listing.directories.sort();
    listing.files.sort();
    listing.links.sort();
    listing.unsupported.sort();
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(path: &Path, len: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0x3C; len]).unwrap();
    }

    #[test]
    fn test_empty_directory_removed_without_tasks() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("empty");
        fs::create_dir(&root).unwrap();

        let pool = PatternBufferPool::init(4096).unwrap();
        let scheduler = DirectoryWipeScheduler::new(&pool);
        let report = scheduler.wipe_tree(&root, WipeMethod::Clear).unwrap();

        assert!(!root.exists());
        assert!(report.is_complete());
        assert_eq!(scheduler.gauge().tasks_dispatched(), 0);
        assert_eq!(scheduler.gauge().batches(), 0);
    }

    #[test]
    fn test_nested_tree_removed() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("root");
        write_file(&root.join("a.txt"), 100);
        write_file(&root.join("b.txt"), 5000);
        write_file(&root.join("sub/c.txt"), 0);
        fs::create_dir_all(root.join("sub/deeper/empty")).unwrap();

        let pool = PatternBufferPool::init(4096).unwrap();
        let report = DirectoryWipeScheduler::new(&pool)
            .wipe_tree(&root, WipeMethod::Purge)
            .unwrap();

        assert!(!root.exists());
        assert_eq!(report.files_wiped, 3);
        assert_eq!(report.bytes_overwritten, 3 * 5100);
        assert_eq!(report.directories_removed.len(), 4);
        assert_eq!(report.directories_removed.last(), Some(&root));
    }

    #[test]
    fn test_batches_respect_bound() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("many");
        for i in 0..10 {
            write_file(&root.join(format!("f{i}")), 64);
        }

        let pool = PatternBufferPool::init(4096).unwrap();
        let scheduler = DirectoryWipeScheduler::new(&pool).with_max_concurrency(3);
        scheduler.wipe_tree(&root, WipeMethod::Clear).unwrap();

        let gauge = scheduler.gauge();
        assert_eq!(gauge.batches(), 4);
        assert_eq!(gauge.tasks_dispatched(), 10);
        assert!(gauge.peak() <= 3);
        assert_eq!(gauge.in_flight(), 0);
        assert_eq!(gauge.spans().len(), 10);
        assert!(gauge.batches_were_disjoint());
    }

    #[test]
    fn test_gauge_detects_overlapping_batches() {
        let gauge = BatchGauge::default();
        let a = gauge.enter(1);
        let b = gauge.enter(1);
        drop(a);
        // Batch 2 starts while `b` from batch 1 is still running
        let c = gauge.enter(2);
        drop(b);
        drop(c);

        assert_eq!(gauge.spans().len(), 3);
        assert!(!gauge.batches_were_disjoint());
    }

    #[test]
    fn test_gauge_accepts_joined_batches() {
        let gauge = BatchGauge::default();
        let a = gauge.enter(1);
        let b = gauge.enter(1);
        drop(b);
        drop(a);
        let c = gauge.enter(2);
        drop(c);

        assert!(gauge.batches_were_disjoint());
        assert_eq!(gauge.in_flight(), 0);
        assert_eq!(gauge.peak(), 2);
    }

    #[test]
    fn test_concurrency_clamped() {
        let pool = PatternBufferPool::init(4096).unwrap();
        assert_eq!(DirectoryWipeScheduler::new(&pool).with_max_concurrency(0).max_concurrency(), 1);
        assert_eq!(
            DirectoryWipeScheduler::new(&pool).with_max_concurrency(1000).max_concurrency(),
            MAX_CONCURRENCY
        );
    }

    #[test]
    fn test_symlink_unlinked_not_followed() {
        let base = tempfile::tempdir().unwrap();
        let outside = base.path().join("outside.txt");
        write_file(&outside, 32);

        let root = base.path().join("root");
        fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        let pool = PatternBufferPool::init(4096).unwrap();
        let report = DirectoryWipeScheduler::new(&pool)
            .wipe_tree(&root, WipeMethod::Clear)
            .unwrap();

        assert!(!root.exists());
        assert_eq!(report.links_removed, 1);
        assert_eq!(fs::read(&outside).unwrap(), vec![0x3C; 32]);
    }

    #[test]
    fn test_missing_root_is_open_error() {
        let base = tempfile::tempdir().unwrap();
        let pool = PatternBufferPool::init(4096).unwrap();
        let err = DirectoryWipeScheduler::new(&pool)
            .wipe_tree(&base.path().join("missing"), WipeMethod::Clear)
            .unwrap_err();
        assert!(matches!(err, WipeError::Open { .. }));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let base = tempfile::tempdir().unwrap();
        let file = base.path().join("file");
        write_file(&file, 10);

        let pool = PatternBufferPool::init(4096).unwrap();
        let err = DirectoryWipeScheduler::new(&pool)
            .wipe_tree(&file, WipeMethod::Clear)
            .unwrap_err();
        assert!(matches!(err, WipeError::Open { .. }));
        assert!(file.exists());
    }
}
