// Raw device wipe: overwrite the whole addressable range, never delete

use crate::algorithms::{schedule_for, WipeMethod};
use crate::error::{WipeError, WipeResult};
use crate::io::{device_size, open_device, FileSink, OverwritePass, PassStats, PatternBufferPool};
use crate::ui::progress::SILENT;
use crate::ui::ProgressSink;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceWipeOutcome {
    pub path: PathBuf,
    pub size: u64,
    pub passes_completed: usize,
    pub stats: PassStats,
}

/// Overwrites a block device (or a disk image file) end to end
pub struct DeviceWipeOperation<'a> {
    pool: &'a PatternBufferPool,
    progress: &'a dyn ProgressSink,
    verify: bool,
}

impl<'a> DeviceWipeOperation<'a> {
    pub fn new(pool: &'a PatternBufferPool) -> Self {
        Self {
            pool,
            progress: &SILENT,
            verify: false,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Run every pass of `method` across the device's full size.
    ///
    /// Lack of privilege surfaces as [`WipeError::Permission`]; the device
    /// node itself is left in place.
    pub fn wipe_device(&self, path: &Path, method: WipeMethod) -> WipeResult<DeviceWipeOutcome> {
        let file = open_device(path, self.verify).map_err(|source| {
            if source.kind() == io::ErrorKind::PermissionDenied {
                WipeError::Permission {
                    path: path.to_path_buf(),
                    source,
                }
            } else {
                WipeError::Open {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let size = device_size(&file).map_err(|source| WipeError::Size {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            device = %path.display(),
            size,
            method = %method,
            passes = method.pass_count(),
            "starting device wipe"
        );

        let mut sink = FileSink::new(file);
        let mut runner = OverwritePass::new(self.pool, self.progress).verify_final(self.verify);
        let mut total = PassStats::default();
        let mut passes_completed = 0;

        for pass in schedule_for(method) {
            let stats = runner.run(&mut sink, path, method, &pass, size)?;
            total.accumulate(&stats);
            passes_completed += 1;
        }

        info!(
            device = %path.display(),
            bytes = total.bytes_written,
            "device wipe complete"
        );

        Ok(DeviceWipeOutcome {
            path: path.to_path_buf(),
            size,
            passes_completed,
            stats: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_image_file_is_wiped_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("disk.img");
        fs::write(&image, vec![0x77; 20_000]).unwrap();

        let pool = PatternBufferPool::init(4096).unwrap();
        let outcome = DeviceWipeOperation::new(&pool)
            .verify(true)
            .wipe_device(&image, WipeMethod::Destroy)
            .unwrap();

        assert_eq!(outcome.size, 20_000);
        assert_eq!(outcome.passes_completed, 7);
        assert!(outcome.stats.verified);

        // Not deleted, same length, final pass was random
        let content = fs::read(&image).unwrap();
        assert_eq!(content.len(), 20_000);
        assert!(!content.iter().all(|&b| b == 0x77));
        assert!(!content.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_missing_device_is_open_error() {
        let pool = PatternBufferPool::init(4096).unwrap();
        let err = DeviceWipeOperation::new(&pool)
            .wipe_device(Path::new("/nonexistent/sayonara-device"), WipeMethod::Clear)
            .unwrap_err();
        assert!(matches!(err, WipeError::Open { .. }));
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pool = PatternBufferPool::init(4096).unwrap();
        let err = DeviceWipeOperation::new(&pool)
            .wipe_device(dir.path(), WipeMethod::Clear)
            .unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Rejected);
    }
}
