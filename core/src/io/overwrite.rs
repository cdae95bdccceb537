// Single overwrite pass over an opened target

use super::buffer_pool::{AlignedBuffer, PatternBufferPool, RandomBuffer};
use super::metrics::PassStats;
use super::platform_specific::WipeSink;
use crate::algorithms::{ScheduledPass, WipeMethod};
use crate::error::{WipeError, WipeResult};
use crate::ui::ProgressSink;
use crate::verification::verify_readback;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Runs scheduled passes against one target.
///
/// Holds the random buffer for the lifetime of the target so every random
/// pass reuses the allocation but gets freshly generated bytes.
pub struct OverwritePass<'a> {
    pool: &'a PatternBufferPool,
    progress: &'a dyn ProgressSink,
    random: Option<RandomBuffer>,
    verify_final: bool,
}

impl<'a> OverwritePass<'a> {
    pub fn new(pool: &'a PatternBufferPool, progress: &'a dyn ProgressSink) -> Self {
        Self {
            pool,
            progress,
            random: None,
            verify_final: false,
        }
    }

    /// Read the target back after the final pass and compare
    pub fn verify_final(mut self, enabled: bool) -> Self {
        self.verify_final = enabled;
        self
    }

    /// Overwrite bytes `[0, size)` of `sink` with the pass's pattern, then
    /// flush durably.
    ///
    /// Short writes are continued from where they stopped. A write that
    /// accepts zero bytes, or any error other than `Interrupted`, aborts the
    /// pass with [`WipeError::Io`].
    pub fn run(
        &mut self,
        sink: &mut dyn WipeSink,
        target: &Path,
        method: WipeMethod,
        pass: &ScheduledPass,
        size: u64,
    ) -> WipeResult<PassStats> {
        let io_error = |source: io::Error| WipeError::Io {
            path: target.to_path_buf(),
            method,
            pass: pass.index,
            total_passes: pass.total,
            source,
        };

        let fixed: Arc<AlignedBuffer>;
        let data: &[u8] = if pass.pattern.is_random() {
            // Never generate more than one pass of this target can consume
            let needed = size.min(self.pool.chunk_size() as u64) as usize;
            if self.random.as_ref().map_or(true, |r| r.len() < needed) {
                self.random = Some(self.pool.random_stream_sized(needed)?);
            }
            let Some(random) = self.random.as_mut() else {
                return Err(WipeError::PoolNotInitialized);
            };
            random.regenerate_prefix(needed)
        } else {
            fixed = self.pool.acquire(pass.pattern)?;
            fixed.as_slice()
        };

        sink.rewind().map_err(io_error)?;
        self.progress.pass_started(target, pass, size);

        let started = Instant::now();
        let chunk_len = data.len() as u64;
        let mut stats = PassStats::default();
        let mut offset = 0u64;

        while offset < size {
            let want = (size - offset).min(chunk_len) as usize;
            let mut remaining = &data[..want];

            while !remaining.is_empty() {
                match sink.write_chunk(remaining) {
                    Ok(0) => {
                        return Err(io_error(io::Error::new(
                            io::ErrorKind::WriteZero,
                            format!("target accepted no bytes at offset {}", offset),
                        )));
                    }
                    Ok(n) => {
                        let n = n.min(remaining.len());
                        stats.writes += 1;
                        if n < remaining.len() {
                            stats.short_writes += 1;
                        }
                        remaining = &remaining[n..];
                        offset += n as u64;
                        self.progress.bytes_written(n as u64);
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(io_error(e)),
                }
            }
        }

        sink.flush_durable().map_err(io_error)?;

        stats.bytes_written = offset;
        stats.elapsed = started.elapsed();

        if self.verify_final && pass.is_final() {
            match verify_readback(sink, data, size).map_err(io_error)? {
                None => stats.verified = true,
                Some(mismatch) => {
                    warn!(
                        path = %target.display(),
                        pass = pass.index,
                        offset = mismatch,
                        "read-back differs from written pattern"
                    );
                    return Err(WipeError::VerificationFailed {
                        path: target.to_path_buf(),
                        pass: pass.index,
                        offset: mismatch,
                    });
                }
            }
        }

        debug!(
            path = %target.display(),
            pass = pass.index,
            total = pass.total,
            pattern = %pass.pattern,
            bytes = stats.bytes_written,
            short_writes = stats.short_writes,
            throughput = %stats.throughput_human(),
            "pass complete"
        );

        self.progress.pass_finished(target, pass, &stats);
        Ok(stats)
    }

    #[cfg(test)]
    pub(crate) fn random_buffer(&self) -> Option<&RandomBuffer> {
        self.random.as_ref()
    }
}
