// Per-pass I/O statistics

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters collected while one pass runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassStats {
    pub bytes_written: u64,
    /// Individual write calls issued
    pub writes: u64,
    /// Writes that accepted fewer bytes than offered and were reissued
    pub short_writes: u64,
    pub elapsed: Duration,
    pub verified: bool,
}

impl PassStats {
    /// Throughput in bytes/sec
    pub fn throughput(&self) -> u64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed < 0.001 {
            return 0;
        }
        (self.bytes_written as f64 / elapsed) as u64
    }

    /// Format throughput in human-readable form
    pub fn throughput_human(&self) -> String {
        let mb_per_sec = self.throughput() as f64 / (1024.0 * 1024.0);
        if mb_per_sec >= 1000.0 {
            format!("{:.2} GB/s", mb_per_sec / 1024.0)
        } else {
            format!("{:.2} MB/s", mb_per_sec)
        }
    }

    /// Fold another pass into a running total
    pub fn accumulate(&mut self, other: &PassStats) {
        self.bytes_written += other.bytes_written;
        self.writes += other.writes;
        self.short_writes += other.short_writes;
        self.elapsed += other.elapsed;
        self.verified |= other.verified;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput_needs_elapsed_time() {
        let stats = PassStats {
            bytes_written: 1024,
            ..Default::default()
        };
        assert_eq!(stats.throughput(), 0);
    }

    #[test]
    fn test_throughput_calculation() {
        let stats = PassStats {
            bytes_written: 10 * 1024 * 1024,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(stats.throughput(), 5 * 1024 * 1024);
        assert_eq!(stats.throughput_human(), "5.00 MB/s");
    }

    #[test]
    fn test_accumulate() {
        let mut total = PassStats::default();
        let pass = PassStats {
            bytes_written: 100,
            writes: 2,
            short_writes: 1,
            elapsed: Duration::from_millis(5),
            verified: false,
        };
        total.accumulate(&pass);
        total.accumulate(&pass);
        assert_eq!(total.bytes_written, 200);
        assert_eq!(total.writes, 4);
        assert_eq!(total.short_writes, 2);
        assert_eq!(total.elapsed, Duration::from_millis(10));
    }
}
