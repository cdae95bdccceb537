use crate::algorithms::ScheduledPass;
use crate::io::PassStats;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;

/// Receives progress events from overwrite passes and tree workers.
///
/// All methods default to no-ops so a sink only implements what it displays.
pub trait ProgressSink: Send + Sync {
    fn pass_started(&self, _target: &Path, _pass: &ScheduledPass, _size: u64) {}

    fn bytes_written(&self, _bytes: u64) {}

    fn pass_finished(&self, _target: &Path, _pass: &ScheduledPass, _stats: &PassStats) {}

    /// One file of a tree finished, successfully or not
    fn file_finished(&self, _path: &Path, _wiped: bool) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {}

pub(crate) static SILENT: SilentProgress = SilentProgress;

const PASS_TEMPLATE: &str =
    "{msg} [{bar:40.green/240}] {percent:>3}% {bytes}/{total_bytes} @ {bytes_per_sec} ETA {eta}";
const TREE_TEMPLATE: &str = "{spinner:.cyan} {msg} ({elapsed})";

enum Mode {
    Passes,
    Tree,
}

/// Terminal progress on stderr
pub struct ConsoleProgress {
    mode: Mode,
    bar: Mutex<Option<ProgressBar>>,
    wiped: Mutex<(u64, u64)>,
}

impl ConsoleProgress {
    /// One bar per pass (file and disk targets)
    pub fn for_passes() -> Self {
        Self {
            mode: Mode::Passes,
            bar: Mutex::new(None),
            wiped: Mutex::new((0, 0)),
        }
    }

    /// One spinner counting finished files (folder targets)
    pub fn for_tree() -> Self {
        let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        spinner.set_style(
            ProgressStyle::with_template(TREE_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("wiping...");

        Self {
            mode: Mode::Tree,
            bar: Mutex::new(Some(spinner)),
            wiped: Mutex::new((0, 0)),
        }
    }

    pub fn finish(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(bar) = bar.take() {
                bar.finish();
            }
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn pass_started(&self, _target: &Path, pass: &ScheduledPass, size: u64) {
        if !matches!(self.mode, Mode::Passes) {
            return;
        }
        let bar = ProgressBar::with_draw_target(Some(size), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template(PASS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message(pass.to_string());

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn bytes_written(&self, bytes: u64) {
        if !matches!(self.mode, Mode::Passes) {
            return;
        }
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.inc(bytes);
            }
        }
    }

    fn pass_finished(&self, _target: &Path, pass: &ScheduledPass, stats: &PassStats) {
        if !matches!(self.mode, Mode::Passes) {
            return;
        }
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_with_message(format!("{} done, {}", pass, stats.throughput_human()));
            }
        }
    }

    fn file_finished(&self, _path: &Path, wiped: bool) {
        if !matches!(self.mode, Mode::Tree) {
            return;
        }
        let (ok, failed) = match self.wiped.lock() {
            Ok(mut counts) => {
                if wiped {
                    counts.0 += 1;
                } else {
                    counts.1 += 1;
                }
                *counts
            }
            Err(_) => return,
        };
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_message(format!("{} files wiped, {} failed", ok, failed));
                bar.tick();
            }
        }
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Convert a byte count to a readable string
pub fn human_bytes(bytes: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut val = bytes as f64;
    let mut i = 0usize;
    while val >= 1024.0 && i + 1 < units.len() {
        val /= 1024.0;
        i += 1;
    }
    if i == 0 {
        format!("{}B", bytes)
    } else {
        format!("{:.2}{}", val, units[i])
    }
}
