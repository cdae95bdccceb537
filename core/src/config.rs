// Engine configuration: defaults, TOML file, environment

use crate::error::{WipeError, WipeResult};
use crate::{DEFAULT_CHUNK_SIZE, MAX_CONCURRENCY};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest accepted chunk size (one page)
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;
/// Largest accepted chunk size
pub const MAX_CHUNK_SIZE: usize = 256 * 1024 * 1024;
/// Cap on `chunk_size * max_concurrency`: every directory-mode worker holds
/// its own chunk-sized random buffer
pub const MAX_WORKER_BUFFER_BYTES: usize = 1024 * 1024 * 1024;

/// Tunables shared by every target kind.
///
/// Layered lowest to highest: built-in defaults, `config.toml` (explicit path
/// or the per-user config dir), `SAYONARA_SHRED_*` environment variables, and
/// finally command-line overrides applied by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bytes per pattern buffer and per write call
    pub chunk_size: usize,
    /// Files wiped concurrently in directory mode
    pub max_concurrency: usize,
    /// Read back and compare after the final pass
    pub verify: bool,
    /// Truncate and rename files before deleting them
    pub scrub_names: bool,
    /// Draw progress bars on stderr
    pub progress: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrency: MAX_CONCURRENCY,
            verify: false,
            scrub_names: true,
            progress: true,
        }
    }
}

impl EngineConfig {
    pub const ENV_PREFIX: &'static str = "SAYONARA_SHRED";

    /// `config.toml` in the per-user config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sayonara-shred").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered configuration.
    ///
    /// An explicit `path` must exist; the default path is optional. The
    /// result is not validated here: command-line overrides still apply on
    /// top, so call [`validate`](Self::validate) on the merged value.
    pub fn load(path: Option<&Path>) -> WipeResult<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default) = Self::default_path() {
                    builder = builder.add_source(config::File::from(default).required(false));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true),
        );

        let loaded: Self = builder.build()?.try_deserialize()?;

        tracing::debug!(
            chunk_size = loaded.chunk_size,
            max_concurrency = loaded.max_concurrency,
            verify = loaded.verify,
            scrub_names = loaded.scrub_names,
            "configuration loaded"
        );

        Ok(loaded)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> WipeResult<()> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(WipeError::Config(format!(
                "chunk_size {} outside {}..={}",
                self.chunk_size, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE
            )));
        }

        if self.chunk_size % crate::io::SECTOR_SIZE != 0 {
            return Err(WipeError::Config(format!(
                "chunk_size {} is not a multiple of {}",
                self.chunk_size,
                crate::io::SECTOR_SIZE
            )));
        }

        if !(1..=MAX_CONCURRENCY).contains(&self.max_concurrency) {
            return Err(WipeError::Config(format!(
                "max_concurrency {} outside 1..={}",
                self.max_concurrency, MAX_CONCURRENCY
            )));
        }

        let worker_bytes = self.chunk_size.saturating_mul(self.max_concurrency);
        if worker_bytes > MAX_WORKER_BUFFER_BYTES {
            return Err(WipeError::Config(format!(
                "chunk_size {} x max_concurrency {} needs {} of worker buffers (limit {})",
                self.chunk_size,
                self.max_concurrency,
                crate::ui::human_bytes(worker_bytes as u64),
                crate::ui::human_bytes(MAX_WORKER_BUFFER_BYTES as u64)
            )));
        }

        Ok(())
    }
}
