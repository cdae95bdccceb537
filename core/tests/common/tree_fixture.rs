/// Builders for on-disk wipe targets inside a temp directory

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TreeFixture {
    _dir: TempDir,
    base: PathBuf,
}

impl TreeFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let base = dir.path().to_path_buf();
        Self { _dir: dir, base }
    }

    /// Parent of every fixture entry; never wiped itself
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.base.join(relative)
    }

    /// Regular file of `len` bytes filled with 0xC3
    pub fn file(&self, relative: &str, len: usize) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, vec![0xC3; len]).expect("write fixture file");
        path
    }

    pub fn dir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).expect("create fixture dir");
        path
    }

    /// Named pipe, which the wipe engine must refuse to open
    pub fn fifo(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        mkfifo(&path, Mode::S_IRUSR | Mode::S_IWUSR).expect("mkfifo");
        path
    }

    /// Disk image standing in for a block device
    pub fn image(&self, relative: &str, len: usize) -> PathBuf {
        self.file(relative, len)
    }
}
