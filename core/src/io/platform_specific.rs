// Platform-specific open, size and write primitives

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Byte sink an overwrite pass writes into.
///
/// A single `write_chunk` call may accept fewer bytes than offered; callers
/// loop on the remainder.
#[cfg_attr(test, mockall::automock)]
pub trait WipeSink: Send {
    /// Position at offset 0
    fn rewind(&mut self) -> io::Result<()>;

    /// Write once, returning how many bytes were accepted
    fn write_chunk(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read once from the current position (used for read-back)
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Flush buffered state, then commit to stable storage
    fn flush_durable(&mut self) -> io::Result<()>;
}

/// [`WipeSink`] over an open file or device handle
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Byte length found by seeking to the end
    pub fn size_by_seek(&mut self) -> io::Result<u64> {
        let size = self.file.seek(SeekFrom::End(0))?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(size)
    }

    pub fn into_inner(self) -> File {
        self.file
    }
}

impl WipeSink for FileSink {
    fn rewind(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0)).map(|_| ())
    }

    fn write_chunk(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write(data)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn flush_durable(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }
}

/// Open an existing file for in-place overwrite (no locking)
pub fn open_read_write(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

/// Open a raw device for writing; read access is added for read-back
pub fn open_device(path: &Path, read_back: bool) -> io::Result<File> {
    OpenOptions::new().read(read_back).write(true).open(path)
}

#[cfg(target_os = "linux")]
mod linux {
    // BLKGETSIZE64 = _IOR(0x12, 114, size_t)
    nix::ioctl_read!(blkgetsize64, 0x12, 114, u64);
}

/// Total addressable byte length of an opened device.
///
/// Block devices are queried through the kernel (BLKGETSIZE64 on Linux, seek
/// to end elsewhere). A regular file is accepted as a disk image and sized by
/// its metadata. Anything else is unsupported.
pub fn device_size(file: &File) -> io::Result<u64> {
    use std::os::unix::fs::FileTypeExt;

    let metadata = file.metadata()?;
    let file_type = metadata.file_type();

    if file_type.is_file() {
        return Ok(metadata.len());
    }

    if file_type.is_block_device() || file_type.is_char_device() {
        return block_device_size(file);
    }

    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "not a block device or disk image",
    ))
}

#[cfg(target_os = "linux")]
fn block_device_size(file: &File) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    let mut size = 0u64;
    unsafe { linux::blkgetsize64(file.as_raw_fd(), &mut size) }.map_err(io::Error::from)?;
    Ok(size)
}

#[cfg(not(target_os = "linux"))]
fn block_device_size(file: &File) -> io::Result<u64> {
    let mut handle = file;
    let size = handle.seek(SeekFrom::End(0))?;
    handle.seek(SeekFrom::Start(0))?;
    if size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "device reports zero length",
        ));
    }
    Ok(size)
}
