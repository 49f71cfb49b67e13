//! The owned OS-level resource behind a stream.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
};

use crate::spill::SpillBuffer;

#[cfg_attr(any(unix, target_os = "redox", target_os = "wasi"), path = "unix.rs")]
#[cfg_attr(windows, path = "windows.rs")]
mod platform;

pub use platform::close_file;

/// An open resource, exclusively owned by one stream.
pub enum Handle {
    File(File),
    Memory(SpillBuffer),
}

impl Handle {
    pub fn is_memory(&self) -> bool {
        matches!(self, Handle::Memory(_))
    }

    pub fn is_spilled(&self) -> bool {
        match self {
            Handle::File(_) => false,
            Handle::Memory(buf) => buf.is_spilled(),
        }
    }

    /// Size of the underlying content.
    pub fn len(&self) -> io::Result<u64> {
        match self {
            Handle::File(file) => Ok(file.metadata()?.len()),
            Handle::Memory(buf) => buf.len(),
        }
    }

    /// Flushes pending writes and releases the resource.
    ///
    /// The resource is released regardless of the outcome; the first failure
    /// (flush, then close) is returned.
    pub fn close(mut self) -> io::Result<()> {
        let flushed = self.flush();
        let closed = match self {
            Handle::File(file) => close_file(file),
            Handle::Memory(buf) => buf.into_file().map_or(Ok(()), close_file),
        };
        flushed.and(closed)
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Handle::File(file) => file.read(buf),
            Handle::Memory(mem) => mem.read(buf),
        }
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Handle::File(file) => file.write(buf),
            Handle::Memory(mem) => mem.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Handle::File(file) => file.flush(),
            Handle::Memory(mem) => mem.flush(),
        }
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Handle::File(file) => file.seek(pos),
            Handle::Memory(mem) => mem.seek(pos),
        }
    }
}
