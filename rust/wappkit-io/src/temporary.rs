//! Anonymous read/write streams backed by memory, optionally spilling to disk.

use std::{
    ops::{Deref, DerefMut},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use wappkit_common::{Error, Result};

use crate::{
    handle::Handle,
    mode::OpenMode,
    spill::SpillBuffer,
    stream::Stream,
    target::Target,
};

/// Configuration of a temporary stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporaryStreamOptions {
    /// Bytes kept in memory before the content moves to a temporary file.
    /// Zero keeps everything in memory.
    pub max_memory: u64,

    /// Directory receiving the spill file. Defaults to the system temporary
    /// directory.
    pub spill_dir: Option<PathBuf>,
}

impl TemporaryStreamOptions {
    pub fn with_max_memory(mut self, max_memory: u64) -> Self {
        self.max_memory = max_memory;
        self
    }

    pub fn with_spill_dir(mut self, spill_dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = Some(spill_dir.into());
        self
    }
}

/// A readable and writable binary stream over anonymous storage.
///
/// All stream operations are available through `Deref<Target = Stream>`.
pub struct TemporaryStream {
    stream: Stream,
}

impl TemporaryStream {
    /// Opens a temporary stream. With `size_limit == 0` the content stays in
    /// memory; otherwise it moves to disk once it exceeds `size_limit` bytes.
    pub fn new(size_limit: u64) -> Result<TemporaryStream> {
        TemporaryStream::with_options(&TemporaryStreamOptions::default().with_max_memory(size_limit))
    }

    pub fn with_options(options: &TemporaryStreamOptions) -> Result<TemporaryStream> {
        let max_memory = (options.max_memory != 0).then_some(options.max_memory);
        let target = Target::Memory { max_memory };
        let buffer = match &options.spill_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(Error::open(
                        dir.display().to_string(),
                        std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "spill directory does not exist",
                        ),
                    ));
                }
                SpillBuffer::new_in(max_memory, dir)
            }
            None => SpillBuffer::new(max_memory),
        };
        Ok(TemporaryStream {
            stream: Stream::from_handle(
                Handle::Memory(buffer),
                target,
                OpenMode::READ_WRITE_BINARY,
            ),
        })
    }

    /// Creates an unbounded temporary stream holding `data`, positioned at
    /// the beginning.
    pub fn from_bytes(data: &[u8]) -> Result<TemporaryStream> {
        let mut temp = TemporaryStream::new(0)?;
        temp.write(data, None)?;
        temp.seek_from_beginning(0)?;
        Ok(temp)
    }

    pub fn into_stream(self) -> Stream {
        self.stream
    }
}

impl Deref for TemporaryStream {
    type Target = Stream;

    fn deref(&self) -> &Stream {
        &self.stream
    }
}

impl DerefMut for TemporaryStream {
    fn deref_mut(&mut self) -> &mut Stream {
        &mut self.stream
    }
}
