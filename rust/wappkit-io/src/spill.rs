//! Memory-backed storage that migrates to an anonymous temporary file once its
//! content grows past a threshold.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
    path::PathBuf,
};

/// Widest zero-filled gap a write may open in memory. Wider gaps move the
/// content to the spill file, which keeps them sparse.
const MAX_MEMORY_GAP: u64 = 16 * 1024 * 1024;

pub struct SpillBuffer {
    storage: Storage,
    threshold: Option<u64>,
    spill_dir: Option<PathBuf>,
}

enum Storage {
    Memory { data: Vec<u8>, pos: u64 },
    File(File),
}

impl SpillBuffer {
    /// Creates an empty buffer. With `threshold == None` the content never
    /// leaves memory.
    pub fn new(threshold: Option<u64>) -> SpillBuffer {
        SpillBuffer {
            storage: Storage::Memory {
                data: Vec::new(),
                pos: 0,
            },
            threshold,
            spill_dir: None,
        }
    }

    /// Creates an empty buffer whose spill file is placed in `dir`.
    pub fn new_in(threshold: Option<u64>, dir: impl Into<PathBuf>) -> SpillBuffer {
        SpillBuffer {
            spill_dir: Some(dir.into()),
            ..SpillBuffer::new(threshold)
        }
    }

    pub fn is_spilled(&self) -> bool {
        matches!(self.storage, Storage::File(_))
    }

    /// Current size of the content.
    pub fn len(&self) -> io::Result<u64> {
        match &self.storage {
            Storage::Memory { data, .. } => Ok(data.len() as u64),
            Storage::File(file) => Ok(file.metadata()?.len()),
        }
    }

    /// Releases the buffer, handing back the spill file if there is one.
    pub fn into_file(self) -> Option<File> {
        match self.storage {
            Storage::Memory { .. } => None,
            Storage::File(file) => Some(file),
        }
    }

    /// Moves the in-memory content to a temporary file, keeping the position.
    pub fn spill(&mut self) -> io::Result<()> {
        let Storage::Memory { data, pos } = &self.storage else {
            return Ok(());
        };
        let mut file = match &self.spill_dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        file.write_all(data)?;
        file.seek(SeekFrom::Start(*pos))?;
        log::debug!(
            "temporary stream spilled {} bytes to disk (threshold {:?})",
            data.len(),
            self.threshold
        );
        self.storage = Storage::File(file);
        Ok(())
    }

    fn exceeds_threshold(&self, end_pos: u64) -> bool {
        self.threshold.is_some_and(|threshold| end_pos > threshold)
    }
}

impl Read for SpillBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.storage {
            Storage::Memory { data, pos } => {
                let start = std::cmp::min(*pos, data.len() as u64) as usize;
                let len = std::cmp::min(data.len() - start, buf.len());
                if len != 0 {
                    buf[..len].copy_from_slice(&data[start..start + len]);
                    *pos += len as u64;
                }
                Ok(len)
            }
            Storage::File(file) => file.read(buf),
        }
    }
}

impl Write for SpillBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let needs_spill = match &self.storage {
            Storage::Memory { data, pos } => {
                let end_pos = pos
                    .checked_add(buf.len() as u64)
                    .ok_or_else(out_of_range)?;
                self.exceeds_threshold(end_pos)
                    || pos.saturating_sub(data.len() as u64) > MAX_MEMORY_GAP
            }
            Storage::File(_) => false,
        };
        if needs_spill {
            self.spill()?;
        }
        match &mut self.storage {
            Storage::Memory { data, pos } => {
                let start = usize::try_from(*pos).map_err(|_| out_of_range())?;
                let end = start.checked_add(buf.len()).ok_or_else(out_of_range)?;
                if start == data.len() {
                    data.extend_from_slice(buf);
                } else {
                    if end > data.len() {
                        data.resize(end, 0);
                    }
                    data[start..end].copy_from_slice(buf);
                }
                *pos = end as u64;
                Ok(buf.len())
            }
            Storage::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.storage {
            Storage::Memory { .. } => Ok(()),
            Storage::File(file) => file.flush(),
        }
    }
}

impl Seek for SpillBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.storage {
            Storage::Memory { data, pos: current } => {
                let (base, offset) = match pos {
                    SeekFrom::Start(offset) => {
                        *current = offset;
                        return Ok(offset);
                    }
                    SeekFrom::Current(offset) => (*current, offset),
                    SeekFrom::End(offset) => (data.len() as u64, offset),
                };
                let new_pos = base.checked_add_signed(offset).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "invalid seek to a negative or overflowing position",
                    )
                })?;
                *current = new_pos;
                Ok(new_pos)
            }
            Storage::File(file) => file.seek(pos),
        }
    }
}

fn out_of_range() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "write position is beyond the addressable range",
    )
}
