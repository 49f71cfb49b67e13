use std::{
    collections::BTreeMap,
    io::{self, Read, Seek, SeekFrom, Write},
};

use wappkit_common::{Error, Result};

use crate::{
    handle::Handle,
    metadata::StreamMetadata,
    mode::OpenMode,
    spill::SpillBuffer,
    target::Target,
};

/// Chunk size used when scanning for a line delimiter.
const LINE_CHUNK_SIZE: usize = 8 * 1024;

/// A stream over exactly one owned OS-level resource: a file, or anonymous
/// memory that may spill to disk.
///
/// A stream is either open or closed. Once closed (through [`Stream::close`]
/// or when dropped) the resource is released and every I/O operation fails
/// with an error; [`Stream::close`] and [`Stream::at_end`] remain callable.
/// There is no way to reopen a closed stream.
pub struct Stream {
    handle: Option<Handle>,
    target: Target,
    mode: OpenMode,
    eof: bool,
}

impl Stream {
    /// Opens `target` using a native open-mode string.
    ///
    /// # Arguments
    ///
    /// * `target` - A filesystem path, `memory://`, `temp://` or
    ///   `temp://maxmemory:<bytes>`.
    /// * `mode` - An open-mode string such as `"r"`, `"w+"`, `"ab"` or `"r+b"`.
    ///
    /// # Errors
    ///
    /// Fails if the mode or the pseudo-target is malformed, or if the
    /// underlying open does not succeed; the message names the target.
    pub fn open(target: &str, mode: &str) -> Result<Stream> {
        let mode: OpenMode = mode.parse()?;
        let target = Target::parse(target)?;
        Stream::open_target(target, mode)
    }

    /// Opens an already parsed target.
    pub fn open_target(target: Target, mode: OpenMode) -> Result<Stream> {
        let handle = match &target {
            Target::File(path) => {
                let file = mode
                    .to_open_options()
                    .open(path)
                    .map_err(|e| Error::open(path.display().to_string(), e))?;
                Handle::File(file)
            }
            Target::Memory { max_memory } => Handle::Memory(SpillBuffer::new(*max_memory)),
        };
        Ok(Stream::from_handle(handle, target, mode))
    }

    pub(crate) fn from_handle(handle: Handle, target: Target, mode: OpenMode) -> Stream {
        log::debug!("opened stream {} in mode {}", target.uri(), mode);
        Stream {
            handle: Some(handle),
            target,
            mode,
            eof: false,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Releases the resource.
    ///
    /// Returns `true` if the stream was already closed or if the release
    /// succeeded, `false` if the underlying flush or close reported a failure.
    /// The stream is closed afterwards in every case.
    pub fn close(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };
        match handle.close() {
            Ok(()) => {
                log::debug!("closed stream {}", self.target.uri());
                true
            }
            Err(e) => {
                log::debug!("failed to close stream {}: {e}", self.target.uri());
                false
            }
        }
    }

    /// Returns `true` if the stream is closed or its end-of-stream indicator
    /// is set.
    ///
    /// The indicator is set by a read that comes back short of the requested
    /// length and cleared by a successful seek.
    pub fn at_end(&self) -> bool {
        self.handle.is_none() || self.eof
    }

    /// Reads a line.
    ///
    /// Reading ends when `max_length` bytes have been read, when `delimiter`
    /// is found, or at end-of-stream, whichever comes first. The delimiter is
    /// consumed but not included in the result; it is only recognized when it
    /// lies entirely within the first `max_length` bytes. A `max_length` of 0
    /// reads up to 8 KiB.
    pub fn read_line(&mut self, max_length: usize, delimiter: Option<&[u8]>) -> Result<Vec<u8>> {
        let max_length = if max_length == 0 {
            LINE_CHUNK_SIZE
        } else {
            max_length
        };
        let delimiter = delimiter.filter(|d| !d.is_empty());
        let handle = self.readable_handle()?;

        let mut line = Vec::new();
        let mut chunk = vec![0u8; std::cmp::min(max_length, LINE_CHUNK_SIZE)];
        let mut hit_end = false;
        while line.len() < max_length {
            let want = std::cmp::min(chunk.len(), max_length - line.len());
            let n = read_full(handle, &mut chunk[..want])
                .map_err(|e| Error::io("read from resource", e))?;
            let search_from = delimiter.map_or(0, |d| line.len().saturating_sub(d.len() - 1));
            line.extend_from_slice(&chunk[..n]);

            if let Some(delimiter) = delimiter {
                if let Some(pos) = find(&line[search_from..], delimiter) {
                    let end = search_from + pos;
                    let excess = line.len() - (end + delimiter.len());
                    if excess != 0 {
                        handle
                            .seek(SeekFrom::Current(-(excess as i64)))
                            .map_err(|e| Error::io("seek", e))?;
                    }
                    line.truncate(end);
                    return Ok(line);
                }
            }
            if n < want {
                hit_end = true;
                break;
            }
        }
        if hit_end {
            self.eof = true;
        }
        Ok(line)
    }

    /// Reads the remainder of the stream.
    ///
    /// # Arguments
    ///
    /// * `max_length` - The maximum number of bytes to read, `None` to read
    ///   until end-of-stream.
    /// * `offset` - An absolute position to seek to before reading, `None` to
    ///   read from the current position.
    pub fn read_contents(&mut self, max_length: Option<u64>, offset: Option<u64>) -> Result<Vec<u8>> {
        self.readable_handle()?;
        if let Some(offset) = offset {
            self.seek(SeekFrom::Start(offset))?;
        }
        let handle = self.readable_handle()?;

        let mut buf = Vec::new();
        let hit_end = match max_length {
            None => {
                handle
                    .read_to_end(&mut buf)
                    .map_err(|e| Error::io("read from resource", e))?;
                true
            }
            Some(max_length) => {
                let n = handle
                    .take(max_length)
                    .read_to_end(&mut buf)
                    .map_err(|e| Error::io("read from resource", e))?;
                (n as u64) < max_length
            }
        };
        if hit_end {
            self.eof = true;
        }
        Ok(buf)
    }

    /// Metadata of the open stream.
    pub fn metadata(&self) -> Result<StreamMetadata> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| Error::invalid_handle("get metadata of"))?;
        let (wrapper_type, stream_type) = match &self.target {
            Target::File(_) => ("plainfile", "file"),
            Target::Memory { max_memory: None } => ("memory", "memory"),
            Target::Memory { max_memory: Some(_) } => ("memory", "temp"),
        };
        Ok(StreamMetadata {
            timed_out: false,
            blocked: true,
            eof: self.eof,
            wrapper_type,
            stream_type,
            mode: self.mode.as_str(),
            unread_bytes: 0,
            seekable: true,
            uri: self.target.uri(),
            spilled: handle.is_spilled(),
        })
    }

    /// Metadata of the open stream as a string-keyed mapping.
    pub fn get_metadata(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        Ok(self.metadata()?.to_map())
    }

    /// Returns the current position of the read/write cursor.
    pub fn current_position(&mut self) -> Result<u64> {
        self.handle_mut("get the position of")?
            .stream_position()
            .map_err(|e| Error::io("retrieve current position for resource", e))
    }

    /// Size of the stream content in bytes.
    pub fn size(&self) -> Result<u64> {
        self.handle
            .as_ref()
            .ok_or_else(|| Error::invalid_handle("get the size of"))?
            .len()
            .map_err(|e| Error::io("retrieve size of resource", e))
    }

    /// Reads up to `length` bytes from the current position.
    ///
    /// Fewer bytes are returned only at end-of-stream; an empty result there
    /// is not an error.
    pub fn read(&mut self, length: usize) -> Result<Vec<u8>> {
        let handle = self.readable_handle()?;

        let limit = u64::try_from(length).unwrap_or(u64::MAX);
        let mut buf = Vec::new();
        let n = handle
            .take(limit)
            .read_to_end(&mut buf)
            .map_err(|e| Error::io("read from resource", e))?;
        if n < length {
            self.eof = true;
        }
        Ok(buf)
    }

    /// Writes `data` at the current position.
    ///
    /// When `length` is given, writing stops after `length` bytes or when
    /// `data` is exhausted, whichever comes first. Returns the number of bytes
    /// actually written, which may be less than requested.
    pub fn write(&mut self, data: &[u8], length: Option<usize>) -> Result<usize> {
        let data = match length {
            Some(length) => &data[..std::cmp::min(length, data.len())],
            None => data,
        };
        let append = self.mode.is_append();
        let handle = self.writable_handle()?;

        if append && handle.is_memory() {
            handle
                .seek(SeekFrom::End(0))
                .map_err(|e| Error::io("seek", e))?;
        }
        write_partial(handle, data).map_err(|e| Error::io("write to resource", e))
    }

    /// Sets the position to `offset` bytes.
    pub fn seek_from_beginning(&mut self, offset: u64) -> Result<()> {
        self.seek(SeekFrom::Start(offset)).map(|_| ())
    }

    /// Sets the position to the current location plus `offset`.
    pub fn seek_from_current(&mut self, offset: i64) -> Result<()> {
        self.seek(SeekFrom::Current(offset)).map(|_| ())
    }

    /// Sets the position to end-of-stream plus `offset`.
    pub fn seek_from_end(&mut self, offset: i64) -> Result<()> {
        self.seek(SeekFrom::End(offset)).map(|_| ())
    }

    /// Moves the cursor relative to an anchor and returns the new position.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let new_pos = self
            .handle_mut("seek")?
            .seek(pos)
            .map_err(|e| Error::io("seek", e))?;
        self.eof = false;
        Ok(new_pos)
    }

    fn handle_mut(&mut self, operation: &str) -> Result<&mut Handle> {
        self.handle
            .as_mut()
            .ok_or_else(|| Error::invalid_handle(operation))
    }

    fn readable_handle(&mut self) -> Result<&mut Handle> {
        let mode = self.mode;
        let handle = self.handle_mut("read from")?;
        if !mode.is_readable() {
            return Err(not_permitted("read from resource", mode, "readable"));
        }
        Ok(handle)
    }

    fn writable_handle(&mut self) -> Result<&mut Handle> {
        let mode = self.mode;
        let handle = self.handle_mut("write to")?;
        if !mode.is_writable() {
            return Err(not_permitted("write to resource", mode, "writable"));
        }
        Ok(handle)
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if !self.close() {
            log::warn!("stream {} was not closed cleanly", self.target.uri());
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.readable_handle()?.read(buf)?;
        if n < buf.len() {
            self.eof = true;
        }
        Ok(n)
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Stream::write(self, buf, None)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.handle_mut("flush")?.flush()
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(Stream::seek(self, pos)?)
    }
}

/// Reads until `buf` is full or the source is exhausted.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Writes as much of `data` as the sink accepts.
fn write_partial(writer: &mut impl Write, data: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

fn not_permitted(context: &str, mode: OpenMode, access: &str) -> Error {
    Error::io(
        context,
        io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("stream opened in mode \"{mode}\" is not {access}"),
        ),
    )
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
