//! Unix-specific handle release.

use std::{fs::File, os::fd::IntoRawFd};

/// Closes the descriptor owned by `file`, reporting the status of `close(2)`.
///
/// The descriptor is released even when an error is returned; it must not be
/// closed again.
pub fn close_file(file: File) -> std::io::Result<()> {
    let fd = file.into_raw_fd();
    // SAFETY: `fd` was just taken out of an owned `File`, nothing else refers to it.
    let res = unsafe { libc::close(fd) };
    if res == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}
