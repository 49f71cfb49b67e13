//! Windows-specific handle release.

use std::{fs::File, os::windows::io::IntoRawHandle};

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};

/// Closes the handle owned by `file`, reporting the status of `CloseHandle`.
///
/// The handle is released even when an error is returned; it must not be
/// closed again.
pub fn close_file(file: File) -> std::io::Result<()> {
    let handle = file.into_raw_handle() as HANDLE;
    // SAFETY: `handle` was just taken out of an owned `File`, nothing else refers to it.
    let res = unsafe { CloseHandle(handle) };
    if res != 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}
