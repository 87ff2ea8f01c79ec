// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Logical name -> POSIX namespace name translation shared by every
// named resource (mq_open, sem_open, shm_open all take "/name").

use std::ffi::CString;
use std::io;

/// Maximum length of a POSIX IPC name.
///
/// On macOS `PSHMNAMLEN` is 31, counts the leading '/', and named
/// semaphores share the limit. On Linux `NAME_MAX` (255) applies to the
/// part after the '/'.
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const NAME_MAX: usize = 31;

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub const NAME_MAX: usize = 255;

/// Longest logical name (without the '/') that [`check_name`] accepts.
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const MAX_NAME_LEN: usize = NAME_MAX - 1;

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub const MAX_NAME_LEN: usize = NAME_MAX;

/// Produce the system-level name for a logical name: `"/" + name`.
pub fn system_name(name: &str) -> String {
    format!("/{name}")
}

/// Reject logical names the OS namespace cannot hold.
///
/// A valid name is non-empty, has no '/' or NUL, and is at most
/// [`MAX_NAME_LEN`] bytes long.
pub fn check_name(name: &str) -> io::Result<()> {
    if name.is_empty() {
        return Err(io::Error::from_raw_os_error(libc::EINVAL));
    }
    if name.bytes().any(|b| b == b'/' || b == 0) {
        return Err(io::Error::from_raw_os_error(libc::EINVAL));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(io::Error::from_raw_os_error(libc::ENAMETOOLONG));
    }
    Ok(())
}

/// Validate `name` and return its system form as a C string.
pub fn to_c_name(name: &str) -> io::Result<CString> {
    check_name(name)?;
    CString::new(system_name(name)).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
