// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Status value returned by every fallible IPC operation.
// Carries the platform errno (0 = success) and its human-readable text.

use std::fmt;
use std::io;

/// Outcome of an IPC operation: an OS error code plus a description.
///
/// A code of `0` means success; any other value is the `errno` reported by
/// the failing call. Converts to `bool` (true on success) so callers can
/// write `if queue.send("x").into() { ... }` or use [`IpcStatus::is_success`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IpcStatus {
    code: i32,
    description: String,
}

/// Result of a query that yields a value on success.
pub type IpcResult<T> = Result<T, IpcStatus>;

impl IpcStatus {
    pub const SUCCESS: i32 = 0;

    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub const fn success() -> Self {
        Self {
            code: Self::SUCCESS,
            description: String::new(),
        }
    }

    /// Build a status from a raw `errno`, filling in the OS description.
    pub fn from_errno(code: i32) -> Self {
        if code == Self::SUCCESS {
            return Self::success();
        }
        io::Error::from_raw_os_error(code).into()
    }

    /// Status for the calling thread's current `errno`.
    pub fn last_os_error() -> Self {
        io::Error::last_os_error().into()
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }

    /// The bounded-wait deadline passed before the operation completed.
    pub fn is_timeout(&self) -> bool {
        self.code == libc::ETIMEDOUT
    }

    /// A non-blocking operation could not proceed immediately.
    pub fn is_would_block(&self) -> bool {
        self.code == libc::EAGAIN
    }

    /// A blocking call was interrupted by a signal (e.g. a thread cancel).
    pub fn is_interrupted(&self) -> bool {
        self.code == libc::EINTR
    }

    pub fn is_already_exists(&self) -> bool {
        self.code == libc::EEXIST
    }

    pub fn is_not_found(&self) -> bool {
        self.code == libc::ENOENT
    }

    /// `Ok(())` on success, otherwise `Err(self)`, so `?` can be used.
    pub fn into_result(self) -> IpcResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for IpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            return f.write_str("success");
        }
        if self.description.is_empty() {
            write!(f, "error {}", self.code)
        } else {
            write!(f, "{} (error {})", self.description, self.code)
        }
    }
}

impl std::error::Error for IpcStatus {}

impl From<io::Error> for IpcStatus {
    fn from(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) => {
                // io::Error's Display appends " (os error N)"; keep the bare text.
                let text = err.to_string();
                let description = match text.rfind(" (os error") {
                    Some(idx) => text[..idx].to_string(),
                    None => text,
                };
                Self { code, description }
            }
            None => Self {
                code: libc::EIO,
                description: err.to_string(),
            },
        }
    }
}

impl From<IpcStatus> for io::Error {
    fn from(status: IpcStatus) -> Self {
        io::Error::from_raw_os_error(status.code)
    }
}

impl From<IpcStatus> for bool {
    fn from(status: IpcStatus) -> Self {
        status.is_success()
    }
}

impl From<&IpcStatus> for bool {
    fn from(status: &IpcStatus) -> Self {
        status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_success() {
        let st = IpcStatus::default();
        assert!(st.is_success());
        assert_eq!(st.code(), 0);
        assert!(st.description().is_empty());
        assert!(bool::from(&st));
    }

    #[test]
    fn from_errno_fills_description() {
        let st = IpcStatus::from_errno(libc::ENOENT);
        assert!(!st.is_success());
        assert!(st.is_not_found());
        assert!(!st.description().is_empty());
        assert!(!st.description().contains("os error"));
        assert!(!bool::from(st));
    }

    #[test]
    fn from_errno_zero_is_success() {
        assert!(IpcStatus::from_errno(0).is_success());
    }

    #[test]
    fn into_result() {
        assert!(IpcStatus::success().into_result().is_ok());
        let err = IpcStatus::new(libc::ETIMEDOUT, "timed out")
            .into_result()
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.description(), "timed out");
    }

    #[test]
    fn io_error_roundtrip_keeps_code() {
        let st = IpcStatus::from_errno(libc::EEXIST);
        let io_err: io::Error = st.clone().into();
        assert_eq!(io_err.raw_os_error(), Some(libc::EEXIST));
        assert_eq!(IpcStatus::from(io_err).code(), st.code());
    }

    #[test]
    fn display() {
        assert_eq!(IpcStatus::success().to_string(), "success");
        assert_eq!(IpcStatus::new(5, "").to_string(), "error 5");
        assert_eq!(IpcStatus::new(5, "boom").to_string(), "boom (error 5)");
    }
}
