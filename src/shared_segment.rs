// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named shared-memory segment holding exactly one value of type T.
// shm_open + ftruncate + mmap; the descriptor is closed once mapped.

use std::ffi::CString;
use std::io;
use std::marker::PhantomData;
use std::mem;
use std::ptr;

use crate::named::NamedResource;
use crate::options::{AccessMode, SegmentOptions};
use crate::platform::posix;
use crate::shm_name;
use crate::{IpcResult, IpcStatus};

/// Types that may live in a shared segment.
///
/// # Safety
/// The type must be plain data: `Copy`, no pointers or references, no
/// padding-dependent invariants, and **every** bit pattern (including the
/// all-zero pattern a fresh segment starts with) must be a valid value.
/// Another process can write arbitrary bytes into the mapping.
pub unsafe trait SharedValue: Copy + 'static {}

macro_rules! impl_shared_value {
    ($($t:ty),* $(,)?) => {
        $(unsafe impl SharedValue for $t {})*
    };
}

impl_shared_value!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

unsafe impl<T: SharedValue, const N: usize> SharedValue for [T; N] {}

/// A named shared-memory mapping of one `T`.
///
/// Reads and writes go straight to the mapping without any synchronization;
/// pair the segment with a [`Semaphore`](crate::Semaphore) when several
/// processes touch it. Dropping unmaps the segment; the content stays in the
/// OS namespace until [`destroy`](Self::destroy).
pub struct SharedSegment<T: SharedValue> {
    named: NamedResource,
    mem: *mut T,
    mode: AccessMode,
    _marker: PhantomData<T>,
}

// Safety: the mapping is process-shared memory; access rules are those of T.
unsafe impl<T: SharedValue + Send> Send for SharedSegment<T> {}
unsafe impl<T: SharedValue + Sync> Sync for SharedSegment<T> {}

impl<T: SharedValue> SharedSegment<T> {
    /// An unmapped segment. Accessors fail with `EBADF` until
    /// [`create`](Self::create) succeeds.
    pub fn new() -> Self {
        Self {
            named: NamedResource::new(),
            mem: ptr::null_mut(),
            mode: AccessMode::ReadAndWrite,
            _marker: PhantomData,
        }
    }

    /// Create or open `name` right away; see [`init_status`](Self::init_status).
    pub fn with_name(name: &str, opts: &SegmentOptions) -> Self {
        let mut seg = Self::new();
        seg.create(name, opts);
        seg
    }

    /// Size of the mapping: exactly one `T`.
    pub const fn size() -> usize {
        mem::size_of::<T>()
    }

    /// Open or create the segment `"/" + name`, size it to one `T`, and map
    /// it with the protection implied by `opts.mode`.
    ///
    /// The first failing step (open, size, map, close) determines the
    /// returned status. An existing mapping is released first; a failure
    /// there lands in [`release_failure`](Self::release_failure).
    pub fn create(&mut self, name: &str, opts: &SegmentOptions) -> IpcStatus {
        if self.named.is_initialized() {
            let released = self.release();
            self.named.record_release(released);
        }

        self.named.bind(name);
        self.mode = opts.mode;

        log::trace!("ipclib: starting initialization for shared segment {name}");

        let status = match self.map(opts) {
            Ok(mem) => {
                self.mem = mem;
                IpcStatus::success()
            }
            Err(e) => {
                let st = IpcStatus::from(e);
                log::debug!("ipclib: mapping shared segment {name} failed: {st}");
                st
            }
        };
        self.named.record_init(status)
    }

    fn map(&self, opts: &SegmentOptions) -> io::Result<*mut T> {
        let size = Self::size();
        if size == 0 {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        let c_name = shm_name::to_c_name(self.named.name())?;
        let fd = posix::shm_open(&c_name, opts.mode, opts.create, opts.exclusive, opts.permissions)?;

        let mapped = Self::size_and_map(fd, size, opts.mode);
        let closed = posix::close(fd);
        let mem = mapped?;
        if let Err(e) = closed {
            let _ = posix::munmap(mem, size);
            return Err(e);
        }
        Ok(mem as *mut T)
    }

    fn size_and_map(fd: libc::c_int, size: usize, mode: AccessMode) -> io::Result<*mut u8> {
        let current = posix::file_size(fd)?;
        if mode.can_write() {
            // macOS refuses to resize an object that already has a size.
            if current != size {
                posix::ftruncate(fd, size)?;
            }
        } else if current < size {
            // A read-only descriptor cannot be resized; refuse a short object
            // rather than fault on access.
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        posix::mmap_shared(fd, size, mode)
    }

    fn release(&mut self) -> IpcStatus {
        if self.mem.is_null() {
            return IpcStatus::success();
        }
        log::trace!("ipclib: unmapping shared segment {}", self.named.name());
        let mem = mem::replace(&mut self.mem, ptr::null_mut());
        match posix::munmap(mem as *mut u8, Self::size()) {
            Ok(()) => IpcStatus::success(),
            Err(e) => IpcStatus::from(e),
        }
    }

    pub fn name(&self) -> &str {
        self.named.name()
    }

    pub fn system_name(&self) -> &str {
        self.named.system_name()
    }

    pub fn is_initialized(&self) -> bool {
        self.named.is_initialized()
    }

    pub fn init_status(&self) -> &IpcStatus {
        self.named.init_status()
    }

    pub fn release_failure(&self) -> Option<&IpcStatus> {
        self.named.release_failure()
    }

    pub fn is_mapped(&self) -> bool {
        !self.mem.is_null()
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Base address of the mapping, null when unmapped.
    pub fn as_ptr(&self) -> *mut T {
        self.mem
    }

    fn checked(&self, readable: bool, writable: bool) -> IpcResult<*mut T> {
        if self.mem.is_null() {
            return Err(IpcStatus::from_errno(libc::EBADF));
        }
        if (readable && !self.mode.can_read()) || (writable && !self.mode.can_write()) {
            return Err(IpcStatus::from_errno(libc::EACCES));
        }
        Ok(self.mem)
    }

    /// Reference to the value inside the mapping.
    ///
    /// Other processes may change the value behind this reference; use an
    /// external lock if that matters.
    pub fn value(&self) -> IpcResult<&T> {
        let p = self.checked(true, false)?;
        Ok(unsafe { &*p })
    }

    /// Mutable reference to the value inside the mapping.
    pub fn value_mut(&mut self) -> IpcResult<&mut T> {
        let p = self.checked(true, true)?;
        Ok(unsafe { &mut *p })
    }

    /// Write `value` through the mapping.
    pub fn set_value(&mut self, value: T) -> IpcStatus {
        match self.checked(false, true) {
            Ok(p) => {
                unsafe { ptr::write_volatile(p, value) };
                IpcStatus::success()
            }
            Err(st) => st,
        }
    }

    /// Remove the segment's name from the OS namespace. The mapping stays
    /// valid until this instance is dropped or re-created.
    pub fn destroy(&self) -> IpcStatus {
        log::trace!("ipclib: destroying shared segment {}", self.name());
        match shm_name::to_c_name(self.name()).and_then(|c| posix::shm_unlink(&c)) {
            Ok(()) => IpcStatus::success(),
            Err(e) => {
                let st = IpcStatus::from(e);
                log::debug!("ipclib: shm_unlink on {} failed: {st}", self.name());
                st
            }
        }
    }

    /// Remove a named segment without needing an open instance.
    pub fn clear_storage(name: &str) {
        if let Ok(c_name) = CString::new(shm_name::system_name(name)) {
            let _ = posix::shm_unlink(&c_name);
        }
    }
}

impl<T: SharedValue> Default for SharedSegment<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SharedValue> Drop for SharedSegment<T> {
    fn drop(&mut self) {
        let st = self.release();
        if !st.is_success() {
            log::debug!("ipclib: unmapping shared segment {} failed: {st}", self.name());
        }
    }
}

impl<T: SharedValue> std::fmt::Debug for SharedSegment<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSegment")
            .field("name", &self.named.name())
            .field("mapped", &!self.mem.is_null())
            .field("mode", &self.mode)
            .field("size", &Self::size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_one_value() {
        assert_eq!(SharedSegment::<u64>::size(), 8);
        assert_eq!(SharedSegment::<[u32; 4]>::size(), 16);
    }

    #[test]
    fn unmapped_segment_reports_ebadf() {
        let mut seg = SharedSegment::<u32>::new();
        assert!(!seg.is_mapped());
        assert_eq!(seg.value().unwrap_err().code(), libc::EBADF);
        assert_eq!(seg.set_value(1).code(), libc::EBADF);
    }
}
