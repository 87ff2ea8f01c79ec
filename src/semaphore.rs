// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named POSIX counting semaphore (sem_open / sem_wait / sem_post).

use std::ffi::CString;
use std::io;
use std::ptr;
use std::time::Duration;

use crate::named::NamedResource;
use crate::options::SemaphoreOptions;
use crate::platform::posix;
use crate::shm_name;
use crate::{IpcResult, IpcStatus};

/// Largest count a semaphore can hold (`SEM_VALUE_MAX`).
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const SEM_VALUE_MAX: u32 = 32_767;

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub const SEM_VALUE_MAX: u32 = i32::MAX as u32;

/// A named, inter-process counting semaphore.
///
/// Dropping the semaphore closes this process's handle (`sem_close`); the
/// name and its count stay in the OS namespace until [`destroy`](Self::destroy).
pub struct Semaphore {
    named: NamedResource,
    sem: *mut libc::sem_t,
}

// Safety: named semaphore operations are thread-safe and the handle is valid
// for the whole process until sem_close.
unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// An uninitialized semaphore. Every operation fails with `EBADF` until
    /// [`create`](Self::create) succeeds.
    pub fn new() -> Self {
        Self {
            named: NamedResource::new(),
            sem: ptr::null_mut(),
        }
    }

    /// Create or open `name` right away; see [`init_status`](Self::init_status).
    pub fn with_name(name: &str, opts: &SemaphoreOptions) -> Self {
        let mut sem = Self::new();
        sem.create(name, opts);
        sem
    }

    /// Open or create the semaphore `"/" + name` with `opts.initial_value`.
    ///
    /// The initial value only applies when the call creates the semaphore.
    /// A previously held handle is closed first; a failure there lands in
    /// [`release_failure`](Self::release_failure).
    pub fn create(&mut self, name: &str, opts: &SemaphoreOptions) -> IpcStatus {
        if self.named.is_initialized() {
            let released = self.release();
            self.named.record_release(released);
        }

        self.named.bind(name);

        log::trace!("ipclib: starting initialization for semaphore {name}");

        let result = shm_name::to_c_name(name).and_then(|c_name| {
            posix::sem_open(
                &c_name,
                opts.create,
                opts.exclusive,
                opts.permissions,
                opts.initial_value,
            )
        });
        let status = match result {
            Ok(sem) => {
                self.sem = sem;
                IpcStatus::success()
            }
            Err(e) => {
                let st = IpcStatus::from(e);
                log::debug!("ipclib: opening semaphore {name} failed: {st}");
                st
            }
        };
        self.named.record_init(status)
    }

    fn release(&mut self) -> IpcStatus {
        if self.sem.is_null() {
            return IpcStatus::success();
        }
        log::trace!("ipclib: closing semaphore {}", self.named.name());
        let sem = std::mem::replace(&mut self.sem, ptr::null_mut());
        match posix::sem_close(sem) {
            Ok(()) => IpcStatus::success(),
            Err(e) => IpcStatus::from(e),
        }
    }

    fn handle(&self) -> io::Result<*mut libc::sem_t> {
        if self.sem.is_null() {
            Err(io::Error::from_raw_os_error(libc::EBADF))
        } else {
            Ok(self.sem)
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

    pub fn is_open(&self) -> bool {
        !self.sem.is_null()
    }

    pub fn max_value() -> u32 {
        SEM_VALUE_MAX
    }

    /// Current count. Linux never reports waiters as a negative value, but
    /// other systems may; those read as zero.
    pub fn value(&self) -> IpcResult<u32> {
        log::trace!("ipclib: retrieving value for semaphore {}", self.name());
        match self.handle().and_then(posix::sem_getvalue) {
            Ok(v) => Ok(v.max(0) as u32),
            Err(e) => {
                let st = IpcStatus::from(e);
                log::debug!("ipclib: sem_getvalue on {} failed: {st}", self.name());
                Err(st)
            }
        }
    }

    /// Block until the count is positive, then decrement it.
    ///
    /// Returns `EINTR` if a signal (such as a
    /// [`ThreadHandle::cancel`](crate::ThreadHandle::cancel)) interrupts the wait.
    pub fn wait(&self) -> IpcStatus {
        log::trace!("ipclib: waiting on {}", self.name());
        self.finish("sem_wait", self.handle().and_then(posix::sem_wait))
    }

    /// Like [`wait`](Self::wait) but gives up with `ETIMEDOUT` once `timeout`
    /// has elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> IpcStatus {
        log::trace!("ipclib: waiting with a timeout on {}", self.name());
        let result = self.handle().and_then(|sem| {
            let abs = posix::deadline(timeout)?;
            posix::sem_timedwait(sem, &abs)
        });
        self.finish("sem_timedwait", result)
    }

    /// Decrement the count if it is positive, otherwise fail with `EAGAIN`.
    pub fn try_wait(&self) -> IpcStatus {
        self.finish("sem_trywait", self.handle().and_then(posix::sem_trywait))
    }

    /// Increment the count, waking one waiter if any.
    pub fn signal(&self) -> IpcStatus {
        log::trace!("ipclib: signaling on {}", self.name());
        self.finish("sem_post", self.handle().and_then(posix::sem_post))
    }

    /// Remove the semaphore's name from the OS namespace.
    pub fn destroy(&self) -> IpcStatus {
        log::trace!("ipclib: destroying semaphore {}", self.name());
        let result = shm_name::to_c_name(self.name()).and_then(|c| posix::sem_unlink(&c));
        self.finish("sem_unlink", result)
    }

    /// Remove a named semaphore without needing an open instance.
    pub fn clear_storage(name: &str) {
        if let Ok(c_name) = CString::new(shm_name::system_name(name)) {
            let _ = posix::sem_unlink(&c_name);
        }
    }

    fn finish(&self, call: &str, result: io::Result<()>) -> IpcStatus {
        match result {
            Ok(()) => IpcStatus::success(),
            Err(e) => {
                let st = IpcStatus::from(e);
                log::debug!("ipclib: {call} on {} failed: {st}", self.name());
                st
            }
        }
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        let st = self.release();
        if !st.is_success() {
            log::debug!("ipclib: closing semaphore {} failed: {st}", self.name());
        }
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("name", &self.named.name())
            .field("open", &!self.sem.is_null())
            .finish()
    }
}
