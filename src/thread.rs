// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Minimal run / join / cancel helper over OS threads.
//
// Cancellation is cooperative: `cancel` raises a per-thread flag and sends
// WAKE_SIGNAL to the thread. The signal handler does nothing and is installed
// without SA_RESTART, so a blocking mq_receive / sem_wait in that thread
// returns EINTR and the caller can check `cancellation_requested()`.

use std::cell::RefCell;
use std::io;
use std::os::unix::thread::JoinHandleExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use crate::{IpcResult, IpcStatus};

/// Signal used to interrupt blocking calls in a cancelled thread.
pub const WAKE_SIGNAL: libc::c_int = libc::SIGUSR2;

thread_local! {
    static CANCEL_FLAG: RefCell<Option<Arc<AtomicBool>>> = const { RefCell::new(None) };
}

/// Whether [`ThreadHandle::cancel`] was called for the current thread.
/// Always false on threads not started through a [`ThreadHandle`].
pub fn cancellation_requested() -> bool {
    CANCEL_FLAG.with(|flag| {
        flag.borrow()
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Acquire))
    })
}

extern "C" fn on_wake_signal(_: libc::c_int) {}

fn install_wake_handler() -> IpcStatus {
    static INSTALLED: OnceLock<i32> = OnceLock::new();
    let code = *INSTALLED.get_or_init(|| unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_wake_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        sa.sa_flags = 0;
        libc::sigemptyset(&mut sa.sa_mask);
        if libc::sigaction(WAKE_SIGNAL, &sa, std::ptr::null_mut()) == -1 {
            io::Error::last_os_error().raw_os_error().unwrap_or(libc::EINVAL)
        } else {
            0
        }
    });
    IpcStatus::from_errno(code)
}

/// Handle to one OS thread started with [`run`](Self::run).
pub struct ThreadHandle<T> {
    handle: Option<JoinHandle<T>>,
    cancel: Arc<AtomicBool>,
}

impl<T: Send + 'static> ThreadHandle<T> {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start `entry(parameter)` on a new thread. Fails with `EBUSY` if this
    /// handle still owns an unjoined thread.
    pub fn run<F, P>(&mut self, entry: F, parameter: P) -> IpcStatus
    where
        F: FnOnce(P) -> T + Send + 'static,
        P: Send + 'static,
    {
        log::trace!("ipclib: starting a new thread");
        if self.handle.is_some() {
            return IpcStatus::from_errno(libc::EBUSY);
        }
        let st = install_wake_handler();
        if !st.is_success() {
            log::debug!("ipclib: installing the wake handler failed: {st}");
            return st;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Arc::clone(&cancel);
        let spawned = thread::Builder::new().spawn(move || {
            CANCEL_FLAG.with(|flag| *flag.borrow_mut() = Some(cancel));
            entry(parameter)
        });
        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                IpcStatus::success()
            }
            Err(e) => {
                let st = IpcStatus::from(e);
                log::debug!("ipclib: starting a thread failed: {st}");
                st
            }
        }
    }

    /// Wait for the thread and return its result. `ESRCH` if nothing is
    /// running, `ENOTRECOVERABLE` if the thread panicked.
    pub fn join(&mut self) -> IpcResult<T> {
        log::trace!("ipclib: joining thread");
        let handle = self
            .handle
            .take()
            .ok_or_else(|| IpcStatus::from_errno(libc::ESRCH))?;
        handle
            .join()
            .map_err(|_| IpcStatus::new(libc::ENOTRECOVERABLE, "thread panicked"))
    }

    /// Request cancellation: set the thread's flag and interrupt any blocking
    /// call it is in. A thread that is not blocked yet only sees the flag.
    pub fn cancel(&self) -> IpcStatus {
        log::trace!("ipclib: sending a cancel request");
        let Some(handle) = self.handle.as_ref() else {
            return IpcStatus::from_errno(libc::ESRCH);
        };
        self.cancel.store(true, Ordering::Release);
        let eno = unsafe { libc::pthread_kill(handle.as_pthread_t(), WAKE_SIGNAL) };
        let st = IpcStatus::from_errno(eno);
        if !st.is_success() {
            log::debug!("ipclib: cancel request failed: {st}");
        }
        st
    }

    /// Whether a thread was started and has not been joined yet.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the started thread has returned (it may still need a join).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl<T: Send + 'static> Default for ThreadHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}
