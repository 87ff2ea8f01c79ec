// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Thin wrappers over the POSIX message queue, named semaphore and shared
// memory calls. Each returns io::Result built from errno; the public
// resource types convert to IpcStatus at their boundary.

use std::ffi::CStr;
use std::io;
use std::ptr;
use std::time::Duration;

use crate::options::{AccessMode, Permissions};

const NANOS_PER_SEC: libc::c_long = 1_000_000_000;

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

/// Absolute CLOCK_REALTIME deadline `timeout` from now, as expected by the
/// `*_timed*` family. Nanoseconds are carried into seconds.
pub fn deadline(timeout: Duration) -> io::Result<libc::timespec> {
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } == -1 {
        return Err(io::Error::last_os_error());
    }
    let nsec = ts.tv_nsec + timeout.subsec_nanos() as libc::c_long;
    ts.tv_sec = ts
        .tv_sec
        .saturating_add(timeout.as_secs().min(libc::time_t::MAX as u64) as libc::time_t)
        .saturating_add((nsec / NANOS_PER_SEC) as libc::time_t);
    ts.tv_nsec = nsec % NANOS_PER_SEC;
    Ok(ts)
}

fn check(ret: libc::c_int) -> io::Result<()> {
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn create_flags(create: bool, exclusive: bool) -> libc::c_int {
    let mut oflag = 0;
    if create {
        oflag |= libc::O_CREAT;
    }
    if exclusive {
        oflag |= libc::O_EXCL;
    }
    oflag
}

// ---------------------------------------------------------------------------
// Message queues (mq_*)
// ---------------------------------------------------------------------------

#[cfg(target_os = "linux")]
pub use self::mq::*;

#[cfg(target_os = "linux")]
mod mq {
    use super::*;

    pub type RawQueue = libc::mqd_t;

    /// Snapshot of `mq_attr`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RawQueueAttr {
        pub flags: libc::c_long,
        pub max_msg: libc::c_long,
        pub msg_size: libc::c_long,
        pub cur_msgs: libc::c_long,
    }

    pub fn queue_flags(mode: AccessMode, create: bool, exclusive: bool, non_blocking: bool) -> libc::c_int {
        let mut oflag = match mode {
            AccessMode::ReadOnly => libc::O_RDONLY,
            AccessMode::WriteOnly => libc::O_WRONLY,
            AccessMode::ReadAndWrite => libc::O_RDWR,
        };
        oflag |= create_flags(create, exclusive);
        if non_blocking {
            oflag |= libc::O_NONBLOCK;
        }
        oflag
    }

    pub fn mq_open(
        name: &CStr,
        oflag: libc::c_int,
        perms: Permissions,
        capacity: Option<(usize, usize)>,
    ) -> io::Result<RawQueue> {
        let mut attr: libc::mq_attr = unsafe { std::mem::zeroed() };
        let attr_ptr = match capacity {
            Some((max_msg, msg_size)) => {
                attr.mq_maxmsg = max_msg as libc::c_long;
                attr.mq_msgsize = msg_size as libc::c_long;
                &mut attr as *mut libc::mq_attr
            }
            None => ptr::null_mut(),
        };
        let mqd = unsafe { libc::mq_open(name.as_ptr(), oflag, perms as libc::c_uint, attr_ptr) };
        if mqd == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(mqd)
    }

    pub fn mq_close(mqd: RawQueue) -> io::Result<()> {
        check(unsafe { libc::mq_close(mqd) })
    }

    pub fn mq_unlink(name: &CStr) -> io::Result<()> {
        check(unsafe { libc::mq_unlink(name.as_ptr()) })
    }

    pub fn mq_getattr(mqd: RawQueue) -> io::Result<RawQueueAttr> {
        let mut attr: libc::mq_attr = unsafe { std::mem::zeroed() };
        check(unsafe { libc::mq_getattr(mqd, &mut attr) })?;
        Ok(RawQueueAttr {
            flags: attr.mq_flags,
            max_msg: attr.mq_maxmsg,
            msg_size: attr.mq_msgsize,
            cur_msgs: attr.mq_curmsgs,
        })
    }

    /// Only `O_NONBLOCK` in `mq_flags` is honoured by the kernel.
    pub fn mq_set_nonblock(mqd: RawQueue, non_blocking: bool) -> io::Result<()> {
        let mut attr: libc::mq_attr = unsafe { std::mem::zeroed() };
        attr.mq_flags = if non_blocking {
            libc::O_NONBLOCK as libc::c_long
        } else {
            0
        };
        check(unsafe { libc::mq_setattr(mqd, &attr, ptr::null_mut()) })
    }

    pub fn mq_send(
        mqd: RawQueue,
        msg: &[u8],
        priority: u32,
        abs_timeout: Option<&libc::timespec>,
    ) -> io::Result<()> {
        let ret = match abs_timeout {
            None => unsafe {
                libc::mq_send(mqd, msg.as_ptr() as *const libc::c_char, msg.len(), priority)
            },
            Some(ts) => unsafe {
                libc::mq_timedsend(
                    mqd,
                    msg.as_ptr() as *const libc::c_char,
                    msg.len(),
                    priority,
                    ts,
                )
            },
        };
        check(ret)
    }

    /// Receive into `buf`; returns `(length, priority)`.
    pub fn mq_receive(
        mqd: RawQueue,
        buf: &mut [u8],
        abs_timeout: Option<&libc::timespec>,
    ) -> io::Result<(usize, u32)> {
        let mut priority: libc::c_uint = 0;
        let n = match abs_timeout {
            None => unsafe {
                libc::mq_receive(
                    mqd,
                    buf.as_mut_ptr() as *mut libc::c_char,
                    buf.len(),
                    &mut priority,
                )
            },
            Some(ts) => unsafe {
                libc::mq_timedreceive(
                    mqd,
                    buf.as_mut_ptr() as *mut libc::c_char,
                    buf.len(),
                    &mut priority,
                    ts,
                )
            },
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok((n as usize, priority))
    }
}

// ---------------------------------------------------------------------------
// Named semaphores (sem_*)
// ---------------------------------------------------------------------------

pub fn sem_open(
    name: &CStr,
    create: bool,
    exclusive: bool,
    perms: Permissions,
    value: u32,
) -> io::Result<*mut libc::sem_t> {
    let oflag = create_flags(create, exclusive);
    let sem = unsafe {
        libc::sem_open(
            name.as_ptr(),
            oflag,
            perms as libc::c_uint,
            value as libc::c_uint,
        )
    };
    if sem == libc::SEM_FAILED {
        return Err(io::Error::last_os_error());
    }
    Ok(sem)
}

pub fn sem_close(sem: *mut libc::sem_t) -> io::Result<()> {
    check(unsafe { libc::sem_close(sem) })
}

pub fn sem_unlink(name: &CStr) -> io::Result<()> {
    check(unsafe { libc::sem_unlink(name.as_ptr()) })
}

pub fn sem_wait(sem: *mut libc::sem_t) -> io::Result<()> {
    check(unsafe { libc::sem_wait(sem) })
}

pub fn sem_trywait(sem: *mut libc::sem_t) -> io::Result<()> {
    check(unsafe { libc::sem_trywait(sem) })
}

pub fn sem_post(sem: *mut libc::sem_t) -> io::Result<()> {
    check(unsafe { libc::sem_post(sem) })
}

pub fn sem_getvalue(sem: *mut libc::sem_t) -> io::Result<libc::c_int> {
    let mut value: libc::c_int = 0;
    check(unsafe { libc::sem_getvalue(sem, &mut value) })?;
    Ok(value)
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub fn sem_timedwait(sem: *mut libc::sem_t, abs_timeout: &libc::timespec) -> io::Result<()> {
    check(unsafe { libc::sem_timedwait(sem, abs_timeout) })
}

/// Apple has no `sem_timedwait`; poll `sem_trywait` until the deadline.
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub fn sem_timedwait(sem: *mut libc::sem_t, abs_timeout: &libc::timespec) -> io::Result<()> {
    loop {
        match sem_trywait(sem) {
            Ok(()) => return Ok(()),
            Err(e) if e.raw_os_error() == Some(libc::EAGAIN) => {}
            Err(e) => return Err(e),
        }
        let now = deadline(Duration::ZERO)?;
        if (now.tv_sec, now.tv_nsec) >= (abs_timeout.tv_sec, abs_timeout.tv_nsec) {
            return Err(io::Error::from_raw_os_error(libc::ETIMEDOUT));
        }
        std::thread::sleep(Duration::from_micros(500));
    }
}

// ---------------------------------------------------------------------------
// Shared memory (shm_open + mmap)
// ---------------------------------------------------------------------------

/// `shm_open` cannot open write-only, so WriteOnly still opens O_RDWR.
pub fn shm_open(
    name: &CStr,
    mode: AccessMode,
    create: bool,
    exclusive: bool,
    perms: Permissions,
) -> io::Result<libc::c_int> {
    let mut oflag = match mode {
        AccessMode::ReadOnly => libc::O_RDONLY,
        AccessMode::WriteOnly | AccessMode::ReadAndWrite => libc::O_RDWR,
    };
    oflag |= create_flags(create, exclusive);
    let fd = unsafe { libc::shm_open(name.as_ptr(), oflag, perms as libc::c_uint) };
    if fd == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(fd)
}

pub fn ftruncate(fd: libc::c_int, size: usize) -> io::Result<()> {
    check(unsafe { libc::ftruncate(fd, size as libc::off_t) })
}

pub fn file_size(fd: libc::c_int) -> io::Result<usize> {
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    check(unsafe { libc::fstat(fd, &mut st) })?;
    Ok(st.st_size as usize)
}

pub fn close(fd: libc::c_int) -> io::Result<()> {
    check(unsafe { libc::close(fd) })
}

pub fn protection(mode: AccessMode) -> libc::c_int {
    match mode {
        AccessMode::ReadOnly => libc::PROT_READ,
        AccessMode::WriteOnly => libc::PROT_WRITE,
        AccessMode::ReadAndWrite => libc::PROT_READ | libc::PROT_WRITE,
    }
}

pub fn mmap_shared(fd: libc::c_int, size: usize, mode: AccessMode) -> io::Result<*mut u8> {
    let mem = unsafe {
        libc::mmap(
            ptr::null_mut(),
            size,
            protection(mode),
            libc::MAP_SHARED,
            fd,
            0,
        )
    };
    if mem == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    Ok(mem as *mut u8)
}

pub fn munmap(mem: *mut u8, size: usize) -> io::Result<()> {
    check(unsafe { libc::munmap(mem as *mut libc::c_void, size) })
}

pub fn shm_unlink(name: &CStr) -> io::Result<()> {
    check(unsafe { libc::shm_unlink(name.as_ptr()) })
}
