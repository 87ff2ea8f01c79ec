// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named POSIX message queue (mq_open / mq_send / mq_receive).
// The kernel owns message storage; this type only owns the descriptor.

use std::ffi::CString;
use std::io;
use std::time::Duration;

use crate::named::NamedResource;
use crate::options::{AccessMode, QueueOptions};
use crate::platform::posix::{self, RawQueue};
use crate::shm_name;
use crate::{IpcResult, IpcStatus};

/// Current attributes of an open queue, as reported by `mq_getattr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAttributes {
    pub non_blocking: bool,
    pub max_messages: usize,
    pub max_message_size: usize,
    pub current_messages: usize,
}

/// A named, bounded, prioritized message queue.
///
/// Messages sent with [`send`](Self::send) are treated as text and carry a
/// trailing NUL; [`receive`](Self::receive) strips it again. The raw
/// [`send_bytes`](Self::send_bytes) / [`receive_bytes`](Self::receive_bytes)
/// pair moves payloads verbatim with an explicit priority.
///
/// Dropping the queue closes the descriptor but leaves the name in the OS
/// namespace; call [`destroy`](Self::destroy) to remove it.
pub struct MessageQueue {
    named: NamedResource,
    mqd: Option<RawQueue>,
    mode: AccessMode,
}

impl MessageQueue {
    /// An uninitialized queue. Every operation fails with `EBADF` until
    /// [`create`](Self::create) succeeds.
    pub fn new() -> Self {
        Self {
            named: NamedResource::new(),
            mqd: None,
            mode: AccessMode::ReadAndWrite,
        }
    }

    /// Create or open `name` right away. The outcome is available through
    /// [`init_status`](Self::init_status).
    pub fn with_name(name: &str, opts: &QueueOptions) -> Self {
        let mut que = Self::new();
        que.create(name, opts);
        que
    }

    /// Open or create the queue `"/" + name`.
    ///
    /// An already open descriptor is closed first; if that close fails the
    /// failure is kept in [`release_failure`](Self::release_failure) and the
    /// new open proceeds.
    pub fn create(&mut self, name: &str, opts: &QueueOptions) -> IpcStatus {
        if self.named.is_initialized() {
            let released = self.release();
            self.named.record_release(released);
        }

        self.named.bind(name);
        self.mode = opts.mode;

        log::trace!("ipclib: starting initialization for message queue {name}");

        let status = match self.open(opts) {
            Ok(mqd) => {
                self.mqd = Some(mqd);
                IpcStatus::success()
            }
            Err(e) => {
                let st = IpcStatus::from(e);
                log::debug!("ipclib: opening message queue {name} failed: {st}");
                st
            }
        };
        self.named.record_init(status)
    }

    fn open(&self, opts: &QueueOptions) -> io::Result<RawQueue> {
        let c_name = shm_name::to_c_name(self.named.name())?;
        let oflag = posix::queue_flags(opts.mode, opts.create, opts.exclusive, opts.non_blocking);
        posix::mq_open(&c_name, oflag, opts.permissions, opts.capacity)
    }

    fn release(&mut self) -> IpcStatus {
        match self.mqd.take() {
            Some(mqd) => {
                log::trace!("ipclib: closing message queue {}", self.named.name());
                match posix::mq_close(mqd) {
                    Ok(()) => IpcStatus::success(),
                    Err(e) => IpcStatus::from(e),
                }
            }
            None => IpcStatus::success(),
        }
    }

    fn handle(&self) -> IpcResult<RawQueue> {
        self.mqd.ok_or_else(|| IpcStatus::from_errno(libc::EBADF))
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

    /// Status of the last [`create`](Self::create).
    pub fn init_status(&self) -> &IpcStatus {
        self.named.init_status()
    }

    pub fn release_failure(&self) -> Option<&IpcStatus> {
        self.named.release_failure()
    }

    /// Whether a descriptor is currently held.
    pub fn is_open(&self) -> bool {
        self.mqd.is_some()
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    // ----- attributes -----

    pub fn attributes(&self) -> IpcResult<QueueAttributes> {
        let mqd = self.handle()?;
        log::trace!("ipclib: retrieving attributes for message queue {}", self.name());
        let attr = posix::mq_getattr(mqd).map_err(|e| {
            let st = IpcStatus::from(e);
            log::debug!("ipclib: mq_getattr on {} failed: {st}", self.name());
            st
        })?;
        Ok(QueueAttributes {
            non_blocking: attr.flags & libc::O_NONBLOCK as libc::c_long != 0,
            max_messages: attr.max_msg as usize,
            max_message_size: attr.msg_size as usize,
            current_messages: attr.cur_msgs as usize,
        })
    }

    /// Largest message the queue accepts, in bytes.
    pub fn max_msg_size(&self) -> IpcResult<usize> {
        self.attributes().map(|a| a.max_message_size)
    }

    /// Capacity in messages.
    pub fn max_msg(&self) -> IpcResult<usize> {
        self.attributes().map(|a| a.max_messages)
    }

    /// Messages currently queued.
    pub fn msg_count(&self) -> IpcResult<usize> {
        self.attributes().map(|a| a.current_messages)
    }

    pub fn is_empty(&self) -> IpcResult<bool> {
        self.msg_count().map(|n| n == 0)
    }

    pub fn is_non_blocking(&self) -> IpcResult<bool> {
        self.attributes().map(|a| a.non_blocking)
    }

    /// Switch the open description between blocking and non-blocking.
    pub fn set_non_blocking(&self, non_blocking: bool) -> IpcStatus {
        let mqd = match self.handle() {
            Ok(mqd) => mqd,
            Err(st) => return st,
        };
        self.finish("mq_setattr", posix::mq_set_nonblock(mqd, non_blocking))
    }

    // ----- send -----

    /// Enqueue `message` plus a trailing NUL at priority 0. Blocks while the
    /// queue is full unless it is non-blocking (then `EAGAIN`).
    pub fn send(&self, message: &str) -> IpcStatus {
        log::trace!("ipclib: sending message on {}", self.name());
        self.send_raw(&text_payload(message), 0, None)
    }

    /// Like [`send`](Self::send) but gives up with `ETIMEDOUT` once `timeout`
    /// has elapsed.
    pub fn send_timeout(&self, message: &str, timeout: Duration) -> IpcStatus {
        log::trace!("ipclib: sending message with a timeout on {}", self.name());
        self.send_raw(&text_payload(message), 0, Some(timeout))
    }

    /// Enqueue `payload` unchanged with the given priority.
    pub fn send_bytes(&self, payload: &[u8], priority: u32) -> IpcStatus {
        self.send_raw(payload, priority, None)
    }

    pub fn send_bytes_timeout(&self, payload: &[u8], priority: u32, timeout: Duration) -> IpcStatus {
        self.send_raw(payload, priority, Some(timeout))
    }

    fn send_raw(&self, payload: &[u8], priority: u32, timeout: Option<Duration>) -> IpcStatus {
        let result = self.handle().map_err(io::Error::from).and_then(|mqd| {
            let abs = timeout.map(posix::deadline).transpose()?;
            posix::mq_send(mqd, payload, priority, abs.as_ref())
        });
        self.finish("mq_send", result)
    }

    // ----- receive -----

    /// Block until a message arrives and replace `buffer` with its text.
    ///
    /// `buffer` is cleared first, so it is empty on failure.
    pub fn receive(&self, buffer: &mut String) -> IpcStatus {
        log::trace!("ipclib: receiving message on {}", self.name());
        self.receive_text(buffer, None)
    }

    /// Like [`receive`](Self::receive) but gives up with `ETIMEDOUT` once
    /// `timeout` has elapsed.
    pub fn receive_timeout(&self, buffer: &mut String, timeout: Duration) -> IpcStatus {
        log::trace!("ipclib: receiving message with a timeout on {}", self.name());
        self.receive_text(buffer, Some(timeout))
    }

    /// Receive one message verbatim into `buffer`, returning its priority.
    pub fn receive_bytes(&self, buffer: &mut Vec<u8>) -> IpcResult<u32> {
        self.receive_raw(buffer, None)
    }

    pub fn receive_bytes_timeout(&self, buffer: &mut Vec<u8>, timeout: Duration) -> IpcResult<u32> {
        self.receive_raw(buffer, Some(timeout))
    }

    fn receive_text(&self, buffer: &mut String, timeout: Option<Duration>) -> IpcStatus {
        buffer.clear();
        let mut raw = Vec::new();
        match self.receive_raw(&mut raw, timeout) {
            Ok(_) => {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                buffer.push_str(&String::from_utf8_lossy(&raw[..end]));
                IpcStatus::success()
            }
            Err(st) => st,
        }
    }

    fn receive_raw(&self, buffer: &mut Vec<u8>, timeout: Option<Duration>) -> IpcResult<u32> {
        buffer.clear();
        let mqd = self.handle()?;
        // mq_receive rejects buffers smaller than mq_msgsize.
        let capacity = self.max_msg_size()? + 1;
        buffer.resize(capacity, 0);

        let result = match timeout.map(posix::deadline).transpose() {
            Ok(abs) => posix::mq_receive(mqd, buffer.as_mut_slice(), abs.as_ref()),
            Err(e) => Err(e),
        };
        match result {
            Ok((len, priority)) => {
                buffer.truncate(len);
                Ok(priority)
            }
            Err(e) => {
                buffer.clear();
                let st = IpcStatus::from(e);
                log::debug!("ipclib: mq_receive on {} failed: {st}", self.name());
                Err(st)
            }
        }
    }

    // ----- namespace -----

    /// Remove the queue's name from the OS namespace. The descriptor held by
    /// this instance stays usable until it is dropped or re-created.
    pub fn destroy(&self) -> IpcStatus {
        log::trace!("ipclib: destroying message queue {}", self.name());
        let result = shm_name::to_c_name(self.name()).and_then(|c| posix::mq_unlink(&c));
        self.finish("mq_unlink", result)
    }

    /// Remove a named queue without needing an open instance.
    pub fn clear_storage(name: &str) {
        if let Ok(c_name) = CString::new(shm_name::system_name(name)) {
            let _ = posix::mq_unlink(&c_name);
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

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        let st = self.release();
        if !st.is_success() {
            log::debug!("ipclib: closing message queue {} failed: {st}", self.name());
        }
    }
}

impl std::fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("name", &self.named.name())
            .field("open", &self.mqd.is_some())
            .field("mode", &self.mode)
            .finish()
    }
}

fn text_payload(message: &str) -> Vec<u8> {
    let mut v = Vec::with_capacity(message.len() + 1);
    v.extend_from_slice(message.as_bytes());
    v.push(0);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_is_nul_terminated() {
        assert_eq!(text_payload("hi"), b"hi\0");
        assert_eq!(text_payload(""), b"\0");
    }

    #[test]
    fn uninitialized_queue_reports_ebadf() {
        let que = MessageQueue::new();
        assert!(!que.is_initialized());
        assert_eq!(que.send("x").code(), libc::EBADF);
        let mut buf = String::from("stale");
        assert_eq!(que.receive(&mut buf).code(), libc::EBADF);
        assert!(buf.is_empty());
        assert_eq!(que.msg_count().unwrap_err().code(), libc::EBADF);
    }
}
