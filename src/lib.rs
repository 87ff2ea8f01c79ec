// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named POSIX IPC objects with one lifecycle: message queues, counting
// semaphores and shared-memory segments, plus a small thread helper whose
// cancel interrupts their blocking calls.

#[cfg(not(unix))]
compile_error!("ipclib only supports POSIX systems");

pub mod shm_name;

mod platform;

mod status;
pub use status::{IpcResult, IpcStatus};

mod named;
pub use named::NamedResource;

mod options;
pub use options::{
    AccessMode, Permissions, QueueOptions, SegmentOptions, SemaphoreOptions, DEFAULT_PERMISSIONS,
};

#[cfg(target_os = "linux")]
mod msg_queue;
#[cfg(target_os = "linux")]
pub use msg_queue::{MessageQueue, QueueAttributes};

mod semaphore;
pub use semaphore::{Semaphore, SEM_VALUE_MAX};

mod shared_segment;
pub use shared_segment::{SharedSegment, SharedValue};

mod thread;
pub use thread::{cancellation_requested, ThreadHandle, WAKE_SIGNAL};
