// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Open/create options for each resource kind.

/// Permission bits applied to newly created resources.
pub type Permissions = libc::mode_t;

/// Owner read-write, group read-write, other read.
pub const DEFAULT_PERMISSIONS: Permissions = 0o664;

/// Access requested on a message queue or shared segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    #[default]
    ReadAndWrite,
}

impl AccessMode {
    pub fn can_read(self) -> bool {
        !matches!(self, AccessMode::WriteOnly)
    }

    pub fn can_write(self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }
}

/// Options for [`MessageQueue::create`](crate::MessageQueue::create).
///
/// Defaults: create if missing, not exclusive, blocking, read-write,
/// [`DEFAULT_PERMISSIONS`], system default capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOptions {
    pub create: bool,
    pub exclusive: bool,
    pub non_blocking: bool,
    pub mode: AccessMode,
    pub permissions: Permissions,
    /// `(max_messages, max_message_size)` for a newly created queue.
    /// `None` uses the system defaults.
    pub capacity: Option<(usize, usize)>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            create: true,
            exclusive: false,
            non_blocking: false,
            mode: AccessMode::ReadAndWrite,
            permissions: DEFAULT_PERMISSIONS,
            capacity: None,
        }
    }
}

impl QueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn non_blocking(mut self, non_blocking: bool) -> Self {
        self.non_blocking = non_blocking;
        self
    }

    pub fn mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn capacity(mut self, max_messages: usize, max_message_size: usize) -> Self {
        self.capacity = Some((max_messages, max_message_size));
        self
    }
}

/// Options for [`Semaphore::create`](crate::Semaphore::create).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaphoreOptions {
    pub create: bool,
    pub exclusive: bool,
    pub initial_value: u32,
    pub permissions: Permissions,
}

impl Default for SemaphoreOptions {
    fn default() -> Self {
        Self {
            create: true,
            exclusive: false,
            initial_value: 1,
            permissions: DEFAULT_PERMISSIONS,
        }
    }
}

impl SemaphoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn initial_value(mut self, value: u32) -> Self {
        self.initial_value = value;
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }
}

/// Options for [`SharedSegment::create`](crate::SharedSegment::create).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    pub create: bool,
    pub exclusive: bool,
    pub mode: AccessMode,
    pub permissions: Permissions,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            create: true,
            exclusive: false,
            mode: AccessMode::ReadAndWrite,
            permissions: DEFAULT_PERMISSIONS,
        }
    }
}

impl SegmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let q = QueueOptions::default();
        assert!(q.create && !q.exclusive && !q.non_blocking);
        assert_eq!(q.mode, AccessMode::ReadAndWrite);
        assert_eq!(q.permissions, 0o664);
        assert_eq!(q.capacity, None);

        let s = SemaphoreOptions::default();
        assert_eq!(s.initial_value, 1);
        assert!(s.create && !s.exclusive);

        let m = SegmentOptions::default();
        assert_eq!(m.mode, AccessMode::ReadAndWrite);
    }

    #[test]
    fn builder_chain() {
        let q = QueueOptions::new()
            .exclusive(true)
            .non_blocking(true)
            .mode(AccessMode::WriteOnly)
            .capacity(4, 128);
        assert!(q.exclusive && q.non_blocking);
        assert_eq!(q.mode, AccessMode::WriteOnly);
        assert_eq!(q.capacity, Some((4, 128)));
    }

    #[test]
    fn access_mode_rights() {
        assert!(AccessMode::ReadOnly.can_read() && !AccessMode::ReadOnly.can_write());
        assert!(!AccessMode::WriteOnly.can_read() && AccessMode::WriteOnly.can_write());
        assert!(AccessMode::ReadAndWrite.can_read() && AccessMode::ReadAndWrite.can_write());
    }
}
