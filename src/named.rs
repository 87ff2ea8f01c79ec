// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Name and initialization bookkeeping embedded by every named resource.

use crate::shm_name;
use crate::IpcStatus;

/// Lifecycle state shared by [`MessageQueue`](crate::MessageQueue),
/// [`Semaphore`](crate::Semaphore) and [`SharedSegment`](crate::SharedSegment).
///
/// Holds the logical name, its `"/"`-prefixed system form, whether a create
/// has been attempted, and the status that attempt produced.
#[derive(Debug, Clone, Default)]
pub struct NamedResource {
    name: String,
    system_name: String,
    initialized: bool,
    init_status: IpcStatus,
    release_failure: Option<IpcStatus>,
}

impl NamedResource {
    pub const fn new() -> Self {
        Self {
            name: String::new(),
            system_name: String::new(),
            initialized: false,
            init_status: IpcStatus::success(),
            release_failure: None,
        }
    }

    /// Translate `name` and mark the resource initialized. Never fails; OS
    /// errors are recorded by the owning resource's create logic.
    pub fn bind(&mut self, name: &str) {
        self.name = name.to_string();
        self.system_name = shm_name::system_name(name);
        self.initialized = true;
    }

    /// Logical name as given to `create`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// System-level name (`"/" + name`).
    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    /// Whether `create` has been called at least once.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Status of the last `create`.
    pub fn init_status(&self) -> &IpcStatus {
        &self.init_status
    }

    pub(crate) fn record_init(&mut self, status: IpcStatus) -> IpcStatus {
        self.init_status = status.clone();
        status
    }

    /// Failure from releasing the previous handle during the last re-create,
    /// if any. The create itself still proceeds.
    pub fn release_failure(&self) -> Option<&IpcStatus> {
        self.release_failure.as_ref()
    }

    pub(crate) fn record_release(&mut self, status: IpcStatus) {
        if status.is_success() {
            self.release_failure = None;
        } else {
            log::warn!(
                "ipclib: releasing stale handle for {} failed: {status}",
                self.name
            );
            self.release_failure = Some(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_resource_is_uninitialized() {
        let r = NamedResource::new();
        assert!(!r.is_initialized());
        assert!(r.name().is_empty());
        assert!(r.init_status().is_success());
        assert!(r.release_failure().is_none());
    }

    #[test]
    fn bind_translates_name() {
        let mut r = NamedResource::new();
        r.bind("queue");
        assert!(r.is_initialized());
        assert_eq!(r.name(), "queue");
        assert_eq!(r.system_name(), "/queue");
    }

    #[test]
    fn release_failure_is_kept_until_next_success() {
        let mut r = NamedResource::new();
        r.bind("x");
        r.record_release(IpcStatus::from_errno(libc::EBADF));
        assert_eq!(r.release_failure().map(|s| s.code()), Some(libc::EBADF));
        r.record_release(IpcStatus::success());
        assert!(r.release_failure().is_none());
    }
}
