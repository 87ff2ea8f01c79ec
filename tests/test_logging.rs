// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Diagnostics go through the `log` facade and can be captured by tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use log::{Level, LevelFilter, Log, Metadata, Record};

use ipclib::{SegmentOptions, Semaphore, SemaphoreOptions, SharedSegment};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("ipclib_{prefix}_log_{}_{n}", std::process::id())
}

struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

fn capture() -> &'static Capture {
    static LOGGER: OnceLock<&'static Capture> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger: &'static Capture = Box::leak(Box::new(Capture {
            records: Mutex::new(Vec::new()),
        }));
        log::set_logger(logger).expect("logger already set");
        log::set_max_level(LevelFilter::Trace);
        logger
    })
}

fn records_about(name: &str) -> Vec<(Level, String)> {
    capture()
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, msg)| msg.contains(name))
        .cloned()
        .collect()
}

#[test]
fn failed_open_is_logged_at_debug() {
    capture();
    let name = unique_name("missing");
    Semaphore::clear_storage(&name);

    let sem = Semaphore::with_name(&name, &SemaphoreOptions::new().create(false));
    assert!(sem.init_status().is_not_found());

    let recs = records_about(&name);
    assert!(recs
        .iter()
        .any(|(lvl, msg)| *lvl == Level::Trace && msg.contains("starting initialization")));
    assert!(recs
        .iter()
        .any(|(lvl, msg)| *lvl == Level::Debug && msg.contains("failed")));
}

#[test]
fn successful_operations_only_trace() {
    capture();
    let name = unique_name("ok");
    SharedSegment::<u32>::clear_storage(&name);

    let mut seg = SharedSegment::<u32>::with_name(&name, &SegmentOptions::default());
    assert!(seg.set_value(3).is_success());
    assert!(seg.destroy().is_success());

    let recs = records_about(&name);
    assert!(!recs.is_empty());
    assert!(recs.iter().all(|(lvl, _)| *lvl == Level::Trace));
}
