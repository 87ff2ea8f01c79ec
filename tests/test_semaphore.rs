// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named semaphore lifecycle, counting and timeout behaviour.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ipclib::{Semaphore, SemaphoreOptions, SEM_VALUE_MAX};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("ipclib_{prefix}_sem_{}_{n}", std::process::id())
}

fn open(name: &str, value: u32) -> Semaphore {
    let sem = Semaphore::with_name(name, &SemaphoreOptions::new().initial_value(value));
    assert!(sem.init_status().is_success(), "open {name}: {}", sem.init_status());
    sem
}

#[test]
fn create_with_initial_value() {
    let name = unique_name("initial");
    Semaphore::clear_storage(&name);

    let sem = open(&name, 5);
    assert!(sem.is_initialized());
    assert_eq!(sem.name(), name);
    assert_eq!(sem.system_name(), format!("/{name}"));
    assert_eq!(sem.value().unwrap(), 5);

    assert!(sem.destroy().is_success());
}

#[test]
fn default_initial_value_is_one() {
    let name = unique_name("default");
    Semaphore::clear_storage(&name);

    let sem = Semaphore::with_name(&name, &SemaphoreOptions::default());
    assert_eq!(sem.value().unwrap(), 1);
    sem.destroy();
}

#[test]
fn exclusive_create_twice_fails() {
    let name = unique_name("exclusive");
    Semaphore::clear_storage(&name);

    let opts = SemaphoreOptions::new().exclusive(true);
    let first = Semaphore::with_name(&name, &opts);
    assert!(first.init_status().is_success());

    let second = Semaphore::with_name(&name, &opts);
    assert!(second.init_status().is_already_exists());
    assert!(!second.is_open());
    assert!(!second.wait().is_success());

    first.destroy();
}

#[test]
fn open_missing_without_create_fails() {
    let name = unique_name("missing");
    Semaphore::clear_storage(&name);

    let sem = Semaphore::with_name(&name, &SemaphoreOptions::new().create(false));
    assert!(sem.init_status().is_not_found());
    assert!(sem.is_initialized());
}

#[test]
fn wait_signal() {
    let name = unique_name("wait_signal");
    Semaphore::clear_storage(&name);

    let sem = open(&name, 1);
    assert!(sem.wait().is_success());
    assert_eq!(sem.value().unwrap(), 0);
    assert!(sem.signal().is_success());
    assert_eq!(sem.value().unwrap(), 1);

    sem.destroy();
}

#[test]
fn wait_timeout_on_zero_reports_timeout() {
    let name = unique_name("timeout");
    Semaphore::clear_storage(&name);

    let sem = open(&name, 0);
    let start = Instant::now();
    let st = sem.wait_timeout(Duration::from_secs(1));
    let elapsed = start.elapsed();

    assert!(!st.is_success());
    assert!(st.is_timeout(), "expected ETIMEDOUT, got {st}");
    assert!(elapsed.as_millis() >= 900, "waited only {}ms", elapsed.as_millis());

    sem.destroy();
}

#[test]
fn wait_timeout_succeeds_when_available() {
    let name = unique_name("timed_ok");
    Semaphore::clear_storage(&name);

    let sem = open(&name, 1);
    assert!(sem.wait_timeout(Duration::from_millis(100)).is_success());
    sem.destroy();
}

#[test]
fn try_wait() {
    let name = unique_name("try_wait");
    Semaphore::clear_storage(&name);

    let sem = open(&name, 1);
    assert!(sem.try_wait().is_success());
    assert!(sem.try_wait().is_would_block());
    sem.destroy();
}

#[test]
fn signal_n_times_adds_n() {
    let name = unique_name("signal_n");
    Semaphore::clear_storage(&name);

    let initial = 2u32;
    let n = 7u32;
    let sem = open(&name, initial);
    for _ in 0..n {
        assert!(sem.signal().is_success());
    }
    assert_eq!(sem.value().unwrap(), (initial + n).min(SEM_VALUE_MAX));

    sem.destroy();
}

#[cfg(target_os = "linux")]
#[test]
fn signal_at_max_value_overflows() {
    let name = unique_name("at_max");
    Semaphore::clear_storage(&name);

    let sem = open(&name, SEM_VALUE_MAX);
    assert_eq!(sem.value().unwrap(), SEM_VALUE_MAX);

    let st = sem.signal();
    assert_eq!(st.code(), libc::EOVERFLOW);
    assert_eq!(sem.value().unwrap(), SEM_VALUE_MAX);

    sem.destroy();
}

#[test]
fn signal_wakes_blocked_waiter() {
    let name = unique_name("wake");
    Semaphore::clear_storage(&name);

    let sem = Arc::new(open(&name, 0));
    let wait_started = Arc::new(AtomicBool::new(false));
    let wait_succeeded = Arc::new(AtomicBool::new(false));

    let sem2 = Arc::clone(&sem);
    let ws = Arc::clone(&wait_started);
    let wsucc = Arc::clone(&wait_succeeded);
    let waiter = thread::spawn(move || {
        ws.store(true, Ordering::SeqCst);
        let st = sem2.wait();
        wsucc.store(st.is_success(), Ordering::SeqCst);
    });

    while !wait_started.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(50));

    assert!(sem.signal().is_success());

    waiter.join().unwrap();
    assert!(wait_succeeded.load(Ordering::SeqCst));
    sem.destroy();
}

#[test]
fn producer_consumer() {
    let name = unique_name("prod_cons");
    Semaphore::clear_storage(&name);

    let sem = Arc::new(open(&name, 0));
    let consumed = Arc::new(AtomicI32::new(0));
    let count = 10;

    let sem_p = Arc::clone(&sem);
    let producer = thread::spawn(move || {
        for _ in 0..count {
            assert!(sem_p.signal().is_success());
            thread::sleep(Duration::from_millis(1));
        }
    });

    let sem_c = Arc::clone(&sem);
    let cons = Arc::clone(&consumed);
    let consumer = thread::spawn(move || {
        for _ in 0..count {
            assert!(sem_c.wait_timeout(Duration::from_secs(5)).is_success());
            cons.fetch_add(1, Ordering::Relaxed);
        }
    });

    producer.join().unwrap();
    consumer.join().unwrap();

    assert_eq!(consumed.load(Ordering::Relaxed), count);
    sem.destroy();
}

#[test]
fn two_instances_share_a_name() {
    let name = unique_name("sharing");
    Semaphore::clear_storage(&name);

    let a = open(&name, 0);
    let b = Semaphore::with_name(&name, &SemaphoreOptions::new().create(false));
    assert!(b.init_status().is_success());

    assert!(b.signal().is_success());
    assert!(a.wait_timeout(Duration::from_millis(500)).is_success());

    a.destroy();
}

#[test]
fn destroy_then_create_resets_value() {
    let name = unique_name("reset");
    Semaphore::clear_storage(&name);

    let sem = open(&name, 3);
    sem.signal();
    assert!(sem.destroy().is_success());
    drop(sem);

    let sem = open(&name, 0);
    assert_eq!(sem.value().unwrap(), 0);
    sem.destroy();
}

#[test]
fn destroy_keeps_local_handle_usable() {
    let name = unique_name("unlinked");
    Semaphore::clear_storage(&name);

    let sem = open(&name, 0);
    assert!(sem.destroy().is_success());
    assert!(sem.signal().is_success());
    assert_eq!(sem.value().unwrap(), 1);

    // Second unlink has nothing left to remove.
    assert!(sem.destroy().is_not_found());
}

#[test]
fn recreate_switches_to_new_name() {
    let first = unique_name("recreate_a");
    let second = unique_name("recreate_b");
    Semaphore::clear_storage(&first);
    Semaphore::clear_storage(&second);

    let mut sem = open(&first, 4);
    let st = sem.create(&second, &SemaphoreOptions::new().initial_value(2));
    assert!(st.is_success());
    assert!(sem.release_failure().is_none());
    assert_eq!(sem.name(), second);
    assert_eq!(sem.value().unwrap(), 2);

    sem.destroy();
    Semaphore::clear_storage(&first);
}

#[test]
fn initial_value_above_max_is_rejected() {
    if SEM_VALUE_MAX == u32::MAX {
        return;
    }
    let name = unique_name("too_big");
    Semaphore::clear_storage(&name);

    let sem = Semaphore::with_name(&name, &SemaphoreOptions::new().initial_value(SEM_VALUE_MAX + 1));
    assert_eq!(sem.init_status().code(), libc::EINVAL);
}
