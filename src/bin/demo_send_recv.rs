// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Shared segment + semaphore demo.
//
// Usage:
//   demo_send_recv send <interval_ms>
//   demo_send_recv recv <timeout_ms>
//
// Two processes share the segment "/ipclib-demo" holding a `Frame` and two
// semaphores: "ipclib-demo-lock" (mutual exclusion, starts at 1) and
// "ipclib-demo-ready" (counts published frames, starts at 0). The sender
// updates the frame every <interval_ms> and signals "ready"; the receiver
// waits on "ready" with a <timeout_ms> bound and prints what it read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ipclib::{SegmentOptions, Semaphore, SemaphoreOptions, SharedSegment, SharedValue};

const SEGMENT: &str = "ipclib-demo";
const LOCK: &str = "ipclib-demo-lock";
const READY: &str = "ipclib-demo-ready";

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct Frame {
    sequence: u64,
    samples: [f32; 8],
}

unsafe impl SharedValue for Frame {}

fn check(what: &str, st: &ipclib::IpcStatus) {
    if !st.is_success() {
        eprintln!("{what}: {st}");
        std::process::exit(1);
    }
}

fn open_all() -> (SharedSegment<Frame>, Semaphore, Semaphore) {
    let seg = SharedSegment::<Frame>::with_name(SEGMENT, &SegmentOptions::default());
    check("segment", seg.init_status());
    let lock = Semaphore::with_name(LOCK, &SemaphoreOptions::new().initial_value(1));
    check("lock", lock.init_status());
    let ready = Semaphore::with_name(READY, &SemaphoreOptions::new().initial_value(0));
    check("ready", ready.init_status());
    (seg, lock, ready)
}

fn do_send(interval_ms: u64, quit: Arc<AtomicBool>) {
    let (mut seg, lock, ready) = open_all();
    let mut sequence = 0u64;
    while !quit.load(Ordering::Acquire) {
        sequence += 1;
        let mut frame = Frame {
            sequence,
            samples: [0.0; 8],
        };
        for (i, s) in frame.samples.iter_mut().enumerate() {
            *s = ((sequence as f32) * 0.1 + i as f32).sin();
        }

        check("lock wait", &lock.wait());
        let st = seg.set_value(frame);
        check("lock signal", &lock.signal());
        check("write", &st);
        check("ready signal", &ready.signal());

        println!("send seq: {sequence}");
        thread::sleep(Duration::from_millis(interval_ms));
    }

    seg.destroy();
    lock.destroy();
    ready.destroy();
    println!("send: quit...");
}

fn do_recv(timeout_ms: u64, quit: Arc<AtomicBool>) {
    let (seg, lock, ready) = open_all();
    let mut k = 1usize;
    while !quit.load(Ordering::Acquire) {
        let st = ready.wait_timeout(Duration::from_millis(timeout_ms));
        if st.is_timeout() || st.is_interrupted() {
            println!("recv waiting... {k}");
            k += 1;
            continue;
        }
        check("ready wait", &st);

        check("lock wait", &lock.wait());
        let frame = seg.value().copied();
        check("lock signal", &lock.signal());
        match frame {
            Ok(f) => println!("recv seq: {} first sample: {:.3}", f.sequence, f.samples[0]),
            Err(st) => check("read", &st),
        }
        k = 1;
    }
    println!("recv: quit...");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: demo_send_recv send <interval_ms>");
        eprintln!("       demo_send_recv recv <timeout_ms>");
        std::process::exit(1);
    }

    let quit = Arc::new(AtomicBool::new(false));

    {
        let q = Arc::clone(&quit);
        ctrlc_or_sigterm(move || q.store(true, Ordering::Release));
    }

    let ms: u64 = args[2].parse().expect("milliseconds");
    match args[1].as_str() {
        "send" => do_send(ms, quit),
        "recv" => do_recv(ms, quit),
        other => {
            eprintln!("unknown mode: {other}");
            std::process::exit(1);
        }
    }
}

// Minimal signal hook: sets the flag on SIGINT / SIGTERM / SIGHUP.
fn ctrlc_or_sigterm(f: impl Fn() + Send + 'static) {
    use std::sync::Mutex;
    static CB: std::sync::OnceLock<Mutex<Box<dyn Fn() + Send>>> = std::sync::OnceLock::new();
    CB.get_or_init(|| Mutex::new(Box::new(f)));
    extern "C" fn handler(_: libc::c_int) {
        if let Some(cb) = CB.get() {
            if let Ok(g) = cb.lock() {
                g();
            }
        }
    }
    unsafe {
        libc::signal(libc::SIGINT, handler as *const () as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as *const () as libc::sighandler_t);
        libc::signal(libc::SIGHUP, handler as *const () as libc::sighandler_t);
    }
}
