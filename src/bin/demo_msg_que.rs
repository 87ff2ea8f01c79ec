// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Message queue demo.
//
// Usage:
//   demo_msg_que s    (sender)
//   demo_msg_que r    (receiver)
//
// The sender writes numbered text messages ("<seq>:<padding>") to the queue
// "/ipclib-msg-que"; every tenth one goes out as raw bytes at a higher
// priority. The receiver checks the sequence for gaps and both sides print a
// one-line summary per second. The receiver removes the queue name on quit.

#[cfg(target_os = "linux")]
mod demo {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    use ipclib::{AccessMode, MessageQueue, QueueOptions};

    const QUEUE_NAME: &str = "ipclib-msg-que";
    const MAX_MSGS: usize = 8;
    const MSG_SIZE: usize = 1024;
    const POLL: Duration = Duration::from_millis(200);
    const URGENT_PRIORITY: u32 = 5;

    static QUIT: AtomicBool = AtomicBool::new(false);

    extern "C" fn on_quit(_: libc::c_int) {
        QUIT.store(true, Ordering::Release);
    }

    pub fn install_quit_handler() {
        for sig in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP] {
            unsafe {
                libc::signal(sig, on_quit as extern "C" fn(libc::c_int) as libc::sighandler_t);
            }
        }
    }

    fn quitting() -> bool {
        QUIT.load(Ordering::Acquire)
    }

    fn open_queue(mode: AccessMode) -> MessageQueue {
        let opts = QueueOptions::new().mode(mode).capacity(MAX_MSGS, MSG_SIZE);
        let que = MessageQueue::with_name(QUEUE_NAME, &opts);
        if !que.init_status().is_success() {
            eprintln!("cannot open {}: {}", que.system_name(), que.init_status());
            std::process::exit(1);
        }
        que
    }

    /// Messages and bytes seen since the last report.
    #[derive(Default)]
    struct Tally {
        msgs: usize,
        bytes: usize,
        urgent: usize,
    }

    impl Tally {
        fn report(&mut self, who: &str, que: &MessageQueue) {
            let depth = que
                .msg_count()
                .map_or_else(|st| format!("? ({st})"), |n| n.to_string());
            println!(
                "{who}: {} msgs ({} urgent), {} bytes/s, queued {depth}",
                self.msgs, self.urgent, self.bytes
            );
            *self = Tally::default();
        }
    }

    fn message(seq: u64) -> String {
        let pad = (seq as usize * 37) % (MSG_SIZE - 32);
        format!("{seq}:{}", "x".repeat(pad))
    }

    pub fn send() {
        let que = open_queue(AccessMode::WriteOnly);
        println!("send: writing to {}", que.system_name());

        let mut tally = Tally::default();
        let mut last_report = Instant::now();
        let mut seq = 0u64;
        while !quitting() {
            let text = message(seq);
            let st = if seq % 10 == 9 {
                que.send_bytes_timeout(text.as_bytes(), URGENT_PRIORITY, POLL)
            } else {
                que.send_timeout(&text, POLL)
            };
            if st.is_success() {
                tally.msgs += 1;
                tally.bytes += text.len();
                if seq % 10 == 9 {
                    tally.urgent += 1;
                }
                seq += 1;
            } else if !st.is_timeout() && !st.is_interrupted() {
                eprintln!("send: {st}");
                break;
            }
            if last_report.elapsed() >= Duration::from_secs(1) {
                tally.report("send", &que);
                last_report = Instant::now();
            }
        }
        println!("send: quit after {seq} messages");
    }

    pub fn recv() {
        let que = open_queue(AccessMode::ReadOnly);
        println!("recv: reading from {}", que.system_name());

        let mut tally = Tally::default();
        let mut last_report = Instant::now();
        let mut highest: Option<u64> = None;
        let mut raw = Vec::with_capacity(MSG_SIZE + 1);
        while !quitting() {
            match que.receive_bytes_timeout(&mut raw, POLL) {
                Ok(priority) => {
                    // Text messages carry a trailing NUL, urgent ones do not.
                    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                    let text = String::from_utf8_lossy(&raw[..end]);
                    let seq = text.split(':').next().and_then(|s| s.parse::<u64>().ok());
                    match (seq, highest) {
                        (Some(s), Some(h)) if s > h + 1 => println!("recv: gap {}..{s}", h + 1),
                        _ => {}
                    }
                    highest = highest.max(seq);
                    tally.msgs += 1;
                    tally.bytes += raw.len();
                    if priority >= URGENT_PRIORITY {
                        tally.urgent += 1;
                    }
                }
                Err(st) if st.is_timeout() || st.is_interrupted() => {}
                Err(st) => {
                    eprintln!("recv: {st}");
                    break;
                }
            }
            if last_report.elapsed() >= Duration::from_secs(1) {
                tally.report("recv", &que);
                last_report = Instant::now();
            }
        }

        let st = que.destroy();
        if !st.is_success() {
            eprintln!("recv: destroy: {st}");
        }
        println!("recv: quit");
    }
}

#[cfg(target_os = "linux")]
fn main() {
    let mode = std::env::args().nth(1).unwrap_or_default();
    demo::install_quit_handler();
    match mode.as_str() {
        "s" => demo::send(),
        "r" => demo::recv(),
        _ => {
            eprintln!("usage: demo_msg_que s|r");
            std::process::exit(1);
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("demo_msg_que: POSIX message queues are only built on Linux");
    std::process::exit(1);
}
