//! End-to-end loopback run: a local responder thread plus a full probe
//! session
//!
//! On loopback there is no real loss or delay, so after a short run the
//! window loss must read (near) zero and the aggregate MOS must sit at
//! the zero-loss fixed point for a sub-millisecond one-way delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use voipprobe::{ProbeConfig, ProbeSession, Responder, SessionState};

fn spawn_responder(cancel: Arc<AtomicBool>) -> (u16, thread::JoinHandle<()>) {
    let responder = Responder::bind("127.0.0.1", 0).expect("bind responder");
    let port = responder.local_addr().expect("local addr").port();
    let handle = thread::spawn(move || responder.run(cancel));
    (port, handle)
}

#[test]
fn test_loopback_run_reads_zero_loss() {
    let cancel = Arc::new(AtomicBool::new(false));
    let (port, responder) = spawn_responder(cancel.clone());

    let config = ProbeConfig {
        host: "127.0.0.1".to_string(),
        port,
        pps: 50,
        duration_secs: Some(2),
        warmup_secs: 0,
        report_interval_secs: 1,
        timeout_ms: 20,
        ..ProbeConfig::default()
    };

    let session = ProbeSession::new(config, cancel.clone()).expect("session");
    let summary = session.run().expect("run");

    cancel.store(true, Ordering::SeqCst);
    responder.join().unwrap();

    // Scheduling is absolute-deadline: the session cannot overshoot the
    // configured rate, and on an idle loopback it keeps up with it.
    assert!(summary.sent >= 60, "sent only {}", summary.sent);
    assert!(summary.sent <= 110, "sent {} at 50pps over 2s", summary.sent);
    assert!(summary.received >= 50, "received only {}", summary.received);

    // At most the last probe or two can still be in flight at cutoff
    assert!(
        summary.window_loss_pct <= 3.0,
        "window loss {}%",
        summary.window_loss_pct
    );
    assert!(summary.mean_rtt_ms < 100.0);

    // Zero loss and sub-ms delay: MOS at the g711 clean fixed point
    let est = summary.mos.expect("aggregate MOS present");
    assert!(est.mos > 4.3, "MOS {} too low for loopback", est.mos);
    assert!(est.mos < 4.5);
    assert!(est.r_factor > 90.0);
}

#[test]
fn test_cancellation_stops_run_promptly() {
    let cancel = Arc::new(AtomicBool::new(false));
    let (port, responder) = spawn_responder(cancel.clone());

    let config = ProbeConfig {
        host: "127.0.0.1".to_string(),
        port,
        pps: 20,
        duration_secs: None, // would run forever
        timeout_ms: 20,
        ..ProbeConfig::default()
    };

    let session = ProbeSession::new(config, cancel.clone()).expect("session");
    let canceller = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(300));
            cancel.store(true, Ordering::SeqCst);
        })
    };

    let summary = session.run().expect("run");
    canceller.join().unwrap();
    responder.join().unwrap();

    assert!(summary.elapsed.as_secs() < 5, "cancellation was not prompt");
    assert!(summary.sent > 0);
}

#[test]
fn test_csv_rows_written_on_loopback_run() {
    let cancel = Arc::new(AtomicBool::new(false));
    let (port, responder) = spawn_responder(cancel.clone());

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("run.csv");

    let config = ProbeConfig {
        host: "127.0.0.1".to_string(),
        port,
        pps: 50,
        duration_secs: Some(1),
        csv_path: Some(csv_path.clone()),
        warmup_secs: 0,
        timeout_ms: 20,
        ..ProbeConfig::default()
    };

    let session = ProbeSession::new(config, cancel.clone()).expect("session");
    assert_eq!(session.state(), SessionState::Init);
    let summary = session.run().expect("run");

    cancel.store(true, Ordering::SeqCst);
    responder.join().unwrap();

    let contents = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines[0].starts_with("ts_utc,seq,"));
    // One row per resolved sample
    assert_eq!(lines.len() as u64, summary.received + 1);
    for row in &lines[1..] {
        assert_eq!(row.split(',').count(), 10, "malformed row: {}", row);
    }
}
