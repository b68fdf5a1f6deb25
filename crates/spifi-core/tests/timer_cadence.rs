//! Cadence and stop guarantees of the recurring report timer.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use spifi_core::RecurringTimer;

/// Record the instant of every firing relative to `origin`.
fn recording_timer(
    interval: Duration,
    work: Duration,
) -> (RecurringTimer, Arc<Mutex<Vec<Duration>>>, Instant) {
    let fires = Arc::new(Mutex::new(Vec::new()));
    let timer = RecurringTimer::new();
    let origin = Instant::now();

    let sink = Arc::clone(&fires);
    timer
        .start(interval, move || {
            sink.lock().push(origin.elapsed());
            thread::sleep(work);
        })
        .unwrap();

    (timer, fires, origin)
}

#[test]
fn one_second_interval_fires_five_times_in_five_seconds() {
    let (timer, fires, _) = recording_timer(Duration::from_secs(1), Duration::ZERO);
    thread::sleep(Duration::from_millis(5_300));
    timer.stop();

    let count = fires.lock().len();
    assert!((4..=6).contains(&count), "expected 5 ± 1 firings, got {count}");
}

#[test]
fn slow_callback_does_not_accumulate_drift() {
    let (timer, fires, _) = recording_timer(Duration::from_secs(1), Duration::from_millis(300));
    thread::sleep(Duration::from_millis(5_500));
    timer.stop();

    let fires = fires.lock().clone();
    assert!(fires.len() >= 5, "got {} firings", fires.len());

    // Firing n lands near n seconds, not n * 1.3 seconds.
    for (i, at) in fires.iter().take(5).enumerate() {
        let expected = Duration::from_secs(i as u64 + 1);
        let error = if *at > expected { *at - expected } else { expected - *at };
        assert!(
            error < Duration::from_millis(200),
            "firing {} at {:?}, expected ~{:?}",
            i + 1,
            at,
            expected
        );
    }
}

#[test]
fn overrunning_callback_fires_once_immediately_then_realigns() {
    let interval = Duration::from_millis(100);
    let fires = Arc::new(Mutex::new(Vec::new()));
    let origin = Instant::now();
    let timer = RecurringTimer::new();

    let sink = Arc::clone(&fires);
    let first = AtomicBool::new(true);
    timer
        .start(interval, move || {
            sink.lock().push(origin.elapsed());
            // The first call overruns by ~2.5 intervals.
            if first.swap(false, Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(250));
            }
        })
        .unwrap();

    thread::sleep(Duration::from_millis(620));
    timer.stop();

    let fires = fires.lock().clone();
    // t=100 (slow, ends ~350), catch-up at ~350, then 400, 500, 600.
    assert!(fires.len() >= 4, "got {fires:?}");
    assert!(fires[1] >= Duration::from_millis(330) && fires[1] < Duration::from_millis(400));
    // No replay of the missed 200 and 300 grid points.
    assert!(fires[2] >= Duration::from_millis(390), "got {fires:?}");
    assert!(fires.len() <= 5, "missed ticks were replayed: {fires:?}");
}

#[test]
fn stop_blocks_until_in_flight_callback_finishes() {
    let in_flight = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicUsize::new(0));
    let timer = RecurringTimer::new();

    {
        let in_flight = Arc::clone(&in_flight);
        let calls = Arc::clone(&calls);
        timer
            .start(Duration::from_millis(20), move || {
                in_flight.store(true, Ordering::SeqCst);
                calls.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(150));
                in_flight.store(false, Ordering::SeqCst);
            })
            .unwrap();
    }

    // Land the stop while the first callback is sleeping.
    thread::sleep(Duration::from_millis(60));
    assert!(in_flight.load(Ordering::SeqCst));
    timer.stop();

    assert!(!in_flight.load(Ordering::SeqCst), "stop returned while a callback was running");
    let after_stop = calls.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(calls.load(Ordering::SeqCst), after_stop, "callback fired after stop");
}
