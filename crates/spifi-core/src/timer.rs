//! Drift-free recurring timer.
//!
//! [`RecurringTimer`] runs a callback on a dedicated thread once per period.
//! Firing `n` is aimed at `start + n * interval`, never at
//! `previous_fire + interval`, so scheduling latency and callback run time do
//! not accumulate.
//!
//! When a callback overruns one or more periods the next firing happens
//! immediately, once, and the schedule then snaps back to the first grid point
//! after the current time. Missed grid points are skipped, not replayed.
//!
//! [`stop`](RecurringTimer::stop) blocks until any in-flight callback has
//! returned, so no invocation can begin or be running after it returns. The
//! one exception is `stop` called from inside the callback itself: the worker
//! cannot join itself, so it exits as soon as that callback returns.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{SpifiError, SpifiResult};

/// Lifecycle phase of a [`RecurringTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Not scheduled.
    Idle,
    /// A worker thread is firing the callback.
    Running,
}

#[derive(Debug)]
struct TimerState {
    phase: TimerPhase,
    /// Bumped by every start and stop; a worker exits once it no longer
    /// matches the generation it was spawned with.
    generation: u64,
    next_target: Option<Instant>,
    fired: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// Self-rescheduling periodic timer with an Idle/Running state machine.
pub struct RecurringTimer {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RecurringTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TimerState {
                    phase: TimerPhase::Idle,
                    generation: 0,
                    next_target: None,
                    fired: 0,
                }),
                wake: Condvar::new(),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Start firing `callback` every `interval`.
    ///
    /// The first firing is one full interval after this call. Starting a
    /// running timer fails with [`SpifiError::TimerAlreadyRunning`]; a zero
    /// interval, or one the clock cannot schedule, with
    /// [`SpifiError::InvalidInterval`].
    pub fn start<F>(&self, interval: Duration, callback: F) -> SpifiResult<()>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() || Instant::now().checked_add(interval).is_none() {
            return Err(SpifiError::InvalidInterval(interval));
        }

        let mut worker = self.worker.lock();
        let generation = {
            let mut state = self.shared.state.lock();
            if state.phase == TimerPhase::Running {
                return Err(SpifiError::TimerAlreadyRunning);
            }
            state.phase = TimerPhase::Running;
            state.generation += 1;
            state.generation
        };

        // A worker left over from a stop issued inside its own callback has
        // already seen the generation change; reap it before replacing it.
        if let Some(stale) = worker.take() {
            if stale.thread().id() != thread::current().id() {
                let _ = stale.join();
            }
        }

        let origin = Instant::now();
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("spifi-report-timer".into())
            .spawn(move || run_schedule(shared, generation, origin, interval, callback));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                tracing::info!(
                    interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                    "report timer started"
                );
                Ok(())
            }
            Err(e) => {
                let mut state = self.shared.state.lock();
                state.phase = TimerPhase::Idle;
                state.generation += 1;
                Err(SpifiError::TimerSpawn(e.to_string()))
            }
        }
    }

    /// Stop the timer, waiting for an in-flight callback to finish.
    ///
    /// Stopping an idle timer is a no-op.
    pub fn stop(&self) {
        if self.phase() == TimerPhase::Idle {
            return;
        }

        let handle = {
            let mut worker = self.worker.lock();
            {
                let mut state = self.shared.state.lock();
                if state.phase == TimerPhase::Idle {
                    return;
                }
                state.phase = TimerPhase::Idle;
                state.generation += 1;
                state.next_target = None;
            }
            self.shared.wake.notify_all();

            match worker.take() {
                // Called from the callback; the worker exits when it returns.
                Some(own) if own.thread().id() == thread::current().id() => {
                    *worker = Some(own);
                    None
                }
                other => other,
            }
        };

        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("report timer thread panicked");
            }
        }
        tracing::info!("report timer stopped");
    }

    /// Current phase.
    pub fn phase(&self) -> TimerPhase {
        self.shared.state.lock().phase
    }

    /// Whether the timer is running.
    pub fn is_running(&self) -> bool {
        self.phase() == TimerPhase::Running
    }

    /// Total callback invocations since creation.
    pub fn fired(&self) -> u64 {
        self.shared.state.lock().fired
    }

    /// When the next firing is due, if running.
    pub fn next_target(&self) -> Option<Instant> {
        self.shared.state.lock().next_target
    }
}

impl Default for RecurringTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecurringTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker loop: sleep until the next grid point, fire, repeat.
fn run_schedule<F>(
    shared: Arc<Shared>,
    generation: u64,
    start: Instant,
    interval: Duration,
    mut callback: F,
) where
    F: FnMut(),
{
    let mut tick: u32 = 1;
    let Some(mut target) = grid_point(start, interval, tick) else {
        return abandon(&shared, generation, tick);
    };

    loop {
        {
            let mut state = shared.state.lock();
            if state.generation != generation {
                return;
            }
            state.next_target = Some(target);
            while state.generation == generation && Instant::now() < target {
                shared.wake.wait_until(&mut state, target);
            }
            if state.generation != generation {
                return;
            }
            state.fired += 1;
        }

        if panic::catch_unwind(AssertUnwindSafe(&mut callback)).is_err() {
            tracing::error!(tick, "report timer callback panicked; schedule continues");
        }

        tick = tick.saturating_add(1);
        target = match grid_point(start, interval, tick) {
            Some(next) => next,
            None => return abandon(&shared, generation, tick),
        };

        let now = Instant::now();
        if target <= now {
            // Overran: fire once right away, then realign on the grid.
            let elapsed_ticks = now.duration_since(start).as_nanos() / interval.as_nanos();
            tracing::warn!(tick, "report callback overran its interval");
            tick = u32::try_from(elapsed_ticks).unwrap_or(u32::MAX);
            target = now;
        }
    }
}

/// The `tick`-th point of the schedule, if the clock can represent it.
fn grid_point(start: Instant, interval: Duration, tick: u32) -> Option<Instant> {
    interval
        .checked_mul(tick)
        .and_then(|offset| start.checked_add(offset))
}

fn abandon(shared: &Shared, generation: u64, tick: u32) {
    tracing::error!(tick, "report schedule ran past the clock range; timer stopped");
    let mut state = shared.state.lock();
    if state.generation == generation {
        state.phase = TimerPhase::Idle;
        state.generation += 1;
        state.next_target = None;
    }
}
