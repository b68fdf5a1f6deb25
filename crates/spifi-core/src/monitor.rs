//! Census orchestrator (Domain Service).
//!
//! [`ProbeMonitor`] ties a [`ReportingSession`] to a [`RecurringTimer`] and
//! drains a [`FrameSource`] into it. The capture loop runs on the caller's
//! thread; reports are emitted from the timer thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::frame::DecodedFrame;
use crate::domain::record::ReportRecord;
use crate::error::{SpifiError, SpifiResult};
use crate::port::FrameSource;
use crate::session::{ReportingSession, SightingOutcome};
use crate::timer::RecurringTimer;

/// How a call to [`ProbeMonitor::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The source reported end of stream.
    Exhausted,
    /// [`ProbeMonitor::cancel`] was called.
    Cancelled,
}

/// Drives a reporting session from a frame source and a report timer.
pub struct ProbeMonitor {
    session: Arc<ReportingSession>,
    timer: RecurringTimer,
    interval: Duration,
    cancelled: AtomicBool,
}

impl ProbeMonitor {
    /// Create a monitor reporting every `interval`.
    pub fn new(session: Arc<ReportingSession>, interval: Duration) -> SpifiResult<Self> {
        if interval.is_zero() {
            return Err(SpifiError::InvalidInterval(interval));
        }
        Ok(Self {
            session,
            timer: RecurringTimer::new(),
            interval,
            cancelled: AtomicBool::new(false),
        })
    }

    /// The session being fed.
    pub fn session(&self) -> &Arc<ReportingSession> {
        &self.session
    }

    /// The report timer.
    pub fn timer(&self) -> &RecurringTimer {
        &self.timer
    }

    /// Start periodic reporting.
    pub fn start(&self) -> SpifiResult<()> {
        let session = Arc::clone(&self.session);
        self.timer.start(self.interval, move || {
            match session.flush_report() {
                Ok(report) => tracing::info!(devices = report.device_count, "interval report"),
                Err(e) => tracing::error!(error = %e, "failed to write interval report"),
            }
        })
    }

    /// Feed one frame to the session.
    pub fn ingest(&self, frame: &DecodedFrame) -> SpifiResult<SightingOutcome> {
        self.session.record_sighting(frame)
    }

    /// Drain `source` until it ends or [`cancel`](Self::cancel) is called.
    ///
    /// Record-fatal errors from the source or the session are logged and the
    /// frame skipped. Any other error ends the run and is returned.
    pub fn run<S>(&self, source: &mut S) -> SpifiResult<RunExit>
    where
        S: FrameSource + ?Sized,
    {
        while !self.cancelled.load(Ordering::Acquire) {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(RunExit::Exhausted),
                Err(e) if e.is_record_fatal() => {
                    tracing::warn!(error = %e, "skipping undecodable frame");
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.ingest(&frame) {
                Ok(_) => {}
                Err(e) if e.is_record_fatal() => {
                    tracing::error!(address = %frame.transmitter, error = %e, "dropping sighting");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(RunExit::Cancelled)
    }

    /// Ask a running [`run`](Self::run) loop to return after its current frame.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Stop reporting, optionally emitting one last report for the partial
    /// interval.
    pub fn shutdown(&self, final_flush: bool) -> SpifiResult<Option<ReportRecord>> {
        self.cancel();
        self.timer.stop();
        if final_flush {
            return self.session.flush_report().map(Some);
        }
        Ok(None)
    }
}
