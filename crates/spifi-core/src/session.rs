//! Interval reporting state.
//!
//! A [`ReportingSession`] owns the set of transmitter addresses seen since the
//! last report. The capture thread feeds it through
//! [`record_sighting`](ReportingSession::record_sighting) while the report
//! timer calls [`flush_report`](ReportingSession::flush_report). Every access
//! to the set happens under one mutex that is never held across sink I/O or
//! vendor lookups; values written to the sinks are captured under the lock and
//! formatted after it is released.
//!
//! Ordering: a sighting inserted before a flush takes the lock is in that
//! flush's count; a sighting inserted after the flush releases the lock is in
//! the next one. Count and clear happen in the same critical section, so a
//! sighting is never counted twice or lost.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;

use crate::classifier::{FieldToggles, FrameClassifier};
use crate::domain::frame::DecodedFrame;
use crate::domain::mac::MacAddress;
use crate::domain::record::{ReportRecord, SightingRecord, TimeFormat};
use crate::error::{SpifiError, SpifiResult};
use crate::port::{LineSink, VendorLookup};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Output and cadence settings consumed by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Timestamp rendering for both streams.
    pub time_format: TimeFormat,
    /// Separator placed between output fields.
    pub delimiter: String,
    /// Optional detail columns.
    pub fields: FieldToggles,
    /// Period between summary reports.
    pub report_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::Epoch,
            delimiter: ",".to_owned(),
            fields: FieldToggles::default(),
            report_interval: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Frames handed to the session.
    pub frames_seen: u64,
    /// Frames that were not probe requests.
    pub frames_ignored: u64,
    /// Probe requests from a device already seen this interval.
    pub duplicates: u64,
    /// Detail lines written.
    pub sightings_recorded: u64,
    /// Probe requests dropped by a record-fatal error.
    pub sightings_dropped: u64,
    /// Summary lines written.
    pub reports_emitted: u64,
}

#[derive(Debug, Default)]
struct SessionMetrics {
    frames_seen: AtomicU64,
    frames_ignored: AtomicU64,
    duplicates: AtomicU64,
    sightings_recorded: AtomicU64,
    sightings_dropped: AtomicU64,
    reports_emitted: AtomicU64,
}

impl SessionMetrics {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_seen: self.frames_seen.load(Ordering::Relaxed),
            frames_ignored: self.frames_ignored.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            sightings_recorded: self.sightings_recorded.load(Ordering::Relaxed),
            sightings_dropped: self.sightings_dropped.load(Ordering::Relaxed),
            reports_emitted: self.reports_emitted.load(Ordering::Relaxed),
        }
    }
}

// ---------------------------------------------------------------------------
// ReportingSession
// ---------------------------------------------------------------------------

/// What happened to a frame passed to [`ReportingSession::record_sighting`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SightingOutcome {
    /// First sighting of the device this interval; one detail line written.
    Recorded(SightingRecord),
    /// The device was already counted this interval.
    Duplicate,
    /// Not a probe request.
    Ignored,
}

/// Deduplicating census for one capture stream.
pub struct ReportingSession {
    classifier: FrameClassifier,
    time_format: TimeFormat,
    delimiter: String,
    devices: Mutex<HashSet<MacAddress>>,
    detail: Arc<dyn LineSink>,
    summary: Arc<dyn LineSink>,
    metrics: SessionMetrics,
}

impl ReportingSession {
    /// Create a session writing detail and summary lines to the given sinks.
    pub fn new(
        config: &SessionConfig,
        vendor: Arc<dyn VendorLookup>,
        detail: Arc<dyn LineSink>,
        summary: Arc<dyn LineSink>,
    ) -> Self {
        Self {
            classifier: FrameClassifier::new(config.time_format, config.fields, vendor),
            time_format: config.time_format,
            delimiter: config.delimiter.clone(),
            devices: Mutex::new(HashSet::new()),
            detail,
            summary,
            metrics: SessionMetrics::default(),
        }
    }

    /// Record one captured frame.
    ///
    /// Non-probe frames and devices already seen this interval are dropped
    /// silently. A record-fatal error (short trailer, lookup failure) leaves
    /// the device set untouched and is returned to the caller.
    pub fn record_sighting(&self, frame: &DecodedFrame) -> SpifiResult<SightingOutcome> {
        SessionMetrics::bump(&self.metrics.frames_seen);

        if !self.classifier.is_relevant(frame) {
            SessionMetrics::bump(&self.metrics.frames_ignored);
            return Ok(SightingOutcome::Ignored);
        }

        let address = frame.transmitter;
        if self.devices.lock().contains(&address) {
            SessionMetrics::bump(&self.metrics.duplicates);
            return Ok(SightingOutcome::Duplicate);
        }

        let record = match self.classifier.build_record(frame, Local::now()) {
            Ok(record) => record,
            Err(e) => {
                SessionMetrics::bump(&self.metrics.sightings_dropped);
                return Err(e);
            }
        };

        // Re-check on insert: a concurrent flush may have cleared the set, but
        // nothing else inserts, so `false` only means a duplicate slipped in.
        if !self.devices.lock().insert(address) {
            SessionMetrics::bump(&self.metrics.duplicates);
            return Ok(SightingOutcome::Duplicate);
        }

        tracing::debug!(%address, "new device this interval");
        SessionMetrics::bump(&self.metrics.sightings_recorded);
        self.detail
            .append_line(&record.to_line(&self.delimiter))
            .map_err(|source| SpifiError::Sink {
                sink: "detail",
                source,
            })?;

        Ok(SightingOutcome::Recorded(record))
    }

    /// Emit the interval report and start a new interval.
    ///
    /// The count is taken and the set cleared in one critical section.
    pub fn flush_report(&self) -> SpifiResult<ReportRecord> {
        let device_count = {
            let mut devices = self.devices.lock();
            let count = devices.len();
            devices.clear();
            count
        };

        let report = ReportRecord {
            timestamp: self.time_format.now(),
            device_count,
        };

        SessionMetrics::bump(&self.metrics.reports_emitted);
        self.summary
            .append_line(&report.to_line(&self.delimiter))
            .map_err(|source| SpifiError::Sink {
                sink: "summary",
                source,
            })?;

        tracing::debug!(device_count, "interval report emitted");
        Ok(report)
    }

    /// Devices counted so far in the current interval.
    pub fn pending_devices(&self) -> usize {
        self.devices.lock().len()
    }

    /// The classifier this session applies to each frame.
    pub fn classifier(&self) -> &FrameClassifier {
        &self.classifier
    }

    /// Current counter values.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MemorySink, OuiTable};

    struct Harness {
        session: ReportingSession,
        detail: Arc<MemorySink>,
        summary: Arc<MemorySink>,
    }

    fn harness(fields: FieldToggles) -> Harness {
        let detail = Arc::new(MemorySink::new());
        let summary = Arc::new(MemorySink::new());
        let config = SessionConfig {
            fields,
            ..SessionConfig::default()
        };
        let session = ReportingSession::new(
            &config,
            Arc::new(OuiTable::default()),
            detail.clone(),
            summary.clone(),
        );
        Harness {
            session,
            detail,
            summary,
        }
    }

    fn probe(addr: &str) -> DecodedFrame {
        DecodedFrame::probe_request(MacAddress::parse(addr).unwrap(), "", vec![0, 0, 0xCE, 0])
    }

    #[test]
    fn distinct_devices_are_counted_then_cleared() {
        let h = harness(FieldToggles::default());
        for i in 0..5u8 {
            let frame = probe(&format!("00:11:22:33:44:{i:02x}"));
            assert!(matches!(
                h.session.record_sighting(&frame).unwrap(),
                SightingOutcome::Recorded(_)
            ));
        }

        let report = h.session.flush_report().unwrap();
        assert_eq!(report.device_count, 5);
        assert_eq!(h.session.pending_devices(), 0);
        assert_eq!(h.detail.len(), 5);
        assert!(h.summary.lines()[0].ends_with(",5"));
    }

    #[test]
    fn duplicates_are_suppressed_within_interval_only() {
        let h = harness(FieldToggles::default());
        let frame = probe("00:11:22:33:44:55");

        h.session.record_sighting(&frame).unwrap();
        assert_eq!(
            h.session.record_sighting(&frame).unwrap(),
            SightingOutcome::Duplicate
        );
        assert_eq!(h.session.flush_report().unwrap().device_count, 1);

        // A new interval counts the device again.
        assert!(matches!(
            h.session.record_sighting(&frame).unwrap(),
            SightingOutcome::Recorded(_)
        ));
        assert_eq!(h.detail.len(), 2);
        assert_eq!(h.session.metrics().duplicates, 1);
    }

    #[test]
    fn ignored_frames_do_not_touch_the_set() {
        let h = harness(FieldToggles::default());
        let beacon = DecodedFrame {
            subtype: 0x08,
            ..probe("00:11:22:33:44:55")
        };
        assert_eq!(
            h.session.record_sighting(&beacon).unwrap(),
            SightingOutcome::Ignored
        );
        assert_eq!(h.session.pending_devices(), 0);
        assert!(h.detail.is_empty());
    }

    #[test]
    fn record_fatal_error_leaves_set_untouched() {
        let h = harness(FieldToggles {
            rssi: true,
            ..FieldToggles::default()
        });
        let bad = DecodedFrame::probe_request(
            MacAddress::parse("00:11:22:33:44:55").unwrap(),
            "",
            vec![0xCE],
        );
        assert!(h.session.record_sighting(&bad).unwrap_err().is_record_fatal());
        assert_eq!(h.session.pending_devices(), 0);
        assert!(h.detail.is_empty());

        // The next good frame is unaffected.
        let good = probe("00:11:22:33:44:66");
        let outcome = h.session.record_sighting(&good).unwrap();
        match outcome {
            SightingOutcome::Recorded(record) => assert_eq!(record.rssi_dbm, Some(-50)),
            other => panic!("expected a recorded sighting, got {other:?}"),
        }
        let metrics = h.session.metrics();
        assert_eq!(metrics.sightings_dropped, 1);
        assert_eq!(metrics.sightings_recorded, 1);
    }

    #[test]
    fn empty_interval_reports_zero() {
        let h = harness(FieldToggles::default());
        assert_eq!(h.session.flush_report().unwrap().device_count, 0);
        assert_eq!(h.session.flush_report().unwrap().device_count, 0);
        assert_eq!(h.summary.len(), 2);
    }
}
