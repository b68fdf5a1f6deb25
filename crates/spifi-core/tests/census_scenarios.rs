//! End-to-end behaviour of the census: classification, deduplication and
//! interval reporting across the detail and summary streams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use spifi_core::{
    DecodedFrame, FieldToggles, MacAddress, MemorySink, OuiTable, ProbeMonitor, ReportingSession,
    SessionConfig, SightingOutcome, TimeFormat, UNKNOWN_ORGANIZATION,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn mac(s: &str) -> MacAddress {
    MacAddress::parse(s).unwrap()
}

fn probe(addr: &str) -> DecodedFrame {
    DecodedFrame::probe_request(mac(addr), "", vec![0x00, 0x00, 0xCE, 0x00])
}

fn beacon(addr: &str) -> DecodedFrame {
    DecodedFrame {
        subtype: 0x08,
        ..probe(addr)
    }
}

fn session_with(config: SessionConfig) -> (Arc<ReportingSession>, Arc<MemorySink>, Arc<MemorySink>) {
    let detail = Arc::new(MemorySink::new());
    let summary = Arc::new(MemorySink::new());
    let vendors = OuiTable::from_entries([([0x00, 0x1b, 0x63], "Apple, Inc.")]);
    let session = ReportingSession::new(&config, Arc::new(vendors), detail.clone(), summary.clone());
    (Arc::new(session), detail, summary)
}

fn session() -> (Arc<ReportingSession>, Arc<MemorySink>, Arc<MemorySink>) {
    session_with(SessionConfig::default())
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn mixed_stream_reports_two_devices() {
    let (session, detail, summary) = session();
    let a = "00:00:00:00:00:0a";
    let b = "00:00:00:00:00:0b";
    let c = "00:00:00:00:00:0c";

    for frame in [probe(a), probe(a), probe(b), beacon(c)] {
        session.record_sighting(&frame).unwrap();
    }
    session.flush_report().unwrap();

    let summary_lines = summary.lines();
    assert_eq!(summary_lines.len(), 1);
    assert_eq!(summary_lines[0].rsplit(',').next(), Some("2"));

    let detail_lines = detail.lines();
    assert_eq!(detail_lines.len(), 2);
    assert_eq!(detail_lines.iter().filter(|l| l.contains(a)).count(), 1);
    assert_eq!(detail_lines.iter().filter(|l| l.contains(b)).count(), 1);
    assert!(detail_lines.iter().all(|l| !l.contains(c)));
}

#[test]
fn k_distinct_devices_counted_and_set_emptied() {
    for k in [0usize, 1, 7, 64] {
        let (session, _, _) = session();
        for i in 0..k {
            let addr = format!("10:00:00:00:{:02x}:{:02x}", i / 256, i % 256);
            session.record_sighting(&probe(&addr)).unwrap();
            // Repeat every device once; repeats must not inflate the count.
            session.record_sighting(&probe(&addr)).unwrap();
        }
        assert_eq!(session.flush_report().unwrap().device_count, k);
        assert_eq!(session.pending_devices(), 0);
    }
}

#[test]
fn control_and_data_frames_never_reach_the_detail_stream() {
    let (session, detail, _) = session();
    let control = DecodedFrame {
        frame_type: 1,
        ..probe("00:00:00:00:00:01")
    };
    let data = DecodedFrame {
        frame_type: 2,
        ..probe("00:00:00:00:00:02")
    };
    let assoc = DecodedFrame {
        subtype: 0x00,
        ..probe("00:00:00:00:00:03")
    };
    for frame in [control, data, assoc] {
        assert_eq!(session.record_sighting(&frame).unwrap(), SightingOutcome::Ignored);
    }
    assert!(detail.is_empty());
    assert_eq!(session.pending_devices(), 0);
}

#[test]
fn full_detail_line_with_all_columns() {
    let (session, detail, _) = session_with(SessionConfig {
        delimiter: "|".into(),
        fields: FieldToggles::all(),
        ..SessionConfig::default()
    });

    let frame = DecodedFrame::probe_request(mac("00:1b:63:84:45:e6"), "coffee-shop", vec![0x00, 0x00, 0xCE, 0x00]);
    session.record_sighting(&frame).unwrap();

    let line = &detail.lines()[0];
    let fields: Vec<&str> = line.split('|').collect();
    assert_eq!(fields.len(), 5);
    assert!(fields[0].parse::<i64>().is_ok(), "epoch timestamp expected, got {}", fields[0]);
    assert_eq!(&fields[1..], ["00:1b:63:84:45:e6", "Apple, Inc.", "coffee-shop", "-50"]);
}

#[test]
fn randomized_address_is_unknown_vendor() {
    let (session, detail, _) = session_with(SessionConfig {
        fields: FieldToggles {
            manufacturer: true,
            ..FieldToggles::default()
        },
        ..SessionConfig::default()
    });

    let outcome = session.record_sighting(&probe("da:a1:19:00:00:01")).unwrap();
    match outcome {
        SightingOutcome::Recorded(record) => {
            assert_eq!(record.organization.as_deref(), Some(UNKNOWN_ORGANIZATION));
        }
        other => panic!("expected a recorded sighting, got {other:?}"),
    }
    assert!(detail.lines()[0].ends_with(",UNKNOWN"));
}

#[test]
fn iso_timestamps_on_both_streams() {
    let (session, detail, summary) = session_with(SessionConfig {
        time_format: TimeFormat::Iso,
        ..SessionConfig::default()
    });
    session.record_sighting(&probe("00:00:00:00:00:01")).unwrap();
    session.flush_report().unwrap();

    for line in [&detail.lines()[0], &summary.lines()[0]] {
        let stamp = line.split(',').next().unwrap();
        assert_eq!(stamp.len(), "2024-01-01T00:00:00.000000".len(), "{stamp}");
        assert_eq!(&stamp[10..11], "T");
    }
}

#[test]
fn bad_trailer_is_isolated_to_its_frame() {
    let (session, detail, _) = session_with(SessionConfig {
        fields: FieldToggles {
            rssi: true,
            ..FieldToggles::default()
        },
        ..SessionConfig::default()
    });

    let short = DecodedFrame::probe_request(mac("00:00:00:00:00:01"), "", vec![]);
    assert!(session.record_sighting(&short).is_err());
    session.record_sighting(&probe("00:00:00:00:00:02")).unwrap();

    assert_eq!(detail.len(), 1);
    assert_eq!(session.flush_report().unwrap().device_count, 1);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_flushes_never_lose_or_double_count() {
    const DEVICES: usize = 20_000;

    let (session, detail, _) = session();
    let reported = Arc::new(AtomicUsize::new(0));

    let capture = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            for i in 0..DEVICES {
                let addr = format!("20:00:00:{:02x}:{:02x}:{:02x}", i >> 16, (i >> 8) & 0xff, i & 0xff);
                let frame = probe(&addr);
                session.record_sighting(&frame).unwrap();
                session.record_sighting(&frame).unwrap();
            }
        })
    };

    let flusher = {
        let session = Arc::clone(&session);
        let reported = Arc::clone(&reported);
        thread::spawn(move || {
            for _ in 0..200 {
                let report = session.flush_report().unwrap();
                reported.fetch_add(report.device_count, Ordering::SeqCst);
                thread::sleep(Duration::from_micros(200));
            }
        })
    };

    capture.join().unwrap();
    flusher.join().unwrap();
    let tail = session.flush_report().unwrap().device_count;

    assert_eq!(reported.load(Ordering::SeqCst) + tail, detail.len());
    // A device repeated across a flush boundary is legitimately new in the
    // next interval, so detail lines are at least one per device.
    assert!(detail.len() >= DEVICES);
    assert!(detail.len() <= 2 * DEVICES);
}

#[test]
fn monitor_keeps_reporting_after_capture_stops() {
    let (session, _, summary) = session();
    let monitor = ProbeMonitor::new(Arc::clone(&session), Duration::from_millis(50)).unwrap();

    monitor.start().unwrap();
    monitor.ingest(&probe("00:00:00:00:00:01")).unwrap();
    thread::sleep(Duration::from_millis(280));
    monitor.shutdown(false).unwrap();

    let lines = summary.lines();
    assert!(lines.len() >= 4, "expected periodic reports, got {lines:?}");
    assert!(lines[0].ends_with(",1"));
    assert!(lines[1..].iter().all(|l| l.ends_with(",0")));
}
