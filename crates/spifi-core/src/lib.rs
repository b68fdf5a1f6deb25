//! # spifi-core
//!
//! Counts distinct 802.11 devices in an area over time from their probe
//! requests.
//!
//! - **Domain types**: [`MacAddress`], [`DecodedFrame`], [`SightingRecord`],
//!   [`ReportRecord`], [`TimeFormat`]
//! - **Classifier**: [`FrameClassifier`] -- probe-request test and the ordered
//!   optional columns (manufacturer, SSID, RSSI)
//! - **Session**: [`ReportingSession`] -- per-interval device set feeding the
//!   detail and summary streams
//! - **Timer**: [`RecurringTimer`] -- drift-free report cadence
//! - **Ports**: [`FrameSource`], [`VendorLookup`], [`LineSink`]
//! - **Adapters**: [`JsonLinesSource`], [`OuiTable`], [`MemorySink`]
//! - **Service**: [`ProbeMonitor`] -- wires the above together
//!
//! ```
//! use std::sync::Arc;
//! use spifi_core::{DecodedFrame, MacAddress, MemorySink, OuiTable, ReportingSession, SessionConfig};
//!
//! let detail = Arc::new(MemorySink::new());
//! let summary = Arc::new(MemorySink::new());
//! let session = ReportingSession::new(
//!     &SessionConfig::default(),
//!     Arc::new(OuiTable::default()),
//!     detail.clone(),
//!     summary.clone(),
//! );
//!
//! let phone = MacAddress::parse("00:1b:63:84:45:e6").unwrap();
//! session.record_sighting(&DecodedFrame::probe_request(phone, "", vec![])).unwrap();
//! session.record_sighting(&DecodedFrame::probe_request(phone, "", vec![])).unwrap();
//!
//! assert_eq!(session.flush_report().unwrap().device_count, 1);
//! assert_eq!(detail.len(), 1);
//! ```

pub mod adapter;
pub mod classifier;
pub mod domain;
pub mod error;
pub mod monitor;
pub mod port;
pub mod session;
pub mod timer;

// Re-export key types at the crate root for convenience.
pub use adapter::{JsonLinesSource, MemorySink, OuiTable};
pub use classifier::{decode_rssi, FieldToggles, FrameClassifier, SightingField, UNKNOWN_ORGANIZATION};
pub use domain::{DecodedFrame, MacAddress, ReportRecord, SightingRecord, TimeFormat};
pub use error::{SpifiError, SpifiResult};
pub use monitor::{ProbeMonitor, RunExit};
pub use port::{FrameSource, LineSink, VendorLookup};
pub use session::{MetricsSnapshot, ReportingSession, SessionConfig, SightingOutcome};
pub use timer::{RecurringTimer, TimerPhase};
