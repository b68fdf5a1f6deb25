//! Domain types for the probe census.

pub mod frame;
pub mod mac;
pub mod record;

pub use frame::{DecodedFrame, FRAME_TYPE_MANAGEMENT, SUBTYPE_PROBE_REQUEST};
pub use mac::MacAddress;
pub use record::{ReportRecord, SightingRecord, TimeFormat};
