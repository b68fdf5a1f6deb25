//! Frame classification and field extraction.
//!
//! [`FrameClassifier`] decides whether a frame is a probe request and, if so,
//! builds the [`SightingRecord`] for it. The optional columns are resolved
//! once at construction into an ordered list of [`SightingField`] extractors
//! that is applied uniformly to every record.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::frame::DecodedFrame;
use crate::domain::record::{SightingRecord, TimeFormat};
use crate::error::{SpifiError, SpifiResult};
use crate::port::VendorLookup;

/// Organization placeholder for addresses the vendor registry does not know.
pub const UNKNOWN_ORGANIZATION: &str = "UNKNOWN";

/// Position of the signal byte, counted from the end of the radio trailer.
pub const RSSI_TRAILER_OFFSET: usize = 4;

// ---------------------------------------------------------------------------
// Field selection
// ---------------------------------------------------------------------------

/// Which optional columns the detail stream carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldToggles {
    /// Resolve and include the OUI organization.
    pub manufacturer: bool,
    /// Include the probed SSID.
    pub ssid: bool,
    /// Include the received signal strength.
    pub rssi: bool,
}

impl FieldToggles {
    /// All optional columns enabled.
    pub fn all() -> Self {
        Self {
            manufacturer: true,
            ssid: true,
            rssi: true,
        }
    }

    /// The enabled columns in output order.
    pub fn enabled(&self) -> Vec<SightingField> {
        [
            (self.manufacturer, SightingField::Manufacturer),
            (self.ssid, SightingField::Ssid),
            (self.rssi, SightingField::Rssi),
        ]
        .into_iter()
        .filter_map(|(on, field)| on.then_some(field))
        .collect()
    }
}

/// An optional column of the detail stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SightingField {
    /// OUI organization, `UNKNOWN` when unregistered.
    Manufacturer,
    /// SSID from the information element.
    Ssid,
    /// Signal strength decoded from the radio trailer.
    Rssi,
}

impl SightingField {
    /// Fill this column of `record` from `frame`.
    fn extract(
        self,
        frame: &DecodedFrame,
        vendor: &dyn VendorLookup,
        record: &mut SightingRecord,
    ) -> SpifiResult<()> {
        match self {
            Self::Manufacturer => {
                let org = vendor
                    .organization(&frame.transmitter)?
                    .unwrap_or_else(|| UNKNOWN_ORGANIZATION.to_owned());
                record.organization = Some(org);
            }
            Self::Ssid => record.ssid = Some(frame.info.clone()),
            Self::Rssi => record.rssi_dbm = Some(decode_rssi(&frame.trailer)?),
        }
        Ok(())
    }
}

/// Decode signal strength from the radio trailer.
///
/// The capture encoding stores the signal as an unsigned byte four positions
/// from the end; the dBm value is `-(256 - byte)`.
pub fn decode_rssi(trailer: &[u8]) -> SpifiResult<i16> {
    let len = trailer.len();
    if len < RSSI_TRAILER_OFFSET {
        return Err(SpifiError::TrailerTooShort {
            needed: RSSI_TRAILER_OFFSET,
            got: len,
        });
    }
    let byte = trailer[len - RSSI_TRAILER_OFFSET];
    Ok(-(256 - i16::from(byte)))
}

// ---------------------------------------------------------------------------
// FrameClassifier
// ---------------------------------------------------------------------------

/// Relevance test plus record construction for captured frames.
pub struct FrameClassifier {
    time_format: TimeFormat,
    fields: Vec<SightingField>,
    vendor: Arc<dyn VendorLookup>,
}

impl FrameClassifier {
    /// Create a classifier; the column list is fixed from `toggles` here.
    pub fn new(time_format: TimeFormat, toggles: FieldToggles, vendor: Arc<dyn VendorLookup>) -> Self {
        Self {
            time_format,
            fields: toggles.enabled(),
            vendor,
        }
    }

    /// Only management probe requests are of interest.
    pub fn is_relevant(&self, frame: &DecodedFrame) -> bool {
        frame.is_probe_request()
    }

    /// The optional columns this classifier emits, in order.
    pub fn fields(&self) -> &[SightingField] {
        &self.fields
    }

    /// Classify a frame, stamping it with the current time.
    ///
    /// Returns `Ok(None)` for frames that are not probe requests.
    pub fn classify(&self, frame: &DecodedFrame) -> SpifiResult<Option<SightingRecord>> {
        if !self.is_relevant(frame) {
            return Ok(None);
        }
        self.build_record(frame, Local::now()).map(Some)
    }

    /// Build the full record for a relevant frame observed at `at`.
    pub fn build_record(&self, frame: &DecodedFrame, at: DateTime<Local>) -> SpifiResult<SightingRecord> {
        let mut record = SightingRecord {
            timestamp: self.time_format.stamp(at),
            address: frame.transmitter,
            organization: None,
            ssid: None,
            rssi_dbm: None,
        };

        for field in &self.fields {
            field.extract(frame, self.vendor.as_ref(), &mut record)?;
        }
        Ok(record)
    }
}
