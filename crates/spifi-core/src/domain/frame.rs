//! Decoded 802.11 frame as handed over by the capture collaborator.

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

/// 802.11 frame type for management frames.
pub const FRAME_TYPE_MANAGEMENT: u8 = 0;

/// 802.11 management subtype for probe requests.
pub const SUBTYPE_PROBE_REQUEST: u8 = 0x04;

/// A decoded 802.11 frame.
///
/// The field names on the wire (`type`, `addr2`, `info`, `notdecoded`) follow
/// the layer attributes a dissector exposes, so decoder output can be piped in
/// without renaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedFrame {
    /// Frame type (0 = management, 1 = control, 2 = data).
    #[serde(rename = "type")]
    pub frame_type: u8,
    /// Frame subtype within the type.
    pub subtype: u8,
    /// Transmitter address (`addr2`).
    #[serde(rename = "addr2")]
    pub transmitter: MacAddress,
    /// Information element payload; the SSID for probe requests.
    #[serde(rename = "info", default)]
    pub info: String,
    /// Raw trailing bytes the decoder did not interpret (radio metadata).
    #[serde(rename = "notdecoded", default)]
    pub trailer: Vec<u8>,
}

impl DecodedFrame {
    /// Build a probe request frame.
    pub fn probe_request(transmitter: MacAddress, ssid: impl Into<String>, trailer: Vec<u8>) -> Self {
        Self {
            frame_type: FRAME_TYPE_MANAGEMENT,
            subtype: SUBTYPE_PROBE_REQUEST,
            transmitter,
            info: ssid.into(),
            trailer,
        }
    }

    /// Whether this is a management probe request.
    pub fn is_probe_request(&self) -> bool {
        self.frame_type == FRAME_TYPE_MANAGEMENT && self.subtype == SUBTYPE_PROBE_REQUEST
    }
}
