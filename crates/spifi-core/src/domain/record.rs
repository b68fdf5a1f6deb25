//! Output records for the detail and summary streams.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

// ---------------------------------------------------------------------------
// TimeFormat
// ---------------------------------------------------------------------------

/// How timestamps are rendered in output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// Whole seconds since the Unix epoch, e.g. `1700000000`.
    #[default]
    #[serde(alias = "unix")]
    Epoch,
    /// Local ISO-8601 with microseconds, e.g. `2023-11-14T22:13:20.000000`.
    Iso,
}

impl TimeFormat {
    /// Render `at` in this format.
    pub fn stamp(self, at: DateTime<Local>) -> String {
        match self {
            Self::Epoch => at.timestamp().to_string(),
            Self::Iso => at
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        }
    }

    /// Render the current local time in this format.
    pub fn now(self) -> String {
        self.stamp(Local::now())
    }
}

impl FromStr for TimeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epoch" | "unix" => Ok(Self::Epoch),
            "iso" => Ok(Self::Iso),
            other => Err(format!("unknown time format '{other}' (expected epoch, unix or iso)")),
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epoch => write!(f, "epoch"),
            Self::Iso => write!(f, "iso"),
        }
    }
}

// ---------------------------------------------------------------------------
// SightingRecord
// ---------------------------------------------------------------------------

/// One first-in-interval sighting of a device, destined for the detail sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SightingRecord {
    /// Pre-rendered timestamp.
    pub timestamp: String,
    /// Transmitter address of the probing device.
    pub address: MacAddress,
    /// Registered organization for the address OUI, or `UNKNOWN`.
    pub organization: Option<String>,
    /// SSID the device probed for; empty for wildcard probes.
    pub ssid: Option<String>,
    /// Received signal strength in dBm.
    pub rssi_dbm: Option<i16>,
}

impl SightingRecord {
    /// Serialize as one delimiter-joined line.
    ///
    /// Field order is fixed: timestamp, address, organization, ssid, rssi;
    /// disabled fields are omitted rather than left blank.
    pub fn to_line(&self, delimiter: &str) -> String {
        let mut fields: Vec<String> = Vec::with_capacity(5);
        fields.push(self.timestamp.clone());
        fields.push(self.address.to_string());
        if let Some(org) = &self.organization {
            fields.push(org.clone());
        }
        if let Some(ssid) = &self.ssid {
            fields.push(ssid.clone());
        }
        if let Some(rssi) = self.rssi_dbm {
            fields.push(rssi.to_string());
        }
        fields.join(delimiter)
    }
}

// ---------------------------------------------------------------------------
// ReportRecord
// ---------------------------------------------------------------------------

/// The per-interval unique device count, destined for the summary sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    /// Pre-rendered timestamp.
    pub timestamp: String,
    /// Number of distinct transmitters seen during the interval.
    pub device_count: usize,
}

impl ReportRecord {
    /// Serialize as `timestamp<delim>count`.
    pub fn to_line(&self, delimiter: &str) -> String {
        format!("{}{}{}", self.timestamp, delimiter, self.device_count)
    }
}
