//! Hardware address value object.
//!
//! The transmitter address (802.11 `addr2`) is the device identity used for
//! deduplication, so equality and hashing are on the raw octets and the
//! display form is the canonical lowercase colon notation.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SpifiError;

// ---------------------------------------------------------------------------
// MacAddress -- Value Object
// ---------------------------------------------------------------------------

/// A 6-byte IEEE 802 MAC address.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Parse a MAC address such as `"aa:bb:cc:dd:ee:ff"`.
    ///
    /// Hyphen separators (`AA-BB-CC-DD-EE-FF`) and upper-case hex are
    /// accepted as well.
    pub fn parse(s: &str) -> Result<Self, SpifiError> {
        let fail = || SpifiError::MacParseFailed {
            input: s.to_owned(),
        };

        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(fail());
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(fail());
            }
            bytes[i] = u8::from_str_radix(part, 16).map_err(|_| fail())?;
        }
        Ok(Self(bytes))
    }

    /// Return the raw 6-byte address.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// The organizationally unique identifier (first three octets).
    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    /// Whether the locally-administered bit is set.
    ///
    /// Randomized probe addresses set this bit; they never appear in the
    /// IEEE registry.
    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Whether this is a group (multicast/broadcast) address.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl FromStr for MacAddress {
    type Err = SpifiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}
