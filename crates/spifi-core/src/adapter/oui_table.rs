//! Vendor lookup backed by an IEEE OUI registry dump.
//!
//! Accepts the registry's `oui.txt` layout:
//!
//! ```text
//! 00-1B-63   (hex)		Apple, Inc.
//! 001B63     (base 16)		Apple, Inc.
//! 				1 Infinite Loop
//! ```
//!
//! and a plain two-column layout (`00:1B:63<TAB>Apple, Inc.`). Lines that do
//! not start with an OUI are ignored, so postal-address continuation lines and
//! headers pass through harmlessly.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::domain::mac::MacAddress;
use crate::error::SpifiError;
use crate::port::VendorLookup;

/// In-memory OUI → organization table.
#[derive(Debug, Clone, Default)]
pub struct OuiTable {
    entries: HashMap<[u8; 3], String>,
}

impl OuiTable {
    /// Build a table from `(oui, organization)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = ([u8; 3], S)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }

    /// Parse registry text.
    pub fn parse(text: &str) -> Self {
        Self {
            entries: parse_oui_registry(text),
        }
    }

    /// Load and parse a registry file.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Number of registered OUIs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VendorLookup for OuiTable {
    fn organization(&self, address: &MacAddress) -> Result<Option<String>, SpifiError> {
        // Randomized and group addresses are never registered.
        if address.is_locally_administered() || address.is_multicast() {
            return Ok(None);
        }
        Ok(self.entries.get(&address.oui()).cloned())
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse registry text into an OUI map. The first entry for an OUI wins.
pub fn parse_oui_registry(text: &str) -> HashMap<[u8; 3], String> {
    let mut map = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let Some(oui) = parse_oui(key) else {
            continue;
        };

        let rest = rest.trim();
        let org = rest
            .strip_prefix("(hex)")
            .or_else(|| rest.strip_prefix("(base 16)"))
            .unwrap_or(rest)
            .trim();
        if org.is_empty() {
            continue;
        }

        map.entry(oui).or_insert_with(|| org.to_owned());
    }

    map
}

/// Parse `00-1B-63`, `00:1b:63` or `001B63`.
fn parse_oui(key: &str) -> Option<[u8; 3]> {
    let hex: String = key.chars().filter(|c| *c != '-' && *c != ':').collect();
    if hex.len() != 6
        || key.len() - hex.len() > 2
        || !hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }

    let mut oui = [0u8; 3];
    for (i, byte) in oui.iter_mut().enumerate() {
        *byte = u8::from_str_radix(hex.get(i * 2..i * 2 + 2)?, 16).ok()?;
    }
    Some(oui)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
OUI/MA-L                                                    Organization
company_id                                                  Organization
                                                            Address

00-1B-63   (hex)\t\tApple, Inc.
001B63     (base 16)\t\tApple, Inc.
\t\t\t\t1 Infinite Loop
\t\t\t\tCupertino  CA  95014
\t\t\t\tUS

00-00-0C   (hex)\t\tCisco Systems, Inc
00000C     (base 16)\t\tCisco Systems, Inc
";

    #[test]
    fn parses_ieee_layout() {
        let table = OuiTable::parse(SAMPLE);
        assert_eq!(table.len(), 2);

        let apple = MacAddress::parse("00:1b:63:84:45:e6").unwrap();
        assert_eq!(
            table.organization(&apple).unwrap().as_deref(),
            Some("Apple, Inc.")
        );

        let cisco = MacAddress::parse("00:00:0c:01:02:03").unwrap();
        assert_eq!(
            table.organization(&cisco).unwrap().as_deref(),
            Some("Cisco Systems, Inc")
        );
    }

    #[test]
    fn parses_two_column_layout() {
        let map = parse_oui_registry("# comment\n3C:5A:B4\tGoogle, Inc.\nzz:zz:zz\tNope\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map[&[0x3c, 0x5a, 0xb4]], "Google, Inc.");
    }

    #[test]
    fn unregistered_and_randomized_addresses_are_not_found() {
        let table = OuiTable::from_entries([([0x00, 0x1b, 0x63], "Apple, Inc.")]);

        let unknown = MacAddress::parse("00:50:56:00:00:01").unwrap();
        assert_eq!(table.organization(&unknown).unwrap(), None);

        // Same OUI bytes but with the locally-administered bit set.
        let random = MacAddress::parse("02:1b:63:00:00:01").unwrap();
        assert_eq!(table.organization(&random).unwrap(), None);
    }

    #[test]
    fn oui_key_forms() {
        assert_eq!(parse_oui("00-1B-63"), Some([0x00, 0x1b, 0x63]));
        assert_eq!(parse_oui("001b63"), Some([0x00, 0x1b, 0x63]));
        assert_eq!(parse_oui("Cupertino"), None);
        assert_eq!(parse_oui("00-1B-63-44"), None);
        assert_eq!(parse_oui("+1+B63"), None);
    }
}
