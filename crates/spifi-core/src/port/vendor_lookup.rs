//! The driven port for OUI-to-organization resolution.

use crate::domain::mac::MacAddress;
use crate::error::SpifiError;

/// Resolves the registered organization for a hardware address.
pub trait VendorLookup: Send + Sync {
    /// Look up the organization owning `address`'s OUI.
    ///
    /// Returns `Ok(None)` when the OUI is not registered. Any `Err` is a
    /// failure of the lookup itself.
    fn organization(&self, address: &MacAddress) -> Result<Option<String>, SpifiError>;
}
