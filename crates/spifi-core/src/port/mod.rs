//! Port definitions for the collaborators around the census core.
//!
//! Hexagonal-architecture ports that abstract the capture stream, the vendor
//! registry and the two output streams, so that live, replay and test-double
//! adapters can be swapped transparently.

mod frame_source;
mod line_sink;
mod vendor_lookup;

pub use frame_source::FrameSource;
pub use line_sink::LineSink;
pub use vendor_lookup::VendorLookup;
