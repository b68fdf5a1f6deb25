//! Adapter implementations for the census ports.
//!
//! - [`JsonLinesSource`]: [`FrameSource`](crate::port::FrameSource) replaying
//!   one JSON-encoded decoded frame per line (file, pipe or stdin).
//! - [`OuiTable`]: [`VendorLookup`](crate::port::VendorLookup) backed by an
//!   IEEE `oui.txt` registry dump.
//! - [`MemorySink`]: [`LineSink`](crate::port::LineSink) that keeps lines in
//!   memory, for embedding and tests.

pub mod json_lines_source;
pub mod memory_sink;
pub mod oui_table;

pub use json_lines_source::JsonLinesSource;
pub use memory_sink::MemorySink;
pub use oui_table::{parse_oui_registry, OuiTable};
