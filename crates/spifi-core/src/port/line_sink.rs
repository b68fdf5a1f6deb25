//! The driven port for the detail and summary streams.

use std::io;

/// An append-only, line-oriented destination.
///
/// Lines arrive fully formatted and without a trailing newline. Persistence,
/// rotation and live mirroring are the sink's concern.
pub trait LineSink: Send + Sync {
    /// Append one line.
    fn append_line(&self, line: &str) -> io::Result<()>;
}
