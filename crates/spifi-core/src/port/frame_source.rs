//! The driving port: a stream of decoded frames.

use crate::domain::frame::DecodedFrame;
use crate::error::SpifiError;

/// Port that abstracts the capture collaborator.
///
/// A source is drained from a single thread. Implementations include:
/// - [`crate::adapter::JsonLinesSource`] -- replays decoder output.
pub trait FrameSource: Send {
    /// Produce the next frame.
    ///
    /// `Ok(None)` means the stream has ended. A record-fatal error (see
    /// [`SpifiError::is_record_fatal`]) skips one frame; any other error ends
    /// the stream.
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, SpifiError>;
}
