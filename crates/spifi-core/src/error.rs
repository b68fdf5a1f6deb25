//! Error types for the spifi-core crate.

use thiserror::Error;

/// A specialized `Result` type for spifi operations.
pub type SpifiResult<T> = Result<T, SpifiError>;

/// Errors that can occur while classifying frames, reporting, or scheduling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpifiError {
    /// Failed to parse a MAC address string (expected `aa:bb:cc:dd:ee:ff`).
    #[error("failed to parse MAC address from '{input}': expected aa:bb:cc:dd:ee:ff")]
    MacParseFailed {
        /// The input string that could not be parsed.
        input: String,
    },

    /// The raw trailer is too short to carry the signal-strength byte.
    #[error("radio trailer too short for RSSI decode: need {needed} bytes, got {got}")]
    TrailerTooShort {
        /// Minimum trailer length required.
        needed: usize,
        /// Actual trailer length.
        got: usize,
    },

    /// The vendor lookup failed for a reason other than "not registered".
    #[error("vendor lookup failed for {address}: {reason}")]
    VendorLookup {
        /// The address being looked up.
        address: String,
        /// Human-readable description of the failure.
        reason: String,
    },

    /// A line sink refused an append.
    #[error("{sink} sink write failed: {source}")]
    Sink {
        /// Which sink failed (`detail` or `summary`).
        sink: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A frame source could not produce the next frame.
    #[error("frame source error: {0}")]
    Source(#[from] std::io::Error),

    /// A frame record could not be decoded by the source adapter.
    #[error("frame decode error on line {line}: {message}")]
    FrameDecode {
        /// 1-based line number in the source stream.
        line: usize,
        /// Description of what was wrong with the record.
        message: String,
    },

    /// `start` was called on a timer that is already running.
    #[error("recurring timer is already running")]
    TimerAlreadyRunning,

    /// The report interval must be strictly positive.
    #[error("invalid report interval: {0:?} (must be non-zero and within the clock range)")]
    InvalidInterval(std::time::Duration),

    /// The timer worker thread could not be spawned.
    #[error("failed to spawn timer thread: {0}")]
    TimerSpawn(String),
}

impl SpifiError {
    /// Whether this error only affects the frame being processed.
    ///
    /// Record-fatal errors drop one detail line; the session keeps running.
    pub fn is_record_fatal(&self) -> bool {
        matches!(
            self,
            Self::TrailerTooShort { .. } | Self::VendorLookup { .. } | Self::FrameDecode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailer_error_is_record_fatal() {
        let err = SpifiError::TrailerTooShort { needed: 4, got: 1 };
        assert!(err.is_record_fatal());
        assert_eq!(
            err.to_string(),
            "radio trailer too short for RSSI decode: need 4 bytes, got 1"
        );
    }

    #[test]
    fn sink_error_is_not_record_fatal() {
        let err = SpifiError::Sink {
            sink: "summary",
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(!err.is_record_fatal());
        assert!(err.to_string().starts_with("summary sink write failed"));
    }
}
