//! Frame source that replays decoder output as JSON lines.
//!
//! Each non-blank line is one [`DecodedFrame`]:
//!
//! ```text
//! {"type":0,"subtype":4,"addr2":"00:1b:63:84:45:e6","info":"eduroam","notdecoded":[0,0,206,0]}
//! ```
//!
//! This lets any external dissector (a capture helper, a pcap converter, a
//! test fixture) feed the census without linking a capture library.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::domain::frame::DecodedFrame;
use crate::error::SpifiError;
use crate::port::FrameSource;

/// Replays JSON-encoded frames from any buffered reader.
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    buf: Vec<u8>,
}

impl<R: BufRead + Send> JsonLinesSource<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: Vec::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line_no
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a file of JSON lines.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead + Send> FrameSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, SpifiError> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            // Invalid UTF-8 fails this frame only.
            return serde_json::from_slice(&self.buf)
                .map(Some)
                .map_err(|e| SpifiError::FrameDecode {
                    line: self.line_no,
                    message: e.to_string(),
                });
        }
    }
}
