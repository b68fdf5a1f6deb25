//! Line sinks backing the detail and summary logs.

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use spifi_core::LineSink;

/// Append-only log file, flushed after every line.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    /// Where this sink writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSink for FileSink {
    fn append_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")
    }
}

/// Forwards to an inner sink and echoes each line to stdout.
pub struct LiveViewSink {
    inner: Arc<dyn LineSink>,
}

impl LiveViewSink {
    /// Mirror `inner` to stdout.
    pub fn new(inner: Arc<dyn LineSink>) -> Self {
        Self { inner }
    }
}

impl LineSink for LiveViewSink {
    fn append_line(&self, line: &str) -> io::Result<()> {
        self.inner.append_line(line)?;
        // The live view is best effort; a closed stdout must not stop logging.
        let _ = writeln!(io::stdout().lock(), "{line}");
        Ok(())
    }
}

/// Open the file sink at `path`, mirrored to stdout when `live` is set.
pub fn open_log(path: &Path, live: bool) -> io::Result<Arc<dyn LineSink>> {
    let file: Arc<dyn LineSink> = Arc::new(FileSink::open(path)?);
    if live {
        Ok(Arc::new(LiveViewSink::new(file)))
    } else {
        Ok(file)
    }
}
