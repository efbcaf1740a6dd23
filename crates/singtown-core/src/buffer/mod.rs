use std::{
    io::{self, Write},
    sync::Arc,
};

use parking_lot::Mutex;

/// Log text accumulated between two flush cycles.
///
/// Written by the foreground (`Client::log`, subprocess streaming) and
/// drained by the watcher. `drain` reads and clears under one lock, so no
/// write can fall between the read and the clear.
#[derive(Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<String>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` followed by `end`.
    pub fn write(&self, message: &str, end: &str) {
        let mut buf = self.inner.lock();
        buf.push_str(message);
        buf.push_str(end);
    }

    /// Append `line` and a newline.
    pub fn write_line(&self, line: &str) {
        self.write(line, "\n");
    }

    /// Take everything written so far; `None` when nothing was written.
    pub fn drain(&self) -> Option<String> {
        let mut buf = self.inner.lock();
        if buf.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut *buf))
    }

    /// Put drained text back in front of anything written since.
    pub fn restore(&self, text: String) {
        let mut buf = self.inner.lock();
        let newer = std::mem::replace(&mut *buf, text);
        buf.push_str(&newer);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Scoped `io::Write` handle appending to this buffer.
    pub fn writer(&self) -> LogWriter {
        LogWriter {
            buffer: self.clone(),
            tee: None,
            pending: Vec::new(),
        }
    }
}

/// `io::Write` adapter over a [`LogBuffer`].
///
/// Replaces redirecting the process-wide stdout: code that wants its output
/// uploaded writes to this handle, optionally mirrored to another writer.
/// Nothing global is swapped, so dropping the handle is the whole teardown.
/// Bytes are decoded as UTF-8; a sequence split across two writes is held
/// back until it completes.
pub struct LogWriter {
    buffer: LogBuffer,
    tee: Option<Box<dyn Write + Send>>,
    pending: Vec<u8>,
}

impl LogWriter {
    /// Mirror everything written to `out` as well.
    pub fn tee(mut self, out: impl Write + Send + 'static) -> Self {
        self.tee = Some(Box::new(out));
        self
    }

    /// Mirror to the process stdout.
    pub fn tee_stdout(self) -> Self {
        self.tee(io::stdout())
    }

    fn push_decoded(&mut self) {
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.buffer.write(text, "");
                self.pending.clear();
                return;
            }
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.buffer.write(&text, "");
                self.pending.clear();
                return;
            }
        };
        let tail = self.pending.split_off(valid);
        let head = std::mem::replace(&mut self.pending, tail);
        // `valid` marks a char boundary of a well-formed prefix.
        self.buffer.write(&String::from_utf8_lossy(&head), "");
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(tee) = self.tee.as_mut() {
            tee.write_all(buf)?;
        }
        self.pending.extend_from_slice(buf);
        self.push_decoded();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.tee.as_mut() {
            Some(tee) => tee.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            let text = String::from_utf8_lossy(&self.pending).into_owned();
            self.buffer.write(&text, "");
        }
        let _ = self.flush();
    }
}
