//! Line-oriented transport over one serial link
//!
//! The transport owns the physical link for one connection lifetime. It
//! selects the first candidate port that opens, runs the reset handshake,
//! and then moves bytes: whole command lines and single real-time bytes.
//!
//! Writes are serialized by a lock on the write half only. A real-time byte
//! can therefore be written while another thread is still waiting on the
//! reply to a line command.

use crate::communication::serial::{PortOpener, SerialLink};
use parking_lot::Mutex;
use stagekit_core::{Clock, ConnectionError};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result type for transport operations
pub type TransportResult<T> = std::result::Result<T, ConnectionError>;

/// Blank-line sequence that wakes the firmware after a port open
pub const RESET_SEQUENCE: &[u8] = b"\r\n\r\n";

/// Transport timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportOptions {
    /// Upper bound on waiting for one reply line
    pub reply_timeout: Duration,
    /// Delay after the reset sequence before stale input is discarded
    pub reset_settle: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_millis(1000),
            reset_settle: Duration::from_millis(2000),
        }
    }
}

struct LineReader {
    link: Box<dyn SerialLink>,
    pending: Vec<u8>,
}

impl LineReader {
    fn take_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|b| *b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&raw).trim().to_string())
    }

    /// Next non-empty line, or `None` once `deadline` passes
    fn read_line(&mut self, deadline: Instant) -> io::Result<Option<String>> {
        let mut buf = [0u8; 256];
        loop {
            while let Some(line) = self.take_line() {
                if !line.is_empty() {
                    return Ok(Some(line));
                }
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }

            match self.link.read(&mut buf) {
                Ok(0) => std::thread::yield_now(),
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
                Err(e) => return Err(e),
            }
        }
    }

    fn discard(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.link.clear_input()
    }
}

/// An open, initialized link to the motion controller
pub struct Transport {
    port_name: String,
    writer: Mutex<Option<Box<dyn SerialLink>>>,
    reader: Mutex<Option<LineReader>>,
    options: TransportOptions,
}

fn io_fault(frame: &str, err: io::Error) -> ConnectionError {
    ConnectionError::Io {
        frame: frame.to_string(),
        reason: err.to_string(),
    }
}

impl Transport {
    /// Open the first candidate port that accepts a connection and run the
    /// reset handshake on it.
    ///
    /// Candidates are tried in order. If none opens the call fails with
    /// [`ConnectionError::NoPortAvailable`] and nothing stays open.
    pub fn connect(
        candidates: &[String],
        baud_rate: u32,
        opener: &dyn PortOpener,
        options: TransportOptions,
        clock: &dyn Clock,
    ) -> TransportResult<Self> {
        let mut link = None;
        for port in candidates {
            match opener.open(port, baud_rate) {
                Ok(opened) => {
                    info!(port = %port, baud_rate, "Serial port opened");
                    link = Some((port.clone(), opened));
                    break;
                }
                Err(e) => {
                    warn!(port = %port, "Could not open port, trying next: {}", e);
                }
            }
        }

        let (port_name, writer) = link.ok_or_else(|| ConnectionError::NoPortAvailable {
            tried: candidates.to_vec(),
        })?;
        let read_half = writer
            .try_clone()
            .map_err(|e| io_fault("<open>", e))?;

        let transport = Self {
            port_name,
            writer: Mutex::new(Some(writer)),
            reader: Mutex::new(Some(LineReader {
                link: read_half,
                pending: Vec::new(),
            })),
            options,
        };
        transport.reset_handshake(clock)?;
        Ok(transport)
    }

    /// Wake the firmware, let it settle, then drop its banner and any noise
    fn reset_handshake(&self, clock: &dyn Clock) -> TransportResult<()> {
        debug!(port = %self.port_name, "Running reset handshake");
        self.write_bytes(RESET_SEQUENCE, "<reset>")?;
        clock.sleep(self.options.reset_settle);
        self.discard_input()
    }

    /// Name of the selected port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Timing this transport was opened with
    pub fn options(&self) -> TransportOptions {
        self.options
    }

    /// True until [`Transport::disconnect`] is called
    pub fn is_open(&self) -> bool {
        self.writer.lock().is_some()
    }

    fn write_bytes(&self, data: &[u8], frame: &str) -> TransportResult<()> {
        let mut guard = self.writer.lock();
        let link = guard.as_mut().ok_or(ConnectionError::NotConnected)?;
        link.write_all(data).map_err(|e| io_fault(frame, e))
    }

    /// Write one command line without waiting for its reply
    pub fn write_line(&self, text: &str) -> TransportResult<()> {
        debug!(frame = %text, "-> line");
        let mut line = Vec::with_capacity(text.len() + 1);
        line.extend_from_slice(text.as_bytes());
        line.push(b'\n');
        self.write_bytes(&line, text)
    }

    /// Write one command line and return the first reply line.
    ///
    /// Returns `Ok(None)` when nothing arrives within the reply timeout.
    pub fn send_line(&self, text: &str) -> TransportResult<Option<String>> {
        self.write_line(text)?;
        self.read_line(text)
    }

    /// Read the next reply line; `frame` names the command it belongs to
    pub fn read_line(&self, frame: &str) -> TransportResult<Option<String>> {
        let deadline = Instant::now() + self.options.reply_timeout;
        let mut guard = self.reader.lock();
        let reader = guard.as_mut().ok_or(ConnectionError::NotConnected)?;
        let line = reader
            .read_line(deadline)
            .map_err(|e| io_fault(frame, e))?;
        match &line {
            Some(l) => debug!(frame = %frame, reply = %l, "<- line"),
            None => debug!(frame = %frame, "<- no reply"),
        }
        Ok(line)
    }

    /// Write a single real-time control byte.
    ///
    /// Only the write lock is taken, so this never waits behind a reader.
    pub fn send_immediate(&self, byte: u8) -> TransportResult<()> {
        let ch = byte as char;
        debug!(byte = ?ch, "-> realtime");
        self.write_bytes(&[byte], &format!("realtime 0x{:02x}", byte))
    }

    /// Drop anything buffered on the input side
    pub fn discard_input(&self) -> TransportResult<()> {
        let mut guard = self.reader.lock();
        let reader = guard.as_mut().ok_or(ConnectionError::NotConnected)?;
        reader.discard().map_err(|e| io_fault("<discard>", e))
    }

    /// Release both handles. Calling it again is a no-op.
    pub fn disconnect(&self) {
        let writer = self.writer.lock().take();
        let reader = self.reader.lock().take();
        if writer.is_some() || reader.is_some() {
            info!(port = %self.port_name, "Serial port closed");
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("port_name", &self.port_name)
            .field("open", &self.is_open())
            .finish()
    }
}
