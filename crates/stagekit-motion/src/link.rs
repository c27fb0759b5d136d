//! Request/reply layer over the transport
//!
//! Pairs each outgoing frame with the reply class it expects. Malformed
//! replies are logged and the *read* is retried; a frame is never resent,
//! so a retry cannot duplicate motion.

use stagekit_communication::firmware::grbl::error_decoder;
use stagekit_communication::firmware::grbl::{
    GrblCommand, GrblResponse, GrblResponseParser, PendingCommand, RealtimeCommand, StatusReport,
};
use stagekit_communication::Transport;
use stagekit_core::{MotionError, ProtocolError, Result};
use std::sync::Arc;
use tracing::{debug, warn};

// Banner and feedback lines skipped while waiting for a reply.
const MAX_SKIPPED_LINES: u32 = 16;
const STATUS_FRAME: &str = "?";

/// Frame-level access to an open transport
#[derive(Debug, Clone)]
pub struct CommandLink {
    transport: Arc<Transport>,
    parser: GrblResponseParser,
    protocol_retries: u32,
}

impl CommandLink {
    /// Wrap a transport; `protocol_retries` bounds re-reads after a bad reply
    pub fn new(transport: Arc<Transport>, protocol_retries: u32) -> Self {
        Self {
            transport,
            parser: GrblResponseParser::new(),
            protocol_retries,
        }
    }

    /// Underlying transport
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Send a line command and wait for `ok`.
    ///
    /// `error:N` and `ALARM:N` surface as [`MotionError::Rejected`].
    pub fn execute(&self, command: &GrblCommand) -> Result<()> {
        let pending = PendingCommand::from(command);
        debug!(frame = %pending.frame, expected = ?pending.expected, "Executing");
        let mut reply = self.transport.send_line(&pending.frame)?;
        let mut protocol_errors = 0;
        let mut skipped = 0;

        loop {
            let line = match reply {
                Some(line) => line,
                None => {
                    return Err(ProtocolError::NoReply {
                        frame: pending.frame,
                    }
                    .into())
                }
            };

            match self.parser.parse(&line) {
                Ok(GrblResponse::Ok) => return Ok(()),
                Ok(GrblResponse::Error(code)) => {
                    return Err(MotionError::Rejected {
                        frame: pending.frame,
                        code,
                        message: error_decoder::decode_error(code).to_string(),
                    }
                    .into())
                }
                Ok(GrblResponse::Alarm(code)) => {
                    return Err(MotionError::Rejected {
                        frame: pending.frame,
                        code,
                        message: error_decoder::decode_alarm(code).to_string(),
                    }
                    .into())
                }
                Ok(other) => {
                    skipped += 1;
                    debug!(frame = %pending.frame, "Skipping {}", other);
                    if skipped > MAX_SKIPPED_LINES {
                        return Err(ProtocolError::NoReply {
                            frame: pending.frame,
                        }
                        .into());
                    }
                }
                Err(e) => {
                    protocol_errors += 1;
                    warn!(frame = %pending.frame, attempt = protocol_errors, "Bad reply: {}", e);
                    if protocol_errors > self.protocol_retries {
                        return Err(e.into());
                    }
                }
            }

            reply = self.transport.read_line(&pending.frame)?;
        }
    }

    /// Send a line command without reading its reply
    pub fn send_unacknowledged(&self, command: &GrblCommand) -> Result<()> {
        self.transport.write_line(&command.to_frame())?;
        Ok(())
    }

    /// Write a real-time control byte
    pub fn realtime(&self, command: RealtimeCommand) -> Result<()> {
        self.transport.send_immediate(command.as_byte())?;
        Ok(())
    }

    /// Request one status report.
    ///
    /// Stray acknowledgements and messages are skipped. A malformed or
    /// missing report is retried with a fresh query up to the retry bound;
    /// serial faults surface immediately.
    pub fn query_status(&self) -> Result<StatusReport> {
        let mut protocol_errors = 0;
        loop {
            self.realtime(RealtimeCommand::StatusQuery)?;
            match self.read_status()? {
                Ok(report) => return Ok(report),
                Err(e) => {
                    protocol_errors += 1;
                    warn!(attempt = protocol_errors, "Status poll failed: {}", e);
                    if protocol_errors > self.protocol_retries {
                        return Err(e.into());
                    }
                }
            }
        }
    }

    fn read_status(&self) -> Result<std::result::Result<StatusReport, ProtocolError>> {
        let mut skipped = 0;
        loop {
            let line = match self.transport.read_line(STATUS_FRAME)? {
                Some(line) => line,
                None => {
                    return Ok(Err(ProtocolError::NoReply {
                        frame: STATUS_FRAME.to_string(),
                    }))
                }
            };
            match self.parser.parse(&line) {
                Ok(GrblResponse::Status(report)) => return Ok(Ok(report)),
                Ok(other) => {
                    skipped += 1;
                    debug!("Skipping {} while waiting for status", other);
                    if skipped > MAX_SKIPPED_LINES {
                        return Ok(Err(ProtocolError::NoReply {
                            frame: STATUS_FRAME.to_string(),
                        }));
                    }
                }
                Err(e) => return Ok(Err(e)),
            }
        }
    }
}
