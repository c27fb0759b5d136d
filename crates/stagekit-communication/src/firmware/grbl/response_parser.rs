//! GRBL Response Parser
//!
//! Classifies reply lines: acknowledgements, error and alarm codes, status
//! reports, and informational lines (banner, bracketed feedback, setting
//! echoes). Anything else is a protocol error.

use super::status_parser::{StatusParser, StatusReport};
use stagekit_core::ProtocolError;
use std::fmt;

/// GRBL response types
#[derive(Debug, Clone, PartialEq)]
pub enum GrblResponse {
    /// OK acknowledgment
    Ok,
    /// Error response with error code
    Error(u8),
    /// Alarm response with alarm code
    Alarm(u8),
    /// Status report
    Status(StatusReport),
    /// Banner, `[MSG:...]` feedback, or `$n=v` echo
    Message(String),
}

impl GrblResponse {
    /// True for replies that complete a line command
    pub fn is_terminal(&self) -> bool {
        matches!(self, GrblResponse::Ok | GrblResponse::Error(_) | GrblResponse::Alarm(_))
    }
}

impl fmt::Display for GrblResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error(code) => write!(f, "{}", super::error_decoder::format_error(*code)),
            Self::Alarm(code) => write!(f, "{}", super::error_decoder::format_alarm(*code)),
            Self::Status(report) => write!(f, "status:{}", report.raw_state),
            Self::Message(msg) => write!(f, "message:{}", msg),
        }
    }
}

/// GRBL response parser
#[derive(Debug, Default, Clone, Copy)]
pub struct GrblResponseParser;

impl GrblResponseParser {
    /// Create a new GRBL response parser
    pub fn new() -> Self {
        Self
    }

    /// Parse one reply line
    pub fn parse(&self, line: &str) -> Result<GrblResponse, ProtocolError> {
        let line = line.trim();

        if line.is_empty() {
            return Err(ProtocolError::Unrecognized {
                line: String::new(),
            });
        }

        if line == "ok" {
            return Ok(GrblResponse::Ok);
        }

        if let Some(stripped) = line.strip_prefix("error:") {
            return Self::parse_code(line, stripped).map(GrblResponse::Error);
        }

        if let Some(stripped) = line
            .strip_prefix("ALARM:")
            .or_else(|| line.strip_prefix("alarm:"))
        {
            return Self::parse_code(line, stripped).map(GrblResponse::Alarm);
        }

        if StatusParser::is_status_line(line) {
            return StatusParser::parse(line).map(GrblResponse::Status);
        }

        let is_message = line.starts_with("Grbl ")
            || (line.starts_with('[') && line.ends_with(']'))
            || (line.starts_with('$') && line.contains('='));
        if is_message {
            return Ok(GrblResponse::Message(line.to_string()));
        }

        Err(ProtocolError::Unrecognized {
            line: line.to_string(),
        })
    }

    fn parse_code(line: &str, code: &str) -> Result<u8, ProtocolError> {
        code.trim()
            .parse::<u8>()
            .map_err(|_| ProtocolError::Unrecognized {
                line: line.to_string(),
            })
    }
}
