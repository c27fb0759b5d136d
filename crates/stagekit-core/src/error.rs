//! Error handling for StageKit
//!
//! Error families follow the layers of the controller:
//! - Connection errors (port selection, serial I/O faults)
//! - Protocol errors (malformed or unrecognized firmware replies)
//! - Motion errors (rejected frames, poll timeouts, halts, busy link)
//!
//! Clamping a target to the travel limits is not an error; it is reported
//! through [`BoundsClampedWarning`].

use crate::data::{Axis, MachineState, Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection error type
///
/// A connection error is fatal to the session; the caller must reconnect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// None of the candidate ports could be opened
    #[error("No serial port available (tried: {})", tried.join(", "))]
    NoPortAvailable {
        /// Candidate ports in the order they were tried
        tried: Vec<String>,
    },

    /// A single port failed to open
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The port name
        port: String,
        /// The reason reported by the driver
        reason: String,
    },

    /// An operation needed an open link
    #[error("Controller not connected")]
    NotConnected,

    /// Serial I/O fault while sending or reading a frame
    #[error("Serial I/O error on '{frame}': {reason}")]
    Io {
        /// The frame being sent or awaited
        frame: String,
        /// The underlying I/O error
        reason: String,
    },
}

/// Protocol error type
///
/// Raised when a reply does not match the expected grammar. Protocol errors
/// are logged and the read or poll is retried up to a bound before surfacing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Reply matches none of the known shapes
    #[error("Unrecognized reply: {line:?}")]
    Unrecognized {
        /// The raw reply line
        line: String,
    },

    /// Reply looked like a status report but could not be decoded
    #[error("Malformed status report {line:?}: {reason}")]
    MalformedStatus {
        /// The raw reply line
        line: String,
        /// What was wrong with it
        reason: String,
    },

    /// Nothing arrived before the reply timeout
    #[error("No reply to '{frame}'")]
    NoReply {
        /// The frame that went unanswered
        frame: String,
    },
}

/// Motion error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Arrival was not confirmed within the poll budget
    #[error("Move phase '{phase}' not confirmed after {polls} polls (target {target})")]
    Timeout {
        /// Phase of the move that timed out
        phase: String,
        /// Number of status polls issued
        polls: u32,
        /// Target of the phase
        target: Position,
    },

    /// A feed hold interrupted the move
    #[error("Move phase '{phase}' halted by feed hold")]
    Halted {
        /// Phase of the move that was halted
        phase: String,
    },

    /// Another move is already in flight
    #[error("Another move is already in progress")]
    Busy,

    /// The controller state does not allow the operation
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        /// Current state
        state: MachineState,
        /// Requested operation
        operation: String,
    },

    /// A requested coordinate is not a finite number
    #[error("Invalid {axis} target: {value}")]
    InvalidTarget {
        /// The offending axis
        axis: Axis,
        /// The value supplied
        value: f64,
    },

    /// The firmware reported a position outside the configured travel
    #[error("Reported position {reported} is outside the travel limits")]
    OutOfTravel {
        /// Position as reported
        reported: Position,
    },

    /// The firmware answered with an error or alarm code
    #[error("Frame '{frame}' rejected: error {code} - {message}")]
    Rejected {
        /// The rejected frame
        frame: String,
        /// Firmware error code
        code: u8,
        /// Decoded description
        message: String,
    },
}

/// Informational notice that a requested coordinate was saturated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsClampedWarning {
    /// The axis that was clamped
    pub axis: Axis,
    /// Requested coordinate
    pub requested: f64,
    /// Coordinate actually used
    pub clamped: f64,
}

impl std::fmt::Display for BoundsClampedWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} target {:.3} exceeds travel, clamped to {:.3}",
            self.axis, self.requested, self.clamped
        )
    }
}

/// Main error type for StageKit
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Motion error
    #[error(transparent)]
    Motion(#[from] MotionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a motion timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Motion(MotionError::Timeout { .. }))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Io(_))
    }

    /// Check if this is a protocol error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
