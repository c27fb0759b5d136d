//! # StageKit Communication
//!
//! Serial transport and firmware protocol codec for the calibration stage.
//! The transport moves lines and real-time bytes; the GRBL codec builds
//! command frames and classifies replies.

pub mod communication;
pub mod firmware;

pub use communication::{
    list_ports, PortOpener, SerialLink, SerialPortInfo, SerialPortOpener, Transport,
    TransportOptions,
};

pub use firmware::grbl::{
    FirmwareParameter, GrblCommand, GrblResponse, GrblResponseParser, RealtimeCommand,
    StatusReport,
};
