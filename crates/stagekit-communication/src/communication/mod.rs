//! Physical link to the motion controller
//!
//! `serial` wraps the port handle; `transport` turns it into a
//! line-and-realtime-byte channel with a write lock.

pub mod serial;
pub mod transport;

pub use serial::{
    is_valid_cnc_port, list_ports, PortOpener, RealSerialLink, SerialLink, SerialPortInfo,
    SerialPortOpener,
};
pub use transport::{Transport, TransportOptions, TransportResult, RESET_SEQUENCE};
