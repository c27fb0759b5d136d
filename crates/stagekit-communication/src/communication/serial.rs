//! Serial port communication implementation
//!
//! Provides the low-level link between the host and the motion controller:
//! - Port enumeration and discovery
//! - A [`SerialLink`] abstraction over one open port handle
//! - A [`PortOpener`] that turns a port name into a link
//!
//! The `serialport` crate backs the real implementation; tests substitute
//! in-memory links through the same traits.

use stagekit_core::{ConnectionError, Error, Result};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// List serial ports that look like a motion controller
///
/// Filters to the usual USB-serial patterns:
/// - Windows: COM* (e.g., COM1, COM3)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        Error::other(format!("Failed to enumerate ports: {}", e))
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_valid_cnc_port(&port.port_name))
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, get_port_description(port));
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb_info) => {
                    let info = info.with_usb_ids(usb_info.vid, usb_info.pid);
                    match &usb_info.manufacturer {
                        Some(mfg) => info.with_manufacturer(mfg),
                        None => info,
                    }
                }
                _ => info,
            }
        })
        .collect())
}

/// Check if a port name matches a motion-controller pattern
pub fn is_valid_cnc_port(port_name: &str) -> bool {
    if let Some(digits) = port_name.strip_prefix("COM") {
        return !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn get_port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// One open handle to a serial device
pub trait SerialLink: Send {
    /// Write the whole buffer and flush it to the device
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read whatever is available; `Ok(0)` or `TimedOut` means nothing yet
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Discard any buffered input
    fn clear_input(&mut self) -> io::Result<()>;

    /// Open a second handle to the same device, used to split reads from writes
    fn try_clone(&self) -> io::Result<Box<dyn SerialLink>>;

    /// Port name
    fn name(&self) -> String;
}

/// Opens a named port at a baud rate
pub trait PortOpener: Send + Sync {
    /// Open `port`; fails with [`ConnectionError::FailedToOpen`]
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
    ) -> std::result::Result<Box<dyn SerialLink>, ConnectionError>;
}

/// Real serial port implementation using the serialport crate
pub struct RealSerialLink {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SerialLink for RealSerialLink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn try_clone(&self) -> io::Result<Box<dyn SerialLink>> {
        let port = self.port.try_clone().map_err(io::Error::from)?;
        Ok(Box::new(RealSerialLink {
            port,
            name: self.name.clone(),
        }))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// [`PortOpener`] for physical ports, 8N1 without flow control
#[derive(Debug, Clone, Copy)]
pub struct SerialPortOpener {
    read_timeout: Duration,
}

impl SerialPortOpener {
    /// Create an opener whose ports use `read_timeout` for each blocking read
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }
}

impl Default for SerialPortOpener {
    fn default() -> Self {
        // Short timeout so line reads can check their own deadline.
        Self::new(Duration::from_millis(10))
    }
}

impl PortOpener for SerialPortOpener {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
    ) -> std::result::Result<Box<dyn SerialLink>, ConnectionError> {
        let opened = serialport::new(port, baud_rate)
            .timeout(self.read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| ConnectionError::FailedToOpen {
                port: port.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(RealSerialLink {
            port: opened,
            name: port.to_string(),
        }))
    }
}
