//! Core traits for the serial transport.
//!
//! `SerialPortAdapter` lets the real port and the mock be used interchangeably
//! by the write workers, and `PortOpener` lets the device registry open ports
//! without knowing where they come from.

use super::error::PortError;
use std::time::Duration;

/// Line settings used to open a port.
///
/// The URTSI only speaks 9600-8-N-1; the only tunable is the open timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfiguration {
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
    pub timeout: Duration,
}

/// Fixed baud rate of the URTSI serial interface.
pub const URTSI_BAUD_RATE: u32 = 9600;

/// Default time allowed for a port to open.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_millis(2000);

impl PortConfiguration {
    /// 9600-8-N-1 with the given timeout.
    pub fn urtsi(timeout: Duration) -> Self {
        Self {
            baud_rate: URTSI_BAUD_RATE,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            flow_control: serialport::FlowControl::None,
            timeout,
        }
    }
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self::urtsi(DEFAULT_OPEN_TIMEOUT)
    }
}

/// Trait for the write side of a serial port.
///
/// Nothing is ever read back from a URTSI, so the trait only covers writing,
/// flushing and closing.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write all of `data` to the port.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), PortError>;

    /// Push buffered bytes out to the device.
    fn flush(&mut self) -> Result<(), PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Release the port. Calling this on a closed port is a no-op.
    fn close(&mut self);

    /// Whether the port is still open.
    fn is_open(&self) -> bool;
}

/// Opens transports by port name.
pub trait PortOpener: Send + Sync {
    /// Names of the serial ports currently present on the system.
    fn available_ports(&self) -> Result<Vec<String>, PortError>;

    /// Open `port_name` for writing.
    fn open(&self, port_name: &str) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}
