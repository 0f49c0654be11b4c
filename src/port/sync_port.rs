//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate with our own `SerialPortAdapter` trait and
//! provides the `SystemPortOpener` used by the device registry in production.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use std::io::Write;
use tracing::{debug, info, warn};

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying port; `None` once closed.
    port: Option<Box<dyn serialport::SerialPort>>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with the given configuration.
    ///
    /// # Example
    /// ```no_run
    /// use urtsi_bridge::port::{PortConfiguration, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &PortConfiguration::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits)
            .flow_control(config.flow_control)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .timeout(config.timeout)
            .open()
            .map_err(|e| open_error(port_name, e))?;

        info!(
            "Opened serial port {} at {} baud (8N1)",
            port_name, config.baud_rate
        );

        Ok(Self {
            port: Some(port),
            name: port_name.to_string(),
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, PortError> {
        self.port.as_mut().ok_or(PortError::NotOpen)
    }
}

/// Map a failed open onto `PortError`.
fn open_error(port_name: &str, e: serialport::Error) -> PortError {
    match e.kind() {
        serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
            PortError::InUse(port_name.to_string())
        }
        serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
            PortError::not_found(port_name, Vec::new())
        }
        serialport::ErrorKind::InvalidInput => PortError::unsupported(port_name, e.to_string()),
        _ => PortError::Serial(e),
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), PortError> {
        self.port_mut()?.write_all(data).map_err(PortError::Io)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.port_mut()?.flush().map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            // Secondary errors on close are not interesting to anyone.
            if let Err(e) = port.flush() {
                debug!("Ignoring flush error while closing {}: {}", self.name, e);
            }
            drop(port);
            info!("Closed serial port {}", self.name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SyncSerialPort {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// List the names of the serial ports present on this machine.
pub fn discover_ports() -> Result<Vec<String>, PortError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Opens real serial ports through the `serialport` crate.
#[derive(Debug, Clone)]
pub struct SystemPortOpener {
    config: PortConfiguration,
    verify_exists: bool,
}

impl SystemPortOpener {
    /// Create an opener that checks the port against the enumeration first.
    pub fn new(config: PortConfiguration) -> Self {
        Self {
            config,
            verify_exists: true,
        }
    }

    /// Skip the enumeration check.
    ///
    /// Needed for devices the platform does not enumerate, such as
    /// pseudo-terminals and some USB adapters behind udev symlinks.
    pub fn without_verification(mut self) -> Self {
        self.verify_exists = false;
        self
    }
}

impl Default for SystemPortOpener {
    fn default() -> Self {
        Self::new(PortConfiguration::default())
    }
}

impl PortOpener for SystemPortOpener {
    fn available_ports(&self) -> Result<Vec<String>, PortError> {
        discover_ports()
    }

    fn open(&self, port_name: &str) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        if self.verify_exists {
            let available = match self.available_ports() {
                Ok(ports) => ports,
                Err(e) => {
                    warn!("Serial port enumeration failed: {}", e);
                    Vec::new()
                }
            };
            if !available.iter().any(|name| name == port_name) {
                return Err(PortError::not_found(port_name, available));
            }
            debug!("Serial port '{}' has been found", port_name);
        }

        let port = SyncSerialPort::open(port_name, &self.config)?;
        Ok(Box::new(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_port_is_not_found() {
        let opener = SystemPortOpener::default();
        let result = opener.open("/dev/nonexistent_urtsi_12345");

        match result {
            Err(PortError::NotFound { port, .. }) => assert!(port.contains("nonexistent")),
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_vanished_device_is_a_serial_error() {
        let err = open_error(
            "/dev/ttyUSB0",
            serialport::Error::new(serialport::ErrorKind::NoDevice, "device disconnected"),
        );
        assert!(matches!(err, PortError::Serial(_)));
    }

    #[test]
    fn test_open_error_mapping() {
        let denied = serialport::Error::new(
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied),
            "denied",
        );
        assert!(matches!(open_error("COM3", denied), PortError::InUse(_)));

        let invalid = serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad baud");
        assert!(matches!(
            open_error("COM3", invalid),
            PortError::UnsupportedParameters { .. }
        ));
    }

    #[test]
    fn test_unverified_open_of_missing_port_fails() {
        let opener = SystemPortOpener::default().without_verification();
        assert!(opener.open("/dev/nonexistent_urtsi_12345").is_err());
    }
}
