//! Port-specific error types.
//!
//! Kept separate from the binding errors so the transport layer can be used
//! (and tested) without any knowledge of items or contexts.

use thiserror::Error;

/// Errors that can occur while opening, writing to, or closing a serial port.
#[derive(Debug, Error)]
pub enum PortError {
    /// The port does not show up in the system's serial port enumeration.
    #[error("Serial port '{port}' could not be found. Available ports are: [{}]", .available.join(", "))]
    NotFound { port: String, available: Vec<String> },

    /// The port exists but another process holds it.
    #[error("Serial port '{0}' is in use or not accessible")]
    InUse(String),

    /// The driver rejected the 9600-8-N-1 line settings.
    #[error("Serial port '{port}' does not support the required parameters: {message}")]
    UnsupportedParameters { port: String, message: String },

    /// An I/O error occurred while writing or flushing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Attempted to use a port that has already been closed.
    #[error("Port is not open")]
    NotOpen,

    /// The write worker for the port has stopped.
    #[error("Write worker for port '{0}' is no longer running")]
    WorkerGone(String),
}

impl PortError {
    /// Create a NotFound error from a port name and the ports that were found instead.
    pub fn not_found(port: impl Into<String>, available: Vec<String>) -> Self {
        Self::NotFound {
            port: port.into(),
            available,
        }
    }

    /// Create an UnsupportedParameters error.
    pub fn unsupported(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedParameters {
            port: port.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_available_ports() {
        let err = PortError::not_found(
            "/dev/ttyUSB9",
            vec!["/dev/ttyS0".to_string(), "/dev/ttyUSB0".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Serial port '/dev/ttyUSB9' could not be found. Available ports are: [/dev/ttyS0, /dev/ttyUSB0]"
        );
    }

    #[test]
    fn test_not_found_without_ports() {
        let err = PortError::not_found("COM7", Vec::new());
        assert!(err.to_string().ends_with("Available ports are: []"));
    }

    #[test]
    fn test_unsupported_display() {
        let err = PortError::unsupported("COM3", "baud rate");
        assert_eq!(
            err.to_string(),
            "Serial port 'COM3' does not support the required parameters: baud rate"
        );
    }
}
