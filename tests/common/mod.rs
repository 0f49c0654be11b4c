//! Shared test utilities for the integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use urtsi_bridge::port::{MockPortOpener, MockSerialPort};
use urtsi_bridge::{Command, Item, UrtsiBinding};

/// A binding service wired to a mock opener.
pub struct Harness {
    pub binding: UrtsiBinding,
    pub opener: MockPortOpener,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_opener(MockPortOpener::new())
    }

    pub fn with_opener(opener: MockPortOpener) -> Self {
        Self {
            binding: UrtsiBinding::new(Arc::new(opener.clone())),
            opener,
        }
    }

    /// Register a rollershutter, panicking on failure.
    pub fn bind(&self, context: &str, item: &str, config: &str) {
        self.binding
            .register(context, &Item::rollershutter(item), config)
            .unwrap_or_else(|e| panic!("binding {} to {} failed: {}", item, config, e));
    }

    /// Dispatch and wait until the write has reached the mock port.
    pub fn send(&self, item: &str, command: Command) {
        let ticket = self
            .binding
            .dispatch(item, command)
            .unwrap_or_else(|| panic!("{} {} produced no write", item, command));
        ticket.wait().expect("write failed");
    }

    /// The mock currently (or most recently) backing `port`.
    pub fn port(&self, port: &str) -> MockSerialPort {
        self.opener
            .last_opened(port)
            .unwrap_or_else(|| panic!("port {} was never opened", port))
    }
}

/// Write `content` to a temporary binding file.
pub fn binding_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}
