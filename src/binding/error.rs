//! Errors raised while binding items to URTSI channels.

use crate::port::PortError;
use thiserror::Error;

/// Why a single binding attempt was rejected.
///
/// Each of these aborts only the binding it was raised for.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The binding string does not match `<port>:<channel>`.
    #[error("bindingConfig '{config}' doesn't contain a valid URTSI binding configuration. A valid configuration is matched by the RegExp '{pattern}'")]
    ConfigParse {
        config: String,
        pattern: &'static str,
    },

    /// The channel does not fit the two-digit wire field.
    #[error("bindingConfig '{config}' uses channel {channel}, but URTSI channels range from 0 to 99")]
    ChannelOutOfRange { config: String, channel: String },

    /// The item is not a rollershutter, or its type is not known at all.
    #[error("item '{item}' is of type '{kind}', only Rollershutter items are allowed - please check your items configuration")]
    TypeMismatch { item: String, kind: String },

    /// A binding file entry without a name.
    #[error("item without a name")]
    EmptyItemName,

    /// A later entry of a binding file reuses an earlier entry's name.
    #[error("item '{item}' is bound more than once in the same file")]
    DuplicateItem { item: String },

    /// The serial port could not be opened.
    #[error("Could not open serial port {port}: {source}")]
    Initialization {
        port: String,
        #[source]
        source: PortError,
    },
}

pub type BindingResult<T> = Result<T, BindingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_names_item_and_kind() {
        let err = BindingError::TypeMismatch {
            item: "Light_Kitchen".to_string(),
            kind: "Switch".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'Light_Kitchen'"));
        assert!(message.contains("'Switch'"));
    }

    #[test]
    fn test_initialization_keeps_source() {
        use std::error::Error as _;

        let err = BindingError::Initialization {
            port: "COM3".to_string(),
            source: PortError::InUse("COM3".to_string()),
        };
        assert!(err.to_string().starts_with("Could not open serial port COM3: "));
        assert!(err.source().is_some());
    }
}
