//! URTSI wire format.
//!
//! A command is five ASCII bytes with no terminator:
//!
//! ```text
//! 0 1 C C A
//! │ │ │ │ └─ action code: U (up, also stop) or D (down)
//! │ │ └─┴─── channel, two zero-padded decimal digits
//! └─┴─────── unit address, always "01"
//! ```

use crate::binding::{Channel, Command};

/// Address prefix of every frame.
pub const ADDRESS_PREFIX: &str = "01";

/// Length of an encoded frame.
pub const FRAME_LEN: usize = 5;

/// Single-character action understood by the URTSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCode {
    Up,
    Down,
}

impl ActionCode {
    pub fn as_char(self) -> char {
        match self {
            Self::Up => 'U',
            Self::Down => 'D',
        }
    }

    /// Map a command to its action code.
    ///
    /// STOP is sent as `U` by this protocol revision. Commands without a
    /// shutter movement meaning return `None`.
    pub fn for_command(command: Command) -> Option<Self> {
        match command {
            Command::Up | Command::Stop => Some(Self::Up),
            Command::Down => Some(Self::Down),
            Command::Move | Command::Percent(_) | Command::Refresh => None,
        }
    }
}

/// Build the frame for `action` on `channel`.
pub fn encode(channel: Channel, action: ActionCode) -> String {
    format!("{}{}{}", ADDRESS_PREFIX, channel, action.as_char())
}

/// Build the frame for `command` on `channel`, if the command moves anything.
pub fn encode_command(channel: Channel, command: Command) -> Option<String> {
    ActionCode::for_command(command).map(|action| encode(channel, action))
}
