//! Parsing of `<port>:<channel>` binding strings.

use super::error::{BindingError, BindingResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Pattern a binding string must match. The port is everything up to the
/// last colon.
pub const BINDING_PATTERN: &str = r"^(.+):([0-9]+)$";

static BINDING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(BINDING_PATTERN).expect("binding pattern is a valid regex"));

/// A URTSI output channel, 0 to 99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    pub const MAX: u8 = 99;

    pub fn new(channel: u8) -> Option<Self> {
        (channel <= Self::MAX).then_some(Self(channel))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Channel {
    /// Two zero-padded digits, as on the wire.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Where an item's shutter is wired: a serial port and a channel on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemBinding {
    pub port: String,
    pub channel: Channel,
}

impl ItemBinding {
    pub fn new(port: impl Into<String>, channel: Channel) -> Self {
        Self {
            port: port.into(),
            channel,
        }
    }

    /// Parse a `<port>:<channel>` string, e.g. `/dev/ttyUSB0:3`.
    pub fn parse(config: &str) -> BindingResult<Self> {
        let captures = BINDING_RE
            .captures(config)
            .ok_or_else(|| BindingError::ConfigParse {
                config: config.to_string(),
                pattern: BINDING_PATTERN,
            })?;

        let port = &captures[1];
        let digits = &captures[2];
        let channel = digits
            .parse::<u8>()
            .ok()
            .and_then(Channel::new)
            .ok_or_else(|| BindingError::ChannelOutOfRange {
                config: config.to_string(),
                channel: digits.to_string(),
            })?;

        Ok(Self::new(port, channel))
    }
}

impl FromStr for ItemBinding {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ItemBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.port, self.channel.get())
    }
}
