//! The slice of the host's item model this binding consumes: item names,
//! item kinds and the command/state values sent to items.

use std::fmt;
use std::str::FromStr;

/// Kind of a host item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Rollershutter,
    Switch,
    Dimmer,
    Contact,
    Number,
    String,
    DateTime,
    Color,
    Group,
}

impl ItemKind {
    pub const ALL: [ItemKind; 9] = [
        ItemKind::Rollershutter,
        ItemKind::Switch,
        ItemKind::Dimmer,
        ItemKind::Contact,
        ItemKind::Number,
        ItemKind::String,
        ItemKind::DateTime,
        ItemKind::Color,
        ItemKind::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rollershutter => "Rollershutter",
            Self::Switch => "Switch",
            Self::Dimmer => "Dimmer",
            Self::Contact => "Contact",
            Self::Number => "Number",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Color => "Color",
            Self::Group => "Group",
        }
    }

    /// Whether an item of this kind can be driven by a URTSI.
    pub fn is_shutter(&self) -> bool {
        matches!(self, Self::Rollershutter)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown item type '{}'", s))
    }
}

/// A named host item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Shorthand for a rollershutter item.
    pub fn rollershutter(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Rollershutter)
    }
}

/// Command or state value delivered to an item.
///
/// Only the up/down/stop values mean anything to a URTSI; the rest are
/// accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    Stop,
    Move,
    /// Position in percent (0 = open, 100 = closed).
    Percent(u8),
    Refresh,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("UP"),
            Self::Down => f.write_str("DOWN"),
            Self::Stop => f.write_str("STOP"),
            Self::Move => f.write_str("MOVE"),
            Self::Percent(p) => write!(f, "{}", p),
            Self::Refresh => f.write_str("REFRESH"),
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_uppercase().as_str() {
            "UP" => Ok(Self::Up),
            "DOWN" => Ok(Self::Down),
            "STOP" => Ok(Self::Stop),
            "MOVE" => Ok(Self::Move),
            "REFRESH" => Ok(Self::Refresh),
            other => match other.parse::<u8>() {
                Ok(p) if p <= 100 => Ok(Self::Percent(p)),
                _ => Err(format!("unknown command '{}'", s)),
            },
        }
    }
}
