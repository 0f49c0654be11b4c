//! Binding files.
//!
//! One file describes one configuration context:
//!
//! ```toml
//! [[item]]
//! name = "Shutter_Living"
//! type = "Rollershutter"
//! urtsi = "/dev/ttyUSB0:3"
//! ```
//!
//! Item names, types and `urtsi` strings are kept raw here and checked per
//! entry, so one bad line only rejects its own item.

use super::error::{ConfigError, ConfigResult};
use crate::binding::{BindingError, BindingResult, Item, ItemKind};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

fn default_kind() -> String {
    ItemKind::Rollershutter.to_string()
}

/// One `[[item]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingEntry {
    pub name: String,
    /// Item type as written in the file
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// Raw `<port>:<channel>` string
    pub urtsi: String,
}

impl BindingEntry {
    /// The host item this entry describes. Unknown types are a `TypeMismatch`.
    pub fn item(&self) -> BindingResult<Item> {
        let kind = self
            .kind
            .parse::<ItemKind>()
            .map_err(|_| BindingError::TypeMismatch {
                item: self.name.clone(),
                kind: self.kind.clone(),
            })?;
        Ok(Item::new(self.name.clone(), kind))
    }
}

/// Contents of one binding file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BindingFile {
    #[serde(rename = "item", default)]
    pub items: Vec<BindingEntry>,
}

impl BindingFile {
    /// Parse binding file contents. `origin` is only used in error messages.
    ///
    /// Only malformed TOML fails here; bad entries are reported by
    /// [`checked_items`](Self::checked_items).
    pub fn parse(content: &str, origin: &Path) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: origin.to_path_buf(),
            source: e,
        })
    }

    /// Read and parse a binding file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Every entry with its item, or the reason the entry cannot be bound.
    ///
    /// The first entry of a name wins; later ones are `DuplicateItem`.
    pub fn checked_items(&self) -> Vec<(&BindingEntry, BindingResult<Item>)> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(|entry| {
                let result = if entry.name.trim().is_empty() {
                    Err(BindingError::EmptyItemName)
                } else if !seen.insert(entry.name.as_str()) {
                    Err(BindingError::DuplicateItem {
                        item: entry.name.clone(),
                    })
                } else {
                    entry.item()
                };
                (entry, result)
            })
            .collect()
    }
}
