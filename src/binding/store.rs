//! Item name → binding map, grouped by configuration context.

use super::config::ItemBinding;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct StoredBinding {
    binding: ItemBinding,
    context: String,
}

/// Bindings by item name, plus the set of item names each context owns.
///
/// An item belongs to exactly one context; registering it again moves it.
#[derive(Debug, Default)]
pub struct ItemConfigStore {
    items: HashMap<String, StoredBinding>,
    contexts: HashMap<String, HashSet<String>>,
}

impl ItemConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `binding` for `item_name` under `context`.
    ///
    /// Returns the binding it replaced, if the item was already bound.
    pub fn insert(
        &mut self,
        context: &str,
        item_name: &str,
        binding: ItemBinding,
    ) -> Option<ItemBinding> {
        let previous = self.items.insert(
            item_name.to_string(),
            StoredBinding {
                binding,
                context: context.to_string(),
            },
        );

        if let Some(ref previous) = previous {
            if previous.context != context {
                self.detach(&previous.context, item_name);
            }
        }

        self.contexts
            .entry(context.to_string())
            .or_default()
            .insert(item_name.to_string());

        previous.map(|p| p.binding)
    }

    /// Remove every binding registered under `context`, returning them.
    ///
    /// Unknown contexts yield nothing.
    pub fn remove_context(&mut self, context: &str) -> Vec<(String, ItemBinding)> {
        let Some(item_names) = self.contexts.remove(context) else {
            return Vec::new();
        };

        let mut removed: Vec<(String, ItemBinding)> = item_names
            .into_iter()
            .filter_map(|name| {
                let stored = self.items.remove(&name)?;
                Some((name, stored.binding))
            })
            .collect();
        removed.sort_by(|a, b| a.0.cmp(&b.0));
        removed
    }

    pub fn resolve(&self, item_name: &str) -> Option<&ItemBinding> {
        self.items.get(item_name).map(|s| &s.binding)
    }

    /// Context that owns `item_name`.
    pub fn context_of(&self, item_name: &str) -> Option<&str> {
        self.items.get(item_name).map(|s| s.context.as_str())
    }

    /// Whether any stored binding still uses `port`.
    pub fn references_port(&self, port: &str) -> bool {
        self.items.values().any(|s| s.binding.port == port)
    }

    /// Item names registered under `context`, sorted.
    pub fn items_in(&self, context: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .contexts
            .get(context)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Known contexts, sorted.
    pub fn contexts(&self) -> Vec<String> {
        let mut contexts: Vec<String> = self.contexts.keys().cloned().collect();
        contexts.sort();
        contexts
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.contexts.clear();
    }

    fn detach(&mut self, context: &str, item_name: &str) {
        if let Some(names) = self.contexts.get_mut(context) {
            names.remove(item_name);
            if names.is_empty() {
                self.contexts.remove(context);
            }
        }
    }
}
