//! Ordered-unique inventory of the variables present in a source.

use std::collections::BTreeSet;

/// One distinct (variable, level) combination observed in a source file.
///
/// Derived ordering compares fields top to bottom: lexicographic by name,
/// then short identifier, then level type and level. Listings are
/// therefore deterministic regardless of message order in the source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct InventoryEntry {
    /// Full descriptive variable name.
    pub name: String,
    /// Short identifier, e.g. "t", "gh", "u".
    pub short_name: String,
    /// Level-type label, e.g. "isobaricInhPa".
    pub level_type: String,
    pub level: u32,
}

/// Deduplicated, ordered set of the entries seen while scanning a source.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    entries: BTreeSet<InventoryEntry>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, ignoring duplicates. Returns whether it was new.
    pub fn insert(&mut self, entry: InventoryEntry) -> bool {
        self.entries.insert(entry)
    }

    /// Entries in comparator order.
    pub fn iter(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
