//! Per-pass memoization of coordinate grids.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::Result;
use crate::record::Coordinates;

/// Memoizes one coordinate grid per variable for a single processing pass.
///
/// Every record sharing a variable key is assumed to carry an identical
/// coordinate grid within the pass; this is not verified. The cache must
/// not be shared across passes or across unrelated variables.
#[derive(Debug, Default)]
pub struct CoordinateCache {
    grids: HashMap<String, Coordinates>,
}

impl CoordinateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached grid for `variable`, computing it with `fallback` at most
    /// once per variable per cache instance.
    pub fn get<F>(&mut self, variable: &str, fallback: F) -> Result<&Coordinates>
    where
        F: FnOnce() -> Result<Coordinates>,
    {
        match self.grids.entry(variable.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(fallback()?)),
        }
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}
