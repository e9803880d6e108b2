//! Live property state per target.
//!
//! The store is the single structure the resolution phase writes into, one
//! writer per target. Hosts seed it with the targets they own and may remove
//! targets at any step boundary; snapshot, reset, and resolution writes to a
//! removed target are silent no-ops (concurrent destruction is expected, not
//! an error).

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::binding::TargetHandle;
use sequent_api_core::Value;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PropertyStore {
    values: HashMap<TargetHandle, Value>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a target's property value (host-side seeding).
    pub fn set(&mut self, target: impl Into<TargetHandle>, value: Value) {
        self.values.insert(target.into(), value);
    }

    pub fn get(&self, target: &str) -> Option<&Value> {
        self.values.get(target)
    }

    /// Remove a target entirely; later writes to it are skipped.
    pub fn remove(&mut self, target: &str) -> Option<Value> {
        self.values.remove(target)
    }

    #[inline]
    pub fn contains(&self, target: &str) -> bool {
        self.values.contains_key(target)
    }

    /// Overwrite only if the target still exists. Returns whether a write
    /// happened.
    pub fn write_existing(&mut self, target: &str, value: Value) -> bool {
        match self.values.get_mut(target) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TargetHandle, &Value)> {
        self.values.iter()
    }
}
