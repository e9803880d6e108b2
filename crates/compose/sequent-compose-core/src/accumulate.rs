//! Accumulation of per-target contributions and blending into final values.
//!
//! Two phases per step: scatter emits `(target, value, weight)` tuples per
//! track (in parallel), then the reduce folds them into one `MixData` per
//! target using the incremental weighted-blend recurrence
//! `v' = lerp(v0, v1, w1 / (w0 + w1))`, `w' = w0 + w1` — order-independent
//! up to floating-point rounding, so the unspecified completion order of the
//! scatter tasks never changes the result beyond a small epsilon.

use hashbrown::HashMap;

use crate::binding::TargetHandle;
use sequent_api_core::{MixerRegistry, Value};

/// One contribution emitted by the scatter phase.
#[derive(Clone, Debug, PartialEq)]
pub struct Contribution {
    pub target: TargetHandle,
    pub value: Value,
    pub weight: f32,
}

/// Accumulator entry: running blend and total weight for one target.
/// `value` is only meaningful while `weight > 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct MixData {
    pub value: Value,
    pub weight: f32,
}

/// Per-step map from target to weighted blended value. Transient: built,
/// finalized, and dropped within one step.
pub struct Accumulator<'m> {
    mixers: &'m MixerRegistry,
    map: HashMap<TargetHandle, MixData>,
}

impl<'m> Accumulator<'m> {
    pub fn new(mixers: &'m MixerRegistry) -> Self {
        Self {
            mixers,
            map: HashMap::new(),
        }
    }

    pub fn with_capacity(mixers: &'m MixerRegistry, capacity: usize) -> Self {
        Self {
            mixers,
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Fold one contribution into the running mix for its target.
    /// Contributions with non-positive weight are excluded entirely.
    /// Mixer presence is checked at instantiation; a kind that still has no
    /// mixer here is skipped fail-soft.
    pub fn fold(&mut self, c: Contribution) {
        if c.weight <= 0.0 {
            return;
        }
        match self.map.entry(c.target) {
            hashbrown::hash_map::Entry::Occupied(mut e) => {
                let entry = e.get_mut();
                // The first contribution fixes the target's kind for the
                // step; a mismatched kind is dropped whole, weight included.
                if c.value.kind() != entry.value.kind() {
                    return;
                }
                let Some(mixer) = self.mixers.get(entry.value.kind()) else {
                    return;
                };
                let total = entry.weight + c.weight;
                entry.value = mixer.lerp(&entry.value, &c.value, c.weight / total);
                entry.weight = total;
            }
            hashbrown::hash_map::Entry::Vacant(e) => {
                e.insert(MixData {
                    value: c.value,
                    weight: c.weight,
                });
            }
        }
    }

    /// Fold a whole batch (the reduce phase over scatter output).
    pub fn reduce(&mut self, contributions: impl IntoIterator<Item = Contribution>) {
        for c in contributions {
            self.fold(c);
        }
    }

    /// Consume the accumulator, keeping only targets that actually received
    /// weight this step.
    pub fn finalize(self) -> HashMap<TargetHandle, MixData> {
        self.map
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
