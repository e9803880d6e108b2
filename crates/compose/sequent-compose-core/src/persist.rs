//! Save/resume state layout.
//!
//! Only timers and reset snapshots need persistence; accumulators are
//! transient per step and binding is re-resolved on instantiation.

use serde::{Deserialize, Serialize};

use crate::ids::{InstanceId, TimerId};
use sequent_api_core::Value;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedTimer {
    pub timer: TimerId,
    pub time: f32,
    pub time_scale: f32,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedSnapshot {
    pub instance: InstanceId,
    pub timer: TimerId,
    pub track_idx: u32,
    /// None when no snapshot was valid at save time.
    pub value: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SavedState {
    #[serde(default)]
    pub timers: Vec<SavedTimer>,
    #[serde(default)]
    pub snapshots: Vec<SavedSnapshot>,
}
