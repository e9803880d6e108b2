//! Output contracts from the core engine.
//!
//! Outputs carry the composed value written per target this step plus
//! discrete edge events, so hosts can mirror writes and observe transitions
//! without polling timer state.

use serde::{Deserialize, Serialize};

use crate::binding::TargetHandle;
use crate::ids::InstanceId;
use sequent_api_core::Value;

/// One composed value written to a target this step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub target: TargetHandle,
    pub value: Value,
}

/// Discrete semantic signals emitted during stepping.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum CoreEvent {
    Activated {
        instance: InstanceId,
    },
    Deactivated {
        instance: InstanceId,
    },
    SnapshotCaptured {
        instance: InstanceId,
        target: TargetHandle,
    },
    SnapshotRestored {
        instance: InstanceId,
        target: TargetHandle,
    },
}

/// Outputs returned by `Engine::step`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }

    /// Composed value written to `target` this step, if any.
    pub fn change_for(&self, target: &str) -> Option<&Value> {
        self.changes
            .iter()
            .find(|c| c.target == target)
            .map(|c| &c.value)
    }
}
