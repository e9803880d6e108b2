//! Error types shared across the compositor.
//!
//! Only structural/configuration problems surface as errors, and only at
//! setup time (load/instantiate). Per-step anomalies such as a disappeared
//! target or a degenerate blend window recover locally and silently.

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ComposeError {
    /// A property kind is accumulated without a registered mixer.
    #[error("no mixer registered for value kind {kind:?}")]
    MissingMixer { kind: ValueKind },

    /// A sub-timeline graph cycles back to an ancestor.
    #[error("composite timer graph cycles through timeline {timeline}")]
    CompositeCycle { timeline: u32 },

    /// A clip references a timeline id that was never loaded.
    #[error("timeline not found: {id}")]
    TimelineNotFound { id: u32 },

    /// Timeline definition failed validation.
    #[error("invalid timeline '{name}': {reason}")]
    InvalidTimeline { name: String, reason: String },

    /// Instance handle does not name a live instance.
    #[error("instance not found: {id}")]
    InstanceNotFound { id: u32 },
}
