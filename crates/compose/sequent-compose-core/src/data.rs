//! Timeline definition data model.
//!
//! Definitions are static once loaded: a timeline owns tracks, a track owns
//! time-ordered clips bound to one target path. Clip payloads are opaque
//! per-frame samples (constant or ramp) or an embedded sub-timeline.

use serde::{Deserialize, Serialize};

use crate::ids::TimelineId;
use sequent_api_core::Value;

fn default_scale() -> f32 {
    1.0
}

/// What a clip contributes while the playhead overlaps it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ClipPayload {
    /// Fixed sample for the whole clip span.
    Constant(Value),
    /// Linear ramp across the clip span; stands in for an external curve
    /// evaluator, which supplies samples opaquely.
    Ramp { from: Value, to: Value },
    /// Embedded sub-timeline. The clip window gates the child timer; the
    /// authored `time_scale` composes with the clip's own.
    SubTimeline {
        timeline: TimelineId,
        #[serde(default = "default_scale")]
        time_scale: f32,
    },
}

/// A time-windowed contribution with blend-in/out edges.
/// Times are seconds in the owning timer's clock.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClipData {
    pub start: f32,
    pub end: f32,
    /// Ease window after `start`; non-positive means an instantaneous step.
    #[serde(default)]
    pub blend_in: f32,
    /// Ease window before `end`; non-positive means an instantaneous step.
    #[serde(default)]
    pub blend_out: f32,
    /// Clip-local time-scale, propagated to embedded sub-timelines.
    #[serde(default = "default_scale")]
    pub time_scale: f32,
    pub payload: ClipPayload,
}

/// A per-target lane of clips.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrackData {
    pub id: String,
    pub name: String,
    /// Canonical target path, resolved to a handle at instantiation.
    #[serde(rename = "targetPath")]
    pub target_path: String,
    /// Capture the target's value on activation-enter and restore it on exit.
    #[serde(default)]
    pub reset_on_exit: bool,
    pub clips: Vec<ClipData>,
}

/// A loadable timeline definition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimelineData {
    /// Internal id assigned when loaded into the engine.
    #[serde(skip)]
    pub id: Option<TimelineId>,
    pub name: String,
    pub tracks: Vec<TrackData>,
    /// Duration in seconds; informational for hosts, clips are authoritative.
    pub duration: f32,
}

impl TimelineData {
    /// Validate definition invariants: positive duration, finite clip
    /// bounds with `start <= end`, and clips time-ordered per track.
    /// Degenerate blend windows are legal (instantaneous transitions).
    pub fn validate_basic(&self) -> Result<(), String> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(format!("timeline '{}' duration must be > 0", self.name));
        }
        for track in &self.tracks {
            let mut last_start = f32::NEG_INFINITY;
            for clip in &track.clips {
                if !clip.start.is_finite() || !clip.end.is_finite() {
                    return Err(format!(
                        "clip bounds must be finite on track '{}'",
                        track.target_path
                    ));
                }
                if clip.end < clip.start {
                    return Err(format!(
                        "clip end precedes start on track '{}'",
                        track.target_path
                    ));
                }
                if clip.start < last_start {
                    return Err(format!(
                        "clips must be time-ordered on track '{}'",
                        track.target_path
                    ));
                }
                last_start = clip.start;
            }
        }
        Ok(())
    }
}
