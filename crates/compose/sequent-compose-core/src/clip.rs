//! Clip contribution source: window weight and payload sampling.
//!
//! A clip contributes iff `start <= t <= end`. Its weight is the minimum of
//! the two ease windows, each clamped to [0,1]; a non-positive window is an
//! instantaneous full-weight step. A clip outside its window contributes
//! nothing at all (excluded from the accumulator, not zero-weighted).

use crate::data::{ClipData, ClipPayload};
use sequent_api_core::{MixerRegistry, Value};

impl ClipData {
    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        self.start <= t && t <= self.end
    }

    /// Blend weight at time `t`, or None when the playhead is outside the
    /// clip window.
    pub fn weight_at(&self, t: f32) -> Option<f32> {
        if !self.contains(t) {
            return None;
        }
        let rise = if self.blend_in > 0.0 {
            ((t - self.start) / self.blend_in).min(1.0)
        } else {
            1.0
        };
        let fall = if self.blend_out > 0.0 {
            ((self.end - t) / self.blend_out).min(1.0)
        } else {
            1.0
        };
        Some(rise.min(fall).clamp(0.0, 1.0))
    }

    /// Raw sampled value at time `t`. Sub-timeline payloads produce no
    /// direct sample; they only gate their child timer.
    pub fn sample_at(&self, t: f32, mixers: &MixerRegistry) -> Option<Value> {
        match &self.payload {
            ClipPayload::Constant(v) => Some(v.clone()),
            ClipPayload::Ramp { from, to } => {
                let span = self.end - self.start;
                let u = if span > 0.0 {
                    ((t - self.start) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let mixer = mixers.get(from.kind())?;
                Some(mixer.lerp(from, to, u))
            }
            ClipPayload::SubTimeline { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequent_api_core::Value;

    fn clip(start: f32, end: f32, blend_in: f32, blend_out: f32) -> ClipData {
        ClipData {
            start,
            end,
            blend_in,
            blend_out,
            time_scale: 1.0,
            payload: ClipPayload::Constant(Value::Float(1.0)),
        }
    }

    #[test]
    fn outside_window_contributes_nothing() {
        let c = clip(1.0, 3.0, 0.5, 0.5);
        assert_eq!(c.weight_at(0.99), None);
        assert_eq!(c.weight_at(3.01), None);
    }

    #[test]
    fn ease_windows_ramp_and_clamp() {
        let c = clip(0.0, 2.0, 0.5, 0.5);
        assert_eq!(c.weight_at(0.0), Some(0.0));
        assert_eq!(c.weight_at(0.25), Some(0.5));
        assert_eq!(c.weight_at(1.0), Some(1.0));
        assert_eq!(c.weight_at(1.75), Some(0.5));
        assert_eq!(c.weight_at(2.0), Some(0.0));
    }

    #[test]
    fn overlapping_windows_take_the_min() {
        // Windows longer than the clip: both sides stay partial everywhere.
        let c = clip(0.0, 1.0, 2.0, 2.0);
        assert_eq!(c.weight_at(0.5), Some(0.25));
    }

    #[test]
    fn degenerate_window_is_a_step() {
        let c = clip(1.0, 2.0, 0.0, -1.0);
        assert_eq!(c.weight_at(1.0), Some(1.0));
        assert_eq!(c.weight_at(2.0), Some(1.0));
    }

    #[test]
    fn ramp_samples_linearly() {
        let mixers = MixerRegistry::new();
        let c = ClipData {
            start: 0.0,
            end: 2.0,
            blend_in: 0.0,
            blend_out: 0.0,
            time_scale: 1.0,
            payload: ClipPayload::Ramp {
                from: Value::Float(0.0),
                to: Value::Float(10.0),
            },
        };
        assert_eq!(c.sample_at(1.0, &mixers), Some(Value::Float(5.0)));
        assert_eq!(c.sample_at(0.0, &mixers), Some(Value::Float(0.0)));
        assert_eq!(c.sample_at(2.0, &mixers), Some(Value::Float(10.0)));
    }
}
