//! Mixing strategies for Value types.
//! A Mixer is a pure, stateless strategy for one value kind:
//! - `lerp(a, b, s)` with exact endpoints (`s=0` yields a, `s=1` yields b)
//! - `add(a, b)` associative, with the kind's zero value as neutral element
//!
//! Kinds are dispatched through an explicit registry populated at setup time;
//! a kind without a registered mixer is a configuration error surfaced before
//! any step runs.

use hashbrown::HashMap;

use crate::error::ComposeError;
use crate::value::{Value, ValueKind};

/// Linear interpolation for f32.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lerp for fixed-size arrays.
#[inline]
pub fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N], t: f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = lerp_f32(a[i], b[i], t);
    }
    out
}

#[inline]
fn add_array<const N: usize>(a: &[f32; N], b: &[f32; N]) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = a[i] + b[i];
    }
    out
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
    } else {
        q = [0.0, 0.0, 0.0, 1.0];
    }
    q
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion to ensure the shortest path.
/// Returns a normalized quaternion (x,y,z,w).
#[inline]
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    let d = dot4(a, b);
    if d < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize4([
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ])
}

/// Pure per-kind combine strategy. Implementations must not hold state.
///
/// `lerp` falls back to `a` on operand kind mismatch; the accumulator never
/// mixes kinds, so the fallback only shields against malformed payload data.
pub trait Mixer: Send + Sync {
    fn lerp(&self, a: &Value, b: &Value, s: f32) -> Value;
    fn add(&self, a: &Value, b: &Value) -> Value;
}

/// Scalar floats: plain linear interpolation and addition.
pub struct ScalarMixer;

impl Mixer for ScalarMixer {
    fn lerp(&self, a: &Value, b: &Value, s: f32) -> Value {
        if s <= 0.0 {
            return a.clone();
        }
        if s >= 1.0 {
            return b.clone();
        }
        match (a, b) {
            (Value::Float(x), Value::Float(y)) => Value::Float(lerp_f32(*x, *y, s)),
            _ => a.clone(),
        }
    }

    fn add(&self, a: &Value, b: &Value) -> Value {
        match (a, b) {
            (Value::Float(x), Value::Float(y)) => Value::Float(x + y),
            _ => a.clone(),
        }
    }
}

/// Componentwise mixing for Vec2/Vec3/Vec4/ColorRgba.
pub struct VectorMixer;

impl Mixer for VectorMixer {
    fn lerp(&self, a: &Value, b: &Value, s: f32) -> Value {
        if s <= 0.0 {
            return a.clone();
        }
        if s >= 1.0 {
            return b.clone();
        }
        match (a, b) {
            (Value::Vec2(x), Value::Vec2(y)) => Value::Vec2(lerp_array(x, y, s)),
            (Value::Vec3(x), Value::Vec3(y)) => Value::Vec3(lerp_array(x, y, s)),
            (Value::Vec4(x), Value::Vec4(y)) => Value::Vec4(lerp_array(x, y, s)),
            (Value::ColorRgba(x), Value::ColorRgba(y)) => Value::ColorRgba(lerp_array(x, y, s)),
            _ => a.clone(),
        }
    }

    fn add(&self, a: &Value, b: &Value) -> Value {
        match (a, b) {
            (Value::Vec2(x), Value::Vec2(y)) => Value::Vec2(add_array(x, y)),
            (Value::Vec3(x), Value::Vec3(y)) => Value::Vec3(add_array(x, y)),
            (Value::Vec4(x), Value::Vec4(y)) => Value::Vec4(add_array(x, y)),
            (Value::ColorRgba(x), Value::ColorRgba(y)) => Value::ColorRgba(add_array(x, y)),
            _ => a.clone(),
        }
    }
}

/// Quaternions: shortest-arc NLERP; `add` sums components with hemisphere
/// correction (callers normalize through a final lerp or accept the raw sum).
pub struct QuatMixer;

impl Mixer for QuatMixer {
    fn lerp(&self, a: &Value, b: &Value, s: f32) -> Value {
        if s <= 0.0 {
            return a.clone();
        }
        if s >= 1.0 {
            return b.clone();
        }
        match (a, b) {
            (Value::Quat(x), Value::Quat(y)) => Value::Quat(nlerp_quat(*x, *y, s)),
            _ => a.clone(),
        }
    }

    fn add(&self, a: &Value, b: &Value) -> Value {
        match (a, b) {
            (Value::Quat(x), Value::Quat(y)) => {
                let mut y = *y;
                if dot4(*x, y) < 0.0 {
                    y = [-y[0], -y[1], -y[2], -y[3]];
                }
                Value::Quat([x[0] + y[0], x[1] + y[1], x[2] + y[2], x[3] + y[3]])
            }
            _ => a.clone(),
        }
    }
}

/// Transforms: pos/scale componentwise, rot via shortest-arc NLERP.
pub struct TransformMixer;

impl Mixer for TransformMixer {
    fn lerp(&self, a: &Value, b: &Value, s: f32) -> Value {
        if s <= 0.0 {
            return a.clone();
        }
        if s >= 1.0 {
            return b.clone();
        }
        match (a, b) {
            (
                Value::Transform {
                    pos: ap,
                    rot: ar,
                    scale: asc,
                },
                Value::Transform {
                    pos: bp,
                    rot: br,
                    scale: bsc,
                },
            ) => Value::Transform {
                pos: lerp_array(ap, bp, s),
                rot: nlerp_quat(*ar, *br, s),
                scale: lerp_array(asc, bsc, s),
            },
            _ => a.clone(),
        }
    }

    fn add(&self, a: &Value, b: &Value) -> Value {
        match (a, b) {
            (
                Value::Transform {
                    pos: ap,
                    rot: ar,
                    scale: asc,
                },
                Value::Transform {
                    pos: bp,
                    rot: br,
                    scale: bsc,
                },
            ) => {
                let mut br2 = *br;
                if dot4(*ar, br2) < 0.0 {
                    br2 = [-br2[0], -br2[1], -br2[2], -br2[3]];
                }
                Value::Transform {
                    pos: add_array(ap, bp),
                    rot: [
                        ar[0] + br2[0],
                        ar[1] + br2[1],
                        ar[2] + br2[2],
                        ar[3] + br2[3],
                    ],
                    scale: add_array(asc, bsc),
                }
            }
            _ => a.clone(),
        }
    }
}

/// Step-only kinds (Bool/Text): no interpolation, pick a side at s >= 0.5.
pub struct StepMixer;

impl Mixer for StepMixer {
    fn lerp(&self, a: &Value, b: &Value, s: f32) -> Value {
        if s < 0.5 {
            a.clone()
        } else {
            b.clone()
        }
    }

    fn add(&self, _a: &Value, b: &Value) -> Value {
        b.clone()
    }
}

/// Explicit registry of Mixer implementations keyed by value kind.
/// Built-ins are installed by `new()`; hosts may register additional kinds
/// (or override a built-in) before timelines are instantiated.
pub struct MixerRegistry {
    mixers: HashMap<ValueKind, Box<dyn Mixer>>,
}

impl Default for MixerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MixerRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            mixers: HashMap::new(),
        };
        reg.register(ValueKind::Float, Box::new(ScalarMixer));
        reg.register(ValueKind::Vec2, Box::new(VectorMixer));
        reg.register(ValueKind::Vec3, Box::new(VectorMixer));
        reg.register(ValueKind::Vec4, Box::new(VectorMixer));
        reg.register(ValueKind::ColorRgba, Box::new(VectorMixer));
        reg.register(ValueKind::Quat, Box::new(QuatMixer));
        reg.register(ValueKind::Transform, Box::new(TransformMixer));
        reg.register(ValueKind::Bool, Box::new(StepMixer));
        reg.register(ValueKind::Text, Box::new(StepMixer));
        reg
    }

    /// Install (or replace) the mixer for a kind.
    pub fn register(&mut self, kind: ValueKind, mixer: Box<dyn Mixer>) {
        self.mixers.insert(kind, mixer);
    }

    pub fn get(&self, kind: ValueKind) -> Option<&dyn Mixer> {
        self.mixers.get(&kind).map(|m| m.as_ref())
    }

    /// Lookup that escalates a missing mixer as the setup-time error.
    pub fn require(&self, kind: ValueKind) -> Result<&dyn Mixer, ComposeError> {
        self.get(kind).ok_or(ComposeError::MissingMixer { kind })
    }
}

impl std::fmt::Debug for MixerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixerRegistry")
            .field("kinds", &self.mixers.keys().collect::<Vec<_>>())
            .finish()
    }
}
