//! Sequent Compose Core (engine-agnostic)
//!
//! A temporal multi-track property compositor: every step it evaluates the
//! time-windowed clips of all live timeline instances and produces one
//! composed value per (target, property) pair, blending concurrent
//! contributions through registered mixers. Clips may embed entire
//! sub-timelines whose timers are gated and scaled by the parent clip while
//! their tracks blend in the same per-step accumulation pass.

pub mod accumulate;
pub mod binding;
pub mod clip;
pub mod config;
pub mod data;
pub mod engine;
pub mod graph;
pub mod ids;
pub mod inputs;
pub mod outputs;
pub mod persist;
pub mod store;
pub mod timer;

// Re-exports for consumers (adapters)
pub use accumulate::{Accumulator, Contribution, MixData};
pub use binding::{IdentityResolver, TargetHandle, TargetResolver};
pub use config::Config;
pub use data::{ClipData, ClipPayload, TimelineData, TrackData};
pub use engine::Engine;
pub use graph::{ParentLink, TimerArena, TimerNode};
pub use ids::{InstanceId, TimelineId, TimerId};
pub use inputs::{DriveCommand, Inputs};
pub use outputs::{Change, CoreEvent, Outputs};
pub use persist::SavedState;
pub use store::PropertyStore;
pub use timer::{ActivationState, Edge, Timer};
pub use sequent_api_core::{ComposeError, Mixer, MixerRegistry, Value, ValueKind};
