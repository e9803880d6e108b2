//! sequent-api-core: value model and mixing strategies (engine-agnostic)

pub mod error;
pub mod mix;
pub mod value;

pub use error::ComposeError;
pub use mix::{Mixer, MixerRegistry};
pub use value::{Value, ValueKind};
