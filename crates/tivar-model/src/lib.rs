//! Calculator model registry.
//!
//! An immutable table of calculator identities: each [`Model`] carries its
//! file magic, product ID, feature flags, UI language, and a ranking order
//! used for compatibility computations. The table is fixed at compile time
//! and shared by reference; nothing here is ever mutated.

mod features;
mod model;
mod os;

pub use features::Features;
pub use model::{MODELS, Model, by_name, lookup_magic, supports_magic};
pub use os::OsVersion;
