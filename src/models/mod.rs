//! Domain models for model promotion.
//!
//! # Core Concepts
//!
//! - [`Stage`]: Lifecycle stage of a model, represented in the registry as an alias.
//!   Stages form a fixed chain none → staging → production → archived.
//! - [`ModelIdentifier`]: What the operator typed, `name/<version>` or `name@<alias>`.
//! - [`ModelVersion`]: The concrete version the registry resolved a selector to.
//! - [`Promotion`]: Record of a completed stage change.

mod identifier;
mod stage;
mod version;

pub use identifier::*;
pub use stage::*;
pub use version::*;
