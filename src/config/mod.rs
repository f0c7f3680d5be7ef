// src/config/mod.rs

//! Build configuration: the declarative description of what a build does.
//!
//! The schema is owned by the CI configuration, not by this crate; the model
//! here mirrors it for consumption and the loader only deserializes and
//! sanity-checks. See:
//!
//! - [`model`] for the descriptor types
//! - [`loader`] for reading the JSON configuration file
//! - [`validate`] for semantic checks run after deserialization

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    merge_gn_args, Build, BuildConfigFile, GeneratorTask, GnStage, NinjaStage, TestTask,
};
