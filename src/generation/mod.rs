//! Generation Module
//!
//! Ties validation, merging, expansion and serialization together for one
//! request at a time.
//!
//! # Architecture
//!
//! - [`engine`]: The [`Generator`] pipeline
//! - [`config`]: Generator settings and the default output path
//! - [`error`]: Error categories surfaced to callers
//! - [`overview`]: Read-only defaults discovery

pub mod config;
pub mod engine;
pub mod error;
pub mod overview;

pub use config::{GeneratorConfig, DEFAULT_OUTPUT_FILE};
pub use engine::{GenerationReport, Generator};
pub use error::GenerateError;
pub use overview::DefaultsOverview;
