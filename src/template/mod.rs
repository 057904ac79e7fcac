//! Template Module
//!
//! Default trees and field descriptions that user input is merged over.
//!
//! # Structure
//!
//! - [`entry`]: Template leaves (bare or annotated)
//! - [`registry`]: Process-wide default trees per annotation mode

pub mod entry;
pub mod registry;

pub use entry::{user_value, AnnotationMode, TemplateEntry};
pub use registry::{describe, wrap_field, EntityKind, TemplateRegistry, UNDOCUMENTED_FIELD};
