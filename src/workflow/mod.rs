//! Workflow Document Module
//!
//! Provides data structures and the merge pipeline for live workflow
//! documents.
//!
//! # Structure
//!
//! - [`model`]: Document structures (WorkflowDocument, JobSpec, VolumeSpec, ImageSpec)
//! - [`request`]: Request loading and decoding
//! - [`validator`]: Validation rules for raw requests
//! - [`merge`]: Template overlay of requests on registry defaults
//! - [`expander`]: Job volume reference expansion
//! - [`serializer`]: YAML rendering and saving

pub mod expander;
pub mod merge;
pub mod model;
pub mod request;
pub mod serializer;
pub mod validator;

pub use expander::{expand_job_volumes, expand_references, reference_token};
pub use merge::merge_request;
pub use model::{ImageSpec, JobSpec, VolumeRef, VolumeSpec, WorkflowDocument};
pub use request::{load_request, parse_request, LiveRequest};
pub use serializer::{render_yaml, save_document};
pub use validator::{quick_validate, validate_request, ValidationError, ValidationRules};
