//! livegen - Live Workflow Descriptor Generator
//!
//! Builds live workflow documents (jobs, volumes and images) from sparse
//! user requests merged over a fixed set of default templates, validates
//! requests before merging, and writes the result as YAML.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`template`]: Default trees and field descriptions (plain or annotated)
//! - [`workflow`]: Document model, validation, merge, expansion and output
//! - [`generation`]: The request pipeline, its configuration and errors
//! - [`build`]: Dockerfile rendering for job images
//!
//! # Example
//!
//! ```rust,no_run
//! use livegen::generation::Generator;
//! use livegen::template::AnnotationMode;
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut generator = Generator::default();
//!     generator.set_mode(AnnotationMode::Annotated);
//!     generator.set_default_output("live.yaml");
//!
//!     let request = json!({
//!         "title": "demo",
//!         "jobs": {"train": {"preset": "gpu-large", "http_port": "9090"}}
//!     });
//!     let report = generator.generate(&request)?;
//!     println!("{}", report.message);
//!     Ok(())
//! }
//! ```

pub mod build;
pub mod generation;
pub mod template;
pub mod workflow;

// Re-export commonly used types
pub use generation::{GenerateError, GenerationReport, Generator, GeneratorConfig};
pub use template::{AnnotationMode, TemplateEntry, TemplateRegistry};
pub use workflow::model::WorkflowDocument;
pub use workflow::request::load_request;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "livegen";
