//! Generator Configuration

use std::path::PathBuf;

use log::info;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::template::AnnotationMode;
use crate::workflow::validator::ValidationRules;

/// Output file used when neither the request nor the environment names one.
pub const DEFAULT_OUTPUT_NAME: &str = "live.yaml";

/// Environment variable overriding [`DEFAULT_OUTPUT_NAME`].
pub const OUTPUT_ENV_VAR: &str = "LIVEGEN_OUTPUT";

/// Lazily-resolved default output path.
pub static DEFAULT_OUTPUT_FILE: Lazy<PathBuf> = Lazy::new(|| {
    match std::env::var(OUTPUT_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => {
            info!("Using {} output path: {}", OUTPUT_ENV_VAR, path);
            PathBuf::from(path.trim())
        }
        _ => PathBuf::from(DEFAULT_OUTPUT_NAME),
    }
});

/// Settings for a [`Generator`](super::Generator).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Leaf representation of generated documents
    pub mode: AnnotationMode,

    /// Where the document goes when the request has no `output_file`
    pub default_output: PathBuf,

    /// Reject unknown job volume references instead of falling back
    pub strict_references: bool,

    /// Reject requests without a `title`
    pub require_title: bool,

    /// Also write a Dockerfile here when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mode: AnnotationMode::Plain,
            default_output: (*DEFAULT_OUTPUT_FILE).clone(),
            strict_references: false,
            require_title: false,
            dockerfile: None,
        }
    }
}

impl GeneratorConfig {
    /// Validation rules implied by this configuration.
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            require_title: self.require_title,
            strict_references: self.strict_references,
        }
    }
}
