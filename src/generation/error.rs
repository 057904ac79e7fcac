//! Error types for document generation.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a generation request.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The request failed validation; carries every violation found.
    #[error("Request rejected with {} validation error(s):\n{}", .0.len(), .0.join("\n"))]
    Invalid(Vec<String>),

    /// The request document could not be read or parsed.
    #[error("Invalid request: {0}")]
    Parse(String),

    /// The merged document could not be rendered.
    #[error("Failed to render workflow document: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// An output file could not be written.
    #[error("Failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    /// True for failures the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Invalid(_) | Self::Parse(_))
    }

    /// Validation messages, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}
