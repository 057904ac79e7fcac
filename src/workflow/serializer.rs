//! Document Serialization
//!
//! Renders a merged [`WorkflowDocument`] to YAML and writes it to disk.
//! Existing files are overwritten; a failed write may leave a truncated file.

use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};

use super::model::WorkflowDocument;
use crate::generation::GenerateError;
use crate::{APP_NAME, VERSION};

/// Renders the document body as block-style YAML.
pub fn render_yaml(document: &WorkflowDocument) -> Result<String, GenerateError> {
    Ok(serde_yaml::to_string(document)?)
}

/// Header comment written above the document.
fn header() -> String {
    format!(
        "# Generated by {} v{} at {}\n",
        APP_NAME,
        VERSION,
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Saves a workflow document to a YAML file.
///
/// The document is rendered before the file is touched, so a serialization
/// failure leaves any existing file intact. Missing parent directories are
/// created.
///
/// # Arguments
///
/// * `document` - The merged document to save
/// * `path` - Output file path
pub fn save_document(document: &WorkflowDocument, path: &Path) -> Result<(), GenerateError> {
    let body = render_yaml(document)?;
    let content = format!("{}{}", header(), body);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| GenerateError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, content).map_err(|source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote {} bytes of YAML", body.len());
    info!("Workflow document saved to: {}", path.display());
    Ok(())
}
