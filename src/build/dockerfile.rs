//! Dockerfile Rendering
//!
//! Turns the optional `build` section of a request into a Dockerfile for the
//! job image. This is plain string templating; the result is not parsed or
//! checked.
//!
//! # Example
//!
//! ```yaml
//! build:
//!   base_image: neuromation/base:python-3.10
//!   dependencies: [numpy, scipy]
//!   command: python train.py
//! ```
//!
//! renders as
//!
//! ```text
//! FROM neuromation/base:python-3.10
//! RUN pip install numpy scipy
//! CMD ["python train.py"]
//! ```

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generation::GenerateError;
use crate::workflow::request::Fields;

/// Base images a recipe may start from.
pub const BASE_IMAGES: &[&str] = &[
    "neuromation/base:latest",
    "neuromation/base:python-3.9",
    "neuromation/base:python-3.10",
];

/// Base image used when none (or an unknown one) is requested.
pub const DEFAULT_BASE_IMAGE: &str = "neuromation/base:python-3.9";

/// Packages installed when the request names none.
pub const DEFAULT_DEPENDENCIES: &[&str] = &["numpy", "pandas"];

/// Command run by the image when the request names none.
pub const DEFAULT_COMMAND: &str = "python app.py";

/// Build recipe for the job image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BuildRecipe {
    pub base_image: String,
    pub dependencies: Vec<String>,
    pub command: String,
}

impl Default for BuildRecipe {
    fn default() -> Self {
        Self {
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            dependencies: DEFAULT_DEPENDENCIES.iter().map(|d| d.to_string()).collect(),
            command: DEFAULT_COMMAND.to_string(),
        }
    }
}

impl BuildRecipe {
    /// Builds a recipe from a validated `build` section.
    ///
    /// Unknown base images fall back to [`DEFAULT_BASE_IMAGE`]. Dependencies
    /// may be a list or a comma-separated string; blanks are dropped.
    pub fn from_fields(fields: &Fields) -> Self {
        let mut recipe = Self::default();

        if let Some(base_image) = fields.get("base_image").and_then(Value::as_str) {
            let base_image = base_image.trim();
            if BASE_IMAGES.contains(&base_image) {
                recipe.base_image = base_image.to_string();
            } else {
                warn!(
                    "Unknown base image '{}'. Defaulting to {}.",
                    base_image, DEFAULT_BASE_IMAGE
                );
            }
        }

        match fields.get("dependencies") {
            Some(Value::String(list)) => recipe.dependencies = split_dependencies(list),
            Some(Value::Array(items)) => {
                recipe.dependencies = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|dep| !dep.is_empty())
                    .map(|dep| dep.to_string())
                    .collect();
            }
            _ => {}
        }

        if let Some(command) = fields.get("command").and_then(Value::as_str) {
            let command = command.trim();
            if !command.is_empty() {
                recipe.command = command.to_string();
            }
        }

        recipe
    }

    /// Renders the Dockerfile text.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("FROM {}", self.base_image)];
        if !self.dependencies.is_empty() {
            lines.push(format!("RUN pip install {}", self.dependencies.join(" ")));
        }
        lines.push(format!("CMD [\"{}\"]", self.command));

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }
}

/// Splits a comma-separated dependency list.
fn split_dependencies(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|dep| !dep.is_empty())
        .map(|dep| dep.to_string())
        .collect()
}

/// Writes the rendered recipe to `path`, overwriting any existing file.
pub fn write_dockerfile(recipe: &BuildRecipe, path: &Path) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| GenerateError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, recipe.render()).map_err(|source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Dockerfile saved to: {}", path.display());
    Ok(())
}
