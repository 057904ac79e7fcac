//! Generation Engine
//!
//! Runs one request through the whole pipeline:
//! - Validation (all errors collected, nothing written on failure)
//! - Merge over a fresh copy of the registry defaults
//! - Volume reference expansion
//! - Serialization to the resolved output path
//! - Optional Dockerfile rendering

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use super::config::GeneratorConfig;
use super::error::GenerateError;
use super::overview::DefaultsOverview;
use crate::build::write_dockerfile;
use crate::template::{AnnotationMode, TemplateRegistry};
use crate::workflow::expander::expand_references;
use crate::workflow::merge::merge_request;
use crate::workflow::model::WorkflowDocument;
use crate::workflow::request::LiveRequest;
use crate::workflow::serializer::save_document;
use crate::workflow::validator::validate_request;

/// File name of the Dockerfile written next to the document.
const DOCKERFILE_NAME: &str = "Dockerfile";

/// Result of a successful generation.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Confirmation for the caller
    pub message: String,

    /// Where the document was written
    pub output_file: PathBuf,

    /// Where the Dockerfile was written, if one was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<PathBuf>,
}

/// Live workflow generator.
///
/// # Example
///
/// ```rust,no_run
/// use livegen::generation::Generator;
/// use livegen::workflow::load_request;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let request = load_request("request.yaml")?;
///
///     let mut generator = Generator::default();
///     generator.set_strict_references(true);
///
///     let report = generator.generate(&request)?;
///     println!("{}", report.message);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    /// Creates a generator with the given configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn set_mode(&mut self, mode: AnnotationMode) {
        self.config.mode = mode;
    }

    pub fn set_default_output(&mut self, path: impl Into<PathBuf>) {
        self.config.default_output = path.into();
    }

    pub fn set_strict_references(&mut self, strict: bool) {
        self.config.strict_references = strict;
    }

    pub fn set_require_title(&mut self, required: bool) {
        self.config.require_title = required;
    }

    pub fn set_dockerfile(&mut self, path: impl Into<PathBuf>) {
        self.config.dockerfile = Some(path.into());
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Registry matching the configured annotation mode.
    pub fn registry(&self) -> &'static TemplateRegistry {
        TemplateRegistry::global(self.config.mode)
    }

    /// Validates a raw request, returning every error message.
    pub fn validate(&self, raw: &Value) -> Vec<String> {
        validate_request(raw, &self.config.validation_rules())
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    /// Validates, merges and expands a request without writing anything.
    pub fn render(&self, raw: &Value) -> Result<WorkflowDocument, GenerateError> {
        self.prepare(raw).map(|(_, document)| document)
    }

    /// Generates the document for a request and writes it to disk.
    ///
    /// The output path is the request's `output_file` if present, otherwise
    /// the configured default. Existing files are overwritten.
    pub fn generate(&self, raw: &Value) -> Result<GenerationReport, GenerateError> {
        let (request, document) = self.prepare(raw)?;

        let output_file = self.output_path(&request);

        // Dockerfile first: a failed write must leave no document on disk
        let dockerfile = match self.dockerfile_path(&request, &output_file) {
            Some(path) => {
                let recipe = request.build.clone().unwrap_or_default();
                write_dockerfile(&recipe, &path)?;
                Some(path)
            }
            None => None,
        };

        save_document(&document, &output_file)?;

        Ok(GenerationReport {
            message: format!("'{}' has been generated successfully.", output_file.display()),
            output_file,
            dockerfile,
        })
    }

    /// Read-only defaults and descriptions for form pre-population.
    pub fn defaults_overview(&self) -> DefaultsOverview {
        DefaultsOverview::collect()
    }

    /// Runs validation, decoding, merge and expansion.
    fn prepare(&self, raw: &Value) -> Result<(LiveRequest, WorkflowDocument), GenerateError> {
        let errors = self.validate(raw);
        if !errors.is_empty() {
            for error in &errors {
                debug!("Validation error: {}", error);
            }
            return Err(GenerateError::Invalid(errors));
        }

        let request = LiveRequest::decode(raw);
        let registry = self.registry();

        let mut document = merge_request(registry, &request);
        expand_references(&mut document, registry);

        info!(
            "Prepared '{}' with {} job(s)",
            document.title.as_str().unwrap_or_default(),
            document.len()
        );

        Ok((request, document))
    }

    /// Resolves where the document is written.
    pub fn output_path(&self, request: &LiveRequest) -> PathBuf {
        request
            .output_file
            .clone()
            .unwrap_or_else(|| self.config.default_output.clone())
    }

    /// Resolves where the Dockerfile is written, if anywhere.
    ///
    /// An explicit configuration wins; otherwise a request with a `build`
    /// section gets a Dockerfile next to the document.
    fn dockerfile_path(&self, request: &LiveRequest, output_file: &Path) -> Option<PathBuf> {
        if let Some(path) = &self.config.dockerfile {
            return Some(path.clone());
        }

        request.build.as_ref()?;
        let path = output_file
            .parent()
            .map(|dir| dir.join(DOCKERFILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DOCKERFILE_NAME));

        if path.exists() {
            warn!("Overwriting existing {}", path.display());
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn generator_in(dir: &Path) -> Generator {
        let mut generator = Generator::default();
        generator.set_default_output(dir.join("live.yaml"));
        generator
    }

    #[test]
    fn test_generate_writes_default_path() {
        let temp_dir = tempdir().unwrap();
        let generator = generator_in(temp_dir.path());

        let raw = json!({"title": "demo", "jobs": {"train": {"preset": "gpu-large"}}});
        let report = generator.generate(&raw).unwrap();

        assert_eq!(report.output_file, temp_dir.path().join("live.yaml"));
        assert!(report.output_file.exists());
        assert!(report.message.contains("generated successfully"));
        assert!(report.dockerfile.is_none());
    }

    #[test]
    fn test_generate_uses_request_output_file() {
        let temp_dir = tempdir().unwrap();
        let generator = generator_in(temp_dir.path());
        let target = temp_dir.path().join("custom.yml");

        let raw = json!({
            "title": "demo",
            "jobs": {"train": {"preset": "gpu-large"}},
            "output_file": target.to_str().unwrap()
        });
        let report = generator.generate(&raw).unwrap();

        assert_eq!(report.output_file, target);
        assert!(target.exists());
        assert!(!temp_dir.path().join("live.yaml").exists());
    }

    #[test]
    fn test_invalid_request_writes_nothing() {
        let temp_dir = tempdir().unwrap();
        let generator = generator_in(temp_dir.path());

        let raw = json!({"jobs": {"train": {}}});
        let err = generator.generate(&raw).unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(err.validation_errors().unwrap().len(), 1);
        assert!(!temp_dir.path().join("live.yaml").exists());
    }

    #[test]
    fn test_demo_request_end_to_end() {
        let temp_dir = tempdir().unwrap();
        let generator = generator_in(temp_dir.path());

        let raw = json!({
            "title": "demo",
            "jobs": {"train": {"preset": "gpu-large", "http_port": "9090"}}
        });
        let report = generator.generate(&raw).unwrap();

        let content = std::fs::read_to_string(&report.output_file).unwrap();
        let written: WorkflowDocument = serde_yaml::from_str(&content).unwrap();
        let registry = generator.registry();

        assert_eq!(written.title.as_str(), Some("demo"));
        let train = written.job("train").unwrap();
        assert_eq!(train.preset.as_str(), Some("gpu-large"));
        assert_eq!(train.http_port.as_str(), Some("9090"));
        assert_eq!(train.name, registry.job().name);
        assert!(written.volumes.is_empty());
        assert!(written.images.is_empty());
    }

    #[test]
    fn test_missing_preset_reports_single_error() {
        let generator = Generator::default();
        let err = generator.render(&json!({"jobs": {"train": {}}})).unwrap_err();

        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'train'") && errors[0].contains("'preset'"));
    }

    #[test]
    fn test_requests_do_not_leak_into_each_other() {
        let generator = Generator::default();
        let first = json!({
            "title": "first",
            "volumes": {"data": {"remote": "r", "mount": "m", "local": "l"}},
            "jobs": {"train": {"preset": "gpu-large", "volumes": ["data"]}}
        });
        let second = json!({"jobs": {"serve": {"preset": "cpu-small"}}});

        generator.render(&first).unwrap();
        let document = generator.render(&second).unwrap();

        assert_eq!(document.title, generator.registry().workflow().title);
        assert!(document.volumes.is_empty());
        assert_eq!(document.len(), 1);
        assert!(document.job("train").is_none());
    }

    #[test]
    fn test_render_does_not_write() {
        let temp_dir = tempdir().unwrap();
        let generator = generator_in(temp_dir.path());

        let raw = json!({"title": "demo", "jobs": {"train": {"preset": "gpu-large"}}});
        let document = generator.render(&raw).unwrap();

        assert_eq!(document.title.as_str(), Some("demo"));
        assert!(!temp_dir.path().join("live.yaml").exists());
    }

    #[test]
    fn test_strict_references() {
        let mut generator = Generator::default();
        let raw = json!({
            "title": "demo",
            "jobs": {"train": {"preset": "gpu-large", "volumes": ["ghost"]}}
        });
        assert!(generator.render(&raw).is_ok());

        generator.set_strict_references(true);
        let errors = generator.validate(&raw);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'ghost'"));
    }

    #[test]
    fn test_require_title() {
        let mut generator = Generator::default();
        let raw = json!({"jobs": {"train": {"preset": "gpu-large"}}});
        assert!(generator.validate(&raw).is_empty());

        generator.set_require_title(true);
        assert_eq!(generator.validate(&raw).len(), 1);
    }

    #[test]
    fn test_annotated_mode() {
        let mut generator = Generator::default();
        generator.set_mode(AnnotationMode::Annotated);
        assert_eq!(generator.registry().mode(), AnnotationMode::Annotated);

        let raw = json!({"title": "demo", "jobs": {"train": {"preset": "gpu-large"}}});
        let document = generator.render(&raw).unwrap();

        assert!(document.title.is_annotated());
        assert!(document.job("train").unwrap().preset.is_annotated());
    }

    /// Panics on any scalar that is not inside a `{value, description}` leaf.
    fn assert_no_bare_leaves(node: &Value, path: &str) {
        match node {
            Value::Object(fields)
                if fields.len() == 2
                    && fields.contains_key("value")
                    && fields.contains_key("description") => {}
            Value::Object(fields) => {
                for (key, child) in fields {
                    assert_no_bare_leaves(child, &format!("{}.{}", path, key));
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    assert_no_bare_leaves(item, &format!("{}[{}]", path, index));
                }
            }
            other => panic!("bare leaf at {}: {}", path, other),
        }
    }

    #[test]
    fn test_annotated_render_has_no_bare_leaves() {
        let mut generator = Generator::default();
        generator.set_mode(AnnotationMode::Annotated);

        let raw = json!({
            "title": "demo",
            "defaults": {"life_span": "1d", "preemptible": true},
            "volumes": {"data": {"remote": "storage:/demo", "mount": "/data", "local": "data"}},
            "images": {"train": {"ref": "image:demo:v1"}},
            "jobs": {
                "train": {
                    "preset": "gpu-large",
                    "env": {"EPOCHS": 3},
                    "volumes": ["data", "ghost", {"mount": "/cache"}],
                    "detach": false
                },
                "serve": {"preset": "cpu-small"}
            }
        });
        let document = generator.render(&raw).unwrap();

        assert_no_bare_leaves(&serde_json::to_value(&document).unwrap(), "document");
    }

    #[test]
    fn test_annotated_input_keeps_registry_descriptions() {
        let mut generator = Generator::default();
        generator.set_mode(AnnotationMode::Annotated);

        let raw = json!({
            "title": "demo",
            "volumes": {"data": {
                "remote": {"value": "storage:/x", "description": "USER TEXT"},
                "mount": "/data",
                "local": "data"
            }},
            "jobs": {"train": {"preset": "gpu-large", "volumes": ["data"]}}
        });
        let document = generator.render(&raw).unwrap();
        let registry = generator.registry();

        let remote = &document.volume("data").unwrap().remote;
        assert_eq!(remote.value(), &json!("storage:/x"));
        assert_eq!(remote.description(), registry.volume().remote.description());

        let yaml = crate::workflow::serializer::render_yaml(&document).unwrap();
        assert!(!yaml.contains("USER TEXT"));
    }

    #[test]
    fn test_build_section_writes_dockerfile_next_to_output() {
        let temp_dir = tempdir().unwrap();
        let generator = generator_in(temp_dir.path());

        let raw = json!({
            "title": "demo",
            "jobs": {"train": {"preset": "gpu-large"}},
            "build": {"dependencies": ["torch"], "command": "python train.py"}
        });
        let report = generator.generate(&raw).unwrap();

        let dockerfile = report.dockerfile.unwrap();
        assert_eq!(dockerfile, temp_dir.path().join("Dockerfile"));
        let content = std::fs::read_to_string(dockerfile).unwrap();
        assert!(content.contains("RUN pip install torch"));
        assert!(content.contains("CMD [\"python train.py\"]"));
    }

    #[test]
    fn test_configured_dockerfile_uses_default_recipe() {
        let temp_dir = tempdir().unwrap();
        let mut generator = generator_in(temp_dir.path());
        let target = temp_dir.path().join("Dockerfile.train");
        generator.set_dockerfile(&target);

        let raw = json!({"title": "demo", "jobs": {"train": {"preset": "gpu-large"}}});
        let report = generator.generate(&raw).unwrap();

        assert_eq!(report.dockerfile.as_deref(), Some(target.as_path()));
        let content = std::fs::read_to_string(target).unwrap();
        assert!(content.contains("RUN pip install numpy pandas"));
    }

    #[test]
    fn test_failed_dockerfile_leaves_no_document() {
        let temp_dir = tempdir().unwrap();
        let mut generator = generator_in(temp_dir.path());

        // A directory in the Dockerfile's place makes the write fail
        let target = temp_dir.path().join("Dockerfile");
        std::fs::create_dir(&target).unwrap();
        generator.set_dockerfile(&target);

        let raw = json!({"title": "demo", "jobs": {"train": {"preset": "gpu-large"}}});
        let err = generator.generate(&raw).unwrap_err();

        assert!(matches!(err, GenerateError::Write { .. }));
        assert!(!temp_dir.path().join("live.yaml").exists());
    }

    #[test]
    fn test_report_serializes() {
        let report = GenerationReport {
            message: "'live.yaml' has been generated successfully.".to_string(),
            output_file: PathBuf::from("live.yaml"),
            dockerfile: None,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["output_file"], json!("live.yaml"));
        assert!(value.get("dockerfile").is_none());
    }
}
