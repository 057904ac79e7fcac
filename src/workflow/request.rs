//! Generation Requests
//!
//! Handles loading the untyped request document and decoding it, once it
//! has passed validation, into a [`LiveRequest`] of sparse partial entries.
//!
//! The request format is the same whether it arrives as JSON or YAML:
//!
//! ```yaml
//! title: demo
//! defaults:
//!   life_span: 1d
//! volumes:
//!   data:
//!     remote: storage:/demo/data
//!     mount: /data
//!     local: data
//! jobs:
//!   train:
//!     preset: gpu-large
//!     http_port: "9090"
//!     volumes: [data]
//! output_file: live.yaml
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::{Map, Value};

use crate::build::BuildRecipe;
use crate::generation::GenerateError;
use crate::template::user_value;

/// Sparse field map as supplied by the user.
pub type Fields = Map<String, Value>;

/// A volume reference as written in a job's `volumes` list.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestedVolume {
    /// Name of a volume declared in the request
    Name(String),
    /// Volume fields given inline
    Inline(Fields),
}

/// Partial job entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobRequest {
    /// Supplied fields other than `volumes`
    pub fields: Fields,

    /// Volume references, in order
    pub volumes: Option<Vec<RequestedVolume>>,
}

/// Typed view of a validated request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveRequest {
    pub title: Option<String>,
    pub defaults: Fields,
    pub volumes: BTreeMap<String, Fields>,
    pub images: BTreeMap<String, Fields>,
    pub jobs: BTreeMap<String, JobRequest>,
    pub output_file: Option<PathBuf>,
    pub build: Option<BuildRecipe>,
}

impl LiveRequest {
    /// Decodes a request that has already passed validation.
    ///
    /// Sections of the wrong shape are ignored rather than reported; the
    /// validator is responsible for rejecting them beforehand.
    pub fn decode(raw: &Value) -> Self {
        let raw = &unwrap_user_values(raw);

        let title = raw
            .get("title")
            .and_then(Value::as_str)
            .map(|title| title.to_string());

        let defaults = raw
            .get("defaults")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let volumes = decode_entries(raw.get("volumes"));
        let images = decode_entries(raw.get("images"));

        let jobs: BTreeMap<String, JobRequest> = raw
            .get("jobs")
            .and_then(Value::as_object)
            .map(|jobs| {
                jobs.iter()
                    .filter_map(|(name, job)| {
                        job.as_object()
                            .map(|fields| (name.clone(), decode_job(fields)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let output_file = raw
            .get("output_file")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        let build = raw
            .get("build")
            .and_then(Value::as_object)
            .map(BuildRecipe::from_fields);

        debug!(
            "Decoded request: {} volumes, {} images, {} jobs",
            volumes.len(),
            images.len(),
            jobs.len()
        );

        Self {
            title,
            defaults,
            volumes,
            images,
            jobs,
            output_file,
            build,
        }
    }
}

/// Replaces every user-supplied `{value, description}` field with its value.
///
/// Covers `title`, the fields of `defaults`, of each volume, image and job,
/// and of inline job volumes.
pub fn unwrap_user_values(raw: &Value) -> Value {
    let Some(sections) = raw.as_object() else {
        return raw.clone();
    };
    let mut unwrapped = sections.clone();

    if let Some(title) = unwrapped.get_mut("title") {
        let value = user_value(title).clone();
        *title = value;
    }

    if let Some(Value::Object(defaults)) = unwrapped.get_mut("defaults") {
        unwrap_fields(defaults);
    }

    for section in ["volumes", "images", "jobs"] {
        if let Some(Value::Object(entries)) = unwrapped.get_mut(section) {
            for fields in entries.values_mut().filter_map(Value::as_object_mut) {
                unwrap_fields(fields);
            }
        }
    }

    if let Some(Value::Object(jobs)) = unwrapped.get_mut("jobs") {
        for job in jobs.values_mut() {
            if let Some(Value::Array(refs)) = job.get_mut("volumes") {
                for inline in refs.iter_mut().filter_map(Value::as_object_mut) {
                    unwrap_fields(inline);
                }
            }
        }
    }

    Value::Object(unwrapped)
}

fn unwrap_fields(fields: &mut Fields) {
    for value in fields.values_mut() {
        let unwrapped = user_value(value).clone();
        *value = unwrapped;
    }
}

/// Decodes a name → mapping section, skipping non-mapping entries.
fn decode_entries(section: Option<&Value>) -> BTreeMap<String, Fields> {
    section
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(name, entry)| {
                    entry.as_object().map(|fields| (name.clone(), fields.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Decodes one job, normalising `http_port` and `env` values to strings.
fn decode_job(raw: &Fields) -> JobRequest {
    let mut fields = Fields::new();

    for (key, value) in raw {
        match key.as_str() {
            "volumes" => continue,
            "http_port" => {
                fields.insert(key.clone(), Value::String(port_to_string(value)));
            }
            "env" => {
                let env = value
                    .as_object()
                    .map(|vars| {
                        vars.iter()
                            .map(|(name, v)| (name.clone(), Value::String(scalar_to_string(v))))
                            .collect::<Fields>()
                    })
                    .unwrap_or_default();
                fields.insert(key.clone(), Value::Object(env));
            }
            _ => {
                fields.insert(key.clone(), value.clone());
            }
        }
    }

    let volumes = raw.get("volumes").and_then(Value::as_array).map(|refs| {
        refs.iter()
            .filter_map(|reference| match reference {
                Value::String(name) => Some(RequestedVolume::Name(name.trim().to_string())),
                Value::Object(inline) => Some(RequestedVolume::Inline(inline.clone())),
                _ => None,
            })
            .collect()
    });

    JobRequest { fields, volumes }
}

/// Renders an `http_port`, writing integral floats without a fraction.
fn port_to_string(value: &Value) -> String {
    match value.as_f64() {
        Some(port) if value.is_f64() && port.fract() == 0.0 => format!("{:.0}", port),
        _ => scalar_to_string(value),
    }
}

/// Renders a scalar as the string a user would have typed.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Parses request text. JSON is accepted as a subset of YAML.
pub fn parse_request(content: &str) -> Result<Value, GenerateError> {
    let value: Value = serde_yaml::from_str(content)
        .map_err(|e| GenerateError::Parse(format!("{}. Check the request format.", e)))?;

    if !value.is_object() {
        return Err(GenerateError::Parse(
            "Request must be a mapping of sections (title, defaults, volumes, images, jobs)"
                .to_string(),
        ));
    }

    Ok(value)
}

/// Loads a request document from a JSON or YAML file.
///
/// # Example
///
/// ```rust,no_run
/// use livegen::workflow::load_request;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let request = load_request("request.yaml")?;
///     println!("Request has {} sections", request.as_object().map_or(0, |m| m.len()));
///     Ok(())
/// }
/// ```
pub fn load_request(path: impl AsRef<Path>) -> Result<Value, GenerateError> {
    let path = path.as_ref();
    info!("Loading request from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| {
        GenerateError::Parse(format!(
            "Failed to read request file '{}': {}. Check that the file exists and is readable.",
            path.display(),
            e
        ))
    })?;

    debug!("Request content loaded ({} bytes)", content.len());
    parse_request(&content)
}
