//! Request Validation
//!
//! Checks a raw request before anything is merged:
//! - Top-level section shapes
//! - Job presets, ports, environment and volume references
//! - Required volume fields
//!
//! Every rule runs; all violations are collected and returned together.

use log::{debug, info};
use serde_json::Value;

use crate::template::{describe, EntityKind};
use crate::workflow::model::VolumeSpec;
use crate::workflow::request::unwrap_user_values;

/// Lowest accepted `http_port`.
pub const MIN_PORT: i64 = 1;

/// Highest accepted `http_port`.
pub const MAX_PORT: i64 = 65535;

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingTitle,
    InvalidDefaults,
    MissingJobs,
    InvalidJob(String),
    MissingPreset(String),
    InvalidPreset(String),
    PortNotInteger { job: String, value: String },
    PortOutOfRange { job: String, port: String },
    InvalidEnv(String),
    InvalidJobVolumes(String),
    UnknownVolumeRef { job: String, volume: String },
    InvalidVolumes,
    InvalidVolume(String),
    MissingVolumeField { volume: String, field: &'static str },
    InvalidImages,
    InvalidImage(String),
    InvalidOutputFile,
    InvalidBuild(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(
                f,
                "The 'title' field is required and specifies the title of your workflow."
            ),
            Self::InvalidDefaults => write!(f, "'defaults' must be a dictionary."),
            Self::MissingJobs => {
                write!(f, "At least one 'job' is required and must be a dictionary.")
            }
            Self::InvalidJob(job) => write!(f, "Job '{}' must be a dictionary.", job),
            Self::MissingPreset(job) => write!(f, "Job '{}' is missing the 'preset' field.", job),
            Self::InvalidPreset(job) => write!(
                f,
                "Job '{}' has an invalid 'preset': must be a non-empty string.",
                job
            ),
            Self::PortNotInteger { job, value } => write!(
                f,
                "Job '{}' has an invalid 'http_port': {}. Must be an integer.",
                job, value
            ),
            Self::PortOutOfRange { job, port } => write!(
                f,
                "Job '{}' has an invalid 'http_port': {}. Must be between {} and {}.",
                job, port, MIN_PORT, MAX_PORT
            ),
            Self::InvalidEnv(job) => write!(
                f,
                "Job '{}' has an invalid 'env': must be a dictionary of names to values.",
                job
            ),
            Self::InvalidJobVolumes(job) => write!(
                f,
                "Job '{}' has an invalid 'volumes': must be a list of volume names or volume dictionaries.",
                job
            ),
            Self::UnknownVolumeRef { job, volume } => {
                write!(f, "Job '{}' references unknown volume '{}'.", job, volume)
            }
            Self::InvalidVolumes => write!(f, "'volumes' must be a dictionary."),
            Self::InvalidVolume(volume) => write!(f, "Volume '{}' must be a dictionary.", volume),
            Self::MissingVolumeField { volume, field } => {
                let description = describe(EntityKind::Volume, field).unwrap_or_default();
                write!(
                    f,
                    "Volume '{}' is missing the '{}' field: {}",
                    volume,
                    field,
                    description.to_lowercase()
                )
            }
            Self::InvalidImages => write!(f, "'images' must be a dictionary."),
            Self::InvalidImage(image) => write!(f, "Image '{}' must be a dictionary.", image),
            Self::InvalidOutputFile => write!(f, "'output_file' must be a non-empty string."),
            Self::InvalidBuild(reason) => write!(f, "Invalid 'build' section: {}", reason),
        }
    }
}

/// Optional rules on top of the always-on checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationRules {
    /// Reject requests that omit `title` instead of applying the default
    pub require_title: bool,

    /// Reject job volume references to volumes the request does not declare
    pub strict_references: bool,
}

/// Validates a raw request.
///
/// Returns every violation found, in section order. An empty list means the
/// request can be merged.
pub fn validate_request(raw: &Value, rules: &ValidationRules) -> Vec<ValidationError> {
    let raw = &unwrap_user_values(raw);
    let mut errors = Vec::new();

    match raw.get("title") {
        None if rules.require_title => errors.push(ValidationError::MissingTitle),
        None => debug!("No title supplied; the registry default applies"),
        Some(Value::String(title)) if !title.trim().is_empty() => {}
        Some(_) => errors.push(ValidationError::MissingTitle),
    }

    if let Some(defaults) = raw.get("defaults") {
        if !defaults.is_object() {
            errors.push(ValidationError::InvalidDefaults);
        }
    }

    let declared_volumes: Vec<&str> = raw
        .get("volumes")
        .and_then(Value::as_object)
        .map(|volumes| volumes.keys().map(String::as_str).collect())
        .unwrap_or_default();

    match raw.get("jobs").and_then(Value::as_object) {
        Some(jobs) if !jobs.is_empty() => {
            for (name, job) in jobs {
                errors.extend(validate_job(name, job, rules, &declared_volumes));
            }
        }
        _ => errors.push(ValidationError::MissingJobs),
    }

    if let Some(volumes) = raw.get("volumes") {
        match volumes.as_object() {
            Some(volumes) => {
                for (name, volume) in volumes {
                    errors.extend(validate_volume(name, volume));
                }
            }
            None => errors.push(ValidationError::InvalidVolumes),
        }
    }

    if let Some(images) = raw.get("images") {
        match images.as_object() {
            Some(images) => {
                for (name, image) in images {
                    if !image.is_object() {
                        errors.push(ValidationError::InvalidImage(name.clone()));
                    }
                }
            }
            None => errors.push(ValidationError::InvalidImages),
        }
    }

    if let Some(output_file) = raw.get("output_file") {
        if !matches!(output_file, Value::String(path) if !path.trim().is_empty()) {
            errors.push(ValidationError::InvalidOutputFile);
        }
    }

    if let Some(build) = raw.get("build") {
        errors.extend(validate_build(build));
    }

    if errors.is_empty() {
        info!("Request validated");
    } else {
        info!("Request rejected with {} validation error(s)", errors.len());
    }

    errors
}

/// Validates a single job entry.
fn validate_job(
    name: &str,
    job: &Value,
    rules: &ValidationRules,
    declared_volumes: &[&str],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(fields) = job.as_object() else {
        errors.push(ValidationError::InvalidJob(name.to_string()));
        return errors; // Can't validate further without fields
    };

    match fields.get("preset") {
        None => errors.push(ValidationError::MissingPreset(name.to_string())),
        Some(Value::String(preset)) if !preset.trim().is_empty() => {}
        Some(_) => errors.push(ValidationError::InvalidPreset(name.to_string())),
    }

    if let Some(port) = fields.get("http_port") {
        if let Err(error) = check_port(name, port) {
            errors.push(error);
        }
    }

    if let Some(env) = fields.get("env") {
        let valid = env
            .as_object()
            .is_some_and(|vars| vars.values().all(is_scalar));
        if !valid {
            errors.push(ValidationError::InvalidEnv(name.to_string()));
        }
    }

    if let Some(volumes) = fields.get("volumes") {
        match volumes.as_array() {
            Some(refs) => {
                let well_formed = refs.iter().all(|reference| match reference {
                    Value::String(volume) => !volume.trim().is_empty(),
                    Value::Object(_) => true,
                    _ => false,
                });
                if !well_formed {
                    errors.push(ValidationError::InvalidJobVolumes(name.to_string()));
                } else if rules.strict_references {
                    for volume in refs.iter().filter_map(Value::as_str).map(str::trim) {
                        if !declared_volumes.iter().any(|declared| *declared == volume) {
                            errors.push(ValidationError::UnknownVolumeRef {
                                job: name.to_string(),
                                volume: volume.to_string(),
                            });
                        }
                    }
                }
            }
            None => errors.push(ValidationError::InvalidJobVolumes(name.to_string())),
        }
    }

    errors
}

/// Checks an `http_port` value: an integer (or integer string) in range.
///
/// Integers of any size count as integers, so oversized values are reported
/// as out of range rather than malformed.
fn check_port(job: &str, port: &Value) -> Result<u16, ValidationError> {
    let Some(text) = integer_text(port) else {
        let value = match port {
            Value::String(s) => format!("'{}'", s),
            other => other.to_string(),
        };
        return Err(ValidationError::PortNotInteger {
            job: job.to_string(),
            value,
        });
    };

    match text.parse::<i64>() {
        Ok(number) if (MIN_PORT..=MAX_PORT).contains(&number) => Ok(number as u16),
        _ => Err(ValidationError::PortOutOfRange {
            job: job.to_string(),
            port: text,
        }),
    }
}

/// Decimal text of an integral value: a signed digit string, any JSON
/// integer, or a float with no fractional part.
fn integer_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
            let well_formed = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
            well_formed.then(|| trimmed.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| format!("{:.0}", f)),
        _ => None,
    }
}

/// Validates a single volume entry.
fn validate_volume(name: &str, volume: &Value) -> Vec<ValidationError> {
    let Some(fields) = volume.as_object() else {
        return vec![ValidationError::InvalidVolume(name.to_string())];
    };

    VolumeSpec::FIELDS
        .iter()
        .filter(|field| !fields.contains_key(**field))
        .map(|field| ValidationError::MissingVolumeField {
            volume: name.to_string(),
            field: *field,
        })
        .collect()
}

/// Validates the optional build recipe section.
fn validate_build(build: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(fields) = build.as_object() else {
        errors.push(ValidationError::InvalidBuild("must be a dictionary."));
        return errors;
    };

    for key in ["base_image", "command"] {
        if fields.get(key).is_some_and(|value| !value.is_string()) {
            errors.push(ValidationError::InvalidBuild(match key {
                "base_image" => "'base_image' must be a string.",
                _ => "'command' must be a string.",
            }));
        }
    }

    if let Some(dependencies) = fields.get("dependencies") {
        let valid = match dependencies {
            Value::String(_) => true,
            Value::Array(items) => items.iter().all(Value::is_string),
            _ => false,
        };
        if !valid {
            errors.push(ValidationError::InvalidBuild(
                "'dependencies' must be a list of strings or a comma-separated string.",
            ));
        }
    }

    errors
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Validation that returns a list of error messages.
///
/// Uses the default rules; this is the list a caller receives when a request
/// is rejected.
pub fn quick_validate(raw: &Value) -> Vec<String> {
    validate_request(raw, &ValidationRules::default())
        .iter()
        .map(|e| e.to_string())
        .collect()
}
