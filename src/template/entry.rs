//! Template Leaves
//!
//! A template leaf is either a bare default value or a value paired with a
//! human-readable description. Which of the two a registry uses is decided
//! once, when the registry is built, by its [`AnnotationMode`].
//!
//! # Example YAML Format
//!
//! ```yaml
//! # Plain
//! mount: /data
//!
//! # Annotated
//! mount:
//!   value: /data
//!   description: Defines the path inside the container where the volume will be mounted.
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How leaves of a registry (and every document merged from it) are emitted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMode {
    /// Leaves are bare values.
    #[default]
    Plain,
    /// Leaves are `{value, description}` pairs.
    Annotated,
}

impl AnnotationMode {
    pub fn is_annotated(self) -> bool {
        matches!(self, Self::Annotated)
    }
}

/// Returns the value of a user-supplied `{value, description}` leaf, or
/// `value` itself when it is not shaped like one.
///
/// A request pre-filled from annotated defaults sends leaves back in this
/// shape; only the value is ever taken from the user.
pub fn user_value(value: &Value) -> &Value {
    match value {
        Value::Object(fields)
            if fields.contains_key("value")
                && fields.keys().all(|key| key == "value" || key == "description") =>
        {
            &fields["value"]
        }
        other => other,
    }
}

/// A single template leaf.
///
/// The annotated variant is listed first so that deserializing a
/// `{value, description}` mapping does not collapse it into a bare object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TemplateEntry {
    /// Value with the registry's description of the field
    Annotated { value: Value, description: String },

    /// Bare default value
    Bare(Value),
}

impl TemplateEntry {
    /// Creates a bare leaf.
    pub fn bare(value: impl Into<Value>) -> Self {
        Self::Bare(value.into())
    }

    /// Creates an annotated leaf.
    pub fn annotated(value: impl Into<Value>, description: impl Into<String>) -> Self {
        Self::Annotated {
            value: value.into(),
            description: description.into(),
        }
    }

    /// Creates a leaf in the representation selected by `mode`.
    ///
    /// The description is dropped in plain mode.
    pub fn for_mode(mode: AnnotationMode, value: impl Into<Value>, description: &str) -> Self {
        match mode {
            AnnotationMode::Plain => Self::bare(value),
            AnnotationMode::Annotated => Self::annotated(value, description),
        }
    }

    /// Returns the resolved value regardless of representation.
    pub fn value(&self) -> &Value {
        match self {
            Self::Annotated { value, .. } => value,
            Self::Bare(value) => value,
        }
    }

    /// Returns the description, if this leaf is annotated.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Annotated { description, .. } => Some(description),
            Self::Bare(_) => None,
        }
    }

    pub fn is_annotated(&self) -> bool {
        matches!(self, Self::Annotated { .. })
    }

    /// Returns the value as a string slice when it is a string.
    pub fn as_str(&self) -> Option<&str> {
        self.value().as_str()
    }

    /// Layers a user-supplied value over this leaf.
    ///
    /// With no user value the leaf is returned unchanged (value and
    /// description together). Otherwise only the value is replaced; the
    /// description always stays the registry's, even when the user value is
    /// itself a `{value, description}` leaf.
    pub fn overlay(&self, user: Option<&Value>) -> Self {
        match (self, user.map(user_value)) {
            (_, None) => self.clone(),
            (Self::Annotated { description, .. }, Some(value)) => Self::Annotated {
                value: value.clone(),
                description: description.clone(),
            },
            (Self::Bare(_), Some(value)) => Self::Bare(value.clone()),
        }
    }
}
