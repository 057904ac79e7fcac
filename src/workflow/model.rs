//! Live Workflow Data Model
//!
//! Document structures emitted by the generator. Every leaf is a
//! [`TemplateEntry`], so the same types carry both the plain and the
//! annotated representation.
//!
//! # Example YAML Format
//!
//! ```yaml
//! kind: live
//! title: demo
//! defaults:
//!   life_span: 5d
//! volumes:
//!   data:
//!     remote: storage:/demo/data
//!     mount: /data
//!     local: data
//! images: {}
//! jobs:
//!   train:
//!     name: example_job
//!     preset: gpu-large
//!     http_port: '9090'
//!     browse: true
//!     env: {}
//!     volumes:
//!       - ${{ volumes.data.ref_rw }}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::template::TemplateEntry;

/// Value of the `kind` field of every generated document.
pub const LIVE_KIND: &str = "live";

/// Leaves the registry does not know about, kept as supplied by the user.
pub type ExtraFields = BTreeMap<String, TemplateEntry>;

/// Workflow-wide defaults section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Defaults {
    /// Lifetime of the workflow (e.g. "5d")
    pub life_span: TemplateEntry,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Defaults {
    pub const FIELDS: &'static [&'static str] = &["life_span"];
}

/// A storage volume synchronised between the platform and the local tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VolumeSpec {
    /// Remote storage path
    pub remote: TemplateEntry,

    /// Path inside the container
    pub mount: TemplateEntry,

    /// Local source directory
    pub local: TemplateEntry,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl VolumeSpec {
    /// Fields every user-supplied volume must name.
    pub const FIELDS: &'static [&'static str] = &["remote", "mount", "local"];
}

/// A container image built for the workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageSpec {
    /// Image reference
    #[serde(rename = "ref")]
    pub reference: TemplateEntry,

    /// Path to the Dockerfile
    pub dockerfile: TemplateEntry,

    /// Build context directory
    pub context: TemplateEntry,

    /// Resource preset used for the build
    pub build_preset: TemplateEntry,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ImageSpec {
    pub const FIELDS: &'static [&'static str] = &["ref", "dockerfile", "context", "build_preset"];
}

/// A reference from a job to a volume.
///
/// Requests carry names (or inline volume mappings); expansion turns names
/// into either a full [`VolumeSpec`] or a reference token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum VolumeRef {
    /// Volume name as written by the user
    Name(String),

    /// Expression resolved by the platform (e.g. `${{ volumes.data.ref_rw }}`).
    /// Serialized as a plain string, so it reads back as [`VolumeRef::Name`].
    Token(String),

    /// Fully specified volume
    Spec(Box<VolumeSpec>),
}

impl VolumeRef {
    /// Returns the volume name for unresolved references.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }
}

/// A job run on a resource preset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobSpec {
    /// Display name of the job
    pub name: TemplateEntry,

    /// Resource preset the job runs on
    pub preset: TemplateEntry,

    /// String-encoded HTTP port
    pub http_port: TemplateEntry,

    /// Whether to open the job's endpoint in a browser
    pub browse: TemplateEntry,

    /// Environment variables
    pub env: TemplateEntry,

    /// Volumes mounted into the job. A container like the top-level
    /// `volumes`: in annotated mode its expanded entries carry the leaves.
    #[serde(default)]
    pub volumes: Vec<VolumeRef>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl JobSpec {
    pub const FIELDS: &'static [&'static str] =
        &["name", "preset", "http_port", "browse", "env", "volumes"];
}

/// A complete live workflow descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowDocument {
    pub kind: TemplateEntry,
    pub title: TemplateEntry,
    pub defaults: Defaults,

    #[serde(default)]
    pub volumes: BTreeMap<String, VolumeSpec>,

    #[serde(default)]
    pub images: BTreeMap<String, ImageSpec>,

    #[serde(default)]
    pub jobs: BTreeMap<String, JobSpec>,
}

impl WorkflowDocument {
    /// Gets a job by name.
    pub fn job(&self, name: &str) -> Option<&JobSpec> {
        self.jobs.get(name)
    }

    /// Gets a volume by name.
    pub fn volume(&self, name: &str) -> Option<&VolumeSpec> {
        self.volumes.get(name)
    }

    /// Returns the number of jobs in the document.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if the document has no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn volume() -> VolumeSpec {
        VolumeSpec {
            remote: TemplateEntry::bare("storage:/p/data"),
            mount: TemplateEntry::bare("/data"),
            local: TemplateEntry::bare("data"),
            extra: ExtraFields::new(),
        }
    }

    #[test]
    fn test_image_ref_field_is_renamed() {
        let image = ImageSpec {
            reference: TemplateEntry::bare("image:p:v1"),
            dockerfile: TemplateEntry::bare("./Dockerfile"),
            context: TemplateEntry::bare("./"),
            build_preset: TemplateEntry::bare("cpu-large"),
            extra: ExtraFields::new(),
        };

        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["ref"], json!("image:p:v1"));
        assert!(value.get("reference").is_none());
    }

    #[test]
    fn test_extra_fields_are_flattened() {
        let mut spec = volume();
        spec.extra
            .insert("read_only".to_string(), TemplateEntry::bare(true));

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["read_only"], json!(true));
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_volume_ref_serialization() {
        let refs = vec![
            VolumeRef::Name("data".to_string()),
            VolumeRef::Token("${{ volumes.data.ref_rw }}".to_string()),
            VolumeRef::Spec(Box::new(volume())),
        ];

        let value = serde_json::to_value(&refs).unwrap();
        assert_eq!(value[0], json!("data"));
        assert_eq!(value[1], json!("${{ volumes.data.ref_rw }}"));
        assert_eq!(value[2]["mount"], json!("/data"));
    }

    #[test]
    fn test_volume_ref_name() {
        assert_eq!(VolumeRef::Name("data".to_string()).name(), Some("data"));
        assert_eq!(VolumeRef::Token("x".to_string()).name(), None);
    }

    #[test]
    fn test_document_yaml_roundtrip_keeps_extras() {
        let yaml = r#"
kind: live
title: demo
defaults:
  life_span: 1d
  preset: cpu-small
volumes: {}
images: {}
jobs:
  train:
    name: train
    preset: gpu-large
    http_port: '9090'
    browse: false
    env: {}
"#;
        let document: WorkflowDocument = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(document.len(), 1);
        assert!(!document.is_empty());
        assert_eq!(
            document.defaults.extra.get("preset"),
            Some(&TemplateEntry::bare("cpu-small"))
        );
        let job = document.job("train").unwrap();
        assert_eq!(job.preset.as_str(), Some("gpu-large"));
        assert!(job.volumes.is_empty());
        assert!(document.volume("data").is_none());
    }
}
