//! Template Registry
//!
//! Holds the default trees for the four entity kinds (workflow, job, volume,
//! image) together with the description of every field. Two process-wide
//! registries exist, one per [`AnnotationMode`]; both are built on first use
//! and never mutated afterwards. Callers clone what they need before merging.

use std::collections::BTreeMap;

use log::debug;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::entry::{AnnotationMode, TemplateEntry};
use crate::workflow::model::{
    Defaults, ExtraFields, ImageSpec, JobSpec, VolumeSpec, WorkflowDocument, LIVE_KIND,
};

/// Description attached to user fields the registry does not know.
pub const UNDOCUMENTED_FIELD: &str = "User-supplied field without a registry description.";

/// Kinds of entity the registry has templates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Workflow,
    Job,
    Volume,
    Image,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Job => "job",
            Self::Volume => "volume",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the registry description of a field.
pub fn describe(kind: EntityKind, field: &str) -> Option<&'static str> {
    let description = match (kind, field) {
        (EntityKind::Workflow, "kind") => "Kind of the workflow; always 'live' for live workflows.",
        (EntityKind::Workflow, "title") => "The title of your project.",
        (EntityKind::Workflow, "life_span") => {
            "Specifies the lifespan of the workflow (e.g., '5d')."
        }
        (EntityKind::Job, "name") => "Name shown for the job on the platform.",
        (EntityKind::Job, "preset") => "Specifies the resource preset the job runs on.",
        (EntityKind::Job, "http_port") => "HTTP port exposed by the job.",
        (EntityKind::Job, "browse") => {
            "Opens the job's HTTP endpoint in a browser once the job starts."
        }
        (EntityKind::Job, "env") => "Environment variables passed to the job.",
        (EntityKind::Volume, "remote") => {
            "Specifies the remote path to the storage location in the Apolo platform."
        }
        (EntityKind::Volume, "mount") => {
            "Defines the path inside the container where the volume will be mounted."
        }
        (EntityKind::Volume, "local") => {
            "Specifies the local directory used as the volume's source for synchronization."
        }
        (EntityKind::Image, "ref") => {
            "Specifies the reference to the container image used for the job."
        }
        (EntityKind::Image, "dockerfile") => "Path to the Dockerfile used to build the image.",
        (EntityKind::Image, "context") => {
            "Defines the build context directory for the Docker image."
        }
        (EntityKind::Image, "build_preset") => {
            "Specifies the resource preset for building the Docker image."
        }
        _ => return None,
    };
    Some(description)
}

/// Wraps a value for `field` of `kind` in the representation of `mode`.
///
/// Unknown fields get [`UNDOCUMENTED_FIELD`] so that an annotated document
/// never contains bare leaves.
pub fn wrap_field(mode: AnnotationMode, kind: EntityKind, field: &str, value: Value) -> TemplateEntry {
    let description = describe(kind, field).unwrap_or(UNDOCUMENTED_FIELD);
    TemplateEntry::for_mode(mode, value, description)
}

static PLAIN: Lazy<TemplateRegistry> = Lazy::new(|| TemplateRegistry::new(AnnotationMode::Plain));

static ANNOTATED: Lazy<TemplateRegistry> =
    Lazy::new(|| TemplateRegistry::new(AnnotationMode::Annotated));

/// Immutable default trees for one annotation mode.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    mode: AnnotationMode,
    workflow: WorkflowDocument,
    job: JobSpec,
    volume: VolumeSpec,
    image: ImageSpec,
}

impl TemplateRegistry {
    /// Builds a registry whose leaves use `mode`.
    ///
    /// Prefer [`TemplateRegistry::global`]; this exists for callers that need
    /// an owned instance.
    pub fn new(mode: AnnotationMode) -> Self {
        debug!("Building {:?} template registry", mode);

        let workflow_leaf = |field: &str, value: Value| wrap_field(mode, EntityKind::Workflow, field, value);
        let job_leaf = |field: &str, value: Value| wrap_field(mode, EntityKind::Job, field, value);
        let volume_leaf = |field: &str, value: Value| wrap_field(mode, EntityKind::Volume, field, value);
        let image_leaf = |field: &str, value: Value| wrap_field(mode, EntityKind::Image, field, value);

        let workflow = WorkflowDocument {
            kind: workflow_leaf("kind", json!(LIVE_KIND)),
            title: workflow_leaf("title", json!("custom_project")),
            defaults: Defaults {
                life_span: workflow_leaf("life_span", json!("5d")),
                extra: ExtraFields::new(),
            },
            volumes: BTreeMap::new(),
            images: BTreeMap::new(),
            jobs: BTreeMap::new(),
        };

        let job = JobSpec {
            name: job_leaf("name", json!("example_job")),
            preset: job_leaf("preset", json!("cpu-small")),
            http_port: job_leaf("http_port", json!("8080")),
            browse: job_leaf("browse", json!(true)),
            env: job_leaf("env", json!({})),
            volumes: Vec::new(),
            extra: ExtraFields::new(),
        };

        let volume = VolumeSpec {
            remote: volume_leaf("remote", json!("storage:/project_id/data")),
            mount: volume_leaf("mount", json!("/data")),
            local: volume_leaf("local", json!("data_folder")),
            extra: ExtraFields::new(),
        };

        let image = ImageSpec {
            reference: image_leaf("ref", json!("image:project_id:v1")),
            dockerfile: image_leaf("dockerfile", json!("./Dockerfile")),
            context: image_leaf("context", json!("./")),
            build_preset: image_leaf("build_preset", json!("cpu-large")),
            extra: ExtraFields::new(),
        };

        Self {
            mode,
            workflow,
            job,
            volume,
            image,
        }
    }

    /// Returns the process-wide registry for `mode`.
    pub fn global(mode: AnnotationMode) -> &'static TemplateRegistry {
        match mode {
            AnnotationMode::Plain => &*PLAIN,
            AnnotationMode::Annotated => &*ANNOTATED,
        }
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    /// Default workflow document (empty volumes, images and jobs).
    pub fn workflow(&self) -> &WorkflowDocument {
        &self.workflow
    }

    pub fn job(&self) -> &JobSpec {
        &self.job
    }

    pub fn volume(&self) -> &VolumeSpec {
        &self.volume
    }

    pub fn image(&self) -> &ImageSpec {
        &self.image
    }

    /// Returns a fresh, independently owned copy of the workflow defaults.
    pub fn fresh_document(&self) -> WorkflowDocument {
        self.workflow.clone()
    }

    /// Wraps a value for `field` of `kind` in this registry's representation.
    pub fn wrap(&self, kind: EntityKind, field: &str, value: Value) -> TemplateEntry {
        wrap_field(self.mode, kind, field, value)
    }
}
