//! Merge Engine
//!
//! Builds a complete [`WorkflowDocument`] by layering a validated
//! [`LiveRequest`] over a fresh copy of the registry defaults:
//!
//! - `title` and the keys of `defaults` are overwritten whole
//! - each named volume, image and job is overlaid field by field on its
//!   default entry; fields the user omits keep the default leaf
//! - leaves keep the registry's representation, so in annotated mode every
//!   overridden value is re-wrapped with the registry description
//!
//! The registry itself is never modified.

use log::{debug, info};
use serde_json::Value;

use super::model::{
    Defaults, ExtraFields, ImageSpec, JobSpec, VolumeRef, VolumeSpec, WorkflowDocument,
};
use super::request::{Fields, JobRequest, LiveRequest, RequestedVolume};
use crate::template::{user_value, wrap_field, AnnotationMode, EntityKind, TemplateRegistry};

/// Merges a request over the registry defaults.
///
/// Job volume references are left as names; see
/// [`expand_references`](super::expander::expand_references).
pub fn merge_request(registry: &TemplateRegistry, request: &LiveRequest) -> WorkflowDocument {
    let mode = registry.mode();
    let mut document = registry.fresh_document();

    if let Some(title) = &request.title {
        document.title = document.title.overlay(Some(&Value::String(title.clone())));
    }

    document.defaults = document.defaults.overlay(mode, &request.defaults);

    for (name, fields) in &request.volumes {
        debug!("Merging volume '{}'", name);
        document
            .volumes
            .insert(name.clone(), registry.volume().overlay(mode, fields));
    }

    for (name, fields) in &request.images {
        debug!("Merging image '{}'", name);
        document
            .images
            .insert(name.clone(), registry.image().overlay(mode, fields));
    }

    for (name, job) in &request.jobs {
        debug!("Merging job '{}'", name);
        document
            .jobs
            .insert(name.clone(), merge_job(registry, registry.job(), job));
    }

    info!(
        "Merged document: {} volumes, {} images, {} jobs",
        document.volumes.len(),
        document.images.len(),
        document.jobs.len()
    );

    document
}

/// Overlays a partial job on `base`, keeping requested volumes as references.
pub fn merge_job(registry: &TemplateRegistry, base: &JobSpec, job: &JobRequest) -> JobSpec {
    let mut merged = base.overlay(registry.mode(), &job.fields);

    if let Some(volumes) = &job.volumes {
        merged.volumes = volumes
            .iter()
            .map(|reference| match reference {
                RequestedVolume::Name(name) => VolumeRef::Name(name.clone()),
                RequestedVolume::Inline(fields) => {
                    VolumeRef::Spec(Box::new(registry.volume().overlay(registry.mode(), fields)))
                }
            })
            .collect();
    }

    merged
}

/// Overlays user fields the typed structure has no slot for.
///
/// Existing extras are overlaid like any other leaf; new ones are wrapped in
/// the representation of `mode`.
fn overlay_extra(
    mode: AnnotationMode,
    kind: EntityKind,
    base: &ExtraFields,
    fields: &Fields,
    known: &[&str],
) -> ExtraFields {
    let mut extra = base.clone();

    for (key, value) in fields.iter().filter(|(key, _)| !known.contains(&key.as_str())) {
        let entry = match extra.get(key) {
            Some(existing) => existing.overlay(Some(value)),
            None => wrap_field(mode, kind, key, user_value(value).clone()),
        };
        extra.insert(key.clone(), entry);
    }

    extra
}

impl Defaults {
    /// Overwrites each supplied key whole; nothing below it is merged.
    pub fn overlay(&self, mode: AnnotationMode, fields: &Fields) -> Self {
        Self {
            life_span: self.life_span.overlay(fields.get("life_span")),
            extra: overlay_extra(mode, EntityKind::Workflow, &self.extra, fields, Self::FIELDS),
        }
    }
}

impl VolumeSpec {
    /// Overlays user fields on this volume.
    pub fn overlay(&self, mode: AnnotationMode, fields: &Fields) -> Self {
        Self {
            remote: self.remote.overlay(fields.get("remote")),
            mount: self.mount.overlay(fields.get("mount")),
            local: self.local.overlay(fields.get("local")),
            extra: overlay_extra(mode, EntityKind::Volume, &self.extra, fields, Self::FIELDS),
        }
    }
}

impl ImageSpec {
    /// Overlays user fields on this image.
    pub fn overlay(&self, mode: AnnotationMode, fields: &Fields) -> Self {
        Self {
            reference: self.reference.overlay(fields.get("ref")),
            dockerfile: self.dockerfile.overlay(fields.get("dockerfile")),
            context: self.context.overlay(fields.get("context")),
            build_preset: self.build_preset.overlay(fields.get("build_preset")),
            extra: overlay_extra(mode, EntityKind::Image, &self.extra, fields, Self::FIELDS),
        }
    }
}

impl JobSpec {
    /// Overlays user fields on this job. `volumes` is handled by
    /// [`merge_job`] and ignored here.
    pub fn overlay(&self, mode: AnnotationMode, fields: &Fields) -> Self {
        Self {
            name: self.name.overlay(fields.get("name")),
            preset: self.preset.overlay(fields.get("preset")),
            http_port: self.http_port.overlay(fields.get("http_port")),
            browse: self.browse.overlay(fields.get("browse")),
            env: self.env.overlay(fields.get("env")),
            volumes: self.volumes.clone(),
            extra: overlay_extra(mode, EntityKind::Job, &self.extra, fields, Self::FIELDS),
        }
    }
}
