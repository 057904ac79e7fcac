//! Volume Reference Expansion
//!
//! Replaces the volume names listed by each job with what the platform needs:
//! the full volume entry in annotated documents, or a `${{ volumes.<name>.ref_rw }}`
//! expression in plain ones. Names that match no merged volume fall back to
//! the registry's default volume.

use std::collections::BTreeMap;

use log::{debug, warn};

use super::model::{VolumeRef, VolumeSpec, WorkflowDocument};
use crate::template::{AnnotationMode, TemplateRegistry};

/// Builds the platform expression referring to a declared volume.
pub fn reference_token(name: &str) -> String {
    format!("${{{{ volumes.{}.ref_rw }}}}", name)
}

/// Expands the volume references of every job in place.
pub fn expand_references(document: &mut WorkflowDocument, registry: &TemplateRegistry) {
    let WorkflowDocument { volumes, jobs, .. } = document;

    for (job_name, job) in jobs.iter_mut() {
        if job.volumes.is_empty() {
            continue;
        }
        debug!("Expanding {} volume reference(s) of job '{}'", job.volumes.len(), job_name);
        job.volumes = expand_job_volumes(&job.volumes, volumes, registry);
    }
}

/// Expands one job's reference list against the merged volumes.
///
/// Already resolved entries (tokens, inline specs) are kept as they are.
pub fn expand_job_volumes(
    references: &[VolumeRef],
    volumes: &BTreeMap<String, VolumeSpec>,
    registry: &TemplateRegistry,
) -> Vec<VolumeRef> {
    references
        .iter()
        .map(|reference| {
            let Some(name) = reference.name() else {
                return reference.clone();
            };

            match volumes.get(name) {
                Some(spec) => match registry.mode() {
                    AnnotationMode::Annotated => VolumeRef::Spec(Box::new(spec.clone())),
                    AnnotationMode::Plain => VolumeRef::Token(reference_token(name)),
                },
                None => {
                    warn!(
                        "Volume '{}' is not declared; using the default volume template",
                        name
                    );
                    VolumeRef::Spec(Box::new(registry.volume().clone()))
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::merge::merge_request;
    use crate::workflow::request::LiveRequest;
    use serde_json::json;

    fn request() -> LiveRequest {
        LiveRequest::decode(&json!({
            "volumes": {"data": {"remote": "storage:/demo/data", "mount": "/data", "local": "data"}},
            "jobs": {"train": {"preset": "gpu-large", "volumes": ["data", "ghost"]}}
        }))
    }

    #[test]
    fn test_reference_token() {
        assert_eq!(reference_token("data"), "${{ volumes.data.ref_rw }}");
    }

    #[test]
    fn test_expand_plain_uses_tokens() {
        let registry = TemplateRegistry::global(AnnotationMode::Plain);
        let mut document = merge_request(registry, &request());
        expand_references(&mut document, registry);

        let volumes = &document.job("train").unwrap().volumes;
        assert_eq!(volumes[0], VolumeRef::Token("${{ volumes.data.ref_rw }}".to_string()));
        assert_eq!(volumes[1], VolumeRef::Spec(Box::new(registry.volume().clone())));
    }

    #[test]
    fn test_expand_annotated_uses_full_spec() {
        let registry = TemplateRegistry::global(AnnotationMode::Annotated);
        let mut document = merge_request(registry, &request());
        expand_references(&mut document, registry);

        let expected = document.volume("data").unwrap().clone();
        let volumes = &document.job("train").unwrap().volumes;
        assert_eq!(volumes[0], VolumeRef::Spec(Box::new(expected)));
        match &volumes[1] {
            VolumeRef::Spec(spec) => assert_eq!(**spec, *registry.volume()),
            other => panic!("expected default volume, got {:?}", other),
        }
    }

    #[test]
    fn test_expand_is_pure() {
        let registry = TemplateRegistry::global(AnnotationMode::Annotated);
        let document = merge_request(registry, &request());
        let references = &document.job("train").unwrap().volumes;

        let first = expand_job_volumes(references, &document.volumes, registry);
        let second = expand_job_volumes(references, &document.volumes, registry);
        assert_eq!(first, second);
        assert_eq!(references[0], VolumeRef::Name("data".to_string()));
    }

    #[test]
    fn test_resolved_entries_untouched() {
        let registry = TemplateRegistry::global(AnnotationMode::Plain);
        let references = vec![
            VolumeRef::Token("${{ volumes.x.ref_ro }}".to_string()),
            VolumeRef::Spec(Box::new(registry.volume().clone())),
        ];

        let expanded = expand_job_volumes(&references, &BTreeMap::new(), registry);
        assert_eq!(expanded, references);
    }

    #[test]
    fn test_jobs_without_volumes_untouched() {
        let registry = TemplateRegistry::global(AnnotationMode::Plain);
        let raw = json!({"jobs": {"serve": {"preset": "cpu-small"}}});
        let mut document = merge_request(registry, &LiveRequest::decode(&raw));
        let before = document.clone();

        expand_references(&mut document, registry);
        assert_eq!(document, before);
    }
}
