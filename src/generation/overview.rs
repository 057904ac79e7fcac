//! Defaults Discovery
//!
//! Read-only view of the registry defaults and field descriptions, used to
//! pre-populate request forms.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::template::{describe, AnnotationMode, EntityKind, TemplateRegistry};
use crate::workflow::model::{Defaults, ImageSpec, JobSpec, VolumeSpec};

/// Default entry of a named section.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TemplateSection<T> {
    pub template: T,
}

/// Defaults and descriptions for every section of a request.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DefaultsOverview {
    /// Description of the `title` field
    pub title: &'static str,

    /// Description of each workflow default
    pub defaults: BTreeMap<&'static str, &'static str>,

    pub volumes: TemplateSection<VolumeSpec>,
    pub images: TemplateSection<ImageSpec>,
    pub jobs: TemplateSection<JobSpec>,
}

impl DefaultsOverview {
    /// Builds the overview. Templates are always shown annotated so every
    /// field carries its description.
    pub fn collect() -> Self {
        let registry = TemplateRegistry::global(AnnotationMode::Annotated);

        let defaults = Defaults::FIELDS
            .iter()
            .filter_map(|&field| describe(EntityKind::Workflow, field).map(|d| (field, d)))
            .collect();

        Self {
            title: describe(EntityKind::Workflow, "title").unwrap_or_default(),
            defaults,
            volumes: TemplateSection {
                template: registry.volume().clone(),
            },
            images: TemplateSection {
                template: registry.image().clone(),
            },
            jobs: TemplateSection {
                template: registry.job().clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overview_shape() {
        let overview = serde_json::to_value(DefaultsOverview::collect()).unwrap();

        assert_eq!(overview["title"], json!("The title of your project."));
        assert!(overview["defaults"]["life_span"]
            .as_str()
            .unwrap()
            .contains("lifespan"));
        assert_eq!(overview["volumes"]["template"]["mount"]["value"], json!("/data"));
        assert_eq!(
            overview["images"]["template"]["ref"]["value"],
            json!("image:project_id:v1")
        );
        assert_eq!(overview["jobs"]["template"]["preset"]["value"], json!("cpu-small"));
    }

    #[test]
    fn test_overview_describes_every_workflow_default() {
        let overview = DefaultsOverview::collect();

        let described: Vec<&str> = overview.defaults.keys().copied().collect();
        assert_eq!(described, Defaults::FIELDS);
    }

    #[test]
    fn test_overview_templates_are_annotated() {
        let overview = DefaultsOverview::collect();

        assert!(overview.volumes.template.remote.is_annotated());
        assert!(overview.images.template.build_preset.is_annotated());
        assert!(overview.jobs.template.http_port.is_annotated());
    }
}
