//! Container image discovery for converted workloads.

use std::collections::BTreeSet;

use crate::convert::{PodTemplate, Structured, Workload};

/// Images of every init container and container of a pod template.
pub fn pod_template_images(template: &PodTemplate) -> BTreeSet<String> {
    let Some(spec) = template.spec.as_ref() else { return BTreeSet::new() };
    spec.init_containers
        .iter()
        .flatten()
        .chain(spec.containers.iter().flatten())
        .filter_map(|c| c.image.as_deref())
        .filter(|image| !image.is_empty())
        .map(str::to_string)
        .collect()
}

impl Workload {
    /// Distinct images, lexicographically ordered.
    pub fn images(&self) -> BTreeSet<String> {
        self.pod_template().map(pod_template_images).unwrap_or_default()
    }
}

/// Images for any conversion result; non-workloads have none.
pub fn images_from(structured: &Structured<'_>) -> BTreeSet<String> {
    match structured {
        Structured::Workload(w) => w.images(),
        Structured::Other(_) => BTreeSet::new(),
    }
}
