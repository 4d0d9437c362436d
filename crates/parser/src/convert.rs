//! Structured object → typed workload conversion.

use std::fmt;

use serde::Deserialize;
use serde_json::Value as Json;

/// Workload kinds whose pod template we know how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
    DeploymentConfig,
}

impl WorkloadKind {
    /// Version is ignored: every served version keeps the template at the same path.
    pub fn from_group_kind(group: &str, kind: &str) -> Option<Self> {
        match (group, kind) {
            ("apps" | "extensions", "Deployment") => Some(Self::Deployment),
            ("apps", "StatefulSet") => Some(Self::StatefulSet),
            ("apps" | "extensions", "DaemonSet") => Some(Self::DaemonSet),
            ("batch", "Job") => Some(Self::Job),
            ("batch", "CronJob") => Some(Self::CronJob),
            ("apps.openshift.io", "DeploymentConfig") => Some(Self::DeploymentConfig),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::Job => "Job",
            Self::CronJob => "CronJob",
            Self::DeploymentConfig => "DeploymentConfig",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container, reduced to the one field image discovery reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Container {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub init_containers: Option<Vec<Container>>,
    #[serde(default)]
    pub containers: Option<Vec<Container>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PodTemplate {
    #[serde(default)]
    pub spec: Option<PodSpec>,
}

/// Spec of every kind that embeds its pod template directly under `template`.
///
/// Other fields are never decoded, so loosely typed values elsewhere in the
/// spec (numeric quantities, int-or-string ports) cannot fail a conversion.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TemplateSpec {
    #[serde(default)]
    pub template: Option<PodTemplate>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct JobTemplate {
    #[serde(default)]
    pub spec: Option<TemplateSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CronJobSpec {
    #[serde(default)]
    pub job_template: Option<JobTemplate>,
}

/// A recognized workload, carrying the spec that holds its pod template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workload {
    Deployment(TemplateSpec),
    StatefulSet(TemplateSpec),
    DaemonSet(TemplateSpec),
    Job(TemplateSpec),
    CronJob(CronJobSpec),
    DeploymentConfig(TemplateSpec),
}

impl Workload {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            Workload::Deployment(_) => WorkloadKind::Deployment,
            Workload::StatefulSet(_) => WorkloadKind::StatefulSet,
            Workload::DaemonSet(_) => WorkloadKind::DaemonSet,
            Workload::Job(_) => WorkloadKind::Job,
            Workload::CronJob(_) => WorkloadKind::CronJob,
            Workload::DeploymentConfig(_) => WorkloadKind::DeploymentConfig,
        }
    }

    /// The embedded pod template, if the workload declares one.
    pub fn pod_template(&self) -> Option<&PodTemplate> {
        match self {
            Workload::Deployment(s)
            | Workload::StatefulSet(s)
            | Workload::DaemonSet(s)
            | Workload::Job(s)
            | Workload::DeploymentConfig(s) => s.template.as_ref(),
            Workload::CronJob(s) => s
                .job_template
                .as_ref()
                .and_then(|j| j.spec.as_ref())
                .and_then(|j| j.template.as_ref()),
        }
    }
}

/// Result of a conversion: a typed workload, or the input handed back untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Structured<'a> {
    Workload(Workload),
    Other(&'a Json),
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{kind} has no spec")]
    MissingSpec { kind: WorkloadKind },
    #[error("malformed {kind} spec: {source}")]
    Spec {
        kind: WorkloadKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Split `apiVersion` into `(group, version)`; the core group is empty.
pub fn group_version(api_version: &str) -> (&str, &str) {
    match api_version.rsplit_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

fn spec_of<'de, T: Deserialize<'de>>(kind: WorkloadKind, obj: &'de Json) -> Result<T, ConvertError> {
    let spec = obj.get("spec").filter(|s| !s.is_null()).ok_or(ConvertError::MissingSpec { kind })?;
    T::deserialize(spec).map_err(|source| ConvertError::Spec { kind, source })
}

/// Convert a structured object into a [`Workload`] when its kind is known.
pub fn convert(obj: &Json) -> Result<Structured<'_>, ConvertError> {
    let api_version = obj.get("apiVersion").and_then(|v| v.as_str()).unwrap_or("");
    let kind = obj.get("kind").and_then(|v| v.as_str()).unwrap_or("");
    let (group, _) = group_version(api_version);
    let Some(wk) = WorkloadKind::from_group_kind(group, kind) else {
        return Ok(Structured::Other(obj));
    };
    let workload = match wk {
        WorkloadKind::Deployment => Workload::Deployment(spec_of(wk, obj)?),
        WorkloadKind::StatefulSet => Workload::StatefulSet(spec_of(wk, obj)?),
        WorkloadKind::DaemonSet => Workload::DaemonSet(spec_of(wk, obj)?),
        WorkloadKind::Job => Workload::Job(spec_of(wk, obj)?),
        WorkloadKind::CronJob => Workload::CronJob(spec_of(wk, obj)?),
        WorkloadKind::DeploymentConfig => Workload::DeploymentConfig(spec_of(wk, obj)?),
    };
    Ok(Structured::Workload(workload))
}
