//! Gitdeck core types: the resource/service vocabulary shared by the parser and
//! aggregators, live deployment-state records, and dashboard response shapes.

#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod sources;

pub use config::{Application, Config, DeclaredService, Environment};

/// Label carrying the service name of a rendered resource and the logical
/// application name of a live application.
pub const NAME_LABEL: &str = "app.kubernetes.io/name";

/// Basic metadata for a rendered Kubernetes resource.
///
/// `labels` and `images` are kept for aggregation only and never serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,
    #[serde(skip)]
    pub labels: BTreeMap<String, String>,
    #[serde(skip)]
    pub images: BTreeSet<String>,
}

impl Resource {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn gvk_key(&self) -> String {
        if self.group.is_empty() {
            format!("{}/{}", self.version, self.kind)
        } else {
            format!("{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Where a service's source lives, e.g. `{url: "https://github.com/o/r.git", type: "github.com"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Resources sharing a name label, with the union of their images.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub images: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

/// Health of a single resource managed by a live application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceHealth {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub health: String,
    pub status: String,
}

/// One deployment of a live application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub revision: String,
    pub deployed_at: Option<DateTime<Utc>>,
}

/// Snapshot of a cluster-resident deployment-state object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveApplication {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub destination_namespace: String,
    pub destination_server: String,
    pub source_repo_url: String,
    pub sync_status: String,
    pub resource_health: Vec<ResourceHealth>,
    /// Oldest first, as recorded by the control plane.
    pub history: Vec<HistoryRecord>,
}

impl LiveApplication {
    /// Logical (dashboard) name taken from the name label.
    pub fn app_name(&self) -> Option<&str> {
        self.labels.get(NAME_LABEL).map(String::as_str).filter(|s| !s.is_empty())
    }

    pub fn last_deployed(&self) -> Option<DateTime<Utc>> {
        self.history.last().and_then(|h| h.deployed_at)
    }
}

/// Per-application spread across environments. The three arrays are parallel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSummary {
    pub name: String,
    pub repo_url: String,
    pub environments: Vec<String>,
    pub sync_status: Vec<String>,
    pub last_deployed: Vec<String>,
}

/// Commit metadata for a deployed revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevisionMetadata {
    pub author: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub author: String,
    pub message: String,
    pub revision: String,
    pub environment: String,
    pub repo_url: String,
    pub deployed_at: String,
}

/// `{name, health, status}` row of an environment status breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusRow {
    pub name: String,
    pub health: String,
    pub status: String,
}

/// Managed resources of a live application bucketed by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBuckets {
    pub services: Vec<StatusRow>,
    pub deployments: Vec<StatusRow>,
    pub secrets: Vec<StatusRow>,
    pub routes: Vec<StatusRow>,
    pub role_bindings: Vec<StatusRow>,
    pub cluster_roles: Vec<StatusRow>,
    pub cluster_role_bindings: Vec<StatusRow>,
}

/// Timestamps on the wire: RFC 3339 UTC with second precision, empty when unset.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)).unwrap_or_default()
}

pub mod prelude {
    pub use super::{
        AppSummary, HistoryEntry, HistoryRecord, LiveApplication, Resource, ResourceHealth,
        RevisionMetadata, Service, Source, StatusBuckets, StatusRow, NAME_LABEL,
    };
    pub use super::config::{Config, Environment};
    pub use super::sources::{LiveApplicationSource, ManifestResolver, RepoSpec, RevisionMetadataSource, SecretSource};
}
