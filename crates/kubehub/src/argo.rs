//! Argo CD `Application` objects as live deployment-state records.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gitdeck_core::sources::LiveApplicationSource;
use gitdeck_core::{HistoryRecord, LiveApplication, ResourceHealth};
use kube::{
    api::{Api, ListParams},
    core::{ApiResource, DynamicObject, GroupVersionKind},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::get_kube_client;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArgoApp {
    #[serde(default)]
    metadata: ArgoMeta,
    #[serde(default)]
    spec: ArgoSpec,
    #[serde(default)]
    status: ArgoStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ArgoMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ArgoSpec {
    #[serde(default)]
    destination: ArgoDestination,
    #[serde(default)]
    source: ArgoSource,
}

#[derive(Debug, Default, Deserialize)]
struct ArgoDestination {
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    server: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArgoSource {
    #[serde(default, rename = "repoURL")]
    repo_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ArgoStatus {
    #[serde(default)]
    sync: ArgoSync,
    #[serde(default)]
    resources: Vec<ArgoResource>,
    #[serde(default)]
    history: Vec<ArgoHistory>,
}

#[derive(Debug, Default, Deserialize)]
struct ArgoSync {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
struct ArgoResource {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    health: Option<ArgoHealth>,
}

#[derive(Debug, Default, Deserialize)]
struct ArgoHealth {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArgoHistory {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    revision: String,
    #[serde(default)]
    deployed_at: Option<DateTime<Utc>>,
}

impl From<ArgoApp> for LiveApplication {
    fn from(a: ArgoApp) -> Self {
        LiveApplication {
            name: a.metadata.name,
            namespace: a.metadata.namespace,
            labels: a.metadata.labels,
            destination_namespace: a.spec.destination.namespace,
            destination_server: a.spec.destination.server,
            source_repo_url: a.spec.source.repo_url,
            sync_status: a.status.sync.status,
            resource_health: a
                .status
                .resources
                .into_iter()
                .map(|r| ResourceHealth {
                    kind: r.kind,
                    name: r.name,
                    namespace: r.namespace,
                    health: r.health.map(|h| h.status).unwrap_or_default(),
                    status: r.status,
                })
                .collect(),
            history: a
                .status
                .history
                .into_iter()
                .map(|h| HistoryRecord { id: h.id, revision: h.revision, deployed_at: h.deployed_at })
                .collect(),
        }
    }
}

/// Decode an Argo CD `Application` (as JSON) into a live application record.
pub fn live_from_value(v: &serde_json::Value) -> Result<LiveApplication> {
    let app = ArgoApp::deserialize(v).context("decoding Argo CD Application")?;
    Ok(app.into())
}

/// Decode a listing, skipping (with a warning) objects that do not decode.
pub fn live_from_values(items: &[serde_json::Value]) -> Vec<LiveApplication> {
    items
        .iter()
        .filter_map(|raw| match live_from_value(raw) {
            Ok(app) => Some(app),
            Err(e) => {
                let name = raw.pointer("/metadata/name").and_then(|n| n.as_str()).unwrap_or("");
                warn!(error = %format!("{:#}", e), name = %name, "skipping undecodable application");
                None
            }
        })
        .collect()
}

fn application_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk("argoproj.io", "v1alpha1", "Application");
    ApiResource::from_gvk_with_plural(&gvk, "applications")
}

/// Lists Argo CD applications in one namespace through the kube API.
#[derive(Debug, Clone)]
pub struct KubeApplications {
    namespace: String,
}

impl KubeApplications {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }
}

#[async_trait]
impl LiveApplicationSource for KubeApplications {
    async fn list(&self, name: Option<&str>) -> Result<Vec<LiveApplication>> {
        let client = get_kube_client().await?;
        let api: Api<DynamicObject> = Api::namespaced_with(client, &self.namespace, &application_resource());
        let lp = match name {
            Some(n) => ListParams::default().fields(&format!("metadata.name={n}")),
            None => ListParams::default(),
        };
        let list = api
            .list(&lp)
            .await
            .with_context(|| format!("listing applications in {}", self.namespace))?;
        info!(ns = %self.namespace, name = ?name, count = list.items.len(), "argo applications listed");
        let raw = list
            .items
            .iter()
            .map(|obj| serde_json::to_value(obj).context("serializing DynamicObject"))
            .collect::<Result<Vec<_>>>()?;
        Ok(live_from_values(&raw))
    }
}
