//! Gitdeck public API façade (in-process).
//!
//! This crate defines the trait front ends (CLI, an HTTP layer) depend on and wires
//! the aggregation engine to its collaborators.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Instant;

use gitdeck_aggregate::AggregateError;
use gitdeck_core::config::ConfigError;
use gitdeck_core::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub mod settings;

pub use settings::Settings;

/// Declared configuration file at the repository root.
pub const PIPELINES_FILE: &str = "pipelines.yaml";
/// Key of the repository token inside the configured secret.
pub const REPO_TOKEN_KEY: &str = "token";

/// API errors suitable for transport to an HTTP layer.
#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeckError {
    #[error("not_found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl DeckError {
    /// HTTP status an HTTP layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DeckError::NotFound(_) => 404,
            DeckError::Validation(_) => 422,
            DeckError::Upstream(_) => 502,
            DeckError::Internal(_) => 500,
        }
    }
}

impl From<AggregateError> for DeckError {
    fn from(e: AggregateError) -> Self {
        DeckError::Validation(e.to_string())
    }
}

impl From<ConfigError> for DeckError {
    fn from(e: ConfigError) -> Self {
        DeckError::Validation(e.to_string())
    }
}

pub type DeckResult<T> = Result<T, DeckError>;

/// Services of one app as deployed to one environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentApplication {
    pub environment: String,
    pub cluster: String,
    pub services: Vec<Service>,
}

/// Sync state plus managed resources of one app in one environment, bucketed by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentStatus {
    pub environment: String,
    pub cluster: String,
    pub sync_status: String,
    #[serde(flatten)]
    pub resources: StatusBuckets,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationsResponse {
    pub applications: Vec<AppSummary>,
}

/// Path of an app's overlay for an environment inside the manifest repository.
pub fn path_for_application(env: &str, app: &str) -> String {
    format!("environments/{env}/apps/{app}")
}

/// Declarative gitdeck API surface.
#[async_trait::async_trait]
pub trait DeckApi: Send + Sync {
    /// Declared configuration of the manifest repository at `repo`.
    async fn pipelines(&self, repo: &str) -> DeckResult<Config>;

    /// Applications as declared in `repo`, without live state.
    async fn declared_applications(&self, repo: &str) -> DeckResult<ApplicationsResponse>;

    /// Live applications deployed from `repo`, merged per logical app.
    async fn applications(&self, repo: &str) -> DeckResult<ApplicationsResponse>;

    /// Rendered services of `app` in `env`, with images and declared sources.
    async fn environment_application(&self, repo: &str, env: &str, app: &str) -> DeckResult<EnvironmentApplication>;

    /// Deployment history of `app` in `env`, newest first.
    async fn application_history(&self, env: &str, app: &str) -> DeckResult<Vec<HistoryEntry>>;

    /// Health/status breakdown of `app` in `env`.
    async fn environment_status(&self, env: &str, app: &str) -> DeckResult<EnvironmentStatus>;
}

// ----------------- In-process implementation -----------------

/// In-process implementation that calls the engine and collaborators directly.
pub struct InProcApi {
    manifests: Arc<dyn ManifestResolver>,
    apps: Arc<dyn LiveApplicationSource>,
    revisions: Arc<dyn RevisionMetadataSource>,
    secrets: Arc<dyn SecretSource>,
    repo_secret: Option<(String, String)>,
}

impl InProcApi {
    pub fn new(
        manifests: Arc<dyn ManifestResolver>,
        apps: Arc<dyn LiveApplicationSource>,
        revisions: Arc<dyn RevisionMetadataSource>,
        secrets: Arc<dyn SecretSource>,
    ) -> Self {
        Self { manifests, apps, revisions, secrets, repo_secret: None }
    }

    /// Read the repository token from `namespace/name` before touching the repository.
    pub fn with_repo_secret(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.repo_secret = Some((namespace.into(), name.into()));
        self
    }

    /// Wire the kube-backed collaborators described by `settings`.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let revisions: Arc<dyn RevisionMetadataSource> = match &settings.argocd_url {
            Some(url) => Arc::new(gitdeck_kubehub::ArgoRevisions::new(url, settings.argocd_token.clone(), settings.insecure)?),
            None => Arc::new(gitdeck_kubehub::Unconfigured),
        };
        let mut api = Self::new(
            Arc::new(gitdeck_kubehub::KustomizeResolver::new(settings.git_bin.clone(), settings.kustomize_bin.clone())),
            Arc::new(gitdeck_kubehub::KubeApplications::new(settings.argocd_namespace.clone())),
            revisions,
            Arc::new(gitdeck_kubehub::KubeSecrets::new()),
        );
        if settings.repo_secret.is_some() {
            match settings.repo_secret_ref() {
                Some((ns, name)) => api = api.with_repo_secret(ns, name),
                None => warn!(secret = ?settings.repo_secret, "ignoring malformed repo secret; expected namespace/name"),
            }
        }
        Ok(api)
    }

    fn upstream(e: anyhow::Error) -> DeckError {
        DeckError::Upstream(format!("{:#}", e))
    }

    async fn repo(&self, url: &str) -> DeckResult<RepoSpec> {
        if url.trim().is_empty() {
            return Err(DeckError::Validation("repository URL is required".into()));
        }
        let token = match &self.repo_secret {
            Some((ns, name)) => Some(self.secrets.secret_value(ns, name, REPO_TOKEN_KEY).await.map_err(Self::upstream)?),
            None => None,
        };
        Ok(RepoSpec::new(url).with_token(token))
    }

    async fn load_config(&self, repo: &RepoSpec) -> DeckResult<Config> {
        let body = self.manifests.read_file(repo, PIPELINES_FILE).await.map_err(Self::upstream)?;
        Ok(Config::from_yaml(&body)?)
    }

    async fn live_application(&self, env: &str, app: &str) -> DeckResult<LiveApplication> {
        gitdeck_aggregate::find_live_application(self.apps.as_ref(), env, app)
            .await
            .map_err(Self::upstream)?
            .ok_or_else(|| DeckError::NotFound(format!("no live application for {app} in environment {env}")))
    }
}

#[async_trait::async_trait]
impl DeckApi for InProcApi {
    async fn pipelines(&self, repo: &str) -> DeckResult<Config> {
        let t0 = Instant::now();
        info!(repo = %repo, "api: pipelines start");
        let spec = self.repo(repo).await?;
        let cfg = self.load_config(&spec).await?;
        info!(environments = cfg.environments.len(), took_ms = %t0.elapsed().as_millis(), "api: pipelines ok");
        Ok(cfg)
    }

    async fn declared_applications(&self, repo: &str) -> DeckResult<ApplicationsResponse> {
        let cfg = self.pipelines(repo).await?;
        Ok(ApplicationsResponse { applications: gitdeck_aggregate::declared_summaries(&cfg) })
    }

    async fn applications(&self, repo: &str) -> DeckResult<ApplicationsResponse> {
        let t0 = Instant::now();
        info!(repo = %repo, "api: applications start");
        let live = self.apps.list(None).await.map_err(Self::upstream)?;
        let applications = gitdeck_aggregate::summarize(&live, repo);
        info!(live = live.len(), apps = applications.len(), took_ms = %t0.elapsed().as_millis(), "api: applications ok");
        Ok(ApplicationsResponse { applications })
    }

    async fn environment_application(&self, repo: &str, env: &str, app: &str) -> DeckResult<EnvironmentApplication> {
        let t0 = Instant::now();
        info!(repo = %repo, env = %env, app = %app, "api: environment_application start");
        let spec = self.repo(repo).await?;
        let cfg = self.load_config(&spec).await?;
        let environment = cfg
            .find_environment(env)
            .ok_or_else(|| DeckError::NotFound(format!("failed to find environment {env:?}")))?;
        // Overlays live in the declared GitOps repository when one is named.
        let gitops = if cfg.gitops_url.is_empty() { spec } else { RepoSpec::new(cfg.gitops_url.clone()).with_token(spec.token) };
        let objects = self
            .manifests
            .resolve(&gitops, &path_for_application(env, app))
            .await
            .map_err(Self::upstream)?;
        let resources = gitdeck_parser::extract(&objects);
        let services = gitdeck_aggregate::aggregate(environment, resources)?;
        info!(objects = objects.len(), services = services.len(), took_ms = %t0.elapsed().as_millis(), "api: environment_application ok");
        Ok(EnvironmentApplication { environment: env.to_string(), cluster: environment.cluster.clone(), services })
    }

    async fn application_history(&self, env: &str, app: &str) -> DeckResult<Vec<HistoryEntry>> {
        let t0 = Instant::now();
        info!(env = %env, app = %app, "api: history start");
        let live = self.live_application(env, app).await?;
        let entries = gitdeck_aggregate::history(&live, self.revisions.as_ref()).await;
        info!(entries = entries.len(), took_ms = %t0.elapsed().as_millis(), "api: history ok");
        Ok(entries)
    }

    async fn environment_status(&self, env: &str, app: &str) -> DeckResult<EnvironmentStatus> {
        let t0 = Instant::now();
        info!(env = %env, app = %app, "api: status start");
        let live = self.live_application(env, app).await?;
        let resources = gitdeck_aggregate::classify(&live.resource_health);
        info!(took_ms = %t0.elapsed().as_millis(), "api: status ok");
        Ok(EnvironmentStatus {
            environment: env.to_string(),
            cluster: live.destination_server,
            sync_status: live.sync_status,
            resources,
        })
    }
}
