//! Gitdeck kubehub: adapters for the engine's collaborators.
//!
//! - [`argo`]: Argo CD `Application` listing → `LiveApplication`
//! - [`secrets`]: Kubernetes secret values
//! - [`manifests`]: git clone + kustomize rendering
//! - [`revisions`]: commit metadata from the Argo CD REST API

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use kube::Client;
use tokio::sync::OnceCell;

pub mod argo;
pub mod manifests;
pub mod revisions;
pub mod secrets;

pub use argo::{live_from_value, live_from_values, KubeApplications};
pub use manifests::KustomizeResolver;
pub use revisions::{ArgoRevisions, Unconfigured};
pub use secrets::KubeSecrets;

static CLIENT: OnceCell<Client> = OnceCell::const_new();

/// Shared kube client built from the ambient kubeconfig / in-cluster config.
pub async fn get_kube_client() -> Result<Client> {
    let client = CLIENT
        .get_or_try_init(|| async { Client::try_default().await.context("creating kube client") })
        .await?;
    Ok(client.clone())
}
