//! Collaborator seams: everything the engine reads from the outside world.

use anyhow::Result;
use async_trait::async_trait;

use crate::{LiveApplication, RevisionMetadata};

/// A manifest repository and the credential used to read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSpec {
    pub url: String,
    pub token: Option<String>,
}

impl RepoSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), token: None }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// Renders a directory of a manifest repository through the build tool.
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    /// Rendered objects for `path`, in build-tool output order.
    async fn resolve(&self, repo: &RepoSpec, path: &str) -> Result<Vec<serde_json::Value>>;

    /// Raw contents of a single file in the repository.
    async fn read_file(&self, repo: &RepoSpec, path: &str) -> Result<Vec<u8>>;
}

/// Lists deployment-state objects, optionally restricted to an exact name.
#[async_trait]
pub trait LiveApplicationSource: Send + Sync {
    async fn list(&self, name: Option<&str>) -> Result<Vec<LiveApplication>>;
}

/// Commit metadata for a deployed revision of an application.
#[async_trait]
pub trait RevisionMetadataSource: Send + Sync {
    async fn fetch(&self, app: &str, revision: &str) -> Result<RevisionMetadata>;
}

/// Credential lookup, e.g. the token used to clone the manifest repository.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn secret_value(&self, namespace: &str, name: &str, key: &str) -> Result<String>;
}
