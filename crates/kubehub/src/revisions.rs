//! Revision (commit) metadata from the Argo CD REST API.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use gitdeck_core::sources::RevisionMetadataSource;
use gitdeck_core::RevisionMetadata;
use reqwest::Url;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct ArgoRevisionMetadata {
    #[serde(default)]
    author: String,
    #[serde(default)]
    message: String,
}

/// `GET {base}/api/v1/applications/{app}/revisions/{revision}/metadata`.
#[derive(Debug, Clone)]
pub struct ArgoRevisions {
    base_url: Url,
    token: Option<String>,
    http: reqwest::Client,
}

impl ArgoRevisions {
    /// `insecure` skips TLS verification of the Argo CD server.
    pub fn new(base_url: &str, token: Option<String>, insecure: bool) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid Argo CD URL {:?}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("invalid Argo CD URL {:?}", base_url.as_str()));
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()
            .context("building HTTP client")?;
        Ok(Self { base_url, token, http })
    }

    pub fn metadata_url(&self, app: &str, revision: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.pop_if_empty()
                .extend(["api", "v1", "applications", app, "revisions", revision, "metadata"]);
        }
        url
    }
}

#[async_trait]
impl RevisionMetadataSource for ArgoRevisions {
    async fn fetch(&self, app: &str, revision: &str) -> Result<RevisionMetadata> {
        let url = self.metadata_url(app, revision);
        let mut req = self.http.get(url.clone());
        if let Some(t) = &self.token {
            req = req.bearer_auth(t);
        }
        let body: ArgoRevisionMetadata = req
            .send()
            .await
            .with_context(|| format!("requesting {}", url))?
            .error_for_status()
            .with_context(|| format!("revision metadata for {}@{}", app, revision))?
            .json()
            .await
            .context("decoding revision metadata")?;
        Ok(RevisionMetadata { author: body.author, message: body.message })
    }
}

/// Stand-in when no Argo CD endpoint is configured: every revision has blank metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

#[async_trait]
impl RevisionMetadataSource for Unconfigured {
    async fn fetch(&self, _app: &str, _revision: &str) -> Result<RevisionMetadata> {
        Ok(RevisionMetadata::default())
    }
}
