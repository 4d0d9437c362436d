//! Manifest rendering: shallow git clone into a scratch directory + `kustomize build`.

use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use gitdeck_core::sources::{ManifestResolver, RepoSpec};
use reqwest::Url;
use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

/// Username paired with the repository token for HTTP basic auth.
const GIT_USERNAME: &str = "gitops";

#[derive(Debug, Clone)]
pub struct KustomizeResolver {
    git_bin: String,
    kustomize_bin: String,
    scratch: PathBuf,
}

impl Default for KustomizeResolver {
    fn default() -> Self {
        Self::new("git", "kustomize")
    }
}

/// A cloned working tree.
///
/// Callers remove it with [`Checkout::remove`]; a checkout dropped early (error,
/// cancellation) is removed on the blocking pool instead of the async worker.
struct Checkout {
    dir: PathBuf,
    removed: bool,
}

fn remove_checkout(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        debug!(dir = %dir.display(), error = %e, "failed to remove checkout");
    }
}

impl Checkout {
    fn new(dir: PathBuf) -> Self {
        Self { dir, removed: false }
    }

    async fn remove(mut self) {
        self.removed = true;
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            debug!(dir = %self.dir.display(), error = %e, "failed to remove checkout");
        }
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        let dir = std::mem::take(&mut self.dir);
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                rt.spawn_blocking(move || remove_checkout(&dir));
            }
            Err(_) => remove_checkout(&dir),
        }
    }
}

/// Clone URL with the token injected as basic-auth credentials.
pub fn clone_url(repo: &RepoSpec) -> Result<String> {
    let Some(token) = repo.token.as_deref().filter(|t| !t.is_empty()) else {
        return Ok(repo.url.clone());
    };
    let mut url = Url::parse(&repo.url).with_context(|| format!("failed to parse repo URL {:?}", repo.url))?;
    url.set_username(GIT_USERNAME).map_err(|_| anyhow!("repo URL {:?} cannot carry credentials", repo.url))?;
    url.set_password(Some(token)).map_err(|_| anyhow!("repo URL {:?} cannot carry credentials", repo.url))?;
    Ok(url.to_string())
}

/// Reject absolute paths and parent traversal; the result stays inside the checkout.
pub fn repo_relative(path: &str) -> Result<PathBuf> {
    let p = Path::new(path);
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::Normal(seg) => out.push(seg),
            Component::CurDir => {}
            _ => bail!("path {:?} must be relative to the repository root", path),
        }
    }
    Ok(out)
}

fn redact(msg: &str, repo: &RepoSpec) -> String {
    match repo.token.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => msg.replace(t, "****"),
        None => msg.to_string(),
    }
}

impl KustomizeResolver {
    pub fn new(git_bin: impl Into<String>, kustomize_bin: impl Into<String>) -> Self {
        Self { git_bin: git_bin.into(), kustomize_bin: kustomize_bin.into(), scratch: std::env::temp_dir() }
    }

    pub fn with_scratch(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch = dir.into();
        self
    }

    async fn checkout(&self, repo: &RepoSpec) -> Result<Checkout> {
        let t0 = Instant::now();
        let dir = self.scratch.join(format!("gitdeck-{}", Uuid::new_v4()));
        let checkout = Checkout::new(dir);
        let out = Command::new(&self.git_bin)
            .args(["clone", "--depth", "1", "--quiet"])
            .arg(clone_url(repo)?)
            .arg(&checkout.dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .with_context(|| format!("running {}", self.git_bin))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            bail!("git clone of {} failed: {}", repo.url, redact(stderr.trim(), repo));
        }
        info!(repo = %repo.url, took_ms = %t0.elapsed().as_millis(), "repository cloned");
        Ok(checkout)
    }

    async fn build(&self, target: &Path, path: &str) -> Result<String> {
        let out = Command::new(&self.kustomize_bin)
            .arg("build")
            .arg(target)
            .output()
            .await
            .with_context(|| format!("running {}", self.kustomize_bin))?;
        if !out.status.success() {
            bail!("kustomize build {} failed: {}", path, String::from_utf8_lossy(&out.stderr).trim());
        }
        String::from_utf8(out.stdout).context("kustomize output is not UTF-8")
    }
}

#[async_trait]
impl ManifestResolver for KustomizeResolver {
    async fn resolve(&self, repo: &RepoSpec, path: &str) -> Result<Vec<serde_json::Value>> {
        let rel = repo_relative(path)?;
        let checkout = self.checkout(repo).await?;
        let rendered = self.build(&checkout.dir.join(&rel), path).await;
        checkout.remove().await;
        let objects = gitdeck_parser::split_rendered(&rendered?).with_context(|| format!("parsing rendered {}", path))?;
        debug!(path = %path, objects = objects.len(), "manifests rendered");
        Ok(objects)
    }

    async fn read_file(&self, repo: &RepoSpec, path: &str) -> Result<Vec<u8>> {
        let rel = repo_relative(path)?;
        let checkout = self.checkout(repo).await?;
        let body = tokio::fs::read(checkout.dir.join(&rel)).await;
        checkout.remove().await;
        body.with_context(|| format!("reading {} from {}", path, repo.url))
    }
}
