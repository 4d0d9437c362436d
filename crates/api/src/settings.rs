//! Runtime configuration read from `GITDECK_*` environment variables.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Namespace holding the Argo CD `Application` objects.
    pub argocd_namespace: String,
    /// Argo CD server for revision metadata; unset leaves history authors blank.
    pub argocd_url: Option<String>,
    pub argocd_token: Option<String>,
    /// Skip TLS verification when talking to Argo CD.
    pub insecure: bool,
    /// `namespace/name` of the secret holding the manifest repository token.
    pub repo_secret: Option<String>,
    pub git_bin: String,
    pub kustomize_bin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            argocd_namespace: "argocd".to_string(),
            argocd_url: None,
            argocd_token: None,
            insecure: false,
            repo_secret: None,
            git_bin: "git".to_string(),
            kustomize_bin: "kustomize".to_string(),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        let d = Self::default();
        Self {
            argocd_namespace: get("GITDECK_ARGOCD_NAMESPACE").unwrap_or(d.argocd_namespace),
            argocd_url: get("GITDECK_ARGOCD_URL"),
            argocd_token: get("GITDECK_ARGOCD_TOKEN"),
            insecure: get("GITDECK_INSECURE").and_then(|s| parse_bool(&s)).unwrap_or(d.insecure),
            repo_secret: get("GITDECK_REPO_SECRET"),
            git_bin: get("GITDECK_GIT_BIN").unwrap_or(d.git_bin),
            kustomize_bin: get("GITDECK_KUSTOMIZE_BIN").unwrap_or(d.kustomize_bin),
        }
    }

    /// `repo_secret` split into `(namespace, name)`.
    pub fn repo_secret_ref(&self) -> Option<(String, String)> {
        let (ns, name) = self.repo_secret.as_deref()?.split_once('/')?;
        if ns.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((ns.to_string(), name.to_string()))
    }
}
