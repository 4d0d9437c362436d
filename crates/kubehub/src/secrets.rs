//! Secret values through the kube API.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use gitdeck_core::sources::SecretSource;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;

use crate::get_kube_client;

#[derive(Debug, Clone, Default)]
pub struct KubeSecrets;

impl KubeSecrets {
    pub fn new() -> Self {
        Self
    }
}

/// Pull `key` out of a secret's data as UTF-8.
pub fn secret_data(secret: &Secret, key: &str) -> Result<String> {
    let name = secret.metadata.name.as_deref().unwrap_or("");
    let ns = secret.metadata.namespace.as_deref().unwrap_or("");
    let bytes = secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .ok_or_else(|| anyhow!("secret invalid, no {:?} key in {}/{}", key, ns, name))?;
    String::from_utf8(bytes.0.clone()).with_context(|| format!("secret {}/{} key {:?} is not UTF-8", ns, name, key))
}

#[async_trait]
impl SecretSource for KubeSecrets {
    async fn secret_value(&self, namespace: &str, name: &str, key: &str) -> Result<String> {
        let client = get_kube_client().await?;
        let api: Api<Secret> = Api::namespaced(client, namespace);
        let secret = api
            .get(name)
            .await
            .with_context(|| format!("error getting secret {}/{}", namespace, name))?;
        secret_data(&secret, key)
    }
}
