//! Declared configuration read from the manifest repository (`pipelines.yaml`).

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse declared configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub gitops_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<Environment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<Application>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<DeclaredService>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeclaredService {
    pub name: String,
    #[serde(default)]
    pub source_url: String,
}

impl Config {
    pub fn from_yaml(body: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_slice(body)?)
    }

    /// First environment with a matching name.
    pub fn find_environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.name == name)
    }
}

impl Environment {
    /// First declared service with a matching name, across all apps of the environment.
    pub fn find_service(&self, name: &str) -> Option<&DeclaredService> {
        self.apps.iter().flat_map(|a| a.services.iter()).find(|s| s.name == name)
    }

    pub fn find_app(&self, name: &str) -> Option<&Application> {
        self.apps.iter().find(|a| a.name == name)
    }
}
