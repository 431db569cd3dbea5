use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// EnvironmentConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub id: String,
    pub label: String,
    /// Environments flagged as prod are only created by `provision-prod`.
    #[serde(default)]
    pub prod: bool,
}

fn default_environments() -> Vec<EnvironmentConfig> {
    vec![
        EnvironmentConfig {
            id: "dev".to_string(),
            label: "Development".to_string(),
            prod: false,
        },
        EnvironmentConfig {
            id: "sit".to_string(),
            label: "Integration".to_string(),
            prod: false,
        },
        EnvironmentConfig {
            id: "uat".to_string(),
            label: "User Acceptance".to_string(),
            prod: false,
        },
        EnvironmentConfig {
            id: "prod".to_string(),
            label: "Production".to_string(),
            prod: true,
        },
    ]
}

// ---------------------------------------------------------------------------
// OpsConfig
// ---------------------------------------------------------------------------

/// Process-wide configuration, loaded once at startup and threaded explicitly
/// into every constructor that needs it. Nothing reads config ambiently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    /// Prefix users type to address the console (e.g. "ops create team").
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    #[serde(default)]
    pub services: ServiceConfig,

    /// Clouds a team may be placed on. A single entry resolves without
    /// prompting.
    #[serde(default = "default_clouds")]
    pub clouds: Vec<String>,

    #[serde(default = "default_environments")]
    pub environments: Vec<EnvironmentConfig>,
}

fn default_command_prefix() -> String {
    "ops".to_string()
}

fn default_clouds() -> Vec<String> {
    vec!["community".to_string()]
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            services: ServiceConfig::default(),
            clouds: default_clouds(),
            environments: default_environments(),
        }
    }
}

impl OpsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: OpsConfig = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    /// Non-fatal sanity checks, reported rather than enforced.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.clouds.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "no clouds configured: team creation cannot resolve a cloud"
                    .to_string(),
            });
        }
        if self.environments.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no environments configured: project provisioning creates none"
                    .to_string(),
            });
        }
        if !self.services.base_url.starts_with("http") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "services.base_url '{}' is not an http(s) URL",
                    self.services.base_url
                ),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for env in &self.environments {
            if !seen.insert(env.id.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("duplicate environment id '{}'", env.id),
                });
            }
        }

        warnings
    }

    pub fn prod_environments(&self) -> impl Iterator<Item = &EnvironmentConfig> {
        self.environments.iter().filter(|e| e.prod)
    }

    pub fn nonprod_environments(&self) -> impl Iterator<Item = &EnvironmentConfig> {
        self.environments.iter().filter(|e| !e.prod)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
