//! Settings loaded from the JSON configuration file
//!
//! The file is read once at startup and the resulting [`Settings`] are passed
//! by reference to everything that needs them.

use crate::error::{DevhubError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Restart policy applied to workspace containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    No,
    Always,
    UnlessStopped,
    OnFailure,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy::Always
    }
}

impl std::fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartPolicy::No => write!(f, "no"),
            RestartPolicy::Always => write!(f, "always"),
            RestartPolicy::UnlessStopped => write!(f, "unless-stopped"),
            RestartPolicy::OnFailure => write!(f, "on-failure"),
        }
    }
}

/// Secondary application port, routed on `<name>-<suffix>.<base_domain>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPort {
    /// Container port of the application
    pub port: u16,
    /// Subdomain suffix appended to the workspace name
    pub suffix: String,
}

/// Process-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Domain appended to workspace names to form hostnames
    pub base_domain: String,
    /// Memory ceiling, docker style (`512m`, `2g`, ...)
    pub mem_limit: String,
    /// CPU share in units of 1e-9 CPUs
    pub nano_cpus: i64,
    /// Maximum number of processes inside a workspace
    pub pids_limit: i64,
    /// Image every workspace is created from
    #[serde(default = "default_image")]
    pub image: String,
    /// Pre-existing network shared with the reverse proxy
    #[serde(default = "default_network")]
    pub network: String,
    /// Restart policy for workspace containers
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    /// Host directory holding one project directory per workspace
    #[serde(default = "default_workspace_root")]
    pub workspace_root: String,
    /// Where the project directory is mounted inside the container
    #[serde(default = "default_project_path")]
    pub project_path: String,
    /// Port of the primary service inside the container
    #[serde(default = "default_service_port")]
    pub service_port: u16,
    /// Reverse proxy entry point the routers attach to
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
    /// Length of generated passwords
    #[serde(default = "default_password_length")]
    pub password_length: usize,
    /// Optional secondary application port
    #[serde(default)]
    pub app: Option<AppPort>,
}

fn default_image() -> String {
    "codercom/code-server:latest".to_string()
}

fn default_network() -> String {
    "devnet".to_string()
}

fn default_workspace_root() -> String {
    "/home/code".to_string()
}

fn default_project_path() -> String {
    "/home/coder/project".to_string()
}

fn default_service_port() -> u16 {
    8080
}

fn default_entrypoint() -> String {
    "web".to_string()
}

fn default_password_length() -> usize {
    crate::password::DEFAULT_PASSWORD_LENGTH
}

impl Settings {
    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DevhubError::ConfigNotFound(path.to_path_buf()),
            _ => DevhubError::Io(e),
        })?;

        let settings = Self::from_json(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every value that is used when creating containers
    pub fn validate(&self) -> Result<()> {
        if self.base_domain.trim().is_empty() {
            return Err(DevhubError::InvalidConfig(
                "base_domain must not be empty".to_string(),
            ));
        }

        self.memory_bytes()?;

        if self.nano_cpus <= 0 {
            return Err(DevhubError::InvalidConfig(format!(
                "nano_cpus must be positive, got {}",
                self.nano_cpus
            )));
        }

        if self.pids_limit <= 0 {
            return Err(DevhubError::InvalidConfig(format!(
                "pids_limit must be positive, got {}",
                self.pids_limit
            )));
        }

        if self.service_port == 0 {
            return Err(DevhubError::InvalidConfig(
                "service_port must not be 0".to_string(),
            ));
        }

        if self.password_length == 0 {
            return Err(DevhubError::InvalidConfig(
                "password_length must not be 0".to_string(),
            ));
        }

        if let Some(app) = &self.app {
            if app.port == 0 {
                return Err(DevhubError::InvalidConfig("app.port must not be 0".to_string()));
            }
            if app.suffix.is_empty() {
                return Err(DevhubError::InvalidConfig(
                    "app.suffix must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Memory limit converted to bytes
    pub fn memory_bytes(&self) -> Result<i64> {
        parse_memory(&self.mem_limit)
    }
}

/// Parse a docker style memory string (`512m`, `1g`, `1048576`) into bytes
pub fn parse_memory(value: &str) -> Result<i64> {
    let value = value.trim();
    let invalid = || DevhubError::InvalidConfig(format!("invalid mem_limit '{}'", value));

    let (digits, multiplier) = match value.chars().last() {
        Some(c) if c.is_ascii_digit() => (value, 1),
        Some(c) => {
            let multiplier = match c.to_ascii_lowercase() {
                'b' => 1,
                'k' => 1024,
                'm' => 1024 * 1024,
                'g' => 1024 * 1024 * 1024,
                _ => return Err(invalid()),
            };
            (&value[..value.len() - c.len_utf8()], multiplier)
        }
        None => return Err(invalid()),
    };

    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    match amount.checked_mul(multiplier) {
        Some(bytes) if bytes > 0 => Ok(bytes),
        _ => Err(invalid()),
    }
}
