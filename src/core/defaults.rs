use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths;
use crate::utils::io;

/// Root configuration structure for scanflow.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanflowConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Program names and constants used to build tool invocations.
/// Every field can be overridden via scanflow.json.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub database: DatabaseServiceConfig,

    #[serde(default)]
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_tool_program")]
    pub program: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: default_tool_program(),
        }
    }
}

/// How the PostgreSQL service and its admin account are reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseServiceConfig {
    #[serde(default = "default_sudo")]
    pub sudo: String,

    #[serde(default = "default_systemctl")]
    pub systemctl: String,

    #[serde(default = "default_service")]
    pub service: String,

    #[serde(default = "default_admin_user")]
    pub admin_user: String,
}

impl Default for DatabaseServiceConfig {
    fn default() -> Self {
        Self {
            sudo: default_sudo(),
            systemctl: default_systemctl(),
            service: default_service(),
            admin_user: default_admin_user(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_pip")]
    pub pip: String,

    #[serde(default = "default_package")]
    pub package: String,

    #[serde(default = "default_repo_url")]
    pub repo_url: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            pip: default_pip(),
            package: default_package(),
            repo_url: default_repo_url(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_tool_program() -> String {
    "scanpipe".to_string()
}

fn default_sudo() -> String {
    "sudo".to_string()
}

fn default_systemctl() -> String {
    "systemctl".to_string()
}

fn default_service() -> String {
    "postgresql.service".to_string()
}

fn default_admin_user() -> String {
    "postgres".to_string()
}

fn default_pip() -> String {
    "pip".to_string()
}

fn default_package() -> String {
    "scancodeio".to_string()
}

fn default_repo_url() -> String {
    "https://github.com/aboutcode-org/scancode.io.git".to_string()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
/// If scanflow.json is missing or invalid, silently returns built-in defaults.
pub fn load_defaults() -> Defaults {
    paths::scanflow_json()
        .and_then(|path| load_config_from(&path))
        .map(|config| config.defaults)
        .unwrap_or_default()
}

/// Load a scanflow.json file at `path`.
pub fn load_config_from(path: &Path) -> Result<ScanflowConfig> {
    if !path.exists() {
        return Err(Error::internal_io(
            format!("{} not found", path.display()),
            Some("read scanflow.json".to_string()),
        ));
    }

    let content = io::read_file(path, "read scanflow.json")?;

    serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}
