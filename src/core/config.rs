//! Run configuration for the scan pipeline.
//!
//! Built once (from CLI arguments or `RunnerConfig::default`) and only ever
//! borrowed afterwards.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

pub const DEFAULT_PROJECT_NAME: &str = "scancode-project";
pub const DEFAULT_PIPELINE: &str = "scan_codebase";
pub const DEFAULT_OUTPUT_FORMATS: &[&str] = &["json", "xlsx", "spdx", "cyclonedx"];
pub const DEFAULT_DB_VALUE: &str = "scancodeio";

/// Severity at which `check-compliance` reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailLevel {
    #[default]
    Error,
    Warning,
    Missing,
}

impl FailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailLevel::Error => "ERROR",
            FailLevel::Warning => "WARNING",
            FailLevel::Missing => "MISSING",
        }
    }
}

impl fmt::Display for FailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ERROR" => Ok(FailLevel::Error),
            "WARNING" => Ok(FailLevel::Warning),
            "MISSING" => Ok(FailLevel::Missing),
            other => Err(Error::validation_invalid_argument(
                "compliance_fail_level",
                format!("Unknown fail level '{}'", other),
                Some(vec![
                    "ERROR".to_string(),
                    "WARNING".to_string(),
                    "MISSING".to_string(),
                ]),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DB_VALUE.to_string(),
            user: DEFAULT_DB_VALUE.to_string(),
            password: DEFAULT_DB_VALUE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    pub project_name: String,
    pub pipelines: Vec<String>,
    pub output_formats: Vec<String>,
    pub inputs_path: Option<PathBuf>,
    pub input_urls: Vec<String>,
    pub check_compliance: bool,
    pub compliance_fail_level: FailLevel,
    pub compliance_fail_on_vulnerabilities: bool,
    pub repo_branch: Option<String>,
    pub database: DatabaseConfig,
    /// Pre-existing secret key; one is generated at run time when absent.
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            pipelines: vec![DEFAULT_PIPELINE.to_string()],
            output_formats: DEFAULT_OUTPUT_FORMATS.iter().map(|f| f.to_string()).collect(),
            inputs_path: None,
            input_urls: Vec::new(),
            check_compliance: false,
            compliance_fail_level: FailLevel::default(),
            compliance_fail_on_vulnerabilities: false,
            repo_branch: None,
            database: DatabaseConfig::default(),
            secret_key: None,
        }
    }
}

impl RunnerConfig {
    /// Reject configurations no step could run with.
    pub fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(Error::validation_invalid_argument(
                "project_name",
                "Project name cannot be empty",
                None,
            ));
        }
        if self.pipelines.iter().all(|p| p.trim().is_empty()) {
            return Err(Error::validation_invalid_argument(
                "pipelines",
                "At least one pipeline is required",
                None,
            ));
        }
        for (key, value) in [
            ("db_name", &self.database.name),
            ("db_user", &self.database.user),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config_invalid_value(
                    key,
                    None,
                    "Database name and user cannot be empty",
                ));
            }
        }
        Ok(())
    }
}
