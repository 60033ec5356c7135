use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Hint};

/// Outcome of a single step.
///
/// `Failed` is fatal: the driver stops after recording it. `Tolerated` means
/// the step finished but some of its work failed in a way later steps do not
/// depend on.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Tolerated,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub id: String,
    pub label: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn new(id: &str, label: &str, status: StepStatus) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            status,
            warnings: Vec::new(),
            hints: Vec::new(),
            data: None,
            error: None,
        }
    }

    pub fn failed(id: &str, label: &str, err: &Error) -> Self {
        Self {
            hints: err.hints.clone(),
            error: Some(err.message.clone()),
            ..Self::new(id, label, StepStatus::Failed)
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// The fatal error that stopped a run, in serializable form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFailure {
    pub step: String,
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl RunFailure {
    pub fn new(step: &str, err: &Error) -> Self {
        Self {
            step: step.to_string(),
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub tolerated: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub project: String,
    pub status: RunStatus,
    pub steps: Vec<StepReport>,
    pub summary: RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub fn derive_status(steps: &[StepReport]) -> RunStatus {
    if steps.iter().any(|s| s.status == StepStatus::Failed) {
        return RunStatus::Failed;
    }
    if steps.iter().any(|s| s.status == StepStatus::Tolerated) {
        return RunStatus::PartialSuccess;
    }
    RunStatus::Success
}

pub fn build_summary(steps: &[StepReport], status: RunStatus) -> RunSummary {
    let count = |wanted: StepStatus| steps.iter().filter(|s| s.status == wanted).count();

    let next_actions = match status {
        RunStatus::Failed => vec![
            "Fix the failing step and re-run; completed setup steps may need cleanup first"
                .to_string(),
        ],
        RunStatus::PartialSuccess => {
            vec!["Inspect step warnings for output formats that were not generated".to_string()]
        }
        RunStatus::Success => Vec::new(),
    };

    RunSummary {
        total_steps: steps.len(),
        succeeded: count(StepStatus::Success),
        tolerated: count(StepStatus::Tolerated),
        skipped: count(StepStatus::Skipped),
        failed: count(StepStatus::Failed),
        next_actions,
    }
}
