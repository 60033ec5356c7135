use serde::{Deserialize, Serialize};
use serde_json::Value;

mod codes;

pub use codes::{all_codes, parse_code};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,

    ToolCommandFailed,
    ToolWorkDirectoryNotFound,
    ComplianceCheckFailed,

    HttpRequestFailed,
    HttpInvalidResponse,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::ToolCommandFailed => "tool.command_failed",
            ErrorCode::ToolWorkDirectoryNotFound => "tool.work_directory_not_found",
            ErrorCode::ComplianceCheckFailed => "compliance.check_failed",

            ErrorCode::HttpRequestFailed => "http.request_failed",
            ErrorCode::HttpInvalidResponse => "http.invalid_response",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

/// Details for a subprocess that exited unsuccessfully (or never started).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCommandFailedDetails {
    pub step: String,
    pub command: String,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpFailureDetails {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
                tried,
            }),
        )
    }

    pub fn config_missing_key(key: impl Into<String>, env: Option<String>) -> Self {
        let hint = env
            .as_ref()
            .map(|var| format!("Set the {} environment variable", var));
        let err = Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            to_details(ConfigMissingKeyDetails {
                key: key.into(),
                env,
            }),
        );
        match hint {
            Some(hint) => err.with_hint(hint),
            None => err,
        }
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn tool_command_failed(details: ToolCommandFailedDetails) -> Self {
        let message = format!("{} failed (exit code {})", details.step, details.exit_code);
        Self::new(ErrorCode::ToolCommandFailed, message, to_details(details))
    }

    pub fn work_directory_not_found(project: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ToolWorkDirectoryNotFound,
            "Could not find work directory in status output",
            serde_json::json!({ "project": project.into() }),
        )
        .with_hint("Check that the project was created and 'scanpipe status' prints 'Work directory:'")
    }

    pub fn compliance_failed(details: ToolCommandFailedDetails) -> Self {
        Self::new(
            ErrorCode::ComplianceCheckFailed,
            "Compliance check failed",
            to_details(details),
        )
    }

    pub fn http_request_failed(url: impl Into<String>, err: reqwest::Error) -> Self {
        let retryable = err.is_timeout() || err.is_connect();
        let mut error = Self::new(
            ErrorCode::HttpRequestFailed,
            format!("HTTP request failed: {}", err),
            to_details(HttpFailureDetails {
                url: url.into(),
                status: err.status().map(|s| s.as_u16()),
                body: None,
                error: err.to_string(),
            }),
        );
        error.retryable = Some(retryable);
        error
    }

    pub fn http_status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::HttpRequestFailed,
            format!("API error: HTTP {}", status),
            to_details(HttpFailureDetails {
                url: url.into(),
                status: Some(status),
                body: Some(body.into()),
                error: format!("unexpected status {}", status),
            }),
        )
    }

    pub fn http_invalid_response(
        url: impl Into<String>,
        problem: impl Into<String>,
        body: Option<String>,
    ) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::HttpInvalidResponse,
            format!("Invalid API response: {}", problem),
            to_details(HttpFailureDetails {
                url: url.into(),
                status: None,
                body,
                error: problem,
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
