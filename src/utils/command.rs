//! Command execution primitives with consistent error handling.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde::Serialize;

use crate::error::{Error, Result, ToolCommandFailedDetails};

/// How a child process's stdout/stderr are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Stream to the parent's terminal; output is not retained.
    Inherit,
    /// Collect stdout and stderr into the returned `CommandOutput`.
    Collect,
}

/// A single subprocess call: program, argument vector, and extra environment.
///
/// Arguments are passed straight to the program; nothing is interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<String>,
    pub capture: Capture,
    /// Indices into `args` whose values are masked in `display()` output.
    pub secret_args: Vec<usize>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
            capture: Capture::Inherit,
            secret_args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &[(String, String)]) -> Self {
        self.env.extend(env.iter().cloned());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Append an argument whose value must not appear in `display()`.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = Capture::Collect;
        self
    }

    /// Program and arguments joined with spaces, for display only.
    ///
    /// Secret arguments keep a `name=` prefix; the value is masked.
    pub fn display(&self) -> String {
        let args = self.args.iter().enumerate().map(|(index, arg)| {
            if !self.secret_args.contains(&index) {
                return arg.clone();
            }
            match arg.split_once('=') {
                Some((name, _)) => format!("{}=********", name),
                None => "********".to_string(),
            }
        });

        std::iter::once(self.program.clone())
            .chain(args)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            exit_code: 0,
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
            exit_code,
        }
    }

    /// Convert a failed output into a `tool.command_failed` error for `step`.
    pub fn require_success(self, step: &str, invocation: &Invocation) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        Err(Error::tool_command_failed(self.into_failure(step, invocation)))
    }

    pub fn into_failure(self, step: &str, invocation: &Invocation) -> ToolCommandFailedDetails {
        ToolCommandFailedDetails {
            step: step.to_string(),
            command: invocation.display(),
            exit_code: self.exit_code,
            stdout: self.stdout.trim().to_string(),
            stderr: self.stderr.trim().to_string(),
        }
    }
}

/// Seam for spawning processes. Steps never touch `std::process` directly.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> CommandOutput;
}

/// Runs invocations as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> CommandOutput {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if invocation.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        }

        match invocation.capture {
            Capture::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            Capture::Collect => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandOutput::failed(
                    -1,
                    format!("Failed to run {}: {}", invocation.program, e),
                )
            }
        };

        if let (Some(input), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
            if let Err(e) = stdin.write_all(input.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return CommandOutput::failed(-1, format!("Failed to write stdin: {}", e));
            }
        }

        match child.wait_with_output() {
            Ok(out) => from_output(&out),
            Err(e) => CommandOutput::failed(-1, format!("Command error: {}", e)),
        }
    }
}

fn from_output(out: &Output) -> CommandOutput {
    CommandOutput {
        stdout: String::from_utf8_lossy(&out.stdout).to_string(),
        stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        success: out.status.success(),
        exit_code: out.status.code().unwrap_or(-1),
    }
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &CommandOutput) -> String {
    if !output.stderr.trim().is_empty() {
        output.stderr.trim().to_string()
    } else {
        output.stdout.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_collects_stdout() {
        let output = SystemRunner.run(&Invocation::new("echo").arg("hello").captured());
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn run_reports_missing_program() {
        let output = SystemRunner.run(&Invocation::new("nonexistent_command_xyz").captured());
        assert!(!output.success);
        assert_eq!(output.exit_code, -1);
        assert!(output.stderr.contains("nonexistent_command_xyz"));
    }

    #[test]
    fn run_passes_env_and_stdin() {
        let output = SystemRunner.run(
            &Invocation::new("sh")
                .args(["-c", "read line; echo \"$GREETING $line\""])
                .envs(&[("GREETING".to_string(), "hi".to_string())])
                .stdin("there\n")
                .captured(),
        );
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hi there");
    }

    #[test]
    fn run_reports_exit_code() {
        let output = SystemRunner.run(&Invocation::new("sh").args(["-c", "exit 7"]).captured());
        assert!(!output.success);
        assert_eq!(output.exit_code, 7);
    }

    #[test]
    fn require_success_builds_tool_error() {
        let invocation = Invocation::new("scanpipe").args(["migrate", "--verbosity", "0"]);
        let err = CommandOutput::failed(2, "  bad database \n")
            .require_success("Migrations", &invocation)
            .unwrap_err();
        assert_eq!(err.code.as_str(), "tool.command_failed");
        assert_eq!(err.details["command"], "scanpipe migrate --verbosity 0");
        assert_eq!(err.details["stderr"], "bad database");
    }

    #[test]
    fn display_masks_secrets() {
        let invocation = Invocation::new("psql")
            .args(["-v", "db_password=hunter2"]);
        let masked = Invocation::new("psql")
            .arg("-v")
            .secret_arg("db_password=hunter2");
        assert_eq!(invocation.display(), "psql -v db_password=hunter2");
        assert_eq!(masked.display(), "psql -v db_password=********");
        assert_eq!(masked.args[1], "db_password=hunter2");
    }

    #[test]
    fn display_masks_only_the_secret_argument() {
        let invocation = Invocation::new("psql")
            .args(["-v", "db_user=scancodeio", "-v"])
            .secret_arg("db_password=scancodeio")
            .secret_arg("bare-token");
        assert_eq!(
            invocation.display(),
            "psql -v db_user=scancodeio -v db_password=******** ********"
        );
    }

    #[test]
    fn error_text_prefers_stderr() {
        let output = CommandOutput {
            stdout: "stdout content".to_string(),
            stderr: "stderr content".to_string(),
            success: false,
            exit_code: 1,
        };
        assert_eq!(error_text(&output), "stderr content");
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let output = CommandOutput {
            stdout: "stdout content".to_string(),
            stderr: String::new(),
            success: false,
            exit_code: 1,
        };
        assert_eq!(error_text(&output), "stdout content");
    }
}
