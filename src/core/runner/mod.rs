//! Fail-fast sequencer that drives `scanpipe` through a full CI run.
//!
//! Each step method performs one externally visible action. A step either
//! returns a `StepReport` (success, skipped, or tolerated) or a fatal
//! `Error`; `run_full` records the error as a failed step and stops.

mod environment;
pub mod invocations;

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::config::RunnerConfig;
use crate::defaults::Defaults;
use crate::error::{Error, Result};
use crate::log_status;
use crate::pipeline::{
    build_summary, derive_status, RunFailure, RunReport, StepReport, StepStatus,
};
use crate::utils::command::{error_text, CommandOutput, CommandRunner, Invocation};
use crate::utils::io::{self, FileEntry};
use crate::utils::parser;

pub use environment::{
    generate_secret_key, RunEnvironment, DB_NAME_VAR, DB_PASSWORD_VAR, DB_USER_VAR,
    SECRET_KEY_VAR,
};

const WORK_DIRECTORY_MARKER: &str = "Work directory:";

/// Steps in the order `run_full` executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SetupEnvironment,
    SetupDatabase,
    InstallTool,
    RunMigrations,
    CreateProject,
    DiscoverWorkDirectory,
    CopyInputs,
    ExecutePipelines,
    GenerateOutputs,
    CheckCompliance,
}

impl Step {
    pub const ALL: [Step; 10] = [
        Step::SetupEnvironment,
        Step::SetupDatabase,
        Step::InstallTool,
        Step::RunMigrations,
        Step::CreateProject,
        Step::DiscoverWorkDirectory,
        Step::CopyInputs,
        Step::ExecutePipelines,
        Step::GenerateOutputs,
        Step::CheckCompliance,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Step::SetupEnvironment => "setup_environment",
            Step::SetupDatabase => "setup_database",
            Step::InstallTool => "install",
            Step::RunMigrations => "migrate",
            Step::CreateProject => "create_project",
            Step::DiscoverWorkDirectory => "work_directory",
            Step::CopyInputs => "copy_inputs",
            Step::ExecutePipelines => "execute",
            Step::GenerateOutputs => "generate_outputs",
            Step::CheckCompliance => "check_compliance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::SetupEnvironment => "Environment setup",
            Step::SetupDatabase => "PostgreSQL setup",
            Step::InstallTool => "ScanCode.io installation",
            Step::RunMigrations => "Migrations",
            Step::CreateProject => "Project creation",
            Step::DiscoverWorkDirectory => "Work directory discovery",
            Step::CopyInputs => "Input copy",
            Step::ExecutePipelines => "Pipeline execution",
            Step::GenerateOutputs => "Output generation",
            Step::CheckCompliance => "Compliance check",
        }
    }

    fn report(&self, status: StepStatus) -> StepReport {
        StepReport::new(self.id(), self.label(), status)
    }
}

/// Result of one `scanpipe output` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatResult {
    pub format: String,
    pub success: bool,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

pub struct PipelineRunner<'a> {
    config: &'a RunnerConfig,
    defaults: &'a Defaults,
    commands: &'a dyn CommandRunner,
    environment: Option<RunEnvironment>,
    work_directory: OnceCell<PathBuf>,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(
        config: &'a RunnerConfig,
        defaults: &'a Defaults,
        commands: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            config,
            defaults,
            commands,
            environment: None,
            work_directory: OnceCell::new(),
        }
    }

    pub fn environment(&self) -> Result<&RunEnvironment> {
        self.environment.as_ref().ok_or_else(|| {
            Error::internal_unexpected("Environment has not been set up")
                .with_hint("Run the environment setup step first")
        })
    }

    pub fn work_directory(&self) -> Result<&Path> {
        self.work_directory
            .get()
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                Error::internal_unexpected("Work directory has not been discovered")
                    .with_hint("Run the work directory discovery step first")
            })
    }

    pub fn output_path(&self) -> Result<PathBuf> {
        Ok(self.work_directory()?.join("output"))
    }

    /// Run every step in order, stopping at the first fatal failure.
    pub fn run_full(&mut self) -> RunReport {
        let started_at = Utc::now();
        log_status!("run", "Starting ScanCode pipeline for '{}'", self.config.project_name);

        let mut steps = Vec::with_capacity(Step::ALL.len());
        let mut failure = None;

        for step in Step::ALL {
            match self.run_step(step) {
                Ok(report) => steps.push(report),
                Err(err) => {
                    log_status!("run", "{} failed: {}", step.label(), err);
                    steps.push(StepReport::failed(step.id(), step.label(), &err));
                    failure = Some(RunFailure::new(step.id(), &err));
                    break;
                }
            }
        }

        let status = derive_status(&steps);
        let summary = build_summary(&steps, status);
        let output_path = self.output_path().ok().map(|p| p.display().to_string());

        if failure.is_none() {
            log_status!("run", "Pipeline completed successfully!");
            if let Some(path) = &output_path {
                log_status!("run", "Output files available at: {}", path);
            }
        }

        RunReport {
            project: self.config.project_name.clone(),
            status,
            steps,
            summary,
            work_directory: self
                .work_directory
                .get()
                .map(|p| p.display().to_string()),
            output_path,
            failure,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn run_step(&mut self, step: Step) -> Result<StepReport> {
        match step {
            Step::SetupEnvironment => self.setup_environment(),
            Step::SetupDatabase => self.setup_database(),
            Step::InstallTool => self.install_tool(),
            Step::RunMigrations => self.run_migrations(),
            Step::CreateProject => self.create_project(),
            Step::DiscoverWorkDirectory => self.discover_work_directory(),
            Step::CopyInputs => self.copy_inputs(),
            Step::ExecutePipelines => self.execute_pipelines(),
            Step::GenerateOutputs => self.generate_outputs(),
            Step::CheckCompliance => self.check_compliance(),
        }
    }

    pub fn setup_environment(&mut self) -> Result<StepReport> {
        log_status!("env", "Setting up environment...");
        let environment = RunEnvironment::from_config(self.config);

        let report = Step::SetupEnvironment.report(StepStatus::Success).with_data(json!({
            "dbName": environment.db_name,
            "dbUser": environment.db_user,
            "secretKeyGenerated": environment.secret_key_generated,
        }));

        self.environment = Some(environment);
        Ok(report)
    }

    pub fn setup_database(&mut self) -> Result<StepReport> {
        log_status!("db", "Setting up PostgreSQL...");
        let step = Step::SetupDatabase;
        let db = &self.defaults.database;
        let user = self.config.database.user.as_str();
        let name = self.config.database.name.as_str();

        let sequence = [
            invocations::start_database_service(db),
            invocations::create_role(db, user),
            invocations::set_role_password(db, user, &self.config.database.password),
            invocations::create_database(db, user, name),
        ];
        for invocation in &sequence {
            self.run_required(step, invocation)?;
        }

        Ok(step.report(StepStatus::Success).with_data(json!({
            "database": name,
            "owner": user,
        })))
    }

    pub fn install_tool(&mut self) -> Result<StepReport> {
        let step = Step::InstallTool;
        let branch = self
            .config
            .repo_branch
            .as_deref()
            .filter(|branch| !branch.trim().is_empty());

        match branch {
            None => log_status!("install", "Installing the latest ScanCode.io release from PyPI"),
            Some(branch) => {
                log_status!("install", "Installing ScanCode.io from GitHub branch: {}", branch)
            }
        }

        let invocation = invocations::install(&self.defaults.install, branch);
        self.run_required(step, &invocation)?;

        Ok(step.report(StepStatus::Success).with_data(json!({
            "source": if branch.is_some() { "branch" } else { "release" },
            "command": invocation.display(),
        })))
    }

    pub fn run_migrations(&mut self) -> Result<StepReport> {
        log_status!("migrate", "Running migrations...");
        let invocation = self.with_tool_env(invocations::migrate(self.defaults))?;
        self.run_required(Step::RunMigrations, &invocation)?;
        Ok(Step::RunMigrations.report(StepStatus::Success))
    }

    pub fn create_project(&mut self) -> Result<StepReport> {
        log_status!("project", "Creating project: {}", self.config.project_name);
        let step = Step::CreateProject;
        let invocation =
            self.with_tool_env(invocations::create_project(self.defaults, self.config))?;
        self.run_required(step, &invocation)?;

        Ok(step.report(StepStatus::Success).with_data(json!({
            "command": invocation.display(),
        })))
    }

    pub fn discover_work_directory(&mut self) -> Result<StepReport> {
        log_status!("project", "Getting project work directory...");
        let step = Step::DiscoverWorkDirectory;
        let project = self.config.project_name.as_str();

        let invocation = self.with_tool_env(invocations::status(self.defaults, project))?;
        let output = self.run_required(step, &invocation)?;

        let path = parser::value_after_marker(&output.stdout, WORK_DIRECTORY_MARKER)
            .ok_or_else(|| Error::work_directory_not_found(project))?;

        self.work_directory.set(PathBuf::from(&path)).map_err(|_| {
            Error::internal_unexpected("Work directory was already discovered for this run")
        })?;
        log_status!("project", "Project work directory: {}", path);

        Ok(step.report(StepStatus::Success).with_data(json!({
            "workDirectory": path,
        })))
    }

    pub fn copy_inputs(&mut self) -> Result<StepReport> {
        let step = Step::CopyInputs;

        let source = match self.config.inputs_path.as_deref() {
            Some(path) if path.exists() => path,
            _ => {
                log_status!("input", "No input files to copy");
                return Ok(step
                    .report(StepStatus::Skipped)
                    .with_warning("No input files to copy"));
            }
        };

        let destination = self.work_directory()?.join("input");
        log_status!(
            "input",
            "Copying input files from {} to {}",
            source.display(),
            destination.display()
        );

        let copied = if source.is_dir() {
            io::copy_dir_contents(source, &destination)?
        } else {
            copy_single_file(source, &destination)?
        };
        log_status!("input", "Input files copied successfully");

        Ok(step.report(StepStatus::Success).with_data(json!({
            "source": source.display().to_string(),
            "destination": destination.display().to_string(),
            "filesCopied": copied,
        })))
    }

    pub fn execute_pipelines(&mut self) -> Result<StepReport> {
        log_status!("execute", "Running pipelines...");
        let invocation = self.with_tool_env(invocations::execute(
            self.defaults,
            &self.config.project_name,
        ))?;
        self.run_required(Step::ExecutePipelines, &invocation)?;
        log_status!("execute", "Pipelines executed successfully");
        Ok(Step::ExecutePipelines.report(StepStatus::Success))
    }

    /// Generate every requested format. A failing format is recorded and the
    /// loop moves on to the next one.
    pub fn generate_outputs(&mut self) -> Result<StepReport> {
        log_status!("output", "Generating outputs...");
        let step = Step::GenerateOutputs;
        let project = self.config.project_name.as_str();

        let mut report = step.report(StepStatus::Success);
        let mut formats = Vec::with_capacity(self.config.output_formats.len());

        for format in &self.config.output_formats {
            let format = format.trim();
            if format.is_empty() {
                continue;
            }
            let label = format.to_uppercase();
            log_status!("output", "Generating {} format", label);

            let invocation =
                self.with_tool_env(invocations::output(self.defaults, project, format))?;
            let output = self.commands.run(&invocation);

            if output.success {
                log_status!("output", "{} format generated successfully", label);
            } else {
                log_status!(
                    "output",
                    "{} format generation failed (exit code {})",
                    label,
                    output.exit_code
                );
                report = report.with_warning(format!(
                    "{} format generation failed (exit code {}): {}",
                    label,
                    output.exit_code,
                    error_text(&output)
                ));
            }

            formats.push(FormatResult {
                format: format.to_string(),
                success: output.success,
                exit_code: output.exit_code,
                stdout: output.stdout.trim().to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        if formats.is_empty() {
            report = report.with_warning("No output formats requested");
        }
        if formats.iter().any(|f| !f.success) {
            report.status = StepStatus::Tolerated;
        }

        let output_path = self.output_path()?;
        let files: Option<Vec<FileEntry>> = io::list_files(&output_path)?;
        match &files {
            Some(files) => {
                log_status!("output", "Generated files in {}", output_path.display());
                for file in files {
                    log_status!("output", "  {} ({} bytes)", file.name, file.size);
                }
            }
            None => {
                log_status!("output", "Output directory not found: {}", output_path.display());
                report = report.with_warning(format!(
                    "Output directory not found: {}",
                    output_path.display()
                ));
            }
        }

        Ok(report.with_data(json!({
            "formats": formats,
            "outputPath": output_path.display().to_string(),
            "files": files.unwrap_or_default(),
        })))
    }

    pub fn check_compliance(&mut self) -> Result<StepReport> {
        let step = Step::CheckCompliance;
        if !self.config.check_compliance {
            return Ok(step.report(StepStatus::Skipped));
        }

        log_status!("compliance", "Checking compliance...");
        let invocation = self.with_tool_env(invocations::check_compliance(
            self.defaults,
            &self.config.project_name,
            self.config.compliance_fail_level,
            self.config.compliance_fail_on_vulnerabilities,
        ))?;

        let output = self.commands.run(&invocation);
        if !output.success {
            return Err(Error::compliance_failed(
                output.into_failure(step.label(), &invocation),
            ));
        }
        log_status!("compliance", "Compliance check passed");

        Ok(step.report(StepStatus::Success).with_data(json!({
            "failLevel": self.config.compliance_fail_level,
            "failOnVulnerabilities": self.config.compliance_fail_on_vulnerabilities,
        })))
    }

    fn with_tool_env(&self, invocation: Invocation) -> Result<Invocation> {
        Ok(invocation.envs(&self.environment()?.vars()))
    }

    fn run_required(
        &self,
        step: Step,
        invocation: &Invocation,
    ) -> Result<CommandOutput> {
        self.commands
            .run(invocation)
            .require_success(step.label(), invocation)
    }
}

fn copy_single_file(source: &Path, destination: &Path) -> Result<usize> {
    std::fs::create_dir_all(destination).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("create {}", destination.display())),
        )
    })?;
    let name = source.file_name().ok_or_else(|| {
        Error::validation_invalid_argument(
            "inputs_path",
            format!("Cannot copy '{}': no file name", source.display()),
            None,
        )
    })?;
    io::copy_file(source, &destination.join(name))?;
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    /// Records invocations; answers `status` with a fixed work directory.
    struct Recorder {
        calls: RefCell<Vec<Invocation>>,
        work_dir: String,
        fail_formats: Vec<&'static str>,
        fail_program_arg: Option<&'static str>,
    }

    impl Recorder {
        fn new(work_dir: &Path) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                work_dir: work_dir.display().to_string(),
                fail_formats: Vec::new(),
                fail_program_arg: None,
            }
        }

        fn lines(&self) -> Vec<String> {
            self.calls.borrow().iter().map(Invocation::display).collect()
        }
    }

    impl CommandRunner for Recorder {
        fn run(&self, invocation: &Invocation) -> CommandOutput {
            self.calls.borrow_mut().push(invocation.clone());
            let args = &invocation.args;
            if let Some(arg) = self.fail_program_arg {
                if args.iter().any(|a| a == arg) {
                    return CommandOutput::failed(1, format!("{} exploded", arg));
                }
            }
            if args.first().map(String::as_str) == Some("status") {
                return CommandOutput::ok(format!(
                    "Project: demo\nWork directory: {}\n",
                    self.work_dir
                ));
            }
            if args.first().map(String::as_str) == Some("output") {
                let format = args.last().map(String::as_str).unwrap_or_default();
                if self.fail_formats.contains(&format) {
                    return CommandOutput::failed(2, "unsupported format");
                }
            }
            CommandOutput::ok("")
        }
    }

    fn demo_config() -> RunnerConfig {
        RunnerConfig {
            project_name: "demo".to_string(),
            output_formats: vec!["json".to_string(), "xlsx".to_string()],
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn steps_run_in_fixed_order() {
        let ids: Vec<&str> = Step::ALL.iter().map(Step::id).collect();
        assert_eq!(
            ids,
            vec![
                "setup_environment",
                "setup_database",
                "install",
                "migrate",
                "create_project",
                "work_directory",
                "copy_inputs",
                "execute",
                "generate_outputs",
                "check_compliance",
            ]
        );
    }

    #[test]
    fn tool_steps_require_environment() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(dir.path());
        let config = demo_config();
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);

        assert!(runner.run_migrations().is_err());
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn tool_invocations_carry_environment() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(dir.path());
        let config = demo_config();
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);

        runner.setup_environment().unwrap();
        runner.run_migrations().unwrap();

        let calls = recorder.calls.borrow();
        let env = &calls[0].env;
        assert!(env.iter().any(|(k, v)| k == DB_NAME_VAR && v == "scancodeio"));
        assert!(env.iter().any(|(k, v)| k == SECRET_KEY_VAR && !v.is_empty()));
    }

    #[test]
    fn work_directory_is_trimmed_and_set_once() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(dir.path());
        let config = demo_config();
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);
        runner.setup_environment().unwrap();

        let report = runner.discover_work_directory().unwrap();
        assert_eq!(runner.work_directory().unwrap(), dir.path());
        assert_eq!(
            report.data.unwrap()["workDirectory"],
            dir.path().display().to_string()
        );
        assert!(runner.discover_work_directory().is_err());
    }

    #[test]
    fn missing_marker_fails_discovery() {
        struct NoMarker;
        impl CommandRunner for NoMarker {
            fn run(&self, _: &Invocation) -> CommandOutput {
                CommandOutput::ok("Project: demo\nPipelines: none\n")
            }
        }

        let config = demo_config();
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &NoMarker);
        runner.setup_environment().unwrap();

        let err = runner.discover_work_directory().unwrap_err();
        assert_eq!(err.code.as_str(), "tool.work_directory_not_found");
        assert!(runner.work_directory().is_err());
    }

    #[test]
    fn copy_inputs_skips_without_path() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(dir.path());
        let defaults = Defaults::default();

        for inputs_path in [None, Some(dir.path().join("does-not-exist"))] {
            let config = RunnerConfig {
                inputs_path,
                ..demo_config()
            };
            let mut runner = PipelineRunner::new(&config, &defaults, &recorder);
            let report = runner.copy_inputs().unwrap();
            assert_eq!(report.status, StepStatus::Skipped);
        }
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn copy_inputs_fills_input_folder() {
        let work = tempdir().unwrap();
        let inputs = tempdir().unwrap();
        fs::create_dir_all(inputs.path().join("src")).unwrap();
        fs::write(inputs.path().join("src/main.c"), "int main;").unwrap();
        fs::write(inputs.path().join("README"), "hi").unwrap();

        let recorder = Recorder::new(work.path());
        let config = RunnerConfig {
            inputs_path: Some(inputs.path().to_path_buf()),
            ..demo_config()
        };
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);
        runner.setup_environment().unwrap();
        runner.discover_work_directory().unwrap();

        let report = runner.copy_inputs().unwrap();
        assert_eq!(report.status, StepStatus::Success);
        assert_eq!(report.data.unwrap()["filesCopied"], 2);
        assert!(work.path().join("input/src/main.c").is_file());
        assert!(work.path().join("input/README").is_file());
    }

    #[test]
    fn copy_inputs_accepts_single_file() {
        let work = tempdir().unwrap();
        let inputs = tempdir().unwrap();
        let archive = inputs.path().join("project.zip");
        fs::write(&archive, "PK").unwrap();

        let recorder = Recorder::new(work.path());
        let config = RunnerConfig {
            inputs_path: Some(archive),
            ..demo_config()
        };
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);
        runner.setup_environment().unwrap();
        runner.discover_work_directory().unwrap();

        runner.copy_inputs().unwrap();
        assert!(work.path().join("input/project.zip").is_file());
    }

    #[test]
    fn failed_format_does_not_stop_later_formats() {
        let work = tempdir().unwrap();
        fs::create_dir_all(work.path().join("output")).unwrap();
        fs::write(work.path().join("output/demo.json"), "{}").unwrap();

        let mut recorder = Recorder::new(work.path());
        recorder.fail_formats = vec!["xlsx"];
        let config = RunnerConfig {
            output_formats: vec!["json".into(), "xlsx".into(), "spdx".into()],
            ..demo_config()
        };
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);
        runner.setup_environment().unwrap();
        runner.discover_work_directory().unwrap();

        let report = runner.generate_outputs().unwrap();
        assert_eq!(report.status, StepStatus::Tolerated);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("XLSX format generation failed (exit code 2)"));

        let formats: Vec<String> = recorder
            .calls
            .borrow()
            .iter()
            .filter(|c| c.args[0] == "output")
            .map(|c| c.args.last().cloned().unwrap_or_default())
            .collect();
        assert_eq!(formats, vec!["json", "xlsx", "spdx"]);

        let data = report.data.unwrap();
        assert_eq!(data["files"][0]["name"], "demo.json");
        assert_eq!(data["files"][0]["size"], 2);
        assert_eq!(data["formats"][1]["success"], false);
    }

    #[test]
    fn missing_output_directory_is_a_warning() {
        let work = tempdir().unwrap();
        let recorder = Recorder::new(work.path());
        let config = demo_config();
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);
        runner.setup_environment().unwrap();
        runner.discover_work_directory().unwrap();

        let report = runner.generate_outputs().unwrap();
        assert_eq!(report.status, StepStatus::Success);
        assert!(report.warnings[0].starts_with("Output directory not found"));
    }

    #[test]
    fn compliance_skipped_when_disabled() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(dir.path());
        let config = demo_config();
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);
        runner.setup_environment().unwrap();

        let report = runner.check_compliance().unwrap();
        assert_eq!(report.status, StepStatus::Skipped);
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn compliance_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::new(dir.path());
        recorder.fail_program_arg = Some("check-compliance");
        let config = RunnerConfig {
            check_compliance: true,
            compliance_fail_on_vulnerabilities: true,
            ..demo_config()
        };
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);
        runner.setup_environment().unwrap();

        let err = runner.check_compliance().unwrap_err();
        assert_eq!(err.code.as_str(), "compliance.check_failed");
        assert!(recorder.lines()[0].ends_with("--fail-level ERROR --fail-on-vulnerabilities"));
    }

    #[test]
    fn run_full_stops_at_first_fatal_step() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::new(dir.path());
        recorder.fail_program_arg = Some("migrate");
        let config = demo_config();
        let defaults = Defaults::default();
        let mut runner = PipelineRunner::new(&config, &defaults, &recorder);

        let report = runner.run_full();

        assert_eq!(report.status, crate::pipeline::RunStatus::Failed);
        let last = report.steps.last().unwrap();
        assert_eq!(last.id, "migrate");
        assert_eq!(last.status, StepStatus::Failed);
        assert_eq!(report.steps.len(), 4);
        let failure = report.failure.unwrap();
        assert_eq!(failure.code, "tool.command_failed");
        assert_eq!(failure.details["stderr"], "migrate exploded");
        assert!(!recorder.lines().iter().any(|l| l.contains("create-project")));
        assert!(report.work_directory.is_none());
    }
}
