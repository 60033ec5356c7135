use clap::Args;

use scanflow::config::{
    DatabaseConfig, FailLevel, RunnerConfig, DEFAULT_DB_VALUE, DEFAULT_PIPELINE,
    DEFAULT_PROJECT_NAME,
};
use scanflow::defaults;
use scanflow::output::exit_code_for_error;
use scanflow::paths;
use scanflow::pipeline::RunReport;
use scanflow::runner::{PipelineRunner, SECRET_KEY_VAR};
use scanflow::utils::command::SystemRunner;
use scanflow::utils::parser;

use super::{CmdResult, GlobalArgs};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Name of the ScanCode.io project
    #[arg(long, default_value = DEFAULT_PROJECT_NAME)]
    pub project_name: String,

    /// Comma-separated list of pipelines
    #[arg(long, default_value = DEFAULT_PIPELINE)]
    pub pipelines: String,

    /// Output formats, separated by commas and/or spaces
    #[arg(long, default_value = "json xlsx spdx cyclonedx")]
    pub output_formats: String,

    /// File or directory copied into the project's input folder
    #[arg(long)]
    pub inputs_path: Option<String>,

    /// Comma-separated list of input URLs
    #[arg(long)]
    pub input_urls: Option<String>,

    /// Run check-compliance after outputs are generated
    #[arg(long)]
    pub check_compliance: bool,

    /// Compliance failure level
    #[arg(long, default_value = "ERROR", value_parser = ["ERROR", "WARNING", "MISSING"])]
    pub compliance_fail_level: String,

    /// Fail the compliance check on known vulnerabilities
    #[arg(long)]
    pub compliance_fail_on_vulnerabilities: bool,

    /// Install ScanCode.io from this repository branch instead of PyPI
    #[arg(long)]
    pub scancodeio_repo_branch: Option<String>,

    /// Database name
    #[arg(long, default_value = DEFAULT_DB_VALUE)]
    pub db_name: String,

    /// Database user
    #[arg(long, default_value = DEFAULT_DB_VALUE)]
    pub db_user: String,

    /// Database password
    #[arg(long, default_value = DEFAULT_DB_VALUE, hide_default_value = true)]
    pub db_password: String,
}

impl RunArgs {
    pub fn to_config(&self, secret_key: Option<String>) -> scanflow::Result<RunnerConfig> {
        let config = RunnerConfig {
            project_name: self.project_name.trim().to_string(),
            pipelines: parser::split_comma_list(&self.pipelines),
            output_formats: parser::split_flexible_list(&self.output_formats),
            inputs_path: self
                .inputs_path
                .as_deref()
                .filter(|path| !path.trim().is_empty())
                .map(paths::expand),
            input_urls: self
                .input_urls
                .as_deref()
                .map(parser::split_comma_list)
                .unwrap_or_default(),
            check_compliance: self.check_compliance,
            compliance_fail_level: self.compliance_fail_level.parse::<FailLevel>()?,
            compliance_fail_on_vulnerabilities: self.compliance_fail_on_vulnerabilities,
            repo_branch: self
                .scancodeio_repo_branch
                .clone()
                .filter(|branch| !branch.trim().is_empty()),
            database: DatabaseConfig {
                name: self.db_name.clone(),
                user: self.db_user.clone(),
                password: self.db_password.clone(),
            },
            secret_key,
        };

        config.validate()?;
        Ok(config)
    }
}

pub fn run(args: RunArgs, _global: &GlobalArgs) -> CmdResult<RunReport> {
    let config = args.to_config(std::env::var(SECRET_KEY_VAR).ok())?;
    let defaults = defaults::load_defaults();
    let commands = SystemRunner;

    let report = PipelineRunner::new(&config, &defaults, &commands).run_full();

    let exit_code = report
        .failure
        .as_ref()
        .map(|failure| {
            scanflow::error::parse_code(&failure.code)
                .map(exit_code_for_error)
                .unwrap_or(1)
        })
        .unwrap_or(0);

    Ok((report, exit_code))
}
