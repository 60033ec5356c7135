//! Argument vectors for every external command the pipeline runs.

use crate::config::{FailLevel, RunnerConfig};
use crate::defaults::{DatabaseServiceConfig, Defaults, InstallConfig};
use crate::utils::command::Invocation;

/// Role password statement fed to psql on stdin. `:"db_user"` and
/// `:'db_password'` are psql variables, quoted by psql itself.
pub const SET_PASSWORD_SQL: &str = "ALTER ROLE :\"db_user\" WITH ENCRYPTED PASSWORD :'db_password';\n";

fn as_admin(db: &DatabaseServiceConfig) -> Invocation {
    Invocation::new(&db.sudo).args(["-u", db.admin_user.as_str()])
}

pub fn start_database_service(db: &DatabaseServiceConfig) -> Invocation {
    Invocation::new(&db.sudo).args([db.systemctl.as_str(), "start", db.service.as_str()])
}

pub fn create_role(db: &DatabaseServiceConfig, user: &str) -> Invocation {
    as_admin(db).args([
        "createuser",
        "--no-createrole",
        "--no-superuser",
        "--login",
        "--inherit",
        "--createdb",
        user,
    ])
}

pub fn set_role_password(db: &DatabaseServiceConfig, user: &str, password: &str) -> Invocation {
    as_admin(db)
        .args([
            "psql".to_string(),
            "--no-psqlrc".to_string(),
            "--quiet".to_string(),
            "-v".to_string(),
            "ON_ERROR_STOP=1".to_string(),
            "-v".to_string(),
            format!("db_user={}", user),
            "-v".to_string(),
        ])
        .secret_arg(format!("db_password={}", password))
        .stdin(SET_PASSWORD_SQL)
        .captured()
}

pub fn create_database(db: &DatabaseServiceConfig, user: &str, name: &str) -> Invocation {
    as_admin(db).args([
        "createdb".to_string(),
        format!("--owner={}", user),
        "--encoding=UTF-8".to_string(),
        name.to_string(),
    ])
}

/// Install from the package index, or from a branch of the source repository.
pub fn install(settings: &InstallConfig, branch: Option<&str>) -> Invocation {
    match branch {
        None => Invocation::new(&settings.pip).args(["install", "--upgrade", settings.package.as_str()]),
        Some(branch) => Invocation::new(&settings.pip)
            .arg("install")
            .arg(format!("git+{}@{}", settings.repo_url, branch)),
    }
}

pub fn migrate(defaults: &Defaults) -> Invocation {
    Invocation::new(&defaults.tool.program).args(["migrate", "--verbosity", "0"])
}

/// `create-project <name>` with one `--pipeline` pair per pipeline, then one
/// `--input-url` pair per non-blank URL, both in configured order.
pub fn create_project(defaults: &Defaults, config: &RunnerConfig) -> Invocation {
    let mut invocation =
        Invocation::new(&defaults.tool.program).args(["create-project", config.project_name.as_str()]);

    for pipeline in &config.pipelines {
        let pipeline = pipeline.trim();
        if pipeline.is_empty() {
            continue;
        }
        invocation = invocation.args(["--pipeline", pipeline]);
    }

    for url in &config.input_urls {
        let url = url.trim();
        if url.is_empty() {
            continue;
        }
        invocation = invocation.args(["--input-url", url]);
    }

    invocation
}

pub fn status(defaults: &Defaults, project: &str) -> Invocation {
    Invocation::new(&defaults.tool.program)
        .args(["status", "--project", project])
        .captured()
}

pub fn execute(defaults: &Defaults, project: &str) -> Invocation {
    Invocation::new(&defaults.tool.program).args(["execute", "--project", project, "--no-color"])
}

pub fn output(defaults: &Defaults, project: &str, format: &str) -> Invocation {
    Invocation::new(&defaults.tool.program)
        .args(["output", "--project", project, "--format", format])
        .captured()
}

pub fn check_compliance(
    defaults: &Defaults,
    project: &str,
    fail_level: FailLevel,
    fail_on_vulnerabilities: bool,
) -> Invocation {
    let invocation = Invocation::new(&defaults.tool.program).args([
        "check-compliance",
        "--project",
        project,
        "--fail-level",
        fail_level.as_str(),
    ]);

    if fail_on_vulnerabilities {
        invocation.arg("--fail-on-vulnerabilities")
    } else {
        invocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command::Capture;

    fn config_with(pipelines: &[&str], urls: &[&str]) -> RunnerConfig {
        RunnerConfig {
            project_name: "demo".to_string(),
            pipelines: pipelines.iter().map(|p| p.to_string()).collect(),
            input_urls: urls.iter().map(|u| u.to_string()).collect(),
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn create_project_pairs_each_pipeline_in_order() {
        let config = config_with(&["scan_codebase", "find_vulnerabilities", " load_sbom "], &[]);
        let invocation = create_project(&Defaults::default(), &config);
        assert_eq!(invocation.program, "scanpipe");
        assert_eq!(
            invocation.args,
            vec![
                "create-project",
                "demo",
                "--pipeline",
                "scan_codebase",
                "--pipeline",
                "find_vulnerabilities",
                "--pipeline",
                "load_sbom",
            ]
        );
    }

    #[test]
    fn create_project_appends_non_blank_urls() {
        let config = config_with(
            &["scan_codebase"],
            &["https://example.com/a.zip", "  ", "docker://alpine"],
        );
        let args = create_project(&Defaults::default(), &config).args;
        assert_eq!(
            &args[4..],
            &[
                "--input-url",
                "https://example.com/a.zip",
                "--input-url",
                "docker://alpine"
            ]
        );
    }

    #[test]
    fn install_uses_release_without_branch() {
        let invocation = install(&InstallConfig::default(), None);
        assert_eq!(invocation.display(), "pip install --upgrade scancodeio");
    }

    #[test]
    fn install_uses_branch_reference() {
        let invocation = install(&InstallConfig::default(), Some("develop"));
        assert_eq!(
            invocation.args,
            vec![
                "install",
                "git+https://github.com/aboutcode-org/scancode.io.git@develop"
            ]
        );
    }

    #[test]
    fn password_travels_as_psql_variable() {
        let db = DatabaseServiceConfig::default();
        let invocation = set_role_password(&db, "ci", "p'w; DROP");
        assert_eq!(invocation.program, "sudo");
        assert!(invocation.args.contains(&"db_password=p'w; DROP".to_string()));
        assert!(invocation.args.contains(&"db_user=ci".to_string()));
        assert_eq!(invocation.stdin.as_deref(), Some(SET_PASSWORD_SQL));
        assert!(!SET_PASSWORD_SQL.contains("p'w"));
        assert_eq!(invocation.capture, Capture::Collect);
        assert!(!invocation.display().contains("DROP"));
    }

    #[test]
    fn matching_user_and_password_keep_user_visible() {
        let db = DatabaseServiceConfig::default();
        let invocation = set_role_password(&db, "scancodeio", "scancodeio");
        assert!(invocation
            .display()
            .ends_with("-v db_user=scancodeio -v db_password=********"));
    }

    #[test]
    fn database_commands_run_as_admin() {
        let db = DatabaseServiceConfig::default();
        assert_eq!(
            start_database_service(&db).display(),
            "sudo systemctl start postgresql.service"
        );
        assert_eq!(
            create_role(&db, "ci").display(),
            "sudo -u postgres createuser --no-createrole --no-superuser --login --inherit --createdb ci"
        );
        assert_eq!(
            create_database(&db, "ci", "scans").display(),
            "sudo -u postgres createdb --owner=ci --encoding=UTF-8 scans"
        );
    }

    #[test]
    fn compliance_flag_only_when_requested() {
        let defaults = Defaults::default();
        let without = check_compliance(&defaults, "demo", FailLevel::Warning, false);
        assert_eq!(
            without.args,
            vec!["check-compliance", "--project", "demo", "--fail-level", "WARNING"]
        );
        let with = check_compliance(&defaults, "demo", FailLevel::Error, true);
        assert_eq!(with.args.last().map(String::as_str), Some("--fail-on-vulnerabilities"));
    }

    #[test]
    fn status_and_output_are_captured() {
        let defaults = Defaults::default();
        assert_eq!(status(&defaults, "demo").capture, Capture::Collect);
        let output = output(&defaults, "demo", "xlsx");
        assert_eq!(output.capture, Capture::Collect);
        assert_eq!(output.display(), "scanpipe output --project demo --format xlsx");
        assert_eq!(execute(&defaults, "demo").capture, Capture::Inherit);
    }
}
