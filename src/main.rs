use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod tty;

use commands::{push, run};
use scanflow::output;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "scanflow")]
#[command(version = VERSION)]
#[command(about = "Run ScanCode.io pipelines in CI and push scan results to DejaCode")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision PostgreSQL, install ScanCode.io, run pipelines and export results
    Run(run::RunArgs),
    /// Create a DejaCode product and import a scan file into it
    Push(push::PushArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if let Err(err) = output::print_result(json_result) {
        tty::status(&format!("Failed to write response: {}", err));
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
