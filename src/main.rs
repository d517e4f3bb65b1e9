//! # wmk CLI entry point
//!
//! Parses the target list, loads the generated configuration and the project
//! manifest, and hands the resolved plan to the orchestrator. Exit codes
//! matter here: a failing delegate's code crosses the process boundary
//! verbatim, filesystem errors exit with the underlying OS code, and 9009
//! is reserved for a delegate tool that could not be found at all.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::io;
use std::path::Path;

use winmake::config::Config;
use winmake::driver::CmakeDriver;
use winmake::matrix::StepFailure;
use winmake::orchestrate::{Orchestrator, print_help};
use winmake::project::Project;
use winmake::target::{Target, resolve_plan};

#[derive(Parser)]
#[command(name = "wmk")]
#[command(about = "Make-style build orchestration without a POSIX shell", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Things to build. If nothing is specified, "all" is assumed.
    /// Run "wmk help" for the full target list.
    targets: Vec<String>,

    /// Echo every external command before it runs
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("{} {:#}", "x".red(), err);
        std::process::exit(exit_code_for(&err));
    }
}

fn run(cli: &Cli) -> Result<()> {
    let plan = resolve_plan(&cli.targets)?;

    // help is informational and must work before any configuration exists.
    if plan == [Target::Help] {
        print_help();
        return Ok(());
    }

    let root = Path::new(".");
    let config = Config::load(root)?;
    let project = Project::load(root)?;
    let driver = CmakeDriver::new(&config, &project, root, cli.verbose);

    let mut orchestrator = Orchestrator::new(config, project, driver, root, cli.verbose);
    orchestrator.run(&plan)
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(step) = err.downcast_ref::<StepFailure>() {
        return step.code;
    }
    for cause in err.chain() {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if let Some(code) = io_err.raw_os_error() {
                return code;
            }
        }
    }
    1
}
