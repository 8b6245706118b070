//! `sdtm` binary: parse flags, set up logging, dispatch the subcommand.
//!
//! The process exits with status 1 when a command fails or a study is not
//! ready for submission.

use std::process::ExitCode;

use clap::Parser;
use sdtm_cli::logging::init_logging;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{run_domains, run_study};
use crate::summary::print_summary;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&cli.log_config()) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    match dispatch(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one subcommand; `Ok(false)` means it finished but the study is not ready.
fn dispatch(command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Study(args) => {
            let outcome = run_study(&args)?;
            print_summary(&outcome, args.report.as_deref());
            Ok(outcome.report.ready())
        }
        Command::Domains => run_domains().map(|()| true),
    }
}
