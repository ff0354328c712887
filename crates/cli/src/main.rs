use std::process::ExitCode;

use clap::Parser;
use log::debug;

use colander_core::error::{Error, Result};
use colander_core::tokenizer::Matrix;

use colander_cli::cli_args::Args;
use colander_cli::orchestrator::{self, Delivery};
use colander_cli::session::{self, SessionOutcome};

/// Exit status when the user backed out with Escape or Ctrl-C, matching the
/// shell convention for an interrupted process.
const CANCELLED: u8 = 130;

/// Exit status when a downstream command could not be run.
const COMMAND_FAILED: u8 = 2;

enum RunOutcome {
    Finalized,
    Cancelled,
}

fn execute(args: &Args) -> Result<RunOutcome> {
    let mut raw = orchestrator::acquire_input()?;

    loop {
        let matrix = Matrix::tokenize(&raw, args.delimiter_policy());
        debug!(
            "Ingested {} lines, {} columns",
            matrix.line_count(),
            matrix.column_count()
        );

        match session::run_session(matrix, args.initial_query())? {
            SessionOutcome::Cancelled => return Ok(RunOutcome::Cancelled),
            SessionOutcome::Rerun(selection) => {
                raw = selection.to_text();
            }
            SessionOutcome::Finalized(selection) => {
                match orchestrator::deliver_output(&selection.to_text())? {
                    Delivery::Delivered => return Ok(RunOutcome::Finalized),
                    Delivery::RerunRequested(seed) => {
                        raw = seed;
                    }
                }
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match execute(&args) {
        Ok(RunOutcome::Finalized) => ExitCode::SUCCESS,
        Ok(RunOutcome::Cancelled) => ExitCode::from(CANCELLED),
        Err(error @ (Error::SpawnFailed { .. } | Error::SubProcessExit { .. })) => {
            eprintln!("{error}");
            ExitCode::from(COMMAND_FAILED)
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
