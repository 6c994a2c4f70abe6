//! CLI layer - User-facing command-line interface.
//!
//! This module provides the command-line interface for the glot tool. It
//! handles argument parsing, dispatch to the engine's driver, and result
//! reporting. The front end itself is out of scope as a *design* subject
//! (spec.md §1); it exists here as a thin, fully-functional ambient surface.
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions using clap
//! - `exit_status`: Exit status codes
//! - `report`: Summary reporting and the CLI's `Logger` impl
//! - `run`: Command dispatcher

use std::process::ExitCode;

use anyhow::Result;

pub use args::{Arguments, Command};
pub use exit_status::ExitStatus;

pub mod args;
mod exit_status;
pub mod report;
mod run;

pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitCode::from(0));
    };

    let status = run::run(args)?;
    Ok(status.into())
}
