//! Main entry point for the glot CLI.
//!
//! Dispatches to the engine's driver (spec §4.9) for `extract`, or writes a
//! starter config for `init`.

use std::{env, fs, path::Path};

use anyhow::{Context, Result};

use super::args::{Arguments, Command, ExtractCommand, InitCommand};
use super::exit_status::ExitStatus;
use super::report::{print_init_created, print_init_exists, print_summary, CliLogger};
use crate::config::{default_config_json, load_config, CONFIG_FILE_NAME};
use crate::engine::driver::{run as run_engine, DriverOptions};

pub fn run(Arguments { command }: Arguments) -> Result<ExitStatus> {
    match command {
        Some(Command::Extract(cmd)) => extract(cmd),
        Some(Command::Init(cmd)) => init(cmd),
        None => anyhow::bail!("No command provided. Use --help to see available commands."),
    }
}

fn extract(cmd: ExtractCommand) -> Result<ExitStatus> {
    let cwd = env::current_dir().context("Failed to read current directory")?;
    let load_result = load_config(&cwd)?;
    let root = cmd.root.unwrap_or(cwd);

    let logger = CliLogger { verbose: cmd.verbose };
    let mut options = DriverOptions::new(&root, &logger);
    options.dry_run = cmd.dry_run;

    let output = run_engine(&load_result.config, options)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    print_summary(&output, cmd.dry_run, cmd.verbose);

    if cmd.ci && output.any_file_updated {
        Ok(ExitStatus::Failure)
    } else {
        Ok(ExitStatus::Success)
    }
}

fn init(cmd: InitCommand) -> Result<ExitStatus> {
    let config_path = Path::new(CONFIG_FILE_NAME);

    if config_path.exists() && !cmd.force {
        print_init_exists(CONFIG_FILE_NAME);
        return Ok(ExitStatus::Failure);
    }

    fs::write(config_path, default_config_json()?)?;
    print_init_created(CONFIG_FILE_NAME);
    Ok(ExitStatus::Success)
}
