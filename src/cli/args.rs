//! CLI argument definitions using clap.
//!
//! The extraction & reconciliation engine (spec.md §2-§9) is the only design
//! subject of this crate; the command-line front end around it is an ambient,
//! fully-functional surface (spec.md §1, SPEC_FULL.md §1): one subcommand that
//! drives the engine's driver (`extract`), plus a config-scaffolding
//! convenience (`init`).
//!
//! ## Commands
//!
//! - `extract`: scan source files and reconcile translation resource files
//! - `init`: write a starter `.glotrc.json`

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Extract(cmd)) => cmd.verbose,
            Some(Command::Init(_)) | None => false,
        }
    }
}

#[derive(Debug, Parser)]
pub struct ExtractCommand {
    /// Project root to scan from (overrides the directory the config file was
    /// discovered in).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Report what would change without writing any output file.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 1 if any output file was updated (spec.md §6 "Exit
    /// codes"); the default is to always exit 0 when the run itself
    /// succeeded.
    #[arg(long)]
    pub ci: bool,

    /// Print per-file and per-key diagnostics in addition to the summary.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
pub struct InitCommand {
    /// Overwrite an existing config file instead of failing.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan source files and reconcile translation resource files
    Extract(ExtractCommand),
    /// Write a starter .glotrc.json configuration file
    Init(InitCommand),
}
