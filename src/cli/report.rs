//! Report formatting and printing utilities.
//!
//! Cargo-style diagnostics for the extraction run: a logger plugged into the
//! engine's `Logger` trait (spec §7 "plugin error... logged as a warning"),
//! and a summary printer for the driver's `DriverOutput` (spec §4.9).

use std::io::{self, Write};

use colored::Colorize;

use crate::engine::driver::DriverOutput;
use crate::engine::plugin::Logger;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// The CLI's own `Logger` impl: warnings always print to stderr; info lines
/// only print when `--verbose` was passed.
pub struct CliLogger {
    pub verbose: bool,
}

impl Logger for CliLogger {
    fn warn(&self, message: &str) {
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }

    fn info(&self, message: &str) {
        if self.verbose {
            println!("{message}");
        }
    }
}

pub fn print_summary(output: &DriverOutput, dry_run: bool, verbose: bool) {
    print_summary_to(output, dry_run, verbose, &mut io::stdout().lock());
}

pub fn print_summary_to<W: Write>(output: &DriverOutput, dry_run: bool, verbose: bool, writer: &mut W) {
    if verbose {
        for file in &output.files {
            let marker = if file.updated {
                if dry_run { "would update".yellow() } else { "updated".green() }
            } else {
                "unchanged".dimmed()
            };
            let _ = writeln!(
                writer,
                "  {} {} [{}/{}]",
                marker,
                file.path.display(),
                file.locale,
                if file.namespace.is_empty() { "*" } else { &file.namespace }
            );
        }
    }

    let updated_count = output.files.iter().filter(|f| f.updated).count();
    let verb = if dry_run { "would update" } else { "updated" };

    if updated_count == 0 {
        let _ = writeln!(
            writer,
            "{} {} ({} source file{} scanned, {} key{} extracted, {} output file{} unchanged)",
            SUCCESS_MARK.green(),
            "up to date".green(),
            output.source_files_scanned,
            plural_s(output.source_files_scanned),
            output.keys_extracted,
            plural_s(output.keys_extracted),
            output.files.len(),
            plural_s(output.files.len()),
        );
    } else {
        let _ = writeln!(
            writer,
            "{} {} {} output file{} ({} source file{} scanned, {} key{} extracted)",
            SUCCESS_MARK.green(),
            verb,
            updated_count,
            plural_s(updated_count),
            output.source_files_scanned,
            plural_s(output.source_files_scanned),
            output.keys_extracted,
            plural_s(output.keys_extracted),
        );
    }
}

fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

pub fn print_init_created(path: &str) {
    println!("{} {}", SUCCESS_MARK.green(), format!("Created {path}").green());
}

pub fn print_init_exists(path: &str) {
    eprintln!("{} {} already exists", FAILURE_MARK.red(), path);
}
