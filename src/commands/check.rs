use colored::*;

use super::Cli;
use crate::checker::{CheckReport, ConsistencyChecker};
use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::report;

pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

/// Runs the check, prints the report and returns the process exit code.
pub fn handle_check(cli: &Cli) -> i32 {
    match run_check(cli) {
        Ok(report) => {
            let rendered = report::render(&report, cli.format, &cli.models_file, &cli.types_file, cli.quiet);
            if !rendered.is_empty() {
                print!("{}", rendered);
                if !rendered.ends_with('\n') {
                    println!();
                }
            }
            exit_code(&report)
        }
        Err(e) => {
            tracing::error!(file = %e.path().display(), error = %e, "check aborted");
            eprintln!("{} {}", "❌".red(), e.to_string().red().bold());
            EXIT_FATAL
        }
    }
}

/// Loads config, then both input files, then checks them.
pub fn run_check(cli: &Cli) -> Result<CheckReport, CheckError> {
    let cwd = std::env::current_dir().unwrap_or_default();
    let config = CheckerConfig::discover(cli.config.as_deref(), &cwd)?;
    ConsistencyChecker::new(config).check_files(&cli.models_file, &cli.types_file)
}

pub fn exit_code(report: &CheckReport) -> i32 {
    if report.is_clean() {
        EXIT_CLEAN
    } else {
        EXIT_FINDINGS
    }
}
