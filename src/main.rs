//! # Type Checker
//!
//! Reads a Django models file and a TypeScript types file and reports every
//! model without a matching interface and every model field without a
//! matching interface property.

use clap::Parser;
use commands::Cli;

// Modules
pub mod checker;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod matcher;
pub mod naming;
pub mod report;
pub mod resolve;

fn main() {
    let cli = Cli::parse();
    logging::init_tracing();

    let code = commands::check::handle_check(&cli);
    std::process::exit(code);
}
