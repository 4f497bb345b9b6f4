pub mod check;

use std::path::PathBuf;

use clap::Parser;

use crate::report::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "type-checker")]
#[command(about = "Checks that every Django model field has a TypeScript counterpart", long_about = None)]
pub struct Cli {
    /// Django models file (e.g. backend/communities/organizations/models.py)
    pub models_file: PathBuf,
    /// TypeScript file declaring the matching interfaces
    pub types_file: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Only print findings
    #[arg(long, short)]
    pub quiet: bool,
    /// Config file (defaults to the nearest .typecheckrc.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
