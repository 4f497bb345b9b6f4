//! Fatal input errors. Findings are never errors; see `checker::Diagnostic`.

use std::path::{Path, PathBuf};

/// Why a single source text could not be turned into declarations.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("tree-sitter grammar could not be loaded: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("tree-sitter returned no syntax tree")]
    NoTree,
}

/// Errors that abort a run before any diagnostic is produced.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .path.display())]
    NotUtf8 { path: PathBuf },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl CheckError {
    /// The file the error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::NotUtf8 { path }
            | Self::Parse { path, .. }
            | Self::Config { path, .. } => path,
        }
    }
}
