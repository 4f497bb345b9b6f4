pub mod python;
pub mod typescript;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ExtractError;

pub use python::DjangoModelExtractor;
pub use typescript::TypeScriptInterfaceExtractor;

/// Turns the text of one source file into structured declarations.
pub trait SourceExtractor {
    type Output;

    fn extract(&self, source: &str) -> Result<Self::Output, ExtractError>;
}

/// A Django model class and the schema fields declared in its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendModel {
    pub name: String,
    pub fields: BTreeSet<String>,
    /// 1-based line of the first declaration with this name.
    pub line: usize,
}

/// An interface as written, before its `extends` chain is followed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInterface {
    pub direct_fields: BTreeSet<String>,
    pub parents: Vec<String>,
}

/// Everything the checker needs from the TypeScript file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontendSurface {
    pub interfaces: BTreeMap<String, RawInterface>,
    /// Field names marked backend-only anywhere in the file's comments.
    pub backend_only: BTreeSet<String>,
}
