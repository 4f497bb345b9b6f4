//! Regex scan over TypeScript declaration files.
//!
//! This is deliberately shallow: an interface body ends at the first `}`, so
//! an inline object type inside a body cuts the body short. Fields are any
//! `name:` / `name?:` pair in the body, commented-out ones included.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FrontendSurface, RawInterface, SourceExtractor};
use crate::error::ExtractError;

static INTERFACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:export\s+|declare\s+)?interface\s+(\w+)(?:\s+extends\s+([^{]+))?\s*\{([\s\S]*?)\}",
    )
    .unwrap()
});

static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?://[^\n]*\n)*\s*(\w+)\s*[?]?\s*:").unwrap());

static READONLY_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"readonly\s+(\w+)\s*[?]?\s*:").unwrap());

// FIELD_RE consumes a comment line it skips over, so commented-out fields
// get their own pass.
static COMMENTED_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//\s*(\w+)\s*[?]?\s*:").unwrap());

static BACKEND_ONLY_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"//.*?Note:\s*(\w+)\s+is\s+backend\s+only",
        r"//.*?(\w+)\s+is\s+backend\s+only",
        r"//\s*@backend-only\s+(\w+)",
        r"//.*?backend-only:\s*(\w+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[derive(Default)]
pub struct TypeScriptInterfaceExtractor;

impl TypeScriptInterfaceExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_interfaces(&self, content: &str) -> BTreeMap<String, RawInterface> {
        let mut interfaces = BTreeMap::new();
        for caps in INTERFACE_RE.captures_iter(content) {
            let name = caps[1].to_string();
            let parents: Vec<String> = caps
                .get(2)
                .map(|clause| {
                    clause
                        .as_str()
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let direct_fields = body_fields(&caps[3]);

            tracing::trace!(interface = %name, fields = direct_fields.len(), "parsed interface");
            // Redeclaring an interface replaces the earlier one.
            interfaces.insert(name, RawInterface { direct_fields, parents });
        }
        interfaces
    }

    pub fn backend_only_fields(&self, content: &str) -> BTreeSet<String> {
        BACKEND_ONLY_RES
            .iter()
            .flat_map(|re| re.captures_iter(content).map(|caps| caps[1].to_string()))
            .collect()
    }
}

fn body_fields(body: &str) -> BTreeSet<String> {
    FIELD_RE
        .captures_iter(body)
        .chain(READONLY_FIELD_RE.captures_iter(body))
        .chain(COMMENTED_FIELD_RE.captures_iter(body))
        .map(|caps| caps[1].to_string())
        .collect()
}

impl SourceExtractor for TypeScriptInterfaceExtractor {
    type Output = FrontendSurface;

    fn extract(&self, source: &str) -> Result<FrontendSurface, ExtractError> {
        let surface = FrontendSurface {
            interfaces: self.parse_interfaces(source),
            backend_only: self.backend_only_fields(source),
        };
        tracing::debug!(
            interfaces = surface.interfaces.len(),
            backend_only = surface.backend_only.len(),
            "extracted typescript interfaces"
        );
        Ok(surface)
    }
}
