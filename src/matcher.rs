//! Maps Django model names to TypeScript interface names and decides whether
//! a model field is covered on the frontend.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::DEFAULT_NAME_SUFFIXES;
use crate::naming::to_camel;
use crate::resolve::ResolvedInterfaces;

/// Interfaces whose name matched a model, keyed by interface name.
pub type MatchedInterfaces<'a> = BTreeMap<&'a str, &'a BTreeSet<String>>;

/// Why a field needs no diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accounted {
    /// Exempted by a backend-only comment.
    BackendOnly,
    /// Declared in (or inherited by) this matched interface.
    Interface(String),
    /// Only found as a substring of the raw types file.
    WeakConfirmation,
}

pub struct NameMatcher {
    suffixes: Vec<String>,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }
}

impl NameMatcher {
    pub fn new(suffixes: Vec<String>) -> Self {
        Self { suffixes }
    }

    /// Interface names a model could be declared as, in display order:
    /// each base variant (as-is, without a `Model` suffix, camelCased)
    /// combined with each suffix. Duplicates are dropped.
    pub fn candidate_names(&self, model: &str) -> Vec<String> {
        let mut bases = vec![model.to_string()];
        if let Some(stripped) = model.strip_suffix("Model") {
            bases.push(stripped.to_string());
        }
        if model.contains('_') {
            bases.push(to_camel(model));
        }

        let mut candidates: Vec<String> = Vec::new();
        for base in &bases {
            for suffix in &self.suffixes {
                let candidate = format!("{}{}", base, suffix);
                // `Model` strips to an empty base; only its bare form is meaningless.
                if !candidate.is_empty() && !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    /// Resolved interfaces whose name is exactly one of the model's candidates.
    pub fn match_interfaces<'a>(
        &self,
        model: &str,
        resolved: &'a ResolvedInterfaces,
    ) -> MatchedInterfaces<'a> {
        let candidates = self.candidate_names(model);
        resolved
            .iter()
            .filter(|(name, _)| candidates.iter().any(|c| c == *name))
            .map(|(name, fields)| (name.as_str(), fields))
            .collect()
    }
}

/// Decides whether `field` (snake_case, as declared on the model) is covered.
/// First match wins: backend-only exemption, then matched interfaces, then
/// the raw-text substring fallback when `types_text` is given.
pub fn account_for(
    field: &str,
    matched: &MatchedInterfaces<'_>,
    backend_only: &BTreeSet<String>,
    types_text: Option<&str>,
) -> Option<Accounted> {
    let camel = to_camel(field);

    if backend_only.contains(&camel) || backend_only.contains(field) {
        return Some(Accounted::BackendOnly);
    }
    if let Some((name, _)) = matched.iter().find(|(_, fields)| fields.contains(&camel)) {
        return Some(Accounted::Interface(name.to_string()));
    }
    match types_text {
        Some(text) if text.contains(camel.as_str()) => Some(Accounted::WeakConfirmation),
        _ => None,
    }
}
