//! Runs the whole check: extract both files, resolve interface inheritance,
//! match models to interfaces and collect every missing interface or field.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::extract::{
    BackendModel, DjangoModelExtractor, FrontendSurface, SourceExtractor,
    TypeScriptInterfaceExtractor,
};
use crate::matcher::{account_for, NameMatcher};
use crate::naming::to_camel;
use crate::resolve::{resolve_interfaces, ResolvedInterfaces};

/// One inconsistency between the models file and the types file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    MissingInterface {
        model: String,
        line: usize,
        candidates_tried: Vec<String>,
    },
    MissingField {
        model: String,
        line: usize,
        field: String,
        camel_field: String,
        matched_interfaces: Vec<String>,
    },
}

impl Diagnostic {
    pub fn rule_id(&self) -> &'static str {
        match self {
            Self::MissingInterface { .. } => "MISSING_INTERFACE",
            Self::MissingField { .. } => "MISSING_FIELD",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::MissingInterface { model, .. } | Self::MissingField { model, .. } => model,
        }
    }

    /// Line of the model declaration in the models file.
    pub fn line(&self) -> usize {
        match self {
            Self::MissingInterface { line, .. } | Self::MissingField { line, .. } => *line,
        }
    }

    /// Comment that silences a missing-field finding when pasted into the types file.
    pub fn suggested_exemption(&self) -> Option<String> {
        match self {
            Self::MissingField { camel_field, .. } => {
                Some(format!("// Note: {} is backend only", camel_field))
            }
            Self::MissingInterface { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInterface {
                model,
                candidates_tried,
                ..
            } => write!(
                f,
                "No matching TypeScript interface found for model: {}\nSearched for interfaces: {}",
                model,
                candidates_tried.join(", ")
            ),
            Self::MissingField {
                model,
                field,
                camel_field,
                matched_interfaces,
                ..
            } => write!(
                f,
                "Field '{}' (camelCase: '{}') from model '{}' is missing in TypeScript types.\n\
                 Expected to find in interface(s): {}\n\
                 To ignore this field, add a comment that references it like: '// Note: {} is backend only'",
                field,
                camel_field,
                model,
                matched_interfaces.join(", "),
                camel_field
            ),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub models_checked: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A loaded input file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    /// Reads `path` as UTF-8, distinguishing I/O failures from bad encoding.
    pub fn read(path: &Path) -> Result<Self, CheckError> {
        let bytes = std::fs::read(path).map_err(|source| CheckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| CheckError::NotUtf8 {
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }
}

pub struct ConsistencyChecker {
    config: CheckerConfig,
    backend: DjangoModelExtractor,
    frontend: TypeScriptInterfaceExtractor,
    matcher: NameMatcher,
}

impl Default for ConsistencyChecker {
    fn default() -> Self {
        Self::new(CheckerConfig::default())
    }
}

impl ConsistencyChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self {
            backend: DjangoModelExtractor::new(config.all_field_markers()),
            frontend: TypeScriptInterfaceExtractor::new(),
            matcher: NameMatcher::new(config.name_suffixes.clone()),
            config,
        }
    }

    /// Loads both files (models first) and checks them. A models file that
    /// does not parse is reported even when the types file cannot be read.
    pub fn check_files(&self, models_path: &Path, types_path: &Path) -> Result<CheckReport, CheckError> {
        let models = SourceFile::read(models_path)?;
        let types = match SourceFile::read(types_path) {
            Ok(types) => types,
            Err(err) => {
                self.extract_backend(&models)?;
                return Err(err);
            }
        };
        self.check_sources(&models, &types)
    }

    pub fn check_sources(&self, models: &SourceFile, types: &SourceFile) -> Result<CheckReport, CheckError> {
        let (backend_models, surface) = self.extract(models, types)?;
        tracing::debug!(
            stage = "extracted",
            models = backend_models.len(),
            interfaces = surface.interfaces.len()
        );

        let resolved = resolve_interfaces(&surface.interfaces);
        tracing::debug!(stage = "resolved", interfaces = resolved.len());

        let report = self.check_models(&backend_models, &surface, &resolved, &types.text);
        tracing::debug!(stage = "checked", diagnostics = report.diagnostics.len());
        Ok(report)
    }

    /// Both passes run side by side; a broken models file is reported first.
    fn extract(
        &self,
        models: &SourceFile,
        types: &SourceFile,
    ) -> Result<(Vec<BackendModel>, FrontendSurface), CheckError> {
        let (backend, frontend) = std::thread::scope(|scope| {
            let frontend = scope.spawn(|| self.frontend.extract(&types.text));
            let backend = self.extract_backend(models);
            let frontend = frontend
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (backend, frontend)
        });

        let backend = backend?;
        let frontend = frontend.map_err(|source| CheckError::Parse {
            path: types.path.clone(),
            source,
        })?;
        Ok((backend, frontend))
    }

    fn extract_backend(&self, models: &SourceFile) -> Result<Vec<BackendModel>, CheckError> {
        self.backend
            .extract(&models.text)
            .map_err(|source| CheckError::Parse {
                path: models.path.clone(),
                source,
            })
    }

    fn check_models(
        &self,
        models: &[BackendModel],
        surface: &FrontendSurface,
        resolved: &ResolvedInterfaces,
        types_text: &str,
    ) -> CheckReport {
        let weak_text = self.config.weak_confirmation.then_some(types_text);
        let mut diagnostics = Vec::new();
        let mut models_checked = 0;

        for model in models {
            if self.config.ignored_models.contains(&model.name) {
                tracing::debug!(model = %model.name, "model ignored by config");
                continue;
            }
            models_checked += 1;

            let matched = self.matcher.match_interfaces(&model.name, resolved);
            if matched.is_empty() {
                diagnostics.push(Diagnostic::MissingInterface {
                    model: model.name.clone(),
                    line: model.line,
                    candidates_tried: self.matcher.candidate_names(&model.name),
                });
                continue;
            }
            tracing::trace!(model = %model.name, interfaces = ?matched.keys().collect::<Vec<_>>(), "matched");

            for field in &model.fields {
                match account_for(field, &matched, &surface.backend_only, weak_text) {
                    Some(reason) => {
                        tracing::trace!(model = %model.name, field = %field, ?reason, "field accounted for");
                    }
                    None => diagnostics.push(Diagnostic::MissingField {
                        model: model.name.clone(),
                        line: model.line,
                        field: field.clone(),
                        camel_field: to_camel(field),
                        matched_interfaces: matched.keys().map(|k| k.to_string()).collect(),
                    }),
                }
            }
        }

        CheckReport {
            models_checked,
            diagnostics,
        }
    }
}
