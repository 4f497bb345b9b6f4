use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CheckError;
use crate::extract::python::DJANGO_FIELD_MARKERS;

/// Name of the optional config file looked up from the working directory upwards.
pub const CONFIG_FILE: &str = ".typecheckrc.toml";

/// Interface-name suffixes tried for every model name.
pub const DEFAULT_NAME_SUFFIXES: &[&str] = &["", "Base", "Response", "Type"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CheckerConfig {
    /// Extra callee-name fragments that mark a schema field, on top of the Django ones.
    pub field_markers: Vec<String>,
    pub name_suffixes: Vec<String>,
    /// Models skipped entirely, by class name.
    pub ignored_models: Vec<String>,
    /// Accept a field when its camelCase name appears anywhere in the types file.
    pub weak_confirmation: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            field_markers: Vec::new(),
            name_suffixes: DEFAULT_NAME_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            ignored_models: Vec::new(),
            weak_confirmation: true,
        }
    }
}

impl CheckerConfig {
    /// The built-in Django markers followed by any configured extras.
    pub fn all_field_markers(&self) -> Vec<String> {
        let mut markers: Vec<String> = DJANGO_FIELD_MARKERS.iter().map(|m| m.to_string()).collect();
        for extra in &self.field_markers {
            if !markers.contains(extra) {
                markers.push(extra.clone());
            }
        }
        markers
    }

    /// Reads a config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, CheckError> {
        let content = fs::read_to_string(path).map_err(|source| CheckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| CheckError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Uses `explicit` when given, otherwise the nearest `.typecheckrc.toml`
    /// at or above `start`, otherwise defaults.
    pub fn discover(explicit: Option<&Path>, start: &Path) -> Result<Self, CheckError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::find_config_file(start) {
            Some(path) => {
                tracing::debug!(config = %path.display(), "loading config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Walks from `start` up to the filesystem root looking for the config file.
    pub fn find_config_file(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CheckerConfig::default();
        assert_eq!(config.name_suffixes, vec!["", "Base", "Response", "Type"]);
        assert!(config.weak_confirmation);
        assert_eq!(config.all_field_markers().len(), DJANGO_FIELD_MARKERS.len());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "weak_confirmation = false\nfield_markers = [\"Column\", \"Field\"]\n").unwrap();

        let config = CheckerConfig::load(&path).unwrap();
        assert!(!config.weak_confirmation);
        assert_eq!(config.name_suffixes, CheckerConfig::default().name_suffixes);
        let markers = config.all_field_markers();
        assert_eq!(markers.len(), DJANGO_FIELD_MARKERS.len() + 1, "Field is not duplicated");
        assert_eq!(markers.last().map(String::as_str), Some("Column"));
    }

    #[test]
    fn test_discover_walks_up_from_nested_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "ignored_models = [\"AbstractBase\"]\n").unwrap();
        let nested = tmp.path().join("backend/apps/events");
        fs::create_dir_all(&nested).unwrap();

        let config = CheckerConfig::discover(None, &nested).unwrap();
        assert_eq!(config.ignored_models, vec!["AbstractBase"]);
    }

    #[test]
    fn test_discover_without_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        // Only meaningful when no ancestor of the temp dir carries a config file.
        if CheckerConfig::find_config_file(tmp.path()).is_none() {
            assert_eq!(CheckerConfig::discover(None, tmp.path()).unwrap(), CheckerConfig::default());
        }
    }

    #[test]
    fn test_invalid_file_names_the_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.toml");
        fs::write(&path, "weak_confirmation = \"maybe\"\n").unwrap();

        let err = CheckerConfig::discover(Some(&path), tmp.path()).unwrap_err();
        assert!(matches!(err, CheckError::Config { .. }));
        assert_eq!(err.path(), path.as_path());
    }
}
