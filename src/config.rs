//! Comparison settings, the per-path comparator table, and the optional
//! TOML configuration file.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path as FsPath;
use std::sync::Arc;

/// Default for [`CompareSettings::non_standard_identifier_guess_count_threshold`].
pub const DEFAULT_IDENTIFIER_GUESS_THRESHOLD: usize = 3;

/// Annotation holding the JSON form of the last `kubectl apply`.
pub const LAST_APPLIED_CONFIGURATION_PATH: &str =
    "/metadata/annotations/kubectl.kubernetes.io~1last-applied-configuration";

/// Equality predicate for two string scalars at a specific path.
pub type StringComparator = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Table of string comparators keyed by rendered path.
#[derive(Clone, Default)]
pub struct Comparators {
    by_path: HashMap<String, StringComparator>,
}

impl Comparators {
    /// An empty table: every string compares literally.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table. Embedded JSON in the last-applied-configuration
    /// annotation is compared structurally.
    pub fn with_defaults() -> Self {
        Self::new().register(LAST_APPLIED_CONFIGURATION_PATH, json_equal)
    }

    pub fn register<F>(mut self, path: impl Into<String>, comparator: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.by_path.insert(path.into(), Arc::new(comparator));
        self
    }

    pub fn get(&self, path: &str) -> Option<&StringComparator> {
        self.by_path.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

impl fmt::Debug for Comparators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&String> = self.by_path.keys().collect();
        paths.sort();
        f.debug_struct("Comparators").field("paths", &paths).finish()
    }
}

/// Compares two strings as JSON documents when both parse, literally otherwise.
pub fn json_equal(a: &str, b: &str) -> bool {
    match (
        serde_json::from_str::<serde_json::Value>(a),
        serde_json::from_str::<serde_json::Value>(b),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Settings for one comparison run.
///
/// Build with `Default` and the builder methods, then hand a reference to
/// [`compare_input_files`](crate::diff::compare_input_files). The comparator
/// never mutates it.
#[derive(Debug, Clone)]
pub struct CompareSettings {
    /// Suppress order-change details.
    pub ignore_order_changes: bool,
    /// A guessed list identifier must have more distinct values than this.
    pub non_standard_identifier_guess_count_threshold: usize,
    /// Rendered paths whose appearance is not reported.
    pub paths_to_ignore_addition: HashSet<String>,
    /// Rendered paths whose disappearance is not reported.
    pub paths_to_ignore_removal: HashSet<String>,
    pub comparators: Comparators,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            ignore_order_changes: false,
            non_standard_identifier_guess_count_threshold: DEFAULT_IDENTIFIER_GUESS_THRESHOLD,
            paths_to_ignore_addition: HashSet::new(),
            paths_to_ignore_removal: HashSet::new(),
            comparators: Comparators::with_defaults(),
        }
    }
}

impl CompareSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_order_changes(mut self, ignore: bool) -> Self {
        self.ignore_order_changes = ignore;
        self
    }

    pub fn non_standard_identifier_guess_count_threshold(mut self, threshold: usize) -> Self {
        self.non_standard_identifier_guess_count_threshold = threshold;
        self
    }

    pub fn paths_to_ignore_addition<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths_to_ignore_addition
            .extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn paths_to_ignore_removal<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths_to_ignore_removal
            .extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn comparators(mut self, comparators: Comparators) -> Self {
        self.comparators = comparators;
        self
    }

    pub(crate) fn ignores_addition(&self, path: &str) -> bool {
        self.paths_to_ignore_addition.contains(path)
    }

    pub(crate) fn ignores_removal(&self, path: &str) -> bool {
        self.paths_to_ignore_removal.contains(path)
    }
}

/// A scoped normalizer rule as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizeRule {
    pub group: Option<String>,
    pub kind: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Contents of a `docdiff.toml` file. Every field is optional.
///
/// ```toml
/// ignore_order_changes = true
/// identifier_threshold = 5
/// ignore_additions = ["/metadata/labels"]
/// exclude = ["/status/**"]
///
/// [[normalize]]
/// kind = "Deployment"
/// paths = ["/metadata/annotations/deployment.kubernetes.io~1revision"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub ignore_order_changes: Option<bool>,
    pub identifier_threshold: Option<usize>,
    #[serde(default)]
    pub ignore_additions: Vec<String>,
    #[serde(default)]
    pub ignore_removals: Vec<String>,
    #[serde(default)]
    pub filter: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub normalize: Vec<NormalizeRule>,
}

impl ConfigFile {
    pub fn load(path: &FsPath) -> Result<Self, ConfigError> {
        let display = path.to_string_lossy().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: display.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|err| match err {
            ConfigError::TomlError { source, .. } => ConfigError::TomlError {
                path: display,
                source,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ConfigFile =
            toml::from_str(content).map_err(|source| ConfigError::TomlError {
                path: "<inline>".to_string(),
                source,
            })?;
        for rule in &config.normalize {
            if rule.paths.is_empty() {
                return Err(ConfigError::Invalid {
                    message: "normalize rules need at least one path".to_string(),
                });
            }
        }
        Ok(config)
    }

    /// Layers the file's comparison options on top of `settings`.
    pub fn apply(&self, mut settings: CompareSettings) -> CompareSettings {
        if let Some(ignore) = self.ignore_order_changes {
            settings = settings.ignore_order_changes(ignore);
        }
        if let Some(threshold) = self.identifier_threshold {
            settings = settings.non_standard_identifier_guess_count_threshold(threshold);
        }
        settings
            .paths_to_ignore_addition(self.ignore_additions.iter().cloned())
            .paths_to_ignore_removal(self.ignore_removals.iter().cloned())
    }
}
