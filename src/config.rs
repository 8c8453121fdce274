//! Configuration file support.
//!
//! Settings are read from a TOML file holding the defaults the CLI falls back
//! on and the rules for which files a run should leave alone:
//!
//! ```toml
//! [defaults]
//! sort_order = "spot, category"
//! merge_landed_failed = true
//! modify_in_place = false
//! presets = "sort_config.json"
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! extensions = ["xmp"]
//! patterns = ["**/proxies/**"]
//! regex = []
//! ```

use crate::grouping::{PresetError, SortOrder, SortPresets};
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".clipsortrc.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided.
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Values used when the command line does not say otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Comma-separated grouping keys.
    pub sort_order: String,
    pub merge_landed_failed: bool,
    pub modify_in_place: bool,
    /// JSON file listing the sort order presets.
    pub presets: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            sort_order: "spot, category".to_string(),
            merge_landed_failed: true,
            modify_in_place: false,
            presets: None,
        }
    }
}

/// Which files a run processes.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterRules {
    /// Whether files whose name starts with a dot are processed.
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,
    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_include_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: default_include_hidden(),
            exclude: ExcludeRules::default(),
        }
    }
}

/// Rules for leaving files out of a run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names (e.g. ".DS_Store").
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Extensions without the dot, matched case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Glob patterns matched against the path relative to the input directory.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Config {
    /// Loads configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given
    /// 2. `.clipsortrc.toml` in the current directory
    /// 3. `~/.config/clipsort/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a file is found (or explicitly given) but cannot be
    /// read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("clipsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// The default sort order.
    pub fn sort_order(&self) -> SortOrder {
        SortOrder::parse(&self.defaults.sort_order)
    }

    /// Loads the configured presets, or the built-in ones.
    ///
    /// An explicit `override_path` wins over the configured file. Without
    /// either, a `sort_config.json` in the current directory is used when
    /// present.
    pub fn presets(&self, override_path: Option<&Path>) -> Result<SortPresets, PresetError> {
        if let Some(path) = override_path.or(self.defaults.presets.as_deref()) {
            return SortPresets::load(path);
        }

        let local = Path::new("sort_config.json");
        if local.exists() {
            return SortPresets::load(local);
        }

        Ok(SortPresets::builtin())
    }
}

impl FilterRules {
    /// Validates and compiles the rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        let patterns = self
            .exclude
            .patterns
            .iter()
            .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = self
            .exclude
            .regex
            .iter()
            .map(|r| {
                Regex::new(r).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: r.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledFilters {
            include_hidden: self.include_hidden,
            filenames: self.exclude.filenames.iter().cloned().collect(),
            extensions: self
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }
}

/// Filter rules ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl Default for CompiledFilters {
    /// Accepts every file.
    fn default() -> Self {
        Self {
            include_hidden: true,
            filenames: HashSet::new(),
            extensions: HashSet::new(),
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }
}

impl CompiledFilters {
    /// Whether a file takes part in a run.
    ///
    /// `relative_path` is the path below the input directory; globs match
    /// against it, every other rule against the file name.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension()
            && self
                .extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self.patterns.iter().any(|p| p.matches_path(relative_path)) {
            return false;
        }

        !self.regexes.iter().any(|r| r.is_match(&file_name))
    }
}
