//! Configuration file support.
//!
//! Settings live in a TOML file and cover three things: which scanned files
//! are considered at all (`[filters]`), how the directory is walked
//! (`[scan]`), and which document kinds are renamed when the command line
//! does not say (`[rename]`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = ["~$lock.docx"]
//! patterns = ["archive/**"]
//! extensions = ["tmp"]
//! regex = ["^~\\$"]
//!
//! [filters.include]
//! patterns = []
//!
//! [scan]
//! recursive = true
//!
//! [rename]
//! types = ["word", "excel", "powerpoint", "pdf", "csv"]
//! ```
//!
//! Every section and key is optional.

use crate::file_kind::FileKind;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".docrenamerc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A glob pattern does not compile.
    #[error("invalid glob pattern '{0}': expected e.g. *.tmp or archive/**")]
    InvalidGlobPattern(String),

    /// A regex pattern does not compile.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    /// The file exists but cannot be read.
    #[error("cannot read configuration: {0}")]
    IoError(String),
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenamerConfig {
    #[serde(default)]
    pub filters: FilterRules,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub rename: RenameSettings,
}

/// Which scanned files are considered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether files whose name starts with "." are considered.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist that overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for leaving files out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names, e.g. Office lock files.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns, matched against the path relative to the scanned directory.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, case-insensitive.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for keeping files regardless of the exclude rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// How the managed directory is walked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_recursive() -> bool {
    true
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            recursive: default_recursive(),
        }
    }
}

/// Rename defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameSettings {
    /// Kinds selected when `--types` is not given.
    #[serde(default = "default_types")]
    pub types: Vec<FileKind>,
}

fn default_types() -> Vec<FileKind> {
    FileKind::SUPPORTED.to_vec()
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            types: default_types(),
        }
    }
}

impl RenamerConfig {
    /// Loads configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (must exist)
    /// 2. `.docrenamerc.toml` in the current directory
    /// 3. `~/.config/docrenamer/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Fails if an explicit file is missing, or if the selected file cannot
    /// be read or parsed.
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
                .join("docrenamer")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Loads configuration from one file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compiles the filter rules for matching.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Filter rules with every pattern compiled up front.
///
/// The default value keeps everything except hidden files.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Compiles `rules`.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid glob or regex pattern.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Checks whether a file is considered.
    ///
    /// `relative_path` is the path below the scanned directory. Checks run
    /// in this order and stop at the first decision:
    /// 1. include patterns keep the file
    /// 2. hidden files are dropped unless enabled
    /// 3. exact file names
    /// 4. extensions
    /// 5. glob patterns
    /// 6. regexes on the file name
    /// 7. everything else is kept
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.include_patterns.iter().any(|p| p.matches_path(relative_path)) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches_path(relative_path)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|re| re.is_match(&file_name))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
