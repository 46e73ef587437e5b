//! Configuration loading for company profiles and organizer settings.
//!
//! Configuration lives in a TOML file and is compiled at startup into the
//! immutable structures the engine consumes (profile store, classifier,
//! scan filters). All validation happens here; matching never sees a
//! malformed profile.
//!
//! # Configuration File Format
//!
//! ```toml
//! [settings]
//! default_threshold = 92
//! filename_bonus = 15
//! path_penalty = 10
//! date_from_filename = true
//! generic_words = ["fattura"]
//!
//! [[companies]]
//! name = "Area Finanza Spa"
//! aliases = ["Area Finanza", "AreaFinanza"]
//! required_keywords = ["finanza"]
//! excluded_standalone = ["area", "spa"]
//! threshold = 90
//!
//! [extensions]
//! log = "Other"
//!
//! [scan]
//! exclude_extensions = ["tmp", "bak"]
//! exclude_folders = ["node_modules", ".git"]
//! exclude_patterns = ["~$*"]
//! max_size_mb = 512
//! ```

use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classifier::{Classifier, ExtensionMapper, FileCategory};
use crate::profile::{CompanyProfile, MatchSettings, ProfileStore};

/// Errors that can occur while loading and validating configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A company profile has an empty name.
    EmptyCompanyName,
    /// Two company profiles share the same name.
    DuplicateCompany(String),
    /// A threshold falls outside the 0..=100 range.
    ThresholdOutOfRange { company: String, value: u8 },
    /// An extension override names a category label that does not exist.
    UnknownCategory { extension: String, label: String },
    /// Invalid glob pattern in the scan rules.
    InvalidGlobPattern(String),
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
            ConfigError::EmptyCompanyName => {
                write!(f, "Company profiles must have a non-empty name")
            }
            ConfigError::DuplicateCompany(name) => {
                write!(f, "Duplicate company profile: '{}'", name)
            }
            ConfigError::ThresholdOutOfRange { company, value } => {
                write!(
                    f,
                    "Threshold {} for company '{}' is outside 0..=100",
                    value, company
                )
            }
            ConfigError::UnknownCategory { extension, label } => {
                write!(
                    f,
                    "Extension override '{}' names unknown category '{}'",
                    extension, label
                )
            }
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub companies: Vec<CompanyEntry>,

    /// Extension overrides: extension -> category label.
    #[serde(default)]
    pub extensions: std::collections::BTreeMap<String, String>,

    #[serde(default)]
    pub scan: ScanRules,
}

/// Global matching and classification knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_threshold")]
    pub default_threshold: u8,

    #[serde(default = "default_filename_bonus")]
    pub filename_bonus: u8,

    #[serde(default = "default_path_penalty")]
    pub path_penalty: u8,

    /// Whether to read filing dates embedded in filenames.
    #[serde(default = "default_date_from_filename")]
    pub date_from_filename: bool,

    /// Extra generic words, merged with the built-in list.
    #[serde(default)]
    pub generic_words: Vec<String>,
}

fn default_threshold() -> u8 {
    92
}

fn default_filename_bonus() -> u8 {
    15
}

fn default_path_penalty() -> u8 {
    10
}

fn default_date_from_filename() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            filename_bonus: default_filename_bonus(),
            path_penalty: default_path_penalty(),
            date_from_filename: default_date_from_filename(),
            generic_words: Vec::new(),
        }
    }
}

/// One company profile as written in the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyEntry {
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub required_keywords: Vec<String>,

    #[serde(default)]
    pub excluded_standalone: Vec<String>,

    #[serde(default)]
    pub threshold: Option<u8>,
}

/// Filtering rules for the filesystem scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRules {
    /// Extensions to include (empty = all), without dots.
    #[serde(default)]
    pub include_extensions: Vec<String>,

    /// Extensions to exclude, without dots.
    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// Directory names skipped entirely.
    #[serde(default)]
    pub exclude_folders: Vec<String>,

    /// Glob patterns excluding individual files.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Maximum file size in megabytes (absent = unlimited).
    #[serde(default)]
    pub max_size_mb: Option<f64>,

    /// Whether hidden files (leading dot) are scanned.
    #[serde(default)]
    pub include_hidden: bool,
}

impl OrganizerConfig {
    /// Load configuration with fallback to defaults.
    ///
    /// Lookup order: explicit path, `./.docsort.toml`, then
    /// `~/.config/docsort/config.toml`, then built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only when a located file cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".docsort.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("docsort")
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

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile the configuration into the immutable engine structures.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or duplicate company names, thresholds
    /// outside 0..=100, unknown category labels, or invalid glob patterns.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let profiles: Vec<CompanyProfile> = self
            .companies
            .into_iter()
            .map(|entry| CompanyProfile {
                name: entry.name,
                aliases: entry.aliases,
                required_keywords: entry.required_keywords.into_iter().collect(),
                excluded_standalone: entry.excluded_standalone.into_iter().collect(),
                threshold: entry.threshold,
            })
            .collect();

        let settings = MatchSettings {
            default_threshold: self.settings.default_threshold,
            filename_bonus: self.settings.filename_bonus,
            path_penalty: self.settings.path_penalty,
        };

        let store = ProfileStore::new(profiles, &self.settings.generic_words, settings)?;

        let mut mapper = ExtensionMapper::new();
        for (extension, label) in &self.extensions {
            let category =
                FileCategory::from_label(label).ok_or_else(|| ConfigError::UnknownCategory {
                    extension: extension.clone(),
                    label: label.clone(),
                })?;
            mapper.add_mapping(extension, category);
        }

        let classifier = Classifier::new(mapper, self.settings.date_from_filename);
        let scan = CompiledScanFilters::new(self.scan)?;

        Ok(CompiledConfig {
            store,
            classifier,
            scan,
        })
    }
}

/// Everything the organize pipeline needs, validated and immutable.
pub struct CompiledConfig {
    pub store: ProfileStore,
    pub classifier: Classifier,
    pub scan: CompiledScanFilters,
}

/// Pre-compiled scan filters so per-file checks never reparse patterns.
#[derive(Debug)]
pub struct CompiledScanFilters {
    include_extensions: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_folders: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    max_size_bytes: Option<u64>,
    include_hidden: bool,
}

impl CompiledScanFilters {
    pub fn new(rules: ScanRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_extensions: normalize_extensions(&rules.include_extensions),
            exclude_extensions: normalize_extensions(&rules.exclude_extensions),
            exclude_folders: rules.exclude_folders.into_iter().collect(),
            exclude_patterns,
            max_size_bytes: rules
                .max_size_mb
                .map(|mb| (mb * 1024.0 * 1024.0).max(0.0) as u64),
            include_hidden: rules.include_hidden,
        })
    }

    /// Whether a directory name should be descended into.
    pub fn should_descend(&self, dir_name: &str) -> bool {
        !self.exclude_folders.contains(dir_name)
            && (self.include_hidden || !dir_name.starts_with('.'))
    }

    /// Whether a file should be considered for organization.
    ///
    /// Checks, in order: hidden-file rule, extension include/exclude sets,
    /// glob exclude patterns, size cap. An unreadable size counts as
    /// allowed.
    pub fn should_include(&self, file_path: &Path, size_bytes: Option<u64>) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        let extension = file_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        if let Some(ext) = &extension {
            if self.exclude_extensions.contains(ext) {
                return false;
            }
            if !self.include_extensions.is_empty() && !self.include_extensions.contains(ext) {
                return false;
            }
        } else if !self.include_extensions.is_empty() {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|p| p.matches(&file_name) || p.matches_path(file_path))
        {
            return false;
        }

        if let (Some(limit), Some(size)) = (self.max_size_bytes, size_bytes)
            && size > limit
        {
            return false;
        }

        true
    }
}

fn normalize_extensions(extensions: &[String]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect()
}
