//! Configuration loading for filify.
//!
//! Configuration is stored in TOML format and controls the target directory,
//! the extension-to-category mapping, the fallback category, and exclusion
//! rules for files that should never be organized.
//!
//! # Configuration File Format
//!
//! ```toml
//! target_directory = "/home/user/Downloads"
//! default_category = "Others"
//!
//! [categories]
//! Images    = ["jpg", "png", "gif"]
//! Documents = ["pdf", "docx", "txt"]
//!
//! [exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part"]
//! regex = []
//! skip_hidden = true
//! ```

use crate::classifier::Classifier;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A category folder name or the default category is empty.
    EmptyCategoryName,
    /// Invalid glob pattern in the exclude rules.
    InvalidGlobPattern(String),
    /// Invalid regex pattern in the exclude rules, with the compile error.
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
            ConfigError::EmptyCategoryName => {
                write!(f, "Category folder names must be non-empty")
            }
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

/// Top-level filify configuration, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The directory whose files are organized. Defaults to the current directory.
    #[serde(default = "default_target_directory")]
    pub target_directory: PathBuf,

    /// Category folder for files whose extension maps to nothing.
    #[serde(default = "default_category_name")]
    pub default_category: String,

    /// Category folder name -> extensions belonging to it (leading dot optional).
    #[serde(default = "default_categories")]
    pub categories: HashMap<String, Vec<String>>,

    /// Rules for excluding files from organization.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_target_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_category_name() -> String {
    "Others".to_string()
}

/// Built-in category mapping used when no `[categories]` table is configured.
fn default_categories() -> HashMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("Images", &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"]),
        ("Documents", &["pdf", "doc", "docx", "txt", "md", "odt", "rtf"]),
        ("Audio", &["mp3", "wav", "flac", "ogg", "m4a"]),
        ("Videos", &["mp4", "mkv", "avi", "mov", "webm"]),
        ("Archives", &["zip", "tar", "gz", "rar", "7z"]),
        ("Spreadsheets", &["xls", "xlsx", "csv", "ods"]),
    ];

    table
        .iter()
        .map(|(folder, exts)| {
            (
                folder.to_string(),
                exts.iter().map(|e| e.to_string()).collect(),
            )
        })
        .collect()
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against filenames.
    #[serde(default)]
    pub regex: Vec<String>,

    /// Whether dotfiles are skipped. Defaults to true.
    #[serde(default = "default_skip_hidden")]
    pub skip_hidden: bool,
}

fn default_skip_hidden() -> bool {
    true
}

impl Default for ExcludeRules {
    fn default() -> Self {
        Self {
            filenames: Vec::new(),
            patterns: Vec::new(),
            regex: Vec::new(),
            skip_hidden: true,
        }
    }
}

impl Config {
    /// Load configuration, with fallback to defaults.
    ///
    /// Resolution order:
    /// 1. If `config_path` is provided, load from that file (missing file is an error)
    /// 2. `./filify.toml` in the current directory
    /// 3. `~/.config/filify/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from("filify.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("filify")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Build the extension classifier from the category table.
    ///
    /// Inverts `[categories]` into an extension -> folder map. Extensions are
    /// normalized to lowercase with a leading dot, so both `"jpg"` and
    /// `".JPG"` in the configuration match `photo.jpg` on disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyCategoryName` if any folder name or the
    /// default category is empty.
    pub fn classifier(&self) -> Result<Classifier, ConfigError> {
        if self.default_category.trim().is_empty() {
            return Err(ConfigError::EmptyCategoryName);
        }

        let mut by_extension = HashMap::new();
        for (folder, extensions) in &self.categories {
            if folder.trim().is_empty() {
                return Err(ConfigError::EmptyCategoryName);
            }
            for ext in extensions {
                let normalized = format!(".{}", ext.trim_start_matches('.').to_lowercase());
                by_extension.insert(normalized, folder.clone());
            }
        }

        Ok(Classifier::new(by_extension, self.default_category.clone()))
    }

    /// Compile the exclude rules into matchers for efficient per-file checks.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compiled_excludes(&self) -> Result<CompiledExcludes, ConfigError> {
        CompiledExcludes::new(&self.exclude)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_directory: default_target_directory(),
            default_category: default_category_name(),
            categories: default_categories(),
            exclude: ExcludeRules::default(),
        }
    }
}

/// Pre-compiled exclusion matchers.
///
/// Glob and regex patterns are compiled once at startup so the per-file check
/// during a directory scan never reparses a pattern.
pub struct CompiledExcludes {
    skip_hidden: bool,
    filenames: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledExcludes {
    fn new(rules: &ExcludeRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
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
            skip_hidden: rules.skip_hidden,
            filenames: rules.filenames.iter().cloned().collect(),
            patterns,
            regexes,
        })
    }

    /// Check whether a file is eligible for organization (not excluded).
    ///
    /// Checks in order, with early termination:
    /// 1. Hidden file filter
    /// 2. Exact filename match
    /// 3. Glob pattern match
    /// 4. Regex pattern match
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.filenames.contains(file_name.as_ref()) {
            return false;
        }

        if self.patterns.iter().any(|p| p.matches_path(file_path)) {
            return false;
        }

        if self.regexes.iter().any(|r| r.is_match(&file_name)) {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_builtin_categories() {
        let config = Config::default();
        assert!(config.categories.contains_key("Images"));
        assert_eq!(config.default_category, "Others");
        assert!(config.exclude.skip_hidden);
    }

    #[test]
    fn test_classifier_normalizes_extensions() {
        let mut categories = HashMap::new();
        categories.insert(
            "Images".to_string(),
            vec!["JPG".to_string(), ".png".to_string()],
        );
        let config = Config {
            categories,
            ..Config::default()
        };

        let classifier = config.classifier().unwrap();
        assert_eq!(classifier.classify("photo.jpg"), "Images");
        assert_eq!(classifier.classify("shot.PNG"), "Images");
    }

    #[test]
    fn test_empty_category_name_rejected() {
        let mut categories = HashMap::new();
        categories.insert("".to_string(), vec!["jpg".to_string()]);
        let config = Config {
            categories,
            ..Config::default()
        };

        assert!(matches!(
            config.classifier(),
            Err(ConfigError::EmptyCategoryName)
        ));
    }

    #[test]
    fn test_empty_default_category_rejected() {
        let config = Config {
            default_category: "  ".to_string(),
            ..Config::default()
        };

        assert!(matches!(
            config.classifier(),
            Err(ConfigError::EmptyCategoryName)
        ));
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_str = r#"
            target_directory = "/tmp/downloads"
            default_category = "Misc"

            [categories]
            Pics = ["jpg"]

            [exclude]
            filenames = ["Thumbs.db"]
            skip_hidden = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.target_directory, PathBuf::from("/tmp/downloads"));
        assert_eq!(config.default_category, "Misc");
        assert_eq!(config.categories["Pics"], vec!["jpg"]);
        assert!(!config.exclude.skip_hidden);
    }

    #[test]
    fn test_hidden_file_excluded_by_default() {
        let config = Config::default();
        let excludes = config.compiled_excludes().unwrap();

        assert!(!excludes.should_include(Path::new(".DS_Store")));
        assert!(excludes.should_include(Path::new("report.pdf")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let config = Config {
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".to_string()],
                ..Default::default()
            },
            ..Config::default()
        };
        let excludes = config.compiled_excludes().unwrap();

        assert!(!excludes.should_include(Path::new("Thumbs.db")));
        assert!(excludes.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_glob_pattern() {
        let config = Config {
            exclude: ExcludeRules {
                patterns: vec!["*.part".to_string()],
                ..Default::default()
            },
            ..Config::default()
        };
        let excludes = config.compiled_excludes().unwrap();

        assert!(!excludes.should_include(Path::new("download.part")));
        assert!(excludes.should_include(Path::new("download.iso")));
    }

    #[test]
    fn test_exclude_regex() {
        let config = Config {
            exclude: ExcludeRules {
                regex: vec![r"^~\$".to_string()],
                ..Default::default()
            },
            ..Config::default()
        };
        let excludes = config.compiled_excludes().unwrap();

        assert!(!excludes.should_include(Path::new("~$report.docx")));
        assert!(excludes.should_include(Path::new("report.docx")));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let config = Config {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Config::default()
        };

        assert!(config.compiled_excludes().is_err());
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let config = Config {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Config::default()
        };

        assert!(config.compiled_excludes().is_err());
    }
}
