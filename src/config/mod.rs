/// Configuration system for codeseer
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{CatalogError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Directory to catalog when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_path: Option<PathBuf>,

    /// Source file discovery
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Token estimation
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Catalog building and output
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Flattened collection output for the embedding side
    #[serde(default)]
    pub collection: CollectionConfig,
}

/// Source file discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    /// File extensions (without the dot) treated as source files
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns for paths to leave out
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Respect .gitignore / .ignore files while walking
    #[serde(default)]
    pub respect_gitignore: bool,

    /// Follow symbolic links while walking
    #[serde(default)]
    pub follow_links: bool,
}

/// Token estimation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenizerConfig {
    /// Model whose tokenizer is used (e.g. "gpt-4", "gpt-3.5-turbo")
    #[serde(default = "default_model")]
    pub model: String,

    /// Special tokens encoded as control tokens rather than plain text
    #[serde(default = "default_allowed_special")]
    pub allowed_special: Vec<String>,
}

/// What to do with a file the grammar rejects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Stop the whole build at the first failing file
    #[default]
    Abort,
    /// Log the file, leave it out of the catalog and keep going
    Skip,
}

impl std::str::FromStr for ParseErrorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(ParseErrorPolicy::Abort),
            "skip" => Ok(ParseErrorPolicy::Skip),
            other => Err(ConfigError::InvalidValue {
                key: "catalog.on_parse_error".to_string(),
                reason: format!("must be 'abort' or 'skip', got '{}'", other),
            }),
        }
    }
}

/// Catalog building configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Where the catalog artifact is written
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Indent the JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Policy for files that fail to parse
    #[serde(default)]
    pub on_parse_error: ParseErrorPolicy,

    /// Parse files on the rayon pool (output order is unchanged)
    #[serde(default)]
    pub parallel_extraction: bool,
}

/// Collection output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionConfig {
    /// JSON-lines file receiving flattened documents
    #[serde(default = "default_collection_path")]
    pub path: PathBuf,
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_allowed_special() -> Vec<String> {
    vec!["<|endoftext|>".to_string()]
}

fn default_output_path() -> PathBuf {
    PathBuf::from("code_data.json")
}

fn default_pretty() -> bool {
    true
}

fn default_collection_path() -> PathBuf {
    crate::paths::PlatformPaths::default_collection_path()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_patterns: Vec::new(),
            respect_gitignore: false,
            follow_links: false,
        }
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            allowed_special: default_allowed_special(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            pretty: default_pretty(),
            on_parse_error: ParseErrorPolicy::default(),
            parallel_extraction: false,
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            path: default_collection_path(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the given path, the default location, or fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CatalogError> {
        if let Some(path) = path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let config_path = crate::paths::PlatformPaths::default_config_path();
        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String, CatalogError> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)).into()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.discovery.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "discovery.extensions".to_string(),
                reason: "must list at least one extension".to_string(),
            }
            .into());
        }

        if let Some(ext) = self
            .discovery
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(ConfigError::InvalidValue {
                key: "discovery.extensions".to_string(),
                reason: format!("extensions are given without a leading dot, got '{}'", ext),
            }
            .into());
        }

        if self.tokenizer.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "tokenizer.model".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if self.catalog.output_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "catalog.output_path".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored. An unparseable parse-error policy is logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = var("CODESEER_CODE_PATH") {
            self.code_path = Some(PathBuf::from(path));
        }

        if let Some(model) = var("CODESEER_MODEL") {
            self.tokenizer.model = model;
        }

        if let Some(output) = var("CODESEER_OUTPUT") {
            self.catalog.output_path = PathBuf::from(output);
        }

        if let Some(policy) = var("CODESEER_ON_PARSE_ERROR") {
            match policy.parse() {
                Ok(policy) => self.catalog.on_parse_error = policy,
                Err(e) => tracing::warn!("Ignoring CODESEER_ON_PARSE_ERROR: {}", e),
            }
        }
    }

    /// Create a new Config from the config file (if any) with environment overrides
    pub fn new(path: Option<&Path>) -> Result<Self, CatalogError> {
        let mut config = Self::load_or_default(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
