/// Centralized error types for codeseer using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for catalog building
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Catalog I/O error: {0}")]
    CatalogIo(#[from] CatalogIoError),

    #[error("Collection error: {0}")]
    Sink(#[from] SinkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to source file discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid directory path: {0}")]
    InvalidDirectory(String),

    #[error("Failed to walk directory: {0}")]
    WalkFailed(String),
}

/// A source file that does not conform to the grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{file}:{line}:{column}: {reason}")]
pub struct ParseError {
    pub file: String,
    /// 1-based line of the first offending node
    pub line: usize,
    /// 0-based column of the first offending node
    pub column: usize,
    pub reason: String,
}

/// Errors related to token estimation
#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Unsupported tokenizer model: {0}")]
    UnsupportedModel(String),
}

/// Errors reading source files or reading/writing the catalog artifact
#[derive(Error, Debug)]
pub enum CatalogIoError {
    #[error("Failed to read file '{file}': {reason}")]
    FileReadFailed { file: String, reason: String },

    #[error("Failed to write catalog to '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to read catalog from '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to serialize catalog: {0}")]
    Serialization(String),
}

/// Errors raised by a document sink (the vector-store side of the boundary)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Failed to add record {id}: {reason}")]
    RecordAddFailure { id: String, reason: String },

    #[error("Failed to flush collection: {0}")]
    FlushFailed(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, CatalogError>;

// Conversion from anyhow::Error to CatalogError
impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        CatalogError::Other(format!("{:#}", err))
    }
}

impl CatalogError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        CatalogError::Other(msg.into())
    }
}
