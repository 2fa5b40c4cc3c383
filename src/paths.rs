//! Where codeseer keeps its config file and default collection

use std::path::PathBuf;

const APP_DIR: &str = "codeseer";

pub struct PlatformPaths;

impl PlatformPaths {
    /// `{data_local_dir}/codeseer`, or `./codeseer` when the platform has no
    /// data directory (no `HOME`, for example)
    pub fn project_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// `{config_dir}/codeseer`, with the same `.` fallback
    pub fn project_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn default_collection_path() -> PathBuf {
        Self::project_data_dir().join("collection.jsonl")
    }

    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }
}
