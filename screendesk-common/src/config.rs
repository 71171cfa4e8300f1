//! Configuration loading and root folder resolution
//!
//! The root folder holds the console's sqlite store. Collaborator endpoints
//! (compliance backend, search index) come from the TOML config with
//! environment-variable overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the root data folder
pub const ROOT_FOLDER_ENV: &str = "SCREENDESK_ROOT_FOLDER";

/// Console configuration loaded from TOML
///
/// Every field has a serde default so a partial (or absent) config file
/// still yields a runnable console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Port the console binds on (loopback only)
    pub listen_port: u16,
    /// Base URL of the compliance backend (imports, search, audit logs)
    pub backend_base_url: String,
    /// Base URL of the full-text search index
    pub index_base_url: String,
    /// Index name queried for batch screening
    pub index_name: String,
    /// Per-request timeout for collaborator calls, seconds
    pub request_timeout_secs: u64,
    /// Bounded concurrency for batch screening queries
    pub screening_concurrency: usize,
    /// Per-row query timeout during batch screening, seconds
    pub row_timeout_secs: u64,
    /// Overall deadline for one batch screening session, seconds
    pub batch_deadline_secs: u64,
    /// Similarity percentage at which a search hit is auto-flagged
    pub flag_threshold: f64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            listen_port: 5764,
            backend_base_url: "http://127.0.0.1:8080".to_string(),
            index_base_url: "http://127.0.0.1:9200".to_string(),
            index_name: "sanctions".to_string(),
            request_timeout_secs: 30,
            screening_concurrency: 4,
            row_timeout_secs: 20,
            batch_deadline_secs: 600,
            flag_threshold: 90.0,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration: TOML file (if present) then env overrides
    ///
    /// Priority per key: environment variable → TOML file → compiled default.
    pub fn load(root_folder: &Path) -> Result<Self> {
        let mut config = Self::load_toml(root_folder)?.unwrap_or_default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn load_toml(root_folder: &Path) -> Result<Option<Self>> {
        let path = root_folder.join("screendesk.toml");
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))?;
        Ok(Some(config))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SCREENDESK_BACKEND_URL") {
            self.backend_base_url = url;
        }
        if let Ok(url) = std::env::var("SCREENDESK_INDEX_URL") {
            self.index_base_url = url;
        }
        if let Ok(name) = std::env::var("SCREENDESK_INDEX_NAME") {
            self.index_name = name;
        }
        if let Ok(port) = std::env::var("SCREENDESK_PORT") {
            if let Ok(port) = port.parse() {
                self.listen_port = port;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.screening_concurrency == 0 {
            return Err(Error::Config(
                "screening_concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.flag_threshold) {
            return Err(Error::Config(format!(
                "flag_threshold must be within 0-100, got {}",
                self.flag_threshold
            )));
        }
        Ok(())
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: OS-dependent compiled default
    default_root_folder()
}

/// Create the root folder if missing and return the store database path
pub fn ensure_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join("screendesk.db"))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/screendesk
        dirs::data_local_dir()
            .map(|d| d.join("screendesk"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/screendesk"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/screendesk
        dirs::data_dir()
            .map(|d| d.join("screendesk"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/screendesk"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\screendesk
        dirs::data_local_dir()
            .map(|d| d.join("screendesk"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\screendesk"))
    } else {
        PathBuf::from("./screendesk_data")
    }
}
