//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file. Every key is optional;
//! a missing file means built-in defaults, never a startup failure.
//!
//! Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. `PODIUM_ROOT_FOLDER` environment variable
//! 3. `root_folder` key of the TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable consulted for the root folder
pub const ROOT_FOLDER_ENV: &str = "PODIUM_ROOT_FOLDER";

/// Database file name used when the TOML file does not name one
pub const DEFAULT_DATABASE_FILE: &str = "podium.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// SQLite database path, relative paths resolve against the root folder
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Import pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Lifetime of a staged extraction before it expires
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Rows returned in the extraction preview
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Largest source file accepted, in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Language passed to the OCR engine
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,

    /// OCR executable (tesseract compatible command line)
    #[serde(default = "default_ocr_command")]
    pub ocr_command: String,

    /// Invalidate an extraction once it has been confirmed
    #[serde(default = "default_consume_on_confirm")]
    pub consume_on_confirm: bool,
}

impl ImportConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            sample_rows: default_sample_rows(),
            max_file_bytes: default_max_file_bytes(),
            ocr_language: default_ocr_language(),
            ocr_command: default_ocr_command(),
            consume_on_confirm: default_consume_on_confirm(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_sample_rows() -> usize {
    20
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_ocr_language() -> String {
    "spa".to_string()
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

fn default_consume_on_confirm() -> bool {
    true
}

impl TomlConfig {
    /// Load configuration from `path`
    ///
    /// A missing file yields defaults with a warning; unreadable or malformed
    /// files are configuration errors.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "Config file not found, using built-in defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Loaded TOML config");
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the platform config file, or defaults if there is none
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.import.session_ttl_secs == 0 {
            return Err(Error::Config(
                "import.session_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.import.max_file_bytes == 0 {
            return Err(Error::Config(
                "import.max_file_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform config file location: `<config dir>/podium/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("podium").join("config.toml"))
}

/// Resolve the root folder from CLI argument, environment, TOML, then OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("podium"))
        .unwrap_or_else(|| PathBuf::from("./podium_data"))
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder if it is missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            debug!(path = %self.root_folder.display(), "Created root folder");
        }
        Ok(())
    }

    /// Database path: the configured one (relative paths join the root folder)
    pub fn database_path(&self, config: &TomlConfig) -> PathBuf {
        match &config.database_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.root_folder.join(path),
            None => self.root_folder.join(DEFAULT_DATABASE_FILE),
        }
    }
}
