//! `folio.toml` configuration.
//!
//! Every key is optional:
//!
//! ```toml
//! store_path = "data/folio.jsonl"
//! exported_by = "auditor@lab"
//!
//! [export]
//! format = "jsonl"
//! include_presence = false
//! verify_chain = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use folio_contracts::{
    error::{FolioError, FolioResult},
    export::ExportFormat,
};

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "folio.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    /// JSONL file backing the event store.
    pub store_path: PathBuf,
    /// Principal recorded as `exportedBy` when `--by` is not given.
    pub exported_by: String,
    pub export: ExportDefaults,
}

/// Defaults for `folio export`.  Command-line flags override them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportDefaults {
    pub format: ExportFormat,
    pub include_presence: bool,
    pub verify_chain: bool,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("folio-events.jsonl"),
            exported_by: "folio-cli".to_string(),
            export: ExportDefaults::default(),
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            format: ExportFormat::Json,
            include_presence: false,
            verify_chain: true,
        }
    }
}

impl FolioConfig {
    /// Parse `s` as TOML configuration.
    ///
    /// Returns `FolioError::ConfigError` if the TOML is malformed, has an
    /// unknown key, or a value of the wrong type.
    pub fn from_toml_str(s: &str) -> FolioResult<Self> {
        toml::from_str(s).map_err(|e| FolioError::ConfigError {
            reason: format!("failed to parse folio config: {}", e),
        })
    }

    /// Read and parse the file at `path`.
    pub fn from_file(path: &Path) -> FolioResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| FolioError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> FolioResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }
}
