//! Export snapshot types.
//!
//! An `ExportedLog` is produced on demand, never mutated, and carries enough
//! information for any holder of its bytes to re-verify it independently.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::FolioError, event::Event, query::QueryOptions};

/// Wire format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// The whole `ExportedLog`, pretty-printed.  The only re-importable format.
    #[default]
    Json,
    /// A header line followed by one line per event.
    Jsonl,
    /// Nine quoted columns per event.  Carries no integrity summary.
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "jsonl" => Ok(ExportFormat::Jsonl),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(FolioError::InvalidOptions {
                reason: format!("unknown export format '{}' (expected json, jsonl, or csv)", other),
            }),
        }
    }
}

/// Everything that controls an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    #[serde(flatten)]
    pub query: QueryOptions,
    pub verify_chain: bool,
    pub format: ExportFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            query: QueryOptions::default(),
            verify_chain: true,
            format: ExportFormat::Json,
        }
    }
}

/// Integrity summary embedded in json and jsonl exports.
///
/// Consumers must treat an export with `checked == false` as untrusted: the
/// endpoint hashes are present but nothing was verified.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainIntegrity {
    /// Whether the chain verifier actually ran over the exported events.
    #[serde(default)]
    pub checked: bool,
    pub verified: bool,
    pub first_hash: String,
    pub last_hash: String,
    pub total_events: usize,
    /// Ids of events at which a broken link or hash mismatch was found.
    pub broken_links: Vec<Uuid>,
}

impl ChainIntegrity {
    pub fn is_trusted(&self) -> bool {
        self.checked && self.verified
    }
}

/// A filtered, self-describing snapshot of a project's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedLog {
    pub export_id: Uuid,
    pub project_id: String,
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
    pub options: ExportOptions,
    pub chain_integrity: ChainIntegrity,
    pub events: Vec<Event>,
}

/// Outcome of re-verifying exported bytes.
///
/// `log` is `None` when the bytes could not be parsed or were structurally
/// incomplete; in that case `errors` explains why and no chain check ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverifyReport {
    pub valid: bool,
    pub log: Option<ExportedLog>,
    pub errors: Vec<String>,
}
