//! # folio-export
//!
//! Export, import re-verification, and activity summaries for the Folio
//! governance event log.
//!
//! - [`export::build_export`] selects events and embeds a chain-integrity
//!   summary; [`export::format_export`] renders json, jsonl, or csv.
//! - [`import::reverify`] re-checks exported json bytes from scratch,
//!   structurally (JSON Schema via the `jsonschema` crate) and cryptographically.
//! - [`summary::summarize`] derives per-kind, per-actor, per-artifact, and
//!   per-day counts plus chain health for a time window.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use folio_contracts::{ExportFormat, ExportOptions, QueryOptions};
//! use folio_export::{build_export, format_export, reverify};
//!
//! let options = ExportOptions { query: QueryOptions::for_project("proj-1"), ..Default::default() };
//! let log = build_export(&events, options, "auditor@lab")?;
//! let bytes = format_export(&log, ExportFormat::Json)?;
//! assert!(reverify(&bytes).valid);
//! ```

pub mod export;
pub mod import;
pub mod summary;

pub use export::{build_export, export_from, format_export, CSV_COLUMNS};
pub use import::reverify;
pub use summary::{summarize, TOP_N};

// ── Tests ─────────────────────────────────────────────────────────────────────
