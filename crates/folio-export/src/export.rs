//! Export builder and wire formatters.
//!
//! `build_export` selects events with the query engine and, when asked,
//! verifies exactly that selection from genesis.  A selection that skips
//! interior events (a time window, a kind filter, hidden presence events)
//! will therefore report broken links: a valid result means the exported
//! fragment is a complete prefix of the log, nothing more.
//!
//! `format_export` renders the snapshot as json, jsonl, or csv.  Only json is
//! re-importable; csv deliberately omits the integrity summary.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use folio_audit::{chain::verify_chain, query::query, recorder::AuditRecorder, store::EventStore};
use folio_contracts::{
    error::{FolioError, FolioResult},
    event::Event,
    export::{ChainIntegrity, ExportFormat, ExportOptions, ExportedLog},
};

/// Column order of the csv format.
pub const CSV_COLUMNS: [&str; 9] = [
    "id",
    "timestamp",
    "type",
    "actorId",
    "actorRole",
    "artifactId",
    "targetId",
    "previousHash",
    "eventHash",
];

/// Build an export snapshot from `events`.
///
/// # Errors
///
/// `InvalidOptions` when no project id is given, `exported_by` is blank, or
/// the time window is inverted.
pub fn build_export(
    events: &[Event],
    options: ExportOptions,
    exported_by: &str,
) -> FolioResult<ExportedLog> {
    let project_id = match options.query.project_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(FolioError::InvalidOptions {
                reason: "an export requires a project id".to_string(),
            })
        }
    };
    if exported_by.trim().is_empty() {
        return Err(FolioError::InvalidOptions {
            reason: "an export requires the exporting principal".to_string(),
        });
    }
    options.query.validate()?;

    let selected = query(events, &options.query);
    let chain_integrity = integrity_for(&selected, options.verify_chain);

    let log = ExportedLog {
        export_id: Uuid::new_v4(),
        project_id,
        exported_at: Utc::now(),
        exported_by: exported_by.to_string(),
        options,
        chain_integrity,
        events: selected,
    };

    info!(
        export_id = %log.export_id,
        project_id = %log.project_id,
        exported_by = %log.exported_by,
        event_count = log.events.len(),
        checked = log.chain_integrity.checked,
        verified = log.chain_integrity.verified,
        "export built"
    );

    Ok(log)
}

/// Build an export from a consistent snapshot of a recorder's log.
pub fn export_from<S: EventStore>(
    recorder: &AuditRecorder<S>,
    options: ExportOptions,
    exported_by: &str,
) -> FolioResult<ExportedLog> {
    build_export(&recorder.snapshot()?, options, exported_by)
}

fn integrity_for(selected: &[Event], verify: bool) -> ChainIntegrity {
    if verify && !selected.is_empty() {
        let result = verify_chain(selected);
        let mut broken_links: Vec<Uuid> = result.broken_links.iter().map(|l| l.event_id).collect();
        // One event can fail both checks; list it once.
        broken_links.dedup();
        return ChainIntegrity {
            checked: true,
            verified: result.valid,
            first_hash: result.first_hash,
            last_hash: result.last_hash,
            total_events: result.total_events,
            broken_links,
        };
    }

    ChainIntegrity {
        checked: false,
        verified: false,
        first_hash: selected.first().map(|e| e.event_hash.clone()).unwrap_or_default(),
        last_hash: selected.last().map(|e| e.event_hash.clone()).unwrap_or_default(),
        total_events: selected.len(),
        broken_links: Vec::new(),
    }
}

// ── Formatters ────────────────────────────────────────────────────────────────

/// First line of a jsonl export.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonlHeader<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    export_id: &'a Uuid,
    project_id: &'a str,
    exported_at: &'a DateTime<Utc>,
    exported_by: &'a str,
    options: &'a ExportOptions,
    chain_integrity: &'a ChainIntegrity,
}

/// One event line of a jsonl export.  The event is nested because it carries
/// its own `type` field (the event kind).
#[derive(Serialize)]
struct JsonlEvent<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    event: &'a Event,
}

/// Render `log` in the requested wire format.
pub fn format_export(log: &ExportedLog, format: ExportFormat) -> FolioResult<Vec<u8>> {
    match format {
        ExportFormat::Json => serde_json::to_vec_pretty(log).map_err(serialization_error),
        ExportFormat::Jsonl => to_jsonl(log),
        ExportFormat::Csv => Ok(to_csv(log).into_bytes()),
    }
}

fn serialization_error(e: serde_json::Error) -> FolioError {
    FolioError::Serialization {
        reason: e.to_string(),
    }
}

fn to_jsonl(log: &ExportedLog) -> FolioResult<Vec<u8>> {
    let header = JsonlHeader {
        record_type: "header",
        export_id: &log.export_id,
        project_id: &log.project_id,
        exported_at: &log.exported_at,
        exported_by: &log.exported_by,
        options: &log.options,
        chain_integrity: &log.chain_integrity,
    };

    let mut out = serde_json::to_vec(&header).map_err(serialization_error)?;
    for event in &log.events {
        out.push(b'\n');
        let line = JsonlEvent {
            record_type: "event",
            event,
        };
        serde_json::to_writer(&mut out, &line).map_err(serialization_error)?;
    }
    out.push(b'\n');
    Ok(out)
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_row<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values.into_iter().map(csv_field).collect::<Vec<_>>().join(",")
}

fn to_csv(log: &ExportedLog) -> String {
    let mut lines = Vec::with_capacity(log.events.len() + 1);
    lines.push(csv_row(CSV_COLUMNS));

    for event in &log.events {
        let id = event.id.to_string();
        let timestamp = event.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        lines.push(csv_row([
            id.as_str(),
            timestamp.as_str(),
            event.kind.as_str(),
            event.actor_id.as_str(),
            event.actor_role.as_deref().unwrap_or(""),
            event.artifact_id.as_deref().unwrap_or(""),
            event.target_id.as_deref().unwrap_or(""),
            event.previous_hash.as_str(),
            event.event_hash.as_str(),
        ]));
    }

    lines.join("\n")
}
