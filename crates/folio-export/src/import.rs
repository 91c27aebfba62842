//! Import-time re-verification of json exports.
//!
//! The bytes are assumed hostile.  Nothing the export says about itself is
//! trusted: the embedded `chainIntegrity` is ignored and every check is
//! re-run from the events alone.
//!
//! Checks run in three stages, and the first two short-circuit:
//!
//! 1. **Parse**: the bytes must be JSON.
//! 2. **Structure**: the document must satisfy the export JSON Schema
//!    (`exportId`, `projectId`, and an `events` array are required) and
//!    decode into an `ExportedLog`.
//! 3. **Integrity**: the chain verifier runs over the events, then every
//!    event hash is recomputed once more on its own.  All violations are
//!    collected.

use serde_json::{json, Value};
use tracing::{info, warn};

use folio_audit::chain::{hash_event, verify_chain};
use folio_contracts::{
    export::{ExportedLog, ReverifyReport},
    verify::{BreakKind, BrokenLink},
};

/// JSON Schema every importable export must satisfy.
pub fn export_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["exportId", "projectId", "events"],
        "properties": {
            "exportId": { "type": "string", "minLength": 1 },
            "projectId": { "type": "string", "minLength": 1 },
            "events": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "previousHash", "eventHash"]
                }
            }
        }
    })
}

fn rejected(errors: Vec<String>) -> ReverifyReport {
    warn!(error_count = errors.len(), "export rejected before integrity checks");
    ReverifyReport {
        valid: false,
        log: None,
        errors,
    }
}

fn structural_errors(document: &Value) -> Vec<String> {
    match jsonschema::validator_for(&export_schema()) {
        Ok(validator) => validator
            .iter_errors(document)
            .map(|error| format!("structural error at '{}': {}", error.instance_path, error))
            .collect(),
        Err(e) => vec![format!("export schema failed to compile: {}", e)],
    }
}

fn describe(link: &BrokenLink) -> String {
    match link.kind {
        BreakKind::Linkage => format!(
            "chain: event {} links to {} but its predecessor hash is {}",
            link.event_id, link.actual, link.expected
        ),
        BreakKind::HashMismatch => format!(
            "chain: event {} stores hash {} but its content hashes to {}",
            link.event_id, link.actual, link.expected
        ),
    }
}

/// Re-verify previously exported json bytes.
///
/// `valid` is true only if the bytes parse, are structurally complete, every
/// event belongs to the export's project, and the chain verifies from genesis.
pub fn reverify(bytes: &[u8]) -> ReverifyReport {
    let document: Value = match serde_json::from_slice(bytes) {
        Ok(document) => document,
        Err(e) => return rejected(vec![format!("failed to parse export: {}", e)]),
    };

    let structural = structural_errors(&document);
    if !structural.is_empty() {
        return rejected(structural);
    }

    let log: ExportedLog = match serde_json::from_value(document) {
        Ok(log) => log,
        Err(e) => return rejected(vec![format!("malformed export: {}", e)]),
    };

    let mut errors = Vec::new();

    for event in log.events.iter().filter(|e| e.project_id != log.project_id) {
        errors.push(format!(
            "event {} belongs to project '{}', not '{}'",
            event.id, event.project_id, log.project_id
        ));
    }

    let result = verify_chain(&log.events);
    errors.extend(result.broken_links.iter().map(describe));

    for (position, event) in log.events.iter().enumerate() {
        let recomputed = hash_event(event);
        if recomputed != event.event_hash {
            errors.push(format!(
                "recompute: event {} at position {} stores hash {} but recomputes to {}",
                event.id, position, event.event_hash, recomputed
            ));
        }
    }

    let valid = errors.is_empty();
    if log.chain_integrity.verified && !valid {
        warn!(
            export_id = %log.export_id,
            "export claims a verified chain but re-verification failed"
        );
    }
    info!(
        export_id = %log.export_id,
        project_id = %log.project_id,
        event_count = log.events.len(),
        valid,
        error_count = errors.len(),
        "export re-verified"
    );

    ReverifyReport {
        valid,
        log: Some(log),
        errors,
    }
}
