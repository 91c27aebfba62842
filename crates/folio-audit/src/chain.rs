//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input is the canonical JSON (serde_json, no pretty-printing) of the
//! following fields, in this fixed order:
//!
//!   id, projectId, artifactId, type, actorId, actorRole, targetId,
//!   timestamp (RFC 3339, UTC, `Z` suffix), metadata, previousHash
//!
//! `eventHash` is never part of its own input.  Every other field is, so any
//! edit to a stored event changes the recomputed hash.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use folio_contracts::{
    event::{Event, EventMetadata, NewEvent, GENESIS_HASH},
    kind::EventKind,
    verify::{BreakKind, BrokenLink, VerificationResult},
};

/// Borrowed view of an event in canonical field order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalEvent<'a> {
    id: &'a Uuid,
    project_id: &'a str,
    artifact_id: Option<&'a str>,
    #[serde(rename = "type")]
    kind: EventKind,
    actor_id: &'a str,
    actor_role: Option<&'a str>,
    target_id: Option<&'a str>,
    timestamp: String,
    metadata: &'a EventMetadata,
    previous_hash: &'a str,
}

/// The exact bytes that are hashed for `event`.
///
/// # Panics
///
/// Panics if the event cannot be serialized to JSON, which cannot happen for
/// the well-formed `Event` type (all map keys are strings).
pub fn canonical_bytes(event: &Event) -> Vec<u8> {
    let canonical = CanonicalEvent {
        id: &event.id,
        project_id: &event.project_id,
        artifact_id: event.artifact_id.as_deref(),
        kind: event.kind,
        actor_id: &event.actor_id,
        actor_role: event.actor_role.as_deref(),
        target_id: event.target_id.as_deref(),
        timestamp: event.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        metadata: &event.metadata,
        previous_hash: &event.previous_hash,
    };
    serde_json::to_vec(&canonical).expect("Event must always be serializable to JSON")
}

/// Compute the SHA-256 hash of an event's canonical content.
///
/// Ignores whatever is stored in `event.event_hash`.  Returns a lowercase
/// 64-character hex string.
pub fn hash_event(event: &Event) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes(event));
    hex::encode(hasher.finalize())
}

/// Build a complete event from recorder input and its assigned linkage.
pub fn seal(new: NewEvent, id: Uuid, timestamp: DateTime<Utc>, previous_hash: &str) -> Event {
    let mut event = Event {
        id,
        project_id: new.project_id,
        artifact_id: new.artifact_id,
        kind: new.kind,
        actor_id: new.actor_id,
        actor_role: new.actor_role,
        target_id: new.target_id,
        timestamp,
        metadata: new.metadata,
        previous_hash: previous_hash.to_string(),
        event_hash: String::new(),
    };
    event.event_hash = hash_event(&event);
    event
}

/// Verify a chain that must start at the genesis sentinel.
///
/// For each event, in order:
///
/// 1. **Linkage**: `previous_hash` must equal the stored `event_hash` of the
///    preceding event (`GENESIS_HASH` for the first).
/// 2. **Hash correctness**: `event_hash` must equal the recomputed hash.
///
/// The walk continues with the *stored* hash after a failure, so one altered
/// event is reported once instead of breaking every link after it.  An empty
/// slice is valid.
pub fn verify_chain(events: &[Event]) -> VerificationResult {
    verify_from(GENESIS_HASH, events)
}

/// Verify a fragment cut from the middle of a log.
///
/// Same rules as `verify_chain`, but the first event is trusted to link to
/// whatever predecessor it names.  A valid result only means the fragment is
/// internally consistent, not that the full log is.
pub fn verify_segment(events: &[Event]) -> VerificationResult {
    match events.first() {
        Some(first) => verify_from(&first.previous_hash, events),
        None => verify_from(GENESIS_HASH, events),
    }
}

fn verify_from(anchor: &str, events: &[Event]) -> VerificationResult {
    let mut expected_prev = anchor.to_string();
    let mut verified_events = 0;
    let mut broken_links = Vec::new();

    for event in events {
        if event.previous_hash == expected_prev {
            verified_events += 1;
        } else {
            warn!(
                event_id = %event.id,
                expected = %expected_prev,
                actual = %event.previous_hash,
                "broken chain link"
            );
            broken_links.push(BrokenLink {
                event_id: event.id,
                kind: BreakKind::Linkage,
                expected: expected_prev.clone(),
                actual: event.previous_hash.clone(),
            });
        }

        let recomputed = hash_event(event);
        if recomputed != event.event_hash {
            warn!(
                event_id = %event.id,
                recomputed = %recomputed,
                stored = %event.event_hash,
                "event hash mismatch"
            );
            broken_links.push(BrokenLink {
                event_id: event.id,
                kind: BreakKind::HashMismatch,
                expected: recomputed,
                actual: event.event_hash.clone(),
            });
        }

        expected_prev = event.event_hash.clone();
    }

    VerificationResult {
        valid: broken_links.is_empty(),
        total_events: events.len(),
        verified_events,
        broken_links,
        first_hash: events.first().map(|e| e.event_hash.clone()).unwrap_or_default(),
        last_hash: events.last().map(|e| e.event_hash.clone()).unwrap_or_default(),
    }
}

/// Ids of events whose timestamp is earlier than their chain predecessor's.
///
/// Chain order and time order only diverge under clock skew or a bug, so a
/// non-empty result is worth surfacing even when the chain itself is valid.
pub fn timestamp_regressions(events: &[Event]) -> Vec<Uuid> {
    events
        .windows(2)
        .filter(|pair| pair[1].timestamp < pair[0].timestamp)
        .map(|pair| pair[1].id)
        .collect()
}
