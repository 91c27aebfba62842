//! Chain verification report types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which rule an event violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    /// The stored `previous_hash` does not match the preceding event.
    Linkage,
    /// The stored `event_hash` does not match the hash recomputed from content.
    HashMismatch,
}

/// One violation found while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLink {
    pub event_id: Uuid,
    pub kind: BreakKind,
    /// For `Linkage`: the hash the predecessor carried.  For `HashMismatch`:
    /// the recomputed hash.
    pub expected: String,
    /// The value actually stored on the event.
    pub actual: String,
}

/// The outcome of verifying an event sequence.
///
/// `valid` is true iff `broken_links` is empty.  Every violation is listed,
/// not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,
    pub total_events: usize,
    /// Events whose `previous_hash` matched the expected predecessor.
    pub verified_events: usize,
    pub broken_links: Vec<BrokenLink>,
    /// `event_hash` of the first event; empty for an empty sequence.
    pub first_hash: String,
    /// `event_hash` of the last event; empty for an empty sequence.
    pub last_hash: String,
}

impl VerificationResult {
    /// Broken links of the given kind.
    pub fn breaks_of(&self, kind: BreakKind) -> impl Iterator<Item = &BrokenLink> {
        self.broken_links.iter().filter(move |link| link.kind == kind)
    }
}
