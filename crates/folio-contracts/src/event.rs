//! Governance event types.
//!
//! `Event` is one immutable, hash-linked entry in a project's log.
//! `NewEvent` is what callers hand to the recorder: every field except the
//! ones the recorder assigns (id, timestamp, `previous_hash`, `event_hash`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::EventKind;

/// The `previous_hash` of the first event in every chain.
pub const GENESIS_HASH: &str = "GENESIS";

/// Kind-specific payload attached to an event.
///
/// Shapes the recorder knows about are typed variants; `Fields` is the escape
/// hatch for everything else.  Serialized adjacently tagged,
/// e.g. `{"shape": "comment", "data": {"commentId": "c-1", ...}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    tag = "shape",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum EventMetadata {
    #[default]
    Empty,

    DocumentEdit {
        version: Option<u64>,
        change_summary: Option<String>,
    },

    Comment {
        comment_id: String,
        parent_comment_id: Option<String>,
        excerpt: Option<String>,
    },

    Review {
        review_id: String,
        decision: Option<String>,
        note: Option<String>,
    },

    Access {
        permission: String,
        previous_permission: Option<String>,
    },

    Fields(BTreeMap<String, serde_json::Value>),
}

/// Recorder input: an event without its id, timestamp, or chain linkage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub project_id: String,
    pub artifact_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub actor_id: String,
    pub actor_role: Option<String>,
    pub target_id: Option<String>,
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl NewEvent {
    pub fn new(project_id: impl Into<String>, kind: EventKind, actor_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            artifact_id: None,
            kind,
            actor_id: actor_id.into(),
            actor_role: None,
            target_id: None,
            metadata: EventMetadata::Empty,
        }
    }

    pub fn with_artifact(mut self, artifact_id: impl Into<String>) -> Self {
        self.artifact_id = Some(artifact_id.into());
        self
    }

    pub fn with_actor_role(mut self, role: impl Into<String>) -> Self {
        self.actor_role = Some(role.into());
        self
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A single recorded governance action.
///
/// `event_hash` commits to every other field, including `previous_hash`,
/// so altering any of them is detectable by re-hashing.  It is computed once
/// by the recorder and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub project_id: String,
    pub artifact_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub actor_id: String,
    /// The actor's role label at the time of the action.
    pub actor_role: Option<String>,
    /// Secondary subject, e.g. the user a permission was granted to.
    pub target_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: EventMetadata,
    /// `event_hash` of the preceding event, or `GENESIS_HASH`.
    pub previous_hash: String,
    /// SHA-256 (hex) of this event's canonical content.
    pub event_hash: String,
}

impl Event {
    /// The calendar day (`YYYY-MM-DD`, UTC) this event was recorded on.
    pub fn day(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }
}
