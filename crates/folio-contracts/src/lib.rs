//! # folio-contracts
//!
//! Shared types and errors for the Folio governance event log.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, small helpers, and error types.

pub mod error;
pub mod event;
pub mod export;
pub mod kind;
pub mod query;
pub mod summary;
pub mod verify;

pub use error::{FolioError, FolioResult};
pub use event::{Event, EventMetadata, NewEvent, GENESIS_HASH};
pub use export::{ChainIntegrity, ExportFormat, ExportOptions, ExportedLog, ReverifyReport};
pub use kind::{EventCategory, EventKind};
pub use query::QueryOptions;
pub use summary::{ActivityCount, AuditSummary, DailyActivity, TimeSpan};
pub use verify::{BreakKind, BrokenLink, VerificationResult};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    // ── EventKind ────────────────────────────────────────────────────────────

    #[test]
    fn event_kind_wire_name_matches_serde() {
        for kind in EventKind::ALL {
            let encoded = serde_json::to_string(&kind).unwrap();
            assert_eq!(encoded, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn event_kind_all_is_unique() {
        let unique: std::collections::HashSet<&str> =
            EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(unique.len(), EventKind::ALL.len());
    }

    #[test]
    fn exactly_four_presence_kinds() {
        let presence: Vec<EventKind> =
            EventKind::ALL.iter().copied().filter(EventKind::is_presence).collect();
        assert_eq!(
            presence,
            vec![
                EventKind::PresenceOnline,
                EventKind::PresenceOffline,
                EventKind::PresenceViewing,
                EventKind::PresenceEditing,
            ]
        );
    }

    #[test]
    fn event_kind_categories() {
        assert_eq!(EventKind::ReviewApproved.category(), EventCategory::Review);
        assert_eq!(EventKind::ClaimVerified.category(), EventCategory::Claim);
        assert_eq!(EventKind::RoleChanged.category(), EventCategory::Access);
        assert_eq!(
            EventKind::SubmissionDecisionRecorded.category(),
            EventCategory::Submission
        );
    }

    #[test]
    fn unknown_event_kind_is_rejected() {
        let err = "document_teleported".parse::<EventKind>().unwrap_err();
        assert!(err.to_string().contains("document_teleported"));
    }

    // ── EventMetadata serde ──────────────────────────────────────────────────

    #[test]
    fn metadata_comment_wire_shape() {
        let metadata = EventMetadata::Comment {
            comment_id: "c-1".to_string(),
            parent_comment_id: None,
            excerpt: Some("needs a citation".to_string()),
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            json!({
                "shape": "comment",
                "data": { "commentId": "c-1", "parentCommentId": null, "excerpt": "needs a citation" }
            })
        );
        let decoded: EventMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn metadata_fields_may_use_any_key() {
        let mut fields = BTreeMap::new();
        fields.insert("shape".to_string(), json!("not a tag"));
        fields.insert("claimScore".to_string(), json!(0.82));
        let metadata = EventMetadata::Fields(fields);

        let json = serde_json::to_string(&metadata).unwrap();
        let decoded: EventMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn empty_metadata_round_trips() {
        let json = serde_json::to_string(&EventMetadata::Empty).unwrap();
        assert_eq!(json, r#"{"shape":"empty"}"#);
        let decoded: EventMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, EventMetadata::Empty);
    }

    // ── Event ────────────────────────────────────────────────────────────────

    #[test]
    fn event_uses_camel_case_and_type_discriminator() {
        let event = Event {
            id: uuid::Uuid::nil(),
            project_id: "proj-1".to_string(),
            artifact_id: Some("doc-9".to_string()),
            kind: EventKind::DocumentUpdated,
            actor_id: "alice".to_string(),
            actor_role: Some("editor".to_string()),
            target_id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            metadata: EventMetadata::Empty,
            previous_hash: GENESIS_HASH.to_string(),
            event_hash: "abc".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "document_updated");
        assert_eq!(value["projectId"], "proj-1");
        assert_eq!(value["previousHash"], "GENESIS");
        assert_eq!(value["eventHash"], "abc");
        assert_eq!(event.day(), "2024-03-05");

        let decoded: Event = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn new_event_builder_sets_optional_fields() {
        let new = NewEvent::new("proj-1", EventKind::AccessGranted, "owner")
            .with_artifact("doc-1")
            .with_actor_role("owner")
            .with_target("bob");
        assert_eq!(new.artifact_id.as_deref(), Some("doc-1"));
        assert_eq!(new.actor_role.as_deref(), Some("owner"));
        assert_eq!(new.target_id.as_deref(), Some("bob"));
        assert_eq!(new.metadata, EventMetadata::Empty);
    }

    // ── Options ──────────────────────────────────────────────────────────────

    #[test]
    fn export_options_defaults() {
        let opts = ExportOptions::default();
        assert!(!opts.query.include_presence);
        assert!(opts.verify_chain);
        assert_eq!(opts.format, ExportFormat::Json);

        // Missing fields fall back to the same defaults when deserialized.
        let decoded: ExportOptions = serde_json::from_str(r#"{"projectId":"p"}"#).unwrap();
        assert_eq!(decoded.query.project_id.as_deref(), Some("p"));
        assert!(decoded.verify_chain);
        assert_eq!(decoded.format, ExportFormat::Json);
    }

    #[test]
    fn export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("jsonl".parse::<ExportFormat>().unwrap(), ExportFormat::Jsonl);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn query_options_reject_inverted_window() {
        let opts = QueryOptions {
            start_date: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..QueryOptions::default()
        };
        match opts.validate() {
            Err(FolioError::InvalidOptions { reason }) => {
                assert!(reason.contains("after end date"), "unexpected reason: {reason}");
            }
            other => panic!("expected InvalidOptions, got {:?}", other),
        }
    }

    #[test]
    fn unchecked_integrity_is_not_trusted() {
        let integrity = ChainIntegrity {
            checked: false,
            verified: true,
            ..ChainIntegrity::default()
        };
        assert!(!integrity.is_trusted());
    }

    // ── FolioError display messages ──────────────────────────────────────────

    #[test]
    fn error_store_write_failed_display() {
        let err = FolioError::StoreWriteFailed {
            reason: "disk full".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("event store write failed"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn error_config_error_display() {
        let err = FolioError::ConfigError {
            reason: "missing store path".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("missing store path"));
    }
}
