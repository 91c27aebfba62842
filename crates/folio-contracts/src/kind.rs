//! The closed set of governance event kinds.
//!
//! Every recorded event carries exactly one `EventKind`.  Kinds are grouped
//! into eight categories; the four `Presence*` kinds are high-volume liveness
//! signals that queries and summaries exclude unless explicitly requested.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::FolioError;

/// Family an `EventKind` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Document,
    Comment,
    Review,
    Claim,
    Task,
    Submission,
    Access,
    Presence,
}

/// What happened.  Serialized as the snake_case name, e.g. `"review_submitted"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DocumentCreated,
    DocumentUpdated,
    DocumentDeleted,
    DocumentRestored,
    DocumentVersionSaved,

    CommentAdded,
    CommentEdited,
    CommentDeleted,
    CommentResolved,
    CommentReopened,

    ReviewRequested,
    ReviewStarted,
    ReviewSubmitted,
    ReviewApproved,
    ReviewChangesRequested,
    ReviewDismissed,

    ClaimCreated,
    ClaimVerified,
    ClaimDisputed,
    ClaimRetracted,

    TaskCreated,
    TaskAssigned,
    TaskStatusChanged,
    TaskCompleted,
    TaskDeleted,

    SubmissionCreated,
    SubmissionSubmitted,
    SubmissionWithdrawn,
    SubmissionDecisionRecorded,

    AccessGranted,
    AccessRevoked,
    RoleChanged,

    PresenceOnline,
    PresenceOffline,
    PresenceViewing,
    PresenceEditing,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 36] = [
        EventKind::DocumentCreated,
        EventKind::DocumentUpdated,
        EventKind::DocumentDeleted,
        EventKind::DocumentRestored,
        EventKind::DocumentVersionSaved,
        EventKind::CommentAdded,
        EventKind::CommentEdited,
        EventKind::CommentDeleted,
        EventKind::CommentResolved,
        EventKind::CommentReopened,
        EventKind::ReviewRequested,
        EventKind::ReviewStarted,
        EventKind::ReviewSubmitted,
        EventKind::ReviewApproved,
        EventKind::ReviewChangesRequested,
        EventKind::ReviewDismissed,
        EventKind::ClaimCreated,
        EventKind::ClaimVerified,
        EventKind::ClaimDisputed,
        EventKind::ClaimRetracted,
        EventKind::TaskCreated,
        EventKind::TaskAssigned,
        EventKind::TaskStatusChanged,
        EventKind::TaskCompleted,
        EventKind::TaskDeleted,
        EventKind::SubmissionCreated,
        EventKind::SubmissionSubmitted,
        EventKind::SubmissionWithdrawn,
        EventKind::SubmissionDecisionRecorded,
        EventKind::AccessGranted,
        EventKind::AccessRevoked,
        EventKind::RoleChanged,
        EventKind::PresenceOnline,
        EventKind::PresenceOffline,
        EventKind::PresenceViewing,
        EventKind::PresenceEditing,
    ];

    /// The wire name of this kind.  Matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DocumentCreated => "document_created",
            EventKind::DocumentUpdated => "document_updated",
            EventKind::DocumentDeleted => "document_deleted",
            EventKind::DocumentRestored => "document_restored",
            EventKind::DocumentVersionSaved => "document_version_saved",
            EventKind::CommentAdded => "comment_added",
            EventKind::CommentEdited => "comment_edited",
            EventKind::CommentDeleted => "comment_deleted",
            EventKind::CommentResolved => "comment_resolved",
            EventKind::CommentReopened => "comment_reopened",
            EventKind::ReviewRequested => "review_requested",
            EventKind::ReviewStarted => "review_started",
            EventKind::ReviewSubmitted => "review_submitted",
            EventKind::ReviewApproved => "review_approved",
            EventKind::ReviewChangesRequested => "review_changes_requested",
            EventKind::ReviewDismissed => "review_dismissed",
            EventKind::ClaimCreated => "claim_created",
            EventKind::ClaimVerified => "claim_verified",
            EventKind::ClaimDisputed => "claim_disputed",
            EventKind::ClaimRetracted => "claim_retracted",
            EventKind::TaskCreated => "task_created",
            EventKind::TaskAssigned => "task_assigned",
            EventKind::TaskStatusChanged => "task_status_changed",
            EventKind::TaskCompleted => "task_completed",
            EventKind::TaskDeleted => "task_deleted",
            EventKind::SubmissionCreated => "submission_created",
            EventKind::SubmissionSubmitted => "submission_submitted",
            EventKind::SubmissionWithdrawn => "submission_withdrawn",
            EventKind::SubmissionDecisionRecorded => "submission_decision_recorded",
            EventKind::AccessGranted => "access_granted",
            EventKind::AccessRevoked => "access_revoked",
            EventKind::RoleChanged => "role_changed",
            EventKind::PresenceOnline => "presence_online",
            EventKind::PresenceOffline => "presence_offline",
            EventKind::PresenceViewing => "presence_viewing",
            EventKind::PresenceEditing => "presence_editing",
        }
    }

    pub fn category(&self) -> EventCategory {
        use EventKind::*;
        match self {
            DocumentCreated | DocumentUpdated | DocumentDeleted | DocumentRestored
            | DocumentVersionSaved => EventCategory::Document,
            CommentAdded | CommentEdited | CommentDeleted | CommentResolved | CommentReopened => {
                EventCategory::Comment
            }
            ReviewRequested | ReviewStarted | ReviewSubmitted | ReviewApproved
            | ReviewChangesRequested | ReviewDismissed => EventCategory::Review,
            ClaimCreated | ClaimVerified | ClaimDisputed | ClaimRetracted => EventCategory::Claim,
            TaskCreated | TaskAssigned | TaskStatusChanged | TaskCompleted | TaskDeleted => {
                EventCategory::Task
            }
            SubmissionCreated | SubmissionSubmitted | SubmissionWithdrawn
            | SubmissionDecisionRecorded => EventCategory::Submission,
            AccessGranted | AccessRevoked | RoleChanged => EventCategory::Access,
            PresenceOnline | PresenceOffline | PresenceViewing | PresenceEditing => {
                EventCategory::Presence
            }
        }
    }

    /// True for the online/offline/viewing/editing liveness kinds.
    pub fn is_presence(&self) -> bool {
        self.category() == EventCategory::Presence
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FolioError::InvalidOptions {
                reason: format!("unknown event kind '{}'", s),
            })
    }
}
