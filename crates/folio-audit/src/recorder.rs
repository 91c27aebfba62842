//! The event recorder: the only place the chain is ever extended.
//!
//! `AuditRecorder` owns an `EventStore` and the `ChainHead` together behind a
//! single `Mutex`.  Reading the head, hashing the new event, appending it, and
//! advancing the head happen under one lock acquisition, so concurrent callers
//! can never fork the chain.  Every recorder carries its own head; there is no
//! process-wide state, so independent chains can live side by side.
//!
//! Reads (`snapshot`, `query`, `verify_integrity`) copy a consistent
//! point-in-time view and run outside the lock.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use folio_contracts::{
    error::{FolioError, FolioResult},
    event::{Event, EventMetadata, NewEvent, GENESIS_HASH},
    kind::EventKind,
    query::QueryOptions,
    verify::VerificationResult,
};

use crate::{
    chain::{seal, verify_chain},
    query::query,
    store::EventStore,
};

// ── Chain head ────────────────────────────────────────────────────────────────

/// The `event_hash` of the most recently appended event.
///
/// Starts at `GENESIS_HASH`.  The next event appended must carry this value
/// as its `previous_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHead {
    last_hash: String,
}

impl ChainHead {
    pub fn genesis() -> Self {
        Self {
            last_hash: GENESIS_HASH.to_string(),
        }
    }

    /// The head a chain would have after `events` (genesis when empty).
    pub fn from_events(events: &[Event]) -> Self {
        match events.last() {
            Some(tail) => Self {
                last_hash: tail.event_hash.clone(),
            },
            None => Self::genesis(),
        }
    }

    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }
}

impl Default for ChainHead {
    fn default() -> Self {
        Self::genesis()
    }
}

// ── Convenience inputs ────────────────────────────────────────────────────────

/// Who performed an action, and in which project.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext<'a> {
    pub project_id: &'a str,
    pub actor_id: &'a str,
    pub actor_role: Option<&'a str>,
}

impl<'a> ActorContext<'a> {
    pub fn new(project_id: &'a str, actor_id: &'a str) -> Self {
        Self {
            project_id,
            actor_id,
            actor_role: None,
        }
    }

    pub fn with_role(mut self, role: &'a str) -> Self {
        self.actor_role = Some(role);
        self
    }

    fn event(&self, kind: EventKind) -> NewEvent {
        let new = NewEvent::new(self.project_id, kind, self.actor_id);
        match self.actor_role {
            Some(role) => new.with_actor_role(role),
            None => new,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Added,
    Edited,
    Deleted,
    Resolved,
    Reopened,
}

impl CommentAction {
    pub fn kind(self) -> EventKind {
        match self {
            CommentAction::Added => EventKind::CommentAdded,
            CommentAction::Edited => EventKind::CommentEdited,
            CommentAction::Deleted => EventKind::CommentDeleted,
            CommentAction::Resolved => EventKind::CommentResolved,
            CommentAction::Reopened => EventKind::CommentReopened,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Requested,
    Started,
    Submitted,
    Approved,
    ChangesRequested,
    Dismissed,
}

impl ReviewAction {
    pub fn kind(self) -> EventKind {
        match self {
            ReviewAction::Requested => EventKind::ReviewRequested,
            ReviewAction::Started => EventKind::ReviewStarted,
            ReviewAction::Submitted => EventKind::ReviewSubmitted,
            ReviewAction::Approved => EventKind::ReviewApproved,
            ReviewAction::ChangesRequested => EventKind::ReviewChangesRequested,
            ReviewAction::Dismissed => EventKind::ReviewDismissed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessChange {
    Granted,
    Revoked,
    RoleChanged,
}

impl AccessChange {
    pub fn kind(self) -> EventKind {
        match self {
            AccessChange::Granted => EventKind::AccessGranted,
            AccessChange::Revoked => EventKind::AccessRevoked,
            AccessChange::RoleChanged => EventKind::RoleChanged,
        }
    }
}

// ── Recorder ──────────────────────────────────────────────────────────────────

pub(crate) struct RecorderState<S> {
    pub(crate) store: S,
    pub(crate) head: ChainHead,
}

/// Serializing front end for one hash-chained event log.
pub struct AuditRecorder<S: EventStore> {
    pub(crate) state: Mutex<RecorderState<S>>,
}

impl<S: EventStore> AuditRecorder<S> {
    /// Wrap `store`, resuming the chain from whatever it already holds.
    pub fn new(store: S) -> Self {
        let head = ChainHead::from_events(store.events());
        Self {
            state: Mutex::new(RecorderState { store, head }),
        }
    }

    fn lock_for_write(&self) -> FolioResult<MutexGuard<'_, RecorderState<S>>> {
        self.state.lock().map_err(|e| FolioError::StoreWriteFailed {
            reason: format!("recorder state lock poisoned: {}", e),
        })
    }

    fn lock_for_read(&self) -> FolioResult<MutexGuard<'_, RecorderState<S>>> {
        self.state.lock().map_err(|e| FolioError::StoreReadFailed {
            reason: format!("recorder state lock poisoned: {}", e),
        })
    }

    /// Append one event to the chain.
    ///
    /// Assigns a fresh id and the current UTC time, links the event to the
    /// chain head, hashes it, and appends it to the store.  The head only
    /// moves once the store reports success; on `StoreWriteFailed` nothing
    /// has changed and the caller must retry the whole call.
    pub fn record(&self, new: NewEvent) -> FolioResult<Event> {
        let mut state = self.lock_for_write()?;

        let timestamp = Utc::now();
        if let Some(tail) = state.store.events().last() {
            if timestamp < tail.timestamp {
                warn!(
                    tail_event_id = %tail.id,
                    tail_timestamp = %tail.timestamp.to_rfc3339(),
                    timestamp = %timestamp.to_rfc3339(),
                    "clock moved backwards; chain order and time order will diverge"
                );
            }
        }

        let event = seal(new, Uuid::new_v4(), timestamp, state.head.last_hash());
        state.store.append(&event)?;
        state.head = ChainHead {
            last_hash: event.event_hash.clone(),
        };

        debug!(
            event_id = %event.id,
            project_id = %event.project_id,
            kind = %event.kind,
            event_hash = %event.event_hash,
            "event recorded"
        );

        Ok(event)
    }

    /// Record an edit to a document.
    pub fn record_document_edit(
        &self,
        actor: &ActorContext<'_>,
        document_id: &str,
        version: Option<u64>,
        change_summary: Option<&str>,
    ) -> FolioResult<Event> {
        let new = actor
            .event(EventKind::DocumentUpdated)
            .with_artifact(document_id)
            .with_metadata(EventMetadata::DocumentEdit {
                version,
                change_summary: change_summary.map(str::to_string),
            });
        self.record(new)
    }

    /// Record a comment lifecycle change on an artifact.
    pub fn record_comment(
        &self,
        actor: &ActorContext<'_>,
        artifact_id: &str,
        action: CommentAction,
        comment_id: &str,
        parent_comment_id: Option<&str>,
        excerpt: Option<&str>,
    ) -> FolioResult<Event> {
        let new = actor
            .event(action.kind())
            .with_artifact(artifact_id)
            .with_metadata(EventMetadata::Comment {
                comment_id: comment_id.to_string(),
                parent_comment_id: parent_comment_id.map(str::to_string),
                excerpt: excerpt.map(str::to_string),
            });
        self.record(new)
    }

    /// Record a review lifecycle change on an artifact.
    pub fn record_review(
        &self,
        actor: &ActorContext<'_>,
        artifact_id: &str,
        action: ReviewAction,
        review_id: &str,
        decision: Option<&str>,
        note: Option<&str>,
    ) -> FolioResult<Event> {
        let new = actor
            .event(action.kind())
            .with_artifact(artifact_id)
            .with_metadata(EventMetadata::Review {
                review_id: review_id.to_string(),
                decision: decision.map(str::to_string),
                note: note.map(str::to_string),
            });
        self.record(new)
    }

    /// Record a permission change.  `target_user_id` is the user whose access
    /// changed; `artifact_id` is set when the permission is artifact-scoped.
    pub fn record_access_change(
        &self,
        actor: &ActorContext<'_>,
        change: AccessChange,
        target_user_id: &str,
        permission: &str,
        previous_permission: Option<&str>,
        artifact_id: Option<&str>,
    ) -> FolioResult<Event> {
        let mut new = actor
            .event(change.kind())
            .with_target(target_user_id)
            .with_metadata(EventMetadata::Access {
                permission: permission.to_string(),
                previous_permission: previous_permission.map(str::to_string),
            });
        if let Some(artifact_id) = artifact_id {
            new = new.with_artifact(artifact_id);
        }
        self.record(new)
    }

    /// The hash the next appended event will link to.
    pub fn head(&self) -> FolioResult<String> {
        let state = self.lock_for_read()?;
        Ok(state.head.last_hash().to_string())
    }

    pub fn len(&self) -> FolioResult<usize> {
        let state = self.lock_for_read()?;
        Ok(state.store.events().len())
    }

    pub fn is_empty(&self) -> FolioResult<bool> {
        Ok(self.len()? == 0)
    }

    /// A consistent copy of every event, in append order.
    pub fn snapshot(&self) -> FolioResult<Vec<Event>> {
        let state = self.lock_for_read()?;
        Ok(state.store.events().to_vec())
    }

    /// Filter a snapshot of the log.  See `query::query`.
    pub fn query(&self, options: &QueryOptions) -> FolioResult<Vec<Event>> {
        options.validate()?;
        Ok(query(&self.snapshot()?, options))
    }

    /// Verify the whole stored chain from genesis.
    pub fn verify_integrity(&self) -> FolioResult<VerificationResult> {
        Ok(verify_chain(&self.snapshot()?))
    }

    /// Give back the underlying store.
    pub fn into_store(self) -> FolioResult<S> {
        let state = self
            .state
            .into_inner()
            .map_err(|e| FolioError::StoreReadFailed {
                reason: format!("recorder state lock poisoned: {}", e),
            })?;
        Ok(state.store)
    }
}
