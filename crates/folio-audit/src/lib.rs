//! # folio-audit
//!
//! Immutable, append-only, SHA-256 hash-chained governance event log.
//!
//! ## Overview
//!
//! Every event the recorder appends links to the previous one through its
//! SHA-256 hash.  Inserting, deleting, reordering, or editing any event breaks
//! the chain, and `verify_chain` reports each violation it finds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_audit::{AuditRecorder, InMemoryEventStore};
//! use folio_contracts::{EventKind, NewEvent, QueryOptions};
//!
//! let recorder = AuditRecorder::new(InMemoryEventStore::new());
//! recorder.record(NewEvent::new("proj-1", EventKind::ClaimVerified, "alice"))?;
//!
//! assert!(recorder.verify_integrity()?.valid);
//! let events = recorder.query(&QueryOptions::for_project("proj-1"))?;
//! ```

pub mod chain;
pub mod jsonl;
pub mod query;
pub mod recorder;
pub mod store;

pub use chain::{hash_event, seal, timestamp_regressions, verify_chain, verify_segment};
pub use jsonl::JsonlEventStore;
pub use query::query;
pub use recorder::{AccessChange, ActorContext, AuditRecorder, ChainHead, CommentAction, ReviewAction};
pub use store::{EventStore, InMemoryEventStore};

// ── Tests ─────────────────────────────────────────────────────────────────────
