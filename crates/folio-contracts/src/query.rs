//! Query filter options.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{FolioError, FolioResult},
    kind::EventKind,
};

/// Conjunctive filter over an event log.
///
/// An empty set imposes no restriction.  Presence kinds are excluded unless
/// `include_presence` is true, even when they appear in `kinds`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryOptions {
    pub project_id: Option<String>,
    /// Inclusive lower bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end_date: Option<DateTime<Utc>>,
    pub kinds: BTreeSet<EventKind>,
    pub actor_ids: BTreeSet<String>,
    /// An event matches only if it has an artifact id contained in this set.
    pub artifact_ids: BTreeSet<String>,
    pub include_presence: bool,
}

impl QueryOptions {
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Self::default()
        }
    }

    /// Reject a time window whose start lies after its end.
    pub fn validate(&self) -> FolioResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(FolioError::InvalidOptions {
                    reason: format!(
                        "start date {} is after end date {}",
                        start.to_rfc3339(),
                        end.to_rfc3339()
                    ),
                });
            }
        }
        Ok(())
    }
}
