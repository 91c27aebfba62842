//! Activity summary types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kind::EventKind;

/// Event count for one actor or artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCount {
    pub id: String,
    pub count: usize,
}

/// Event count for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: usize,
}

/// First and last timestamps covered; empty strings when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpan {
    pub start: String,
    pub end: String,
}

/// Read-only statistics over a project's non-presence events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub project_id: String,
    pub total_events: usize,
    pub events_by_kind: BTreeMap<EventKind, usize>,
    /// Most active actors, descending by count.
    pub top_actors: Vec<ActivityCount>,
    /// Most touched artifacts, descending by count.
    pub top_artifacts: Vec<ActivityCount>,
    /// Ascending by date.
    pub daily_activity: Vec<DailyActivity>,
    pub chain_valid: bool,
    pub time_span: TimeSpan,
}
