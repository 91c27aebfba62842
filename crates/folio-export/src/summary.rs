//! Activity summaries over a project's log.
//!
//! Presence events are always excluded.  Empty input yields zero counts,
//! empty lists, and an empty time span rather than an error.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, SecondsFormat, Utc};

use folio_audit::{chain::verify_chain, query::query};
use folio_contracts::{
    event::Event,
    query::QueryOptions,
    summary::{ActivityCount, AuditSummary, DailyActivity, TimeSpan},
};

/// How many actors and artifacts the summary ranks.
pub const TOP_N: usize = 20;

fn top_counts<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<ActivityCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        *counts.entry(id).or_default() += 1;
    }
    let mut ranked: Vec<ActivityCount> = counts
        .into_iter()
        .map(|(id, count)| ActivityCount {
            id: id.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
    ranked.truncate(TOP_N);
    ranked
}

/// Summarize `project_id`'s non-presence activity within an optional window.
pub fn summarize(
    events: &[Event],
    project_id: &str,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> AuditSummary {
    let options = QueryOptions {
        project_id: Some(project_id.to_string()),
        start_date,
        end_date,
        include_presence: false,
        ..QueryOptions::default()
    };
    let selected = query(events, &options);

    let mut events_by_kind = BTreeMap::new();
    let mut daily: BTreeMap<String, usize> = BTreeMap::new();
    for event in &selected {
        *events_by_kind.entry(event.kind).or_insert(0) += 1;
        *daily.entry(event.day()).or_insert(0) += 1;
    }

    let render = |e: &Event| e.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    let time_span = TimeSpan {
        start: selected.first().map(render).unwrap_or_default(),
        end: selected.last().map(render).unwrap_or_default(),
    };

    AuditSummary {
        project_id: project_id.to_string(),
        total_events: selected.len(),
        events_by_kind,
        top_actors: top_counts(selected.iter().map(|e| e.actor_id.as_str())),
        top_artifacts: top_counts(selected.iter().filter_map(|e| e.artifact_id.as_deref())),
        daily_activity: daily
            .into_iter()
            .map(|(date, count)| DailyActivity { date, count })
            .collect(),
        chain_valid: verify_chain(&selected).valid,
        time_span,
    }
}
