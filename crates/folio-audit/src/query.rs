//! Query engine: select and order events from a log snapshot.

use folio_contracts::{event::Event, query::QueryOptions};

/// Return true if `event` passes every filter in `options`.
pub fn matches(event: &Event, options: &QueryOptions) -> bool {
    if let Some(project_id) = &options.project_id {
        if &event.project_id != project_id {
            return false;
        }
    }
    if let Some(start) = options.start_date {
        if event.timestamp < start {
            return false;
        }
    }
    if let Some(end) = options.end_date {
        if event.timestamp > end {
            return false;
        }
    }
    if !options.include_presence && event.kind.is_presence() {
        return false;
    }
    if !options.kinds.is_empty() && !options.kinds.contains(&event.kind) {
        return false;
    }
    if !options.actor_ids.is_empty() && !options.actor_ids.contains(&event.actor_id) {
        return false;
    }
    if !options.artifact_ids.is_empty() {
        match &event.artifact_id {
            Some(artifact_id) if options.artifact_ids.contains(artifact_id) => {}
            _ => return false,
        }
    }
    true
}

/// Select the events matching `options`, ordered by timestamp ascending.
///
/// The order is applied regardless of how `events` is stored.  The sort is
/// stable, so events sharing a timestamp keep their append order.
pub fn query(events: &[Event], options: &QueryOptions) -> Vec<Event> {
    let mut selected: Vec<Event> = events
        .iter()
        .filter(|event| matches(event, options))
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    selected
}
