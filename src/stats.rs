use crate::domain::{creation_time_of, Block, Card, Filters, LatLng};
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Bucketed activity report for the statistics view.
///
/// Reuses the classifier's template and time-window exclusions but neither
/// the completion exclusion nor the first-card exclusion: statistics count
/// all cards, completed ones included.
#[derive(Debug, Default)]
pub struct StatsReport {
    pub total: usize,
    pub created_by_day: BTreeMap<NaiveDate, usize>,
    pub created_by_hour: BTreeMap<u32, usize>,
    pub created_by_month: BTreeMap<String, usize>,
    pub completed_by_day: BTreeMap<NaiveDate, usize>,
    /// Size of the geocoded subset, for location breakdowns.
    pub geocoded: usize,
}

pub fn stats_report(
    cards: &[Card],
    blocks: &[Block],
    filters: &Filters,
    coords: &HashMap<String, LatLng>,
    now: DateTime<Utc>,
) -> StatsReport {
    let union_list_ids: HashSet<&str> = blocks
        .iter()
        .flat_map(|b| b.list_ids.iter().map(String::as_str))
        .collect();

    let mut report = StatsReport::default();
    for card in cards {
        if !union_list_ids.contains(card.list_id.as_str()) {
            continue;
        }
        if filters.exclude_templates && card.template {
            continue;
        }
        if !filters.time_window.contains(card.last_activity, now) {
            continue;
        }

        report.total += 1;

        // Creation instant is decoded from the provider identifier; cards
        // with an unexpected id format are simply not bucketed.
        if let Some(created) = creation_time_of(&card.id) {
            *report
                .created_by_day
                .entry(created.date_naive())
                .or_insert(0) += 1;
            *report.created_by_hour.entry(created.hour()).or_insert(0) += 1;
            *report
                .created_by_month
                .entry(format!("{:04}-{:02}", created.year(), created.month()))
                .or_insert(0) += 1;
        }

        if card.complete {
            *report
                .completed_by_day
                .entry(card.last_activity.date_naive())
                .or_insert(0) += 1;
        }

        if card.coordinates.is_some() || coords.contains_key(&card.id) {
            report.geocoded += 1;
        }
    }
    report
}
