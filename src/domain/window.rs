use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Time window a card's last activity must fall into to be counted.
///
/// Relative windows are anchored to "now" at classification time; calendar
/// windows carry fixed bounds. The resolved window is `[since, before)`:
/// inclusive lower bound, exclusive upper bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimeWindow {
    All,
    Relative { minutes: i64 },
    Calendar {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl TimeWindow {
    pub fn contains(&self, ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            TimeWindow::All => true,
            TimeWindow::Relative { minutes } => {
                let since = now - Duration::minutes(*minutes);
                ts >= since
            }
            TimeWindow::Calendar { start, end } => ts >= *start && ts < *end,
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::All
    }
}

/// Filter settings consumed verbatim from the settings object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default)]
    pub exclude_templates: bool,
    #[serde(default)]
    pub exclude_completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn calendar_window_lower_bound_inclusive_upper_exclusive() {
        let start = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 8, 8, 0, 0, 0).unwrap();
        let window = TimeWindow::Calendar { start, end };
        let now = Utc::now();

        assert!(window.contains(start, now));
        assert!(!window.contains(end, now));
        assert!(window.contains(end - Duration::seconds(1), now));
        assert!(!window.contains(start - Duration::seconds(1), now));
    }

    #[test]
    fn relative_window_anchors_to_now() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        let window = TimeWindow::Relative { minutes: 60 };

        assert!(window.contains(now - Duration::minutes(60), now));
        assert!(!window.contains(now - Duration::minutes(61), now));
        assert!(window.contains(now, now));
    }

    #[test]
    fn all_window_imposes_no_filter() {
        let now = Utc::now();
        assert!(TimeWindow::All.contains(now - Duration::days(10_000), now));
    }
}
