use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinates for a geocoded card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
}

/// Label attached to a card by the remote board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// Read-only snapshot of a remote kanban card, held for one refresh cycle.
/// Field names follow the provider's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(rename = "idList")]
    pub list_id: String,
    pub name: String,
    #[serde(default, rename = "desc")]
    pub description: String,
    /// Ordered position within the owning list; minimum is the "first card".
    pub pos: f64,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default, rename = "isTemplate")]
    pub template: bool,
    #[serde(default, rename = "dueComplete")]
    pub complete: bool,
    #[serde(rename = "dateLastActivity")]
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub coordinates: Option<LatLng>,
}

impl Card {
    pub fn has_label(&self, label_id: &str) -> bool {
        self.labels.iter().any(|l| l.id == label_id)
    }
}

/// Decodes the creation time embedded in a provider card identifier.
///
/// The provider packs the creation instant into the leading eight hex digits
/// of the identifier as seconds since the Unix epoch. This is a black-box
/// contract with the remote provider; if the identifier format ever changes,
/// this returns `None` and statistics simply omit the card.
pub fn creation_time_of(card_id: &str) -> Option<DateTime<Utc>> {
    let prefix = card_id.get(0..8)?;
    let secs = i64::from_str_radix(prefix, 16).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}
