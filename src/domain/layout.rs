use serde::{Deserialize, Serialize};

/// A list (column) on the remote board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// User-configured group of lists; the unit of dashboard/map grouping and of
/// first-card semantics. Persisted as camelCase JSON by the settings UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub name: String,
    /// Lists in display order; a list belongs to exactly one block at a time.
    pub list_ids: Vec<String>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub ignore_first_card: bool,
    #[serde(default)]
    pub display_first_card_description: bool,
    #[serde(default)]
    pub include_on_map: bool,
    #[serde(default)]
    pub map_icon: Option<String>,
}

impl Block {
    pub fn covers_list(&self, list_id: &str) -> bool {
        self.list_ids.iter().any(|id| id == list_id)
    }
}

/// What a matching marker rule overrides on the default variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideKind {
    Color,
    Icon,
}

/// Maps one board label to a marker override. Priority is implicit in the
/// stored sequence: earlier rules win, and exactly one rule applies per card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRule {
    pub id: String,
    pub label_id: String,
    pub kind: OverrideKind,
    pub value: String,
}
