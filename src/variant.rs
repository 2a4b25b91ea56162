use crate::constants::{DEFAULT_MARKER_COLOR, DEFAULT_MARKER_ICON};
use crate::domain::{Card, MarkerRule, OverrideKind};
use serde::Serialize;

/// Visual variant applied to a map marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerVariant {
    Color(String),
    Icon(String),
    Default,
}

impl MarkerVariant {
    /// Stable key used by the map's per-variant visibility toggles.
    pub fn key(&self) -> String {
        match self {
            MarkerVariant::Color(c) => format!("color:{c}"),
            MarkerVariant::Icon(i) => format!("icon:{i}"),
            MarkerVariant::Default => "default".to_string(),
        }
    }

    pub fn color(&self) -> &str {
        match self {
            MarkerVariant::Color(c) => c,
            _ => DEFAULT_MARKER_COLOR,
        }
    }

    pub fn icon(&self) -> &str {
        match self {
            MarkerVariant::Icon(i) => i,
            _ => DEFAULT_MARKER_ICON,
        }
    }
}

/// Resolves the marker variant for a card against the ordered rule list.
///
/// Rules are stored highest-priority first; the first rule whose label is on
/// the card wins outright. A card matching several rules still gets exactly
/// one override, never a union.
pub fn resolve(card: &Card, rules: &[MarkerRule]) -> MarkerVariant {
    for rule in rules {
        if card.has_label(&rule.label_id) {
            return match rule.kind {
                OverrideKind::Color => MarkerVariant::Color(rule.value.clone()),
                OverrideKind::Icon => MarkerVariant::Icon(rule.value.clone()),
            };
        }
    }
    MarkerVariant::Default
}
