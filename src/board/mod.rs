// Remote kanban board API boundary.

pub mod http;

use crate::domain::{Card, LatLng, List};
use crate::error::Result;
use async_trait::async_trait;

/// Port to the remote board provider. One board's data at a time.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// Full card snapshot for a board.
    async fn board_cards(&self, board_id: &str) -> Result<Vec<Card>>;

    /// Cards of a single list.
    async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>>;

    /// Lists of a board, in board order.
    async fn board_lists(&self, board_id: &str) -> Result<Vec<List>>;

    /// Writes coordinates back to a card. Only call after `has_write_scope`
    /// confirms the granted token allows it.
    async fn write_coordinates(&self, card_id: &str, coords: &LatLng) -> Result<()>;

    /// Whether the granted credentials include write scope. Checked
    /// pre-emptively so write-back is disabled up front, not on a 403.
    async fn has_write_scope(&self) -> Result<bool>;
}
