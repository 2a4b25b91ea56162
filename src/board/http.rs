use crate::board::BoardApi;
use crate::constants::{AUTH_KEY_PARAM, AUTH_TOKEN_PARAM};
use crate::domain::{Card, LatLng, List};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// HTTP client for the remote board provider, authenticating with key/token
/// query parameters. A 429 from the provider surfaces as `RateLimited` so
/// the refresh loop can warn the user instead of silently thrashing.
pub struct HttpBoardApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_token: String,
}

impl HttpBoardApi {
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let api_key = std::env::var("BOARD_API_KEY")?;
        let api_token = std::env::var("BOARD_API_TOKEN")?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            api_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let t0 = std::time::Instant::now();
        let resp = self
            .client
            .get(self.url(path))
            .query(&[
                (AUTH_KEY_PARAM, self.api_key.as_str()),
                (AUTH_TOKEN_PARAM, self.api_token.as_str()),
            ])
            .send()
            .await?;
        histogram!("deckhand_board_fetch_duration_seconds").record(t0.elapsed().as_secs_f64());

        if resp.status().as_u16() == 429 {
            counter!("deckhand_board_rate_limited_total").increment(1);
            warn!("board API rate limit hit");
            return Err(EngineError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(EngineError::Api {
                message: format!("board API returned status {}", resp.status().as_u16()),
            });
        }
        Ok(resp.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    permissions: Vec<TokenPermission>,
}

#[derive(Debug, Deserialize)]
struct TokenPermission {
    #[serde(default)]
    write: bool,
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    #[instrument(skip(self))]
    async fn board_cards(&self, board_id: &str) -> Result<Vec<Card>> {
        let cards: Vec<Card> = self.get_json(&format!("boards/{board_id}/cards")).await?;
        info!("fetched {} cards for board {}", cards.len(), board_id);
        histogram!("deckhand_board_cards_per_fetch").record(cards.len() as f64);
        Ok(cards)
    }

    #[instrument(skip(self))]
    async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>> {
        let cards: Vec<Card> = self.get_json(&format!("lists/{list_id}/cards")).await?;
        debug!("fetched {} cards for list {}", cards.len(), list_id);
        Ok(cards)
    }

    #[instrument(skip(self))]
    async fn board_lists(&self, board_id: &str) -> Result<Vec<List>> {
        self.get_json(&format!("boards/{board_id}/lists")).await
    }

    #[instrument(skip(self))]
    async fn write_coordinates(&self, card_id: &str, coords: &LatLng) -> Result<()> {
        let resp = self
            .client
            .put(self.url(&format!("cards/{card_id}")))
            .query(&[
                (AUTH_KEY_PARAM, self.api_key.as_str()),
                (AUTH_TOKEN_PARAM, self.api_token.as_str()),
                ("coordinates", &format!("{},{}", coords.lat, coords.lng)),
            ])
            .send()
            .await?;

        if resp.status().as_u16() == 429 {
            return Err(EngineError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(EngineError::Api {
                message: format!(
                    "coordinate write-back failed with status {}",
                    resp.status().as_u16()
                ),
            });
        }
        debug!("wrote coordinates back to card {}", card_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn has_write_scope(&self) -> Result<bool> {
        let info: TokenInfo = self
            .get_json(&format!("tokens/{}", self.api_token))
            .await?;
        Ok(info.permissions.iter().any(|p| p.write))
    }
}
