//! Client settings persisted in local storage.

use bastion_core::EditorConfig;
use serde::{Deserialize, Serialize};

pub const CLIENT_CONFIG_KEY: &str = "$bastion-builder$/config/client";

/// Sprite sheet served next to the app.
pub const TILE_SHEET_URL: &str = "/assets/tiles.png";

/// Map seeded by a default server.
pub const DEFAULT_MAP_ID: &str = "00000000-0000-4000-8000-000000000001";

/// Delay before resubscribing to a dropped change feed.
pub const FEED_RETRY_MS: u32 = 2_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Sent as the user header on every command.
    pub user_id: String,
    /// Backend origin; empty means same origin.
    pub api_base: String,
    pub last_map_id: Option<String>,
    pub editor: EditorConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_id: "editor".to_string(),
            api_base: String::new(),
            last_map_id: None,
            editor: EditorConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Map to suggest on the home page.
    pub fn suggested_map_id(&self) -> &str {
        self.last_map_id.as_deref().unwrap_or(DEFAULT_MAP_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_suggested_map_prefers_last_opened() {
        let mut config = ClientConfig::default();
        assert_eq!(config.suggested_map_id(), DEFAULT_MAP_ID);
        config.last_map_id = Some("abc".to_string());
        assert_eq!(config.suggested_map_id(), "abc");
    }

    #[wasm_bindgen_test]
    fn test_stored_config_fills_missing_fields() {
        let config: ClientConfig = serde_json::from_str(r#"{"userId":"x"}"#).unwrap();
        assert_eq!(config.user_id, "editor");
        let config: ClientConfig = serde_json::from_str(r#"{"user_id":"alice"}"#).unwrap();
        assert_eq!(config.user_id, "alice");
        assert_eq!(config.editor, EditorConfig::default());
    }
}
