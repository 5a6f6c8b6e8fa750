//! Bastion-Builder Protocol Library
//!
//! JSON wire types exchanged between the editor client and the backend:
//! command bodies, the snapshot body and the live change feed.
//!
//! Field names follow the HTTP API (`mapId`, `x`, `y`, ...). Building kinds and
//! rotations travel as plain strings and integers; `bastion-core` validates them.

use serde::{Deserialize, Serialize};

/// HTTP header carrying the caller's user id.
pub const USER_HEADER: &str = "x-user-id";

/// SSE event name used for change-feed messages.
pub const FEED_EVENT: &str = "change";

/// SSE event sent once per subscription, before any change.
pub const READY_EVENT: &str = "ready";

pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const PLACE: &str = "/api/maps/place";
    pub const REMOVE: &str = "/api/maps/remove";
    pub const ROTATE: &str = "/api/maps/rotate";
    pub const SNAPSHOT: &str = "/api/maps/{map_id}/placements";
    pub const FEED: &str = "/api/maps/{map_id}/feed";
    pub const MAP: &str = "/api/maps/{map_id}";

    /// Concrete snapshot path for a map.
    pub fn snapshot(map_id: &str) -> String {
        SNAPSHOT.replace("{map_id}", map_id)
    }

    /// Concrete change-feed path for a map.
    pub fn feed(map_id: &str) -> String {
        FEED.replace("{map_id}", map_id)
    }

    /// Concrete map-info path for a map.
    pub fn map(map_id: &str) -> String {
        MAP.replace("{map_id}", map_id)
    }
}

/// A placement as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRow {
    pub x: i32,
    pub y: i32,
    pub kind: String,
    #[serde(default)]
    pub rotation: u8,
}

/// Map geometry returned to the editor before it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    pub id: String,
    pub campaign_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequest {
    pub map_id: String,
    pub x: i32,
    pub y: i32,
    pub kind: String,
    #[serde(default)]
    pub rotation: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub map_id: String,
    pub x: i32,
    pub y: i32,
}

/// Rotate request. A missing `rotation` asks the backend to turn the
/// stored placement one quarter clockwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateRequest {
    pub map_id: String,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementResponse {
    pub placement: PlacementRow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Full placement list for a map plus the feed sequence it reflects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub placements: Vec<PlacementRow>,
    #[serde(default)]
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// What happened to a placement row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Change {
    Insert { row: PlacementRow },
    Update { row: PlacementRow },
    Delete { x: i32, y: i32 },
}

impl Change {
    /// Cell the change applies to.
    pub fn cell(&self) -> (i32, i32) {
        match self {
            Change::Insert { row } | Change::Update { row } => (row.x, row.y),
            Change::Delete { x, y } => (*x, *y),
        }
    }
}

/// One change-feed message.
///
/// `seq` is assigned by the backend per map and increases monotonically.
/// Feeds that do not number their events leave it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(flatten)]
    pub change: Change,
}

impl ChangeEvent {
    pub fn new(seq: Option<u64>, change: Change) -> Self {
        Self { seq, change }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

/// First message of a feed subscription.
///
/// `seq` is the map's feed position when the subscription started. Every
/// change numbered above it follows on the same stream, so a snapshot
/// requested after this message misses nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedReady {
    pub seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_request_uses_api_field_names() {
        let json = r#"{"mapId":"m1","x":3,"y":4,"kind":"workshop"}"#;
        let req: PlaceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.map_id, "m1");
        // Omitted rotation defaults to 0
        assert_eq!(req.rotation, 0);
    }

    #[test]
    fn test_rotate_request_omits_missing_rotation() {
        let req = RotateRequest {
            map_id: "m1".to_string(),
            x: 1,
            y: 2,
            rotation: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("rotation"));
    }

    #[test]
    fn test_change_event_shape() {
        let event = ChangeEvent::new(Some(7), Change::Delete { x: 3, y: 4 });
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "delete");
        assert_eq!(value["seq"], 7);
        assert_eq!(value["x"], 3);

        let insert = r#"{"type":"insert","row":{"x":1,"y":2,"kind":"barracks","rotation":3}}"#;
        let event = ChangeEvent::from_json(insert).unwrap();
        assert_eq!(event.seq, None);
        assert_eq!(event.change.cell(), (1, 2));
    }

    #[test]
    fn test_routes_fill_map_id() {
        assert_eq!(routes::snapshot("abc"), "/api/maps/abc/placements");
        assert_eq!(routes::feed("abc"), "/api/maps/abc/feed");
    }

    #[test]
    fn test_feed_ready_shape() {
        let ready: FeedReady = serde_json::from_str(r#"{"seq":12}"#).unwrap();
        assert_eq!(ready, FeedReady { seq: 12 });
    }
}
