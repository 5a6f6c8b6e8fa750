use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bastion_core::{Cell, GridDimensions, Placement, Rotation};
use bastion_proto::{ChangeEvent, ErrorBody, MapInfo};
use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::common::{
    action_log::{ActionLog, ActionLogEntry},
    campaign::{Campaign, CampaignError, MemberRole},
    map::{MapError, MapState},
};
use crate::config::SeedConfig;

#[derive(Clone)]
pub struct Database {
    campaigns: Arc<RwLock<HashMap<uuid::Uuid, Campaign>>>,
    maps: Arc<RwLock<HashMap<uuid::Uuid, MapState>>>,
    action_log: Arc<RwLock<ActionLog>>,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(transparent)]
    MapError(#[from] MapError),

    #[error(transparent)]
    CampaignError(#[from] CampaignError),

    #[error("Invalid body: {0}")]
    InvalidBody(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Map not found")]
    MapNotFound,

    #[error("Campaign not found")]
    CampaignNotFound,
}

impl DatabaseError {
    pub fn status(&self) -> StatusCode {
        match self {
            DatabaseError::MapError(err) => err.to_status(),
            DatabaseError::CampaignError(err) => err.to_status(),
            DatabaseError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            DatabaseError::Unauthorized => StatusCode::UNAUTHORIZED,
            DatabaseError::MapNotFound | DatabaseError::CampaignNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for DatabaseError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Result of a remove; `warning` is set when the action could not be logged.
#[derive(Debug)]
pub struct Removed {
    pub placement: Placement,
    pub warning: Option<String>,
}

impl Database {
    pub fn new(action_log_limit: usize) -> Self {
        Self {
            campaigns: Arc::new(RwLock::new(HashMap::new())),
            maps: Arc::new(RwLock::new(HashMap::new())),
            action_log: Arc::new(RwLock::new(ActionLog::new(action_log_limit))),
        }
    }

    /// Create the demo campaign and map.
    pub fn seed(&self, seed: &SeedConfig) {
        let mut campaign = Campaign::new(uuid::Uuid::new_v4(), "Demo Bastion", seed.owner.clone());
        for editor in &seed.editors {
            campaign.add_member(editor.clone(), MemberRole::Editor);
        }
        for viewer in &seed.viewers {
            campaign.add_member(viewer.clone(), MemberRole::Viewer);
        }
        let map = MapState::new(
            seed.map_id,
            *campaign.id(),
            GridDimensions::new(seed.width, seed.height),
        );
        tracing::info!(
            campaign = campaign.name(),
            map_id = %seed.map_id,
            width = seed.width,
            height = seed.height,
            owner = %seed.owner,
            "Seeded demo map"
        );
        self.add_campaign(campaign);
        self.add_map(map);
    }

    pub fn add_campaign(&self, campaign: Campaign) {
        let mut campaigns = self.campaigns.write();
        campaigns.insert(*campaign.id(), campaign);
    }

    pub fn add_map(&self, map: MapState) {
        let mut maps = self.maps.write();
        maps.insert(*map.id(), map);
    }

    pub fn map_info(&self, map_id: &uuid::Uuid) -> Result<MapInfo, DatabaseError> {
        let maps = self.maps.read();
        maps.get(map_id)
            .map(MapState::info)
            .ok_or(DatabaseError::MapNotFound)
    }

    /// All placements of a map and the feed sequence they reflect.
    pub fn snapshot(&self, map_id: &uuid::Uuid) -> Result<(Vec<Placement>, u64), DatabaseError> {
        let maps = self.maps.read();
        let Some(map) = maps.get(map_id) else {
            return Err(DatabaseError::MapNotFound);
        };
        Ok((map.placements(), map.seq()))
    }

    /// Subscribe to a map's feed. Also returns the feed position at the
    /// moment of subscribing; every later change reaches the receiver.
    pub fn subscribe(
        &self,
        map_id: &uuid::Uuid,
    ) -> Result<(broadcast::Receiver<ChangeEvent>, u64), DatabaseError> {
        let maps = self.maps.read();
        let map = maps.get(map_id).ok_or(DatabaseError::MapNotFound)?;
        // Changes publish under the write lock, so seq and receiver agree
        Ok((map.subscribe(), map.seq()))
    }

    pub fn place(
        &self,
        map_id: &uuid::Uuid,
        user_id: &str,
        placement: Placement,
    ) -> Result<Placement, DatabaseError> {
        let campaign_id = self.authorize(map_id, user_id, "place")?;
        let placed = {
            let mut maps = self.maps.write();
            let map = maps.get_mut(map_id).ok_or(DatabaseError::MapNotFound)?;
            map.place(placement)?
        };
        self.log_action(
            campaign_id,
            user_id,
            "place",
            serde_json::json!({
                "mapId": map_id,
                "x": placed.cell.x,
                "y": placed.cell.y,
                "kind": placed.kind.as_str(),
                "rotation": placed.rotation.quarter_turns(),
            }),
        );
        Ok(placed)
    }

    pub fn remove(
        &self,
        map_id: &uuid::Uuid,
        user_id: &str,
        cell: Cell,
    ) -> Result<Removed, DatabaseError> {
        let campaign_id = self.authorize(map_id, user_id, "remove")?;
        let placement = {
            let mut maps = self.maps.write();
            let map = maps.get_mut(map_id).ok_or(DatabaseError::MapNotFound)?;
            map.remove(cell)?
        };
        let warning = self.log_action(
            campaign_id,
            user_id,
            "remove",
            serde_json::json!({ "mapId": map_id, "x": cell.x, "y": cell.y }),
        );
        Ok(Removed { placement, warning })
    }

    pub fn rotate(
        &self,
        map_id: &uuid::Uuid,
        user_id: &str,
        cell: Cell,
        rotation: Option<Rotation>,
    ) -> Result<Placement, DatabaseError> {
        let campaign_id = self.authorize(map_id, user_id, "rotate")?;
        let rotated = {
            let mut maps = self.maps.write();
            let map = maps.get_mut(map_id).ok_or(DatabaseError::MapNotFound)?;
            map.rotate(cell, rotation)?
        };
        self.log_action(
            campaign_id,
            user_id,
            "rotate",
            serde_json::json!({
                "mapId": map_id,
                "x": cell.x,
                "y": cell.y,
                "rotation": rotated.rotation.quarter_turns(),
            }),
        );
        Ok(rotated)
    }

    #[cfg(test)]
    pub fn actions(&self) -> Vec<ActionLogEntry> {
        self.action_log.read().entries().to_vec()
    }

    /// Check the map exists and the user may edit it. Returns the campaign id.
    fn authorize(
        &self,
        map_id: &uuid::Uuid,
        user_id: &str,
        action: &'static str,
    ) -> Result<uuid::Uuid, DatabaseError> {
        let campaign_id = {
            let maps = self.maps.read();
            *maps
                .get(map_id)
                .ok_or(DatabaseError::MapNotFound)?
                .campaign_id()
        };
        let campaigns = self.campaigns.read();
        let campaign = campaigns
            .get(&campaign_id)
            .ok_or(DatabaseError::CampaignNotFound)?;
        campaign.assert_editor(user_id, action)?;
        Ok(campaign_id)
    }

    /// Append to the action log. Failures are reported, never propagated.
    fn log_action(
        &self,
        campaign_id: uuid::Uuid,
        user_id: &str,
        action: &'static str,
        payload: serde_json::Value,
    ) -> Option<String> {
        let entry = ActionLogEntry {
            campaign_id,
            user_id: user_id.to_string(),
            action,
            payload,
            at: Utc::now(),
        };
        match self.action_log.write().append(entry) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(%campaign_id, action, error = %err, "Failed to log action");
                Some(format!("Action not logged: {err}"))
            }
        }
    }
}
