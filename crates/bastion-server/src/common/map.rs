use std::collections::HashMap;

use axum::http::StatusCode;
use bastion_core::{Cell, GridDimensions, Placement, Rotation};
use bastion_proto::{Change, ChangeEvent, MapInfo};
use tokio::sync::broadcast;

/// Buffered feed events per map before slow subscribers start lagging.
const FEED_CAPACITY: usize = 256;

#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("Out of bounds: {0}")]
    OutOfBounds(Cell),

    #[error("Placement not found at {0}")]
    PlacementNotFound(Cell),
}

impl MapError {
    pub fn to_status(&self) -> StatusCode {
        match self {
            MapError::OutOfBounds(_) => StatusCode::BAD_REQUEST,
            MapError::PlacementNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// One map: its geometry, placements, and change feed.
///
/// Every mutation bumps `seq` and broadcasts the stamped event while the
/// caller still holds the write lock, so snapshots and feed numbers agree.
#[derive(Debug)]
pub struct MapState {
    id: uuid::Uuid,
    campaign_id: uuid::Uuid,
    dims: GridDimensions,
    placements: HashMap<Cell, Placement>,
    seq: u64,
    feed: broadcast::Sender<ChangeEvent>,
}

impl MapState {
    pub fn new(id: uuid::Uuid, campaign_id: uuid::Uuid, dims: GridDimensions) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            id,
            campaign_id,
            dims,
            placements: HashMap::new(),
            seq: 0,
            feed,
        }
    }

    pub fn id(&self) -> &uuid::Uuid {
        &self.id
    }

    pub fn campaign_id(&self) -> &uuid::Uuid {
        &self.campaign_id
    }

    pub fn info(&self) -> MapInfo {
        MapInfo {
            id: self.id.to_string(),
            campaign_id: self.campaign_id.to_string(),
            width: self.dims.width,
            height: self.dims.height,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Placements sorted row-major.
    pub fn placements(&self) -> Vec<Placement> {
        let mut all: Vec<Placement> = self.placements.values().copied().collect();
        all.sort_by_key(|p| (p.cell.y, p.cell.x));
        all
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    /// Insert or replace the placement on its cell.
    pub fn place(&mut self, placement: Placement) -> Result<Placement, MapError> {
        self.check_bounds(placement.cell)?;
        let row = placement.to_row();
        let change = match self.placements.insert(placement.cell, placement) {
            Some(_) => Change::Update { row },
            None => Change::Insert { row },
        };
        self.publish(change);
        Ok(placement)
    }

    pub fn remove(&mut self, cell: Cell) -> Result<Placement, MapError> {
        self.check_bounds(cell)?;
        let removed = self
            .placements
            .remove(&cell)
            .ok_or(MapError::PlacementNotFound(cell))?;
        self.publish(Change::Delete {
            x: cell.x,
            y: cell.y,
        });
        Ok(removed)
    }

    /// Set the rotation, or turn one quarter clockwise when none is given.
    pub fn rotate(&mut self, cell: Cell, rotation: Option<Rotation>) -> Result<Placement, MapError> {
        self.check_bounds(cell)?;
        let current = self
            .placements
            .get_mut(&cell)
            .ok_or(MapError::PlacementNotFound(cell))?;
        let next = current.rotation.next();
        current.rotation = rotation.unwrap_or(next);
        let rotated = *current;
        self.publish(Change::Update {
            row: rotated.to_row(),
        });
        Ok(rotated)
    }

    fn check_bounds(&self, cell: Cell) -> Result<(), MapError> {
        if self.dims.contains(cell) {
            Ok(())
        } else {
            Err(MapError::OutOfBounds(cell))
        }
    }

    fn publish(&mut self, change: Change) {
        self.seq += 1;
        // No subscribers is not an error
        let receivers = self
            .feed
            .send(ChangeEvent::new(Some(self.seq), change))
            .unwrap_or(0);
        tracing::debug!(map_id = %self.id, seq = self.seq, receivers, "Published change");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::BuildingKind;

    fn map() -> MapState {
        MapState::new(
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
            GridDimensions::new(8, 8),
        )
    }

    fn workshop(x: i32, y: i32) -> Placement {
        Placement::new(Cell::new(x, y), BuildingKind::Workshop, Rotation::NONE)
    }

    #[test]
    fn test_place_broadcasts_increasing_seq() {
        let mut map = map();
        let mut rx = map.subscribe();
        map.place(workshop(1, 1)).unwrap();
        map.place(workshop(1, 1)).unwrap();
        map.remove(Cell::new(1, 1)).unwrap();

        let events: Vec<ChangeEvent> = (0..3).map(|_| rx.try_recv().unwrap()).collect();
        assert_eq!(events[0].seq, Some(1));
        assert!(matches!(events[0].change, Change::Insert { .. }));
        assert!(matches!(events[1].change, Change::Update { .. }));
        assert_eq!(events[2].change, Change::Delete { x: 1, y: 1 });
        assert_eq!(map.seq(), 3);
    }

    #[test]
    fn test_bounds_are_checked() {
        let mut map = map();
        assert!(matches!(
            map.place(workshop(8, 0)),
            Err(MapError::OutOfBounds(_))
        ));
        assert!(matches!(
            map.place(workshop(0, -1)),
            Err(MapError::OutOfBounds(_))
        ));
        assert_eq!(map.seq(), 0);
    }

    #[test]
    fn test_rotate_defaults_to_next() {
        let mut map = map();
        map.place(workshop(2, 2)).unwrap();
        let rotated = map.rotate(Cell::new(2, 2), None).unwrap();
        assert_eq!(rotated.rotation.quarter_turns(), 1);
        let rotated = map
            .rotate(Cell::new(2, 2), Some(Rotation::new(3).unwrap()))
            .unwrap();
        assert_eq!(rotated.rotation.quarter_turns(), 3);
        assert!(matches!(
            map.rotate(Cell::new(3, 3), None),
            Err(MapError::PlacementNotFound(_))
        ));
    }
}
