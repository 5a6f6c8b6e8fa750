//! In-memory occupancy for one map.
//!
//! The store is filled from a snapshot, then kept current by feed events and
//! by the session's optimistic edits. Keys are cells, so a cell can never hold
//! two placements.

use std::collections::HashMap;

use bastion_proto::{Change, ChangeEvent};

use crate::error::EditorError;
use crate::grid::Cell;
use crate::placement::Placement;

/// Remote change to one cell, validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChange {
    /// Insert and update both replace whatever the cell holds.
    Upsert(Placement),
    Delete(Cell),
}

impl FeedChange {
    pub fn cell(&self) -> Cell {
        match self {
            FeedChange::Upsert(p) => p.cell,
            FeedChange::Delete(cell) => *cell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedEvent {
    pub seq: Option<u64>,
    pub change: FeedChange,
}

impl TryFrom<&ChangeEvent> for FeedEvent {
    type Error = EditorError;

    fn try_from(event: &ChangeEvent) -> Result<Self, Self::Error> {
        let change = match &event.change {
            Change::Insert { row } | Change::Update { row } => {
                FeedChange::Upsert(Placement::try_from(row)?)
            }
            Change::Delete { x, y } => FeedChange::Delete(Cell::new(*x, *y)),
        };
        Ok(FeedEvent {
            seq: event.seq,
            change,
        })
    }
}

/// Result of applying one feed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The store already matched the event.
    Unchanged,
    /// The event's sequence number was already covered; nothing was touched.
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct OccupancyStore {
    placements: HashMap<Cell, Placement>,
    /// Last feed sequence applied per cell. Entries outlive deletes so a
    /// replayed insert older than the delete is recognised.
    applied_seq: HashMap<Cell, u64>,
    /// Feed sequence the last snapshot already reflects.
    snapshot_seq: u64,
    /// Highest feed sequence seen so far, if the feed position is known.
    high_water: Option<u64>,
    /// Set when a numbered event skipped past `high_water + 1`.
    gap: bool,
}

impl OccupancyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mapping with a snapshot taken at feed position `seq`.
    ///
    /// Cells changed by feed events numbered above `seq` arrived ahead of the
    /// snapshot and keep their current contents.
    pub fn load(&mut self, snapshot: impl IntoIterator<Item = Placement>, seq: u64) {
        let mut placements: HashMap<Cell, Placement> =
            snapshot.into_iter().map(|p| (p.cell, p)).collect();
        self.applied_seq.retain(|_, applied| *applied > seq);
        for cell in self.applied_seq.keys() {
            match self.placements.get(cell) {
                Some(p) => {
                    placements.insert(*cell, *p);
                }
                None => {
                    placements.remove(cell);
                }
            }
        }
        self.placements = placements;
        self.snapshot_seq = seq;
        self.high_water = Some(self.high_water.map_or(seq, |hw| hw.max(seq)));
    }

    /// Drop every placement and all sequence bookkeeping except the feed
    /// position.
    pub fn clear(&mut self) {
        self.placements.clear();
        self.applied_seq.clear();
        self.snapshot_seq = 0;
    }

    /// A feed subscription started at position `seq`; the next numbered
    /// event should be `seq + 1`.
    pub fn start_feed(&mut self, seq: u64) {
        self.high_water = Some(seq);
        self.gap = false;
    }

    /// True once after a numbered event arrived with earlier numbers missing.
    pub fn take_gap(&mut self) -> bool {
        std::mem::take(&mut self.gap)
    }

    /// Apply a feed event by key.
    ///
    /// Numbered events at or below the cell's last applied number (or the
    /// snapshot position) are dropped. Unnumbered events apply in receive order.
    pub fn apply(&mut self, event: &FeedEvent) -> ApplyOutcome {
        let cell = event.change.cell();
        if let Some(seq) = event.seq {
            let floor = self
                .applied_seq
                .get(&cell)
                .copied()
                .unwrap_or(0)
                .max(self.snapshot_seq);
            if seq <= floor {
                return ApplyOutcome::Stale;
            }
            if let Some(high_water) = self.high_water.filter(|hw| seq > hw + 1) {
                tracing::warn!(seq, high_water, "Feed skipped events");
                self.gap = true;
            }
            self.high_water = Some(self.high_water.map_or(seq, |hw| hw.max(seq)));
            self.applied_seq.insert(cell, seq);
        }

        match event.change {
            FeedChange::Upsert(placement) => {
                if self.placements.insert(cell, placement) == Some(placement) {
                    ApplyOutcome::Unchanged
                } else {
                    ApplyOutcome::Applied
                }
            }
            FeedChange::Delete(_) => {
                if self.placements.remove(&cell).is_some() {
                    ApplyOutcome::Applied
                } else {
                    ApplyOutcome::Unchanged
                }
            }
        }
    }

    /// Local write ahead of confirmation. Returns the previous value.
    pub fn optimistic_set(&mut self, placement: Placement) -> Option<Placement> {
        self.placements.insert(placement.cell, placement)
    }

    /// Local delete ahead of confirmation. Returns the removed value.
    pub fn optimistic_delete(&mut self, cell: Cell) -> Option<Placement> {
        self.placements.remove(&cell)
    }

    /// Put a cell back to a remembered value (`None` empties it).
    pub fn restore(&mut self, cell: Cell, value: Option<Placement>) {
        match value {
            Some(p) => {
                self.placements.insert(cell, p);
            }
            None => {
                self.placements.remove(&cell);
            }
        }
    }

    pub fn get(&self, cell: Cell) -> Option<&Placement> {
        self.placements.get(&cell)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.placements.contains_key(&cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn snapshot_seq(&self) -> u64 {
        self.snapshot_seq
    }

    /// Sorted copy of all placements.
    pub fn to_vec(&self) -> Vec<Placement> {
        let mut all: Vec<Placement> = self.placements.values().copied().collect();
        all.sort_by_key(|p| (p.cell.y, p.cell.x));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::BuildingKind;
    use crate::placement::Rotation;

    fn placement(x: i32, y: i32, rotation: u8) -> Placement {
        Placement::new(
            Cell::new(x, y),
            BuildingKind::Workshop,
            Rotation::new(rotation).unwrap(),
        )
    }

    fn upsert(seq: Option<u64>, p: Placement) -> FeedEvent {
        FeedEvent {
            seq,
            change: FeedChange::Upsert(p),
        }
    }

    fn delete(seq: Option<u64>, x: i32, y: i32) -> FeedEvent {
        FeedEvent {
            seq,
            change: FeedChange::Delete(Cell::new(x, y)),
        }
    }

    #[test]
    fn test_load_replaces_everything() {
        let mut store = OccupancyStore::new();
        store.optimistic_set(placement(9, 9, 0));
        store.load([placement(1, 1, 0), placement(2, 1, 1)], 5);
        assert_eq!(store.len(), 2);
        assert!(!store.contains(Cell::new(9, 9)));
        assert_eq!(store.snapshot_seq(), 5);
    }

    #[test]
    fn test_insert_twice_is_idempotent() {
        for seq in [None, Some(3)] {
            let mut store = OccupancyStore::new();
            let event = upsert(seq, placement(3, 4, 1));
            assert_eq!(store.apply(&event), ApplyOutcome::Applied);
            let once = store.to_vec();
            assert_ne!(store.apply(&event), ApplyOutcome::Applied);
            assert_eq!(store.to_vec(), once);
        }
    }

    #[test]
    fn test_one_entry_per_cell() {
        let mut store = OccupancyStore::new();
        store.apply(&upsert(None, placement(3, 4, 0)));
        store.apply(&upsert(None, placement(3, 4, 2)));
        store.optimistic_set(placement(3, 4, 1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(Cell::new(3, 4)).unwrap().rotation.quarter_turns(), 1);
    }

    #[test]
    fn test_unnumbered_delete_before_insert_lets_insert_win() {
        let mut store = OccupancyStore::new();
        store.apply(&delete(None, 3, 4));
        store.apply(&upsert(None, placement(3, 4, 0)));
        assert!(store.contains(Cell::new(3, 4)));
    }

    #[test]
    fn test_numbered_replay_drops_older_insert() {
        let mut store = OccupancyStore::new();
        // Delete (seq 8) delivered before the insert it supersedes (seq 7)
        assert_eq!(store.apply(&delete(Some(8), 3, 4)), ApplyOutcome::Unchanged);
        assert_eq!(
            store.apply(&upsert(Some(7), placement(3, 4, 0))),
            ApplyOutcome::Stale
        );
        assert!(!store.contains(Cell::new(3, 4)));
        // Other cells are independent
        assert_eq!(
            store.apply(&upsert(Some(7), placement(5, 5, 0))),
            ApplyOutcome::Applied
        );
    }

    #[test]
    fn test_events_covered_by_snapshot_are_stale() {
        let mut store = OccupancyStore::new();
        store.load([placement(1, 1, 0)], 10);
        assert_eq!(store.apply(&delete(Some(10), 1, 1)), ApplyOutcome::Stale);
        assert!(store.contains(Cell::new(1, 1)));
        assert_eq!(store.apply(&delete(Some(11), 1, 1)), ApplyOutcome::Applied);
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_older_than_applied_event_keeps_event() {
        let mut store = OccupancyStore::new();
        store.start_feed(10);
        store.apply(&upsert(Some(11), placement(3, 4, 2)));
        store.apply(&delete(Some(12), 1, 1));

        // Snapshot taken at seq 10 arrives after events 11 and 12
        store.load([placement(1, 1, 0), placement(5, 5, 0)], 10);
        assert_eq!(
            store.to_vec(),
            vec![placement(3, 4, 2), placement(5, 5, 0)]
        );
        // Replays covered by either stay stale
        assert_eq!(store.apply(&delete(Some(11), 3, 4)), ApplyOutcome::Stale);
        assert_eq!(store.apply(&upsert(Some(10), placement(1, 1, 0))), ApplyOutcome::Stale);
        assert!(!store.take_gap());
    }

    #[test]
    fn test_snapshot_covering_applied_event_wins() {
        let mut store = OccupancyStore::new();
        store.apply(&upsert(Some(3), placement(3, 4, 2)));
        store.load([placement(3, 4, 1)], 3);
        assert_eq!(store.to_vec(), vec![placement(3, 4, 1)]);
    }

    #[test]
    fn test_skipped_sequence_is_reported_once() {
        let mut store = OccupancyStore::new();
        store.start_feed(4);
        store.apply(&upsert(Some(5), placement(1, 1, 0)));
        assert!(!store.take_gap());
        store.apply(&upsert(Some(7), placement(2, 2, 0)));
        assert!(store.take_gap());
        assert!(!store.take_gap());
        // A snapshot moves the expected position forward
        store.load([], 20);
        store.apply(&upsert(Some(21), placement(2, 2, 0)));
        assert!(!store.take_gap());
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = OccupancyStore::new();
        store.apply(&upsert(Some(11), placement(3, 4, 0)));
        store.clear();
        assert!(store.is_empty());
        store.load([], 10);
        assert!(store.is_empty());
    }

    #[test]
    fn test_change_event_conversion() {
        let event = ChangeEvent::from_json(
            r#"{"seq":2,"type":"update","row":{"x":3,"y":4,"kind":"barracks","rotation":2}}"#,
        )
        .unwrap();
        let feed = FeedEvent::try_from(&event).unwrap();
        assert_eq!(feed.seq, Some(2));
        assert_eq!(feed.change.cell(), Cell::new(3, 4));

        let bad = ChangeEvent::from_json(
            r#"{"type":"insert","row":{"x":3,"y":4,"kind":"barracks","rotation":9}}"#,
        )
        .unwrap();
        assert!(FeedEvent::try_from(&bad).is_err());
    }
}
