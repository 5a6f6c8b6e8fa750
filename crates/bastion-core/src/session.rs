//! Editor session: the single owner of all editor state for one open map.
//!
//! Every mutation arrives as a [`SessionMsg`] through [`EditorSession::dispatch`].
//! Input handling never waits on the network. Commands it produces are queued
//! in the outbox; the host drains them, runs them, and feeds each result back
//! as [`SessionMsg::Resolved`].

use std::collections::{HashMap, VecDeque};

use bastion_proto::{
    ChangeEvent, PlaceRequest, PlacementRow, RemoveRequest, RotateRequest, SnapshotResponse,
};

use crate::building::BuildingKind;
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::grid::{Cell, GridDimensions};
use crate::input::{InputEvent, MenuAction, PointerButton};
use crate::placement::{Placement, Rotation};
use crate::render::TileSheet;
use crate::store::{ApplyOutcome, FeedEvent, OccupancyStore};
use crate::viewport::Viewport;

/// Session-local command id.
pub type OpId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Place,
    Remove,
    Rotate,
}

/// A locally issued command that has not resolved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingIntent {
    pub op: OpId,
    pub cell: Cell,
    pub kind: IntentKind,
    pub issued_at_ms: f64,
    /// Cell contents before the optimistic change.
    pub previous: Option<Placement>,
    /// Cell contents right after the optimistic change.
    pub optimistic: Option<Placement>,
    /// A newer command on the same cell was confirmed, so a failure of this
    /// one no longer rolls the cell back.
    pub superseded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Place(Placement),
    Remove(Cell),
    /// Always carries the absolute target rotation.
    Rotate { cell: Cell, rotation: Rotation },
}

impl Command {
    pub fn cell(&self) -> Cell {
        match self {
            Command::Place(p) => p.cell,
            Command::Remove(cell) | Command::Rotate { cell, .. } => *cell,
        }
    }

    pub fn intent_kind(&self) -> IntentKind {
        match self {
            Command::Place(_) => IntentKind::Place,
            Command::Remove(_) => IntentKind::Remove,
            Command::Rotate { .. } => IntentKind::Rotate,
        }
    }

    pub fn to_request(&self, map_id: &str) -> CommandRequest {
        let map_id = map_id.to_string();
        match *self {
            Command::Place(p) => CommandRequest::Place(PlaceRequest {
                map_id,
                x: p.cell.x,
                y: p.cell.y,
                kind: p.kind.as_str().to_string(),
                rotation: p.rotation.into(),
            }),
            Command::Remove(cell) => CommandRequest::Remove(RemoveRequest {
                map_id,
                x: cell.x,
                y: cell.y,
            }),
            Command::Rotate { cell, rotation } => CommandRequest::Rotate(RotateRequest {
                map_id,
                x: cell.x,
                y: cell.y,
                rotation: Some(rotation.into()),
            }),
        }
    }
}

/// Wire body of a command, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    Place(PlaceRequest),
    Remove(RemoveRequest),
    Rotate(RotateRequest),
}

impl CommandRequest {
    pub fn path(&self) -> &'static str {
        match self {
            CommandRequest::Place(_) => bastion_proto::routes::PLACE,
            CommandRequest::Remove(_) => bastion_proto::routes::REMOVE,
            CommandRequest::Rotate(_) => bastion_proto::routes::ROTATE,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            CommandRequest::Place(body) => serde_json::to_string(body),
            CommandRequest::Remove(body) => serde_json::to_string(body),
            CommandRequest::Rotate(body) => serde_json::to_string(body),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundCommand {
    pub op: OpId,
    pub command: Command,
}

/// Successful command result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAck {
    Placement(PlacementRow),
    Removed { warning: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-visible message produced by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Context menu state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextMenuState {
    pub visible: bool,
    /// Page position for menu display.
    pub screen_pos: (f64, f64),
    pub cell: Cell,
    /// Kind occupying the cell when the menu opened.
    pub occupant: Option<BuildingKind>,
}

impl ContextMenuState {
    pub fn show(screen_pos: (f64, f64), cell: Cell, occupant: Option<BuildingKind>) -> Self {
        Self {
            visible: true,
            screen_pos,
            cell,
            occupant,
        }
    }

    pub fn hide() -> Self {
        Self::default()
    }

    pub fn has_placement(&self) -> bool {
        self.occupant.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionMsg {
    Input(InputEvent),
    Menu(MenuAction),
    SelectKind(BuildingKind),
    /// A queued command finished.
    Resolved {
        op: OpId,
        result: Result<CommandAck, EditorError>,
    },
    Feed(ChangeEvent),
    /// The feed subscription opened at this sequence number.
    FeedReady(u64),
    Snapshot(Result<SnapshotResponse, EditorError>),
    /// Canvas CSS size and device pixel ratio changed.
    Resize {
        width: f64,
        height: f64,
        device_pixel_ratio: f64,
    },
    TilesLoaded(TileSheet),
    /// Host clock in milliseconds, used to stamp intents.
    Tick(f64),
}

#[derive(Debug, Clone, Copy, Default)]
struct PanDrag {
    active: bool,
    last: (f64, f64),
}

#[derive(Debug)]
pub struct EditorSession {
    map_id: String,
    dims: GridDimensions,
    config: EditorConfig,
    viewport: Viewport,
    store: OccupancyStore,
    tiles: TileSheet,
    hover: Option<Cell>,
    pan: PanDrag,
    selected_kind: BuildingKind,
    selected_rotation: Rotation,
    menu: ContextMenuState,
    next_op: OpId,
    pending: HashMap<OpId, PendingIntent>,
    outbox: VecDeque<OutboundCommand>,
    notices: Vec<Notice>,
    resync_requested: bool,
    now_ms: f64,
}

impl EditorSession {
    pub fn new(map_id: impl Into<String>, dims: GridDimensions, config: EditorConfig) -> Self {
        let config = config.normalized();
        Self {
            map_id: map_id.into(),
            dims,
            viewport: Viewport::new(&config),
            config,
            store: OccupancyStore::new(),
            tiles: TileSheet::default(),
            hover: None,
            pan: PanDrag::default(),
            selected_kind: BuildingKind::default(),
            selected_rotation: Rotation::NONE,
            menu: ContextMenuState::hide(),
            next_op: 1,
            pending: HashMap::new(),
            outbox: VecDeque::new(),
            notices: Vec::new(),
            resync_requested: false,
            now_ms: 0.0,
        }
    }

    pub fn dispatch(&mut self, msg: SessionMsg) {
        match msg {
            SessionMsg::Input(event) => self.handle_input(event),
            SessionMsg::Menu(action) => self.handle_menu(action),
            SessionMsg::SelectKind(kind) => {
                tracing::debug!(%kind, "Selected building kind");
                self.selected_kind = kind;
            }
            SessionMsg::Resolved { op, result } => self.resolve(op, result),
            SessionMsg::Feed(event) => self.apply_feed(&event),
            SessionMsg::FeedReady(seq) => {
                tracing::debug!(seq, "Feed ready");
                self.store.start_feed(seq);
            }
            SessionMsg::Snapshot(result) => self.load_snapshot(result),
            SessionMsg::Resize {
                width,
                height,
                device_pixel_ratio,
            } => self
                .viewport
                .set_canvas_size(width, height, device_pixel_ratio),
            SessionMsg::TilesLoaded(tiles) => {
                tracing::info!(columns = tiles.columns, "Tile sheet loaded");
                self.tiles = tiles;
            }
            SessionMsg::Tick(now_ms) => self.now_ms = now_ms,
        }
    }

    // ---- input ----

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { x, y } => {
                let cell = self.viewport.screen_to_cell(x, y);
                self.hover = self.dims.contains(cell).then_some(cell);
                if self.pan.active {
                    let (lx, ly) = self.pan.last;
                    self.viewport.pan_by(x - lx, y - ly);
                    self.pan.last = (x, y);
                }
            }
            InputEvent::PointerDown { button, x, y } => {
                if button == PointerButton::Secondary {
                    self.pan = PanDrag {
                        active: true,
                        last: (x, y),
                    };
                }
            }
            InputEvent::PointerUp { button } => {
                if button == PointerButton::Secondary {
                    self.pan.active = false;
                }
            }
            InputEvent::PointerLeave => self.hover = None,
            InputEvent::Click { button, x, y, shift } => {
                if button != PointerButton::Primary {
                    return;
                }
                if self.menu.visible {
                    self.menu = ContextMenuState::hide();
                }
                let cell = self.viewport.screen_to_cell(x, y);
                if !self.dims.contains(cell) {
                    return;
                }
                if shift {
                    self.remove_at(cell);
                } else {
                    self.place_at(cell);
                }
            }
            InputEvent::Wheel { delta_y } => {
                self.viewport.wheel(delta_y, self.config.wheel_threshold);
            }
            InputEvent::ContextMenu {
                x,
                y,
                client_x,
                client_y,
            } => {
                let cell = self.viewport.screen_to_cell(x, y);
                if !self.dims.contains(cell) {
                    return;
                }
                let occupant = self.store.get(cell).map(|p| p.kind);
                self.menu = ContextMenuState::show((client_x, client_y), cell, occupant);
            }
            InputEvent::Key { key, shift } => {
                if key.eq_ignore_ascii_case("r") {
                    self.selected_rotation = if shift {
                        self.selected_rotation.prev()
                    } else {
                        self.selected_rotation.next()
                    };
                }
            }
        }
    }

    fn handle_menu(&mut self, action: MenuAction) {
        let menu = std::mem::replace(&mut self.menu, ContextMenuState::hide());
        if !menu.visible {
            return;
        }
        match action {
            MenuAction::Rotate => self.rotate_at(menu.cell),
            MenuAction::Remove => self.remove_at(menu.cell),
            MenuAction::Close => {}
        }
    }

    fn place_at(&mut self, cell: Cell) {
        let placement = Placement::new(cell, self.selected_kind, self.selected_rotation);
        let previous = self.store.optimistic_set(placement);
        self.issue(Command::Place(placement), previous, Some(placement));
    }

    fn remove_at(&mut self, cell: Cell) {
        if !self.dims.contains(cell) {
            return;
        }
        let Some(previous) = self.store.optimistic_delete(cell) else {
            return;
        };
        self.issue(Command::Remove(cell), Some(previous), None);
    }

    fn rotate_at(&mut self, cell: Cell) {
        let Some(current) = self.store.get(cell).copied() else {
            return;
        };
        let rotated = current.with_rotation(current.rotation.next());
        self.store.optimistic_set(rotated);
        self.issue(
            Command::Rotate {
                cell,
                rotation: rotated.rotation,
            },
            Some(current),
            Some(rotated),
        );
    }

    fn issue(&mut self, command: Command, previous: Option<Placement>, optimistic: Option<Placement>) {
        let op = self.next_op;
        self.next_op += 1;
        let cell = command.cell();
        let kind = command.intent_kind();
        tracing::debug!(op, %cell, ?kind, "Queued command");

        self.pending.insert(
            op,
            PendingIntent {
                op,
                cell,
                kind,
                issued_at_ms: self.now_ms,
                previous,
                optimistic,
                superseded: false,
            },
        );
        self.outbox.push_back(OutboundCommand { op, command });
    }

    // ---- reconciliation ----

    fn resolve(&mut self, op: OpId, result: Result<CommandAck, EditorError>) {
        let Some(intent) = self.pending.remove(&op) else {
            tracing::warn!(op, "Result for unknown command");
            return;
        };
        let elapsed_ms = self.now_ms - intent.issued_at_ms;

        let err = match result {
            Ok(ack) => {
                tracing::debug!(op, cell = %intent.cell, elapsed_ms, "Command confirmed");
                for older in self
                    .pending
                    .values_mut()
                    .filter(|p| p.cell == intent.cell && p.op < op)
                {
                    older.superseded = true;
                }
                if let CommandAck::Removed {
                    warning: Some(warning),
                } = ack
                {
                    self.notices.push(Notice::warning(warning));
                }
                return;
            }
            Err(err) => err,
        };

        tracing::warn!(op, cell = %intent.cell, kind = ?intent.kind, error = %err, "Command failed");
        // The next outstanding command on the cell took this one's optimistic
        // value as its baseline; hand it the value from before this command.
        let next = self
            .pending
            .values_mut()
            .filter(|p| p.cell == intent.cell && p.op > op)
            .min_by_key(|p| p.op);
        let roll_back = match next {
            Some(next) => {
                next.previous = intent.previous;
                false
            }
            None => {
                !intent.superseded && self.store.get(intent.cell).copied() == intent.optimistic
            }
        };

        match intent.kind {
            IntentKind::Place => {
                if roll_back {
                    self.store.restore(intent.cell, intent.previous);
                }
                self.notices.push(Notice::error(format!("Place failed: {err}")));
            }
            IntentKind::Rotate => {
                // Only the rotation changed, unless an earlier failed command
                // handed over an older baseline
                if roll_back {
                    self.store.restore(intent.cell, intent.previous);
                }
                self.notices.push(Notice::error(format!("Rotate failed: {err}")));
            }
            IntentKind::Remove => {
                self.resync_requested = true;
                self.notices.push(Notice::error(format!("Remove failed: {err}")));
            }
        }
    }

    fn apply_feed(&mut self, event: &ChangeEvent) {
        let feed = match FeedEvent::try_from(event) {
            Ok(feed) => feed,
            Err(err) => {
                tracing::warn!(error = %err, "Dropping malformed feed event");
                return;
            }
        };
        let outcome = self.store.apply(&feed);
        if outcome == ApplyOutcome::Stale {
            tracing::debug!(seq = ?feed.seq, cell = %feed.change.cell(), "Ignored stale feed event");
        }
        if self.store.take_gap() {
            tracing::info!(seq = ?feed.seq, "Feed events missing, requesting snapshot");
            self.resync_requested = true;
        }
    }

    fn load_snapshot(&mut self, result: Result<SnapshotResponse, EditorError>) {
        match result {
            Ok(snapshot) => {
                let mut placements = Vec::with_capacity(snapshot.placements.len());
                for row in &snapshot.placements {
                    match Placement::try_from(row) {
                        Ok(p) => placements.push(p),
                        Err(err) => {
                            tracing::warn!(x = row.x, y = row.y, error = %err, "Skipping invalid placement");
                        }
                    }
                }
                tracing::info!(count = placements.len(), seq = snapshot.seq, "Loaded snapshot");
                self.store.load(placements, snapshot.seq);
            }
            Err(err) => {
                tracing::error!(error = %err, "Snapshot load failed");
                self.store.clear();
                self.notices.push(Notice::error(format!("Could not load map: {err}")));
            }
        }
    }

    // ---- host side ----

    /// Take every queued command, oldest first.
    pub fn drain_outbox(&mut self) -> Vec<OutboundCommand> {
        self.outbox.drain(..).collect()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// True once after a failed remove or a feed gap; the host should reload
    /// the snapshot.
    pub fn take_resync(&mut self) -> bool {
        std::mem::take(&mut self.resync_requested)
    }

    // ---- read access ----

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn dims(&self) -> GridDimensions {
        self.dims
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn store(&self) -> &OccupancyStore {
        &self.store
    }

    pub fn tiles(&self) -> &TileSheet {
        &self.tiles
    }

    pub fn hover(&self) -> Option<Cell> {
        self.hover
    }

    pub fn is_panning(&self) -> bool {
        self.pan.active
    }

    pub fn selected_kind(&self) -> BuildingKind {
        self.selected_kind
    }

    pub fn selected_rotation(&self) -> Rotation {
        self.selected_rotation
    }

    pub fn menu(&self) -> &ContextMenuState {
        &self.menu
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingIntent> {
        self.pending.values()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
