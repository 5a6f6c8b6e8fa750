//! Bastion-Builder Core Library
//!
//! Platform-independent editor core: grid geometry, the building catalogue,
//! the viewport, the occupancy store, frame drawing against a [`Surface`],
//! and the [`EditorSession`] that ties input, commands and the live feed
//! together.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod building;
pub mod config;
pub mod error;
pub mod grid;
pub mod input;
pub mod placement;
pub mod render;
pub mod session;
pub mod store;
pub mod viewport;

pub use building::{BuildingDefinition, BuildingKind};
pub use config::EditorConfig;
pub use error::{EditorError, KindError, RotationError};
pub use grid::{Cell, CellRect, GridDimensions};
pub use input::{InputEvent, MenuAction, PointerButton};
pub use placement::{Placement, Rotation};
pub use render::{Rect, Surface, TileSheet, draw_frame};
pub use session::{
    Command, CommandAck, CommandRequest, ContextMenuState, EditorSession, Notice, NoticeLevel,
    OpId, OutboundCommand, SessionMsg,
};
pub use store::{ApplyOutcome, FeedChange, FeedEvent, OccupancyStore};
pub use viewport::{Viewport, ZoomStep};
