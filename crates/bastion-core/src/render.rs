//! Frame drawing for the grid canvas.
//!
//! [`draw_frame`] reads an [`EditorSession`] and issues draw calls against a
//! [`Surface`]. The browser client implements `Surface` over a 2D canvas
//! context; tests record the calls.

use crate::building::BuildingKind;
use crate::grid::Cell;
use crate::placement::Rotation;
use crate::session::EditorSession;
use crate::viewport::Viewport;

/// Sprite sheet cell of the grass tile.
pub const GRASS_SPRITE: (u32, u32) = (0, 0);
/// Sprite sheet cell of the hover selector frame.
pub const SELECTOR_SPRITE: (u32, u32) = (1, 0);

pub const FALLBACK_BACKGROUND: &str = "#2a7b2a";
pub const BLOCKED_COLOR: &str = "#ff0000";
pub const SELECTOR_COLOR: &str = "#ffffff";

pub const GHOST_ALPHA: f64 = 0.6;
pub const BLOCKED_ALPHA: f64 = 0.25;

/// Destination rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Drawing backend used by [`draw_frame`].
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64);
    fn fill_rect(&mut self, rect: Rect, color: &str, alpha: f64);
    fn stroke_rect(&mut self, rect: Rect, color: &str);
    /// Draw one sprite sheet cell into `dest`, rotated about its centre.
    fn draw_sprite(&mut self, sprite: (u32, u32), dest: Rect, rotation: Rotation, alpha: f64);
}

/// Load state of the sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileSheet {
    pub ready: bool,
    /// Sprite columns available in the loaded image.
    pub columns: u32,
}

impl TileSheet {
    pub fn loaded(columns: u32) -> Self {
        Self {
            ready: true,
            columns,
        }
    }

    /// Sprite for a kind; sheets too narrow for it get the workshop sprite.
    pub fn sprite_for(&self, kind: BuildingKind) -> (u32, u32) {
        let sprite = kind.definition().sprite;
        if sprite.0 < self.columns {
            sprite
        } else {
            BuildingKind::Workshop.definition().sprite
        }
    }
}

/// Flat colour for a kind while the sprite sheet is missing.
pub fn flat_color(kind: BuildingKind) -> &'static str {
    match kind {
        BuildingKind::Workshop => "#8b5a2b",
        BuildingKind::Barracks => "#5a5a6e",
    }
}

fn cell_rect(viewport: &Viewport, cell: Cell) -> Rect {
    let (x, y) = viewport.cell_to_screen(cell);
    let size = viewport.cell_size();
    Rect::new(x, y, size, size)
}

/// Draw one frame of the editor.
pub fn draw_frame<S: Surface>(session: &EditorSession, surface: &mut S) {
    let viewport = session.viewport();
    let tiles = session.tiles();
    let (width, height) = viewport.canvas_size();

    surface.clear(width, height);
    if !tiles.ready {
        surface.fill_rect(Rect::new(0.0, 0.0, width, height), FALLBACK_BACKGROUND, 1.0);
    }

    let Some(visible) = viewport.visible_cells(session.dims()) else {
        return;
    };

    if tiles.ready {
        for cell in visible.cells() {
            surface.draw_sprite(GRASS_SPRITE, cell_rect(viewport, cell), Rotation::NONE, 1.0);
        }
    }

    let store = session.store();
    for placement in store.iter().filter(|p| visible.contains(p.cell)) {
        let dest = cell_rect(viewport, placement.cell);
        if tiles.ready {
            surface.draw_sprite(tiles.sprite_for(placement.kind), dest, placement.rotation, 1.0);
        } else {
            surface.fill_rect(dest, flat_color(placement.kind), 1.0);
        }
    }

    let Some(hover) = session.hover() else {
        return;
    };
    let dest = cell_rect(viewport, hover);

    if store.contains(hover) {
        surface.fill_rect(dest, BLOCKED_COLOR, BLOCKED_ALPHA);
    } else {
        let kind = session.selected_kind();
        if tiles.ready {
            surface.draw_sprite(
                tiles.sprite_for(kind),
                dest,
                session.selected_rotation(),
                GHOST_ALPHA,
            );
        } else {
            surface.fill_rect(dest, flat_color(kind), GHOST_ALPHA);
        }
    }

    if tiles.ready {
        surface.draw_sprite(SELECTOR_SPRITE, dest, Rotation::NONE, 1.0);
    } else {
        surface.stroke_rect(dest, SELECTOR_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::grid::GridDimensions;
    use crate::input::InputEvent;
    use crate::session::SessionMsg;
    use bastion_proto::{PlacementRow, SnapshotResponse};

    #[derive(Debug, Clone, PartialEq)]
    enum DrawOp {
        Clear,
        Fill { rect: Rect, color: String, alpha: f64 },
        Stroke { rect: Rect },
        Sprite { sprite: (u32, u32), dest: Rect, turns: u8, alpha: f64 },
    }

    #[derive(Default)]
    struct RecordingSurface {
        ops: Vec<DrawOp>,
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self, _width: f64, _height: f64) {
            self.ops.push(DrawOp::Clear);
        }

        fn fill_rect(&mut self, rect: Rect, color: &str, alpha: f64) {
            self.ops.push(DrawOp::Fill {
                rect,
                color: color.to_string(),
                alpha,
            });
        }

        fn stroke_rect(&mut self, rect: Rect, _color: &str) {
            self.ops.push(DrawOp::Stroke { rect });
        }

        fn draw_sprite(&mut self, sprite: (u32, u32), dest: Rect, rotation: Rotation, alpha: f64) {
            self.ops.push(DrawOp::Sprite {
                sprite,
                dest,
                turns: rotation.quarter_turns(),
                alpha,
            });
        }
    }

    fn session(tiles: Option<TileSheet>) -> EditorSession {
        let mut s = EditorSession::new("m1", GridDimensions::new(4, 4), EditorConfig::default());
        s.dispatch(SessionMsg::Resize {
            width: 800.0,
            height: 600.0,
            device_pixel_ratio: 1.0,
        });
        s.dispatch(SessionMsg::Snapshot(Ok(SnapshotResponse {
            placements: vec![PlacementRow {
                x: 1,
                y: 1,
                kind: "barracks".to_string(),
                rotation: 2,
            }],
            seq: 0,
        })));
        if let Some(tiles) = tiles {
            s.dispatch(SessionMsg::TilesLoaded(tiles));
        }
        s
    }

    fn hover(s: &mut EditorSession, cell: i32) {
        let p = f64::from(40 + 32 * cell + 1);
        s.dispatch(SessionMsg::Input(InputEvent::PointerMove { x: p, y: p }));
    }

    fn render(s: &EditorSession) -> Vec<DrawOp> {
        let mut surface = RecordingSurface::default();
        draw_frame(s, &mut surface);
        surface.ops
    }

    #[test]
    fn test_empty_hover_draws_ghost_then_selector() {
        let mut s = session(Some(TileSheet::loaded(8)));
        s.dispatch(SessionMsg::Input(InputEvent::Key {
            key: "r".to_string(),
            shift: false,
        }));
        hover(&mut s, 2);
        let ops = render(&s);

        let cell = Rect::new(104.0, 104.0, 32.0, 32.0);
        let n = ops.len();
        assert_eq!(
            ops[n - 2],
            DrawOp::Sprite {
                sprite: (2, 0),
                dest: cell,
                turns: 1,
                alpha: GHOST_ALPHA
            }
        );
        assert_eq!(
            ops[n - 1],
            DrawOp::Sprite {
                sprite: SELECTOR_SPRITE,
                dest: cell,
                turns: 0,
                alpha: 1.0
            }
        );
    }

    #[test]
    fn test_occupied_hover_draws_blocked_tint() {
        let mut s = session(Some(TileSheet::loaded(8)));
        hover(&mut s, 1);
        let ops = render(&s);
        let n = ops.len();
        assert!(matches!(
            &ops[n - 2],
            DrawOp::Fill { color, alpha, .. } if color == BLOCKED_COLOR && (*alpha - BLOCKED_ALPHA).abs() < f64::EPSILON
        ));
        assert!(!ops.iter().any(|op| matches!(op, DrawOp::Sprite { alpha, .. } if (*alpha - GHOST_ALPHA).abs() < f64::EPSILON)));
    }

    #[test]
    fn test_grass_and_rotated_building() {
        let s = session(Some(TileSheet::loaded(8)));
        let ops = render(&s);
        assert_eq!(ops[0], DrawOp::Clear);
        let grass = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Sprite { sprite, .. } if *sprite == GRASS_SPRITE))
            .count();
        assert_eq!(grass, 16);
        assert!(ops.contains(&DrawOp::Sprite {
            sprite: (3, 0),
            dest: Rect::new(72.0, 72.0, 32.0, 32.0),
            turns: 2,
            alpha: 1.0
        }));
    }

    #[test]
    fn test_narrow_sheet_falls_back_to_workshop_sprite() {
        let sheet = TileSheet::loaded(3);
        assert_eq!(sheet.sprite_for(BuildingKind::Barracks), (2, 0));
        assert_eq!(sheet.sprite_for(BuildingKind::Workshop), (2, 0));
    }

    #[test]
    fn test_unloaded_sheet_uses_flat_fallback() {
        let mut s = session(None);
        hover(&mut s, 2);
        let ops = render(&s);
        assert_eq!(
            ops[1],
            DrawOp::Fill {
                rect: Rect::new(0.0, 0.0, 800.0, 600.0),
                color: FALLBACK_BACKGROUND.to_string(),
                alpha: 1.0
            }
        );
        assert!(!ops.iter().any(|op| matches!(op, DrawOp::Sprite { .. })));
        assert!(matches!(ops.last(), Some(DrawOp::Stroke { .. })));
    }

    #[test]
    fn test_offscreen_grid_draws_background_only() {
        let mut s = session(Some(TileSheet::loaded(8)));
        s.dispatch(SessionMsg::Input(InputEvent::PointerDown {
            button: crate::input::PointerButton::Secondary,
            x: 0.0,
            y: 0.0,
        }));
        s.dispatch(SessionMsg::Input(InputEvent::PointerMove {
            x: -5000.0,
            y: 0.0,
        }));
        assert_eq!(render(&s), vec![DrawOp::Clear]);
    }
}
