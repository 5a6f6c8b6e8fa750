//! Camera and coordinate transforms for the grid canvas.
//!
//! Screen coordinates are CSS pixels relative to the canvas' top-left corner.
//! The camera offset is the screen position of cell `(0, 0)`'s top-left corner.

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::grid::{Cell, CellRect, GridDimensions};

/// Extra cells drawn around the visible area so tiles do not pop in at the edges.
const VISIBLE_MARGIN: i32 = 1;

/// Device pixels needed for a canvas of `css` size at `device_pixel_ratio`.
pub fn backing_size(css: (f64, f64), device_pixel_ratio: f64) -> (u32, u32) {
    (
        (css.0 * device_pixel_ratio).floor() as u32,
        (css.1 * device_pixel_ratio).floor() as u32,
    )
}

/// Direction of one discrete zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomStep {
    In,
    Out,
}

/// Pannable, zoomable camera over the tile grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Camera offset in CSS pixels. Pan deltas accumulate here unclamped.
    pub camera: (f64, f64),
    /// Index into `zoom_levels`.
    zoom_index: usize,
    /// Ascending integer zoom multipliers.
    zoom_levels: Vec<u32>,
    tile_size: u32,
    /// Canvas size in CSS pixels.
    canvas: (f64, f64),
    /// Device pixels per CSS pixel.
    device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Viewport {
    pub fn new(config: &EditorConfig) -> Self {
        let config = config.clone().normalized();
        Self {
            camera: config.initial_camera,
            zoom_index: config.initial_zoom_index,
            zoom_levels: config.zoom_levels,
            tile_size: config.tile_size,
            canvas: (0.0, 0.0),
            device_pixel_ratio: 1.0,
        }
    }

    pub fn zoom_index(&self) -> usize {
        self.zoom_index
    }

    /// Current zoom multiplier.
    pub fn zoom(&self) -> u32 {
        self.zoom_levels[self.zoom_index]
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Edge length of one cell on screen, in CSS pixels.
    pub fn cell_size(&self) -> f64 {
        f64::from(self.tile_size * self.zoom())
    }

    /// Camera offset snapped to whole pixels, so every tile edge lands on an
    /// integer coordinate and adjacent tiles never leave a seam.
    fn origin(&self) -> (f64, f64) {
        (self.camera.0.round(), self.camera.1.round())
    }

    /// Cell under a screen point. Not bounds-checked.
    ///
    /// Measured from the rounded camera origin rather than the raw offset, so
    /// the hit cell always matches the tile [`Self::cell_to_screen`] drew
    /// under the pointer. With a fractional pan the two can differ by up to
    /// half a pixel at a tile edge.
    pub fn screen_to_cell(&self, px: f64, py: f64) -> Cell {
        let (ox, oy) = self.origin();
        let size = self.cell_size();
        Cell::new(
            ((px - ox) / size).floor() as i32,
            ((py - oy) / size).floor() as i32,
        )
    }

    /// Top-left screen corner of a cell, rounded to whole pixels.
    pub fn cell_to_screen(&self, cell: Cell) -> (f64, f64) {
        let (ox, oy) = self.origin();
        let size = self.cell_size();
        (
            (ox + f64::from(cell.x) * size).round(),
            (oy + f64::from(cell.y) * size).round(),
        )
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.camera.0 += dx;
        self.camera.1 += dy;
    }

    /// Move one zoom level. Clamped at both ends; returns whether the level changed.
    pub fn step_zoom(&mut self, step: ZoomStep) -> bool {
        let before = self.zoom_index;
        self.zoom_index = match step {
            ZoomStep::In => (self.zoom_index + 1).min(self.zoom_levels.len() - 1),
            ZoomStep::Out => self.zoom_index.saturating_sub(1),
        };
        before != self.zoom_index
    }

    /// Apply one wheel tick. Wheel up (`delta_y < 0`) zooms in.
    pub fn wheel(&mut self, delta_y: f64, threshold: f64) -> bool {
        if delta_y.is_nan() || delta_y.abs() < threshold || delta_y == 0.0 {
            return false;
        }
        let step = if delta_y > 0.0 {
            ZoomStep::Out
        } else {
            ZoomStep::In
        };
        self.step_zoom(step)
    }

    /// Record a new canvas size after the container resized.
    pub fn set_canvas_size(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        self.canvas = (width.max(0.0), height.max(0.0));
        self.device_pixel_ratio = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
    }

    /// Canvas size in CSS pixels.
    pub fn canvas_size(&self) -> (f64, f64) {
        self.canvas
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Pixel dimensions for the canvas backing store.
    pub fn backing_size(&self) -> (u32, u32) {
        backing_size(self.canvas, self.device_pixel_ratio)
    }

    /// Cells that can appear on the canvas, with a one-cell margin, clipped to
    /// the grid. `None` when the grid is entirely off screen.
    pub fn visible_cells(&self, dims: GridDimensions) -> Option<CellRect> {
        let (ox, oy) = self.origin();
        let size = self.cell_size();
        let (cw, ch) = self.canvas;
        let min = Cell::new(
            (-ox / size).floor() as i32 - VISIBLE_MARGIN,
            (-oy / size).floor() as i32 - VISIBLE_MARGIN,
        );
        let max = Cell::new(
            ((cw - ox) / size).ceil() as i32 + VISIBLE_MARGIN,
            ((ch - oy) / size).ceil() as i32 + VISIBLE_MARGIN,
        );
        dims.clip(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut vp = Viewport::default();
        vp.set_canvas_size(800.0, 600.0, 1.0);
        vp
    }

    #[test]
    fn test_screen_to_cell_uses_camera_and_zoom() {
        let vp = viewport();
        // camera (40, 40), zoom 2x, tile 16 -> 32px cells
        assert_eq!(vp.cell_size(), 32.0);
        assert_eq!(vp.screen_to_cell(40.0, 40.0), Cell::new(0, 0));
        assert_eq!(vp.screen_to_cell(71.9, 72.0), Cell::new(0, 1));
        assert_eq!(vp.screen_to_cell(39.0, 40.0), Cell::new(-1, 0));
    }

    #[test]
    fn test_screen_to_cell_follows_drawn_tile_edge() {
        let mut vp = viewport();
        // Raw camera 40.6 draws cell (0, 0) from x = 41
        vp.pan_by(0.6, 0.0);
        assert_eq!(vp.cell_to_screen(Cell::new(0, 0)).0, 41.0);
        assert_eq!(vp.screen_to_cell(40.8, 40.0), Cell::new(-1, 0));
        assert_eq!(vp.screen_to_cell(41.0, 40.0), Cell::new(0, 0));
    }

    #[test]
    fn test_round_trip_at_fixed_zoom() {
        let mut vp = viewport();
        vp.pan_by(-13.4, 7.6);
        for _ in 0..3 {
            for y in 0..20 {
                for x in 0..20 {
                    let cell = Cell::new(x, y);
                    let (px, py) = vp.cell_to_screen(cell);
                    assert_eq!(px.fract(), 0.0);
                    assert_eq!(vp.screen_to_cell(px, py), cell);
                }
            }
            vp.step_zoom(ZoomStep::In);
        }
    }

    #[test]
    fn test_zoom_clamps_at_ends() {
        let mut vp = viewport();
        assert!(vp.step_zoom(ZoomStep::Out));
        assert_eq!(vp.zoom_index(), 0);
        // Wheel up at minimum moves exactly one step
        assert!(vp.wheel(-100.0, 1.0));
        assert_eq!(vp.zoom_index(), 1);

        while vp.step_zoom(ZoomStep::In) {}
        assert_eq!(vp.zoom_index(), 3);
        assert!(!vp.wheel(-100.0, 1.0));
        assert_eq!(vp.zoom_index(), 3);
    }

    #[test]
    fn test_wheel_threshold_ignores_noise() {
        let mut vp = viewport();
        assert!(!vp.wheel(0.4, 1.0));
        assert!(!vp.wheel(0.0, 0.0));
        assert_eq!(vp.zoom_index(), 1);
        assert!(vp.wheel(3.0, 1.0));
        assert_eq!(vp.zoom_index(), 0);
    }

    #[test]
    fn test_pan_is_unclamped() {
        let mut vp = viewport();
        vp.pan_by(-100_000.0, 0.0);
        assert_eq!(vp.camera, (-99_960.0, 40.0));
        assert!(vp.visible_cells(GridDimensions::new(64, 64)).is_none());
    }

    #[test]
    fn test_visible_cells_margin_and_clip() {
        let vp = viewport();
        let rect = vp.visible_cells(GridDimensions::new(100, 100)).unwrap();
        assert_eq!(rect.min, Cell::new(0, 0));
        // (800 - 40) / 32 = 23.75 -> 24, plus margin
        assert_eq!(rect.max, Cell::new(25, 19));

        let small = vp.visible_cells(GridDimensions::new(8, 4)).unwrap();
        assert_eq!(small.max, Cell::new(7, 3));
    }

    #[test]
    fn test_backing_size_scales_with_dpr() {
        let mut vp = Viewport::default();
        vp.set_canvas_size(300.5, 200.0, 2.0);
        assert_eq!(vp.backing_size(), (601, 400));
        vp.set_canvas_size(300.0, 200.0, 0.0);
        assert_eq!(vp.device_pixel_ratio(), 1.0);
    }
}
