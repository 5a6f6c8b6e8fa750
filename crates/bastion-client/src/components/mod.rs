//! UI components for the editor page.

mod context_menu;
mod map_canvas;
mod notices;
mod palette;

pub use context_menu::ContextMenu;
pub use map_canvas::MapCanvas;
pub use notices::{NoticeAction, NoticeBoard, NoticeList};
pub use palette::Palette;
