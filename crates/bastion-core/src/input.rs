//! Platform-neutral input events.
//!
//! Coordinates are canvas-local CSS pixels. The client converts DOM events
//! into these before handing them to the session.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => PointerButton::Primary,
            2 => PointerButton::Secondary,
            _ => PointerButton::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerDown {
        button: PointerButton,
        x: f64,
        y: f64,
    },
    PointerUp {
        button: PointerButton,
    },
    /// Pointer left the canvas.
    PointerLeave,
    Click {
        button: PointerButton,
        x: f64,
        y: f64,
        shift: bool,
    },
    Wheel {
        delta_y: f64,
    },
    /// Right click. `client_x`/`client_y` position the menu on the page.
    ContextMenu {
        x: f64,
        y: f64,
        client_x: f64,
        client_y: f64,
    },
    Key {
        key: String,
        shift: bool,
    },
}

/// Context menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Rotate,
    Remove,
    Close,
}
