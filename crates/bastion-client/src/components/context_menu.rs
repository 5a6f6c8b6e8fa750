//! Context menu for a grid cell.

use bastion_core::{ContextMenuState, MenuAction};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ContextMenuProps {
    pub state: ContextMenuState,
    pub on_action: Callback<MenuAction>,
}

#[function_component(ContextMenu)]
pub fn context_menu(props: &ContextMenuProps) -> Html {
    // Close menu when clicking outside
    let onmousedown_overlay = {
        let on_action = props.on_action.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            e.stop_propagation();
            on_action.emit(MenuAction::Close);
        })
    };
    let oncontextmenu_overlay = Callback::from(|e: MouseEvent| e.prevent_default());

    // Prevent event propagation on menu click
    let onmousedown_menu = Callback::from(|e: MouseEvent| {
        e.stop_propagation();
    });

    let item = |action: MenuAction| {
        let on_action = props.on_action.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            on_action.emit(action);
        })
    };

    if !props.state.visible {
        return html! {};
    }

    let style = format!(
        "left: {}px; top: {}px;",
        props.state.screen_pos.0, props.state.screen_pos.1
    );
    let cell = props.state.cell;
    let title = match props.state.occupant {
        Some(kind) => format!("{} {cell}", kind.definition().name),
        None => format!("Empty tile {cell}"),
    };

    html! {
        <div
            class="context-menu-overlay"
            onmousedown={onmousedown_overlay}
            oncontextmenu={oncontextmenu_overlay}
        >
            <div class="context-menu" {style} onmousedown={onmousedown_menu}>
                <div class="context-menu-title">{ title }</div>
                if props.state.has_placement() {
                    <div class="context-menu-item" onclick={item(MenuAction::Rotate)}>
                        { "Rotate" }
                    </div>
                    <div
                        class="context-menu-item context-menu-item-danger"
                        onclick={item(MenuAction::Remove)}
                    >
                        { "Remove" }
                    </div>
                }
                <div class="context-menu-item" onclick={item(MenuAction::Close)}>
                    { "Close" }
                </div>
            </div>
        </div>
    }
}
