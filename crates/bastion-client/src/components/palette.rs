//! Building palette.

use bastion_core::{BuildingKind, Rotation};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct PaletteProps {
    pub selected: BuildingKind,
    pub rotation: Rotation,
    pub on_select: Callback<BuildingKind>,
}

#[function_component(Palette)]
pub fn palette(props: &PaletteProps) -> Html {
    let items = BuildingKind::ALL.iter().map(|&kind| {
        let definition = kind.definition();
        let onclick = {
            let on_select = props.on_select.clone();
            Callback::from(move |_: MouseEvent| on_select.emit(kind))
        };
        html! {
            <li
                key={kind.as_str()}
                class={classes!("palette-item", (kind == props.selected).then_some("selected"))}
                title={definition.description}
                {onclick}
            >
                <span class="palette-name">{ definition.name }</span>
                <span class="cost">{ format!("{} gp", definition.base_cost) }</span>
            </li>
        }
    });

    html! {
        <section class="palette">
            <h2>{ "Buildings" }</h2>
            <ul>{ for items }</ul>
            <p class="palette-rotation">{ format!("Rotation: {}°", props.rotation.degrees()) }</p>
        </section>
    }
}
