//! Map editor page.
//!
//! Loads the map geometry, then mounts one [`MapEditor`] per map id so that
//! switching maps starts a fresh session.

use bastion_core::{EditorConfig, SessionMsg};
use bastion_proto::MapInfo;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::components::{ContextMenu, MapCanvas, NoticeAction, NoticeBoard, NoticeList, Palette};
use crate::hooks::{use_client_config, use_editor_session};
use crate::network::ApiClient;
use crate::routes::Route;

#[derive(Clone, PartialEq)]
enum MapLoad {
    Loading,
    Loaded(MapInfo),
    Failed(String),
}

#[derive(Properties, PartialEq)]
pub struct EditorPageProps {
    pub map_id: String,
}

#[function_component(EditorPage)]
pub fn editor_page(props: &EditorPageProps) -> Html {
    let config = use_client_config();
    let api = ApiClient::new(&config);
    let load = use_state(|| MapLoad::Loading);

    {
        let load = load.clone();
        let api = api.clone();
        use_effect_with(props.map_id.clone(), move |map_id| {
            let map_id = map_id.clone();
            load.set(MapLoad::Loading);
            spawn_local(async move {
                match api.map_info(&map_id).await {
                    Ok(info) => load.set(MapLoad::Loaded(info)),
                    Err(err) => {
                        tracing::error!(%map_id, error = %err, "Failed to load map");
                        load.set(MapLoad::Failed(err.to_string()));
                    }
                }
            });
            || ()
        });
    }

    // Remember the last map that opened successfully
    {
        let config = config.clone();
        use_effect_with((*load).clone(), move |load| {
            if let MapLoad::Loaded(info) = load {
                if config.last_map_id.as_deref() != Some(info.id.as_str()) {
                    let mut next = (*config).clone();
                    next.last_map_id = Some(info.id.clone());
                    config.set(next);
                }
            }
            || ()
        });
    }

    match &*load {
        MapLoad::Loading => html! {
            <main class="page editor">
                <p class="editor-status">{ "Loading map..." }</p>
            </main>
        },
        MapLoad::Failed(message) => html! {
            <main class="page editor">
                <p class="editor-status">{ format!("Could not open map: {message}") }</p>
                <Link<Route> to={Route::Home}>{ "Back to maps" }</Link<Route>>
            </main>
        },
        MapLoad::Loaded(info) => html! {
            <MapEditor
                key={info.id.clone()}
                info={info.clone()}
                {api}
                config={config.editor.clone()}
                user_id={config.user_id.clone()}
            />
        },
    }
}

#[derive(Properties, PartialEq)]
struct MapEditorProps {
    info: MapInfo,
    api: ApiClient,
    config: EditorConfig,
    user_id: String,
}

#[function_component(MapEditor)]
fn map_editor(props: &MapEditorProps) -> Html {
    let board = use_reducer(NoticeBoard::default);
    let on_notices = {
        let dispatcher = board.dispatcher();
        Callback::from(move |notices| dispatcher.dispatch(NoticeAction::Push(notices)))
    };
    let handle = use_editor_session(
        props.info.clone(),
        props.api.clone(),
        props.config.clone(),
        on_notices,
    );

    let (kind, rotation, menu) = {
        let session = handle.session.borrow();
        (
            session.selected_kind(),
            session.selected_rotation(),
            session.menu().clone(),
        )
    };

    let on_select = handle.callback(SessionMsg::SelectKind);
    let on_menu = handle.callback(SessionMsg::Menu);
    let on_dismiss = {
        let dispatcher = board.dispatcher();
        Callback::from(move |index| dispatcher.dispatch(NoticeAction::Dismiss(index)))
    };

    html! {
        <main class="page editor">
            <aside class="editor-sidebar">
                <Link<Route> to={Route::Home}>{ "Maps" }</Link<Route>>
                <h1>{ format!("Map {}x{}", props.info.width, props.info.height) }</h1>
                <p class="editor-user">{ format!("Editing as {}", props.user_id) }</p>
                <Palette selected={kind} {rotation} {on_select} />
                <ul class="editor-help">
                    <li>{ "Click: place" }</li>
                    <li>{ "Shift+click: remove" }</li>
                    <li>{ "R / Shift+R: rotate" }</li>
                    <li>{ "Right-drag: pan, wheel: zoom" }</li>
                    <li>{ "Right-click: tile menu" }</li>
                </ul>
            </aside>
            <MapCanvas handle={handle.clone()} />
            <ContextMenu state={menu} on_action={on_menu} />
            <NoticeList notices={board.notices.clone()} {on_dismiss} />
        </main>
    }
}
