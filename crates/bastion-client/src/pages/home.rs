//! Home page: pick a user and a map to open.

use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::hooks::use_client_config;
use crate::routes::Route;

#[function_component(HomePage)]
pub fn home_page() -> Html {
    let config = use_client_config();
    let navigator = use_navigator();
    let user_ref = use_node_ref();
    let map_ref = use_node_ref();

    let onsubmit = {
        let config = config.clone();
        let user_ref = user_ref.clone();
        let map_ref = map_ref.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let (Some(user), Some(map)) = (
                user_ref.cast::<HtmlInputElement>(),
                map_ref.cast::<HtmlInputElement>(),
            ) else {
                return;
            };
            let user_id = user.value().trim().to_string();
            let map_id = map.value().trim().to_string();
            if user_id.is_empty() || map_id.is_empty() {
                return;
            }

            let mut next = (*config).clone();
            next.user_id = user_id;
            config.set(next);
            if let Some(navigator) = &navigator {
                navigator.push(&Route::Editor { map_id });
            }
        })
    };

    html! {
        <main class="page home">
            <h1>{ "Bastion Builder" }</h1>
            <form {onsubmit}>
                <label>
                    { "User" }
                    <input ref={user_ref} type="text" value={config.user_id.clone()} />
                </label>
                <label>
                    { "Map" }
                    <input
                        ref={map_ref}
                        type="text"
                        value={config.suggested_map_id().to_string()}
                    />
                </label>
                <button type="submit">{ "Open editor" }</button>
            </form>
        </main>
    }
}
