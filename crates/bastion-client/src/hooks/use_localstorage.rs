use std::ops::Deref;

use yew::prelude::*;

/// State mirrored to `localStorage` under `key` as JSON.
///
/// Values that fail to parse are replaced by `init_fn()`.
#[hook]
pub fn use_localstorage<T, F>(key: &'static str, init_fn: F) -> UseStateHandle<T>
where
    T: 'static + Clone + serde::Serialize + serde::de::DeserializeOwned + PartialEq,
    F: Fn() -> T + 'static,
{
    let state = use_state(|| {
        let stored = web_sys::window()
            .and_then(|win| win.local_storage().ok().flatten())
            .and_then(|storage| storage.get_item(key).ok().flatten())
            .and_then(|value| serde_json::from_str::<T>(&value).ok());
        stored.unwrap_or_else(init_fn)
    });
    {
        use_effect_with(state.clone(), move |state| {
            let storage = web_sys::window().and_then(|win| win.local_storage().ok().flatten());
            if let Some(storage) = storage {
                match serde_json::to_string(state.deref()) {
                    Ok(serialized) => {
                        if storage.set_item(key, &serialized).is_err() {
                            tracing::warn!(key, "Failed to write local storage");
                        }
                    }
                    Err(err) => tracing::warn!(key, error = %err, "Failed to serialize setting"),
                }
            }
            || ()
        });
    }
    state
}
