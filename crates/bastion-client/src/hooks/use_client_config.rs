//! Hook for the persisted client settings.

use yew::prelude::*;

use crate::config::{CLIENT_CONFIG_KEY, ClientConfig};
use crate::hooks::use_localstorage;

#[hook]
pub fn use_client_config() -> UseStateHandle<ClientConfig> {
    use_localstorage(CLIENT_CONFIG_KEY, ClientConfig::default)
}
