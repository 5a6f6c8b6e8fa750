mod use_client_config;
mod use_editor_session;
mod use_localstorage;

pub use use_client_config::use_client_config;
pub use use_editor_session::{EditorHandle, use_editor_session};
pub use use_localstorage::use_localstorage;
