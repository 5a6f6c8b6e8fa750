//! Application routes.

use yew_router::prelude::*;

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    /// Grid editor for one map.
    #[at("/maps/:map_id")]
    Editor { map_id: String },
    #[not_found]
    #[at("/404")]
    NotFound,
}
