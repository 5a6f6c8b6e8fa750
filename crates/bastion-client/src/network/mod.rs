pub mod api;
pub mod feed;

pub use api::ApiClient;
