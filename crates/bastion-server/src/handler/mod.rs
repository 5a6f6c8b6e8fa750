use axum::{
    Router,
    routing::{get, post},
};
use bastion_proto::routes;

use crate::service::database::Database;

pub mod map_service;

/// API routes, without static file serving or middleware.
pub fn router(database: Database) -> Router {
    Router::new()
        .route(routes::HEALTH, get(map_service::health))
        .route(routes::PLACE, post(map_service::place))
        .route(routes::REMOVE, post(map_service::remove))
        .route(routes::ROTATE, post(map_service::rotate))
        .route(routes::MAP, get(map_service::map_info))
        .route(routes::SNAPSHOT, get(map_service::snapshot))
        .route(routes::FEED, get(map_service::feed))
        .with_state(database)
}
