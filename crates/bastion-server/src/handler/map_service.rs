use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use bastion_core::{BuildingKind, Cell, Placement, Rotation};
use bastion_proto::{
    ChangeEvent, FEED_EVENT, FeedReady, MapInfo, PlaceRequest, PlacementResponse, READY_EVENT,
    RemoveRequest, RemoveResponse, RotateRequest, SnapshotResponse,
};
use futures::{Stream, StreamExt, stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    service::database::{Database, DatabaseError},
    util,
};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, DatabaseError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| DatabaseError::InvalidBody(rejection.body_text()))
}

fn rotation(value: u8) -> Result<Rotation, DatabaseError> {
    Rotation::new(value).map_err(|err| DatabaseError::InvalidBody(err.to_string()))
}

/// Map ids in paths that do not parse cannot name an existing map.
fn path_map_id(raw: &str) -> Result<uuid::Uuid, DatabaseError> {
    uuid::Uuid::parse_str(raw).map_err(|_| DatabaseError::MapNotFound)
}

pub async fn place(
    State(database): State<Database>,
    headers: HeaderMap,
    payload: Result<Json<PlaceRequest>, JsonRejection>,
) -> Result<Json<PlacementResponse>, DatabaseError> {
    let req = body(payload)?;
    let map_id = util::map_id(&req.map_id)?;
    let kind: BuildingKind = req
        .kind
        .parse()
        .map_err(|err: bastion_core::KindError| DatabaseError::InvalidBody(err.to_string()))?;
    let placement = Placement::new(Cell::new(req.x, req.y), kind, rotation(req.rotation)?);
    let user_id = util::user_id(&headers)?;

    let placed = database.place(&map_id, &user_id, placement)?;
    tracing::info!(%map_id, user_id = %user_id, cell = %placed.cell, %kind, "Placed building");
    Ok(Json(PlacementResponse {
        placement: placed.to_row(),
    }))
}

pub async fn remove(
    State(database): State<Database>,
    headers: HeaderMap,
    payload: Result<Json<RemoveRequest>, JsonRejection>,
) -> Result<Json<RemoveResponse>, DatabaseError> {
    let req = body(payload)?;
    let map_id = util::map_id(&req.map_id)?;
    let user_id = util::user_id(&headers)?;

    let removed = database.remove(&map_id, &user_id, Cell::new(req.x, req.y))?;
    tracing::info!(%map_id, user_id = %user_id, cell = %removed.placement.cell, kind = %removed.placement.kind, "Removed building");
    Ok(Json(RemoveResponse {
        ok: true,
        warning: removed.warning,
    }))
}

pub async fn rotate(
    State(database): State<Database>,
    headers: HeaderMap,
    payload: Result<Json<RotateRequest>, JsonRejection>,
) -> Result<Json<PlacementResponse>, DatabaseError> {
    let req = body(payload)?;
    let map_id = util::map_id(&req.map_id)?;
    let target = req.rotation.map(rotation).transpose()?;
    let user_id = util::user_id(&headers)?;

    let rotated = database.rotate(&map_id, &user_id, Cell::new(req.x, req.y), target)?;
    tracing::info!(%map_id, user_id = %user_id, cell = %rotated.cell, rotation = rotated.rotation.quarter_turns(), "Rotated building");
    Ok(Json(PlacementResponse {
        placement: rotated.to_row(),
    }))
}

pub async fn map_info(
    State(database): State<Database>,
    Path(map_id): Path<String>,
) -> Result<Json<MapInfo>, DatabaseError> {
    let map_id = path_map_id(&map_id)?;
    Ok(Json(database.map_info(&map_id)?))
}

pub async fn snapshot(
    State(database): State<Database>,
    Path(map_id): Path<String>,
) -> Result<Json<SnapshotResponse>, DatabaseError> {
    let map_id = path_map_id(&map_id)?;
    let (placements, seq) = database.snapshot(&map_id)?;
    Ok(Json(SnapshotResponse {
        placements: placements.iter().map(Placement::to_row).collect(),
        seq,
    }))
}

/// Server-sent change feed for one map.
///
/// Opens with a `ready` event carrying the feed position, then streams
/// changes. A subscriber that falls behind the broadcast buffer is disconnected; the
/// client resubscribes and reloads the snapshot.
pub async fn feed(
    State(database): State<Database>,
    Path(map_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, DatabaseError> {
    let map_id = path_map_id(&map_id)?;
    let (receiver, seq) = database.subscribe(&map_id)?;
    tracing::info!(%map_id, seq, "Feed subscriber connected");
    let ready = Event::default()
        .event(READY_EVENT)
        .json_data(FeedReady { seq })
        .map_err(|err| DatabaseError::InvalidBody(err.to_string()))?;
    let events = stream::once(async move { Ok(ready) }).chain(feed_stream(map_id, receiver));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn feed_stream(
    map_id: uuid::Uuid,
    receiver: broadcast::Receiver<ChangeEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(receiver, move |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(change) => match Event::default().event(FEED_EVENT).json_data(&change) {
                    Ok(event) => return Some((Ok(event), receiver)),
                    Err(err) => {
                        tracing::error!(%map_id, error = %err, "Failed to encode change event");
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%map_id, skipped, "Feed subscriber lagged, disconnecting");
                    return None;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

pub async fn health() -> &'static str {
    "ok"
}
