use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;

use crate::{
    error::{AppError, ErrorBody},
    services::sse_service,
    state::{Session, SharedState},
};

#[utoipa::path(
    get,
    path = "/rooms/{room_id}/events",
    tag = "sse",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("identity" = String, Query, description = "Caller identity, for clients that cannot send headers")
    ),
    responses(
        (status = 200, description = "Room SSE stream (`handshake`, `users`, `chat`, `games`)", content_type = "text/event-stream", body = String),
        (status = 403, description = "Not a member", body = ErrorBody)
    )
)]
/// Stream room snapshots whenever the room changes.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    session: Session,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    Ok(sse_service::room_stream(state, room_id, session).await?)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{room_id}/events", get(room_stream))
}
