use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::{
        chat::ChatEntryView,
        room::{CreateRoomRequest, JoinRoomRequest, PostMessageRequest, RoomSnapshot, RoomTicket},
    },
    error::{AppError, ErrorBody},
    services::room_service,
    state::{Session, SharedState},
};

/// Room membership and chat endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/join", post(join_room))
        .route("/rooms/{room_id}/leave", post(leave_room))
        .route("/rooms/{room_id}/messages", post(post_message))
}

/// Open a new room. An identity is minted unless the caller sends one.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    params(("X-User-Identity" = Option<String>, Header, description = "Identity to reuse")),
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomTicket),
        (status = 400, description = "Invalid name", body = ErrorBody)
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    session: Option<Session>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<RoomTicket>, AppError> {
    payload.validate()?;
    let ticket = room_service::create_room(&state, &payload.name, session).await?;
    Ok(Json(ticket))
}

/// Room snapshot as seen by the caller.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}",
    tag = "rooms",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("X-User-Identity" = String, Header, description = "Caller identity")
    ),
    responses(
        (status = 200, description = "Room snapshot", body = RoomSnapshot),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "Unknown room", body = ErrorBody)
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    session: Session,
) -> Result<Json<RoomSnapshot>, AppError> {
    Ok(Json(room_service::get_room(&state, &room_id, &session).await?))
}

/// Enter a room, or come back to it.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/join",
    tag = "rooms",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("X-User-Identity" = Option<String>, Header, description = "Identity of a returning member")
    ),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined", body = RoomTicket),
        (status = 404, description = "Unknown room", body = ErrorBody),
        (status = 409, description = "Name used by someone online", body = ErrorBody)
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    session: Option<Session>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<RoomTicket>, AppError> {
    payload.validate()?;
    let ticket = room_service::join_room(&state, &room_id, &payload.name, session).await?;
    Ok(Json(ticket))
}

/// Go offline in a room.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/leave",
    tag = "rooms",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("X-User-Identity" = String, Header, description = "Caller identity")
    ),
    responses(
        (status = 204, description = "Left the room"),
        (status = 404, description = "Unknown room", body = ErrorBody)
    )
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    session: Session,
) -> Result<StatusCode, AppError> {
    room_service::leave_room(&state, &room_id, &session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Post a chat message.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/messages",
    tag = "rooms",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("X-User-Identity" = String, Header, description = "Caller identity")
    ),
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "Message posted", body = ChatEntryView),
        (status = 400, description = "Empty or too long", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody)
    )
)]
pub async fn post_message(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    session: Session,
    Json(payload): Json<PostMessageRequest>,
) -> Result<Json<ChatEntryView>, AppError> {
    payload.validate()?;
    let entry = room_service::post_message(&state, &room_id, &session, &payload.message).await?;
    Ok(Json(entry))
}
