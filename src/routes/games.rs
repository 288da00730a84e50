use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::game::{GameView, SubmissionReceipt, SubmitActionRequest},
    error::{AppError, ErrorBody},
    services::game_service,
    state::{Session, SharedState},
};

/// Game lifecycle endpoints nested under a room.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{room_id}/games", post(host_game))
        .route("/rooms/{room_id}/games/{game_id}", get(get_game))
        .route("/rooms/{room_id}/games/{game_id}/apply", post(apply_to_game))
        .route("/rooms/{room_id}/games/{game_id}/actions", post(submit_action))
}

/// Host a new game in the room.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/games",
    tag = "games",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("X-User-Identity" = String, Header, description = "Caller identity")
    ),
    responses(
        (status = 200, description = "Game hosted", body = GameView),
        (status = 409, description = "Another game is in progress", body = ErrorBody)
    )
)]
pub async fn host_game(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    session: Session,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(game_service::host_game(&state, &room_id, &session).await?))
}

/// Snapshot of one game.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/games/{game_id}",
    tag = "games",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("game_id" = String, Path, description = "Game code"),
        ("X-User-Identity" = String, Header, description = "Caller identity")
    ),
    responses(
        (status = 200, description = "Game snapshot", body = GameView),
        (status = 404, description = "Unknown room or game", body = ErrorBody)
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path((room_id, game_id)): Path<(String, String)>,
    session: Session,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(
        game_service::get_game(&state, &room_id, &game_id, &session).await?,
    ))
}

/// Apply to a waiting game.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/games/{game_id}/apply",
    tag = "games",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("game_id" = String, Path, description = "Game code"),
        ("X-User-Identity" = String, Header, description = "Caller identity")
    ),
    responses(
        (status = 200, description = "Applied", body = GameView),
        (status = 409, description = "Already applied", body = ErrorBody),
        (status = 410, description = "Game no longer accepts applicants", body = ErrorBody)
    )
)]
pub async fn apply_to_game(
    State(state): State<SharedState>,
    Path((room_id, game_id)): Path<(String, String)>,
    session: Session,
) -> Result<Json<GameView>, AppError> {
    Ok(Json(
        game_service::apply_to_game(&state, &room_id, &game_id, &session).await?,
    ))
}

/// Submit an action for the current round.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/games/{game_id}/actions",
    tag = "games",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("game_id" = String, Path, description = "Game code"),
        ("X-User-Identity" = String, Header, description = "Caller identity")
    ),
    request_body = SubmitActionRequest,
    responses(
        (status = 200, description = "Action recorded", body = SubmissionReceipt),
        (status = 403, description = "Not applying or eliminated", body = ErrorBody),
        (status = 409, description = "Already submitted this round", body = ErrorBody),
        (status = 410, description = "Round is over", body = ErrorBody)
    )
)]
pub async fn submit_action(
    State(state): State<SharedState>,
    Path((room_id, game_id)): Path<(String, String)>,
    session: Session,
    Json(payload): Json<SubmitActionRequest>,
) -> Result<Json<SubmissionReceipt>, AppError> {
    payload.validate()?;
    let receipt = game_service::submit_action(
        &state,
        &room_id,
        &game_id,
        &session,
        payload.action.into(),
    )
    .await?;
    Ok(Json(receipt))
}
