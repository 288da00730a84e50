use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::state_machine::{ApplyError, InvalidTransition},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Caller did not identify itself.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// No room under that id.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// No game under that id in the room.
    #[error("game `{0}` not found")]
    GameNotFound(String),
    /// Outside the game's or round's valid time window.
    #[error("game `{0}` is no longer accepting this action")]
    GameExpired(String),
    /// The caller is already an applicant.
    #[error("already applied to game `{0}`")]
    AlreadyApplied(String),
    /// The caller already chose an action this round.
    #[error("already submitted an action for round {round} of game `{game_id}`")]
    AlreadySubmitted {
        /// Game of the round.
        game_id: String,
        /// Round already answered.
        round: u32,
    },
    /// Another online member uses the display name.
    #[error("name `{0}` is already used by someone online")]
    NameTaken(String),
    /// The caller never joined the room.
    #[error("not a member of room `{0}`")]
    NotMember(String),
    /// The caller is not an applicant of the game.
    #[error("not applying to game `{0}`")]
    NotApplicant(String),
    /// The caller surrendered and is out of the game.
    #[error("eliminated from game `{0}`")]
    Eliminated(String),
    /// Another game is still waiting or playing in the room.
    #[error("game `{0}` is still in progress")]
    GameInProgress(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ApplyError> for ServiceError {
    fn from(err: ApplyError) -> Self {
        ServiceError::InvalidState(format!("state changed during transition: {err}"))
    }
}

impl ServiceError {
    /// Rejections caused by the caller rather than by the server.
    pub fn is_user_rejection(&self) -> bool {
        !matches!(
            self,
            ServiceError::Unavailable(_) | ServiceError::Degraded | ServiceError::InvalidState(_)
        )
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest {
            code: "invalid_input",
            message: format!("validation failed: {}", err),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {message}")]
    BadRequest {
        /// Machine readable error kind.
        code: &'static str,
        /// Human readable description.
        message: String,
    },
    /// Missing caller identity.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Machine readable error kind.
        code: &'static str,
        /// Human readable description.
        message: String,
    },
    /// Caller is identified but not allowed.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Machine readable error kind.
        code: &'static str,
        /// Human readable description.
        message: String,
    },
    /// Requested resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Machine readable error kind.
        code: &'static str,
        /// Human readable description.
        message: String,
    },
    /// Conflict with current state.
    #[error("conflict: {message}")]
    Conflict {
        /// Machine readable error kind.
        code: &'static str,
        /// Human readable description.
        message: String,
    },
    /// Request arrived outside the allowed time window.
    #[error("gone: {message}")]
    Gone {
        /// Machine readable error kind.
        code: &'static str,
        /// Human readable description.
        message: String,
    },
    /// Service unavailable or degraded.
    #[error("service unavailable: {message}")]
    ServiceUnavailable {
        /// Machine readable error kind.
        code: &'static str,
        /// Human readable description.
        message: String,
    },
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Gone { code, .. }
            | AppError::ServiceUnavailable { code, .. } => *code,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Gone { .. } => StatusCode::GONE,
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code: "unauthorized",
            message: message.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        if err.is_user_rejection() {
            debug!(error = %err, "request rejected");
        } else {
            warn!(error = %err, "request failed");
        }

        let message = err.to_string();
        match err {
            ServiceError::Unavailable(_) => AppError::ServiceUnavailable {
                code: "storage_unavailable",
                message,
            },
            ServiceError::Degraded => AppError::ServiceUnavailable {
                code: "degraded",
                message,
            },
            ServiceError::Unauthorized(_) => AppError::unauthorized(message),
            ServiceError::InvalidInput(_) => AppError::BadRequest {
                code: "invalid_input",
                message,
            },
            ServiceError::InvalidState(_) => AppError::Conflict {
                code: "invalid_state",
                message,
            },
            ServiceError::RoomNotFound(_) => AppError::NotFound {
                code: "room_not_found",
                message,
            },
            ServiceError::GameNotFound(_) => AppError::NotFound {
                code: "game_not_found",
                message,
            },
            ServiceError::GameExpired(_) => AppError::Gone {
                code: "game_expired",
                message,
            },
            ServiceError::AlreadyApplied(_) => AppError::Conflict {
                code: "already_applied",
                message,
            },
            ServiceError::AlreadySubmitted { .. } => AppError::Conflict {
                code: "already_submitted",
                message,
            },
            ServiceError::NameTaken(_) => AppError::Conflict {
                code: "name_taken",
                message,
            },
            ServiceError::NotMember(_) => AppError::Forbidden {
                code: "not_member",
                message,
            },
            ServiceError::NotApplicant(_) => AppError::Forbidden {
                code: "not_applicant",
                message,
            },
            ServiceError::Eliminated(_) => AppError::Forbidden {
                code: "eliminated",
                message,
            },
            ServiceError::GameInProgress(_) => AppError::Conflict {
                code: "game_in_progress",
                message,
            },
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine readable error kind, e.g. `game_expired`.
    pub code: String,
    /// Human readable description.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_codes_and_statuses() {
        let cases = [
            (
                ServiceError::RoomNotFound("r1".into()),
                StatusCode::NOT_FOUND,
                "room_not_found",
            ),
            (
                ServiceError::GameExpired("g1".into()),
                StatusCode::GONE,
                "game_expired",
            ),
            (
                ServiceError::AlreadySubmitted {
                    game_id: "g1".into(),
                    round: 2,
                },
                StatusCode::CONFLICT,
                "already_submitted",
            ),
            (
                ServiceError::NotMember("r1".into()),
                StatusCode::FORBIDDEN,
                "not_member",
            ),
            (
                ServiceError::Degraded,
                StatusCode::SERVICE_UNAVAILABLE,
                "degraded",
            ),
        ];

        for (err, status, code) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status(), status);
            assert_eq!(app.code(), code);
        }
    }

    #[test]
    fn only_server_side_failures_are_not_user_rejections() {
        assert!(ServiceError::AlreadyApplied("g".into()).is_user_rejection());
        assert!(!ServiceError::Degraded.is_user_rejection());
    }
}
