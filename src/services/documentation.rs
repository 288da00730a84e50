use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the room and game API.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::leave_room,
        crate::routes::rooms::post_message,
        crate::routes::games::host_game,
        crate::routes::games::get_game,
        crate::routes::games::apply_to_game,
        crate::routes::games::submit_action,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::PostMessageRequest,
            crate::dto::room::RoomTicket,
            crate::dto::room::JoinOutcome,
            crate::dto::room::RoomSnapshot,
            crate::dto::room::UserView,
            crate::dto::chat::ChatEntryView,
            crate::dto::chat::ChatKind,
            crate::dto::chat::ChatSender,
            crate::dto::game::ActionChoice,
            crate::dto::game::SubmitActionRequest,
            crate::dto::game::SubmissionReceipt,
            crate::dto::game::GameView,
            crate::dto::game::ApplicantView,
            crate::dto::game::RoundView,
            crate::dto::game::RoundEntryView,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::sse::Handshake,
            crate::dto::sse::UsersEvent,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room membership and chat"),
        (name = "games", description = "Game lifecycle and round actions"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
