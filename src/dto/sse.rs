use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{chat::ChatEntryView, game::GameView, room::UserView};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name; unnamed events use `message`.
    pub event: Option<String>,
    /// Serialized JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Room the stream follows.
    pub room_id: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a room store.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// `users` event: membership changed.
pub struct UsersEvent {
    /// Members currently online.
    pub online_count: u32,
    /// Members in join order.
    pub users: Vec<UserView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// `chat` event: the chat log visible to the subscriber.
pub struct ChatEvent(pub Vec<ChatEntryView>);

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// `games` event: every game of the room.
pub struct GamesEvent(pub Vec<GameView>);
