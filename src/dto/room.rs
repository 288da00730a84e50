use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::{
    chat::ChatEntryView,
    game::GameView,
    validation::{validate_display_name, validate_message},
};

/// Payload used to open a new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Display name of the creator.
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
}

/// Payload used to enter an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Display name to use in the room; renames a returning member.
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
}

/// Payload of a user chat message.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PostMessageRequest {
    /// Message text.
    #[validate(custom(function = "validate_message"))]
    pub message: String,
}

/// How a caller ended up in a room.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    /// Opened the room.
    Created,
    /// First visit.
    Joined,
    /// Came back under the same name.
    Rejoined,
    /// Came back under a new name.
    Renamed,
}

/// Credentials returned when entering a room. `identity` must be sent back in
/// the `X-User-Identity` header.
#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomTicket {
    /// Room entered.
    pub room_id: String,
    /// Share this code to invite others; equal to the room id.
    pub invite_code: String,
    /// Opaque caller identity.
    pub identity: String,
    /// Display name in the room.
    pub name: String,
    /// How the caller entered.
    pub outcome: JoinOutcome,
}

/// Room member as shown to other members.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct UserView {
    /// Display name.
    pub name: String,
    /// Whether the member is currently in the room.
    pub online: bool,
}

/// Full room snapshot filtered for the requesting participant.
#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Room code.
    pub room_id: String,
    /// Code to share with invitees.
    pub invite_code: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Members currently online.
    pub online_count: u32,
    /// Members in join order.
    pub users: Vec<UserView>,
    /// Chat entries visible to the caller.
    pub chat: Vec<ChatEntryView>,
    /// Games in hosting order.
    pub games: Vec<GameView>,
}
