//! Wire shapes of everything stored under `rooms/{roomId}`.
//!
//! Field names are camelCase so documents written by older clients stay readable.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Numeric code outside the range of a wire enum.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    /// Name of the wire enum.
    pub kind: &'static str,
    /// Rejected code.
    pub code: u8,
}

/// Lifecycle status of a game, stored as `0 | 1 | 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GameStatus {
    /// Accepting applicants.
    Waiting,
    /// Rounds in progress.
    Playing,
    /// Finished or expired.
    End,
}

impl TryFrom<u8> for GameStatus {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Waiting),
            1 => Ok(Self::Playing),
            2 => Ok(Self::End),
            code => Err(UnknownCode {
                kind: "game status",
                code,
            }),
        }
    }
}

impl From<GameStatus> for u8 {
    fn from(status: GameStatus) -> Self {
        match status {
            GameStatus::Waiting => 0,
            GameStatus::Playing => 1,
            GameStatus::End => 2,
        }
    }
}

/// Kind of game hosted in a room. Only one exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum GameType {
    /// The elimination game played in rooms.
    #[default]
    PaperScissorsStone,
}

impl TryFrom<u8> for GameType {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::PaperScissorsStone),
            code => Err(UnknownCode {
                kind: "game type",
                code,
            }),
        }
    }
}

impl From<GameType> for u8 {
    fn from(_: GameType) -> Self {
        0
    }
}

/// Discriminant of a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChatType {
    /// Plain message from a member or the system.
    Text,
    /// Invitation to a freshly hosted game.
    Game,
    /// Someone applied to a game.
    GameJoin,
    /// A game or one of its rounds began.
    GameStart,
    /// A game ended.
    GameEnd,
    /// Private prompt addressed to one participant.
    GameBroadcast,
    /// Public announcement about a running game.
    GameNotification,
}

impl TryFrom<u8> for ChatType {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Text,
            1 => Self::Game,
            2 => Self::GameJoin,
            3 => Self::GameStart,
            4 => Self::GameEnd,
            5 => Self::GameBroadcast,
            6 => Self::GameNotification,
            code => {
                return Err(UnknownCode {
                    kind: "chat type",
                    code,
                });
            }
        })
    }
}

impl From<ChatType> for u8 {
    fn from(kind: ChatType) -> Self {
        match kind {
            ChatType::Text => 0,
            ChatType::Game => 1,
            ChatType::GameJoin => 2,
            ChatType::GameStart => 3,
            ChatType::GameEnd => 4,
            ChatType::GameBroadcast => 5,
            ChatType::GameNotification => 6,
        }
    }
}

/// Author class of a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChatFrom {
    /// Posted by the server.
    System,
    /// Posted by a member.
    User,
}

impl TryFrom<u8> for ChatFrom {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::System),
            1 => Ok(Self::User),
            code => Err(UnknownCode {
                kind: "chat author",
                code,
            }),
        }
    }
}

impl From<ChatFrom> for u8 {
    fn from(from: ChatFrom) -> Self {
        match from {
            ChatFrom::System => 0,
            ChatFrom::User => 1,
        }
    }
}

/// Room container persisted at `rooms/{roomId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomEntity {
    /// Short code identifying the room.
    pub room_id: String,
    /// Code shared to invite others; equal to the room id.
    pub invite_code: String,
    /// Creation time in epoch milliseconds.
    #[serde(alias = "createAt")]
    pub created_at: i64,
    /// Number of members currently online.
    #[serde(default)]
    pub online_count: u32,
    /// Members in join order.
    #[serde(default, deserialize_with = "list_or_map")]
    pub user_list: Vec<UserEntity>,
    /// Chat log, oldest first.
    #[serde(default, deserialize_with = "list_or_map")]
    pub chat_list: Vec<ChatMessageEntity>,
    /// Games in hosting order.
    #[serde(default, deserialize_with = "list_or_map")]
    pub game_list: Vec<GameEntity>,
}

/// Room member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Opaque token stable across reconnects.
    pub identity: String,
    /// Display name.
    pub name: String,
    /// Whether the member is currently in the room.
    pub online: bool,
}

/// Reference to a participant as embedded in games and chat entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRefEntity {
    /// Identity of the referenced member.
    pub identity: String,
    /// Display name at the time of reference.
    pub name: String,
}

/// Entry of a game's applicant list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicantEntity {
    /// Identity of the applicant.
    pub identity: String,
    /// Display name of the applicant.
    pub name: String,
    /// Eliminated by surrendering.
    #[serde(rename = "fallInBattle", default)]
    pub fallen: bool,
}

/// One play-through persisted at `rooms/{roomId}/gameList/{idx}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameEntity {
    /// Identifier unique within the room.
    pub game_id: String,
    /// Kind of game.
    #[serde(rename = "type", default)]
    pub game_type: GameType,
    /// Creation time in epoch milliseconds.
    #[serde(alias = "createAt")]
    pub created_at: i64,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Applicants in application order; the host comes first.
    #[serde(default, deserialize_with = "list_or_map")]
    pub apply_user_list: Vec<ApplicantEntity>,
    /// Last survivor once the game ended.
    #[serde(default)]
    pub winner: Option<UserRefEntity>,
    /// Current round number; 0 until the game starts.
    #[serde(default)]
    pub round: u32,
    /// Rounds played so far.
    #[serde(default, deserialize_with = "list_or_map")]
    pub round_list: Vec<RoundEntity>,
    /// Member who hosted the game.
    pub host: UserRefEntity,
}

/// One simultaneous-choice cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundEntity {
    /// Round number, starting at 1.
    pub round: u32,
    /// Creation time in epoch milliseconds.
    #[serde(alias = "createAt")]
    pub created_at: i64,
    /// Submissions keyed by participant identity.
    #[serde(default)]
    pub round_detail: IndexMap<String, RoundEntryEntity>,
}

/// A submitted action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundEntryEntity {
    /// Participant who submitted.
    pub user: UserRefEntity,
    /// `{"action": <code>, "actionText": "<label>"}` encoded as a string.
    pub action_json: String,
}

/// Flat chat log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageEntity {
    /// Kind of entry.
    #[serde(rename = "type")]
    pub kind: ChatType,
    /// Author class.
    pub from: ChatFrom,
    /// Recipient of a private entry; everyone sees it when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<UserRefEntity>,
    /// Display name of the author.
    pub name: String,
    /// Rendered text.
    pub message: String,
    /// Extra detail shown with game prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Identity of the author for member entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_identity: Option<String>,
    /// Game the entry refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

/// Accept a list stored either as an array or as an object keyed by push ids.
fn list_or_map<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListShape<T> {
        List(Vec<T>),
        Map(IndexMap<String, T>),
    }

    Ok(match Option::<ListShape<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ListShape::List(items)) => items,
        Some(ListShape::Map(entries)) => entries.into_values().collect(),
    })
}
