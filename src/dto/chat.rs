use serde::Serialize;
use utoipa::ToSchema;

use crate::state::chat::{Author, ChatMessage, SYSTEM_NAME};

/// Chat entry type as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChatKind {
    /// Plain message.
    Text,
    /// Game invitation.
    Game,
    /// Someone applied to a game.
    GameJoin,
    /// A game or round began.
    GameStart,
    /// A game ended.
    GameEnd,
    /// Private prompt to choose an action.
    GameBroadcast,
    /// Public game announcement.
    GameNotification,
}

/// Author class of a chat entry.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatSender {
    /// Posted by the server.
    System,
    /// Posted by a member.
    User,
}

/// One chat entry as seen by the requesting participant.
#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntryView {
    /// Kind of entry.
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// Author class.
    pub from: ChatSender,
    /// Display name of the author.
    pub name: String,
    /// Rendered text.
    pub message: String,
    /// Extra detail attached to game prompts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Game the entry refers to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl From<&ChatMessage> for ChatEntryView {
    fn from(message: &ChatMessage) -> Self {
        let (kind, created_at, description) = match message {
            ChatMessage::Text(entry) => (ChatKind::Text, entry.created_at, None),
            ChatMessage::GameInvite(notice) => (ChatKind::Game, notice.created_at, None),
            ChatMessage::GameJoin(notice) => (ChatKind::GameJoin, notice.created_at, None),
            ChatMessage::GameStart(notice) => (ChatKind::GameStart, notice.created_at, None),
            ChatMessage::GameEnd(notice) => (ChatKind::GameEnd, notice.created_at, None),
            ChatMessage::GameNotification(notice) => {
                (ChatKind::GameNotification, notice.created_at, None)
            }
            ChatMessage::GameBroadcast(notice) => (
                ChatKind::GameBroadcast,
                notice.created_at,
                notice.description.clone(),
            ),
        };
        let (from, name) = match message {
            ChatMessage::Text(entry) => match &entry.author {
                Author::User { name, .. } => (ChatSender::User, name.clone()),
                Author::System => (ChatSender::System, SYSTEM_NAME.to_owned()),
            },
            _ => (ChatSender::System, SYSTEM_NAME.to_owned()),
        };

        Self {
            kind,
            from,
            name,
            message: message.message().to_owned(),
            description,
            game_id: message.game_id().map(str::to_owned),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::game::Participant;

    #[test]
    fn user_text_serializes_with_wire_names() {
        let message = ChatMessage::user_text(&Participant::new("id-1", "Hana"), "hi", 7);
        let view = ChatEntryView::from(&message);

        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({
                "type": "text",
                "from": "user",
                "name": "Hana",
                "message": "hi",
                "createdAt": 7
            })
        );
    }
}
