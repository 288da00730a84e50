//! Chat log entries as a tagged union over [`ChatType`].

use crate::{
    dao::models::{ChatFrom, ChatMessageEntity, ChatType, UserRefEntity},
    state::game::Participant,
};

/// Display name used for system-authored entries.
pub const SYSTEM_NAME: &str = "System";

/// Who wrote a text entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    /// The server.
    System,
    /// A room member.
    User {
        /// Identity of the member.
        identity: String,
        /// Display name when posting.
        name: String,
    },
}

/// Plain chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    /// Writer of the line.
    pub author: Author,
    /// Text as written.
    pub message: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// System announcement tied to one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameNotice {
    /// Game announced.
    pub game_id: String,
    /// Rendered announcement.
    pub message: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// System announcement addressed to a single participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateNotice {
    /// Game the prompt belongs to.
    pub game_id: String,
    /// Only participant who sees the entry.
    pub to: Participant,
    /// Rendered prompt.
    pub message: String,
    /// Extra detail shown with the prompt.
    pub description: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// One entry of a room's chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    /// Member or system message.
    Text(TextEntry),
    /// Invitation to join a freshly hosted game.
    GameInvite(GameNotice),
    /// Someone applied to a game.
    GameJoin(GameNotice),
    /// A game or one of its rounds began.
    GameStart(GameNotice),
    /// A game ended.
    GameEnd(GameNotice),
    /// Per-survivor prompt to choose an action.
    GameBroadcast(PrivateNotice),
    /// Mid-game summary such as a tie.
    GameNotification(GameNotice),
}

impl ChatMessage {
    /// Text posted by the server.
    pub fn system_text(message: impl Into<String>, created_at: i64) -> Self {
        ChatMessage::Text(TextEntry {
            author: Author::System,
            message: message.into(),
            created_at,
        })
    }

    /// Text posted by a member.
    pub fn user_text(author: &Participant, message: impl Into<String>, created_at: i64) -> Self {
        ChatMessage::Text(TextEntry {
            author: Author::User {
                identity: author.identity.clone(),
                name: author.name.clone(),
            },
            message: message.into(),
            created_at,
        })
    }

    /// Stored discriminant of the entry.
    pub fn kind(&self) -> ChatType {
        match self {
            ChatMessage::Text(_) => ChatType::Text,
            ChatMessage::GameInvite(_) => ChatType::Game,
            ChatMessage::GameJoin(_) => ChatType::GameJoin,
            ChatMessage::GameStart(_) => ChatType::GameStart,
            ChatMessage::GameEnd(_) => ChatType::GameEnd,
            ChatMessage::GameBroadcast(_) => ChatType::GameBroadcast,
            ChatMessage::GameNotification(_) => ChatType::GameNotification,
        }
    }

    /// Rendered text.
    pub fn message(&self) -> &str {
        match self {
            ChatMessage::Text(entry) => &entry.message,
            ChatMessage::GameBroadcast(notice) => &notice.message,
            ChatMessage::GameInvite(notice)
            | ChatMessage::GameJoin(notice)
            | ChatMessage::GameStart(notice)
            | ChatMessage::GameEnd(notice)
            | ChatMessage::GameNotification(notice) => &notice.message,
        }
    }

    /// Game the entry refers to.
    pub fn game_id(&self) -> Option<&str> {
        match self {
            ChatMessage::Text(_) => None,
            ChatMessage::GameBroadcast(notice) => Some(&notice.game_id),
            ChatMessage::GameInvite(notice)
            | ChatMessage::GameJoin(notice)
            | ChatMessage::GameStart(notice)
            | ChatMessage::GameEnd(notice)
            | ChatMessage::GameNotification(notice) => Some(&notice.game_id),
        }
    }

    /// Identity of the only participant allowed to see this entry.
    pub fn recipient(&self) -> Option<&str> {
        match self {
            ChatMessage::GameBroadcast(notice) => Some(&notice.to.identity),
            _ => None,
        }
    }

    /// Whether `viewer` may see this entry. Anonymous viewers only see public entries.
    pub fn visible_to(&self, viewer: Option<&str>) -> bool {
        match self.recipient() {
            None => true,
            Some(recipient) => viewer == Some(recipient),
        }
    }

    /// Same logical event: game, type, text and recipient all match.
    pub fn is_same_event(&self, other: &ChatMessage) -> bool {
        self.game_id() == other.game_id()
            && self.kind() == other.kind()
            && self.message() == other.message()
            && self.recipient() == other.recipient()
    }
}

/// Stored entry that cannot be represented as a [`ChatMessage`].
#[derive(Debug, thiserror::Error)]
#[error("{kind:?} chat entry without a game id")]
pub struct MissingGameId {
    /// Type of the offending entry.
    pub kind: ChatType,
}

impl From<ChatMessage> for ChatMessageEntity {
    fn from(message: ChatMessage) -> Self {
        let kind = message.kind();
        match message {
            ChatMessage::Text(entry) => {
                let (from, name, user_identity) = match entry.author {
                    Author::System => (ChatFrom::System, SYSTEM_NAME.to_owned(), None),
                    Author::User { identity, name } => (ChatFrom::User, name, Some(identity)),
                };
                ChatMessageEntity {
                    kind,
                    from,
                    to: None,
                    name,
                    message: entry.message,
                    description: None,
                    created_at: entry.created_at,
                    user_identity,
                    game_id: None,
                }
            }
            ChatMessage::GameBroadcast(notice) => ChatMessageEntity {
                kind,
                from: ChatFrom::System,
                to: Some(UserRefEntity::from(notice.to)),
                name: SYSTEM_NAME.to_owned(),
                message: notice.message,
                description: notice.description,
                created_at: notice.created_at,
                user_identity: None,
                game_id: Some(notice.game_id),
            },
            ChatMessage::GameInvite(notice)
            | ChatMessage::GameJoin(notice)
            | ChatMessage::GameStart(notice)
            | ChatMessage::GameEnd(notice)
            | ChatMessage::GameNotification(notice) => ChatMessageEntity {
                kind,
                from: ChatFrom::System,
                to: None,
                name: SYSTEM_NAME.to_owned(),
                message: notice.message,
                description: None,
                created_at: notice.created_at,
                user_identity: None,
                game_id: Some(notice.game_id),
            },
        }
    }
}

impl TryFrom<ChatMessageEntity> for ChatMessage {
    type Error = MissingGameId;

    fn try_from(entity: ChatMessageEntity) -> Result<Self, Self::Error> {
        if entity.kind == ChatType::Text {
            let author = match (entity.from, entity.user_identity) {
                (ChatFrom::User, Some(identity)) => Author::User {
                    identity,
                    name: entity.name,
                },
                _ => Author::System,
            };
            return Ok(ChatMessage::Text(TextEntry {
                author,
                message: entity.message,
                created_at: entity.created_at,
            }));
        }

        let game_id = entity
            .game_id
            .ok_or(MissingGameId { kind: entity.kind })?;

        let notice = GameNotice {
            game_id,
            message: entity.message,
            created_at: entity.created_at,
        };

        Ok(match entity.kind {
            ChatType::Game => ChatMessage::GameInvite(notice),
            ChatType::GameJoin => ChatMessage::GameJoin(notice),
            ChatType::GameStart => ChatMessage::GameStart(notice),
            ChatType::GameEnd => ChatMessage::GameEnd(notice),
            ChatType::GameNotification => ChatMessage::GameNotification(notice),
            ChatType::GameBroadcast | ChatType::Text => match entity.to {
                Some(to) => ChatMessage::GameBroadcast(PrivateNotice {
                    game_id: notice.game_id,
                    to: to.into(),
                    message: notice.message,
                    description: entity.description,
                    created_at: notice.created_at,
                }),
                // A broadcast without recipient is shown to everyone.
                None => ChatMessage::GameNotification(notice),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(to: &str, message: &str) -> ChatMessage {
        ChatMessage::GameBroadcast(PrivateNotice {
            game_id: "g1".into(),
            to: Participant::new(to, to),
            message: message.into(),
            description: None,
            created_at: 1,
        })
    }

    #[test]
    fn private_prompts_are_only_visible_to_their_recipient() {
        let entry = prompt("ann", "your turn");
        assert!(entry.visible_to(Some("ann")));
        assert!(!entry.visible_to(Some("bob")));
        assert!(!entry.visible_to(None));
        assert!(ChatMessage::system_text("hi", 1).visible_to(None));
    }

    #[test]
    fn same_event_ignores_timestamps_but_not_recipients() {
        let first = prompt("ann", "your turn");
        let mut later = prompt("ann", "your turn");
        if let ChatMessage::GameBroadcast(notice) = &mut later {
            notice.created_at = 99;
        }
        assert!(first.is_same_event(&later));
        assert!(!first.is_same_event(&prompt("bob", "your turn")));
    }

    #[test]
    fn user_text_round_trips_through_the_flat_shape() {
        let message = ChatMessage::user_text(&Participant::new("id1", "Ann"), "hello", 7);
        let entity = ChatMessageEntity::from(message.clone());

        assert_eq!(entity.from, ChatFrom::User);
        assert_eq!(entity.user_identity.as_deref(), Some("id1"));
        assert_eq!(ChatMessage::try_from(entity).unwrap(), message);
    }

    #[test]
    fn game_entries_require_a_game_id() {
        let entity = ChatMessageEntity {
            kind: ChatType::GameEnd,
            from: ChatFrom::System,
            to: None,
            name: SYSTEM_NAME.into(),
            message: "over".into(),
            description: None,
            created_at: 1,
            user_identity: None,
            game_id: None,
        };
        assert!(ChatMessage::try_from(entity).is_err());
    }
}
