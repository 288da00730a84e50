//! Appends chat entries to a room's log, optionally skipping ones already posted.

use tracing::debug;

use crate::{dao::room::RoomRepository, error::ServiceError, state::chat::ChatMessage};

/// Append `message` to the room's chat log and return its key.
pub async fn post(
    rooms: &RoomRepository,
    room_id: &str,
    message: ChatMessage,
) -> Result<String, ServiceError> {
    let key = rooms.append_chat(room_id, &message.into()).await?;
    Ok(key)
}

/// Append `message` unless the log already holds the same event.
///
/// Returns whether it was appended.
pub async fn post_once(
    rooms: &RoomRepository,
    room_id: &str,
    message: ChatMessage,
) -> Result<bool, ServiceError> {
    Ok(post_all_once(rooms, room_id, vec![message]).await? == 1)
}

/// Append every message whose event is not in the log yet, scanning the log once.
///
/// Returns how many were appended.
pub async fn post_all_once(
    rooms: &RoomRepository,
    room_id: &str,
    messages: Vec<ChatMessage>,
) -> Result<usize, ServiceError> {
    let mut seen = posted(rooms, room_id).await?;
    let mut appended = 0;

    for message in messages {
        if seen.iter().any(|existing| existing.is_same_event(&message)) {
            debug!(
                room_id,
                game_id = message.game_id(),
                kind = ?message.kind(),
                "skipping already posted notification"
            );
            continue;
        }
        post(rooms, room_id, message.clone()).await?;
        seen.push(message);
        appended += 1;
    }

    Ok(appended)
}

/// Chat log of the room as typed entries. Unreadable entries are skipped.
pub async fn posted(rooms: &RoomRepository, room_id: &str) -> Result<Vec<ChatMessage>, ServiceError> {
    let entries = rooms.load_chat(room_id).await?;
    Ok(entries
        .into_iter()
        .filter_map(|entity| match ChatMessage::try_from(entity) {
            Ok(message) => Some(message),
            Err(err) => {
                debug!(room_id, error = %err, "ignoring unreadable chat entry");
                None
            }
        })
        .collect())
}
