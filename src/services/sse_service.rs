use std::{convert::Infallible, pin::pin, time::Duration};

use async_stream::stream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    dao::{
        path::StorePath,
        room::RoomRepository,
        room_store::SubscriptionEvent,
    },
    dto::{
        chat::ChatEntryView,
        game::GameView,
        sse::{ChatEvent, GamesEvent, Handshake, ServerEvent, UsersEvent},
    },
    error::ServiceError,
    services::{
        notifier,
        room_service::{require_member, user_view},
        scheduler,
    },
    state::{Session, SharedState, game::Game},
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Part of a room a client renders separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomTopic {
    /// Membership and online count.
    Users,
    /// Chat log.
    Chat,
    /// Game list.
    Games,
}

impl RoomTopic {
    /// Every topic, in the order a fresh subscriber receives them.
    pub const ALL: [RoomTopic; 3] = [RoomTopic::Users, RoomTopic::Chat, RoomTopic::Games];

    /// SSE event name.
    pub fn event_name(self) -> &'static str {
        match self {
            RoomTopic::Users => "users",
            RoomTopic::Chat => "chat",
            RoomTopic::Games => "games",
        }
    }

    /// Topics whose snapshot may differ after a write to `path`.
    pub fn touched_by(path: &StorePath) -> Vec<RoomTopic> {
        match path.within_room().first().map(String::as_str) {
            None => Self::ALL.to_vec(),
            Some("userList" | "onlineCount") => vec![RoomTopic::Users],
            Some("chatList") => vec![RoomTopic::Chat],
            Some("gameList") => vec![RoomTopic::Games],
            Some(_) => Vec::new(),
        }
    }
}

/// Stream snapshots of the room to a member, one event per topic whenever the
/// store reports a change below the room.
pub async fn room_stream(
    state: SharedState,
    room_id: String,
    session: Session,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServiceError> {
    let rooms = state.rooms().await?;
    require_member(&rooms, &room_id, &session).await?;
    scheduler::resume_room(&state, &room_id).await;

    let subscription = rooms.store().subscribe(StorePath::room(&room_id));
    let consider_window = state.config().game().consider_window;
    let degraded = state.is_degraded();
    info!(room_id = %room_id, "room SSE stream connected");

    let events = stream! {
        let handshake = Handshake {
            room_id: room_id.clone(),
            message: "room stream connected".into(),
            degraded,
        };
        if let Ok(event) = ServerEvent::json(Some("handshake".to_string()), &handshake) {
            yield Ok(to_event(event));
        }

        for topic in RoomTopic::ALL {
            if let Some(event) = snapshot(&rooms, &room_id, &session, topic, consider_window).await {
                yield Ok(event);
            }
        }

        let mut changes = pin!(subscription.into_stream());
        while let Some(change) = changes.next().await {
            let topics = match change {
                SubscriptionEvent::Changed(path) => RoomTopic::touched_by(&path),
                SubscriptionEvent::Lagged => RoomTopic::ALL.to_vec(),
            };
            for topic in topics {
                if let Some(event) = snapshot(&rooms, &room_id, &session, topic, consider_window).await {
                    yield Ok(event);
                }
            }
        }

        info!(room_id = %room_id, "room SSE stream closed");
    };

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}

/// Current snapshot of one topic as an SSE event. Read failures are logged and skipped.
async fn snapshot(
    rooms: &RoomRepository,
    room_id: &str,
    session: &Session,
    topic: RoomTopic,
    consider_window: Duration,
) -> Option<Event> {
    let payload = match topic {
        RoomTopic::Users => rooms.load_users(room_id).await.map_err(ServiceError::from).and_then(|users| {
            let online_count = users.iter().filter(|user| user.online).count() as u32;
            ServerEvent::json(
                Some(topic.event_name().to_string()),
                &UsersEvent {
                    online_count,
                    users: users.iter().map(user_view).collect(),
                },
            )
            .map_err(|err| ServiceError::InvalidState(err.to_string()))
        }),
        RoomTopic::Chat => notifier::posted(rooms, room_id).await.and_then(|messages| {
            let visible = messages
                .iter()
                .filter(|message| message.visible_to(Some(&session.identity)))
                .map(ChatEntryView::from)
                .collect();
            ServerEvent::json(Some(topic.event_name().to_string()), &ChatEvent(visible))
                .map_err(|err| ServiceError::InvalidState(err.to_string()))
        }),
        RoomTopic::Games => rooms.load_games(room_id).await.map_err(ServiceError::from).and_then(|games| {
            let views = games
                .into_iter()
                .map(|entity| GameView::new(&Game::from(entity), consider_window))
                .collect();
            ServerEvent::json(Some(topic.event_name().to_string()), &GamesEvent(views))
                .map_err(|err| ServiceError::InvalidState(err.to_string()))
        }),
    };

    match payload {
        Ok(event) => Some(to_event(event)),
        Err(err) => {
            warn!(room_id, topic = topic.event_name(), error = %err, "skipping room snapshot");
            None
        }
    }
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_map_to_the_topics_they_touch() {
        assert_eq!(
            RoomTopic::touched_by(&StorePath::online_count("r1")),
            vec![RoomTopic::Users]
        );
        assert_eq!(
            RoomTopic::touched_by(&StorePath::round_detail("r1", 0, 1).child("id")),
            vec![RoomTopic::Games]
        );
        assert_eq!(RoomTopic::touched_by(&StorePath::room("r1")), RoomTopic::ALL.to_vec());
    }
}
