use rand::{Rng, distr::Alphanumeric, rng};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        models::{RoomEntity, UserEntity},
        room::RoomRepository,
    },
    dto::{
        chat::ChatEntryView,
        game::GameView,
        room::{JoinOutcome, RoomSnapshot, RoomTicket, UserView},
        validation::{validate_display_name, validate_message},
    },
    error::ServiceError,
    services::{notifier, scheduler},
    state::{
        Session, SharedState,
        chat::ChatMessage,
        game::{Game, Participant, now_ms},
        notices,
    },
};

const ROOM_CODE_LENGTH: usize = 5;
const MAX_CODE_ATTEMPTS: usize = 32;

/// Open a room owned by `name`, minting an identity when the caller has none.
pub async fn create_room(
    state: &SharedState,
    name: &str,
    session: Option<Session>,
) -> Result<RoomTicket, ServiceError> {
    let name = checked_name(name)?;
    let rooms = state.rooms().await?;
    let identity = session.map_or_else(mint_identity, |session| session.identity);

    for _ in 0..MAX_CODE_ATTEMPTS {
        let room_id = random_code(ROOM_CODE_LENGTH);
        if rooms.exists(&room_id).await? {
            debug!(room_id = %room_id, "room code already taken; drawing another");
            continue;
        }
        let authority = state.authority(&room_id);
        let attempt = authority
            .exclusive(|| async {
                if rooms.exists(&room_id).await? {
                    return Ok::<_, ServiceError>(false);
                }
                let now = now_ms();
                rooms
                    .create_room(&RoomEntity {
                        room_id: room_id.clone(),
                        invite_code: room_id.clone(),
                        created_at: now,
                        online_count: 1,
                        user_list: vec![UserEntity {
                            identity: identity.clone(),
                            name: name.clone(),
                            online: true,
                        }],
                        chat_list: vec![notices::room_created(&name, now).into()],
                        game_list: Vec::new(),
                    })
                    .await?;
                Ok(true)
            })
            .await;
        let created = match attempt {
            Ok(created) => created,
            Err(err) => {
                state.forget_authority(&room_id, authority);
                return Err(err);
            }
        };

        if created {
            // A fresh room has no games to resume.
            authority.claim_resume();
            info!(room_id = %room_id, "room created");
            return Ok(RoomTicket {
                invite_code: room_id.clone(),
                room_id,
                identity,
                name,
                outcome: JoinOutcome::Created,
            });
        }
        debug!(room_id = %room_id, "room code already taken; drawing another");
    }

    Err(ServiceError::InvalidState(
        "could not find a free room code".into(),
    ))
}

/// Enter a room, or come back to it under the same identity.
pub async fn join_room(
    state: &SharedState,
    room_id: &str,
    name: &str,
    session: Option<Session>,
) -> Result<RoomTicket, ServiceError> {
    let name = checked_name(name)?;
    let rooms = state.rooms().await?;
    let identity = session.map_or_else(mint_identity, |session| session.identity);

    let outcome = state
        .room_authority(&rooms, room_id)
        .await?
        .exclusive(|| async {
            ensure_room(&rooms, room_id).await?;
            let mut users = rooms.load_users(room_id).await?;

            let taken = users
                .iter()
                .any(|user| user.online && user.name == name && user.identity != identity);
            if taken {
                return Err(ServiceError::NameTaken(name.clone()));
            }

            let outcome = match users.iter_mut().find(|user| user.identity == identity) {
                Some(user) => {
                    let renamed = user.name != name;
                    user.name = name.clone();
                    user.online = true;
                    if renamed {
                        JoinOutcome::Renamed
                    } else {
                        JoinOutcome::Rejoined
                    }
                }
                None => {
                    users.push(UserEntity {
                        identity: identity.clone(),
                        name: name.clone(),
                        online: true,
                    });
                    JoinOutcome::Joined
                }
            };

            save_users(&rooms, room_id, &users).await?;
            if outcome != JoinOutcome::Rejoined {
                notifier::post(&rooms, room_id, notices::room_joined(&name, now_ms())).await?;
            }
            Ok(outcome)
        })
        .await?;

    info!(room_id, ?outcome, "member entered room");
    scheduler::resume_room(state, room_id).await;

    Ok(RoomTicket {
        room_id: room_id.to_owned(),
        invite_code: room_id.to_owned(),
        identity,
        name,
        outcome,
    })
}

/// Mark the caller offline. Leaving twice, or without being a member, does nothing.
pub async fn leave_room(
    state: &SharedState,
    room_id: &str,
    session: &Session,
) -> Result<(), ServiceError> {
    let rooms = state.rooms().await?;

    state
        .room_authority(&rooms, room_id)
        .await?
        .exclusive(|| async {
            ensure_room(&rooms, room_id).await?;
            let mut users = rooms.load_users(room_id).await?;
            let Some(user) = users
                .iter_mut()
                .find(|user| user.identity == session.identity && user.online)
            else {
                debug!(room_id, "leave ignored; caller not online in room");
                return Ok(());
            };
            user.online = false;
            let name = user.name.clone();

            save_users(&rooms, room_id, &users).await?;
            notifier::post(&rooms, room_id, notices::room_left(&name, now_ms())).await?;
            info!(room_id, "member left room");
            Ok(())
        })
        .await
}

/// Append a user chat message.
pub async fn post_message(
    state: &SharedState,
    room_id: &str,
    session: &Session,
    message: &str,
) -> Result<ChatEntryView, ServiceError> {
    validate_message(message).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let rooms = state.rooms().await?;

    state
        .room_authority(&rooms, room_id)
        .await?
        .exclusive(|| async {
            let author = require_member(&rooms, room_id, session).await?;
            let entry = ChatMessage::user_text(&author, message.trim(), now_ms());
            let view = ChatEntryView::from(&entry);
            notifier::post(&rooms, room_id, entry).await?;
            Ok(view)
        })
        .await
}

/// Snapshot of the room as the caller is allowed to see it.
pub async fn get_room(
    state: &SharedState,
    room_id: &str,
    session: &Session,
) -> Result<RoomSnapshot, ServiceError> {
    let rooms = state.rooms().await?;
    let Some(room) = rooms.load_room(room_id).await? else {
        return Err(ServiceError::RoomNotFound(room_id.to_owned()));
    };
    if !room
        .user_list
        .iter()
        .any(|user| user.identity == session.identity)
    {
        return Err(ServiceError::NotMember(room_id.to_owned()));
    }
    scheduler::resume_room(state, room_id).await;

    let consider_window = state.config().game().consider_window;
    let chat = room
        .chat_list
        .into_iter()
        .filter_map(|entity| ChatMessage::try_from(entity).ok())
        .filter(|message| message.visible_to(Some(&session.identity)))
        .map(|message| ChatEntryView::from(&message))
        .collect();

    Ok(RoomSnapshot {
        room_id: room.room_id,
        invite_code: room.invite_code,
        created_at: room.created_at,
        online_count: room.online_count,
        users: room.user_list.iter().map(user_view).collect(),
        chat,
        games: room
            .game_list
            .into_iter()
            .map(|entity| GameView::new(&Game::from(entity), consider_window))
            .collect(),
    })
}

/// Resolve the caller to a room member.
pub(crate) async fn require_member(
    rooms: &RoomRepository,
    room_id: &str,
    session: &Session,
) -> Result<Participant, ServiceError> {
    let users = rooms.load_users(room_id).await?;
    if let Some(user) = users.iter().find(|user| user.identity == session.identity) {
        return Ok(Participant::new(&user.identity, &user.name));
    }

    ensure_room(rooms, room_id).await?;
    Err(ServiceError::NotMember(room_id.to_owned()))
}

pub(crate) async fn ensure_room(rooms: &RoomRepository, room_id: &str) -> Result<(), ServiceError> {
    if rooms.exists(room_id).await? {
        Ok(())
    } else {
        Err(ServiceError::RoomNotFound(room_id.to_owned()))
    }
}

pub(crate) fn user_view(user: &UserEntity) -> UserView {
    UserView {
        name: user.name.clone(),
        online: user.online,
    }
}

/// Random alphanumeric code of `len` characters.
pub(crate) fn random_code(len: usize) -> String {
    rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

async fn save_users(
    rooms: &RoomRepository,
    room_id: &str,
    users: &[UserEntity],
) -> Result<(), ServiceError> {
    rooms.save_users(room_id, users).await?;
    let online = users.iter().filter(|user| user.online).count() as u32;
    rooms.save_online_count(room_id, online).await?;
    Ok(())
}

fn checked_name(name: &str) -> Result<String, ServiceError> {
    validate_display_name(name).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    Ok(name.trim().to_owned())
}

fn mint_identity() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::MemoryRoomStore,
        dto::chat::{ChatKind, ChatSender},
        state::AppState,
    };

    async fn state() -> SharedState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryRoomStore::in_memory())).await
    }

    fn texts(snapshot: &RoomSnapshot) -> Vec<&str> {
        snapshot
            .chat
            .iter()
            .filter(|entry| entry.kind == ChatKind::Text)
            .map(|entry| entry.message.as_str())
            .collect()
    }

    #[test]
    fn codes_are_alphanumeric_and_sized() {
        let code = random_code(ROOM_CODE_LENGTH);
        assert_eq!(code.len(), ROOM_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn names_are_trimmed_and_checked() {
        assert_eq!(checked_name(" Hana ").unwrap(), "Hana");
        assert!(matches!(
            checked_name("Al"),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn created_room_lists_its_owner() {
        let state = state().await;
        let ticket = create_room(&state, "Hana", None).await.unwrap();
        assert_eq!(ticket.outcome, JoinOutcome::Created);
        assert_eq!(ticket.invite_code, ticket.room_id);
        assert_eq!(ticket.room_id.len(), ROOM_CODE_LENGTH);

        let room = get_room(&state, &ticket.room_id, &Session::new(&ticket.identity))
            .await
            .unwrap();
        assert_eq!(room.online_count, 1);
        assert_eq!(
            room.users,
            vec![UserView {
                name: "Hana".into(),
                online: true
            }]
        );
        assert_eq!(texts(&room), vec!["Hana created the room."]);
    }

    #[tokio::test]
    async fn rejoin_is_quiet_and_rename_is_announced() {
        let state = state().await;
        let host = create_room(&state, "Hana", None).await.unwrap();
        let room_id = host.room_id.clone();
        let guest = join_room(&state, &room_id, "Bob", None).await.unwrap();
        assert_eq!(guest.outcome, JoinOutcome::Joined);

        let session = Some(Session::new(&guest.identity));
        let again = join_room(&state, &room_id, "Bob", session.clone()).await.unwrap();
        assert_eq!(again.outcome, JoinOutcome::Rejoined);
        assert_eq!(again.identity, guest.identity);

        let renamed = join_room(&state, &room_id, "Bobby", session).await.unwrap();
        assert_eq!(renamed.outcome, JoinOutcome::Renamed);

        let room = get_room(&state, &room_id, &Session::new(&host.identity))
            .await
            .unwrap();
        assert_eq!(room.users.len(), 2);
        assert_eq!(room.online_count, 2);
        assert_eq!(
            texts(&room),
            vec![
                "Hana created the room.",
                "Bob joined the room.",
                "Bobby joined the room."
            ]
        );
    }

    #[tokio::test]
    async fn online_name_cannot_be_reused() {
        let state = state().await;
        let host = create_room(&state, "Hana", None).await.unwrap();
        let taken = join_room(&state, &host.room_id, "Hana", None).await;
        assert!(matches!(taken, Err(ServiceError::NameTaken(_))));

        leave_room(&state, &host.room_id, &Session::new(&host.identity))
            .await
            .unwrap();
        let reused = join_room(&state, &host.room_id, "Hana", None).await.unwrap();
        assert_eq!(reused.outcome, JoinOutcome::Joined);
    }

    #[tokio::test]
    async fn leaving_twice_posts_one_notice() {
        let state = state().await;
        let host = create_room(&state, "Hana", None).await.unwrap();
        let guest = join_room(&state, &host.room_id, "Bob", None).await.unwrap();
        let session = Session::new(&guest.identity);

        leave_room(&state, &host.room_id, &session).await.unwrap();
        leave_room(&state, &host.room_id, &session).await.unwrap();
        leave_room(&state, &host.room_id, &Session::new("stranger")).await.unwrap();

        let room = get_room(&state, &host.room_id, &Session::new(&host.identity))
            .await
            .unwrap();
        assert_eq!(room.online_count, 1);
        assert_eq!(
            texts(&room).iter().filter(|text| **text == "Bob left the room.").count(),
            1
        );
    }

    #[tokio::test]
    async fn members_only_and_messages_checked() {
        let state = state().await;
        let host = create_room(&state, "Hana", None).await.unwrap();
        let session = Session::new(&host.identity);

        let stranger = get_room(&state, &host.room_id, &Session::new("stranger")).await;
        assert!(matches!(stranger, Err(ServiceError::NotMember(_))));
        let missing = get_room(&state, "nope0", &session).await;
        assert!(matches!(missing, Err(ServiceError::RoomNotFound(_))));

        let blank = post_message(&state, &host.room_id, &session, "   ").await;
        assert!(matches!(blank, Err(ServiceError::InvalidInput(_))));
        let outsider =
            post_message(&state, &host.room_id, &Session::new("stranger"), "hi").await;
        assert!(matches!(outsider, Err(ServiceError::NotMember(_))));

        let entry = post_message(&state, &host.room_id, &session, " hello ")
            .await
            .unwrap();
        assert_eq!(entry.from, ChatSender::User);
        assert_eq!(entry.name, "Hana");
        assert_eq!(entry.message, "hello");
    }

    #[tokio::test]
    async fn degraded_state_refuses_work() {
        let state = AppState::new(AppConfig::default());
        let result = create_room(&state, "Hana", None).await;
        assert!(matches!(result, Err(ServiceError::Degraded)));
    }

    #[tokio::test]
    async fn unknown_rooms_get_no_authority() {
        let state = state().await;
        let host = create_room(&state, "Hana", None).await.unwrap();
        assert_eq!(state.authority_count(), 1);

        let stranger = Session::new(&host.identity);
        for i in 0..50 {
            let room_id = format!("nope{i}");
            let joined = join_room(&state, &room_id, "Bob", None).await;
            assert!(matches!(joined, Err(ServiceError::RoomNotFound(_))));
            let left = leave_room(&state, &room_id, &stranger).await;
            assert!(matches!(left, Err(ServiceError::RoomNotFound(_))));
            let posted = post_message(&state, &room_id, &stranger, "hi").await;
            assert!(matches!(posted, Err(ServiceError::RoomNotFound(_))));
        }

        assert_eq!(state.authority_count(), 1);
    }
}
