//! Typed access to the parts of a room the services read and write.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::dao::{
    models::{ChatMessageEntity, GameEntity, RoomEntity, RoundEntryEntity, UserEntity},
    path::StorePath,
    room_store::RoomStore,
    storage::{StorageError, StorageResult},
};

/// Repository over a [`RoomStore`] speaking room entities instead of JSON.
#[derive(Clone)]
pub struct RoomRepository {
    store: Arc<dyn RoomStore>,
}

impl RoomRepository {
    /// Wrap a store handle.
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }

    /// Underlying store, for subscriptions.
    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    /// Whether a room exists under `room_id`.
    pub async fn exists(&self, room_id: &str) -> StorageResult<bool> {
        Ok(self
            .store
            .get(StorePath::room(room_id).child("roomId"))
            .await?
            .is_some())
    }

    /// Read the whole room, if present.
    pub async fn load_room(&self, room_id: &str) -> StorageResult<Option<RoomEntity>> {
        self.read(StorePath::room(room_id)).await
    }

    /// Write a new room document.
    pub async fn create_room(&self, room: &RoomEntity) -> StorageResult<()> {
        self.write(StorePath::room(&room.room_id), room).await
    }

    /// Members of a room, empty when none are stored.
    pub async fn load_users(&self, room_id: &str) -> StorageResult<Vec<UserEntity>> {
        self.read_list(StorePath::user_list(room_id)).await
    }

    /// Replace the member list.
    pub async fn save_users(&self, room_id: &str, users: &[UserEntity]) -> StorageResult<()> {
        self.write(StorePath::user_list(room_id), users).await
    }

    /// Store the online member counter.
    pub async fn save_online_count(&self, room_id: &str, count: u32) -> StorageResult<()> {
        self.write(StorePath::online_count(room_id), &count).await
    }

    /// Chat log in append order.
    pub async fn load_chat(&self, room_id: &str) -> StorageResult<Vec<ChatMessageEntity>> {
        self.read_list(StorePath::chat_list(room_id)).await
    }

    /// Append to the chat log, returning the key of the new entry.
    pub async fn append_chat(
        &self,
        room_id: &str,
        message: &ChatMessageEntity,
    ) -> StorageResult<String> {
        let path = StorePath::chat_list(room_id);
        let value = encode(&path, message)?;
        self.store.append(path, value).await
    }

    /// Games in hosting order.
    pub async fn load_games(&self, room_id: &str) -> StorageResult<Vec<GameEntity>> {
        self.read_list(StorePath::game_list(room_id)).await
    }

    /// Overwrite the game at `index` without touching its siblings.
    pub async fn save_game(
        &self,
        room_id: &str,
        index: usize,
        game: &GameEntity,
    ) -> StorageResult<()> {
        self.write(StorePath::game(room_id, index), game).await
    }

    /// Append a new game and return its position in the list.
    pub async fn append_game(&self, room_id: &str, game: &GameEntity) -> StorageResult<usize> {
        let path = StorePath::game_list(room_id);
        let value = encode(&path, game)?;
        let key = self.store.append(path.clone(), value).await?;
        key.parse().map_err(|_| StorageError::UnsupportedPath { path })
    }

    /// Record one participant's submission for a round.
    pub async fn put_round_entry(
        &self,
        room_id: &str,
        game_index: usize,
        round_index: usize,
        identity: &str,
        entry: &RoundEntryEntity,
    ) -> StorageResult<()> {
        let path = StorePath::round_detail(room_id, game_index, round_index).child(identity);
        self.write(path, entry).await
    }

    async fn read<T: DeserializeOwned>(&self, path: StorePath) -> StorageResult<Option<T>> {
        match self.store.get(path.clone()).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(&path, value).map(Some),
        }
    }

    async fn read_list<T: DeserializeOwned>(&self, path: StorePath) -> StorageResult<Vec<T>> {
        match self.store.get(path.clone()).await? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Object(entries)) => entries
                .into_iter()
                .map(|(_, value)| decode(&path, value))
                .collect(),
            Some(value) => decode(&path, value),
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, path: StorePath, value: &T) -> StorageResult<()> {
        let value = encode(&path, value)?;
        self.store.set(path, value).await
    }
}

fn decode<T: DeserializeOwned>(path: &StorePath, value: Value) -> StorageResult<T> {
    serde_json::from_value(value).map_err(|source| StorageError::Malformed {
        path: path.clone(),
        source,
    })
}

fn encode<T: Serialize + ?Sized>(path: &StorePath, value: &T) -> StorageResult<Value> {
    serde_json::to_value(value).map_err(|source| StorageError::Malformed {
        path: path.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        models::{ApplicantEntity, GameStatus, GameType, UserRefEntity},
        room_store::memory::MemoryRoomStore,
    };

    fn repository() -> RoomRepository {
        RoomRepository::new(Arc::new(MemoryRoomStore::in_memory()))
    }

    fn room(room_id: &str) -> RoomEntity {
        RoomEntity {
            room_id: room_id.into(),
            invite_code: room_id.into(),
            created_at: 1,
            online_count: 1,
            user_list: vec![UserEntity {
                identity: "a".into(),
                name: "Ann".into(),
                online: true,
            }],
            chat_list: Vec::new(),
            game_list: Vec::new(),
        }
    }

    fn game(game_id: &str) -> GameEntity {
        let host = UserRefEntity {
            identity: "a".into(),
            name: "Ann".into(),
        };
        GameEntity {
            game_id: game_id.into(),
            game_type: GameType::PaperScissorsStone,
            created_at: 1,
            status: GameStatus::Waiting,
            apply_user_list: vec![ApplicantEntity {
                identity: host.identity.clone(),
                name: host.name.clone(),
                fallen: false,
            }],
            winner: None,
            round: 0,
            round_list: Vec::new(),
            host,
        }
    }

    #[tokio::test]
    async fn created_room_round_trips_through_the_store() {
        let repo = repository();
        assert!(!repo.exists("r1").await.unwrap());

        repo.create_room(&room("r1")).await.unwrap();

        assert!(repo.exists("r1").await.unwrap());
        assert_eq!(repo.load_room("r1").await.unwrap(), Some(room("r1")));
        assert_eq!(repo.load_users("r1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn games_are_appended_in_order_and_saved_by_index() {
        let repo = repository();
        repo.create_room(&room("r1")).await.unwrap();

        assert_eq!(repo.append_game("r1", &game("g1")).await.unwrap(), 0);
        assert_eq!(repo.append_game("r1", &game("g2")).await.unwrap(), 1);

        let mut second = game("g2");
        second.status = GameStatus::End;
        repo.save_game("r1", 1, &second).await.unwrap();

        let games = repo.load_games("r1").await.unwrap();
        assert_eq!(games[0].status, GameStatus::Waiting);
        assert_eq!(games[1].status, GameStatus::End);
    }

    #[tokio::test]
    async fn round_entries_land_under_the_identity_key() {
        let repo = repository();
        repo.create_room(&room("r1")).await.unwrap();
        let mut started = game("g1");
        started.status = GameStatus::Playing;
        started.round = 1;
        started.round_list.push(crate::dao::models::RoundEntity {
            round: 1,
            created_at: 1,
            round_detail: Default::default(),
        });
        repo.append_game("r1", &started).await.unwrap();

        let entry = RoundEntryEntity {
            user: started.host.clone(),
            action_json: r#"{"action":2,"actionText":"Stone ✊"}"#.into(),
        };
        repo.put_round_entry("r1", 0, 0, "a", &entry).await.unwrap();

        let games = repo.load_games("r1").await.unwrap();
        assert_eq!(games[0].round_list[0].round_detail.get("a"), Some(&entry));
    }

    #[tokio::test]
    async fn round_entries_keep_submission_order() {
        let repo = repository();
        repo.create_room(&room("r1")).await.unwrap();
        let mut started = game("g1");
        started.status = GameStatus::Playing;
        started.round = 1;
        started.round_list.push(crate::dao::models::RoundEntity {
            round: 1,
            created_at: 1,
            round_detail: Default::default(),
        });
        repo.append_game("r1", &started).await.unwrap();

        for identity in ["zed", "mia", "abe"] {
            let entry = RoundEntryEntity {
                user: UserRefEntity {
                    identity: identity.into(),
                    name: identity.into(),
                },
                action_json: r#"{"action":0,"actionText":"Paper 🖐️"}"#.into(),
            };
            repo.put_round_entry("r1", 0, 0, identity, &entry).await.unwrap();
        }

        let games = repo.load_games("r1").await.unwrap();
        let order: Vec<&str> = games[0].round_list[0]
            .round_detail
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(order, vec!["zed", "mia", "abe"]);
    }
}
