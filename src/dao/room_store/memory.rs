use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use serde_json::Value;

use super::{DocumentRoomStore, Revision, RoomDocument, RoomDocuments, WriteOutcome};
use crate::dao::storage::StorageResult;

/// Process-local room documents. Used for single-instance deployments and tests.
#[derive(Clone, Default)]
pub struct MemoryDocuments {
    rooms: Arc<DashMap<String, (Value, u64)>>,
}

/// Room store that never leaves the process.
pub type MemoryRoomStore = DocumentRoomStore<MemoryDocuments>;

impl DocumentRoomStore<MemoryDocuments> {
    /// Empty store.
    pub fn in_memory() -> Self {
        Self::new(MemoryDocuments::default())
    }
}

impl RoomDocuments for MemoryDocuments {
    fn load(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<RoomDocument>>> {
        let document = self.rooms.get(room_id).map(|entry| RoomDocument {
            body: entry.0.clone(),
            revision: entry.1.to_string(),
        });
        Box::pin(async move { Ok(document) })
    }

    fn store(
        &self,
        room_id: &str,
        body: Value,
        expected: Option<Revision>,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = match (self.rooms.entry(room_id.to_owned()), expected) {
            (Entry::Occupied(mut current), Some(expected))
                if current.get().1.to_string() == expected =>
            {
                let next = current.get().1 + 1;
                current.insert((body, next));
                WriteOutcome::Written
            }
            (Entry::Vacant(slot), None) => {
                slot.insert((body, 1));
                WriteOutcome::Written
            }
            _ => WriteOutcome::Conflict,
        };
        Box::pin(async move { Ok(outcome) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use serde_json::json;
    use tokio_stream::StreamExt;

    use super::*;
    use crate::dao::{
        path::StorePath,
        room_store::{RoomStore, SubscriptionEvent},
        storage::StorageError,
    };

    #[tokio::test]
    async fn set_then_get_nested_values() {
        let store = MemoryRoomStore::in_memory();
        store
            .set(StorePath::room("r1"), json!({ "roomId": "r1", "chatList": [] }))
            .await
            .unwrap();
        store
            .set(StorePath::online_count("r1"), json!(2))
            .await
            .unwrap();

        let count = store.get(StorePath::online_count("r1")).await.unwrap();
        assert_eq!(count, Some(json!(2)));
        assert_eq!(store.get(StorePath::room("missing")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn append_to_chat_list_returns_index() {
        let store = MemoryRoomStore::in_memory();
        store
            .set(StorePath::room("r1"), json!({ "chatList": [] }))
            .await
            .unwrap();

        let first = store
            .append(StorePath::chat_list("r1"), json!({ "message": "a" }))
            .await
            .unwrap();
        let second = store
            .append(StorePath::chat_list("r1"), json!({ "message": "b" }))
            .await
            .unwrap();

        assert_eq!((first.as_str(), second.as_str()), ("0", "1"));
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let store = MemoryRoomStore::in_memory();
        store
            .set(StorePath::room("r1"), json!({ "chatList": [] }))
            .await
            .unwrap();

        let handles = (0..4)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append(StorePath::chat_list("r1"), json!(i))
                        .await
                        .unwrap()
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await.unwrap();
        }

        let chat = store.get(StorePath::chat_list("r1")).await.unwrap().unwrap();
        assert_eq!(chat.as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn subscribers_hear_about_nested_writes() {
        let store = MemoryRoomStore::in_memory();
        let mut sub = pin!(store.subscribe(StorePath::room("r1")).into_stream());

        store
            .set(StorePath::user_list("r1"), json!([]))
            .await
            .unwrap();

        assert_eq!(
            sub.next().await,
            Some(SubscriptionEvent::Changed(StorePath::user_list("r1")))
        );
    }

    #[tokio::test]
    async fn paths_outside_rooms_are_rejected() {
        let store = MemoryRoomStore::in_memory();
        let err = store.get(StorePath::rooms()).await.unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedPath { .. }));
    }

    #[tokio::test]
    async fn stale_revision_is_a_conflict() {
        let documents = MemoryDocuments::default();
        let first = documents.store("r1", json!({}), None).await.unwrap();
        let duplicate = documents.store("r1", json!({}), None).await.unwrap();
        let stale = documents
            .store("r1", json!({}), Some("0".into()))
            .await
            .unwrap();

        assert_eq!(first, WriteOutcome::Written);
        assert_eq!(duplicate, WriteOutcome::Conflict);
        assert_eq!(stale, WriteOutcome::Conflict);
    }
}
