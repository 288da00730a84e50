//! Hierarchical room store: path-addressed reads, writes, appends and change
//! subscriptions on top of one revisioned JSON document per room.

/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// Change notification fan-out.
pub mod feed;
/// In-process backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;
mod tree;

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::dao::{
    path::StorePath,
    storage::{StorageError, StorageResult, TreeError},
};

pub use self::feed::{ChangeFeed, StoreSubscription, SubscriptionEvent};

/// Attempts made to apply one write before giving up on revision conflicts.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;
const FEED_CAPACITY: usize = 256;

/// Abstraction over the shared store every room lives in.
pub trait RoomStore: Send + Sync {
    /// Read the node at `path`; `None` when nothing is stored there.
    fn get(&self, path: StorePath) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    /// Replace the node at `path`. Writing `null` removes it.
    fn set(&self, path: StorePath, value: Value) -> BoxFuture<'static, StorageResult<()>>;
    /// Add a child to the collection at `path` and return its key.
    fn append(&self, path: StorePath, value: Value) -> BoxFuture<'static, StorageResult<String>>;
    /// Watch changes overlapping `path`.
    fn subscribe(&self, path: StorePath) -> StoreSubscription;
    /// Check that the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Opaque revision token used for compare-and-swap writes.
pub type Revision = String;

/// A stored room document with the revision it was read at.
#[derive(Debug, Clone)]
pub struct RoomDocument {
    /// Parsed room document.
    pub body: Value,
    /// Revision the body was read at.
    pub revision: Revision,
}

/// Result of a conditional document write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The document now holds the new body.
    Written,
    /// Someone else wrote first; re-read and retry.
    Conflict,
}

/// Backend persisting whole room documents with optimistic concurrency.
pub trait RoomDocuments: Clone + Send + Sync + 'static {
    /// Read a room document with its revision.
    fn load(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<RoomDocument>>>;
    /// Store `body`, succeeding only if the current revision is still `expected`
    /// (`None` meaning the document must not exist yet).
    fn store(
        &self,
        room_id: &str,
        body: Value,
        expected: Option<Revision>,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;
    /// Check that the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// [`RoomStore`] implemented over any [`RoomDocuments`] backend.
#[derive(Clone)]
pub struct DocumentRoomStore<D> {
    documents: D,
    feed: Arc<ChangeFeed>,
}

impl<D: RoomDocuments> DocumentRoomStore<D> {
    /// Serve rooms from `documents`.
    pub fn new(documents: D) -> Self {
        Self {
            documents,
            feed: Arc::new(ChangeFeed::new(FEED_CAPACITY)),
        }
    }

    async fn read(&self, path: StorePath) -> StorageResult<Option<Value>> {
        let room_id = path
            .room_id()
            .ok_or_else(|| StorageError::UnsupportedPath { path: path.clone() })?;
        let Some(document) = self.documents.load(room_id).await? else {
            return Ok(None);
        };
        Ok(tree::value_at(&document.body, path.within_room()).cloned())
    }

    /// Read-modify-write the room document containing `path`, retrying on
    /// revision conflicts, then notify subscribers.
    async fn mutate<T, F>(&self, path: StorePath, mut edit: F) -> StorageResult<T>
    where
        F: FnMut(&mut Value, &[String]) -> Result<T, TreeError>,
    {
        let room_id = path
            .room_id()
            .ok_or_else(|| StorageError::UnsupportedPath { path: path.clone() })?;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (mut body, revision) = match self.documents.load(room_id).await? {
                Some(document) => (document.body, Some(document.revision)),
                None => (Value::Null, None),
            };

            let output = edit(&mut body, path.within_room()).map_err(|source| {
                StorageError::InvalidWrite {
                    path: path.clone(),
                    source,
                }
            })?;

            match self.documents.store(room_id, body, revision).await? {
                WriteOutcome::Written => {
                    self.feed.publish(path.clone());
                    return Ok(output);
                }
                WriteOutcome::Conflict => {
                    debug!(%path, attempt, "room document revision conflict, retrying");
                }
            }
        }

        Err(StorageError::Conflict {
            path,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }
}

impl<D: RoomDocuments> RoomStore for DocumentRoomStore<D> {
    fn get(&self, path: StorePath) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        Box::pin(async move { store.read(path).await })
    }

    fn set(&self, path: StorePath, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .mutate(path, |body, segments| {
                    tree::set_at(body, segments, value.clone())
                })
                .await
        })
    }

    fn append(&self, path: StorePath, value: Value) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .mutate(path, |body, segments| {
                    tree::append_at(body, segments, value.clone(), fresh_key)
                })
                .await
        })
    }

    fn subscribe(&self, path: StorePath) -> StoreSubscription {
        self.feed.subscribe(path)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.documents.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.documents.try_reconnect()
    }
}

/// Unique child key that sorts by creation time.
fn fresh_key() -> String {
    let millis = crate::state::game::now_ms();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{millis:013}-{}", &suffix[..8])
}
