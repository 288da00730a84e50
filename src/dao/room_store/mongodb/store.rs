//! Room documents stored in a MongoDB collection.

use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{ErrorKind, WriteFailure},
};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::open_room_database,
    error::{MongoDaoError, MongoResult},
    models::MongoRoomDocument,
};
use crate::dao::{
    room_store::{Revision, RoomDocument, RoomDocuments, WriteOutcome},
    storage::StorageResult,
};

const ROOM_COLLECTION_NAME: &str = "rooms";
const DUPLICATE_KEY: i32 = 11000;

/// Room document backend over the `rooms` collection.
#[derive(Clone)]
pub struct MongoRoomDocuments {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = open_room_database(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRoomDocuments {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = open_room_database(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self) -> Collection<MongoRoomDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoRoomDocument>(ROOM_COLLECTION_NAME)
    }

    async fn find_room(&self, room_id: &str) -> MongoResult<Option<MongoRoomDocument>> {
        self.collection()
            .await
            .find_one(doc! { "_id": room_id })
            .await
            .map_err(|source| MongoDaoError::LoadRoom {
                room_id: room_id.to_owned(),
                source,
            })
    }

    async fn write_room(
        &self,
        room_id: &str,
        room: Value,
        expected: Option<Revision>,
    ) -> MongoResult<WriteOutcome> {
        let collection = self.collection().await;
        let save_error = |source| MongoDaoError::SaveRoom {
            room_id: room_id.to_owned(),
            source,
        };

        let Some(expected) = expected else {
            let document = MongoRoomDocument {
                id: room_id.to_owned(),
                revision: 1,
                room,
            };
            return match collection.insert_one(&document).await {
                Ok(_) => Ok(WriteOutcome::Written),
                Err(err) if is_duplicate_key(&err) => Ok(WriteOutcome::Conflict),
                Err(err) => Err(save_error(err)),
            };
        };

        let Ok(expected) = expected.parse::<i64>() else {
            return Ok(WriteOutcome::Conflict);
        };
        let document = MongoRoomDocument {
            id: room_id.to_owned(),
            revision: expected + 1,
            room,
        };
        let result = collection
            .replace_one(doc! { "_id": room_id, "revision": expected }, &document)
            .await
            .map_err(save_error)?;

        if result.matched_count == 0 {
            Ok(WriteOutcome::Conflict)
        } else {
            Ok(WriteOutcome::Written)
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

impl RoomDocuments for MongoRoomDocuments {
    fn load(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<RoomDocument>>> {
        let store = self.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move {
            let document = store.find_room(&room_id).await?;
            Ok(document.map(|doc| RoomDocument {
                body: doc.room,
                revision: doc.revision.to_string(),
            }))
        })
    }

    fn store(
        &self,
        room_id: &str,
        body: Value,
        expected: Option<Revision>,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let store = self.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move {
            store
                .write_room(&room_id, body, expected)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
