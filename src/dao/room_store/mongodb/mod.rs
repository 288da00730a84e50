mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoRoomDocuments;

use crate::dao::storage::StorageError;

use super::DocumentRoomStore;

/// Room store persisted as one MongoDB document per room.
pub type MongoRoomStore = DocumentRoomStore<MongoRoomDocuments>;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
