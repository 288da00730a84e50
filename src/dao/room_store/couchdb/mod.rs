mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchRoomDocuments;

use crate::dao::storage::StorageError;

use super::DocumentRoomStore;

/// Room store persisted as one CouchDB document per room.
pub type CouchRoomStore = DocumentRoomStore<CouchRoomDocuments>;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
