//! Error types of the MongoDB storage implementation.

use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Rejected connection string.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The database did not answer when first connecting.
    #[error("MongoDB database `{database}` did not answer the initial ping")]
    InitialPing {
        /// Database that was pinged.
        database: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A later health check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading a room document failed.
    #[error("failed to load room `{room_id}`")]
    LoadRoom {
        /// Room being read.
        room_id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Writing a room document failed.
    #[error("failed to save room `{room_id}`")]
    SaveRoom {
        /// Room being written.
        room_id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
