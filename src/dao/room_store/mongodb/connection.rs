use mongodb::{Client, Database, bson::doc};
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Build a client for the room database and make sure the server answers.
///
/// A single ping only; the storage supervisor owns retries and backoff.
pub async fn open_room_database(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|source| MongoDaoError::InitialPing {
            database: config.database_name.clone(),
            source,
        })?;
    debug!(database = %config.database_name, "MongoDB room database reachable");

    Ok((client, database))
}
