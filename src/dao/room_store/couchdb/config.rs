//! CouchDB connection settings.

use super::error::{CouchDaoError, CouchResult};

const BASE_URL_ENV: &str = "COUCH_BASE_URL";
const DATABASE_ENV: &str = "COUCH_DB";
const USERNAME_ENV: &str = "COUCH_USERNAME";
const PASSWORD_ENV: &str = "COUCH_PASSWORD";
const DEFAULT_DATABASE: &str = "rps_rooms";

/// Where the room documents live in CouchDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    /// Server URL without a trailing slash.
    pub base_url: String,
    /// Database holding the room documents.
    pub database: String,
    /// Basic-auth pair, only when both halves are set.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL`, `COUCH_DB` and the optional credential pair.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let base_url = lookup(BASE_URL_ENV)
            .map(|url| url.trim_end_matches('/').to_owned())
            .ok_or(CouchDaoError::MissingEnvVar { var: BASE_URL_ENV })?;
        let database = lookup(DATABASE_ENV).unwrap_or_else(|| DEFAULT_DATABASE.to_owned());
        let credentials = lookup(USERNAME_ENV).zip(lookup(PASSWORD_ENV));

        Ok(Self {
            base_url,
            database,
            credentials,
        })
    }
}
