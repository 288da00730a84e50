use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a room store is currently installed and answering.
    pub store_connected: bool,
}

impl HealthResponse {
    /// The room store is reachable.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            store_connected: true,
        }
    }

    /// Running without a usable room store.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            store_connected: false,
        }
    }
}
