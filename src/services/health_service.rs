use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the room store and report whether the service is degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.room_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "room store health check failed");
            }
        }
        None => warn!("room store unavailable (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::room_store::memory::MemoryRoomStore, state::AppState};

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .install_room_store(Arc::new(MemoryRoomStore::in_memory()))
            .await;
        assert_eq!(health_status(&state).await.status, "ok");
    }
}
