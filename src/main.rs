//! Room and game server entrypoint wiring REST, SSE and the room store supervisor.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rps_room_back::{
    config::{AppConfig, StoreBackend},
    dao::{
        room_store::{RoomStore, memory::MemoryRoomStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    spawn_store_supervisor(app_state.clone(), StoreBackend::from_env());
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    app_state.shutdown();
    info!("game schedulers stopped");
    Ok(())
}

/// Connect the configured room store in the background; the server answers in
/// degraded mode until it is reachable.
fn spawn_store_supervisor(state: SharedState, backend: StoreBackend) {
    info!(?backend, "selecting room store");
    match backend {
        StoreBackend::Memory => spawn_memory_supervisor(state),
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            use rps_room_back::dao::room_store::couchdb::{
                CouchConfig, CouchRoomDocuments, CouchRoomStore,
            };

            tokio::spawn(storage_supervisor::run(state, || async {
                let documents = CouchRoomDocuments::connect(CouchConfig::from_env()?).await?;
                Ok::<_, StorageError>(Arc::new(CouchRoomStore::new(documents)) as Arc<dyn RoomStore>)
            }));
        }
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            use rps_room_back::dao::room_store::mongodb::{
                MongoConfig, MongoRoomDocuments, MongoRoomStore,
            };

            tokio::spawn(storage_supervisor::run(state, || async {
                let documents = MongoRoomDocuments::connect(MongoConfig::from_env().await?).await?;
                Ok::<_, StorageError>(Arc::new(MongoRoomStore::new(documents)) as Arc<dyn RoomStore>)
            }));
        }
        #[allow(unreachable_patterns)]
        other => {
            warn!(backend = ?other, "room store not compiled in; using in-memory store");
            spawn_memory_supervisor(state);
        }
    }
}

fn spawn_memory_supervisor(state: SharedState) {
    let store: Arc<dyn RoomStore> = Arc::new(MemoryRoomStore::in_memory());
    tokio::spawn(storage_supervisor::run(state, move || {
        let store = store.clone();
        async move { Ok::<_, StorageError>(store) }
    }));
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
