/// Per-room write serialization and scheduler tracking.
pub mod authority;
/// Chat log entries.
pub mod chat;
/// Games, rounds and actions.
pub mod game;
/// System chat notices.
pub mod notices;
/// Round resolution.
pub mod resolution;
/// Caller context.
pub mod session;
/// Game phase transitions.
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{room::RoomRepository, room_store::RoomStore},
    error::ServiceError,
};

pub use self::{authority::RoomAuthority, session::Session};

/// Application state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Central application state: the store handle, configuration and one
/// authority per room.
pub struct AppState {
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    authorities: DashMap<String, Arc<RoomAuthority>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            room_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            authorities: DashMap::new(),
        })
    }

    /// Shortcut for tests and single-process runs: state with a store already installed.
    pub async fn with_store(config: AppConfig, store: Arc<dyn RoomStore>) -> SharedState {
        let state = Self::new(config);
        state.install_room_store(store).await;
        state
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Repository over the installed store, or [`ServiceError::Degraded`].
    pub async fn rooms(&self) -> Result<RoomRepository, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.room_store()
            .await
            .map(RoomRepository::new)
            .ok_or(ServiceError::Degraded)
    }

    /// Install a new room store implementation and leave degraded mode.
    pub async fn install_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current room store and enter degraded mode.
    pub async fn clear_room_store(&self) {
        {
            let mut guard = self.room_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Authority owning writes to `room_id`, created on first use.
    ///
    /// Only for rooms known to exist, or about to be created; see
    /// [`AppState::room_authority`] for ids coming from a request.
    pub(crate) fn authority(&self, room_id: &str) -> Arc<RoomAuthority> {
        self.authorities
            .entry(room_id.to_owned())
            .or_insert_with(|| Arc::new(RoomAuthority::new(room_id)))
            .clone()
    }

    /// Authority of an existing room, or [`ServiceError::RoomNotFound`].
    ///
    /// Unknown ids never get an authority, so the registry only holds rooms
    /// that are in the store.
    pub async fn room_authority(
        &self,
        rooms: &RoomRepository,
        room_id: &str,
    ) -> Result<Arc<RoomAuthority>, ServiceError> {
        if let Some(authority) = self.existing_authority(room_id) {
            return Ok(authority);
        }
        if !rooms.exists(room_id).await? {
            return Err(ServiceError::RoomNotFound(room_id.to_owned()));
        }
        Ok(self.authority(room_id))
    }

    /// Authority of `room_id` if this process already has one.
    pub(crate) fn existing_authority(&self, room_id: &str) -> Option<Arc<RoomAuthority>> {
        self.authorities.get(room_id).map(|authority| authority.clone())
    }

    /// Drop the authority of a room whose creation failed, unless someone
    /// besides the registry and `held` still uses it.
    pub(crate) fn forget_authority(&self, room_id: &str, held: Arc<RoomAuthority>) {
        drop(held);
        self.authorities
            .remove_if(room_id, |_, authority| Arc::strong_count(authority) == 1);
    }

    /// Number of rooms with an authority in this process.
    pub fn authority_count(&self) -> usize {
        self.authorities.len()
    }

    /// Stop every scheduler task of every room.
    pub fn shutdown(&self) {
        for authority in self.authorities.iter() {
            authority.shutdown();
        }
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
