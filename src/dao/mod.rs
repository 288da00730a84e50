/// Wire models of everything stored under a room.
pub mod models;
/// Hierarchical store paths.
pub mod path;
/// Typed repository over the room store.
pub mod room;
/// Room store abstraction and its backends.
pub mod room_store;
/// Storage error types shared by every backend.
pub mod storage;
