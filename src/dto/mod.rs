/// Chat log views.
pub mod chat;
/// Game requests and views.
pub mod game;
/// Health check payloads.
pub mod health;
/// Game phase as exposed to clients.
pub mod phase;
/// Room requests and views.
pub mod room;
/// Server-Sent Event payloads.
pub mod sse;
/// Input validation helpers.
pub mod validation;
