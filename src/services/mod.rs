/// OpenAPI documentation generation.
pub mod documentation;
/// Game lifecycle and round resolution driving.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Chat log appends with duplicate suppression.
pub mod notifier;
/// Room creation and membership.
pub mod room_service;
/// Per-game timers.
pub mod scheduler;
/// Server-Sent Events room streams.
pub mod sse_service;
/// Room store connection supervisor with degraded mode.
pub mod storage_supervisor;
