//! Room and game backend for Paper Scissors Stone Shoot: chat rooms whose
//! members play elimination games over a shared room store.
//!
//! The library is shared by the server binary and the OpenAPI generator.

/// Game timings and store backend selection.
pub mod config;
/// Persistence: store paths, wire models and room store backends.
pub mod dao;
/// Request and response bodies of the HTTP API.
pub mod dto;
/// Service errors and their HTTP mapping.
pub mod error;
/// HTTP routing.
pub mod routes;
/// Room, game and stream operations.
pub mod services;
/// Shared application state and the in-memory game model.
pub mod state;
