use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Accepting applicants.
    Waiting,
    /// Rounds are being played.
    Playing,
    /// Finished or expired.
    End,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Waiting => VisibleGamePhase::Waiting,
            GamePhase::Playing { .. } => VisibleGamePhase::Playing,
            GamePhase::End => VisibleGamePhase::End,
        }
    }
}
