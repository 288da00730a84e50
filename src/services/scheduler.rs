//! One task per live game, sleeping until the game's next deadline and then
//! evaluating it.

use std::{sync::Arc, time::Duration};

use tokio::{sync::Notify, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    dao::models::GameStatus,
    error::ServiceError,
    services::game_service::{self, Evaluation},
    state::{
        SharedState,
        game::{duration_ms, now_ms},
    },
};

/// Pause before evaluating again after a failed evaluation.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Make sure a scheduler task drives `game_id`.
pub fn ensure_scheduled(state: &SharedState, room_id: &str, game_id: &str) {
    let spawned = state.authority(room_id).schedule_with(game_id, |nudge| {
        tokio::spawn(drive_game(
            state.clone(),
            room_id.to_owned(),
            game_id.to_owned(),
            nudge,
        ))
    });
    if spawned {
        debug!(room_id, game_id, "game scheduler started");
    }
}

/// Ask the scheduler of `game_id` to evaluate right away.
pub fn nudge(state: &SharedState, room_id: &str, game_id: &str) {
    state.authority(room_id).nudge(game_id);
}

/// Start schedulers for every unfinished game of a room the first time the
/// room is touched by this process.
pub async fn resume_room(state: &SharedState, room_id: &str) {
    let authority = state.authority(room_id);
    if !authority.claim_resume() {
        return;
    }

    let games = match state.rooms().await {
        Ok(rooms) => rooms.load_games(room_id).await.map_err(ServiceError::from),
        Err(err) => Err(err),
    };
    match games {
        Ok(games) => {
            let mut resumed = 0;
            for game in games.iter().filter(|game| game.status != GameStatus::End) {
                ensure_scheduled(state, room_id, &game.game_id);
                resumed += 1;
            }
            if resumed > 0 {
                info!(room_id, resumed, "resumed game schedulers");
            }
        }
        Err(err) => {
            warn!(room_id, error = %err, "could not resume game schedulers");
            authority.release_resume();
        }
    }
}

async fn drive_game(state: SharedState, room_id: String, game_id: String, nudge: Arc<Notify>) {
    run_schedule(&state, &room_id, &game_id, &nudge).await;
    if let Some(authority) = state.existing_authority(&room_id) {
        authority.release_schedule(&game_id);
    }
}

/// Evaluate `game_id` at each deadline until it ends or disappears.
async fn run_schedule(state: &SharedState, room_id: &str, game_id: &str, nudge: &Notify) {
    loop {
        let now = now_ms();
        let wake_at = match game_service::evaluate_game_at(state, room_id, game_id, now).await {
            Ok(Evaluation::Done) => {
                info!(room_id, game_id, "game finished; scheduler stopping");
                return;
            }
            Ok(Evaluation::WakeAt(at)) => at,
            Err(err @ (ServiceError::GameNotFound(_) | ServiceError::RoomNotFound(_))) => {
                warn!(room_id, game_id, error = %err, "scheduled game vanished");
                return;
            }
            Err(err) => {
                warn!(room_id, game_id, error = %err, "game evaluation failed; retrying");
                now.saturating_add(duration_ms(RETRY_DELAY))
            }
        };

        let delay = Duration::from_millis(wake_at.saturating_sub(now_ms()).max(0) as u64);
        tokio::select! {
            _ = sleep(delay) => {}
            _ = nudge.notified() => {
                debug!(room_id, game_id, "game scheduler nudged");
            }
        }
    }
}
