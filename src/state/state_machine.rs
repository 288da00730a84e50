use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::GameStatus,
    state::game::{Game, Participant, Round},
};

/// Phase of one game. Rounds only exist while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Accepting applicants until started or expired.
    Waiting,
    /// Collecting actions for the given round.
    Playing {
        /// Round being played.
        round: u32,
    },
    /// Terminal.
    End,
}

impl GamePhase {
    /// Phase a stored game is in.
    pub fn of(game: &Game) -> Self {
        match game.status {
            GameStatus::Waiting => GamePhase::Waiting,
            GameStatus::Playing => GamePhase::Playing { round: game.round },
            GameStatus::End => GamePhase::End,
        }
    }

    /// Stored status for this phase.
    pub fn status(self) -> GameStatus {
        match self {
            GamePhase::Waiting => GameStatus::Waiting,
            GamePhase::Playing { .. } => GameStatus::Playing,
            GamePhase::End => GameStatus::End,
        }
    }
}

/// Indicates why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// One or zero applicants were left standing before the round was evaluated.
    LastSurvivor,
    /// Nobody submitted an action.
    NoOneChose,
    /// A single participant submitted an action.
    OnlyOneChose,
    /// Every submission was a surrender.
    AllSurrendered,
    /// A single participant played the winning action.
    Decided,
}

/// Events that can be applied to a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Enough applicants after the start delay; open round 1.
    Start,
    /// Preparation window elapsed without enough applicants.
    Expire,
    /// Round tied; open the next one.
    NextRound,
    /// Round resolved with a final outcome.
    Finish {
        /// Why it ended.
        reason: FinishReason,
        /// Last survivor, if any.
        winner: Option<Participant>,
    },
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the game was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The plan was made for another game.
    #[error("plan for game `{expected}` applied to game `{actual}`")]
    GameMismatch {
        /// Game the plan was made for.
        expected: String,
        /// Game it was applied to.
        actual: String,
    },
    /// The game moved on since the plan was created.
    #[error("game phase changed from {expected:?} to {actual:?} since planning")]
    PhaseMismatch {
        /// Phase when planned.
        expected: GamePhase,
        /// Phase found when applying.
        actual: GamePhase,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not been written yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Identifier of this plan.
    pub id: PlanId,
    /// Game the plan applies to.
    pub game_id: String,
    /// Phase the game must still be in.
    pub from: GamePhase,
    /// Phase after applying.
    pub to: GamePhase,
    /// Event being applied.
    pub event: GameEvent,
}

/// Validate `event` against the game's current phase.
pub fn plan(game: &Game, event: GameEvent) -> Result<Plan, InvalidTransition> {
    let from = GamePhase::of(game);
    let to = compute_transition(from, &event)?;
    Ok(Plan {
        id: Uuid::new_v4(),
        game_id: game.id.clone(),
        from,
        to,
        event,
    })
}

impl Plan {
    /// Check that `game` is still where it was when planned.
    pub fn verify(&self, game: &Game) -> Result<(), ApplyError> {
        if game.id != self.game_id {
            return Err(ApplyError::GameMismatch {
                expected: self.game_id.clone(),
                actual: game.id.clone(),
            });
        }

        let actual = GamePhase::of(game);
        if actual != self.from {
            return Err(ApplyError::PhaseMismatch {
                expected: self.from,
                actual,
            });
        }

        Ok(())
    }

    /// Move `game` into the planned phase. New rounds start at `now`.
    pub fn apply(&self, game: &mut Game, now: i64) -> Result<GamePhase, ApplyError> {
        self.verify(game)?;

        match (&self.event, self.to) {
            (GameEvent::Start | GameEvent::NextRound, GamePhase::Playing { round }) => {
                game.round = round;
                game.rounds.push(Round::new(round, now));
            }
            (GameEvent::Finish { winner, .. }, _) => {
                game.winner = winner.clone();
            }
            (GameEvent::Expire, _) => {
                game.winner = None;
            }
            _ => {}
        }
        game.status = self.to.status();

        Ok(self.to)
    }
}

fn compute_transition(from: GamePhase, event: &GameEvent) -> Result<GamePhase, InvalidTransition> {
    let next = match (from, event) {
        (GamePhase::Waiting, GameEvent::Start) => GamePhase::Playing { round: 1 },
        (GamePhase::Waiting, GameEvent::Expire) => GamePhase::End,
        (GamePhase::Playing { round }, GameEvent::NextRound) => {
            GamePhase::Playing { round: round + 1 }
        }
        (GamePhase::Playing { .. }, GameEvent::Finish { .. }) => GamePhase::End,
        (from, event) => {
            return Err(InvalidTransition {
                from,
                event: event.clone(),
            });
        }
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::new("g1", Participant::new("h", "Host"), 0)
    }

    fn apply(game: &mut Game, event: GameEvent, now: i64) -> GamePhase {
        let plan = plan(game, event).unwrap();
        plan.apply(game, now).unwrap()
    }

    #[test]
    fn full_happy_path_through_game() {
        let mut game = game();

        assert_eq!(
            apply(&mut game, GameEvent::Start, 10),
            GamePhase::Playing { round: 1 }
        );
        assert_eq!(
            apply(&mut game, GameEvent::NextRound, 20),
            GamePhase::Playing { round: 2 }
        );
        let winner = Participant::new("h", "Host");
        assert_eq!(
            apply(
                &mut game,
                GameEvent::Finish {
                    reason: FinishReason::Decided,
                    winner: Some(winner.clone()),
                },
                30
            ),
            GamePhase::End
        );

        assert_eq!(game.status, GameStatus::End);
        assert_eq!(game.winner, Some(winner));
        let numbers: Vec<u32> = game.rounds.iter().map(|round| round.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(game.rounds[1].created_at, 20);
    }

    #[test]
    fn expiry_ends_a_waiting_game_without_rounds() {
        let mut game = game();
        assert_eq!(apply(&mut game, GameEvent::Expire, 5), GamePhase::End);
        assert!(game.rounds.is_empty());
        assert_eq!(game.winner, None);
    }

    #[test]
    fn end_is_terminal() {
        let mut game = game();
        apply(&mut game, GameEvent::Expire, 5);

        for event in [GameEvent::Start, GameEvent::Expire, GameEvent::NextRound] {
            let err = plan(&game, event.clone()).unwrap_err();
            assert_eq!(
                err,
                InvalidTransition {
                    from: GamePhase::End,
                    event
                }
            );
        }
    }

    #[test]
    fn playing_games_cannot_expire_or_restart() {
        let mut game = game();
        apply(&mut game, GameEvent::Start, 1);

        assert!(plan(&game, GameEvent::Expire).is_err());
        assert!(plan(&game, GameEvent::Start).is_err());
    }

    #[test]
    fn stale_plan_is_rejected() {
        let mut game = game();
        let start = plan(&game, GameEvent::Start).unwrap();
        let expire = plan(&game, GameEvent::Expire).unwrap();

        start.apply(&mut game, 1).unwrap();
        let err = expire.apply(&mut game, 2).unwrap_err();

        assert_eq!(
            err,
            ApplyError::PhaseMismatch {
                expected: GamePhase::Waiting,
                actual: GamePhase::Playing { round: 1 },
            }
        );
        assert_eq!(game.status, GameStatus::Playing);
    }

    #[test]
    fn plan_for_another_game_is_rejected() {
        let first = game();
        let mut other = Game::new("g2", Participant::new("h", "Host"), 0);
        let plan = plan(&first, GameEvent::Start).unwrap();

        assert!(matches!(
            plan.apply(&mut other, 1),
            Err(ApplyError::GameMismatch { .. })
        ));
    }
}
