//! Round resolution: turns the submissions of an expired round into the next
//! game event.

use std::collections::BTreeSet;

use crate::state::{
    game::{Action, Game, Participant, RoundEntry},
    state_machine::{FinishReason, GameEvent},
};

/// What happens to the game after a round is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Tie; a new round opens.
    NextRound,
    /// The game ends.
    Finished {
        /// Why it ended.
        reason: FinishReason,
        /// Last survivor, if any.
        winner: Option<Participant>,
    },
}

/// Full result of resolving one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// What the game does next.
    pub outcome: RoundOutcome,
    /// Participants eliminated by surrendering this round.
    pub surrendered: Vec<Participant>,
    /// Every submission of the round, in submission order.
    pub choices: Vec<RoundEntry>,
}

impl Resolution {
    fn finished(reason: FinishReason, winner: Option<Participant>) -> Self {
        Resolution {
            outcome: RoundOutcome::Finished { reason, winner },
            surrendered: Vec::new(),
            choices: Vec::new(),
        }
    }

    /// Lifecycle event that applies this resolution.
    pub fn event(&self) -> GameEvent {
        match &self.outcome {
            RoundOutcome::NextRound => GameEvent::NextRound,
            RoundOutcome::Finished { reason, winner } => GameEvent::Finish {
                reason: *reason,
                winner: winner.clone(),
            },
        }
    }
}

/// Winner between two playable actions; `None` when they are equal or one is a surrender.
pub fn winning_action(first: Action, second: Action) -> Option<Action> {
    if first.beats(second) {
        Some(first)
    } else if second.beats(first) {
        Some(second)
    } else {
        None
    }
}

/// Playable actions present among `entries`. Surrenders are excluded.
pub fn distinct_actions<'a>(entries: impl IntoIterator<Item = &'a RoundEntry>) -> BTreeSet<Action> {
    entries
        .into_iter()
        .map(|entry| entry.action)
        .filter(|action| *action != Action::Surrender)
        .collect()
}

/// Decide the fate of the game's current round.
///
/// Pure: the same game always yields the same resolution.
pub fn resolve_round(game: &Game) -> Resolution {
    if game.survivor_count() <= 1 {
        let survivor = game
            .survivors()
            .next()
            .map(|applicant| applicant.participant.clone());
        return Resolution::finished(FinishReason::LastSurvivor, survivor);
    }

    let choices: Vec<RoundEntry> = game
        .current_round()
        .map(|round| round.entries.values().cloned().collect())
        .unwrap_or_default();

    match choices.as_slice() {
        [] => return Resolution::finished(FinishReason::NoOneChose, None),
        [only] => {
            let mut resolution =
                Resolution::finished(FinishReason::OnlyOneChose, Some(only.user.clone()));
            resolution.choices = choices;
            return resolution;
        }
        _ => {}
    }

    let surrendered = choices
        .iter()
        .filter(|entry| entry.action == Action::Surrender)
        .map(|entry| entry.user.clone())
        .collect();

    let actions = distinct_actions(&choices);
    let outcome = match actions.iter().copied().collect::<Vec<_>>().as_slice() {
        [] => RoundOutcome::Finished {
            reason: FinishReason::AllSurrendered,
            winner: None,
        },
        [first, second] => match winning_action(*first, *second) {
            Some(winning) => {
                let mut winners = choices.iter().filter(|entry| entry.action == winning);
                match (winners.next(), winners.next()) {
                    (Some(winner), None) => RoundOutcome::Finished {
                        reason: FinishReason::Decided,
                        winner: Some(winner.user.clone()),
                    },
                    _ => RoundOutcome::NextRound,
                }
            }
            None => RoundOutcome::NextRound,
        },
        // One action or all three: tie.
        _ => RoundOutcome::NextRound,
    };

    Resolution {
        outcome,
        surrendered,
        choices,
    }
}
