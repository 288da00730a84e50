use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::phase::VisibleGamePhase,
    state::{
        game::{Action, Game, Round},
        state_machine::GamePhase,
    },
};

/// Choice a participant can submit for a round.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionChoice {
    /// Beats stone.
    Paper,
    /// Beats paper.
    Scissors,
    /// Beats scissors.
    Stone,
    /// Leave the game; the participant is eliminated.
    Surrender,
}

impl From<ActionChoice> for Action {
    fn from(choice: ActionChoice) -> Self {
        match choice {
            ActionChoice::Paper => Action::Paper,
            ActionChoice::Scissors => Action::Scissors,
            ActionChoice::Stone => Action::Stone,
            ActionChoice::Surrender => Action::Surrender,
        }
    }
}

impl From<Action> for ActionChoice {
    fn from(action: Action) -> Self {
        match action {
            Action::Paper => ActionChoice::Paper,
            Action::Scissors => ActionChoice::Scissors,
            Action::Stone => ActionChoice::Stone,
            Action::Surrender => ActionChoice::Surrender,
        }
    }
}

/// Payload for submitting a round action.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitActionRequest {
    /// Chosen action.
    pub action: ActionChoice,
}

/// Acknowledgement of an accepted submission.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// Game the action was submitted to.
    pub game_id: String,
    /// Round the action counts for.
    pub round: u32,
    /// Accepted action.
    pub action: ActionChoice,
}

/// Applicant of a game.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ApplicantView {
    /// Display name.
    pub name: String,
    /// Eliminated by surrendering.
    pub fallen: bool,
}

/// A submission; the action stays hidden until the round is over.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct RoundEntryView {
    /// Display name of the submitter.
    pub name: String,
    /// Submitted action, once the round is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionChoice>,
}

/// One round of a game.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    /// Round number, starting at 1.
    pub round: u32,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Submissions in arrival order.
    pub entries: Vec<RoundEntryView>,
}

impl RoundView {
    fn new(round: &Round, reveal: bool) -> Self {
        Self {
            round: round.number,
            created_at: round.created_at,
            entries: round
                .entries
                .values()
                .map(|entry| RoundEntryView {
                    name: entry.user.name.clone(),
                    action: reveal.then(|| entry.action.into()),
                })
                .collect(),
        }
    }
}

/// Public snapshot of a game.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    /// Identifier unique within the room.
    pub game_id: String,
    /// Current phase.
    pub phase: VisibleGamePhase,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Name of the host.
    pub host: String,
    /// Applicants in application order.
    pub applicants: Vec<ApplicantView>,
    /// Name of the last survivor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    /// Current round number; 0 before the game starts.
    pub round: u32,
    /// Epoch millisecond after which the current round stops accepting actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_deadline: Option<i64>,
    /// Rounds played so far.
    pub rounds: Vec<RoundView>,
}

impl GameView {
    /// Build the snapshot, hiding the actions of a round still being played.
    pub fn new(game: &Game, consider_window: Duration) -> Self {
        let phase = GamePhase::of(game);
        let playing = matches!(phase, GamePhase::Playing { .. });
        let round_deadline = if playing {
            game.current_round()
                .map(|round| round.deadline(consider_window))
        } else {
            None
        };

        Self {
            game_id: game.id.clone(),
            phase: phase.into(),
            created_at: game.created_at,
            host: game.host.name.clone(),
            applicants: game
                .applicants
                .iter()
                .map(|applicant| ApplicantView {
                    name: applicant.participant.name.clone(),
                    fallen: applicant.fallen,
                })
                .collect(),
            winner: game.winner.as_ref().map(|winner| winner.name.clone()),
            round: game.round,
            round_deadline,
            rounds: game
                .rounds
                .iter()
                .map(|round| RoundView::new(round, !(playing && round.number == game.round)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::GameStatus,
        state::game::{Participant, RoundEntry},
    };

    #[test]
    fn current_round_actions_stay_hidden_while_playing() {
        let host = Participant::new("h", "Hana");
        let mut game = Game::new("g1", host.clone(), 0);
        game.status = GameStatus::Playing;
        game.round = 2;
        for number in 1..=2 {
            let mut round = Round::new(number, number as i64 * 1_000);
            round.entries.insert(
                "h".into(),
                RoundEntry {
                    user: host.clone(),
                    action: Action::Stone,
                },
            );
            game.rounds.push(round);
        }

        let view = GameView::new(&game, Duration::from_secs(10));
        assert_eq!(view.phase, VisibleGamePhase::Playing);
        assert_eq!(view.round_deadline, Some(12_000));
        assert_eq!(view.rounds[0].entries[0].action, Some(ActionChoice::Stone));
        assert_eq!(view.rounds[1].entries[0].action, None);
    }
}
