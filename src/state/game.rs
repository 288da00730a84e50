use std::{fmt, time::Duration};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::dao::models::{
    ApplicantEntity, GameEntity, GameStatus, GameType, RoundEntity, RoundEntryEntity,
    UserRefEntity,
};

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Length of `duration` in milliseconds, saturating at `i64::MAX`.
pub fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Choice a participant makes for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Beats stone.
    Paper,
    /// Beats paper.
    Scissors,
    /// Beats scissors.
    Stone,
    /// Leave the game; the participant is eliminated.
    Surrender,
}

/// `actionJson` payload that could not be understood.
#[derive(Debug, Error)]
pub enum ActionParseError {
    /// The payload is not valid JSON.
    #[error("invalid action payload")]
    Json(#[from] serde_json::Error),
    /// The payload names no known action.
    #[error("unknown action code {0}")]
    UnknownCode(u8),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionPayload {
    action: u8,
    #[serde(default)]
    action_text: String,
}

impl Action {
    /// The three actions that take part in the beats relation.
    pub const PLAYABLE: [Action; 3] = [Action::Paper, Action::Scissors, Action::Stone];

    /// Stored numeric code.
    pub fn code(self) -> u8 {
        match self {
            Action::Paper => 0,
            Action::Scissors => 1,
            Action::Stone => 2,
            Action::Surrender => 3,
        }
    }

    /// Action for a stored numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Action::Paper),
            1 => Some(Action::Scissors),
            2 => Some(Action::Stone),
            3 => Some(Action::Surrender),
            _ => None,
        }
    }

    /// Label shown in chat summaries.
    pub fn label(self) -> &'static str {
        match self {
            Action::Paper => "Paper 🖐️",
            Action::Scissors => "Scissors ✌️",
            Action::Stone => "Stone ✊",
            Action::Surrender => "Surrender and lose half 😜",
        }
    }

    /// Stone beats Scissors, Scissors beats Paper, Paper beats Stone.
    pub fn beats(self, other: Action) -> bool {
        matches!(
            (self, other),
            (Action::Stone, Action::Scissors)
                | (Action::Scissors, Action::Paper)
                | (Action::Paper, Action::Stone)
        )
    }

    /// Encode as the stored `actionJson` string.
    pub fn to_action_json(self) -> String {
        let payload = ActionPayload {
            action: self.code(),
            action_text: self.label().to_owned(),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| format!(r#"{{"action":{}}}"#, self.code()))
    }

    /// Decode a stored `actionJson` string.
    pub fn parse_action_json(raw: &str) -> Result<Self, ActionParseError> {
        let payload: ActionPayload = serde_json::from_str(raw)?;
        Self::from_code(payload.action).ok_or(ActionParseError::UnknownCode(payload.action))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Someone taking part in a room or game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Opaque identity.
    pub identity: String,
    /// Display name.
    pub name: String,
}

impl Participant {
    /// Participant from its identity and display name.
    pub fn new(identity: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            name: name.into(),
        }
    }
}

/// Participant admitted to a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    /// Who applied.
    pub participant: Participant,
    /// Eliminated by surrendering; never reset.
    pub fallen: bool,
}

/// A submitted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundEntry {
    /// Who submitted.
    pub user: Participant,
    /// What they chose.
    pub action: Action,
}

/// One simultaneous-choice cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// 1-based round number.
    pub number: u32,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Submissions keyed by identity.
    pub entries: IndexMap<String, RoundEntry>,
}

impl Round {
    /// Empty round opened at `created_at`.
    pub fn new(number: u32, created_at: i64) -> Self {
        Self {
            number,
            created_at,
            entries: IndexMap::new(),
        }
    }

    /// Epoch millisecond after which no submission is accepted.
    pub fn deadline(&self, consider_window: Duration) -> i64 {
        self.created_at.saturating_add(duration_ms(consider_window))
    }

    /// Whether `now` is past the round's deadline.
    pub fn is_expired(&self, now: i64, consider_window: Duration) -> bool {
        now > self.deadline(consider_window)
    }
}

/// Runtime view of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    /// Identifier unique within the room.
    pub id: String,
    /// Kind of game.
    pub kind: GameType,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Applicants in application order, host first.
    pub applicants: Vec<Applicant>,
    /// Last survivor once the game ended.
    pub winner: Option<Participant>,
    /// Current round number; 0 until started.
    pub round: u32,
    /// Rounds played so far.
    pub rounds: Vec<Round>,
    /// Member who hosted the game.
    pub host: Participant,
}

impl Game {
    /// Fresh waiting game with the host as its first applicant.
    pub fn new(id: impl Into<String>, host: Participant, now: i64) -> Self {
        Self {
            id: id.into(),
            kind: GameType::PaperScissorsStone,
            created_at: now,
            status: GameStatus::Waiting,
            applicants: vec![Applicant {
                participant: host.clone(),
                fallen: false,
            }],
            winner: None,
            round: 0,
            rounds: Vec::new(),
            host,
        }
    }

    /// Applicant with `identity`, if any.
    pub fn applicant(&self, identity: &str) -> Option<&Applicant> {
        self.applicants
            .iter()
            .find(|applicant| applicant.participant.identity == identity)
    }

    /// Applicants that have not surrendered.
    pub fn survivors(&self) -> impl Iterator<Item = &Applicant> {
        self.applicants.iter().filter(|applicant| !applicant.fallen)
    }

    /// Number of applicants still in the game.
    pub fn survivor_count(&self) -> usize {
        self.survivors().count()
    }

    /// Mark an applicant as eliminated. Returns `false` if they were not applying.
    pub fn mark_fallen(&mut self, identity: &str) -> bool {
        match self
            .applicants
            .iter_mut()
            .find(|applicant| applicant.participant.identity == identity)
        {
            Some(applicant) => {
                applicant.fallen = true;
                true
            }
            None => false,
        }
    }

    /// Position of the current round inside `rounds`.
    pub fn current_round_index(&self) -> Option<usize> {
        self.rounds
            .iter()
            .rposition(|round| round.number == self.round)
    }

    /// The round being played, if the game started.
    pub fn current_round(&self) -> Option<&Round> {
        self.current_round_index().map(|index| &self.rounds[index])
    }

    /// Milliseconds since the game was created.
    pub fn elapsed_ms(&self, now: i64) -> i64 {
        now.saturating_sub(self.created_at)
    }
}

impl From<UserRefEntity> for Participant {
    fn from(entity: UserRefEntity) -> Self {
        Participant {
            identity: entity.identity,
            name: entity.name,
        }
    }
}

impl From<Participant> for UserRefEntity {
    fn from(participant: Participant) -> Self {
        UserRefEntity {
            identity: participant.identity,
            name: participant.name,
        }
    }
}

impl From<ApplicantEntity> for Applicant {
    fn from(entity: ApplicantEntity) -> Self {
        Applicant {
            participant: Participant::new(entity.identity, entity.name),
            fallen: entity.fallen,
        }
    }
}

impl From<Applicant> for ApplicantEntity {
    fn from(applicant: Applicant) -> Self {
        ApplicantEntity {
            identity: applicant.participant.identity,
            name: applicant.participant.name,
            fallen: applicant.fallen,
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(entity: RoundEntity) -> Self {
        let number = entity.round;
        let entries = entity
            .round_detail
            .into_iter()
            .filter_map(|(key, entry)| match Action::parse_action_json(&entry.action_json) {
                Ok(action) => Some((
                    key,
                    RoundEntry {
                        user: entry.user.into(),
                        action,
                    },
                )),
                Err(err) => {
                    warn!(round = number, entry = %key, error = %err, "ignoring unreadable round entry");
                    None
                }
            })
            .collect();

        Round {
            number,
            created_at: entity.created_at,
            entries,
        }
    }
}

impl From<Round> for RoundEntity {
    fn from(round: Round) -> Self {
        RoundEntity {
            round: round.number,
            created_at: round.created_at,
            round_detail: round
                .entries
                .into_iter()
                .map(|(key, entry)| (key, entry.into()))
                .collect(),
        }
    }
}

impl From<RoundEntry> for RoundEntryEntity {
    fn from(entry: RoundEntry) -> Self {
        RoundEntryEntity {
            user: entry.user.into(),
            action_json: entry.action.to_action_json(),
        }
    }
}

impl From<GameEntity> for Game {
    fn from(entity: GameEntity) -> Self {
        Game {
            id: entity.game_id,
            kind: entity.game_type,
            created_at: entity.created_at,
            status: entity.status,
            applicants: entity.apply_user_list.into_iter().map(Into::into).collect(),
            winner: entity.winner.map(Into::into),
            round: entity.round,
            rounds: entity.round_list.into_iter().map(Into::into).collect(),
            host: entity.host.into(),
        }
    }
}

impl From<Game> for GameEntity {
    fn from(game: Game) -> Self {
        GameEntity {
            game_id: game.id,
            game_type: game.kind,
            created_at: game.created_at,
            status: game.status,
            apply_user_list: game.applicants.into_iter().map(Into::into).collect(),
            winner: game.winner.map(Into::into),
            round: game.round,
            round_list: game.rounds.into_iter().map(Into::into).collect(),
            host: game.host.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_deadline_saturates_on_huge_windows() {
        let round = Round::new(1, 1_700_000_000_000);
        assert_eq!(round.deadline(Duration::from_secs(10)), 1_700_000_010_000);
        assert_eq!(round.deadline(Duration::MAX), i64::MAX);
        assert!(!round.is_expired(i64::MAX, Duration::MAX));
    }

    #[test]
    fn action_json_keeps_the_wire_form() {
        let raw = Action::Stone.to_action_json();
        assert_eq!(raw, r#"{"action":2,"actionText":"Stone ✊"}"#);
        assert_eq!(Action::parse_action_json(&raw).unwrap(), Action::Stone);
        assert_eq!(
            Action::parse_action_json(r#"{"action":3}"#).unwrap(),
            Action::Surrender
        );
        assert!(matches!(
            Action::parse_action_json(r#"{"action":9}"#),
            Err(ActionParseError::UnknownCode(9))
        ));
    }

    #[test]
    fn unreadable_entries_are_dropped_on_load() {
        let mut detail = IndexMap::new();
        detail.insert(
            "a".to_owned(),
            RoundEntryEntity {
                user: UserRefEntity {
                    identity: "a".into(),
                    name: "Ann".into(),
                },
                action_json: "not json".into(),
            },
        );
        detail.insert(
            "b".to_owned(),
            RoundEntryEntity {
                user: UserRefEntity {
                    identity: "b".into(),
                    name: "Bob".into(),
                },
                action_json: Action::Paper.to_action_json(),
            },
        );

        let round: Round = RoundEntity {
            round: 1,
            created_at: 0,
            round_detail: detail,
        }
        .into();

        assert_eq!(round.entries.len(), 1);
        assert_eq!(round.entries["b"].action, Action::Paper);
    }

    #[test]
    fn new_game_waits_with_host_applied() {
        let game = Game::new("g1", Participant::new("h", "Host"), 10);
        assert_eq!(game.status, GameStatus::Waiting);
        assert_eq!(game.round, 0);
        assert_eq!(game.survivor_count(), 1);
        assert!(game.applicant("h").is_some());
        assert!(game.current_round().is_none());
    }

    #[test]
    fn fallen_applicants_leave_the_survivor_count() {
        let mut game = Game::new("g1", Participant::new("h", "Host"), 10);
        game.applicants.push(Applicant {
            participant: Participant::new("b", "Bob"),
            fallen: false,
        });

        assert!(game.mark_fallen("b"));
        assert!(!game.mark_fallen("nobody"));
        assert_eq!(game.survivor_count(), 1);
    }

    #[test]
    fn round_expires_strictly_after_the_window() {
        let round = Round::new(1, 1_000);
        let window = Duration::from_secs(10);
        assert!(!round.is_expired(11_000, window));
        assert!(round.is_expired(11_001, window));
    }
}
