//! System chat entries announcing room and game events.

use std::time::Duration;

use crate::state::{
    chat::{ChatMessage, GameNotice, PrivateNotice},
    game::{Game, Participant, RoundEntry},
    resolution::{Resolution, RoundOutcome},
    state_machine::FinishReason,
};

/// Announces a new room.
pub fn room_created(name: &str, now: i64) -> ChatMessage {
    ChatMessage::system_text(format!("{name} created the room."), now)
}

/// Announces a member arriving.
pub fn room_joined(name: &str, now: i64) -> ChatMessage {
    ChatMessage::system_text(format!("{name} joined the room."), now)
}

/// Announces a member leaving.
pub fn room_left(name: &str, now: i64) -> ChatMessage {
    ChatMessage::system_text(format!("{name} left the room."), now)
}

/// Invites the room to a hosted game.
pub fn game_invite(game: &Game, now: i64) -> ChatMessage {
    ChatMessage::GameInvite(notice(
        game,
        format!(
            "{} invited everyone to play Paper Scissors Stone Shoot.",
            game.host.name
        ),
        now,
    ))
}

/// Announces an applicant.
pub fn game_joined(game: &Game, applicant: &Participant, now: i64) -> ChatMessage {
    ChatMessage::GameJoin(notice(
        game,
        format!("{} joined the game.", applicant.name),
        now,
    ))
}

/// Announces that the game started.
pub fn game_begin(game: &Game, now: i64) -> ChatMessage {
    ChatMessage::GameStart(notice(
        game,
        format!("The game \"{}\" begin now.", game.id),
        now,
    ))
}

/// Private prompts asking every survivor to choose for the current round.
pub fn round_prompts(game: &Game, consider_window: Duration, now: i64) -> Vec<ChatMessage> {
    let survivors: Vec<&Participant> = game
        .survivors()
        .map(|applicant| &applicant.participant)
        .collect();
    let names = survivors
        .iter()
        .map(|participant| participant.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let description = format!(
        "survive user / apply user: {names}({}/{})",
        survivors.len(),
        game.applicants.len()
    );
    let message = format!(
        "Game \"{}\" start round {} now, it's your turn to choose, you have {} seconds to consider - host by {}",
        game.id,
        game.round,
        consider_window.as_secs(),
        game.host.name
    );

    survivors
        .into_iter()
        .map(|participant| {
            ChatMessage::GameBroadcast(PrivateNotice {
                game_id: game.id.clone(),
                to: participant.clone(),
                message: message.clone(),
                description: Some(description.clone()),
                created_at: now,
            })
        })
        .collect()
}

/// Announces a game that never gathered two players.
pub fn game_expired(game: &Game, now: i64) -> ChatMessage {
    ChatMessage::GameEnd(notice(
        game,
        format!(
            "The game \"{}\" has expired, not enough players joined.",
            game.id
        ),
        now,
    ))
}

/// Announcement for a resolved round. `game` must already reflect the resolution,
/// so a tie reports the newly opened round number.
pub fn round_result(game: &Game, resolution: &Resolution, now: i64) -> ChatMessage {
    let id = &game.id;
    match &resolution.outcome {
        RoundOutcome::NextRound => ChatMessage::GameNotification(notice(
            game,
            format!(
                "The game \"{id}\" go to next round {}, this round result: {}",
                game.round,
                summary(&resolution.choices)
            ),
            now,
        )),
        RoundOutcome::Finished { reason, winner } => {
            let message = match (reason, winner) {
                (FinishReason::Decided, Some(winner)) => format!(
                    "The game \"{id}\" end now, this round result: {}, {} win!",
                    summary(&resolution.choices),
                    winner.name
                ),
                (FinishReason::OnlyOneChose, _) => {
                    format!("The game \"{id}\" end now, because only one person choose.")
                }
                (FinishReason::LastSurvivor, Some(winner)) => format!(
                    "The game \"{id}\" end now, {} is the last one standing, {} win!",
                    winner.name, winner.name
                ),
                (FinishReason::LastSurvivor, None) => {
                    format!("The game \"{id}\" end now, because no one survived.")
                }
                _ => format!("The game \"{id}\" end now, because no one choose."),
            };
            ChatMessage::GameEnd(notice(game, message, now))
        }
    }
}

fn summary(choices: &[RoundEntry]) -> String {
    choices
        .iter()
        .map(|entry| format!("{} choose {}", entry.user.name, entry.action.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn notice(game: &Game, message: String, now: i64) -> GameNotice {
    GameNotice {
        game_id: game.id.clone(),
        message,
        created_at: now,
    }
}
