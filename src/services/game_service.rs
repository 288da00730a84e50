//! Game lifecycle: hosting, applying, submitting actions and the timed
//! transitions driven by the game scheduler.

use tracing::{debug, info};

use crate::{
    config::GameTimings,
    dao::room::RoomRepository,
    dto::game::{GameView, SubmissionReceipt},
    error::ServiceError,
    services::{
        notifier,
        room_service::{random_code, require_member},
        scheduler,
    },
    state::{
        Session, SharedState,
        game::{Action, Applicant, Game, RoundEntry, duration_ms, now_ms},
        notices,
        resolution::resolve_round,
        state_machine::{GameEvent, GamePhase, plan},
    },
};

const GAME_CODE_LENGTH: usize = 6;

/// What the scheduler should do after evaluating a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The game ended; nothing left to drive.
    Done,
    /// Evaluate again at this epoch millisecond.
    WakeAt(i64),
}

/// Open a new game hosted by the caller.
///
/// Waiting games past their preparation window are expired first. Any game
/// still waiting or playing afterwards blocks the new one.
pub async fn host_game(
    state: &SharedState,
    room_id: &str,
    session: &Session,
) -> Result<GameView, ServiceError> {
    let rooms = state.rooms().await?;
    let timings = *state.config().game();
    let authority = state.room_authority(&rooms, room_id).await?;
    scheduler::resume_room(state, room_id).await;

    let game = authority
        .exclusive(|| async {
            let host = require_member(&rooms, room_id, session).await?;
            let now = now_ms();

            let mut games = load_games(&rooms, room_id).await?;
            for (index, game) in games.iter_mut().enumerate() {
                if GamePhase::of(game) != GamePhase::End {
                    evaluate_loaded(&rooms, room_id, index, game, timings, now).await?;
                }
            }
            if let Some(active) = games
                .iter()
                .find(|game| GamePhase::of(game) != GamePhase::End)
            {
                return Err(ServiceError::GameInProgress(active.id.clone()));
            }

            let game_id = loop {
                let candidate = random_code(GAME_CODE_LENGTH);
                if games.iter().all(|game| game.id != candidate) {
                    break candidate;
                }
            };

            let game = Game::new(game_id, host, now);
            rooms.append_game(room_id, &game.clone().into()).await?;
            notifier::post(&rooms, room_id, notices::game_invite(&game, now)).await?;
            Ok(game)
        })
        .await?;

    info!(room_id, game_id = %game.id, "game hosted");
    scheduler::ensure_scheduled(state, room_id, &game.id);
    Ok(GameView::new(&game, timings.consider_window))
}

/// Join a waiting game.
pub async fn apply_to_game(
    state: &SharedState,
    room_id: &str,
    game_id: &str,
    session: &Session,
) -> Result<GameView, ServiceError> {
    let rooms = state.rooms().await?;
    let timings = *state.config().game();

    let game = state
        .room_authority(&rooms, room_id)
        .await?
        .exclusive(|| async {
            let participant = require_member(&rooms, room_id, session).await?;
            let (index, mut game) = find_game(&rooms, room_id, game_id).await?;
            let now = now_ms();

            if GamePhase::of(&game) != GamePhase::Waiting
                || game.elapsed_ms(now) > duration_ms(timings.preparation_window)
            {
                return Err(ServiceError::GameExpired(game_id.to_owned()));
            }
            if game.applicant(&participant.identity).is_some() {
                return Err(ServiceError::AlreadyApplied(game_id.to_owned()));
            }

            game.applicants.push(Applicant {
                participant: participant.clone(),
                fallen: false,
            });
            rooms.save_game(room_id, index, &game.clone().into()).await?;
            notifier::post(
                &rooms,
                room_id,
                notices::game_joined(&game, &participant, now),
            )
            .await?;
            Ok(game)
        })
        .await?;

    debug!(room_id, game_id, applicants = game.applicants.len(), "applicant admitted");
    scheduler::ensure_scheduled(state, room_id, game_id);
    scheduler::nudge(state, room_id, game_id);
    Ok(GameView::new(&game, timings.consider_window))
}

/// Record the caller's action for the current round.
pub async fn submit_action(
    state: &SharedState,
    room_id: &str,
    game_id: &str,
    session: &Session,
    action: Action,
) -> Result<SubmissionReceipt, ServiceError> {
    let rooms = state.rooms().await?;
    let timings = *state.config().game();

    state
        .room_authority(&rooms, room_id)
        .await?
        .exclusive(|| async {
            require_member(&rooms, room_id, session).await?;
            let (index, game) = find_game(&rooms, room_id, game_id).await?;
            let now = now_ms();

            let expired = || ServiceError::GameExpired(game_id.to_owned());
            if !matches!(GamePhase::of(&game), GamePhase::Playing { .. }) {
                return Err(expired());
            }
            let round_index = game.current_round_index().ok_or_else(expired)?;
            let round = &game.rounds[round_index];
            if round.is_expired(now, timings.consider_window) {
                return Err(expired());
            }

            let applicant = game
                .applicant(&session.identity)
                .ok_or_else(|| ServiceError::NotApplicant(game_id.to_owned()))?;
            if applicant.fallen {
                return Err(ServiceError::Eliminated(game_id.to_owned()));
            }
            if round.entries.contains_key(&session.identity) {
                return Err(ServiceError::AlreadySubmitted {
                    game_id: game_id.to_owned(),
                    round: round.number,
                });
            }

            let entry = RoundEntry {
                user: applicant.participant.clone(),
                action,
            };
            rooms
                .put_round_entry(room_id, index, round_index, &session.identity, &entry.into())
                .await?;
            debug!(room_id, game_id, round = round.number, "action submitted");

            Ok(SubmissionReceipt {
                game_id: game_id.to_owned(),
                round: round.number,
                action: action.into(),
            })
        })
        .await
}

/// Snapshot of one game for a room member.
pub async fn get_game(
    state: &SharedState,
    room_id: &str,
    game_id: &str,
    session: &Session,
) -> Result<GameView, ServiceError> {
    let rooms = state.rooms().await?;
    require_member(&rooms, room_id, session).await?;
    let (_, game) = find_game(&rooms, room_id, game_id).await?;
    Ok(GameView::new(&game, state.config().game().consider_window))
}

/// Start a waiting game as of `now`.
///
/// Fails with [`ServiceError::InvalidState`] before the start delay or with
/// fewer than two applicants standing.
pub async fn start_game_at(
    state: &SharedState,
    room_id: &str,
    game_id: &str,
    now: i64,
) -> Result<GameView, ServiceError> {
    let rooms = state.rooms().await?;
    let timings = *state.config().game();

    state
        .room_authority(&rooms, room_id)
        .await?
        .exclusive(|| async {
            let (index, mut game) = find_game(&rooms, room_id, game_id).await?;
            if game.elapsed_ms(now) < duration_ms(timings.start_delay) {
                return Err(ServiceError::InvalidState(format!(
                    "game `{game_id}` cannot start before its start delay"
                )));
            }
            if game.survivor_count() < 2 {
                return Err(ServiceError::InvalidState(format!(
                    "game `{game_id}` needs at least two applicants to start"
                )));
            }
            start(&rooms, room_id, index, &mut game, timings, now).await?;
            Ok(GameView::new(&game, timings.consider_window))
        })
        .await
}

/// Expire a waiting game that never gathered enough applicants.
pub async fn expire_game_at(
    state: &SharedState,
    room_id: &str,
    game_id: &str,
    now: i64,
) -> Result<GameView, ServiceError> {
    let rooms = state.rooms().await?;
    let timings = *state.config().game();

    state
        .room_authority(&rooms, room_id)
        .await?
        .exclusive(|| async {
            let (index, mut game) = find_game(&rooms, room_id, game_id).await?;
            if game.elapsed_ms(now) <= duration_ms(timings.preparation_window) {
                return Err(ServiceError::InvalidState(format!(
                    "game `{game_id}` is still inside its preparation window"
                )));
            }
            if game.survivor_count() >= 2 {
                return Err(ServiceError::InvalidState(format!(
                    "game `{game_id}` has enough applicants to play"
                )));
            }
            expire(&rooms, room_id, index, &mut game, now).await?;
            Ok(GameView::new(&game, timings.consider_window))
        })
        .await
}

/// Bring a game up to date as of `now`: start or expire it while waiting,
/// resolve its round once the consider window is over.
///
/// Evaluating an unchanged game twice changes nothing the second time.
pub async fn evaluate_game_at(
    state: &SharedState,
    room_id: &str,
    game_id: &str,
    now: i64,
) -> Result<Evaluation, ServiceError> {
    let rooms = state.rooms().await?;
    let timings = *state.config().game();

    state
        .room_authority(&rooms, room_id)
        .await?
        .exclusive(|| async {
            let (index, mut game) = find_game(&rooms, room_id, game_id).await?;
            evaluate_loaded(&rooms, room_id, index, &mut game, timings, now).await
        })
        .await
}

async fn evaluate_loaded(
    rooms: &RoomRepository,
    room_id: &str,
    index: usize,
    game: &mut Game,
    timings: GameTimings,
    now: i64,
) -> Result<Evaluation, ServiceError> {
    match GamePhase::of(game) {
        GamePhase::End => Ok(Evaluation::Done),
        GamePhase::Waiting => {
            let start_at = game.created_at.saturating_add(duration_ms(timings.start_delay));
            let expire_after = game
                .created_at
                .saturating_add(duration_ms(timings.preparation_window));
            let ready = game.survivor_count() >= 2;

            if ready && now >= start_at {
                start(rooms, room_id, index, game, timings, now).await?;
                Ok(next_wake(game, timings))
            } else if !ready && now > expire_after {
                expire(rooms, room_id, index, game, now).await?;
                Ok(Evaluation::Done)
            } else if ready {
                Ok(Evaluation::WakeAt(start_at))
            } else {
                Ok(Evaluation::WakeAt(expire_after.saturating_add(1)))
            }
        }
        GamePhase::Playing { .. } => {
            let round_over = game
                .current_round()
                .is_none_or(|round| round.is_expired(now, timings.consider_window));
            if !round_over {
                return Ok(next_wake(game, timings));
            }
            resolve(rooms, room_id, index, game, timings, now).await?;
            Ok(next_wake(game, timings))
        }
    }
}

async fn start(
    rooms: &RoomRepository,
    room_id: &str,
    index: usize,
    game: &mut Game,
    timings: GameTimings,
    now: i64,
) -> Result<(), ServiceError> {
    let plan = plan(game, GameEvent::Start)?;
    plan.apply(game, now)?;
    rooms.save_game(room_id, index, &game.clone().into()).await?;
    info!(room_id, game_id = %game.id, applicants = game.applicants.len(), "game started");

    announce_round(rooms, room_id, game, timings, now).await
}

async fn expire(
    rooms: &RoomRepository,
    room_id: &str,
    index: usize,
    game: &mut Game,
    now: i64,
) -> Result<(), ServiceError> {
    let plan = plan(game, GameEvent::Expire)?;
    plan.apply(game, now)?;
    rooms.save_game(room_id, index, &game.clone().into()).await?;
    info!(room_id, game_id = %game.id, "game expired before starting");

    notifier::post_once(rooms, room_id, notices::game_expired(game, now)).await?;
    Ok(())
}

async fn resolve(
    rooms: &RoomRepository,
    room_id: &str,
    index: usize,
    game: &mut Game,
    timings: GameTimings,
    now: i64,
) -> Result<(), ServiceError> {
    let resolution = resolve_round(game);
    for fallen in &resolution.surrendered {
        game.mark_fallen(&fallen.identity);
    }

    let plan = plan(game, resolution.event())?;
    let phase = plan.apply(game, now)?;
    rooms.save_game(room_id, index, &game.clone().into()).await?;
    info!(
        room_id,
        game_id = %game.id,
        round = game.round,
        outcome = ?resolution.outcome,
        surrendered = resolution.surrendered.len(),
        "round resolved"
    );

    notifier::post_once(rooms, room_id, notices::round_result(game, &resolution, now)).await?;
    if matches!(phase, GamePhase::Playing { .. }) {
        announce_round(rooms, room_id, game, timings, now).await?;
    }
    Ok(())
}

/// Post the begin notice and the private prompts for the current round.
async fn announce_round(
    rooms: &RoomRepository,
    room_id: &str,
    game: &Game,
    timings: GameTimings,
    now: i64,
) -> Result<(), ServiceError> {
    let mut messages = vec![notices::game_begin(game, now)];
    messages.extend(notices::round_prompts(game, timings.consider_window, now));
    notifier::post_all_once(rooms, room_id, messages).await?;
    Ok(())
}

fn next_wake(game: &Game, timings: GameTimings) -> Evaluation {
    match game.current_round() {
        Some(round) if GamePhase::of(game) != GamePhase::End => {
            Evaluation::WakeAt(round.deadline(timings.consider_window).saturating_add(1))
        }
        _ => Evaluation::Done,
    }
}

async fn load_games(rooms: &RoomRepository, room_id: &str) -> Result<Vec<Game>, ServiceError> {
    Ok(rooms
        .load_games(room_id)
        .await?
        .into_iter()
        .map(Game::from)
        .collect())
}

/// Locate a game and its position in the room's game list.
async fn find_game(
    rooms: &RoomRepository,
    room_id: &str,
    game_id: &str,
) -> Result<(usize, Game), ServiceError> {
    let games = load_games(rooms, room_id).await?;
    if let Some(found) = games.into_iter().enumerate().find(|(_, game)| game.id == game_id) {
        return Ok(found);
    }

    if rooms.exists(room_id).await? {
        Err(ServiceError::GameNotFound(game_id.to_owned()))
    } else {
        Err(ServiceError::RoomNotFound(room_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::MemoryRoomStore,
        dto::{chat::ChatKind, game::ActionChoice, phase::VisibleGamePhase},
        services::room_service,
        state::AppState,
    };

    const START_DELAY_MS: i64 = 60_000;
    const PREPARATION_MS: i64 = 120_000;
    const CONSIDER_MS: i64 = 10_000;

    struct Table {
        state: SharedState,
        room_id: String,
        players: Vec<Session>,
        game_id: String,
        created_at: i64,
    }

    /// Room with one host and `guests`, a hosted game every player applied to.
    async fn table(guests: &[&str]) -> Table {
        let state = AppState::with_store(
            AppConfig::new(GameTimings::default()),
            Arc::new(MemoryRoomStore::in_memory()),
        )
        .await;
        let host = room_service::create_room(&state, "Hana", None).await.unwrap();
        let room_id = host.room_id.clone();
        let mut players = vec![Session::new(&host.identity)];
        for name in guests {
            let ticket = room_service::join_room(&state, &room_id, name, None)
                .await
                .unwrap();
            players.push(Session::new(&ticket.identity));
        }

        let game = host_game(&state, &room_id, &players[0]).await.unwrap();
        for player in &players[1..] {
            apply_to_game(&state, &room_id, &game.game_id, player)
                .await
                .unwrap();
        }

        Table {
            state,
            room_id,
            players,
            game_id: game.game_id,
            created_at: game.created_at,
        }
    }

    impl Table {
        async fn start(&self) -> i64 {
            let at = self.created_at + START_DELAY_MS;
            let view = start_game_at(&self.state, &self.room_id, &self.game_id, at)
                .await
                .unwrap();
            assert_eq!(view.round, 1);
            at
        }

        async fn submit(&self, player: usize, action: Action) -> Result<SubmissionReceipt, ServiceError> {
            submit_action(
                &self.state,
                &self.room_id,
                &self.game_id,
                &self.players[player],
                action,
            )
            .await
        }

        async fn evaluate(&self, now: i64) -> Evaluation {
            evaluate_game_at(&self.state, &self.room_id, &self.game_id, now)
                .await
                .unwrap()
        }

        async fn view(&self) -> GameView {
            get_game(&self.state, &self.room_id, &self.game_id, &self.players[0])
                .await
                .unwrap()
        }

        async fn chat_kinds(&self, player: usize) -> Vec<ChatKind> {
            room_service::get_room(&self.state, &self.room_id, &self.players[player])
                .await
                .unwrap()
                .chat
                .into_iter()
                .map(|entry| entry.kind)
                .collect()
        }
    }

    impl Table {
        async fn chat_of(&self, player: usize, kind: ChatKind) -> Vec<String> {
            room_service::get_room(&self.state, &self.room_id, &self.players[player])
                .await
                .unwrap()
                .chat
                .into_iter()
                .filter(|entry| entry.kind == kind)
                .map(|entry| entry.message)
                .collect()
        }
    }

    fn count(kinds: &[ChatKind], kind: ChatKind) -> usize {
        kinds.iter().filter(|candidate| **candidate == kind).count()
    }

    #[tokio::test]
    async fn two_equal_winners_open_a_new_round() {
        let table = table(&["Bob", "Cleo"]).await;
        let started = table.start().await;
        table.submit(0, Action::Stone).await.unwrap();
        table.submit(1, Action::Stone).await.unwrap();
        table.submit(2, Action::Scissors).await.unwrap();

        let wake = table.evaluate(started + CONSIDER_MS + 1).await;
        let view = table.view().await;
        assert_eq!(view.phase, VisibleGamePhase::Playing);
        assert_eq!(view.round, 2);
        assert_eq!(view.winner, None);
        assert_eq!(wake, Evaluation::WakeAt(started + 2 * CONSIDER_MS + 2));
        assert_eq!(view.rounds[0].entries.len(), 3);
        assert!(view.rounds[1].entries.is_empty());
        table.state.shutdown();
    }

    #[tokio::test]
    async fn beaten_action_ends_the_game() {
        let table = table(&["Bob"]).await;
        let started = table.start().await;
        table.submit(0, Action::Paper).await.unwrap();
        table.submit(1, Action::Stone).await.unwrap();

        assert_eq!(table.evaluate(started + CONSIDER_MS + 1).await, Evaluation::Done);
        let view = table.view().await;
        assert_eq!(view.phase, VisibleGamePhase::End);
        assert_eq!(view.winner.as_deref(), Some("Hana"));
        let bob = view.rounds[0]
            .entries
            .iter()
            .find(|entry| entry.name == "Bob")
            .unwrap();
        assert_eq!(bob.action, Some(ActionChoice::Stone));
        let ends = table.chat_of(0, ChatKind::GameEnd).await;
        assert_eq!(
            ends,
            vec![format!(
                "The game \"{}\" end now, this round result: Hana choose Paper 🖐️, Bob choose Stone ✊, Hana win!",
                table.game_id
            )]
        );
        table.state.shutdown();
    }

    #[tokio::test]
    async fn three_distinct_actions_tie_without_elimination() {
        let table = table(&["Bob", "Cleo"]).await;
        let started = table.start().await;
        table.submit(0, Action::Stone).await.unwrap();
        table.submit(1, Action::Paper).await.unwrap();
        table.submit(2, Action::Scissors).await.unwrap();

        table.evaluate(started + CONSIDER_MS + 1).await;
        let view = table.view().await;
        assert_eq!(view.round, 2);
        assert!(view.applicants.iter().all(|applicant| !applicant.fallen));
        table.state.shutdown();
    }

    #[tokio::test]
    async fn lone_submitter_wins() {
        let table = table(&["Bob"]).await;
        let started = table.start().await;
        table.submit(1, Action::Scissors).await.unwrap();

        assert_eq!(table.evaluate(started + CONSIDER_MS + 1).await, Evaluation::Done);
        assert_eq!(table.view().await.winner.as_deref(), Some("Bob"));
        table.state.shutdown();
    }

    #[tokio::test]
    async fn surrender_eliminates_and_the_rest_still_resolve() {
        let table = table(&["Bob", "Cleo"]).await;
        let started = table.start().await;
        table.submit(0, Action::Surrender).await.unwrap();
        table.submit(1, Action::Stone).await.unwrap();
        table.submit(2, Action::Paper).await.unwrap();

        table.evaluate(started + CONSIDER_MS + 1).await;
        let view = table.view().await;
        assert_eq!(view.phase, VisibleGamePhase::End);
        assert_eq!(view.winner.as_deref(), Some("Cleo"));
        assert!(view.applicants[0].fallen);
        assert!(!view.applicants[1].fallen);
        table.state.shutdown();
    }

    #[tokio::test]
    async fn submissions_are_checked_in_order() {
        let table = table(&["Bob"]).await;
        assert!(matches!(
            table.submit(0, Action::Stone).await,
            Err(ServiceError::GameExpired(_))
        ));

        table.start().await;
        let receipt = table.submit(0, Action::Stone).await.unwrap();
        assert_eq!(receipt.round, 1);
        assert!(matches!(
            table.submit(0, Action::Paper).await,
            Err(ServiceError::AlreadySubmitted { round: 1, .. })
        ));

        let outsider = room_service::join_room(&table.state, &table.room_id, "Dora", None)
            .await
            .unwrap();
        let result = submit_action(
            &table.state,
            &table.room_id,
            &table.game_id,
            &Session::new(&outsider.identity),
            Action::Stone,
        )
        .await;
        assert!(matches!(result, Err(ServiceError::NotApplicant(_))));
        table.state.shutdown();
    }

    #[tokio::test]
    async fn fallen_applicant_cannot_submit_again() {
        let table = table(&["Bob", "Cleo"]).await;
        let started = table.start().await;
        table.submit(0, Action::Surrender).await.unwrap();
        table.submit(1, Action::Stone).await.unwrap();
        table.submit(2, Action::Stone).await.unwrap();

        table.evaluate(started + CONSIDER_MS + 1).await;
        assert_eq!(table.view().await.round, 2);
        assert!(matches!(
            table.submit(0, Action::Paper).await,
            Err(ServiceError::Eliminated(_))
        ));
        table.state.shutdown();
    }

    #[tokio::test]
    async fn start_needs_delay_and_two_applicants() {
        let table = table(&[]).await;
        let early = start_game_at(
            &table.state,
            &table.room_id,
            &table.game_id,
            table.created_at + START_DELAY_MS - 1,
        )
        .await;
        assert!(matches!(early, Err(ServiceError::InvalidState(_))));

        let alone = start_game_at(
            &table.state,
            &table.room_id,
            &table.game_id,
            table.created_at + START_DELAY_MS,
        )
        .await;
        assert!(matches!(alone, Err(ServiceError::InvalidState(_))));
        table.state.shutdown();
    }

    #[tokio::test]
    async fn unattended_game_expires_once() {
        let table = table(&[]).await;
        let inside = table.created_at + PREPARATION_MS;
        assert_eq!(table.evaluate(inside).await, Evaluation::WakeAt(inside + 1));

        assert_eq!(table.evaluate(inside + 1).await, Evaluation::Done);
        assert_eq!(table.evaluate(inside + 2).await, Evaluation::Done);
        assert_eq!(table.view().await.phase, VisibleGamePhase::End);
        assert_eq!(count(&table.chat_kinds(0).await, ChatKind::GameEnd), 1);

        let again = expire_game_at(&table.state, &table.room_id, &table.game_id, inside + 5).await;
        assert!(matches!(again, Err(ServiceError::InvalidState(_))));
        table.state.shutdown();
    }

    #[tokio::test]
    async fn repeated_evaluation_posts_each_notice_once() {
        let table = table(&["Bob"]).await;
        let started = table.start().await;
        table.evaluate(started).await;
        let kinds = table.chat_kinds(0).await;
        assert_eq!(count(&kinds, ChatKind::GameStart), 1);
        assert_eq!(count(&kinds, ChatKind::GameBroadcast), 1);

        table.submit(0, Action::Stone).await.unwrap();
        table.submit(1, Action::Stone).await.unwrap();
        let deadline = started + CONSIDER_MS + 1;
        table.evaluate(deadline).await;
        table.evaluate(deadline).await;

        let kinds = table.chat_kinds(1).await;
        assert_eq!(count(&kinds, ChatKind::GameNotification), 1);
        assert_eq!(count(&kinds, ChatKind::GameStart), 1);
        assert_eq!(count(&kinds, ChatKind::GameBroadcast), 2);
        assert_eq!(table.view().await.round, 2);
        table.state.shutdown();
    }

    #[tokio::test]
    async fn second_game_waits_for_the_first() {
        let table = table(&["Bob"]).await;
        let blocked = host_game(&table.state, &table.room_id, &table.players[1]).await;
        assert!(matches!(blocked, Err(ServiceError::GameInProgress(_))));

        let again = apply_to_game(&table.state, &table.room_id, &table.game_id, &table.players[1]).await;
        assert!(matches!(again, Err(ServiceError::AlreadyApplied(_))));
        table.state.shutdown();
    }

    #[tokio::test]
    async fn unknown_rooms_get_no_authority() {
        let table = table(&[]).await;
        let before = table.state.authority_count();

        let hosted = host_game(&table.state, "nope0", &table.players[0]).await;
        assert!(matches!(hosted, Err(ServiceError::RoomNotFound(_))));
        let applied = apply_to_game(&table.state, "nope1", "g", &table.players[0]).await;
        assert!(matches!(applied, Err(ServiceError::RoomNotFound(_))));
        let submitted =
            submit_action(&table.state, "nope2", "g", &table.players[0], Action::Stone).await;
        assert!(matches!(submitted, Err(ServiceError::RoomNotFound(_))));
        let evaluated = evaluate_game_at(&table.state, "nope3", "g", 0).await;
        assert!(matches!(evaluated, Err(ServiceError::RoomNotFound(_))));

        assert_eq!(table.state.authority_count(), before);
        table.state.shutdown();
    }
}
