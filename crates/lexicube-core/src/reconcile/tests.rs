//! Tests for the turn reconciliation reducer.
//!
//! Every transition and every banner guard from the reducer's state machine
//! is covered here with a fixed clock and a fixed board generator, so each
//! assertion is against a fully reproducible reconciliation.

use chrono::{Duration, TimeZone};

use super::*;
use crate::game::{GameMode, MatchMetadata};
use crate::matches::{MatchStatus, Participant};
use crate::puzzle::{FixedPuzzleGenerator, PuzzleGenerator, SeededPuzzleGenerator};

// ============================================================================
// Fixtures
// ============================================================================

const LOCAL: &str = "player-local";
const OPPONENT: &str = "player-opponent";

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn fixed_board() -> crate::puzzle::Puzzle {
    SeededPuzzleGenerator::new(99).generate()
}

fn fixed_generator() -> FixedPuzzleGenerator {
    FixedPuzzleGenerator::new(fixed_board())
}

fn snapshot(id: &str) -> MatchSnapshot {
    MatchSnapshot {
        id: MatchId::from(id),
        participants: vec![
            Participant::seated(PlayerId::from(LOCAL)),
            Participant::seated(PlayerId::from(OPPONENT)),
        ],
        current_participant: Some(0),
        data: Vec::new(),
        created_at: t0(),
        status: MatchStatus::Active,
        message: "They just played a word!".to_string(),
    }
}

/// Encodes a plausible first-turn blob for the given snapshot.
fn encoded_turn_for(snapshot: &MatchSnapshot) -> Vec<u8> {
    let mut puzzles = fixed_generator();
    let game = GameState::fresh_for_match(snapshot, PlayerId::from(LOCAL), &mut puzzles);
    let mut metadata = MatchMetadata::default();
    metadata
        .player_index_to_id
        .insert(0, PlayerId::from(LOCAL));
    metadata
        .player_index_to_id
        .insert(1, PlayerId::from(OPPONENT));
    turn_data::encode(&TurnData::new(metadata, game, Some(PlayerId::from(OPPONENT)))).unwrap()
}

/// Applies one event against a reducer with a fixed clock and board.
fn apply_at(
    reducer: &mut TurnReducer,
    event: &MatchEvent,
    now: DateTime<Utc>,
) -> Vec<Command> {
    let mut puzzles = fixed_generator();
    let mut ctx = ReconcileContext {
        now,
        local_player: PlayerId::from(LOCAL),
        puzzles: &mut puzzles,
    };
    reducer.apply(event, &mut ctx).unwrap()
}

fn viewing(reducer: &TurnReducer, id: &str) -> bool {
    reducer.destination().shown_match_id() == Some(&MatchId::from(id))
}

// ============================================================================
// Match created with no data
// ============================================================================

#[test]
fn test_created_empty_blob_starts_fresh_game() {
    let mut reducer = TurnReducer::new();
    apply_at(&mut reducer, &MatchEvent::Created(snapshot("m1")), t0());

    let screen = reducer.destination().game().expect("game screen active");
    assert_eq!(screen.game.started_at, t0());
    assert_eq!(screen.game.mode, GameMode::Unlimited);
    assert_eq!(screen.game.puzzle, fixed_board());
    assert!(screen.game.game_over.is_none());

    let context = screen.game.turn_based_context.as_ref().unwrap();
    assert!(context.metadata.player_index_to_id.is_empty());
    assert_eq!(context.match_id, MatchId::from("m1"));
}

#[test]
fn test_created_empty_blob_emits_dismiss_and_save_pair() {
    let mut reducer = TurnReducer::new();
    let commands = apply_at(&mut reducer, &MatchEvent::Created(snapshot("m1")), t0());

    assert_eq!(commands.len(), 2);
    assert!(commands.contains(&Command::DismissMatchmaker));

    let save = commands
        .iter()
        .find_map(|c| match c {
            Command::SaveTurn { match_id, data } => Some((match_id, data)),
            _ => None,
        })
        .expect("exactly one save-turn command");
    assert_eq!(save.0, &MatchId::from("m1"));

    // The saved payload decodes back to a game for this match, initiated by
    // the local player.
    let decoded = turn_data::decode(save.1).unwrap();
    assert_eq!(
        decoded.game_state.match_id(),
        Some(&MatchId::from("m1"))
    );
    assert_eq!(decoded.initiator, Some(PlayerId::from(LOCAL)));
    assert!(decoded.metadata.player_index_to_id.is_empty());
}

#[test]
fn test_created_with_data_enters_as_became_active() {
    let mut snapshot = snapshot("m1");
    snapshot.data = encoded_turn_for(&snapshot);

    let mut reducer = TurnReducer::new();
    let commands = apply_at(&mut reducer, &MatchEvent::Created(snapshot), t0());

    // A ready snapshot is a foreground entry, not a fresh-match creation:
    // no matchmaker to dismiss.
    assert!(!commands.contains(&Command::DismissMatchmaker));
    assert!(viewing(&reducer, "m1"));
}

// ============================================================================
// Turn received: decode outcomes
// ============================================================================

#[test]
fn test_turn_received_no_data_yet_is_a_noop() {
    let mut reducer = TurnReducer::new();
    apply_at(&mut reducer, &MatchEvent::Created(snapshot("shown")), t0());
    let before = reducer.destination().clone();

    let event = MatchEvent::TurnReceived {
        snapshot: snapshot("m2"),
        became_active: true,
    };
    let commands = apply_at(&mut reducer, &event, t0());

    assert!(commands.is_empty());
    assert_eq!(reducer.destination(), &before);
}

#[test]
fn test_turn_received_malformed_is_a_noop() {
    let mut reducer = TurnReducer::new();
    apply_at(&mut reducer, &MatchEvent::Created(snapshot("shown")), t0());
    let before = reducer.destination().clone();

    let mut bad = snapshot("m2");
    bad.data = b"definitely not turn data".to_vec();
    let event = MatchEvent::TurnReceived {
        snapshot: bad,
        became_active: true,
    };
    let commands = apply_at(&mut reducer, &event, t0());

    assert!(commands.is_empty());
    assert_eq!(reducer.destination(), &before);
}

// ============================================================================
// Turn received: became active
// ============================================================================

#[test]
fn test_became_active_in_progress_never_nests_game_over() {
    let mut snapshot = snapshot("m1");
    snapshot.data = encoded_turn_for(&snapshot);

    let mut reducer = TurnReducer::new();
    apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot,
            became_active: true,
        },
        t0(),
    );

    let screen = reducer.destination().game().unwrap();
    assert!(screen.game.game_over.is_none());
}

#[test]
fn test_became_active_on_local_turn_bumps_last_opened_and_saves() {
    let mut snapshot = snapshot("m1");
    snapshot.data = encoded_turn_for(&snapshot);
    let now = t0() + Duration::minutes(5);

    let mut reducer = TurnReducer::new();
    let commands = apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot,
            became_active: true,
        },
        now,
    );

    assert_eq!(commands.len(), 1);
    let Command::SaveTurn { match_id, data } = &commands[0] else {
        panic!("expected save-turn, got {commands:?}");
    };
    assert_eq!(match_id, &MatchId::from("m1"));

    let decoded = turn_data::decode(data).unwrap();
    assert_eq!(decoded.metadata.last_opened_at, Some(now));

    let screen = reducer.destination().game().unwrap();
    let metadata = &screen.game.turn_based_context.as_ref().unwrap().metadata;
    assert_eq!(metadata.last_opened_at, Some(now));
}

#[test]
fn test_became_active_on_opponents_turn_saves_nothing() {
    let mut snapshot = snapshot("m1");
    snapshot.data = encoded_turn_for(&snapshot);
    snapshot.current_participant = Some(1);

    let mut reducer = TurnReducer::new();
    let commands = apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot,
            became_active: true,
        },
        t0(),
    );

    assert!(commands.is_empty());
    assert!(viewing(&reducer, "m1"));
}

#[test]
fn test_became_active_ended_match_nests_game_over_without_saving() {
    let mut snapshot = snapshot("m1");
    snapshot.data = encoded_turn_for(&snapshot);
    snapshot.status = MatchStatus::Ended;

    let mut reducer = TurnReducer::new();
    let commands = apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot,
            became_active: true,
        },
        t0(),
    );

    assert!(commands.is_empty());
    let screen = reducer.destination().game().unwrap();
    assert!(screen.game.game_over.is_some());
}

#[test]
fn test_became_active_with_recorded_outcome_nests_game_over() {
    // Status still says active, but an outcome is already recorded: the
    // terminal short-circuit must win even on the local player's turn.
    let mut snapshot = snapshot("m1");
    snapshot.data = encoded_turn_for(&snapshot);
    snapshot.participants[1].outcome = Some(MatchOutcome::Quit);

    let mut reducer = TurnReducer::new();
    let commands = apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot,
            became_active: true,
        },
        t0(),
    );

    assert!(commands.is_empty());
    let screen = reducer.destination().game().unwrap();
    let game_over = screen.game.game_over.as_ref().unwrap();
    assert_eq!(
        game_over
            .turn_based_context
            .as_ref()
            .map(|ctx| ctx.match_id.clone()),
        Some(MatchId::from("m1"))
    );
}

#[test]
fn test_became_active_preserves_active_matches_list() {
    let mut reducer = TurnReducer::new();
    apply_at(&mut reducer, &MatchEvent::Created(snapshot("old")), t0());

    // Simulate the list having been loaded on the prior screen.
    let loaded_screen = {
        let mut screen = reducer.destination().game().unwrap().clone();
        screen.active_matches = vec![snapshot("old"), snapshot("other")];
        screen.matches_loaded = true;
        screen
    };
    let mut reducer = TurnReducer::with_destination(Destination::Game(loaded_screen));

    let mut incoming = snapshot("new");
    incoming.data = encoded_turn_for(&incoming);
    apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot: incoming,
            became_active: true,
        },
        t0(),
    );

    let screen = reducer.destination().game().unwrap();
    assert!(viewing(&reducer, "new"));
    assert_eq!(screen.active_matches.len(), 2);
    assert!(screen.matches_loaded);
}

// ============================================================================
// Turn received: passive background update
// ============================================================================

fn passive_snapshot(id: &str, last_turn: DateTime<Utc>) -> MatchSnapshot {
    let mut snapshot = snapshot(id);
    snapshot.data = encoded_turn_for(&snapshot);
    snapshot.participants[1].last_turn_at = Some(last_turn);
    snapshot
}

#[test]
fn test_passive_update_with_all_guards_met_shows_banner_only() {
    let now = t0() + Duration::seconds(10);
    let mut reducer = TurnReducer::new();
    let event = MatchEvent::TurnReceived {
        snapshot: passive_snapshot("m1", t0()),
        became_active: false,
    };
    let commands = apply_at(&mut reducer, &event, now);

    assert_eq!(
        commands,
        vec![Command::ShowBanner {
            title: "They just played a word!".to_string(),
            body: None,
        }]
    );
    assert_eq!(reducer.destination(), &Destination::Idle);
}

#[test]
fn test_passive_update_suppressed_when_already_showing_match() {
    let now = t0() + Duration::seconds(10);
    let mut reducer = TurnReducer::new();
    apply_at(&mut reducer, &MatchEvent::Created(snapshot("m1")), t0());
    let before = reducer.destination().clone();

    let event = MatchEvent::TurnReceived {
        snapshot: passive_snapshot("m1", t0()),
        became_active: false,
    };
    let commands = apply_at(&mut reducer, &event, now);

    assert!(commands.is_empty());
    assert_eq!(reducer.destination(), &before);
}

#[test]
fn test_passive_update_suppressed_on_opponents_turn() {
    let now = t0() + Duration::seconds(10);
    let mut snapshot = passive_snapshot("m1", t0());
    snapshot.current_participant = Some(1);

    let mut reducer = TurnReducer::new();
    let commands = apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot,
            became_active: false,
        },
        now,
    );
    assert!(commands.is_empty());
}

#[test]
fn test_passive_update_suppressed_once_any_outcome_is_recorded() {
    let now = t0() + Duration::seconds(10);
    let mut snapshot = passive_snapshot("m1", t0());
    snapshot.participants[1].outcome = Some(MatchOutcome::Won);

    let mut reducer = TurnReducer::new();
    let commands = apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot,
            became_active: false,
        },
        now,
    );
    assert!(commands.is_empty());
    assert_eq!(reducer.destination(), &Destination::Idle);
}

#[test]
fn test_passive_update_suppressed_when_turn_is_stale() {
    // Latest turn 120 seconds ago: outside the 60-second window.
    let now = t0() + Duration::seconds(120);
    let mut reducer = TurnReducer::new();
    let event = MatchEvent::TurnReceived {
        snapshot: passive_snapshot("m1", t0()),
        became_active: false,
    };
    let commands = apply_at(&mut reducer, &event, now);

    assert!(commands.is_empty());
    assert_eq!(reducer.destination(), &Destination::Idle);
}

#[test]
fn test_passive_update_at_exact_window_boundary_still_banners() {
    let now = t0() + Duration::seconds(RECENT_TURN_WINDOW_SECS);
    let mut reducer = TurnReducer::new();
    let event = MatchEvent::TurnReceived {
        snapshot: passive_snapshot("m1", t0()),
        became_active: false,
    };
    let commands = apply_at(&mut reducer, &event, now);
    assert_eq!(commands.len(), 1);
}

#[test]
fn test_passive_update_suppressed_with_no_turn_timestamps() {
    let mut snapshot = snapshot("m1");
    snapshot.data = encoded_turn_for(&snapshot);

    let mut reducer = TurnReducer::new();
    let commands = apply_at(
        &mut reducer,
        &MatchEvent::TurnReceived {
            snapshot,
            became_active: false,
        },
        t0(),
    );
    assert!(commands.is_empty());
}

// ============================================================================
// Match ended
// ============================================================================

#[test]
fn test_ended_for_shown_match_nests_game_over_and_persists() {
    let mut reducer = TurnReducer::new();
    apply_at(&mut reducer, &MatchEvent::Created(snapshot("m1")), t0());

    let mut ended = snapshot("m1");
    ended.status = MatchStatus::Ended;
    let commands = apply_at(&mut reducer, &MatchEvent::Ended(ended), t0());

    let screen = reducer.destination().game().unwrap();
    assert!(screen.game.game_over.is_some());

    assert_eq!(commands.len(), 1);
    let Command::PersistGame(persisted) = &commands[0] else {
        panic!("expected persist-game, got {commands:?}");
    };
    assert!(persisted.game_over.is_some());
    assert_eq!(persisted.match_id(), Some(&MatchId::from("m1")));
}

#[test]
fn test_ended_for_other_match_changes_nothing() {
    let mut reducer = TurnReducer::new();
    apply_at(&mut reducer, &MatchEvent::Created(snapshot("m1")), t0());
    let before = reducer.destination().clone();

    let mut ended = snapshot("m2");
    ended.status = MatchStatus::Ended;
    let commands = apply_at(&mut reducer, &MatchEvent::Ended(ended), t0());

    assert!(commands.is_empty());
    assert_eq!(reducer.destination(), &before);
}

#[test]
fn test_ended_with_nothing_on_screen_changes_nothing() {
    let mut reducer = TurnReducer::new();
    let mut ended = snapshot("m1");
    ended.status = MatchStatus::Ended;
    let commands = apply_at(&mut reducer, &MatchEvent::Ended(ended), t0());

    assert!(commands.is_empty());
    assert_eq!(reducer.destination(), &Destination::Idle);
}

// ============================================================================
// Quit and rematch
// ============================================================================

#[test]
fn test_quit_emits_end_match_without_local_transition() {
    let mut reducer = TurnReducer::new();
    apply_at(&mut reducer, &MatchEvent::Created(snapshot("m1")), t0());
    let before = reducer.destination().clone();

    let mut quitting = snapshot("m1");
    quitting.data = encoded_turn_for(&quitting);
    let expected_data = quitting.data.clone();
    let commands = apply_at(&mut reducer, &MatchEvent::QuitRequested(quitting), t0());

    assert_eq!(commands.len(), 1);
    let Command::EndMatchInTurn {
        match_id,
        data,
        local_player,
        outcome,
        message,
    } = &commands[0]
    else {
        panic!("expected end-match-in-turn, got {commands:?}");
    };
    assert_eq!(match_id, &MatchId::from("m1"));
    assert_eq!(data, &expected_data);
    assert_eq!(local_player, &PlayerId::from(LOCAL));
    assert_eq!(*outcome, MatchOutcome::Quit);
    assert!(message.contains("forfeited"));

    // The later match-ended event drives the transition, not the quit.
    assert_eq!(reducer.destination(), &before);
}

#[test]
fn test_rematch_request_emits_command_only() {
    let finished = {
        let mut puzzles = fixed_generator();
        let game = GameState::fresh_for_match(&snapshot("m1"), PlayerId::from(LOCAL), &mut puzzles)
            .with_game_over();
        game.game_over.unwrap()
    };
    let mut reducer = TurnReducer::with_destination(Destination::GameOver(finished));
    let before = reducer.destination().clone();

    let commands = apply_at(
        &mut reducer,
        &MatchEvent::RematchRequested(MatchId::from("m1")),
        t0(),
    );

    assert_eq!(commands, vec![Command::Rematch(MatchId::from("m1"))]);
    assert_eq!(reducer.destination(), &before);
}

// ============================================================================
// Event plumbing
// ============================================================================

#[test]
fn test_event_match_id_covers_every_variant() {
    let id = MatchId::from("m1");
    let events = [
        MatchEvent::Created(snapshot("m1")),
        MatchEvent::TurnReceived {
            snapshot: snapshot("m1"),
            became_active: false,
        },
        MatchEvent::Ended(snapshot("m1")),
        MatchEvent::QuitRequested(snapshot("m1")),
        MatchEvent::RematchRequested(id.clone()),
    ];
    for event in &events {
        assert_eq!(event.match_id(), &id);
    }
}
