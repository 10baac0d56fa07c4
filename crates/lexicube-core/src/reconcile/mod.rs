//! Turn reconciliation reducer.
//!
//! This module is the sole authority for transforming (current destination,
//! incoming match event) into (next destination, outbound commands). It is
//! pure with respect to its inputs: the clock and the board generator are
//! injected through [`ReconcileContext`], never read from ambient state, so
//! a fixed clock and a fixed generator reproduce any reconciliation exactly.
//!
//! # State machine
//!
//! Conceptually per match id (the application tracks only the single match
//! on screen):
//!
//! ```text
//! Idle --Created(no data)--> Viewing(id)      [dismiss + save-turn]
//! *    --TurnReceived(active)--> Viewing(id)  [save-turn iff local turn]
//! *    --TurnReceived(passive)--> (unchanged) [banner iff all guards hold]
//! Viewing(id) --Ended(id)--> Finished(id)     [persist rebuilt game]
//! *    --QuitRequested--> (unchanged)         [end-match command]
//! *    --RematchRequested--> (unchanged)      [rematch command]
//! ```
//!
//! Terminal detection (match ended or any participant outcome recorded)
//! takes precedence over continuing an in-progress view: the reducer always
//! prefers showing the end state over a stale board.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::warn;

use crate::destination::{Destination, GameScreen};
use crate::game::GameState;
use crate::matches::{MatchId, MatchOutcome, MatchSnapshot, PlayerId};
use crate::puzzle::PuzzleGenerator;
use crate::turn_data::{self, TurnData, TurnDataError};

#[cfg(test)]
mod tests;

/// How recent the latest opponent turn must be, in seconds, for a passive
/// update to produce a notification banner.
pub const RECENT_TURN_WINDOW_SECS: i64 = 60;

/// Events delivered by the external match service (plus the rematch user
/// action). A closed enum: every variant is matched exhaustively in
/// [`TurnReducer::apply`], so a new event kind cannot be silently swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// The matchmaker found (or created) a match. Rematch responses also
    /// arrive through this variant.
    Created(MatchSnapshot),

    /// The match's data changed.
    TurnReceived {
        /// The updated snapshot.
        snapshot: MatchSnapshot,
        /// Whether the service asked the application to bring this match to
        /// the foreground.
        became_active: bool,
    },

    /// The match ended.
    Ended(MatchSnapshot),

    /// The local player wants to forfeit this match.
    QuitRequested(MatchSnapshot),

    /// The local player asked for a rematch of a finished match.
    RematchRequested(MatchId),
}

impl MatchEvent {
    /// The match id the event concerns.
    #[must_use]
    pub fn match_id(&self) -> &MatchId {
        match self {
            Self::Created(snapshot)
            | Self::Ended(snapshot)
            | Self::QuitRequested(snapshot)
            | Self::TurnReceived { snapshot, .. } => &snapshot.id,
            Self::RematchRequested(id) => id,
        }
    }
}

/// Outbound commands the reducer asks the runtime to execute against the
/// external collaborators.
///
/// All commands in one batch returned by [`TurnReducer::apply`] are sibling
/// tasks: they carry no mutual ordering guarantee and fail independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Save the current turn's encoded data for the match.
    SaveTurn {
        /// The match to save against.
        match_id: MatchId,
        /// The encoded turn-data blob.
        data: Vec<u8>,
    },

    /// End the match on the local player's turn.
    EndMatchInTurn {
        /// The match to end.
        match_id: MatchId,
        /// The final turn-data blob.
        data: Vec<u8>,
        /// The forfeiting player.
        local_player: PlayerId,
        /// The outcome to record for the local player.
        outcome: MatchOutcome,
        /// The message shown to the other participants.
        message: String,
    },

    /// Dismiss the matchmaker UI.
    DismissMatchmaker,

    /// Show a transient local notification banner.
    ShowBanner {
        /// Banner title.
        title: String,
        /// Optional banner body.
        body: Option<String>,
    },

    /// Request a new match keyed by a finished match's id.
    Rematch(MatchId),

    /// Persist a finished game to local saved-game storage.
    PersistGame(GameState),
}

/// Injected dependencies for one reconciliation step.
pub struct ReconcileContext<'a> {
    /// The current wall-clock time.
    pub now: DateTime<Utc>,

    /// The authenticated local player.
    pub local_player: PlayerId,

    /// Source of fresh boards for newly created matches.
    pub puzzles: &'a mut dyn PuzzleGenerator,
}

/// Errors the reducer can surface to its caller.
///
/// Decode failures never appear here: "no data yet" is an expected state of
/// a fresh match and malformed data is a logged defensive no-op, so both
/// are contained inside the reducer.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Turn data for an outbound command failed to encode.
    #[error("failed to encode turn data for match {match_id}")]
    EncodeTurnData {
        /// The match whose turn data failed to encode.
        match_id: MatchId,
        /// The underlying codec error.
        #[source]
        source: TurnDataError,
    },
}

/// Reducer over match events.
///
/// Owns the current [`Destination`]; `apply` is the only way it changes.
#[derive(Debug, Default)]
pub struct TurnReducer {
    destination: Destination,
}

impl TurnReducer {
    /// Creates a reducer with no active screen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reducer resuming from a known destination.
    #[must_use]
    pub const fn with_destination(destination: Destination) -> Self {
        Self { destination }
    }

    /// The currently active screen.
    #[must_use]
    pub const fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Reconciles one event, returning the commands to execute.
    ///
    /// The destination is updated in place on the success paths described in
    /// the module docs; no error path leaves it partially modified.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::EncodeTurnData`] if an outbound payload
    /// fails to serialize. Decode failures of inbound data are contained.
    pub fn apply(
        &mut self,
        event: &MatchEvent,
        ctx: &mut ReconcileContext<'_>,
    ) -> Result<Vec<Command>, ReconcileError> {
        match event {
            MatchEvent::Created(snapshot) => self.handle_created(snapshot, ctx),
            MatchEvent::TurnReceived {
                snapshot,
                became_active,
            } => self.handle_turn_received(snapshot, *became_active, ctx),
            MatchEvent::Ended(snapshot) => Ok(self.handle_ended(snapshot)),
            MatchEvent::QuitRequested(snapshot) => Ok(Self::handle_quit(snapshot, ctx)),
            MatchEvent::RematchRequested(match_id) => Ok(vec![Command::Rematch(match_id.clone())]),
        }
    }

    /// Matchmaker produced a match. With no recorded turns this starts a
    /// fresh game; with data it is indistinguishable from a became-active
    /// turn event (rematch responses re-enter here).
    fn handle_created(
        &mut self,
        snapshot: &MatchSnapshot,
        ctx: &mut ReconcileContext<'_>,
    ) -> Result<Vec<Command>, ReconcileError> {
        if !snapshot.data.is_empty() {
            return self.handle_turn_received(snapshot, true, ctx);
        }

        let game = GameState::fresh_for_match(snapshot, ctx.local_player.clone(), ctx.puzzles);
        let data = encode_turn(&game, Some(ctx.local_player.clone()), &snapshot.id)?;

        self.destination = Destination::Game(self.screen_carrying_list_state(game));
        Ok(vec![
            Command::DismissMatchmaker,
            Command::SaveTurn {
                match_id: snapshot.id.clone(),
                data,
            },
        ])
    }

    fn handle_turn_received(
        &mut self,
        snapshot: &MatchSnapshot,
        became_active: bool,
        ctx: &mut ReconcileContext<'_>,
    ) -> Result<Vec<Command>, ReconcileError> {
        let decoded = match turn_data::decode(&snapshot.data) {
            Ok(decoded) => decoded,
            // A racing partial update: the match exists but its first turn
            // has not landed yet. Do nothing.
            Err(TurnDataError::NoDataYet) => return Ok(Vec::new()),
            Err(err) => {
                warn!(match_id = %snapshot.id, error = %err, "ignoring undecodable turn data");
                return Ok(Vec::new());
            },
        };

        if became_active {
            self.bring_to_foreground(snapshot, decoded, ctx)
        } else {
            Ok(self.passive_update(snapshot, ctx))
        }
    }

    /// Rebuilds the game screen for a match the player is (re)entering.
    fn bring_to_foreground(
        &mut self,
        snapshot: &MatchSnapshot,
        decoded: TurnData,
        ctx: &mut ReconcileContext<'_>,
    ) -> Result<Vec<Command>, ReconcileError> {
        let mut game = GameState::rebuilt_from_turn(
            snapshot,
            decoded.metadata,
            decoded.game_state,
            ctx.local_player.clone(),
        );

        let mut commands = Vec::new();
        // Terminal detection comes first: an ended match or any recorded
        // outcome always wins over a stale in-progress board.
        if snapshot.is_ended() || snapshot.has_any_outcome() {
            game = game.with_game_over();
        } else if snapshot.is_local_players_turn(&ctx.local_player) {
            if let Some(context) = game.turn_based_context.as_mut() {
                context.metadata.last_opened_at = Some(ctx.now);
            }
            let data = encode_turn(&game, Some(ctx.local_player.clone()), &snapshot.id)?;
            commands.push(Command::SaveTurn {
                match_id: snapshot.id.clone(),
                data,
            });
        }

        self.destination = Destination::Game(self.screen_carrying_list_state(game));
        Ok(commands)
    }

    /// A background data change for a match that is not being brought to the
    /// foreground. Never changes the destination; exists purely to alert the
    /// player to an opponent's move without stealing focus.
    fn passive_update(
        &self,
        snapshot: &MatchSnapshot,
        ctx: &ReconcileContext<'_>,
    ) -> Vec<Command> {
        let already_showing = self.destination.shown_match_id() == Some(&snapshot.id);
        let local_players_turn = snapshot.is_local_players_turn(&ctx.local_player);
        let still_in_progress = !snapshot.has_any_outcome();
        let recent_turn = snapshot.latest_turn_at().is_some_and(|at| {
            ctx.now.signed_duration_since(at) <= Duration::seconds(RECENT_TURN_WINDOW_SECS)
        });

        if already_showing || !local_players_turn || !still_in_progress || !recent_turn {
            return Vec::new();
        }

        vec![Command::ShowBanner {
            title: snapshot.message.clone(),
            body: None,
        }]
    }

    /// The match ended. Only relevant if this match is on screen: its game
    /// is rebuilt with the game-over summary nested and persisted.
    fn handle_ended(&mut self, snapshot: &MatchSnapshot) -> Vec<Command> {
        let Destination::Game(screen) = &self.destination else {
            return Vec::new();
        };
        if screen.game.match_id() != Some(&snapshot.id) {
            return Vec::new();
        }

        let finished = screen.game.clone().with_game_over();
        let next = GameScreen {
            game: finished.clone(),
            active_matches: screen.active_matches.clone(),
            matches_loaded: screen.matches_loaded,
        };
        self.destination = Destination::Game(next);
        vec![Command::PersistGame(finished)]
    }

    /// The local player forfeits. No local transition: the match-ended event
    /// the service sends back drives the actual state change.
    fn handle_quit(snapshot: &MatchSnapshot, ctx: &ReconcileContext<'_>) -> Vec<Command> {
        vec![Command::EndMatchInTurn {
            match_id: snapshot.id.clone(),
            data: snapshot.data.clone(),
            local_player: ctx.local_player.clone(),
            outcome: MatchOutcome::Quit,
            message: format!("{} forfeited the match.", ctx.local_player),
        }]
    }

    /// Wraps a game in a screen, carrying the active-matches list and its
    /// loaded flag over from whatever game screen was showing before.
    fn screen_carrying_list_state(&self, game: GameState) -> GameScreen {
        match &self.destination {
            Destination::Game(prior) => GameScreen {
                game,
                active_matches: prior.active_matches.clone(),
                matches_loaded: prior.matches_loaded,
            },
            Destination::Idle | Destination::GameOver(_) => GameScreen::new(game),
        }
    }
}

/// Encodes a game's turn data, keyed by the metadata its context carries.
fn encode_turn(
    game: &GameState,
    initiator: Option<PlayerId>,
    match_id: &MatchId,
) -> Result<Vec<u8>, ReconcileError> {
    let metadata = game
        .turn_based_context
        .as_ref()
        .map(|ctx| ctx.metadata.clone())
        .unwrap_or_default();
    let data = TurnData::new(metadata, game.clone(), initiator);
    turn_data::encode(&data).map_err(|source| ReconcileError::EncodeTurnData {
        match_id: match_id.clone(),
        source,
    })
}
