//! Game state, turn-based context, and completion snapshots.
//!
//! A game either runs solo (no turn-based context) or was materialized from
//! a match snapshot, in which case it carries a [`TurnBasedContext`] naming
//! the match and the local player. Reconciliation replaces game state
//! wholesale; nothing here mutates a match.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matches::{MatchId, MatchSnapshot, PlayerId};
use crate::puzzle::{Puzzle, PuzzleGenerator};

/// Play mode for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Fixed-length timed game.
    Timed,
    /// No timer; the mode used for turn-based multiplayer matches.
    Unlimited,
}

/// A word played on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedWord {
    /// The word spelled.
    pub word: String,

    /// Score awarded for the word.
    pub score: u32,

    /// When the word was played.
    pub played_at: DateTime<Utc>,

    /// Seat index of the player who played it, if multiplayer.
    pub player_index: Option<u8>,
}

/// Application metadata layered on top of a match snapshot.
///
/// The player-index map is a `BTreeMap` so encoded turn data is byte-stable
/// across retries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// When the local player last opened this match.
    pub last_opened_at: Option<DateTime<Utc>>,

    /// Mapping from seat index to player identifier, filled in as
    /// participants take their first turn.
    pub player_index_to_id: BTreeMap<u8, PlayerId>,
}

/// Identifies the match a multiplayer game belongs to and who is playing it
/// locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnBasedContext {
    /// The local player.
    pub local_player: PlayerId,

    /// The match this game was materialized from.
    pub match_id: MatchId,

    /// Metadata layered on the match snapshot.
    pub metadata: MatchMetadata,
}

/// A finished game, frozen for the game-over screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedGame {
    /// The board as last played.
    pub puzzle: Puzzle,

    /// The mode the game was played in.
    pub mode: GameMode,

    /// When the game started.
    pub started_at: DateTime<Utc>,

    /// All words played, in order.
    pub moves: Vec<PlayedWord>,
}

/// State of the game-over screen, nested inside a finished game or shown
/// standalone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverState {
    /// The finished game being summarized.
    pub completed_game: CompletedGame,

    /// Whether this summary is for a demo game.
    pub is_demo: bool,

    /// The turn-based context, when the game came from a match.
    pub turn_based_context: Option<TurnBasedContext>,
}

/// The full state of a game in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// The board.
    pub puzzle: Puzzle,

    /// Play mode.
    pub mode: GameMode,

    /// When the game started.
    pub started_at: DateTime<Utc>,

    /// Words played so far.
    pub moves: Vec<PlayedWord>,

    /// Present when the game was materialized from a match.
    pub turn_based_context: Option<TurnBasedContext>,

    /// The nested game-over sub-destination, set once the game is terminal.
    pub game_over: Option<GameOverState>,
}

impl GameState {
    /// Creates a fresh multiplayer game for a match with no recorded turns.
    ///
    /// Start time is the match creation date and the player-index map starts
    /// empty; the board comes from the injected generator.
    #[must_use]
    pub fn fresh_for_match(
        snapshot: &MatchSnapshot,
        local_player: PlayerId,
        puzzles: &mut dyn PuzzleGenerator,
    ) -> Self {
        Self {
            puzzle: puzzles.generate(),
            mode: GameMode::Unlimited,
            started_at: snapshot.created_at,
            moves: Vec::new(),
            turn_based_context: Some(TurnBasedContext {
                local_player,
                match_id: snapshot.id.clone(),
                metadata: MatchMetadata::default(),
            }),
            game_over: None,
        }
    }

    /// Rebuilds a game from decoded turn data against a newer match
    /// snapshot, rebinding the context to the local player.
    #[must_use]
    pub fn rebuilt_from_turn(
        snapshot: &MatchSnapshot,
        metadata: MatchMetadata,
        decoded: Self,
        local_player: PlayerId,
    ) -> Self {
        Self {
            turn_based_context: Some(TurnBasedContext {
                local_player,
                match_id: snapshot.id.clone(),
                metadata,
            }),
            game_over: None,
            ..decoded
        }
    }

    /// Freezes the game into a completed-game snapshot.
    #[must_use]
    pub fn completed(&self) -> CompletedGame {
        CompletedGame {
            puzzle: self.puzzle.clone(),
            mode: self.mode,
            started_at: self.started_at,
            moves: self.moves.clone(),
        }
    }

    /// Nests a game-over sub-destination built from the current state.
    #[must_use]
    pub fn with_game_over(mut self) -> Self {
        let game_over = GameOverState {
            completed_game: self.completed(),
            is_demo: false,
            turn_based_context: self.turn_based_context.clone(),
        };
        self.game_over = Some(game_over);
        self
    }

    /// Returns the match id from the turn-based context, if any.
    #[must_use]
    pub fn match_id(&self) -> Option<&MatchId> {
        self.turn_based_context.as_ref().map(|ctx| &ctx.match_id)
    }

    /// Total score across all played words.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.moves.iter().map(|m| m.score).sum()
    }
}
