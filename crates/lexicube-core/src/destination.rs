//! The single active screen of the application.
//!
//! Exactly one destination is active at a time and it is only ever replaced
//! wholesale by reconciliation, never partially mutated from outside the
//! reducer. Accessors return explicit absent cases rather than relying on
//! callers to unwrap nested options.

use serde::{Deserialize, Serialize};

use crate::game::{GameOverState, GameState};
use crate::matches::{MatchId, MatchSnapshot};

/// The game screen and the list state it carries across rebuilds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameScreen {
    /// The game being displayed.
    pub game: GameState,

    /// The active-matches list shown alongside the game.
    pub active_matches: Vec<MatchSnapshot>,

    /// Whether the active-matches list has finished loading at least once.
    pub matches_loaded: bool,
}

impl GameScreen {
    /// Creates a screen for a game with an empty, not-yet-loaded match list.
    #[must_use]
    pub const fn new(game: GameState) -> Self {
        Self {
            game,
            active_matches: Vec::new(),
            matches_loaded: false,
        }
    }
}

/// The currently displayed screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// No screen is active.
    #[default]
    Idle,

    /// A game is in progress (possibly with a nested game-over summary).
    Game(GameScreen),

    /// A standalone game-over summary.
    GameOver(GameOverState),
}

impl Destination {
    /// Returns the game screen, if one is active.
    #[must_use]
    pub fn game(&self) -> Option<&GameScreen> {
        match self {
            Self::Game(screen) => Some(screen),
            Self::Idle | Self::GameOver(_) => None,
        }
    }

    /// Returns the match id of whatever match is on screen, across both the
    /// game and game-over variants.
    #[must_use]
    pub fn shown_match_id(&self) -> Option<&MatchId> {
        match self {
            Self::Idle => None,
            Self::Game(screen) => screen.game.match_id(),
            Self::GameOver(game_over) => game_over
                .turn_based_context
                .as_ref()
                .map(|ctx| &ctx.match_id),
        }
    }

    /// Returns `true` if the given match is on screen with its game-over
    /// state already shown.
    #[must_use]
    pub fn is_showing_finished_match(&self, match_id: &MatchId) -> bool {
        if self.shown_match_id() != Some(match_id) {
            return false;
        }
        match self {
            Self::Idle => false,
            Self::Game(screen) => screen.game.game_over.is_some(),
            Self::GameOver(_) => true,
        }
    }
}
