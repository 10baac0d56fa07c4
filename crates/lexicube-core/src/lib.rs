//! lexicube-core - Turn-based match synchronization core
//!
//! This library holds the synchronous domain logic of the lexicube word
//! game's multiplayer layer: match snapshots, the cube board model, game
//! state, the turn-data codec, and the turn reconciliation reducer that is
//! the sole authority over which screen is active and which commands go
//! back to the external match service.
//!
//! Everything here is pure with respect to its inputs: clocks and board
//! generators are injected, and nothing performs I/O. The async runtime
//! that feeds events in and executes commands lives in `lexicube-sync`.
//!
//! # Modules
//!
//! - [`matches`]: read-only snapshots of server-tracked matches
//! - [`puzzle`]: cube board model and deterministic board generation
//! - [`game`]: game state, turn-based context, completion snapshots
//! - [`turn_data`]: codec for the opaque per-match data blob
//! - [`destination`]: the single active screen
//! - [`reconcile`]: the turn reconciliation reducer

pub mod destination;
pub mod game;
pub mod matches;
pub mod puzzle;
pub mod reconcile;
pub mod turn_data;

pub use destination::{Destination, GameScreen};
pub use game::{CompletedGame, GameMode, GameOverState, GameState, MatchMetadata, TurnBasedContext};
pub use matches::{MatchId, MatchOutcome, MatchSnapshot, MatchStatus, Participant, PlayerId};
pub use puzzle::{Puzzle, PuzzleGenerator, SeededPuzzleGenerator};
pub use reconcile::{Command, MatchEvent, ReconcileContext, ReconcileError, TurnReducer};
pub use turn_data::{TurnData, TurnDataError};
