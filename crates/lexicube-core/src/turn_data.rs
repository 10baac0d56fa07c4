//! Codec for the opaque turn-data blob stored with each match.
//!
//! The match service stores one opaque byte blob per match; this module
//! gives it structure as a (metadata, game-state, initiator) tuple. An empty
//! blob is not an error shape mistake — it is how a freshly created match
//! with no recorded turns looks — so decoding distinguishes "no data yet"
//! from "malformed".
//!
//! Encoding is deterministic: the same logical input always yields the same
//! bytes (fixed field order, ordered maps), so retried save-turn payloads
//! are byte-identical.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{GameState, MatchMetadata};
use crate::matches::PlayerId;

/// Errors from the turn-data codec.
#[derive(Debug, Error)]
pub enum TurnDataError {
    /// The blob is empty: the match was just created and no turn has been
    /// saved yet. Benign and expected.
    #[error("no turn data recorded yet")]
    NoDataYet,

    /// The blob is non-empty but does not parse into the expected shape.
    #[error("malformed turn data: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Turn data failed to serialize.
    #[error("failed to encode turn data: {0}")]
    Encode(#[source] serde_json::Error),
}

impl TurnDataError {
    /// Returns `true` for the benign empty-blob case.
    #[must_use]
    pub const fn is_no_data_yet(&self) -> bool {
        matches!(self, Self::NoDataYet)
    }
}

/// The structured content of a match's data blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnData {
    /// Application metadata layered on the match.
    pub metadata: MatchMetadata,

    /// The serialized game state as of the last saved turn.
    pub game_state: GameState,

    /// The player who saved this turn, when known.
    pub initiator: Option<PlayerId>,
}

impl TurnData {
    /// Creates turn data from its parts.
    #[must_use]
    pub const fn new(
        metadata: MatchMetadata,
        game_state: GameState,
        initiator: Option<PlayerId>,
    ) -> Self {
        Self {
            metadata,
            game_state,
            initiator,
        }
    }
}

/// Decodes a match data blob.
///
/// # Errors
///
/// Returns [`TurnDataError::NoDataYet`] for an empty blob and
/// [`TurnDataError::Malformed`] for a non-empty blob that does not parse.
/// Never panics, whatever the input bytes.
pub fn decode(bytes: &[u8]) -> Result<TurnData, TurnDataError> {
    if bytes.is_empty() {
        return Err(TurnDataError::NoDataYet);
    }
    serde_json::from_slice(bytes).map_err(TurnDataError::Malformed)
}

/// Encodes turn data into the blob the match service stores.
///
/// # Errors
///
/// Returns [`TurnDataError::Encode`] if serialization fails.
pub fn encode(data: &TurnData) -> Result<Vec<u8>, TurnDataError> {
    serde_json::to_vec(data).map_err(TurnDataError::Encode)
}
