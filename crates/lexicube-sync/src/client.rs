//! Client abstractions over the external collaborators.
//!
//! The match service, the notification surface, and local saved-game
//! storage are all platform services; the driver only ever talks to them
//! through these traits, so tests substitute recording fakes and the core
//! stays free of any vendor binding.

use async_trait::async_trait;
use lexicube_core::game::GameState;
use lexicube_core::matches::{MatchId, MatchOutcome, MatchSnapshot, PlayerId};
use lexicube_core::reconcile::MatchEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by the external service clients.
///
/// Commands that fail are not retried at this layer; the error is logged by
/// the driver and the UI keeps whatever local state was already set.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A call into the external service failed.
    #[error("match service call `{operation}` failed: {message}")]
    Service {
        /// The operation that failed.
        operation: &'static str,
        /// Service-provided failure detail.
        message: String,
    },

    /// The local player has not been authenticated with the service.
    #[error("local player is not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// Convenience constructor for a failed service call.
    #[must_use]
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }
}

/// Request to end a match on the local player's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndMatchRequest {
    /// The match to end.
    pub match_id: MatchId,

    /// The final turn-data blob.
    pub data: Vec<u8>,

    /// The player ending the match.
    pub local_player: PlayerId,

    /// The outcome to record for the local player.
    pub outcome: MatchOutcome,

    /// The message shown to the other participants.
    pub message: String,
}

/// The external turn-based match service.
#[async_trait]
pub trait MatchClient: Send + Sync {
    /// Authenticates the local player, returning their identifier.
    async fn authenticate_local_player(&self) -> Result<PlayerId, ClientError>;

    /// Opens the live event stream. The stream is consumed sequentially and
    /// closing it tears the driver down as a unit.
    async fn listener_events(&self) -> Result<mpsc::Receiver<MatchEvent>, ClientError>;

    /// Requests a new match keyed by a finished match's id.
    async fn rematch(&self, match_id: &MatchId) -> Result<MatchSnapshot, ClientError>;

    /// Ends the match on the local player's turn.
    async fn end_match_in_turn(&self, request: EndMatchRequest) -> Result<(), ClientError>;

    /// Saves the current turn's data blob.
    async fn save_current_turn(&self, match_id: &MatchId, data: Vec<u8>)
        -> Result<(), ClientError>;

    /// Dismisses the matchmaker UI.
    async fn dismiss_matchmaker(&self) -> Result<(), ClientError>;
}

/// Local notification banners.
#[async_trait]
pub trait NotificationClient: Send + Sync {
    /// Shows a transient banner without stealing focus.
    async fn show_banner(&self, title: &str, body: Option<&str>) -> Result<(), ClientError>;
}

/// Local saved-game persistence.
#[async_trait]
pub trait SavedGamesClient: Send + Sync {
    /// Persists a game snapshot.
    async fn save_game(&self, game: &GameState) -> Result<(), ClientError>;
}
