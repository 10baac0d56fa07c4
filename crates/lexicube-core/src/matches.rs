//! Read-only snapshots of server-tracked turn-based matches.
//!
//! The external match service owns every match; this module defines the
//! snapshot shape the application receives from it, plus the guard helpers
//! the reconciliation reducer evaluates against a snapshot. Snapshots are
//! never mutated locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a server-tracked match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a player as assigned by the match service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle status of a match as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// The match is waiting for participants.
    Open,
    /// The match is in progress.
    Active,
    /// The match has ended.
    Ended,
}

/// Recorded outcome for a single participant.
///
/// A participant with no outcome (`None` in [`Participant::outcome`]) is
/// still playing; any recorded outcome is terminal for that participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The participant won the match.
    Won,
    /// The participant lost the match.
    Lost,
    /// The match ended in a tie for this participant.
    Tied,
    /// The participant forfeited.
    Quit,
}

/// One seat in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// The player occupying this seat, if the service has matched one.
    pub player: Option<PlayerId>,

    /// The participant's recorded outcome, unset while still playing.
    pub outcome: Option<MatchOutcome>,

    /// When this participant last took a turn.
    pub last_turn_at: Option<DateTime<Utc>>,
}

impl Participant {
    /// Creates a seated participant with no outcome and no turns taken.
    #[must_use]
    pub fn seated(player: PlayerId) -> Self {
        Self {
            player: Some(player),
            outcome: None,
            last_turn_at: None,
        }
    }
}

/// A read-only snapshot of a match, as delivered by the match service.
///
/// The `data` blob is opaque at this layer; the turn-data codec
/// ([`crate::turn_data`]) gives it structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// The match identifier.
    pub id: MatchId,

    /// All seats in the match, in service order.
    pub participants: Vec<Participant>,

    /// Index into `participants` of the seat whose turn it is, if any.
    pub current_participant: Option<usize>,

    /// The opaque turn-data blob stored with the match. Empty for a match
    /// with no recorded turns.
    #[serde(default)]
    pub data: Vec<u8>,

    /// When the service created the match.
    pub created_at: DateTime<Utc>,

    /// Lifecycle status.
    pub status: MatchStatus,

    /// Human-readable status message set by the last turn taker.
    pub message: String,
}

impl MatchSnapshot {
    /// Returns `true` if the current participant seat is occupied by the
    /// given player.
    #[must_use]
    pub fn is_local_players_turn(&self, local_player: &PlayerId) -> bool {
        self.current_participant
            .and_then(|index| self.participants.get(index))
            .and_then(|participant| participant.player.as_ref())
            .is_some_and(|player| player == local_player)
    }

    /// Returns `true` if any participant has a recorded outcome.
    #[must_use]
    pub fn has_any_outcome(&self) -> bool {
        self.participants.iter().any(|p| p.outcome.is_some())
    }

    /// Returns `true` if the match status is [`MatchStatus::Ended`].
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.status == MatchStatus::Ended
    }

    /// Returns the most recent turn timestamp across all participants.
    #[must_use]
    pub fn latest_turn_at(&self) -> Option<DateTime<Utc>> {
        self.participants.iter().filter_map(|p| p.last_turn_at).max()
    }
}
