//! The synchronization driver: one ordered event consumer per application.
//!
//! The driver authenticates the local player, opens the match service's
//! listener stream, and reconciles each event to completion before reading
//! the next. Reconciliation itself is synchronous; only the commands it
//! emits perform I/O, and those are dispatched as sibling tasks without
//! blocking subsequent event processing. Siblings within one batch carry no
//! mutual ordering guarantee and fail independently; all of them are joined
//! before the batch is considered done.
//!
//! Closing the listener stream tears the loop down as a unit; in-flight
//! command tasks are left to run to completion or fail naturally.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lexicube_core::destination::Destination;
use lexicube_core::matches::PlayerId;
use lexicube_core::puzzle::{PuzzleGenerator, SeededPuzzleGenerator};
use lexicube_core::reconcile::{Command, MatchEvent, ReconcileContext, TurnReducer};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::client::{ClientError, EndMatchRequest, MatchClient, NotificationClient, SavedGamesClient};

/// Capacity of the channel that feeds rematch responses back into the loop.
const REINJECT_CAPACITY: usize = 16;

/// Source of "now" for reconciliation.
///
/// Injected so tests can pin the clock; production uses [`SystemClock`].
pub trait Clock: Send + Sync {
    /// The current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of running the driver to stream close.
#[derive(Debug, Clone)]
pub struct DriverRunResult {
    /// Number of events reconciled in this run, reinjected rematch
    /// responses included.
    pub events_processed: u64,
}

/// Drives the turn reducer from the match service's event stream.
pub struct SyncDriver<M, N, S> {
    matches: Arc<M>,
    notifications: Arc<N>,
    saved_games: Arc<S>,
    clock: Arc<dyn Clock>,
    puzzles: Box<dyn PuzzleGenerator + Send>,
    reducer: TurnReducer,
}

impl<M, N, S> SyncDriver<M, N, S>
where
    M: MatchClient + 'static,
    N: NotificationClient + 'static,
    S: SavedGamesClient + 'static,
{
    /// Creates a driver with the system clock and a board generator seeded
    /// from `board_seed`.
    #[must_use]
    pub fn new(matches: Arc<M>, notifications: Arc<N>, saved_games: Arc<S>, board_seed: u64) -> Self {
        Self {
            matches,
            notifications,
            saved_games,
            clock: Arc::new(SystemClock),
            puzzles: Box::new(SeededPuzzleGenerator::new(board_seed)),
            reducer: TurnReducer::new(),
        }
    }

    /// Replaces the clock. Tests pin this to a fixed instant.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the board generator.
    #[must_use]
    pub fn with_puzzles(mut self, puzzles: Box<dyn PuzzleGenerator + Send>) -> Self {
        self.puzzles = puzzles;
        self
    }

    /// The screen the reducer currently has active.
    #[must_use]
    pub const fn destination(&self) -> &Destination {
        self.reducer.destination()
    }

    /// Authenticates, opens the listener stream, and reconciles events
    /// until the stream closes.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication or opening the listener stream
    /// fails. Individual command failures are logged, never returned.
    pub async fn run(&mut self) -> Result<DriverRunResult, ClientError> {
        let local_player = self.matches.authenticate_local_player().await?;
        info!(player = %local_player, "authenticated local player");

        let mut listener = self.matches.listener_events().await?;
        let (reinject_tx, mut reinject_rx) = mpsc::channel(REINJECT_CAPACITY);
        let mut events_processed: u64 = 0;

        loop {
            tokio::select! {
                maybe_event = listener.recv() => {
                    let Some(event) = maybe_event else {
                        // Teardown: the listener stream is cancelled as a
                        // unit. In-flight commands run to completion.
                        break;
                    };
                    self.process(&event, &local_player, &reinject_tx);
                    events_processed += 1;
                },
                Some(event) = reinject_rx.recv() => {
                    self.process(&event, &local_player, &reinject_tx);
                    events_processed += 1;
                },
            }
        }

        debug!(events_processed, "listener stream closed");
        Ok(DriverRunResult { events_processed })
    }

    /// Reconciles one event and dispatches its command batch.
    fn process(
        &mut self,
        event: &MatchEvent,
        local_player: &PlayerId,
        reinject: &mpsc::Sender<MatchEvent>,
    ) {
        let mut ctx = ReconcileContext {
            now: self.clock.now(),
            local_player: local_player.clone(),
            puzzles: self.puzzles.as_mut(),
        };

        let commands = match self.reducer.apply(event, &mut ctx) {
            Ok(commands) => commands,
            Err(err) => {
                warn!(
                    match_id = %event.match_id(),
                    error = %err,
                    "reconciliation failed; keeping last good state"
                );
                return;
            },
        };

        self.dispatch(commands, reinject);
    }

    /// Runs a command batch as sibling tasks.
    ///
    /// The join itself runs in a spawned task so event processing is never
    /// blocked, but every sibling is awaited before the batch completes;
    /// one sibling failing does not cancel the others.
    fn dispatch(&self, commands: Vec<Command>, reinject: &mpsc::Sender<MatchEvent>) {
        if commands.is_empty() {
            return;
        }

        let mut siblings = JoinSet::new();
        for command in commands {
            let matches = Arc::clone(&self.matches);
            let notifications = Arc::clone(&self.notifications);
            let saved_games = Arc::clone(&self.saved_games);
            let reinject = reinject.clone();
            siblings.spawn(async move {
                execute(command, matches, notifications, saved_games, reinject).await;
            });
        }

        tokio::spawn(async move {
            while let Some(joined) = siblings.join_next().await {
                if let Err(err) = joined {
                    warn!(error = %err, "command task aborted");
                }
            }
        });
    }
}

/// Executes a single command against the external collaborators.
///
/// Failures are logged and not retried; the destination was already updated
/// (or deliberately left alone) by the reducer before dispatch, so a failed
/// command never leaves it inconsistent.
async fn execute<M, N, S>(
    command: Command,
    matches: Arc<M>,
    notifications: Arc<N>,
    saved_games: Arc<S>,
    reinject: mpsc::Sender<MatchEvent>,
) where
    M: MatchClient,
    N: NotificationClient,
    S: SavedGamesClient,
{
    let result = match command {
        Command::SaveTurn { match_id, data } => {
            matches.save_current_turn(&match_id, data).await
        },
        Command::EndMatchInTurn {
            match_id,
            data,
            local_player,
            outcome,
            message,
        } => {
            matches
                .end_match_in_turn(EndMatchRequest {
                    match_id,
                    data,
                    local_player,
                    outcome,
                    message,
                })
                .await
        },
        Command::DismissMatchmaker => matches.dismiss_matchmaker().await,
        Command::ShowBanner { title, body } => {
            notifications.show_banner(&title, body.as_deref()).await
        },
        Command::Rematch(match_id) => match matches.rematch(&match_id).await {
            Ok(snapshot) => {
                // The new match re-enters the reducer as a ready snapshot.
                if reinject.send(MatchEvent::Created(snapshot)).await.is_err() {
                    debug!(%match_id, "driver stopped before rematch response was delivered");
                }
                Ok(())
            },
            Err(err) => Err(err),
        },
        Command::PersistGame(game) => saved_games.save_game(&game).await,
    };

    if let Err(err) = result {
        warn!(error = %err, "match service command failed");
    }
}
