//! Board state reducer.
//!
//! [`BoardSync`] subscribes to the connection's event stream and folds it
//! into three pieces of client-visible state: the latest [`BoardSnapshot`]
//! (published on a `watch` channel so late subscribers immediately see the
//! current board), an append-only chat/system log, and a one-shot
//! suggestion-vote prompt flag raised by the [`PhaseDetector`].
//!
//! Snapshots replace wholesale. A closed connection resets the snapshot to
//! `None`; the log survives across connections.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::connection::{ConnectionEvent, ConnectionManager};
use crate::phase::PhaseDetector;
use crate::protocol::{classify, Action, BoardSnapshot, Classified, InboundFrame};

/// Log line recorded when the realtime connection comes up.
const LOG_CONNECTION_OPENED: &str = "/The socket connection has been established";

/// Log line recorded when the realtime connection goes down.
const LOG_CONNECTION_CLOSED: &str = "/The socket connection has been closed";

/// State shared between the reducer task and the [`BoardSync`] handle.
#[derive(Debug)]
struct Shared {
    board_tx: watch::Sender<Option<BoardSnapshot>>,
    log: StdMutex<Vec<String>>,
    suggestion_prompt: AtomicBool,
    /// Seated-player count remembered from the latest roster or snapshot,
    /// for start-constraint checks before any game runs.
    player_count_hint: AtomicI64,
}

impl Shared {
    fn lock_log(&self) -> MutexGuard<'_, Vec<String>> {
        match self.log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn push_log(&self, line: String) {
        self.lock_log().push(line);
    }
}

/// Owns the background reducer task that keeps board state current.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct BoardSync {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl BoardSync {
    /// Subscribe to the manager's events and start reducing them.
    ///
    /// Must be called before the connection opens, otherwise the `Opened`
    /// event (and its automatic refresh request) is missed.
    pub fn spawn(conn: Arc<ConnectionManager>) -> Self {
        let (board_tx, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            board_tx,
            log: StdMutex::new(Vec::new()),
            suggestion_prompt: AtomicBool::new(false),
            player_count_hint: AtomicI64::new(0),
        });

        let events = conn.events();
        let task = tokio::spawn(reduce_loop(Arc::clone(&shared), conn, events));

        Self { shared, task }
    }

    /// Watch the board snapshot. The receiver immediately yields the current
    /// value — `None` while no game state is held.
    pub fn board(&self) -> watch::Receiver<Option<BoardSnapshot>> {
        self.shared.board_tx.subscribe()
    }

    /// The current snapshot, if any.
    pub fn snapshot(&self) -> Option<BoardSnapshot> {
        self.shared.board_tx.borrow().clone()
    }

    /// The chat/system log accumulated so far.
    pub fn log(&self) -> Vec<String> {
        self.shared.lock_log().clone()
    }

    /// Append a locally generated line to the log.
    pub fn append_log(&self, line: impl Into<String>) {
        self.shared.push_log(line.into());
    }

    /// Take the suggestion-vote prompt if one is pending.
    ///
    /// Returns `true` at most once per entry into the suggestion-voting
    /// phase; the flag clears on read.
    pub fn take_suggestion_prompt(&self) -> bool {
        self.shared.suggestion_prompt.swap(false, Ordering::AcqRel)
    }

    /// The latest known seated-player count (0 when unknown).
    pub fn player_count_hint(&self) -> i64 {
        self.shared.player_count_hint.load(Ordering::Relaxed)
    }

    /// Override the seated-player count, for callers that know it before any
    /// roster or snapshot has arrived. Later frames overwrite it.
    pub fn set_player_count_hint(&self, count: i64) {
        self.shared.player_count_hint.store(count, Ordering::Relaxed);
    }
}

impl Drop for BoardSync {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ── Reducer loop ────────────────────────────────────────────────────

/// Folds connection events into board state until the event channel closes.
async fn reduce_loop(
    shared: Arc<Shared>,
    conn: Arc<ConnectionManager>,
    mut events: broadcast::Receiver<ConnectionEvent>,
) {
    let mut detector = PhaseDetector::new();

    loop {
        match events.recv().await {
            Ok(ConnectionEvent::Opened) => {
                shared.push_log(LOG_CONNECTION_OPENED.to_string());
                match serde_json::to_string(&Action::Refresh(String::new())) {
                    Ok(payload) => conn.send(payload),
                    Err(e) => warn!("failed to encode refresh request: {e}"),
                }
            }
            Ok(ConnectionEvent::Frame(text)) => {
                reduce_frame(&shared, &mut detector, &text);
            }
            Ok(ConnectionEvent::Closed) => {
                shared.push_log(LOG_CONNECTION_CLOSED.to_string());
                detector.reset();
                shared.board_tx.send_replace(None);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "board reducer lagged behind the event stream");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("event channel closed, board reducer exiting");
                break;
            }
        }
    }
}

/// Apply one raw inbound frame to the shared state.
fn reduce_frame(shared: &Shared, detector: &mut PhaseDetector, text: &str) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            // Malformed frames degrade to log noise, they never fail the
            // connection.
            warn!("unparseable inbound frame: {e}");
            shared.push_log(text.to_string());
            return;
        }
    };

    let game_started = shared
        .board_tx
        .borrow()
        .as_ref()
        .is_some_and(BoardSnapshot::has_started);

    match classify(&frame, game_started) {
        Classified::Roster(players) => {
            shared
                .player_count_hint
                .store(players.len() as i64, Ordering::Relaxed);
            shared.board_tx.send_modify(|board| {
                board.get_or_insert_with(BoardSnapshot::default).players.all = players;
            });
        }
        Classified::Snapshot(snapshot) => {
            if detector.observe(snapshot.state) {
                shared.suggestion_prompt.store(true, Ordering::Release);
            }
            shared
                .player_count_hint
                .store(snapshot.players.all.len() as i64, Ordering::Relaxed);
            shared.board_tx.send_replace(Some(*snapshot));
        }
        Classified::Log { sender, text } => {
            let line = match sender {
                Some(sender) => format!("{sender}: {text}"),
                None => text,
            };
            shared.push_log(line);
        }
    }
}
