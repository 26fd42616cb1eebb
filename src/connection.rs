//! Connection manager for the realtime coordinator channel.
//!
//! [`ConnectionManager`] owns zero-or-one live connection to the game
//! coordinator. Opening spawns a background task that multiplexes outbound
//! payloads against inbound frames via `tokio::select!`; everything the task
//! observes is fanned out on a broadcast channel with **future-only**
//! semantics (a new subscriber sees only events after it subscribed — the
//! latest board snapshot is replayed by the reducer's `watch` channel
//! instead, see [`crate::board::BoardSync`]).
//!
//! There is no automatic reconnect: once a connection closes, the manager
//! stays closed until the session opens a new one.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::transport::{Connector, Transport};

/// Capacity of the broadcast event channel.
///
/// Slow subscribers that fall further behind than this lag and lose events
/// rather than stalling the connection task.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Notifications produced by the active connection.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The transport handshake completed; the send capability is live.
    Opened,
    /// One raw text frame received from the coordinator.
    Frame(String),
    /// The connection ended — remote close, transport error, failed
    /// handshake, or explicit [`ConnectionManager::close`]. Terminal for this
    /// connection.
    Closed,
}

/// Send capability plus teardown handles for the live connection.
struct ActiveConnection {
    cmd_tx: mpsc::UnboundedSender<String>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

/// Owns the single realtime connection of a session.
///
/// All methods are synchronous state transitions; the asynchronous effects
/// (handshake, frames, closure) are observed later via [`events`]
/// (ConnectionManager::events). Must be used within a tokio runtime because
/// [`open`](ConnectionManager::open) spawns the connection task.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    events_tx: broadcast::Sender<ConnectionEvent>,
    active: StdMutex<Option<ActiveConnection>>,
}

impl ConnectionManager {
    /// Create a manager in the closed state.
    pub fn new(connector: impl Connector) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            connector: Arc::new(connector),
            events_tx,
            active: StdMutex::new(None),
        }
    }

    /// Subscribe to connection events.
    ///
    /// Future-only: the receiver yields events that happen after this call,
    /// never a replay of earlier ones.
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events_tx.subscribe()
    }

    /// Open a new connection using the given bearer credential.
    ///
    /// Without a credential this is a silent no-op — the manager stays
    /// closed and no connection is attempted. A live connection, if any, is
    /// torn down first; its send capability is invalidated immediately, and
    /// the new task waits for the old one to finish before connecting, so
    /// the old `Closed` is always broadcast before the new `Opened`.
    ///
    /// Success or failure of the handshake is reported asynchronously as
    /// [`ConnectionEvent::Opened`] or [`ConnectionEvent::Closed`].
    pub fn open(&self, credential: Option<&str>) {
        let Some(credential) = credential else {
            debug!("no credential available, staying closed");
            return;
        };

        let predecessor = self.lock_active().take().map(|mut conn| {
            if let Some(tx) = conn.shutdown_tx.take() {
                let _ = tx.send(());
            }
            conn.task
        });

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<String>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(connection_loop(
            Arc::clone(&self.connector),
            credential.to_string(),
            predecessor,
            cmd_rx,
            self.events_tx.clone(),
            shutdown_rx,
        ));

        *self.lock_active() = Some(ActiveConnection {
            cmd_tx,
            shutdown_tx: Some(shutdown_tx),
            task,
        });
    }

    /// Transmit `payload` verbatim over the open connection.
    ///
    /// With no open connection the payload is dropped silently; the only
    /// trace is a debug log line. Never panics, never errors.
    pub fn send(&self, payload: String) {
        let guard = self.lock_active();
        match guard.as_ref() {
            Some(conn) if !conn.cmd_tx.is_closed() => {
                // The task drains this channel; an error here means it just
                // exited, which is the same as having no connection.
                if conn.cmd_tx.send(payload).is_err() {
                    debug!("connection task gone, dropping outbound payload");
                }
            }
            _ => debug!("no open connection, dropping outbound payload"),
        }
    }

    /// Tear down the active connection. Idempotent.
    ///
    /// The connection task closes the transport and emits
    /// [`ConnectionEvent::Closed`] on its way out.
    pub fn close(&self) {
        let previous = self.lock_active().take();
        if let Some(mut conn) = previous {
            if let Some(tx) = conn.shutdown_tx.take() {
                let _ = tx.send(());
            }
        }
    }

    /// Whether a send capability currently exists.
    ///
    /// `true` from the moment [`open`](ConnectionManager::open) is called
    /// until the connection task exits; actual handshake completion is
    /// signaled by [`ConnectionEvent::Opened`].
    pub fn is_open(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|conn| !conn.cmd_tx.is_closed())
    }

    /// Lock the active-connection slot, recovering from poisoning.
    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveConnection>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Connection loop ─────────────────────────────────────────────────

/// Background task driving one connection from handshake to closure.
///
/// Exits when:
/// - The command channel closes (manager dropped the send capability)
/// - The shutdown signal fires (explicit close or replacement)
/// - The transport returns `None` (remote closed) or errors
///
/// Always emits exactly one final [`ConnectionEvent::Closed`].
async fn connection_loop(
    connector: Arc<dyn Connector>,
    credential: String,
    predecessor: Option<tokio::task::JoinHandle<()>>,
    mut cmd_rx: mpsc::UnboundedReceiver<String>,
    events_tx: broadcast::Sender<ConnectionEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    // Replacing an older connection: let it finish tearing down first so its
    // final `Closed` cannot land after this connection's `Opened`.
    if let Some(task) = predecessor {
        let _ = task.await;
    }

    debug!("connection task started");

    let mut transport: Box<dyn Transport> = match connector.connect(&credential).await {
        Ok(transport) => transport,
        Err(e) => {
            warn!("connection attempt failed: {e}");
            let _ = events_tx.send(ConnectionEvent::Closed);
            return;
        }
    };

    let _ = events_tx.send(ConnectionEvent::Opened);

    loop {
        tokio::select! {
            // Outbound payload queued by the manager.
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(payload) => {
                        if let Err(e) = transport.send(payload).await {
                            error!("transport send error: {e}");
                            break;
                        }
                    }
                    // Send capability dropped.
                    None => {
                        debug!("command channel closed, shutting down connection");
                        let _ = transport.close().await;
                        break;
                    }
                }
            }

            // Explicit close or replacement by a newer connection.
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                break;
            }

            // Inbound frame from the coordinator.
            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        let _ = events_tx.send(ConnectionEvent::Frame(text));
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        break;
                    }
                    None => {
                        debug!("connection closed by coordinator");
                        break;
                    }
                }
            }
        }
    }

    let _ = events_tx.send(ConnectionEvent::Closed);
    debug!("connection task exited");
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::error::RoundTableError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// A transport that records sent messages and replays scripted frames.
    struct MockTransport {
        incoming: VecDeque<Option<Result<String, RoundTableError>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: String) -> Result<(), RoundTableError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<Result<String, RoundTableError>> {
            if let Some(item) = self.incoming.pop_front() {
                // A scripted `None` is a clean remote close.
                item
            } else {
                // Scripted frames exhausted — hang until shutdown.
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> Result<(), RoundTableError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    /// A connector serving one scripted transport, then failing.
    struct MockConnector {
        script: StdMutex<VecDeque<Vec<Option<Result<String, RoundTableError>>>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
        credentials: Arc<StdMutex<Vec<String>>>,
    }

    impl MockConnector {
        #[allow(clippy::type_complexity)]
        fn new(
            scripts: Vec<Vec<Option<Result<String, RoundTableError>>>>,
        ) -> (
            Self,
            Arc<StdMutex<Vec<String>>>,
            Arc<AtomicBool>,
            Arc<StdMutex<Vec<String>>>,
        ) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            let credentials = Arc::new(StdMutex::new(Vec::new()));
            let connector = Self {
                script: StdMutex::new(scripts.into_iter().collect()),
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
                credentials: Arc::clone(&credentials),
            };
            (connector, sent, closed, credentials)
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        async fn connect(&self, credential: &str) -> Result<Box<dyn Transport>, RoundTableError> {
            self.credentials.lock().unwrap().push(credential.to_string());
            let incoming = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(RoundTableError::TransportClosed)?;
            Ok(Box::new(MockTransport {
                incoming: incoming.into(),
                sent: Arc::clone(&self.sent),
                closed: Arc::clone(&self.closed),
            }))
        }
    }

    async fn next_event(rx: &mut broadcast::Receiver<ConnectionEvent>) -> ConnectionEvent {
        tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for connection event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn open_without_credential_stays_closed() {
        let (connector, _, _, credentials) = MockConnector::new(vec![]);
        let manager = ConnectionManager::new(connector);

        manager.open(None);

        assert!(!manager.is_open());
        assert!(credentials.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_emits_opened_and_passes_credential() {
        let (connector, _, _, credentials) = MockConnector::new(vec![vec![]]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        manager.open(Some("tok123"));

        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));
        assert_eq!(credentials.lock().unwrap().as_slice(), ["tok123"]);
    }

    #[tokio::test]
    async fn frames_are_broadcast_in_order() {
        let (connector, _, _, _) = MockConnector::new(vec![vec![
            Some(Ok("one".into())),
            Some(Ok("two".into())),
        ]]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        manager.open(Some("tok"));

        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));
        match next_event(&mut events).await {
            ConnectionEvent::Frame(text) => assert_eq!(text, "one"),
            other => panic!("expected frame, got {other:?}"),
        }
        match next_event(&mut events).await {
            ConnectionEvent::Frame(text) => assert_eq!(text, "two"),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_close_emits_closed() {
        let (connector, _, _, _) = MockConnector::new(vec![vec![None]]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        manager.open(Some("tok"));

        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed
        ));
    }

    #[tokio::test]
    async fn failed_handshake_emits_closed_only() {
        // No scripted transports: connect() fails.
        let (connector, _, _, _) = MockConnector::new(vec![]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        manager.open(Some("tok"));

        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed
        ));
    }

    #[tokio::test]
    async fn send_reaches_transport() {
        let (connector, sent, _, _) = MockConnector::new(vec![vec![]]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        manager.open(Some("tok"));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));

        manager.send("payload".into());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(sent.lock().unwrap().as_slice(), ["payload"]);
    }

    #[tokio::test]
    async fn send_while_closed_is_silently_dropped() {
        let (connector, sent, _, _) = MockConnector::new(vec![]);
        let manager = ConnectionManager::new(connector);

        // Must not panic, must not error.
        manager.send("dropped".into());

        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_closes_transport() {
        let (connector, _, closed, _) = MockConnector::new(vec![vec![]]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        manager.open(Some("tok"));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));

        manager.close();
        manager.close();

        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed
        ));
        assert!(closed.load(Ordering::Relaxed));
        assert!(!manager.is_open());
    }

    #[tokio::test]
    async fn reopen_invalidates_previous_connection() {
        let (connector, sent, _, credentials) = MockConnector::new(vec![vec![], vec![]]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        manager.open(Some("first"));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));

        manager.open(Some("second"));

        // Old connection closes, new one opens.
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed
        ));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));
        assert_eq!(credentials.lock().unwrap().as_slice(), ["first", "second"]);

        manager.send("to-second".into());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(sent.lock().unwrap().as_slice(), ["to-second"]);
    }

    #[tokio::test]
    async fn rapid_reopen_keeps_closed_before_opened() {
        let (connector, _, _, credentials) = MockConnector::new(vec![vec![], vec![]]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        // Reopen immediately, without waiting for the first handshake. The
        // replacement task must still observe the old task's exit, so the
        // event order is Opened(first), Closed(first), Opened(second).
        manager.open(Some("first"));
        manager.open(Some("second"));

        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed
        ));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));
        assert_eq!(credentials.lock().unwrap().as_slice(), ["first", "second"]);
    }

    #[tokio::test]
    async fn no_reconnect_after_remote_close() {
        let (connector, _, _, credentials) = MockConnector::new(vec![vec![None], vec![]]);
        let manager = ConnectionManager::new(connector);
        let mut events = manager.events();

        manager.open(Some("tok"));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Opened
        ));
        assert!(matches!(
            next_event(&mut events).await,
            ConnectionEvent::Closed
        ));

        // Give any (wrong) reconnect attempt time to happen.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(credentials.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscribers_only_see_future_events() {
        let (connector, _, _, _) = MockConnector::new(vec![vec![Some(Ok("early".into()))]]);
        let manager = ConnectionManager::new(connector);
        let mut first = manager.events();

        manager.open(Some("tok"));
        assert!(matches!(
            next_event(&mut first).await,
            ConnectionEvent::Opened
        ));
        assert!(matches!(
            next_event(&mut first).await,
            ConnectionEvent::Frame(_)
        ));

        // A late subscriber gets nothing from the past.
        let mut late = manager.events();
        manager.close();
        assert!(matches!(
            next_event(&mut late).await,
            ConnectionEvent::Closed
        ));
    }
}
