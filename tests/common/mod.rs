#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Shared test utilities for Round Table Client integration tests.
//!
//! Provides a scripted [`MockConnector`]/`MockTransport` pair and helper
//! functions for constructing the coordinator's inbound frame JSON.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use round_table_client::protocol::{BoardSnapshot, InboundFrame, PlayerName};
use round_table_client::{Connector, RoundTableError, Transport};

/// One scripted `recv` result; `None` is a clean remote close.
pub type ScriptItem = Option<Result<String, RoundTableError>>;

// ── MockTransport ───────────────────────────────────────────────────

/// A scripted mock transport.
///
/// Incoming frames are consumed in order by `recv()`; once exhausted, `recv`
/// hangs so the connection task stays alive until shutdown. Everything sent
/// by the client is recorded.
pub struct MockTransport {
    incoming: VecDeque<ScriptItem>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), RoundTableError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, RoundTableError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), RoundTableError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── MockConnector ───────────────────────────────────────────────────

/// A connector serving one scripted [`MockTransport`] per `connect` call;
/// further calls fail once the scripts run out.
pub struct MockConnector {
    scripts: StdMutex<VecDeque<Vec<ScriptItem>>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockConnector {
    /// Build a connector with one incoming-frame script per expected
    /// connection, plus shared handles for inspecting sent payloads and
    /// transport closure.
    #[allow(clippy::type_complexity)]
    pub fn new(
        scripts: Vec<Vec<ScriptItem>>,
    ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let connector = Self {
            scripts: StdMutex::new(scripts.into_iter().collect()),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (connector, sent, closed)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _credential: &str) -> Result<Box<dyn Transport>, RoundTableError> {
        let incoming = self
            .scripts
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

// ── ChannelConnector ────────────────────────────────────────────────

/// A transport fed live from the test via an unbounded channel, for tests
/// that need to interleave frames with assertions.
pub struct ChannelTransport {
    incoming: tokio::sync::mpsc::UnboundedReceiver<ScriptItem>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, message: String) -> Result<(), RoundTableError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, RoundTableError>> {
        match self.incoming.recv().await {
            Some(item) => item,
            // Feeder dropped: remote close.
            None => None,
        }
    }

    async fn close(&mut self) -> Result<(), RoundTableError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Serves a single [`ChannelTransport`]; a second `connect` call fails.
pub struct ChannelConnector {
    transport: StdMutex<Option<ChannelTransport>>,
}

impl ChannelConnector {
    /// Build the connector plus the frame feeder and inspection handles.
    #[allow(clippy::type_complexity)]
    pub fn new() -> (
        Self,
        tokio::sync::mpsc::UnboundedSender<ScriptItem>,
        Arc<StdMutex<Vec<String>>>,
        Arc<AtomicBool>,
    ) {
        let (frames_tx, frames_rx) = tokio::sync::mpsc::unbounded_channel();
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let connector = Self {
            transport: StdMutex::new(Some(ChannelTransport {
                incoming: frames_rx,
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            })),
        };
        (connector, frames_tx, sent, closed)
    }
}

#[async_trait]
impl Connector for ChannelConnector {
    async fn connect(&self, _credential: &str) -> Result<Box<dyn Transport>, RoundTableError> {
        let transport = self
            .transport
            .lock()
            .unwrap()
            .take()
            .ok_or(RoundTableError::TransportClosed)?;
        Ok(Box::new(transport))
    }
}

// ── Async assertion helper ──────────────────────────────────────────

/// Poll `condition` until it holds or a one-second deadline expires.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(1);
    while !condition() {
        assert!(
            std::time::Instant::now() < deadline,
            "timed out waiting for: {what}"
        );
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}

// ── Frame fixture builders ──────────────────────────────────────────

/// Wrap a `content` string in the coordinator's outer frame shape.
pub fn frame_with_content(content: &str) -> String {
    serde_json::to_string(&InboundFrame {
        content: Some(content.to_string()),
        ..Default::default()
    })
    .expect("frame serialization")
}

/// A frame carrying a board snapshot with the given phase code.
pub fn snapshot_frame(state: i64) -> String {
    snapshot_frame_with(|board| board.state = state)
}

/// A frame carrying a board snapshot customized by `build`.
pub fn snapshot_frame_with(build: impl FnOnce(&mut BoardSnapshot)) -> String {
    let mut board = BoardSnapshot::default();
    build(&mut board);
    let inner = serde_json::to_string(&board).expect("snapshot serialization");
    frame_with_content(&inner)
}

/// A chat frame from `sender` carrying `text`.
pub fn chat_frame(sender: &str, text: &str) -> String {
    let inner = serde_json::json!({"type": "chat_message", "content": text});
    serde_json::to_string(&InboundFrame {
        sender: Some(sender.to_string()),
        content: Some(inner.to_string()),
        ..Default::default()
    })
    .expect("chat frame serialization")
}

/// A lobby roster frame listing the given player names.
pub fn roster_frame(names: &[&str]) -> String {
    serde_json::to_string(&InboundFrame {
        ty: Some("bla".to_string()),
        players: Some(names.iter().map(|n| PlayerName::new(*n)).collect()),
        ..Default::default()
    })
    .expect("roster frame serialization")
}
