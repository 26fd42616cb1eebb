//! Transport abstraction for the Round Table protocol.
//!
//! The [`Transport`] trait defines a bidirectional text message channel
//! between the client and the game coordinator. The protocol uses JSON text
//! messages, so every transport implementation must handle message framing
//! internally (e.g., WebSocket frames, length-prefixed TCP).
//!
//! Connection *establishment* lives in the separate [`Connector`] trait: the
//! connection manager re-opens connections whenever a session authenticates,
//! so it needs a factory parameterized by the session's bearer credential
//! rather than a pre-connected transport.

use async_trait::async_trait;

use crate::error::RoundTableError;

/// A bidirectional text message transport for the Round Table protocol.
///
/// Implementors shuttle serialized JSON strings between the client and the
/// coordinator. Each call to [`send`](Transport::send) transmits one complete
/// JSON message; each call to [`recv`](Transport::recv) returns one.
///
/// # Object Safety
///
/// This trait is object-safe; the connection manager drives a
/// `Box<dyn Transport>` produced by a [`Connector`].
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe because it is used
/// inside `tokio::select!`. If `recv` is cancelled before completion, calling
/// it again must not lose data.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message to the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`RoundTableError::TransportSend`] if the message could not be
    /// sent (e.g., connection broken, write buffer full).
    async fn send(&mut self, message: String) -> Result<(), RoundTableError>;

    /// Receive the next JSON text message from the coordinator.
    ///
    /// Returns:
    /// - `Some(Ok(text))` — a complete message was received
    /// - `Some(Err(e))` — a transport error occurred
    /// - `None` — the connection was closed cleanly by the remote peer
    ///
    /// # Cancel Safety
    ///
    /// This method **MUST** be cancel-safe (see [trait documentation](Transport)).
    async fn recv(&mut self) -> Option<Result<String, RoundTableError>>;

    /// Close the transport connection gracefully.
    ///
    /// After calling this method, subsequent calls to [`send`](Transport::send)
    /// and [`recv`](Transport::recv) may return errors or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations should
    /// still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), RoundTableError>;
}

/// Opens a fresh [`Transport`] authenticated with a bearer credential.
///
/// The credential is opaque to this crate; concrete connectors decide how to
/// present it (the WebSocket backend appends it as a `token` query parameter).
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Establish a new connection on behalf of the given credential.
    ///
    /// # Errors
    ///
    /// Returns any [`RoundTableError`] the underlying backend produces while
    /// connecting. The connection manager treats a failed connect as an
    /// immediately closed connection.
    async fn connect(&self, credential: &str) -> Result<Box<dyn Transport>, RoundTableError>;
}
