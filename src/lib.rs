//! # Round Table Client
//!
//! Transport-agnostic Rust client for the Round Table realtime board game
//! protocol.
//!
//! The crate keeps one player's view of a hidden-role game synchronized with
//! the game coordinator: it owns the realtime connection, decodes the
//! coordinator's snapshot/chat/roster frames, republishes the board state,
//! and encodes typed player actions back onto the wire.
//!
//! ## Features
//!
//! - **Transport-agnostic** — implement the [`Transport`] and [`Connector`]
//!   traits for any backend
//! - **Wire-compatible** — all protocol types match the coordinator's JSON
//!   envelopes exactly
//! - **WebSocket built-in** — default `transport-websocket` feature provides
//!   [`WebSocketConnector`]
//! - **Event-driven** — watch the [`BoardSnapshot`] stream, poll the chat
//!   log, and get prompted on suggestion votes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use round_table_client::{Session, WebSocketConnector};
//!
//! # async fn run() {
//! let session = Session::new(WebSocketConnector::new("ws://127.0.0.1:8080/ws"));
//! session.login("bearer-token");
//!
//! let mut board = session.board().board();
//! while board.changed().await.is_ok() {
//!     if let Some(snapshot) = board.borrow_and_update().clone() {
//!         println!("phase {}", snapshot.state);
//!     }
//! }
//! # }
//! ```

pub mod actions;
pub mod board;
pub mod connection;
pub mod error;
pub mod phase;
pub mod protocol;
pub mod roles;
pub mod session;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use actions::Actions;
pub use board::BoardSync;
pub use connection::{ConnectionEvent, ConnectionManager};
pub use error::RoundTableError;
pub use phase::PhaseDetector;
pub use protocol::{Action, BoardSnapshot, Classified, InboundFrame};
pub use roles::{RoleChoice, RolePool, SetupError};
pub use session::Session;
pub use transport::{Connector, Transport};

#[cfg(feature = "transport-websocket")]
pub use transports::{WebSocketConnector, WebSocketTransport};
