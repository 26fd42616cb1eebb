//! Session facade tying connection, board state, and actions together.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use crate::actions::Actions;
use crate::board::BoardSync;
use crate::connection::ConnectionManager;
use crate::transport::Connector;

/// One player's realtime session against the game coordinator.
///
/// Construction wires the pieces in dependency order: the board reducer
/// subscribes to connection events before any connection can open, so the
/// `Opened` event and its automatic refresh are never missed.
#[derive(Debug)]
pub struct Session {
    conn: Arc<ConnectionManager>,
    board: BoardSync,
    actions: Actions,
    credential: StdMutex<Option<String>>,
}

impl Session {
    /// Build a session over the given connector. No connection is opened
    /// until [`login`](Session::login).
    pub fn new(connector: impl Connector) -> Self {
        let conn = Arc::new(ConnectionManager::new(connector));
        let board = BoardSync::spawn(Arc::clone(&conn));
        let actions = Actions::new(Arc::clone(&conn));
        Self {
            conn,
            board,
            actions,
            credential: StdMutex::new(None),
        }
    }

    /// Store the credential and open the realtime connection with it.
    ///
    /// An existing connection is replaced.
    pub fn login(&self, credential: impl Into<String>) {
        let credential = credential.into();
        self.conn.open(Some(&credential));
        *self.lock_credential() = Some(credential);
    }

    /// Drop the credential and close the connection.
    pub fn logout(&self) {
        self.lock_credential().take();
        self.conn.close();
    }

    /// Whether a credential is currently stored.
    pub fn is_authenticated(&self) -> bool {
        self.lock_credential().is_some()
    }

    /// Board state: snapshot watch, log, suggestion prompt.
    pub fn board(&self) -> &BoardSync {
        &self.board
    }

    /// Typed action surface.
    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    /// The underlying connection manager.
    pub fn connection(&self) -> &ConnectionManager {
        &self.conn
    }

    fn lock_credential(&self) -> MutexGuard<'_, Option<String>> {
        match self.credential.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
