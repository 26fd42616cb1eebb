//! Edge detection over the board's phase code.
//!
//! The coordinator republishes the full snapshot on every change, so "the
//! suggestion vote just started" cannot be read off a single snapshot — it is
//! a transition between consecutive ones. [`PhaseDetector`] compares the
//! previous and current phase codes and fires exactly on entry into
//! [`phase::SUGGESTION_VOTING`], never on steady-state repeats.

use crate::protocol::phase;

/// Detects entry into the suggestion-voting phase across snapshots.
#[derive(Debug, Clone)]
pub struct PhaseDetector {
    previous: i64,
}

impl PhaseDetector {
    /// Create a detector with the "no game" sentinel as its previous phase.
    pub fn new() -> Self {
        Self {
            previous: phase::NOT_STARTED,
        }
    }

    /// Feed the phase code of a freshly received snapshot.
    ///
    /// Returns `true` exactly when the board just entered the
    /// suggestion-voting phase.
    pub fn observe(&mut self, current: i64) -> bool {
        let entering =
            self.previous != phase::SUGGESTION_VOTING && current == phase::SUGGESTION_VOTING;
        self.previous = current;
        entering
    }

    /// Forget the game in progress, e.g. after a connection loss.
    pub fn reset(&mut self) {
        self.previous = phase::NOT_STARTED;
    }
}

impl Default for PhaseDetector {
    fn default() -> Self {
        Self::new()
    }
}
