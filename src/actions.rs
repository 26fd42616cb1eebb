//! Action encoder: typed player intents to wire payloads.
//!
//! Every method builds one [`Action`], serializes it, and hands the text to
//! the [`ConnectionManager`]. Sends inherit the connection's silent-drop
//! semantics; an encoding failure is logged and swallowed (it cannot happen
//! for these types, but the error path never panics).

use std::sync::Arc;

use tracing::{debug, error};

use crate::connection::ConnectionManager;
use crate::protocol::{
    Action, JourneyVote, MurderPayload, PlayerName, SirPickPayload, StartGamePayload,
    SuggestionPayload, SuggestionVote,
};
use crate::roles::{RolePool, SetupError};

/// Typed action surface over one connection.
#[derive(Debug, Clone)]
pub struct Actions {
    conn: Arc<ConnectionManager>,
}

impl Actions {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self { conn }
    }

    fn dispatch(&self, action: &Action) {
        match serde_json::to_string(action) {
            Ok(payload) => self.conn.send(payload),
            Err(e) => error!("failed to encode action: {e}"),
        }
    }

    /// Ask the coordinator to resend the current board snapshot.
    pub fn refresh(&self) {
        self.dispatch(&Action::Refresh(String::new()));
    }

    /// Send a chat line to the table.
    pub fn chat_message(&self, text: impl Into<String>) {
        self.dispatch(&Action::ChatMessage(text.into()));
    }

    /// Broadcast the live suggestion working set while the suggester is
    /// still toggling players.
    pub fn suggestion_tmp(&self, players: Vec<String>) {
        self.dispatch(&Action::SuggestionTmp(players));
    }

    /// Submit the final quest suggestion. `excalibur` names the player
    /// entrusted with Excalibur, or `None` when the option is off.
    pub fn suggestion(&self, players: Vec<String>, excalibur: Option<String>) {
        self.dispatch(&Action::Suggestion(SuggestionPayload {
            players,
            excalibur: excalibur.unwrap_or_default(),
        }));
    }

    /// Submit the Excalibur holder's reversal pick.
    pub fn excalibur_pick(&self, players: Vec<String>) {
        self.dispatch(&Action::ExcaliburPick(players));
    }

    /// Vote on the currently suggested quest party.
    pub fn vote_for_suggestion(&self, player_name: impl Into<String>, vote: bool) {
        self.dispatch(&Action::VoteForSuggestion(SuggestionVote {
            player_name: player_name.into(),
            vote,
        }));
    }

    /// Vote on the quest outcome. A negative vote code means "not yet
    /// chosen" and is never sent.
    pub fn vote_for_journey(&self, player_name: impl Into<String>, vote: i64) {
        if vote < 0 {
            debug!("journey vote not chosen yet, nothing sent");
            return;
        }
        self.dispatch(&Action::VoteForJourney(JourneyVote {
            player_name: player_name.into(),
            vote,
        }));
    }

    /// Submit an endgame murder attempt against `target`, with the full
    /// seated roster for remote validation.
    pub fn murder(&self, target: impl Into<String>, roster: Vec<String>) {
        self.dispatch(&Action::Murder(MurderPayload {
            assassinkill: target.into(),
            rest: roster.into_iter().map(PlayerName::new).collect(),
        }));
    }

    /// Submit Sir Kay's player pick.
    pub fn sir_pick(&self, pick: impl Into<String>) {
        self.dispatch(&Action::SirPick(SirPickPayload { pick: pick.into() }));
    }

    /// Lady of the Lake: suggest a player to examine.
    pub fn lady_suggest(&self, player: impl Into<String>) {
        self.dispatch(&Action::LadySuggest(player.into()));
    }

    /// Lady of the Lake: answer with the examined player's loyalty.
    pub fn lady_response(&self, good: bool) {
        self.dispatch(&Action::LadyResponse(u8::from(good)));
    }

    /// Lady of the Lake: publish the claimed loyalty to the table.
    pub fn lady_publish_response(&self, good: bool) {
        self.dispatch(&Action::LadyPublishResponse(u8::from(good)));
    }

    /// Reset the board back to the lobby.
    pub fn reset(&self) {
        self.dispatch(&Action::Reset(String::new()));
    }

    /// Add a player to the lobby roster.
    ///
    /// Sent in the uniform `{type, content}` envelope; see
    /// [`Action::AddPlayer`] for the divergence from legacy coordinator
    /// builds.
    pub fn add_player(&self, name: impl Into<String>) {
        self.dispatch(&Action::AddPlayer(name.into()));
    }

    /// Start the game with the given role pool and options.
    ///
    /// The pool is validated against `total_players` before anything is
    /// sent; a rejected start sends nothing.
    ///
    /// # Errors
    ///
    /// Returns the violated start constraint as a [`SetupError`].
    pub fn start_game(
        &self,
        pool: &RolePool,
        total_players: usize,
        excalibur: bool,
        lady: bool,
    ) -> Result<(), SetupError> {
        pool.validate_start(total_players)?;
        self.dispatch(&Action::StartGame(StartGamePayload {
            characters: pool.selections(),
            excalibur,
            lady,
        }));
        Ok(())
    }
}
