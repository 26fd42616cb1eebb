//! Wire types for the Round Table board game protocol.
//!
//! Every type in this module produces JSON identical to what the game
//! coordinator sends and expects. Outbound player actions are always the
//! literal text of a `{"type": ..., "content": ...}` envelope ([`Action`]).
//! Inbound frames are looser: an outer [`InboundFrame`] whose `content` field
//! is a *string* that may itself JSON-decode into either a chat envelope or a
//! full [`BoardSnapshot`]. That ambiguity is inherent to the wire format —
//! [`classify`] implements the exact fallback order the coordinator relies on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::roles::RoleChoice;

/// Inner `type` value marking a chat envelope inside a frame's `content`.
pub const CHAT_MARKER: &str = "chat_message";

/// Outer `ty` value of a lobby roster frame.
pub const ROSTER_FRAME_TYPE: &str = "bla";

// ── Phase codes ─────────────────────────────────────────────────────

/// Numeric phase codes carried in [`BoardSnapshot::state`].
///
/// The code determines which action submissions the coordinator currently
/// accepts; the client never enforces that locally.
pub mod phase {
    /// No game in progress. Also the edge detector's sentinel.
    pub const NOT_STARTED: i64 = 0;
    pub const SIR_PICK_PLAYER: i64 = 1;
    pub const WAITING_FOR_SUGGESTION: i64 = 2;
    /// A suggested quest party is up for a table-wide vote.
    pub const SUGGESTION_VOTING: i64 = 3;
    pub const JOURNEY_VOTING: i64 = 4;
    pub const EXCALIBUR_PICK: i64 = 5;
    pub const VICTORY_FOR_GOOD: i64 = 6;
    pub const VICTORY_FOR_BAD: i64 = 7;
    pub const MURDERS_AFTER_GOOD_VICTORY: i64 = 8;
    pub const MURDERS_AFTER_BAD_VICTORY: i64 = 9;
    pub const VICTORY_FOR_GAWAIN: i64 = 10;
    pub const WAITING_FOR_LADY_SUGGESTER: i64 = 11;
    pub const LADY_RESPONSE: i64 = 12;
    pub const LADY_PUBLISH_RESPONSE: i64 = 13;
    pub const VICTORY_FOR_SIR_GAWAIN: i64 = 14;
}

// ── Outbound actions ────────────────────────────────────────────────

/// Target of a final quest suggestion, including the optional Excalibur pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPayload {
    /// Player names suggested for the quest.
    pub players: Vec<String>,
    /// Player entrusted with Excalibur; empty string when the option is off.
    pub excalibur: String,
}

/// A yes/no vote on the currently suggested quest party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionVote {
    #[serde(rename = "playerName")]
    pub player_name: String,
    pub vote: bool,
}

/// A quest-outcome vote cast by a party member.
///
/// The vote is a signed code; `-1` means "not yet chosen" and is blocked
/// client-side by the encoder, never sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyVote {
    #[serde(rename = "playerName")]
    pub player_name: String,
    pub vote: i64,
}

/// The assassin's (or another murderer's) target, plus the full roster so the
/// coordinator can validate the pick remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MurderPayload {
    pub assassinkill: String,
    pub rest: Vec<PlayerName>,
}

/// Sir Kay's player pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SirPickPayload {
    pub pick: String,
}

/// Full role-pool selection sent when starting a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartGamePayload {
    /// Every selectable role with its checked/assassin flags.
    pub characters: Vec<RoleChoice>,
    /// Whether the Excalibur option is enabled for this game.
    pub excalibur: bool,
    /// Whether the Lady of the Lake option is enabled for this game.
    pub lady: bool,
}

/// Player actions sent from client to the game coordinator.
///
/// Serializes to the wire envelope `{"type": "<kind>", "content": <payload>}`.
/// Empty-payload kinds (`refresh`, `reset`) carry an empty string so the
/// envelope shape stays uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Action {
    /// Ask the coordinator to resend the current board snapshot.
    Refresh(String),
    /// Free-text chat line, attributed by the coordinator.
    ChatMessage(String),
    /// Live preview of the suggestion working set, sent on every toggle.
    SuggestionTmp(Vec<String>),
    /// Final quest suggestion.
    Suggestion(SuggestionPayload),
    /// Excalibur holder's reversal pick.
    ExcaliburPick(Vec<String>),
    /// Vote on the suggested party.
    VoteForSuggestion(SuggestionVote),
    /// Vote on the quest outcome.
    VoteForJourney(JourneyVote),
    /// Endgame murder attempt.
    Murder(MurderPayload),
    /// Sir Kay's pick.
    SirPick(SirPickPayload),
    /// Lady of the Lake: suggest a player to examine.
    LadySuggest(String),
    /// Lady of the Lake: loyalty answer, collapsed to `1`/`0`.
    LadyResponse(u8),
    /// Lady of the Lake: publish the answer to the table, `1`/`0`.
    LadyPublishResponse(u8),
    /// Reset the board to the lobby.
    Reset(String),
    /// Add a player to the lobby roster.
    ///
    /// Uses the uniform `{"type": "add_player", "content": "<name>"}`
    /// envelope. Legacy coordinator builds instead read the name from a
    /// top-level `player` field for this one action and will not register
    /// the player from this shape.
    AddPlayer(String),
    /// Start the game with the given role pool and options.
    StartGame(StartGamePayload),
}

// ── Inbound frames ──────────────────────────────────────────────────

/// A player entry as the coordinator sends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerName {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub player: String,
}

impl PlayerName {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
        }
    }
}

/// Outer shape of every peer-authored frame on the wire.
///
/// Roster frames carry `ty` + `players`; everything else carries `content`
/// (a JSON-encoded string) and optionally `sender`. All fields are optional
/// because the coordinator omits empty ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PlayerName>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ── Board snapshot ──────────────────────────────────────────────────

/// Seated and active players.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Players {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub all: Vec<PlayerName>,
    #[serde(default)]
    pub active: Vec<PlayerName>,
}

/// Per-quest requirements and tallies, keyed by quest index in
/// [`BoardSnapshot::results`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestStats {
    #[serde(default, rename = "final")]
    pub final_result: i64,
    #[serde(default)]
    pub ppp: i64,
    #[serde(default)]
    pub numofplayers: i64,
    #[serde(default)]
    pub successes: i64,
    #[serde(default)]
    pub reversals: i64,
    #[serde(default)]
    pub failures: i64,
    #[serde(default)]
    pub beasts: i64,
    #[serde(default)]
    pub avalon_power: bool,
}

/// One completed (or abandoned) suggestion round in the board archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestArchiveEntry {
    #[serde(default, rename = "playersAcceptedQuest")]
    pub players_accepted_quest: Vec<String>,
    #[serde(default, rename = "playersNotAcceptedQuest")]
    pub players_not_accepted_quest: Vec<String>,
    #[serde(default)]
    pub suggester: PlayerName,
    #[serde(default, rename = "suggestedPlayers")]
    pub suggested_players: Vec<String>,
    #[serde(default, rename = "isSuggestionAccepted")]
    pub is_suggestion_accepted: bool,
    #[serde(default, rename = "isSuggestionOver")]
    pub is_suggestion_over: bool,
    #[serde(default, rename = "switch")]
    pub is_switch_lancelot: bool,
    #[serde(default, rename = "numberOfReversal")]
    pub number_of_reversal: i64,
    #[serde(default, rename = "numberOfSuccesses")]
    pub number_of_successes: i64,
    #[serde(default, rename = "numberOfFailures")]
    pub number_of_failures: i64,
    #[serde(default, rename = "numberOfBeasts")]
    pub number_of_beasts: i64,
    #[serde(default)]
    pub avalon_power: bool,
    #[serde(default, rename = "finalResult")]
    pub final_result: i64,
    /// Quest stage, fractional on retries (1, 1.1, 1.2, then 2, ...).
    #[serde(default, rename = "questId")]
    pub quest_id: f64,
    #[serde(default, rename = "excaliburPicker")]
    pub excalibur_picker: String,
    #[serde(default, rename = "excaliburChoose")]
    pub excalibur_choose: String,
    #[serde(default, rename = "LadySuggester")]
    pub lady_suggester: String,
    #[serde(default, rename = "LadyChosenPlayer")]
    pub lady_chosen_player: String,
    #[serde(default, rename = "LadySuggesterPublishToTheWorld")]
    pub lady_suggester_publish_to_the_world: String,
}

/// The viewing player's own hidden role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub character: String,
}

/// Role-specific knowledge revealed to the viewing player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSecrets {
    #[serde(default, rename = "PlayersWithSameLoyalty")]
    pub players_with_same_loyalty: Vec<String>,
    #[serde(default, rename = "PlayersWithDifferentLoyalty")]
    pub players_with_different_loyalty: Vec<String>,
    #[serde(default, rename = "PlayersWithGoodCharacter")]
    pub players_with_good_character: Vec<String>,
    #[serde(default, rename = "PlayersWithBadCharacter")]
    pub players_with_bad_character: Vec<String>,
    #[serde(default, rename = "PlayersWithUncoveredCharacters")]
    pub players_with_uncovered_characters: HashMap<String, String>,
    #[serde(default, rename = "PlayersSee")]
    pub players_see: String,
    #[serde(default, rename = "Seen")]
    pub seen: String,
    #[serde(default, rename = "PlayersSee2")]
    pub players_see2: String,
    #[serde(default, rename = "Seen2")]
    pub seen2: String,
}

/// Active murder request at endgame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MurderState {
    #[serde(default)]
    pub target: Option<serde_json::Value>,
    #[serde(default)]
    pub by: String,
    #[serde(default, rename = "byCharacter")]
    pub by_character: String,
    #[serde(default, rename = "StateAfterSuccess")]
    pub state_after_success: i64,
}

/// Revealed character info per player, shown after deaths and at endgame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevealedCharacter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ch: String,
    #[serde(default, rename = "isKilled")]
    pub is_killed: bool,
}

/// The single canonical truth object for a game in progress.
///
/// Received wholesale inside a frame's `content`; every replacement fully
/// supersedes the previous snapshot, never a partial merge. All fields are
/// defaulted because the coordinator omits empty ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub players: Players,
    /// Active quest index; monotonically non-decreasing while a game runs.
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub active_players_num: i64,
    #[serde(default)]
    pub size: i64,
    /// Phase code; see [`phase`].
    #[serde(default)]
    pub state: i64,
    #[serde(default, rename = "stateDescription")]
    pub state_description: String,
    #[serde(default)]
    pub archive: Vec<QuestArchiveEntry>,
    #[serde(default)]
    pub secrets: Secrets,
    #[serde(default, rename = "playerSecrets")]
    pub player_secrets: PlayerSecrets,
    #[serde(default)]
    pub suggester: String,
    #[serde(default)]
    pub murder: MurderState,
    #[serde(default, rename = "optionalVotes")]
    pub optional_votes: Vec<String>,
    #[serde(default, rename = "suggesterVeto")]
    pub suggester_veto: String,
    #[serde(default, rename = "onlyGoodSuggested")]
    pub only_good_suggested: bool,
    #[serde(default, rename = "suggestedPlayers")]
    pub suggested_players: Vec<String>,
    #[serde(default, rename = "suggestedTemporaryPlayers")]
    pub suggested_temporary_players: String,
    #[serde(default, rename = "PlayersVotedForCurrQuest")]
    pub players_voted_for_curr_quest: Vec<String>,
    #[serde(default, rename = "PlayersVotedYesForSuggestion")]
    pub players_voted_yes_for_suggestion: Vec<String>,
    #[serde(default, rename = "PlayersVotedNoForSuggestion")]
    pub players_voted_no_for_suggestion: Vec<String>,
    #[serde(default)]
    pub results: HashMap<String, QuestStats>,
    #[serde(default, rename = "playerToCharacters")]
    pub player_to_characters: HashMap<String, RevealedCharacter>,
    #[serde(default)]
    pub excalibur: bool,
    #[serde(default, rename = "suggestedExcalibur")]
    pub suggested_excalibur: String,
    #[serde(default, rename = "isLady")]
    pub is_lady: bool,
    #[serde(default, rename = "ladySuggester")]
    pub lady_suggester: String,
    #[serde(default, rename = "ladyChosenPlayer")]
    pub lady_chosen_player: String,
    #[serde(default, rename = "ladyResponse")]
    pub lady_response: String,
    #[serde(default, rename = "LadyResponseOptions")]
    pub lady_response_options: Vec<String>,
    #[serde(default, rename = "ladyPublish")]
    pub lady_publish: String,
    #[serde(default, rename = "ladyPreviousSuggester")]
    pub lady_previous_suggester: String,
}

impl BoardSnapshot {
    /// Whether a game is in progress according to the phase code.
    pub fn has_started(&self) -> bool {
        self.state != phase::NOT_STARTED
    }
}

// ── Classification ──────────────────────────────────────────────────

/// Result of classifying one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Lobby roster update; applicable only while no game has started.
    Roster(Vec<PlayerName>),
    /// Wholesale board snapshot replacement.
    Snapshot(Box<BoardSnapshot>),
    /// Display line for the chat/system log.
    Log {
        sender: Option<String>,
        text: String,
    },
}

/// Classify an inbound frame by content shape.
///
/// The fallback order is load-bearing and must not be reordered:
///
/// 1. A `ty == "bla"` frame carrying a roster is a lobby update, but only
///    while `game_started` is false — once a game runs, such frames fall
///    through to the ordinary rules.
/// 2. If `content` decodes to a JSON object whose `type` is not
///    `"chat_message"`, the object *is* the new board snapshot.
/// 3. Everything else becomes a log line: the inner chat text when the chat
///    marker matched, otherwise the raw `content`, prefixed with the sender
///    when one is present.
pub fn classify(frame: &InboundFrame, game_started: bool) -> Classified {
    if !game_started && frame.ty.as_deref() == Some(ROSTER_FRAME_TYPE) {
        if let Some(players) = &frame.players {
            return Classified::Roster(players.clone());
        }
    }

    let raw = frame.content.clone().unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
        let inner_type = value.get("type").and_then(|t| t.as_str());
        if value.is_object() && inner_type != Some(CHAT_MARKER) {
            match serde_json::from_value::<BoardSnapshot>(value) {
                Ok(snapshot) => return Classified::Snapshot(Box::new(snapshot)),
                Err(e) => {
                    tracing::warn!("content looked like a snapshot but failed to decode: {e}");
                }
            }
        } else if inner_type == Some(CHAT_MARKER) {
            let text = value
                .get("content")
                .and_then(|c| c.as_str())
                .map(str::to_owned)
                .unwrap_or(raw);
            return Classified::Log {
                sender: frame.sender.clone(),
                text,
            };
        }
    }

    Classified::Log {
        sender: frame.sender.clone(),
        text: raw,
    }
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

    #[test]
    fn refresh_serializes_to_empty_envelope() {
        let json = serde_json::to_string(&Action::Refresh(String::new())).unwrap();
        assert_eq!(json, r#"{"type":"refresh","content":""}"#);
    }

    #[test]
    fn chat_message_serializes_with_text_content() {
        let json = serde_json::to_string(&Action::ChatMessage("hello table".into())).unwrap();
        assert_eq!(json, r#"{"type":"chat_message","content":"hello table"}"#);
    }

    #[test]
    fn vote_for_suggestion_uses_camel_case_player_name() {
        let json = serde_json::to_string(&Action::VoteForSuggestion(SuggestionVote {
            player_name: "Alice".into(),
            vote: true,
        }))
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"vote_for_suggestion","content":{"playerName":"Alice","vote":true}}"#
        );
    }

    #[test]
    fn classify_roster_frame_before_game_start() {
        let frame = InboundFrame {
            ty: Some("bla".into()),
            players: Some(vec![PlayerName::new("Alice"), PlayerName::new("Bob")]),
            ..Default::default()
        };
        let classified = classify(&frame, false);
        assert_eq!(
            classified,
            Classified::Roster(vec![PlayerName::new("Alice"), PlayerName::new("Bob")])
        );
    }

    #[test]
    fn roster_frame_ignored_once_game_started() {
        let frame = InboundFrame {
            ty: Some("bla".into()),
            players: Some(vec![PlayerName::new("Alice")]),
            ..Default::default()
        };
        // Falls through to the log rules: no content means an empty log line.
        let classified = classify(&frame, true);
        assert!(matches!(classified, Classified::Log { .. }));
    }

    #[test]
    fn classify_snapshot_from_structured_content() {
        let frame = InboundFrame {
            content: Some(r#"{"state": 2, "current": 1}"#.into()),
            ..Default::default()
        };
        match classify(&frame, true) {
            Classified::Snapshot(board) => {
                assert_eq!(board.state, 2);
                assert_eq!(board.current, 1);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn classify_chat_envelope_uses_inner_content() {
        let frame = InboundFrame {
            sender: Some("Alice".into()),
            content: Some(r#"{"type":"chat_message","content":"hi"}"#.into()),
            ..Default::default()
        };
        assert_eq!(
            classify(&frame, true),
            Classified::Log {
                sender: Some("Alice".into()),
                text: "hi".into(),
            }
        );
    }

    #[test]
    fn classify_unparseable_content_falls_back_to_raw_text() {
        let frame = InboundFrame {
            content: Some("/A new socket has connected.".into()),
            ..Default::default()
        };
        assert_eq!(
            classify(&frame, false),
            Classified::Log {
                sender: None,
                text: "/A new socket has connected.".into(),
            }
        );
    }

    #[test]
    fn classify_non_object_json_content_is_a_log_line() {
        // "123" parses as JSON but is not structured data.
        let frame = InboundFrame {
            content: Some("123".into()),
            ..Default::default()
        };
        assert_eq!(
            classify(&frame, true),
            Classified::Log {
                sender: None,
                text: "123".into(),
            }
        );
    }

    #[test]
    fn snapshot_decodes_real_coordinator_fields() {
        let json = r#"{
            "players": {"total": 5, "all": [{"player":"a"},{"player":"b"}], "active": []},
            "current": 2,
            "state": 4,
            "stateDescription": "journey voting",
            "results": {"1": {"final": 2, "numofplayers": 3, "successes": 3}},
            "excalibur": true,
            "suggestedExcalibur": "b",
            "isLady": true,
            "LadyResponseOptions": ["Good", "Bad"]
        }"#;
        let board: BoardSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(board.players.total, 5);
        assert_eq!(board.players.all.len(), 2);
        assert_eq!(board.state, phase::JOURNEY_VOTING);
        assert!(board.excalibur);
        assert!(board.is_lady);
        assert_eq!(board.results["1"].final_result, 2);
        assert_eq!(board.lady_response_options, vec!["Good", "Bad"]);
        assert!(board.has_started());
    }

    #[test]
    fn default_snapshot_has_not_started() {
        assert!(!BoardSnapshot::default().has_started());
    }
}
