#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Wire-format tests for the Round Table protocol types.
//!
//! Every outbound action is checked against the exact JSON text the
//! coordinator expects; inbound classification is checked against frames as
//! the coordinator sends them.

use round_table_client::protocol::{
    classify, Classified, InboundFrame, JourneyVote, MurderPayload, PlayerName, SirPickPayload,
    StartGamePayload, SuggestionPayload, SuggestionVote,
};
use round_table_client::{Action, RoleChoice};

fn wire(action: &Action) -> String {
    serde_json::to_string(action).expect("action serialization")
}

// ════════════════════════════════════════════════════════════════════
// Outbound envelopes
// ════════════════════════════════════════════════════════════════════

#[test]
fn refresh_envelope() {
    assert_eq!(
        wire(&Action::Refresh(String::new())),
        r#"{"type":"refresh","content":""}"#
    );
}

#[test]
fn reset_envelope() {
    assert_eq!(
        wire(&Action::Reset(String::new())),
        r#"{"type":"reset","content":""}"#
    );
}

#[test]
fn chat_message_envelope() {
    assert_eq!(
        wire(&Action::ChatMessage("hello table".into())),
        r#"{"type":"chat_message","content":"hello table"}"#
    );
}

#[test]
fn add_player_envelope() {
    assert_eq!(
        wire(&Action::AddPlayer("Alice".into())),
        r#"{"type":"add_player","content":"Alice"}"#
    );
}

#[test]
fn suggestion_tmp_envelope() {
    assert_eq!(
        wire(&Action::SuggestionTmp(vec!["Alice".into(), "Bob".into()])),
        r#"{"type":"suggestion_tmp","content":["Alice","Bob"]}"#
    );
}

#[test]
fn suggestion_envelope() {
    assert_eq!(
        wire(&Action::Suggestion(SuggestionPayload {
            players: vec!["Alice".into(), "Bob".into()],
            excalibur: "Bob".into(),
        })),
        r#"{"type":"suggestion","content":{"players":["Alice","Bob"],"excalibur":"Bob"}}"#
    );
}

#[test]
fn suggestion_without_excalibur_sends_empty_string() {
    assert_eq!(
        wire(&Action::Suggestion(SuggestionPayload {
            players: vec!["Alice".into()],
            excalibur: String::new(),
        })),
        r#"{"type":"suggestion","content":{"players":["Alice"],"excalibur":""}}"#
    );
}

#[test]
fn excalibur_pick_envelope() {
    assert_eq!(
        wire(&Action::ExcaliburPick(vec!["Carol".into()])),
        r#"{"type":"excalibur_pick","content":["Carol"]}"#
    );
}

#[test]
fn vote_for_suggestion_envelope() {
    assert_eq!(
        wire(&Action::VoteForSuggestion(SuggestionVote {
            player_name: "Alice".into(),
            vote: false,
        })),
        r#"{"type":"vote_for_suggestion","content":{"playerName":"Alice","vote":false}}"#
    );
}

#[test]
fn vote_for_journey_envelope() {
    assert_eq!(
        wire(&Action::VoteForJourney(JourneyVote {
            player_name: "Bob".into(),
            vote: 1,
        })),
        r#"{"type":"vote_for_journey","content":{"playerName":"Bob","vote":1}}"#
    );
}

#[test]
fn murder_envelope_carries_target_and_roster() {
    assert_eq!(
        wire(&Action::Murder(MurderPayload {
            assassinkill: "Merlin-player".into(),
            rest: vec![PlayerName::new("Alice"), PlayerName::new("Bob")],
        })),
        r#"{"type":"murder","content":{"assassinkill":"Merlin-player","rest":[{"player":"Alice"},{"player":"Bob"}]}}"#
    );
}

#[test]
fn sir_pick_envelope() {
    assert_eq!(
        wire(&Action::SirPick(SirPickPayload {
            pick: "Carol".into()
        })),
        r#"{"type":"sir_pick","content":{"pick":"Carol"}}"#
    );
}

#[test]
fn lady_envelopes() {
    assert_eq!(
        wire(&Action::LadySuggest("Dave".into())),
        r#"{"type":"lady_suggest","content":"Dave"}"#
    );
    assert_eq!(
        wire(&Action::LadyResponse(1)),
        r#"{"type":"lady_response","content":1}"#
    );
    assert_eq!(
        wire(&Action::LadyPublishResponse(0)),
        r#"{"type":"lady_publish_response","content":0}"#
    );
}

#[test]
fn start_game_envelope() {
    assert_eq!(
        wire(&Action::StartGame(StartGamePayload {
            characters: vec![
                RoleChoice {
                    name: "Merlin".into(),
                    checked: true,
                    assassin: false,
                },
                RoleChoice {
                    name: "Morgana".into(),
                    checked: true,
                    assassin: true,
                },
            ],
            excalibur: true,
            lady: false,
        })),
        concat!(
            r#"{"type":"start_game","content":{"characters":["#,
            r#"{"name":"Merlin","checked":true,"assassin":false},"#,
            r#"{"name":"Morgana","checked":true,"assassin":true}],"#,
            r#""excalibur":true,"lady":false}}"#
        )
    );
}

// ════════════════════════════════════════════════════════════════════
// Inbound classification
// ════════════════════════════════════════════════════════════════════

fn frame(content: &str) -> InboundFrame {
    InboundFrame {
        content: Some(content.to_string()),
        ..Default::default()
    }
}

#[test]
fn snapshot_content_classifies_as_snapshot() {
    let classified = classify(&frame(r#"{"state":3,"current":2}"#), true);
    match classified {
        Classified::Snapshot(board) => {
            assert_eq!(board.state, 3);
            assert_eq!(board.current, 2);
        }
        other => panic!("expected snapshot, got {other:?}"),
    }
}

#[test]
fn chat_envelope_classifies_as_log_with_inner_text() {
    let mut chat = frame(r#"{"type":"chat_message","content":"gl hf"}"#);
    chat.sender = Some("Alice".into());
    assert_eq!(
        classify(&chat, true),
        Classified::Log {
            sender: Some("Alice".into()),
            text: "gl hf".into(),
        }
    );
}

#[test]
fn plain_text_classifies_as_raw_log() {
    assert_eq!(
        classify(&frame("/A socket has disconnected."), true),
        Classified::Log {
            sender: None,
            text: "/A socket has disconnected.".into(),
        }
    );
}

#[test]
fn numeric_json_content_classifies_as_raw_log() {
    assert_eq!(
        classify(&frame("123"), true),
        Classified::Log {
            sender: None,
            text: "123".into(),
        }
    );
}

#[test]
fn roster_classifies_only_before_game_start() {
    let roster = InboundFrame {
        ty: Some("bla".into()),
        players: Some(vec![PlayerName::new("Alice")]),
        ..Default::default()
    };
    assert_eq!(
        classify(&roster, false),
        Classified::Roster(vec![PlayerName::new("Alice")])
    );
    assert!(matches!(classify(&roster, true), Classified::Log { .. }));
}

#[test]
fn roster_frame_without_players_falls_through() {
    let bare = InboundFrame {
        ty: Some("bla".into()),
        ..Default::default()
    };
    assert!(matches!(classify(&bare, false), Classified::Log { .. }));
}

#[test]
fn empty_frame_is_an_empty_log_line() {
    assert_eq!(
        classify(&InboundFrame::default(), false),
        Classified::Log {
            sender: None,
            text: String::new(),
        }
    );
}
