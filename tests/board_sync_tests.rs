#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Integration tests for the session's board synchronization.
//!
//! Uses the shared mocks from `tests/common` to script coordinator frames
//! and verify the reducer's observable state: the snapshot watch channel,
//! the chat/system log, and the suggestion-vote prompt.

mod common;

use round_table_client::protocol::phase;
use round_table_client::Session;

use common::{
    chat_frame, frame_with_content, roster_frame, snapshot_frame, snapshot_frame_with, wait_until,
    ChannelConnector, MockConnector,
};

/// Start a session over a live channel-fed connection and wait for the
/// automatic refresh so the handshake is known to be complete.
async fn start_session() -> (
    Session,
    tokio::sync::mpsc::UnboundedSender<common::ScriptItem>,
    std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    std::sync::Arc<std::sync::atomic::AtomicBool>,
) {
    let (connector, frames, sent, closed) = ChannelConnector::new();
    let session = Session::new(connector);
    session.login("tok");
    {
        let sent = std::sync::Arc::clone(&sent);
        wait_until("refresh after open", move || !sent.lock().unwrap().is_empty()).await;
    }
    (session, frames, sent, closed)
}

fn feed(tx: &tokio::sync::mpsc::UnboundedSender<common::ScriptItem>, frame: String) {
    tx.send(Some(Ok(frame))).expect("connection task gone");
}

// ════════════════════════════════════════════════════════════════════
// Connection lifecycle
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn open_logs_and_requests_refresh() {
    let (session, _frames, sent, _closed) = start_session().await;

    assert_eq!(
        sent.lock().unwrap().as_slice(),
        [r#"{"type":"refresh","content":""}"#]
    );
    assert_eq!(
        session.board().log(),
        ["/The socket connection has been established"]
    );
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn remote_close_resets_snapshot_and_logs() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, snapshot_frame(phase::WAITING_FOR_SUGGESTION));
    {
        let board = session.board();
        wait_until("snapshot applied", move || board.snapshot().is_some()).await;
    }

    // Dropping the feeder is a clean remote close.
    drop(frames);
    {
        let board = session.board();
        wait_until("snapshot cleared on close", move || {
            board.snapshot().is_none()
        })
        .await;
    }

    let log = session.board().log();
    assert_eq!(
        log.last().map(String::as_str),
        Some("/The socket connection has been closed")
    );
}

#[tokio::test]
async fn logout_closes_the_transport() {
    let (session, _frames, _sent, closed) = start_session().await;

    session.logout();
    assert!(!session.is_authenticated());
    {
        let closed = std::sync::Arc::clone(&closed);
        wait_until("transport closed", move || {
            closed.load(std::sync::atomic::Ordering::Relaxed)
        })
        .await;
    }
}

#[tokio::test]
async fn actions_before_login_are_silently_dropped() {
    let (connector, sent, _) = MockConnector::new(vec![]);
    let session = Session::new(connector);

    // Must neither panic nor error, and must leave no trace in the state.
    session.actions().chat_message("into the void");
    session.actions().refresh();

    assert!(sent.lock().unwrap().is_empty());
    assert!(session.board().snapshot().is_none());
    assert!(session.board().log().is_empty());
}

// ════════════════════════════════════════════════════════════════════
// Snapshot reduction
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn snapshots_replace_wholesale() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(
        &frames,
        snapshot_frame_with(|board| {
            board.state = phase::WAITING_FOR_SUGGESTION;
            board.current = 1;
            board.suggested_players = vec!["Alice".into(), "Bob".into()];
        }),
    );
    {
        let board = session.board();
        wait_until("first snapshot", move || {
            board.snapshot().is_some_and(|b| b.current == 1)
        })
        .await;
    }

    // The second snapshot omits the suggested players; they must not
    // survive from the first one.
    feed(
        &frames,
        snapshot_frame_with(|board| {
            board.state = phase::JOURNEY_VOTING;
            board.current = 2;
        }),
    );
    {
        let board = session.board();
        wait_until("second snapshot", move || {
            board.snapshot().is_some_and(|b| b.current == 2)
        })
        .await;
    }

    let board = session.board().snapshot().expect("snapshot");
    assert_eq!(board.state, phase::JOURNEY_VOTING);
    assert!(board.suggested_players.is_empty());
}

#[tokio::test]
async fn board_watch_replays_latest_to_late_subscribers() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, snapshot_frame(phase::SIR_PICK_PLAYER));
    {
        let board = session.board();
        wait_until("snapshot applied", move || board.snapshot().is_some()).await;
    }

    // A receiver subscribed only now still sees the current board.
    let rx = session.board().board();
    let current = rx.borrow().clone().expect("current board");
    assert_eq!(current.state, phase::SIR_PICK_PLAYER);
}

#[tokio::test]
async fn malformed_frame_becomes_log_line() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, "not json at all".to_string());
    {
        let board = session.board();
        wait_until("malformed frame logged", move || {
            board.log().iter().any(|l| l == "not json at all")
        })
        .await;
    }
    assert!(session.board().snapshot().is_none());
}

// ════════════════════════════════════════════════════════════════════
// Chat and roster
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn chat_frames_log_sender_and_inner_text() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, chat_frame("Alice", "hi"));
    {
        let board = session.board();
        wait_until("chat logged", move || {
            board.log().iter().any(|l| l == "Alice: hi")
        })
        .await;
    }
}

#[tokio::test]
async fn plain_text_content_is_logged_verbatim() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, frame_with_content("/A new socket has connected."));
    {
        let board = session.board();
        wait_until("system line logged", move || {
            board.log().iter().any(|l| l == "/A new socket has connected.")
        })
        .await;
    }
}

#[tokio::test]
async fn roster_updates_lobby_players_before_game_start() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, roster_frame(&["Alice", "Bob", "Carol"]));
    {
        let board = session.board();
        wait_until("roster applied", move || {
            board.snapshot().is_some_and(|b| b.players.all.len() == 3)
        })
        .await;
    }

    let board = session.board().snapshot().expect("lobby board");
    assert!(!board.has_started());
    assert_eq!(session.board().player_count_hint(), 3);
}

#[tokio::test]
async fn roster_frames_are_ignored_once_game_started() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, roster_frame(&["Alice", "Bob"]));
    feed(
        &frames,
        snapshot_frame_with(|board| {
            board.state = phase::WAITING_FOR_SUGGESTION;
            board.players.all = vec![
                round_table_client::protocol::PlayerName::new("Alice"),
                round_table_client::protocol::PlayerName::new("Bob"),
            ];
        }),
    );
    {
        let board = session.board();
        wait_until("game started", move || {
            board.snapshot().is_some_and(|b| b.has_started())
        })
        .await;
    }

    // A stray roster frame mid-game degrades to a log line and leaves the
    // board alone.
    let log_len = session.board().log().len();
    feed(&frames, roster_frame(&["Mallory"]));
    {
        let board = session.board();
        wait_until("stray roster logged", move || board.log().len() > log_len).await;
    }

    let board = session.board().snapshot().expect("board");
    assert_eq!(board.players.all.len(), 2);
    assert!(board
        .players
        .all
        .iter()
        .all(|p| p.player != "Mallory"));
}

// ════════════════════════════════════════════════════════════════════
// Suggestion-vote prompt
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn prompt_fires_on_entry_and_clears_on_read() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, snapshot_frame(phase::SIR_PICK_PLAYER));
    feed(&frames, snapshot_frame(phase::SUGGESTION_VOTING));
    {
        let board = session.board();
        wait_until("entered suggestion voting", move || {
            board
                .snapshot()
                .is_some_and(|b| b.state == phase::SUGGESTION_VOTING)
        })
        .await;
    }

    assert!(session.board().take_suggestion_prompt());
    assert!(!session.board().take_suggestion_prompt());
}

#[tokio::test]
async fn prompt_does_not_refire_on_repeated_phase() {
    let (session, frames, _sent, _closed) = start_session().await;

    feed(&frames, snapshot_frame(phase::SUGGESTION_VOTING));
    {
        let board = session.board();
        wait_until("first entry", move || board.take_suggestion_prompt()).await;
    }

    // Same phase again, marked so we can tell when it has been reduced.
    feed(
        &frames,
        snapshot_frame_with(|board| {
            board.state = phase::SUGGESTION_VOTING;
            board.current = 7;
        }),
    );
    {
        let board = session.board();
        wait_until("repeat reduced", move || {
            board.snapshot().is_some_and(|b| b.current == 7)
        })
        .await;
    }

    assert!(!session.board().take_suggestion_prompt());
}

#[tokio::test]
async fn prompt_refires_after_leaving_and_reentering() {
    let (session, frames, _sent, _closed) = start_session().await;

    for (marker, state) in [
        (1, phase::SIR_PICK_PLAYER),
        (2, phase::SUGGESTION_VOTING),
        (3, phase::JOURNEY_VOTING),
        (4, phase::SUGGESTION_VOTING),
    ] {
        feed(
            &frames,
            snapshot_frame_with(|board| {
                board.state = state;
                board.current = marker;
            }),
        );
    }
    {
        let board = session.board();
        wait_until("sequence reduced", move || {
            board.snapshot().is_some_and(|b| b.current == 4)
        })
        .await;
    }

    // Two distinct entries happened; the latch was never read in between,
    // so exactly one prompt is pending now.
    assert!(session.board().take_suggestion_prompt());
    assert!(!session.board().take_suggestion_prompt());
}

// ════════════════════════════════════════════════════════════════════
// Actions over a live session
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn chat_action_reaches_the_wire() {
    let (session, _frames, sent, _closed) = start_session().await;

    session.actions().chat_message("good quest everyone");
    {
        let sent = std::sync::Arc::clone(&sent);
        wait_until("chat sent", move || sent.lock().unwrap().len() == 2).await;
    }

    assert_eq!(
        sent.lock().unwrap()[1],
        r#"{"type":"chat_message","content":"good quest everyone"}"#
    );
}

#[tokio::test]
async fn unchosen_journey_vote_is_never_sent() {
    let (session, _frames, sent, _closed) = start_session().await;

    session.actions().vote_for_journey("Alice", -1);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Only the automatic refresh is on the wire.
    assert_eq!(sent.lock().unwrap().len(), 1);
}
