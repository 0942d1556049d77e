//! Integration tests for the gateway crate against a mock backend.

use std::time::Duration;

use httpmock::prelude::*;
use rpchat_chats::{CallOutcome, RoomEvent, StepType};
use rpchat_config::StreamConfig;
use rpchat_gateway::{ChannelStatus, ChannelUpdate, GatewayClient, GatewayError, LiveChannel};
use serde_json::json;

fn client_for(server: &MockServer) -> GatewayClient {
    GatewayClient::new(server.base_url(), Duration::from_secs(2)).expect("valid base url")
}

fn message_json(id: i64, participant_id: i64, is_ai: bool) -> serde_json::Value {
    json!({
        "id": id,
        "room_id": 1,
        "participant_id": participant_id,
        "participant_name": format!("P{participant_id}"),
        "participant_avatar": "",
        "content": format!("message {id}"),
        "is_ai": is_ai,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

fn sse_body(records: &[String]) -> String {
    records
        .iter()
        .map(|record| format!("data: {record}\n\n"))
        .collect()
}

fn stream_config(reconnect: bool, max_reconnect_attempts: u32) -> StreamConfig {
    StreamConfig {
        reconnect,
        initial_backoff_ms: 10,
        max_backoff_ms: 20,
        max_reconnect_attempts,
        event_buffer: 16,
    }
}

async fn collect_until<F>(channel: &mut LiveChannel, mut stop: F) -> Vec<ChannelUpdate>
where
    F: FnMut(&ChannelUpdate) -> bool,
{
    let mut updates = Vec::new();
    let collect = async {
        while let Some(update) = channel.next_update().await {
            let done = stop(&update);
            updates.push(update);
            if done {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), collect)
        .await
        .expect("channel should reach the expected update");
    updates
}

#[tokio::test]
async fn room_snapshot_endpoints_decode_and_treat_null_as_empty() {
    let server = MockServer::start_async().await;

    let _room = server
        .mock_async(|when, then| {
            when.method(GET).path("/rooms/1");
            then.status(200).json_body(json!({
                "id": 1,
                "name": "Tavern",
                "description": "A crowded tavern",
                "setting": "Medieval",
                "created_at": "2024-05-01T09:00:00Z",
                "updated_at": "2024-05-01T09:00:00Z"
            }));
        })
        .await;
    let _participants = server
        .mock_async(|when, then| {
            when.method(GET).path("/rooms/1/participants");
            then.status(200).body("null");
        })
        .await;
    let _messages = server
        .mock_async(|when, then| {
            when.method(GET).path("/rooms/1/messages");
            then.status(200)
                .json_body(json!([message_json(1, 7, false), message_json(2, 8, true)]));
        })
        .await;

    let client = client_for(&server);
    let room = client.get_room(1).await.expect("room");
    let participants = client.list_participants(1).await.expect("participants");
    let messages = client.list_messages(1).await.expect("messages");

    assert_eq!(room.name, "Tavern");
    assert!(participants.is_empty());
    assert_eq!(messages.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn send_message_posts_content_as_json() {
    let server = MockServer::start_async().await;

    let chat = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rooms/3/chat")
                .json_body(json!({ "content": "Hello there" }));
            then.status(200).json_body(json!({ "status": "processing" }));
        })
        .await;

    client_for(&server)
        .send_message(3, "Hello there")
        .await
        .expect("send should succeed");

    chat.assert_async().await;
}

#[tokio::test]
async fn message_mutations_use_put_and_delete() {
    let server = MockServer::start_async().await;

    let edit = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/messages/12")
                .json_body(json!({ "content": "rewritten" }));
            then.status(204);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/messages/12");
            then.status(204);
        })
        .await;
    let clear = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/rooms/1/messages");
            then.status(204);
        })
        .await;

    let client = client_for(&server);
    client.edit_message(12, "rewritten").await.expect("edit");
    client.delete_message(12).await.expect("delete");
    client.clear_history(1).await.expect("clear");

    edit.assert_async().await;
    delete.assert_async().await;
    clear.assert_async().await;
}

#[tokio::test]
async fn regenerate_reports_removed_reply_count() {
    let server = MockServer::start_async().await;

    let _regen = server
        .mock_async(|when, then| {
            when.method(POST).path("/rooms/1/regenerate");
            then.status(200)
                .json_body(json!({ "status": "regenerating", "deleted_count": 2 }));
        })
        .await;

    let response = client_for(&server).regenerate(1).await.expect("regenerate");

    assert_eq!(response.status, "regenerating");
    assert_eq!(response.deleted_count, 2);
}

#[tokio::test]
async fn backend_error_body_is_surfaced() {
    let server = MockServer::start_async().await;

    let _regen = server
        .mock_async(|when, then| {
            when.method(POST).path("/rooms/1/regenerate");
            then.status(400)
                .json_body(json!({ "error": "No user message found to regenerate from" }));
        })
        .await;
    let _delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/messages/99");
            then.status(500).body("database is locked");
        })
        .await;

    let client = client_for(&server);

    match client.regenerate(1).await {
        Err(GatewayError::Status {
            status, message, ..
        }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "No user message found to regenerate from");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let error = client.delete_message(99).await.expect_err("server error");
    assert!(error.is_transient());
    assert!(error.to_string().contains("database is locked"));
}

#[tokio::test]
async fn introspection_endpoints_decode_records() {
    let server = MockServer::start_async().await;

    let _logs = server
        .mock_async(|when, then| {
            when.method(GET).path("/messages/5/llm-logs");
            then.status(200).json_body(json!({
                "logs": [{
                    "id": 1,
                    "message_id": 5,
                    "room_id": 1,
                    "call_type": "response_generation",
                    "model_name": "gpt-4o",
                    "temperature": 0.8,
                    "max_tokens": 1024,
                    "request_body": "{}",
                    "response_body": "",
                    "prompt_tokens": 10,
                    "completion_tokens": 0,
                    "latency_ms": 120,
                    "error_message": "rate limited",
                    "created_at": "2024-05-01T10:00:00Z"
                }]
            }));
        })
        .await;
    let _decisions = server
        .mock_async(|when, then| {
            when.method(GET).path("/messages/5/decisions");
            then.status(200).json_body(json!({ "decisions": null }));
        })
        .await;
    let _steps = server
        .mock_async(|when, then| {
            when.method(GET).path("/messages/6/decisions");
            then.status(200).json_body(json!({
                "decisions": [{
                    "id": 3,
                    "message_id": 6,
                    "room_id": 1,
                    "step_order": 1,
                    "step_type": "parse_mentions",
                    "input_data": "{}",
                    "output_data": "{}",
                    "llm_call_log_id": 0,
                    "reason": "no mentions",
                    "created_at": "2024-05-01T10:00:00Z"
                }]
            }));
        })
        .await;

    let client = client_for(&server);
    let logs = client.llm_logs(5).await.expect("logs");
    let empty = client.decisions(5).await.expect("decisions");
    let steps = client.decisions(6).await.expect("decisions");

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].outcome, CallOutcome::Error("rate limited".to_string()));
    assert!(empty.is_empty());
    assert_eq!(steps[0].step_type, StepType::ParseMentions);
}

#[tokio::test]
async fn live_channel_delivers_events_in_order_and_skips_bad_records() {
    let server = MockServer::start_async().await;

    let body = format!(
        ": connected\n\n{}event: heartbeat\ndata: {{}}\n\n{}",
        sse_body(&[
            r#"{"type":"typing","participant_id":8}"#.to_string(),
            "{not json".to_string(),
            r#"{"type":"presence","participant_id":8}"#.to_string(),
        ]),
        sse_body(&[
            json!({ "type": "message", "message": message_json(4, 8, true) }).to_string(),
            r#"{"type":"message_deleted","message_id":2}"#.to_string(),
        ]),
    );
    let _events = server
        .mock_async(|when, then| {
            when.method(GET).path("/rooms/1/events");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
        .await;

    let mut channel = LiveChannel::open(client_for(&server), 1, stream_config(false, 0));
    let updates = collect_until(&mut channel, |update| {
        matches!(update, ChannelUpdate::Status(ChannelStatus::NotLive { .. }))
    })
    .await;

    let events: Vec<&RoomEvent> = updates
        .iter()
        .filter_map(|update| match update {
            ChannelUpdate::Event(event) => Some(event),
            _ => None,
        })
        .collect();
    let kinds: Vec<&str> = events.iter().map(|event| event.event_type_name()).collect();

    assert_eq!(updates[0], ChannelUpdate::Status(ChannelStatus::Connecting));
    assert_eq!(updates[1], ChannelUpdate::Status(ChannelStatus::Live));
    assert_eq!(kinds, vec!["typing", "message", "message_deleted"]);
    assert!(!updates.contains(&ChannelUpdate::Reconnected));
}

#[tokio::test]
async fn live_channel_without_reconnect_goes_not_live_on_failure() {
    let server = MockServer::start_async().await;

    let events = server
        .mock_async(|when, then| {
            when.method(GET).path("/rooms/1/events");
            then.status(503);
        })
        .await;

    let mut channel = LiveChannel::open(client_for(&server), 1, stream_config(false, 5));
    let updates = collect_until(&mut channel, |update| {
        matches!(update, ChannelUpdate::Status(ChannelStatus::NotLive { .. }))
    })
    .await;

    assert_eq!(updates.len(), 2);
    assert_eq!(events.hits_async().await, 1);
    assert!(channel.next_update().await.is_none());
}

#[tokio::test]
async fn live_channel_signals_reconnect_after_stream_drop() {
    let server = MockServer::start_async().await;

    let _events = server
        .mock_async(|when, then| {
            when.method(GET).path("/rooms/1/events");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse_body(&[r#"{"type":"typing","participant_id":8}"#.to_string()]));
        })
        .await;

    let mut channel = LiveChannel::open(client_for(&server), 1, stream_config(true, 3));
    let updates = collect_until(&mut channel, |update| {
        matches!(update, ChannelUpdate::Reconnected)
    })
    .await;
    channel.close();

    let reconnecting = updates
        .iter()
        .position(|update| {
            matches!(
                update,
                ChannelUpdate::Status(ChannelStatus::Reconnecting { attempt: 1, .. })
            )
        })
        .expect("a reconnect attempt is announced");
    let typing_events = updates
        .iter()
        .filter(|update| matches!(update, ChannelUpdate::Event(_)))
        .count();

    assert!(reconnecting > 0);
    assert_eq!(typing_events, 1);
    assert_eq!(
        updates[updates.len() - 2],
        ChannelUpdate::Status(ChannelStatus::Live)
    );
}

#[tokio::test]
async fn live_channel_gives_up_after_max_attempts() {
    let server = MockServer::start_async().await;

    let events = server
        .mock_async(|when, then| {
            when.method(GET).path("/rooms/1/events");
            then.status(500).body("boom");
        })
        .await;

    let mut channel = LiveChannel::open(client_for(&server), 1, stream_config(true, 2));
    let updates = collect_until(&mut channel, |update| {
        matches!(update, ChannelUpdate::Status(ChannelStatus::NotLive { .. }))
    })
    .await;

    let attempts: Vec<u32> = updates
        .iter()
        .filter_map(|update| match update {
            ChannelUpdate::Status(ChannelStatus::Reconnecting { attempt, .. }) => Some(*attempt),
            _ => None,
        })
        .collect();

    assert_eq!(attempts, vec![1, 2]);
    assert_eq!(events.hits_async().await, 3);
    match updates.last() {
        Some(ChannelUpdate::Status(ChannelStatus::NotLive { reason })) => {
            assert!(reason.starts_with("gave up after 2 attempts"), "{reason}");
        }
        other => panic!("expected not-live status, got {other:?}"),
    }
}

#[tokio::test]
async fn live_channel_backs_off_when_streams_end_without_events() {
    let server = MockServer::start_async().await;

    let events = server
        .mock_async(|when, then| {
            when.method(GET).path("/rooms/1/events");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body("");
        })
        .await;

    let config = StreamConfig {
        max_backoff_ms: 1_000,
        ..stream_config(true, 2)
    };
    let mut channel = LiveChannel::open(client_for(&server), 1, config);
    let updates = collect_until(&mut channel, |update| {
        matches!(update, ChannelUpdate::Status(ChannelStatus::NotLive { .. }))
    })
    .await;

    let attempts: Vec<u32> = updates
        .iter()
        .filter_map(|update| match update {
            ChannelUpdate::Status(ChannelStatus::Reconnecting { attempt, .. }) => Some(*attempt),
            _ => None,
        })
        .collect();
    let resyncs = updates
        .iter()
        .filter(|update| matches!(update, ChannelUpdate::Reconnected))
        .count();

    assert_eq!(attempts, vec![1, 2]);
    assert_eq!(resyncs, 2);
    assert_eq!(events.hits_async().await, 3);
    match updates.last() {
        Some(ChannelUpdate::Status(ChannelStatus::NotLive { reason })) => {
            assert!(reason.starts_with("gave up after 2 attempts"), "{reason}");
            assert!(reason.ends_with("stream ended by server"), "{reason}");
        }
        other => panic!("expected not-live status, got {other:?}"),
    }
}
