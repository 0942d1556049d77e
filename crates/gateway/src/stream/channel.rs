//! Reconnecting subscription to a room's event stream.

use std::fmt;

use futures_util::StreamExt;
use reqwest::Response;
use rpchat_chats::{RoomEvent, RoomId};
use rpchat_config::StreamConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::backoff::Backoff;
use super::frame::SseDecoder;
use crate::client::GatewayClient;

/// Connection state of a live channel, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Live,
    Reconnecting { attempt: u32, reason: String },
    /// The channel stopped for good; the transcript no longer updates.
    NotLive { reason: String },
    Closed,
}

impl ChannelStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, ChannelStatus::Live)
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelStatus::Connecting => write!(f, "connecting"),
            ChannelStatus::Live => write!(f, "live"),
            ChannelStatus::Reconnecting { attempt, reason } => {
                write!(f, "reconnecting (attempt {attempt}): {reason}")
            }
            ChannelStatus::NotLive { reason } => write!(f, "not live: {reason}"),
            ChannelStatus::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelUpdate {
    Status(ChannelStatus),
    Event(RoomEvent),
    /// A connection came up after a failure. Events sent while the channel
    /// was down are lost and the consumer should resync.
    Reconnected,
}

/// Live subscription to one room.
///
/// Updates are produced by a background task in the order the backend sent
/// them. Dropping the channel stops the task.
#[derive(Debug)]
pub struct LiveChannel {
    room_id: RoomId,
    receiver: mpsc::Receiver<ChannelUpdate>,
    task: JoinHandle<()>,
}

impl LiveChannel {
    pub fn open(client: GatewayClient, room_id: RoomId, config: StreamConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.event_buffer.max(1));
        let task = tokio::spawn(run_channel(client, room_id, config, sender));

        Self {
            room_id,
            receiver,
            task,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Next update, or `None` once the channel has stopped and drained.
    pub async fn next_update(&mut self) -> Option<ChannelUpdate> {
        self.receiver.recv().await
    }

    /// Stop the subscription. Buffered updates are discarded.
    pub fn close(&mut self) {
        self.task.abort();
        self.receiver.close();
        debug!(room_id = self.room_id, "live channel closed");
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum StreamEnd {
    ServerClosed,
    ReceiverGone,
}

async fn run_channel(
    client: GatewayClient,
    room_id: RoomId,
    config: StreamConfig,
    sender: mpsc::Sender<ChannelUpdate>,
) {
    let backoff = Backoff::new(config.initial_backoff(), config.max_backoff());
    let mut attempt = 0u32;
    let mut recovering = false;

    if !emit(&sender, ChannelUpdate::Status(ChannelStatus::Connecting)).await {
        return;
    }

    loop {
        let reason = match client.open_event_stream(room_id).await {
            Ok(response) => {
                info!(room_id, "live channel connected");
                if !emit(&sender, ChannelUpdate::Status(ChannelStatus::Live)).await {
                    return;
                }
                if recovering && !emit(&sender, ChannelUpdate::Reconnected).await {
                    return;
                }

                let connected_at = Instant::now();
                let mut frames = 0usize;
                let end = pump_events(room_id, response, &sender, &mut frames).await;

                // A connection that drops before delivering anything, and
                // sooner than the backoff ceiling, still counts as a failure.
                if frames > 0 || connected_at.elapsed() >= config.max_backoff() {
                    attempt = 0;
                }

                match end {
                    Ok(StreamEnd::ReceiverGone) => return,
                    Ok(StreamEnd::ServerClosed) => "stream ended by server".to_string(),
                    Err(error) => error.to_string(),
                }
            }
            Err(error) => error.to_string(),
        };
        recovering = true;

        if !config.reconnect {
            warn!(room_id, %reason, "live channel lost");
            emit(&sender, ChannelUpdate::Status(ChannelStatus::NotLive { reason })).await;
            return;
        }

        attempt += 1;
        if attempt > config.max_reconnect_attempts {
            warn!(room_id, %reason, attempts = attempt - 1, "giving up on live channel");
            let reason = format!("gave up after {} attempts: {reason}", attempt - 1);
            emit(&sender, ChannelUpdate::Status(ChannelStatus::NotLive { reason })).await;
            return;
        }

        let delay = backoff.delay(attempt);
        warn!(room_id, %reason, attempt, ?delay, "live channel dropped, reconnecting");
        let status = ChannelStatus::Reconnecting { attempt, reason };
        if !emit(&sender, ChannelUpdate::Status(status)).await {
            return;
        }
        tokio::time::sleep(delay).await;
    }
}

async fn pump_events(
    room_id: RoomId,
    response: Response,
    sender: &mpsc::Sender<ChannelUpdate>,
    frames: &mut usize,
) -> Result<StreamEnd, reqwest::Error> {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for frame in decoder.push(&chunk) {
            *frames += 1;
            if !frame.is_default_event() {
                debug!(room_id, event = ?frame.event, "ignoring named event");
                continue;
            }

            match RoomEvent::decode(&frame.data) {
                Ok(event) => {
                    if !emit(sender, ChannelUpdate::Event(event)).await {
                        return Ok(StreamEnd::ReceiverGone);
                    }
                }
                Err(error) => {
                    warn!(room_id, %error, data = %frame.data, "dropping undecodable event");
                }
            }
        }
    }

    Ok(StreamEnd::ServerClosed)
}

/// Returns false once nobody is listening.
async fn emit(sender: &mpsc::Sender<ChannelUpdate>, update: ChannelUpdate) -> bool {
    sender.send(update).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_is_human_readable() {
        let status = ChannelStatus::Reconnecting {
            attempt: 2,
            reason: "connection reset".into(),
        };
        assert_eq!(status.to_string(), "reconnecting (attempt 2): connection reset");
        assert_eq!(
            ChannelStatus::NotLive {
                reason: "stream ended by server".into()
            }
            .to_string(),
            "not live: stream ended by server"
        );
        assert!(ChannelStatus::Live.is_live());
    }
}
