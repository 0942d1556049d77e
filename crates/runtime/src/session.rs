//! One open room: its transcript, typing set and live channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rpchat_chats::{
    Message, OrderingPolicy, Participant, Room, RoomId, Roster, TranscriptStore, TypingTracker,
};
use rpchat_config::{AppConfig, TranscriptOrdering};
use rpchat_gateway::{ChannelStatus, ChannelUpdate, GatewayClient, GatewayResult, LiveChannel};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

const TYPING_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct SessionState {
    room: Room,
    roster: Roster,
    transcript: TranscriptStore,
    typing: TypingTracker,
    status: ChannelStatus,
}

/// Render-ready copy of a session's state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub room: Room,
    pub messages: Vec<Message>,
    /// "X is typing..." lines, in the order participants started typing
    pub typing: Vec<String>,
    pub status: ChannelStatus,
}

/// A live session for one room.
///
/// Opening fetches the room, its participants and its transcript while the
/// live channel connects. Events received before the transcript loads are
/// held in the channel buffer and applied afterwards, so a message delivered
/// by both paths is stored once. A single task applies events in arrival
/// order; each event is applied completely before the next is read.
pub struct ChatSession {
    id: Uuid,
    room_id: RoomId,
    client: GatewayClient,
    state: Arc<RwLock<SessionState>>,
    closed: Arc<AtomicBool>,
    revision: Arc<watch::Sender<u64>>,
    ingest: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    pub async fn open(
        client: GatewayClient,
        room_id: RoomId,
        config: &AppConfig,
    ) -> GatewayResult<Self> {
        let id = Uuid::new_v4();
        let channel = LiveChannel::open(client.clone(), room_id, config.stream.clone());

        // On failure the channel is dropped here, which stops it.
        let (room, participants, messages) = tokio::try_join!(
            client.get_room(room_id),
            client.list_participants(room_id),
            client.list_messages(room_id),
        )?;

        let mut transcript = TranscriptStore::new(ordering_policy(config.transcript.ordering));
        let loaded = transcript.load(messages);
        info!(
            session_id = %id,
            room_id,
            room = %room.name,
            messages = loaded,
            participants = participants.len(),
            "session opened"
        );

        let state = Arc::new(RwLock::new(SessionState {
            room,
            roster: Roster::new(participants),
            transcript,
            typing: TypingTracker::new(config.typing.expiry()),
            status: ChannelStatus::Connecting,
        }));
        let closed = Arc::new(AtomicBool::new(false));
        let (revision, _) = watch::channel(0u64);
        let revision = Arc::new(revision);

        let ingest = tokio::spawn(run_ingest(
            IngestContext {
                session_id: id,
                room_id,
                client: client.clone(),
                state: Arc::clone(&state),
                closed: Arc::clone(&closed),
                revision: Arc::clone(&revision),
                sweep_typing: config.typing.expiry().is_some(),
            },
            channel,
        ));

        Ok(Self {
            id,
            room_id,
            client,
            state,
            closed,
            revision,
            ingest: Mutex::new(Some(ingest)),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the live channel. Later events and late command results are
    /// discarded. Closing twice is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let handle = match self.ingest.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
        self.notify();
        info!(session_id = %self.id, room_id = self.room_id, "session closed");
    }

    /// Receiver that changes whenever visible state changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            room: state.room.clone(),
            messages: state.transcript.snapshot().to_vec(),
            typing: state.roster.typing_labels(&state.typing.participants()),
            status: self.status_of(&state),
        }
    }

    pub async fn room(&self) -> Room {
        self.state.read().await.room.clone()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.transcript.snapshot().to_vec()
    }

    pub async fn message(&self, message_id: rpchat_chats::MessageId) -> Option<Message> {
        self.state.read().await.transcript.get(message_id).cloned()
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.state.read().await.roster.participants().to_vec()
    }

    /// The participant the operator speaks as.
    pub async fn acting_participant(&self) -> Option<Participant> {
        self.state.read().await.roster.acting().cloned()
    }

    pub async fn typing_labels(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.roster.typing_labels(&state.typing.participants())
    }

    pub async fn status(&self) -> ChannelStatus {
        let state = self.state.read().await;
        self.status_of(&state)
    }

    pub async fn latest_human_message(&self) -> Option<Message> {
        self.state
            .read()
            .await
            .transcript
            .latest_human_message()
            .cloned()
    }

    /// Empty the transcript after the backend cleared the room's history.
    ///
    /// Returns false without touching state if the session has closed.
    pub(crate) async fn reset_transcript(&self) -> bool {
        let mut state = self.state.write().await;
        if self.is_closed() {
            return false;
        }
        state.transcript.reset();
        drop(state);
        self.notify();
        true
    }

    fn status_of(&self, state: &SessionState) -> ChannelStatus {
        if self.is_closed() {
            ChannelStatus::Closed
        } else {
            state.status.clone()
        }
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("room_id", &self.room_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

pub(crate) fn ordering_policy(ordering: TranscriptOrdering) -> OrderingPolicy {
    match ordering {
        TranscriptOrdering::Arrival => OrderingPolicy::Arrival,
        TranscriptOrdering::Timestamp => OrderingPolicy::Timestamp,
    }
}

struct IngestContext {
    session_id: Uuid,
    room_id: RoomId,
    client: GatewayClient,
    state: Arc<RwLock<SessionState>>,
    closed: Arc<AtomicBool>,
    revision: Arc<watch::Sender<u64>>,
    sweep_typing: bool,
}

impl IngestContext {
    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

async fn run_ingest(ctx: IngestContext, mut channel: LiveChannel) {
    let mut sweep = tokio::time::interval(TYPING_SWEEP_INTERVAL);

    loop {
        tokio::select! {
            update = channel.next_update() => {
                let Some(update) = update else {
                    debug!(session_id = %ctx.session_id, "live channel finished");
                    break;
                };
                if ctx.is_closed() {
                    break;
                }
                handle_update(&ctx, update).await;
            }
            _ = sweep.tick(), if ctx.sweep_typing => {
                let expired = ctx.state.write().await.typing.expire(Instant::now());
                if !expired.is_empty() {
                    debug!(session_id = %ctx.session_id, ?expired, "typing indicators expired");
                    ctx.bump();
                }
            }
        }
    }

    channel.close();
}

async fn handle_update(ctx: &IngestContext, update: ChannelUpdate) {
    match update {
        ChannelUpdate::Status(status) => {
            debug!(session_id = %ctx.session_id, room_id = ctx.room_id, %status, "channel status");
            ctx.state.write().await.status = status;
            ctx.bump();
        }
        ChannelUpdate::Event(event) => {
            let kind = event.event_type_name();
            let mut state = ctx.state.write().await;
            // Re-check under the lock: close() may have run while waiting.
            if ctx.is_closed() {
                return;
            }
            let SessionState {
                transcript, typing, ..
            } = &mut *state;
            let changed = event.apply(transcript, typing, Instant::now());
            drop(state);

            debug!(session_id = %ctx.session_id, room_id = ctx.room_id, kind, changed, "event applied");
            if changed {
                ctx.bump();
            }
        }
        ChannelUpdate::Reconnected => resync(ctx).await,
    }
}

/// Replace the transcript with the backend's copy after events may have
/// been missed. Events that arrive meanwhile wait in the channel buffer.
async fn resync(ctx: &IngestContext) {
    match ctx.client.list_messages(ctx.room_id).await {
        Ok(messages) => {
            let mut state = ctx.state.write().await;
            if ctx.is_closed() {
                return;
            }
            // Typing entries may be waiting on message events lost while down.
            state.typing.clear();
            state.transcript.reset();
            let loaded = state.transcript.load(messages);
            drop(state);

            info!(session_id = %ctx.session_id, room_id = ctx.room_id, messages = loaded, "transcript resynchronised");
            ctx.bump();
        }
        Err(error) => {
            warn!(session_id = %ctx.session_id, room_id = ctx.room_id, %error, "transcript resync failed");
        }
    }
}
