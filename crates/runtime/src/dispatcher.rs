//! User intents turned into backend requests.
//!
//! Nothing here mutates the transcript optimistically. The backend pushes the
//! resulting `message`, `message_edited` and `message_deleted` events on the
//! live channel and the session applies them like any other. Clearing history
//! is the exception: the backend sends no event for it, so a successful clear
//! empties the transcript directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rpchat_chats::utils::Validator;
use rpchat_chats::{ChatError, MessageId, RegenerateResponse};
use rpchat_gateway::GatewayClient;
use tracing::{info, warn};

use crate::error::{CommandError, CommandResult};
use crate::session::ChatSession;

/// Asks the operator to confirm a destructive action.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, question: &str) -> bool;
}

/// Answers every prompt the same way, e.g. for `--yes` on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl ConfirmationPrompt for FixedAnswer {
    async fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

/// A message edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub message_id: MessageId,
    pub content: String,
}

impl EditDraft {
    pub fn new(message_id: MessageId, content: impl Into<String>) -> Self {
        Self {
            message_id,
            content: content.into(),
        }
    }
}

/// Resets the in-flight flag when a send finishes, however it finishes.
struct SendGuard<'a>(&'a AtomicBool);

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Turns operator commands into REST calls and keeps the composer and edit
/// draft the commands work on.
#[derive(Debug)]
pub struct CommandDispatcher {
    client: GatewayClient,
    input: Mutex<String>,
    draft: Mutex<Option<EditDraft>>,
    send_in_flight: AtomicBool,
}

impl CommandDispatcher {
    pub fn new(client: GatewayClient) -> Self {
        Self {
            client,
            input: Mutex::new(String::new()),
            draft: Mutex::new(None),
            send_in_flight: AtomicBool::new(false),
        }
    }

    pub fn input(&self) -> String {
        lock(&self.input).clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        *lock(&self.input) = text.into();
    }

    pub fn is_sending(&self) -> bool {
        self.send_in_flight.load(Ordering::SeqCst)
    }

    /// Post the composer text as the room's acting participant.
    ///
    /// The composer is cleared only on success. A second send while one is
    /// outstanding is rejected without a request.
    pub async fn send(&self, session: &ChatSession) -> CommandResult<()> {
        let content = self.input();
        Validator::message_content(&content)?;

        if self
            .send_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CommandError::SendInFlight);
        }
        let _guard = SendGuard(&self.send_in_flight);

        let room_id = session.room_id();
        if let Err(error) = self.client.send_message(room_id, &content).await {
            warn!(room_id, %error, "send failed");
            return Err(error.into());
        }
        if session.is_closed() {
            return Err(CommandError::Stale);
        }

        let mut input = lock(&self.input);
        if *input == content {
            input.clear();
        }
        info!(room_id, "message sent");
        Ok(())
    }

    pub fn draft(&self) -> Option<EditDraft> {
        lock(&self.draft).clone()
    }

    /// Start editing a transcript message with its current content.
    pub async fn begin_edit(
        &self,
        session: &ChatSession,
        message_id: MessageId,
    ) -> CommandResult<EditDraft> {
        let message = session
            .message(message_id)
            .await
            .ok_or(ChatError::message_not_found(message_id))?;

        let draft = EditDraft::new(message.id, message.content);
        self.start_edit(draft.clone());
        Ok(draft)
    }

    /// Start editing with the given draft, replacing any edit in progress.
    pub fn start_edit(&self, draft: EditDraft) {
        *lock(&self.draft) = Some(draft);
    }

    pub fn update_draft(&self, content: impl Into<String>) -> CommandResult<()> {
        match lock(&self.draft).as_mut() {
            Some(draft) => {
                draft.content = content.into();
                Ok(())
            }
            None => Err(CommandError::validation("No edit in progress")),
        }
    }

    pub fn cancel_edit(&self) -> Option<EditDraft> {
        lock(&self.draft).take()
    }

    /// Submit the current draft. On failure the draft stays, with the
    /// attempted text, so the operator can retry.
    pub async fn save_edit(&self) -> CommandResult<()> {
        let draft = self
            .draft()
            .ok_or_else(|| CommandError::validation("No edit in progress"))?;
        Validator::message_content(&draft.content)?;

        if let Err(error) = self
            .client
            .edit_message(draft.message_id, &draft.content)
            .await
        {
            warn!(message_id = draft.message_id, %error, "edit failed");
            return Err(error.into());
        }

        let mut current = lock(&self.draft);
        if current.as_ref() == Some(&draft) {
            *current = None;
        }
        info!(message_id = draft.message_id, "message edited");
        Ok(())
    }

    pub async fn delete(
        &self,
        message_id: MessageId,
        prompt: &dyn ConfirmationPrompt,
    ) -> CommandResult<()> {
        if !prompt
            .confirm(&format!("Delete message {message_id}? This cannot be undone."))
            .await
        {
            return Err(CommandError::NotConfirmed);
        }

        self.client.delete_message(message_id).await.map_err(|error| {
            warn!(message_id, %error, "delete failed");
            CommandError::from(error)
        })?;
        info!(message_id, "message deleted");
        Ok(())
    }

    /// Ask for new AI replies to the operator's latest message.
    ///
    /// `message_id` defaults to that message; any other id is refused.
    pub async fn regenerate(
        &self,
        session: &ChatSession,
        message_id: Option<MessageId>,
    ) -> CommandResult<RegenerateResponse> {
        let latest = session.latest_human_message().await.map(|m| m.id);
        match (latest, message_id) {
            (None, requested) => {
                return Err(CommandError::NotRegenerable {
                    message_id: requested,
                })
            }
            (Some(latest), Some(requested)) if latest != requested => {
                return Err(CommandError::NotRegenerable {
                    message_id: Some(requested),
                })
            }
            _ => {}
        }

        let room_id = session.room_id();
        let response = self.client.regenerate(room_id).await.map_err(|error| {
            warn!(room_id, %error, "regenerate failed");
            CommandError::from(error)
        })?;
        if session.is_closed() {
            return Err(CommandError::Stale);
        }

        info!(room_id, deleted = response.deleted_count, status = %response.status, "regenerating replies");
        Ok(response)
    }

    /// Delete every message in the room and empty the local transcript.
    pub async fn clear_history(
        &self,
        session: &ChatSession,
        prompt: &dyn ConfirmationPrompt,
    ) -> CommandResult<()> {
        if !prompt
            .confirm("Clear all messages in this room? This cannot be undone.")
            .await
        {
            return Err(CommandError::NotConfirmed);
        }

        let room_id = session.room_id();
        self.client.clear_history(room_id).await.map_err(|error| {
            warn!(room_id, %error, "clear history failed");
            CommandError::from(error)
        })?;

        if !session.reset_transcript().await {
            return Err(CommandError::Stale);
        }
        info!(room_id, "history cleared");
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
