//! Interactive room console.

use std::sync::Arc;

use async_trait::async_trait;
use rpchat_chats::MessageId;
use rpchat_config::AppConfig;
use rpchat_gateway::GatewayClient;
use rpchat_runtime::{
    ChatSession, CommandDispatcher, CommandError, ConfirmationPrompt, IntrospectionLoader,
    SessionManager,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::render::{self, TranscriptView};

/// Lines typed by the operator, shared between the command loop and prompts.
#[derive(Clone)]
pub struct Lines(Arc<Mutex<mpsc::Receiver<String>>>);

impl Lines {
    pub fn from_stdin() -> Self {
        let (sender, receiver) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if sender.send(line).await.is_err() {
                    break;
                }
            }
        });
        Self(Arc::new(Mutex::new(receiver)))
    }

    /// Next line, or `None` at end of input.
    pub async fn next(&self) -> Option<String> {
        self.0.lock().await.recv().await
    }
}

#[async_trait]
impl ConfirmationPrompt for Lines {
    async fn confirm(&self, question: &str) -> bool {
        println!("{question} [y/N]");
        matches!(
            self.next().await.as_deref().map(str::trim),
            Some("y" | "Y" | "yes")
        )
    }
}

/// Prints session changes as they happen.
pub fn follow(session: Arc<ChatSession>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut view = TranscriptView::default();
        let mut changes = session.subscribe();
        loop {
            for line in view.update(&session.snapshot().await) {
                println!("{line}");
            }
            if session.is_closed() || changes.changed().await.is_err() {
                break;
            }
        }
    })
}

struct Console {
    manager: SessionManager,
    dispatcher: CommandDispatcher,
    introspection: IntrospectionLoader,
    lines: Lines,
    follower: Option<JoinHandle<()>>,
}

pub async fn run(client: GatewayClient, config: AppConfig, room: Option<i64>) -> anyhow::Result<()> {
    let mut console = Console {
        manager: SessionManager::new(client.clone(), config),
        dispatcher: CommandDispatcher::new(client.clone()),
        introspection: IntrospectionLoader::new(client),
        lines: Lines::from_stdin(),
        follower: None,
    };

    println!("rpchat console");
    println!("Type a message to send it, '/help' for commands, '/quit' to exit");
    println!("---");

    if let Some(room_id) = room {
        console.open_room(room_id).await;
    }

    loop {
        let line = tokio::select! {
            line = console.lines.next() => line,
            _ = rpchat_runtime::shutdown_signal() => None,
        };
        let Some(line) = line else {
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !console.handle(line).await {
            break;
        }
    }

    console.close();
    println!("Goodbye!");
    Ok(())
}

impl Console {
    /// Returns false when the operator asked to quit.
    async fn handle(&mut self, line: &str) -> bool {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        if !command.starts_with('/') {
            self.send(line).await;
            return true;
        }

        match command {
            "/quit" | "/exit" | "/q" => return false,
            "/help" | "/h" => print_help(),
            "/room" => match rest.parse() {
                Ok(room_id) => self.open_room(room_id).await,
                Err(_) => println!("usage: /room <id>"),
            },
            "/who" => self.who().await,
            "/edit" => match rest.split_once(char::is_whitespace) {
                Some((id, text)) => match id.parse() {
                    Ok(message_id) => self.edit(message_id, text.trim()).await,
                    Err(_) => println!("usage: /edit <id> <text>"),
                },
                None => println!("usage: /edit <id> <text>"),
            },
            "/delete" => match rest.parse() {
                Ok(message_id) => {
                    let result = self.dispatcher.delete(message_id, &self.lines).await;
                    report(result.map(|_| "Deleted".to_string()));
                }
                Err(_) => println!("usage: /delete <id>"),
            },
            "/regen" => {
                let requested = rest.parse().ok();
                match self.manager.active() {
                    Ok(session) => {
                        let result = self.dispatcher.regenerate(&session, requested).await;
                        report(result.map(|response| {
                            format!("Regenerating ({} replies removed)", response.deleted_count)
                        }));
                    }
                    Err(error) => report::<String>(Err(error)),
                }
            }
            "/clear" => match self.manager.active() {
                Ok(session) => {
                    let result = self.dispatcher.clear_history(&session, &self.lines).await;
                    report(result.map(|_| "History cleared".to_string()));
                }
                Err(error) => report::<String>(Err(error)),
            },
            "/logs" => {
                let mut args = rest.split_whitespace();
                match args.next().map(str::parse::<MessageId>) {
                    Some(Ok(message_id)) => {
                        let expand = args.next().and_then(|n| n.parse::<usize>().ok());
                        self.logs(message_id, expand).await;
                    }
                    _ => println!("usage: /logs <id> [entry]"),
                }
            }
            "/decisions" => match rest.parse() {
                Ok(message_id) => self.decisions(message_id).await,
                Err(_) => println!("usage: /decisions <id>"),
            },
            other => println!("Unknown command: {other}. Type '/help' for available commands."),
        }

        true
    }

    async fn open_room(&mut self, room_id: i64) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }

        match self.manager.switch_room(room_id).await {
            Ok(session) => {
                let room = session.room().await;
                println!("=== {} ===", room.name);
                if !room.setting.is_empty() {
                    println!("{}", room.setting);
                }
                match session.acting_participant().await {
                    Some(acting) => println!("You are playing {}", acting.character_name),
                    None => println!("No participant in this room is marked as you"),
                }
                self.follower = Some(follow(session));
            }
            Err(error) => println!("Could not open room {room_id}: {error}"),
        }
    }

    /// The live channel keeps printing while the request is outstanding.
    async fn send(&self, text: &str) {
        let session = match self.manager.active() {
            Ok(session) => session,
            Err(error) => return report::<String>(Err(error)),
        };

        self.dispatcher.set_input(text);
        if let Err(error) = self.dispatcher.send(&session).await {
            report::<String>(Err(error));
        }
    }

    async fn edit(&self, message_id: MessageId, text: &str) {
        let session = match self.manager.active() {
            Ok(session) => session,
            Err(error) => return report::<String>(Err(error)),
        };

        if let Err(error) = self.dispatcher.begin_edit(&session, message_id).await {
            return report::<String>(Err(error));
        }
        let result = match self.dispatcher.update_draft(text) {
            Ok(()) => self.dispatcher.save_edit().await,
            Err(error) => Err(error),
        };
        if result.is_err() {
            // The draft survives a failed save; the console has no editor to
            // keep it in, so drop it after reporting.
            self.dispatcher.cancel_edit();
        }
        report(result.map(|_| "Edit submitted".to_string()));
    }

    async fn who(&self) {
        let session = match self.manager.active() {
            Ok(session) => session,
            Err(error) => return report::<String>(Err(error)),
        };
        for participant in session.participants().await {
            let kind = if participant.is_ai() { "AI" } else { "human" };
            let you = if participant.is_user { " (you)" } else { "" };
            println!("  {} {} [{kind}]{you}", participant.badge(), participant.character_name);
        }
    }

    async fn logs(&self, message_id: MessageId, expand: Option<usize>) {
        if !self.inspectable(message_id).await {
            return;
        }
        let mut overlay = self.introspection.load_logs(message_id).await;
        if let Some(entry) = expand {
            overlay.toggle(entry.saturating_sub(1));
        }
        print!("{}", render::logs(&overlay));
    }

    async fn decisions(&self, message_id: MessageId) {
        if !self.inspectable(message_id).await {
            return;
        }
        let overlay = self.introspection.load_decisions(message_id).await;
        print!("{}", render::decisions(&overlay));
    }

    /// AI replies carry no introspection of their own.
    async fn inspectable(&self, message_id: MessageId) -> bool {
        let Ok(session) = self.manager.active() else {
            return true;
        };
        match session.message(message_id).await {
            Some(message) if !message.is_inspectable() => {
                println!("Message #{message_id} is an AI reply; inspect the message that triggered it");
                false
            }
            _ => true,
        }
    }

    fn close(&mut self) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
        self.manager.close();
        debug!("console closed");
    }
}

pub fn report<T: std::fmt::Display>(result: Result<T, CommandError>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(CommandError::NotConfirmed) => println!("Cancelled"),
        Err(error) => println!("Error: {}", error.user_message()),
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  <text>                 - Send a message as your character");
    println!("  /room <id>             - Open a room");
    println!("  /who                   - List participants");
    println!("  /edit <id> <text>      - Replace a message's content");
    println!("  /delete <id>           - Delete a message");
    println!("  /regen [id]            - Regenerate replies to your latest message");
    println!("  /clear                 - Delete every message in the room");
    println!("  /logs <id> [entry]     - Show LLM calls for a message");
    println!("  /decisions <id>        - Show the orchestrator's decision steps");
    println!("  /quit, /q              - Exit");
}
