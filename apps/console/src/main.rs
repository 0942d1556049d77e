use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rpchat_chats::{MessageId, RoomId};
use rpchat_config::{load as load_config, AppConfig};
use rpchat_gateway::{ChannelStatus, GatewayClient};
use rpchat_runtime::{
    telemetry, ChatSession, CommandDispatcher, CommandError, CommandResult, ConfirmationPrompt,
    EditDraft, FixedAnswer, IntrospectionLoader,
};
use tracing::info;

mod console;
mod render;

use console::{follow, report, Lines};

#[derive(Parser)]
#[command(name = "rpchat")]
#[command(about = "Roleplay chat session client (console by default)")]
struct Cli {
    /// Backend API base URL, overriding the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive console (default)
    Console {
        /// Room to open on start
        room: Option<RoomId>,
    },
    /// Print a room's transcript and follow it live
    Watch { room: RoomId },
    /// Send a message as the room's acting participant
    Send { room: RoomId, content: String },
    /// Replace a message's content
    Edit { message: MessageId, content: String },
    /// Delete a message
    Delete {
        message: MessageId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Regenerate the AI replies to the latest human message
    Regenerate { room: RoomId },
    /// Delete every message in a room
    Clear {
        room: RoomId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show the LLM calls made for a message
    Logs {
        message: MessageId,
        /// Entry to expand, starting at 1
        #[arg(long)]
        expand: Option<usize>,
    },
    /// Show the orchestrator's decision steps for a message
    Decisions { message: MessageId },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    let mut config = load_config().context("failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url.trim_end_matches('/').to_string();
    }

    let client = GatewayClient::from_config(&config.api).context("failed to create API client")?;
    info!(base_url = client.base_url(), "using backend");

    match cli.command.unwrap_or(Commands::Console { room: None }) {
        Commands::Console { room } => console::run(client, config, room).await,
        Commands::Watch { room } => watch(client, config, room).await,
        Commands::Send { room, content } => send(client, config, room, content).await,
        Commands::Edit { message, content } => edit(client, message, content).await,
        Commands::Delete { message, yes } => delete(client, message, yes).await,
        Commands::Regenerate { room } => regenerate(client, config, room).await,
        Commands::Clear { room, yes } => clear(client, config, room, yes).await,
        Commands::Logs { message, expand } => logs(client, message, expand).await,
        Commands::Decisions { message } => decisions(client, message).await,
    }
}

async fn open(client: GatewayClient, config: &AppConfig, room: RoomId) -> anyhow::Result<ChatSession> {
    ChatSession::open(client, room, config)
        .await
        .with_context(|| format!("failed to open room {room}"))
}

fn prompt(yes: bool) -> Box<dyn ConfirmationPrompt> {
    if yes {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(Lines::from_stdin())
    }
}

async fn watch(client: GatewayClient, config: AppConfig, room: RoomId) -> anyhow::Result<()> {
    let session = Arc::new(open(client, &config, room).await?);
    let follower = follow(Arc::clone(&session));

    let mut changes = session.subscribe();
    tokio::select! {
        _ = rpchat_runtime::shutdown_signal() => {}
        _ = async {
            while changes.changed().await.is_ok() {
                if matches!(session.status().await, ChannelStatus::NotLive { .. }) {
                    break;
                }
            }
        } => {}
    }

    // Let the follower print the final status before stopping it.
    tokio::task::yield_now().await;
    session.close();
    follower.abort();
    Ok(())
}

async fn send(
    client: GatewayClient,
    config: AppConfig,
    room: RoomId,
    content: String,
) -> anyhow::Result<()> {
    let session = open(client.clone(), &config, room).await?;
    let dispatcher = CommandDispatcher::new(client);
    dispatcher.set_input(content);

    let result = dispatcher.send(&session).await;
    session.close();
    finish(result.map(|_| "Sent".to_string()))
}

async fn edit(client: GatewayClient, message: MessageId, content: String) -> anyhow::Result<()> {
    let dispatcher = CommandDispatcher::new(client);
    dispatcher.start_edit(EditDraft::new(message, content));
    finish(dispatcher.save_edit().await.map(|_| "Edit submitted".to_string()))
}

async fn delete(client: GatewayClient, message: MessageId, yes: bool) -> anyhow::Result<()> {
    let dispatcher = CommandDispatcher::new(client);
    let result = dispatcher.delete(message, prompt(yes).as_ref()).await;
    finish(result.map(|_| "Deleted".to_string()))
}

async fn regenerate(client: GatewayClient, config: AppConfig, room: RoomId) -> anyhow::Result<()> {
    let session = open(client.clone(), &config, room).await?;
    let dispatcher = CommandDispatcher::new(client);

    let result = dispatcher.regenerate(&session, None).await;
    session.close();
    finish(result.map(|response| {
        format!(
            "{} ({} replies removed)",
            response.status, response.deleted_count
        )
    }))
}

async fn clear(client: GatewayClient, config: AppConfig, room: RoomId, yes: bool) -> anyhow::Result<()> {
    let session = open(client.clone(), &config, room).await?;
    let dispatcher = CommandDispatcher::new(client);

    let result = dispatcher.clear_history(&session, prompt(yes).as_ref()).await;
    session.close();
    finish(result.map(|_| "History cleared".to_string()))
}

async fn logs(client: GatewayClient, message: MessageId, expand: Option<usize>) -> anyhow::Result<()> {
    let mut overlay = IntrospectionLoader::new(client).load_logs(message).await;
    if let Some(entry) = expand {
        overlay.toggle(entry.saturating_sub(1));
    }
    print!("{}", render::logs(&overlay));
    Ok(())
}

async fn decisions(client: GatewayClient, message: MessageId) -> anyhow::Result<()> {
    let overlay = IntrospectionLoader::new(client).load_decisions(message).await;
    print!("{}", render::decisions(&overlay));
    Ok(())
}

/// Print the outcome; failures also set a non-zero exit status.
fn finish(result: CommandResult<String>) -> anyhow::Result<()> {
    if let Err(error) = &result {
        if !matches!(error, CommandError::NotConfirmed) {
            return Err(anyhow::anyhow!(error.user_message()));
        }
    }
    report(result);
    Ok(())
}
