//! # rpchat Runtime Crate
//!
//! Everything between the network edge and a front end: the open room
//! session, the command dispatcher, introspection overlays and process
//! plumbing (tracing, shutdown).

pub mod dispatcher;
pub mod error;
pub mod introspection;
pub mod manager;
pub mod session;

pub use dispatcher::{CommandDispatcher, ConfirmationPrompt, EditDraft, FixedAnswer};
pub use error::{CommandError, CommandResult};
pub use introspection::{DecisionsOverlay, IntrospectionLoader, LogsOverlay, OverlayState};
pub use manager::SessionManager;
pub use session::{ChatSession, SessionSnapshot};

use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    /// Install the global subscriber. Output goes to stderr so it does not
    /// mix with the transcript on stdout.
    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
