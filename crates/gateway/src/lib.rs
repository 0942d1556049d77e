//! # rpchat Gateway Crate
//!
//! Network edge of the session client: a typed REST client for the roleplay
//! backend and the live event channel that follows a room's server-sent
//! event stream.
//!
//! ## Architecture
//!
//! - **REST**: one method per backend endpoint, grouped by resource
//! - **Stream**: SSE framing, event decoding, reconnect with backoff
//! - **Client**: shared HTTP client and URL handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rpchat_config::{ApiConfig, StreamConfig};
//! use rpchat_gateway::{GatewayClient, LiveChannel};
//!
//! # async fn run() -> rpchat_gateway::GatewayResult<()> {
//! let client = GatewayClient::from_config(&ApiConfig::default())?;
//! let room = client.get_room(1).await?;
//! let mut channel = LiveChannel::open(client.clone(), room.id, StreamConfig::default());
//! while let Some(update) = channel.next_update().await {
//!     println!("{update:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod rest;
pub mod stream;

pub use client::GatewayClient;
pub use error::{GatewayError, GatewayResult};
pub use reqwest::StatusCode;
pub use stream::{Backoff, ChannelStatus, ChannelUpdate, LiveChannel, SseDecoder, SseFrame};
