use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "rpchat.toml",
    "config/rpchat.toml",
    "../rpchat.toml",
    "../config/rpchat.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
    #[serde(default)]
    pub typing: TypingConfig,
}

/// Where the roleplay backend's REST API lives.
///
/// ```
/// use rpchat_config::ApiConfig;
///
/// let api = ApiConfig::default();
/// assert_eq!(api.base_url, "http://127.0.0.1:8080/api");
/// assert_eq!(api.request_timeout_seconds, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ApiConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:8080/api".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Live event channel behaviour.
///
/// With `reconnect` disabled a transport failure leaves the session "not live"
/// until the room is reopened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "StreamConfig::default_reconnect")]
    pub reconnect: bool,
    #[serde(default = "StreamConfig::default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "StreamConfig::default_max_backoff")]
    pub max_backoff_ms: u64,
    #[serde(default = "StreamConfig::default_max_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "StreamConfig::default_event_buffer")]
    pub event_buffer: usize,
}

impl StreamConfig {
    const fn default_reconnect() -> bool {
        true
    }

    const fn default_initial_backoff() -> u64 {
        500
    }

    const fn default_max_backoff() -> u64 {
        30_000
    }

    const fn default_max_attempts() -> u32 {
        10
    }

    const fn default_event_buffer() -> usize {
        128
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms))
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect: Self::default_reconnect(),
            initial_backoff_ms: Self::default_initial_backoff(),
            max_backoff_ms: Self::default_max_backoff(),
            max_reconnect_attempts: Self::default_max_attempts(),
            event_buffer: Self::default_event_buffer(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptOrdering {
    /// Messages are shown in the order they reached the client.
    #[default]
    Arrival,
    /// Messages are kept sorted by creation time, ties broken by id.
    Timestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default)]
    pub ordering: TranscriptOrdering,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Drop typing indicators older than this. Unset keeps them until the
    /// participant's next message.
    #[serde(default)]
    pub expiry_seconds: Option<u64>,
}

impl TypingConfig {
    pub fn expiry(&self) -> Option<Duration> {
        self.expiry_seconds.map(Duration::from_secs)
    }
}

/// Load the client configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use rpchat_config::load;
///
/// std::env::remove_var("RPCHAT_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.api.base_url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let timeout = i64::try_from(defaults.api.request_timeout_seconds).unwrap_or(i64::MAX);
    let initial_backoff = i64::try_from(defaults.stream.initial_backoff_ms).unwrap_or(i64::MAX);
    let max_backoff = i64::try_from(defaults.stream.max_backoff_ms).unwrap_or(i64::MAX);
    let event_buffer = i64::try_from(defaults.stream.event_buffer).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("api.base_url", defaults.api.base_url.clone())?
        .set_default("api.request_timeout_seconds", timeout)?
        .set_default("stream.reconnect", defaults.stream.reconnect)?
        .set_default("stream.initial_backoff_ms", initial_backoff)?
        .set_default("stream.max_backoff_ms", max_backoff)?
        .set_default(
            "stream.max_reconnect_attempts",
            i64::from(defaults.stream.max_reconnect_attempts),
        )?
        .set_default("stream.event_buffer", event_buffer)?
        .set_default("transcript.ordering", "arrival")?;

    let environment_overrides = config::Environment::with_prefix("RPCHAT").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("RPCHAT_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via RPCHAT_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
    if config.stream.event_buffer == 0 {
        config.stream.event_buffer = 1;
    }

    debug!(?config, "loaded client configuration");
    Ok(config)
}
