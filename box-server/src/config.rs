//! Configuration loading for dots-server.
//!
//! Configuration is loaded from a TOML file (default: `server.toml`).
//! Every field has a default, so an empty file (or no file) is valid.

use box_core::{MAX_GRID_SIZE, MIN_GRID_SIZE};
use box_types::DEFAULT_GRID_SIZE;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for dots-server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Game rules configuration.
    #[serde(default)]
    pub game: GameConfig,
    /// Rate limiting configuration.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// Cleanup task configuration.
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for HTTP and WebSocket (default: 0.0.0.0:3001).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// WebSocket route (default: /ws).
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
}

/// Game rules configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Dots per side (default: 5, giving 4x4 boxes).
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// Maximum number of live rooms (default: 1000).
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum messages per connection per minute (default: 240).
    #[serde(default = "default_messages_per_minute")]
    pub messages_per_minute: u32,
    /// Maximum messages per second across all connections (default: 2000).
    #[serde(default = "default_global_messages_per_second")]
    pub global_messages_per_second: u32,
    /// Identities longer than this are truncated (default: 128).
    #[serde(default = "default_max_identity_len")]
    pub max_identity_len: usize,
    /// Connections that have not joined a room within this many seconds
    /// are dropped (default: 30).
    #[serde(default = "default_join_timeout_secs")]
    pub join_timeout_secs: u64,
}

/// HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Enable metrics endpoint (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

/// Cleanup task configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Enable cleanup task (default: true).
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,
    /// Cleanup interval in seconds (default: 60).
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
    /// Rooms idle for longer than this are removed (default: 1800).
    #[serde(default = "default_idle_room_secs")]
    pub idle_room_secs: u64,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}

fn default_max_rooms() -> usize {
    1000
}

fn default_messages_per_minute() -> u32 {
    240
}

fn default_global_messages_per_second() -> u32 {
    2000
}

fn default_max_identity_len() -> usize {
    128
}

fn default_join_timeout_secs() -> u64 {
    30
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_cleanup_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_idle_room_secs() -> u64 {
    30 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            ws_path: default_ws_path(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            max_rooms: default_max_rooms(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            messages_per_minute: default_messages_per_minute(),
            global_messages_per_second: default_global_messages_per_second(),
            max_identity_len: default_max_identity_len(),
            join_timeout_secs: default_join_timeout_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_cleanup_enabled(),
            interval_secs: default_cleanup_interval(),
            idle_room_secs: default_idle_room_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`Config::validate`].
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.game.grid_size) {
            return Err(ConfigError::Invalid(format!(
                "game.grid_size must be {MIN_GRID_SIZE}..={MAX_GRID_SIZE}, got {}",
                self.game.grid_size
            )));
        }
        if !self.server.ws_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "server.ws_path must start with '/', got {:?}",
                self.server.ws_path
            )));
        }
        let zero = [
            ("game.max_rooms", self.game.max_rooms as u64),
            ("limits.messages_per_minute", u64::from(self.limits.messages_per_minute)),
            (
                "limits.global_messages_per_second",
                u64::from(self.limits.global_messages_per_second),
            ),
            ("limits.max_identity_len", self.limits.max_identity_len as u64),
            ("limits.join_timeout_secs", self.limits.join_timeout_secs),
            ("cleanup.interval_secs", self.cleanup.interval_secs),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);
        if let Some((name, _)) = zero {
            return Err(ConfigError::Invalid(format!("{name} must be > 0")));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
