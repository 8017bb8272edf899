//! Player profile stored in the data directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const PROFILE_FILE: &str = "profile.json";

/// Default coordinator address.
pub const DEFAULT_SERVER: &str = "ws://127.0.0.1:3001/ws";

/// Locally saved player settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity announced on join (wallet address or nickname).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Coordinator WebSocket URL.
    #[serde(default = "default_server")]
    pub server_url: String,
    /// Board size expected from the coordinator.
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// Last room joined, offered again by `play`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_room: Option<String>,
    /// When the profile was created.
    pub created_at: u64,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_grid_size() -> usize {
    box_types::DEFAULT_GRID_SIZE
}

impl Profile {
    /// Create a new profile.
    pub fn new(identity: Option<&str>, server_url: Option<&str>) -> Self {
        Self {
            identity: identity.map(str::to_string),
            server_url: server_url.map_or_else(default_server, str::to_string),
            grid_size: default_grid_size(),
            last_room: None,
            created_at: unix_now(),
        }
    }

    /// Load the profile from a directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(PROFILE_FILE);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Profile not found. Run 'dots-cli init' first.")?;
        serde_json::from_str(&contents).context("Invalid profile")
    }

    /// Load the profile, or a default one when none was saved.
    pub async fn load_or_default(data_dir: &Path) -> Result<Self> {
        if Self::exists(data_dir).await {
            Self::load(data_dir).await
        } else {
            Ok(Self::new(None, None))
        }
    }

    /// Save the profile to a directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(PROFILE_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save profile")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Check if a profile was saved.
    pub async fn exists(data_dir: &Path) -> bool {
        data_dir.join(PROFILE_FILE).exists()
    }
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
