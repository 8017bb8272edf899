//! Save a player profile.

use anyhow::Result;
use std::path::Path;

use crate::profile::Profile;

/// Run the init command.
pub async fn run(data_dir: &Path, identity: Option<&str>, server: Option<&str>) -> Result<()> {
    if Profile::exists(data_dir).await {
        anyhow::bail!(
            "Profile already exists. Delete {} to reinitialize.",
            data_dir.join("profile.json").display()
        );
    }

    let profile = Profile::new(identity, server);
    profile.save(data_dir).await?;

    println!("Profile saved.");
    println!();
    println!(
        "  Identity: {}",
        profile.identity.as_deref().unwrap_or("(assigned by server)")
    );
    println!("  Server:   {}", profile.server_url);
    println!("  Data dir: {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Start a game:  dots-cli play");
    println!("  2. Join a friend: dots-cli play --room <room-id>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn init_creates_profile() {
        let dir = tempdir().unwrap();
        run(dir.path(), Some("0x1234"), None).await.unwrap();

        let profile = Profile::load(dir.path()).await.unwrap();
        assert_eq!(profile.identity.as_deref(), Some("0x1234"));
        assert_eq!(profile.server_url, crate::profile::DEFAULT_SERVER);
    }

    #[tokio::test]
    async fn init_fails_if_already_initialized() {
        let dir = tempdir().unwrap();
        run(dir.path(), None, None).await.unwrap();

        let result = run(dir.path(), Some("0x1"), None).await;
        assert!(result.is_err());
    }
}
