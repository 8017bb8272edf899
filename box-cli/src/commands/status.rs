//! Show the saved profile.

use anyhow::Result;
use box_core::short_address;
use std::path::Path;

use crate::profile::{unix_now, Profile};

/// Run the status command.
pub async fn run(data_dir: &Path) -> Result<()> {
    println!("=== dots-cli status ===");
    println!();

    let profile = match Profile::load(data_dir).await {
        Ok(profile) => profile,
        Err(_) => {
            println!("Profile: NOT INITIALIZED");
            println!();
            println!("Run 'dots-cli init' to save an identity and server.");
            return Ok(());
        }
    };

    println!("Profile:");
    match &profile.identity {
        Some(identity) => println!("  Identity:  {}", short_address(identity)),
        None => println!("  Identity:  (assigned by server)"),
    }
    println!("  Server:    {}", profile.server_url);
    println!("  Grid size: {}", profile.grid_size);
    if let Some(room) = &profile.last_room {
        println!("  Last room: {}", room);
    }
    println!("  Created:   {}", format_timestamp(profile.created_at));

    Ok(())
}

/// Format a Unix timestamp as a human-readable string.
fn format_timestamp(ts: u64) -> String {
    let diff = unix_now().saturating_sub(ts);

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}
