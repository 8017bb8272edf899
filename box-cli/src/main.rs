//! # dots-cli
//!
//! Terminal client for dots-and-boxes.
//!
//! ## Commands
//!
//! - `init`: Save an identity and default server
//! - `play`: Join a room on a coordinator and play from the terminal
//! - `demo`: Watch two local bots play a full game
//! - `status`: Show the saved profile
//!
//! ## Example
//!
//! ```bash
//! # Save a profile
//! dots-cli init --identity 0x71C7656EC7ab88b098defB751B7401B5f6d8976F
//!
//! # Create a room and share its id
//! dots-cli play
//!
//! # On another terminal, join it
//! dots-cli play --room k3j9x2
//!
//! # No server needed
//! dots-cli demo --grid-size 4
//! ```

use anyhow::{Context, Result};
use box_core::{MAX_GRID_SIZE, MIN_GRID_SIZE};
use box_types::{RoomId, WireCodec};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod profile;
mod render;
mod terminal;

use commands::{demo, init, play, status};
use profile::Profile;

/// Terminal client for dots-and-boxes.
#[derive(Parser, Debug)]
#[command(name = "dots-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the saved profile
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save an identity and default server
    Init {
        /// Identity announced on join (wallet address or nickname)
        #[arg(long, short)]
        identity: Option<String>,

        /// Coordinator WebSocket URL
        #[arg(long, short)]
        server: Option<String>,
    },

    /// Join a room on a coordinator and play
    Play {
        /// Coordinator WebSocket URL (defaults to the profile's)
        #[arg(long, short)]
        server: Option<String>,

        /// Room to join; a new room is created when omitted
        #[arg(long, short)]
        room: Option<String>,

        /// Identity announced on join (defaults to the profile's)
        #[arg(long, short)]
        identity: Option<String>,

        /// Board size in dots per side
        #[arg(long, value_parser = parse_grid_size)]
        grid_size: Option<usize>,

        /// Send MessagePack binary frames instead of JSON text
        #[arg(long)]
        msgpack: bool,

        /// Ring the terminal bell when a box is completed
        #[arg(long)]
        bell: bool,
    },

    /// Watch two local bots play a full game
    Demo {
        /// Board size in dots per side
        #[arg(long, default_value_t = box_types::DEFAULT_GRID_SIZE, value_parser = parse_grid_size)]
        grid_size: usize,

        /// Print the board after every move
        #[arg(long)]
        verbose: bool,
    },

    /// Show the saved profile
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    match cli.command {
        Commands::Init { identity, server } => {
            init::run(&data_dir, identity.as_deref(), server.as_deref()).await?;
        }
        Commands::Play {
            server,
            room,
            identity,
            grid_size,
            msgpack,
            bell,
        } => {
            let profile = Profile::load_or_default(&data_dir).await?;
            let room = room
                .map(|r| RoomId::parse(&r))
                .transpose()
                .context("Invalid room id")?;
            let options = play::PlayOptions {
                server_url: server.unwrap_or(profile.server_url),
                room,
                identity: identity.or(profile.identity),
                grid_size: grid_size.unwrap_or(profile.grid_size),
                codec: if msgpack {
                    WireCodec::MessagePack
                } else {
                    WireCodec::Json
                },
                bell,
            };
            play::run(&data_dir, options).await?;
        }
        Commands::Demo { grid_size, verbose } => {
            let summary = demo::run(grid_size, verbose)?;
            tracing::info!(
                moves = summary.moves,
                outcome = %summary.outcome.label(),
                player1 = summary.scores.0,
                player2 = summary.scores.1,
                "demo finished"
            );
        }
        Commands::Status => {
            status::run(&data_dir).await?;
        }
    }

    Ok(())
}

fn parse_grid_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(format!(
            "grid size must be between {MIN_GRID_SIZE} and {MAX_GRID_SIZE}"
        ))
    }
}

/// Get the default data directory for dots-cli.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "ydun", "dots-cli")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
