//! Play against another client through a coordinator.

use anyhow::{Context, Result};
use box_client::{
    dispatch, ClientConfig, ClientError, GameClient, TransportError, WebSocketTransport,
};
use box_core::GameEvent;
use box_types::{Dot, RoomId, WireCodec};
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::profile::Profile;
use crate::render::{render, status_line};
use crate::terminal::{Bell, TerminalPresenter};

/// Settings for one session.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// Coordinator URL
    pub server_url: String,
    /// Room to join; a new room is created when absent
    pub room: Option<RoomId>,
    /// Identity announced on join
    pub identity: Option<String>,
    /// Board size assumed until the first snapshot
    pub grid_size: usize,
    /// Frame encoding
    pub codec: WireCodec,
    /// Ring the terminal bell
    pub bell: bool,
}

/// A parsed line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Draw the line between two dots
    Draw(Dot, Dot),
    /// Reset the board
    NewGame,
    /// Ask for a full resync
    Sync,
    /// Print the board again
    Board,
    /// Show the command list
    Help,
    /// Leave the room and exit
    Quit,
    /// Blank line
    Nothing,
}

/// Unparseable player input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// Not a command or a move.
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
    /// A move needs four coordinates.
    #[error("a move is four numbers: row col row col (got {0})")]
    WrongArity(usize),
    /// A coordinate was not a number.
    #[error("'{0}' is not a coordinate")]
    BadCoordinate(String),
}

const HELP: &str = "\
Commands:
  r1 c1 r2 c2   draw the line between dot (r1,c1) and dot (r2,c2)
  new           start a new game in this room
  sync          ask the server for the full board
  board         print the board
  help          show this list
  quit          leave the room and exit";

/// Parse one line of input.
pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => return Ok(Input::Nothing),
        "new" => return Ok(Input::NewGame),
        "sync" | "state" => return Ok(Input::Sync),
        "board" | "b" => return Ok(Input::Board),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "q" | "exit" | "leave" => return Ok(Input::Quit),
        _ => {}
    }

    let parts: Vec<&str> = trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.iter().any(|p| p.parse::<usize>().is_err()) {
        if parts.len() == 4 {
            let bad = parts
                .iter()
                .find(|p| p.parse::<usize>().is_err())
                .map(|p| p.to_string())
                .unwrap_or_default();
            return Err(InputError::BadCoordinate(bad));
        }
        return Err(InputError::Unknown(trimmed.to_string()));
    }
    let numbers: Vec<usize> = parts.iter().filter_map(|p| p.parse().ok()).collect();
    match numbers.as_slice() {
        [r1, c1, r2, c2] => Ok(Input::Draw(Dot::new(*r1, *c1), Dot::new(*r2, *c2))),
        other => Err(InputError::WrongArity(other.len())),
    }
}

/// Run the play command.
pub async fn run(data_dir: &Path, options: PlayOptions) -> Result<()> {
    let mut config = ClientConfig::new(&options.server_url)
        .with_codec(options.codec)
        .with_grid_size(options.grid_size);
    if let Some(identity) = &options.identity {
        config = config.with_identity(identity);
    }

    let client = GameClient::new(config, WebSocketTransport::new());
    client
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", options.server_url))?;

    let presenter = TerminalPresenter;
    let bell = Bell::new(options.bell);

    let events = client
        .join(options.room.clone())
        .await
        .context("Failed to join a room")?;
    present(&events, &presenter, &bell);
    remember_room(data_dir, client.room().await).await;
    show_board(&client).await;
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        // Only the receives race; applying and sending run to completion.
        let received = tokio::select! {
            received = client.recv_message() => received,
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => handle_input(&client, input, &presenter, &bell).await?,
                    Err(err) => println!("{err}"),
                }
                continue;
            }
        };
        let applied = match received {
            Ok(message) => client.apply(message).await,
            Err(err) => Err(err),
        };
        match applied {
            Ok(events) => {
                if present(&events, &presenter, &bell) {
                    show_board(&client).await;
                }
            }
            Err(ClientError::Transport(TransportError::ConnectionClosed)) => {
                println!("Connection closed by server.");
                return Ok(());
            }
            Err(ClientError::Wire(err)) => {
                tracing::warn!(%err, "dropping undecodable frame");
            }
            Err(err) => return Err(err).context("Connection failed"),
        }
    }

    if client.seat().await.is_some() {
        client.leave().await.context("Failed to leave the room")?;
    }
    client.disconnect().await.context("Failed to close the connection")?;
    println!("Bye.");
    Ok(())
}

async fn handle_input(
    client: &GameClient<WebSocketTransport>,
    input: Input,
    presenter: &TerminalPresenter,
    bell: &Bell,
) -> Result<()> {
    match input {
        Input::Draw(start, end) => match client.draw_line(start, end).await {
            Ok(events) => {
                present(&events, presenter, bell);
                show_board(client).await;
            }
            // Refused before anything was sent.
            Err(ClientError::Move(err)) => println!("Can't draw {start}-{end}: {err}"),
            Err(err) => return Err(err).context("Failed to send move"),
        },
        Input::NewGame => client.new_game().await.context("Failed to request a new game")?,
        Input::Sync => client.request_state().await.context("Failed to request state")?,
        Input::Board => show_board(client).await,
        Input::Help => println!("{HELP}"),
        Input::Quit | Input::Nothing => {}
    }
    Ok(())
}

/// Dispatch events; true when the board changed.
fn present(events: &[GameEvent], presenter: &TerminalPresenter, bell: &Bell) -> bool {
    for event in events {
        dispatch(event, presenter, bell);
    }
    events.iter().any(|e| {
        matches!(
            e,
            GameEvent::LineDrawn { .. } | GameEvent::BoxCompleted { .. } | GameEvent::Redraw(_)
        )
    })
}

async fn show_board(client: &GameClient<WebSocketTransport>) {
    let snapshot = client.snapshot().await;
    println!();
    print!("{}", render(&snapshot));
    println!("{}", status_line(&snapshot, client.seat().await));
}

async fn remember_room(data_dir: &Path, room: Option<RoomId>) {
    let Some(room) = room else {
        return;
    };
    if !Profile::exists(data_dir).await {
        return;
    }
    if let Err(err) = save_last_room(data_dir, &room).await {
        tracing::warn!(%err, "could not save last room");
    }
}

async fn save_last_room(data_dir: &Path, room: &RoomId) -> Result<()> {
    let mut profile = Profile::load(data_dir).await?;
    profile.last_room = Some(room.to_string());
    profile.save(data_dir).await
}
