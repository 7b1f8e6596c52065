use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use streamconnect_core::utils::unix_millis;
use streamconnect_core::{LocalIdentity, MeetingRecord, RoomToken, UserProfile};
use streamconnect_session::{
    CallSession, CallSnapshot, CallState, ProfileStore, RelayHub, RtcBackend, SessionCommand,
    SessionConfig, SessionHandle, WebRtcBackend,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "streamconnect", version, about = "Serverless peer-to-peer calls")]
struct Cli {
    /// Path of the profile and history store.
    #[arg(long, global = true, default_value = "streamconnect.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a local profile.
    Login {
        /// Display name; prompted for when omitted.
        name: Option<String>,
    },
    /// Remove the stored profile.
    Logout,
    /// Show recently visited rooms.
    History,
    /// Start a call in a freshly generated room.
    New {
        /// Also run a local guest peer in the same room.
        #[arg(long)]
        pair: bool,
    },
    /// Join an existing room by its code.
    Join {
        room: String,
        #[arg(long)]
        pair: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let store = ProfileStore::new(&cli.store);

    match cli.command {
        Commands::Login { name } => login(&store, name),
        Commands::Logout => logout(&store),
        Commands::History => show_history(&store),
        Commands::New { pair } => run_call(&store, RoomToken::generate(), pair).await,
        Commands::Join { room, pair } => {
            let room = RoomToken::parse(&room).context("invalid room code")?;
            run_call(&store, room, pair).await
        }
    }
}

fn login(store: &ProfileStore, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Display name")
            .interact_text()?,
    };
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("display name cannot be empty");
    }
    let profile = UserProfile::new(name);
    store.save_user(&profile)?;
    println!("{} {}", "✅ Logged in as".green(), profile.name.bold());
    Ok(())
}

fn logout(store: &ProfileStore) -> Result<()> {
    store.clear_user()?;
    println!("{}", "✅ Logged out".green());
    Ok(())
}

fn show_history(store: &ProfileStore) -> Result<()> {
    let history = store.history();
    if history.is_empty() {
        println!("{}", "No meetings yet".dimmed());
        return Ok(());
    }
    println!("{}", "📋 Recent meetings".green().bold());
    for record in history {
        let host = record.host_name.as_deref().unwrap_or("-");
        println!(
            "   {}  {}  {}",
            record.room.bold(),
            format_timestamp(record.timestamp).dimmed(),
            host.dimmed(),
        );
    }
    Ok(())
}

fn require_profile(store: &ProfileStore) -> Result<UserProfile> {
    store
        .load_user()
        .context("no profile found, run `streamconnect login` first")
}

async fn run_call(store: &ProfileStore, room: RoomToken, pair: bool) -> Result<()> {
    let profile = require_profile(store)?;
    let identity = LocalIdentity::from_profile(&profile);
    store.add_to_history(MeetingRecord::now(&room, Some(profile.name.clone())))?;

    let hub = RelayHub::new();
    let backend: Arc<dyn RtcBackend> = Arc::new(WebRtcBackend::new());

    println!("{} {}", "📞 Room:".green().bold(), room.to_string().bold());
    println!("   {}", "m=mic  v=camera  s=share  q=hang up".dimmed());

    let guest = pair.then(|| {
        CallSession::spawn(
            &hub,
            SessionConfig::new(room.clone(), LocalIdentity::new("Guest")),
            Arc::clone(&backend),
        )
    });

    let handle = CallSession::spawn(&hub, SessionConfig::new(room, identity), backend);
    let mut snapshots = handle.watch();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_status = String::new();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.status != last_status {
                    last_status = snapshot.status.clone();
                    print_status(&snapshot);
                }
                if snapshot.state == CallState::Terminated {
                    break;
                }
            }

            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => handle_key(&handle, line.trim()).await,
                    // closed stdin leaves the call running until hang-up
                    _ => stdin_open = false,
                }
                if matches!(handle.snapshot().state, CallState::Terminated) {
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    if let Some(guest) = guest {
        guest.end().await;
    }
    handle.end().await;
    println!("{}", "👋 Call ended".green());
    Ok(())
}

async fn handle_key(handle: &SessionHandle, key: &str) {
    match key {
        "m" => {
            let enabled = !handle.snapshot().mic_enabled;
            handle.command(SessionCommand::SetMicEnabled(enabled)).await;
        }
        "v" => {
            let enabled = !handle.snapshot().camera_enabled;
            handle.command(SessionCommand::SetCameraEnabled(enabled)).await;
        }
        "s" => {
            let command = if handle.snapshot().screen_sharing {
                SessionCommand::StopScreenShare
            } else {
                SessionCommand::StartScreenShare
            };
            handle.command(command).await;
        }
        "q" => handle.command(SessionCommand::EndCall).await,
        _ => {}
    }
}

fn print_status(snapshot: &CallSnapshot) {
    let peer = snapshot
        .remote_peer
        .as_ref()
        .map(|p| format!(" [{}]", p.name))
        .unwrap_or_default();
    println!("   {} {}{}", "●".cyan(), snapshot.status, peer.dimmed());
}

fn format_timestamp(timestamp: u64) -> String {
    let elapsed = unix_millis().saturating_sub(timestamp) / 1000;
    match elapsed {
        0..=59 => "just now".to_owned(),
        60..=3599 => format!("{}m ago", elapsed / 60),
        3600..=86_399 => format!("{}h ago", elapsed / 3600),
        _ => format!("{}d ago", elapsed / 86_400),
    }
}
