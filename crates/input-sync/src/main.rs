//! input-sync peer entry point.
//!
//! Two modes share one frame loop:
//!
//! ```text
//! receive   StateSyncServer ── InboundModifier ──▶ InputManager ──▶ LoggingListener
//!                                                        └──▶ InputRecorder (--record)
//!
//! send      recording file ──▶ InputPlayer ──▶ InputManager ──▶ StateSyncClient ──▶ peer
//! ```
//!
//! # Frame loop (for beginners)
//!
//! An `InputManager` never blocks and has no threads of its own; something
//! has to call `update` at a steady rate.  Here that is a
//! `tokio::time::interval` ticking at `[frame] rate_hz`.  Network tasks run
//! on the same runtime and hand their input to the manager through queues,
//! so everything that touches devices happens inside `update`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use input_core::{InputManager, InputPlayer, InputRecorder, InputRecording, LoggingListener};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use input_sync::config::{load_config, load_config_from, AppConfig};
use input_sync::peer::{create_configured_devices, FrameTicker};
use input_sync::{StateSyncClient, StateSyncServer};

/// Frames between keep-alive pings in `send` mode.
const PING_EVERY_FRAMES: u64 = 100;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Mirror input devices between two machines.
#[derive(Debug, Parser)]
#[command(
    name = "input-sync",
    about = "Mirror input device state to a remote peer or replay a recording to one",
    version
)]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, env = "INPUTSYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Accept sync connections and apply their input to local devices.
    Receive {
        /// Address to listen on, e.g. `0.0.0.0:1211`.  Defaults to
        /// `[sync] listen_address` and `port`.
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Save everything received to this file on exit.
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Replay a recording to a peer.
    Send {
        /// Recording produced by `receive --record`.
        #[arg(long)]
        recording: PathBuf,

        /// Peer to connect to.  Defaults to `[sync] peer_address` and `port`.
        #[arg(long)]
        peer: Option<SocketAddr>,
    },
}

fn resolve_addr(
    explicit: Option<SocketAddr>,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    match explicit {
        Some(addr) => Ok(addr),
        None => format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid address in config: '{host}:{port}'")),
    }
}

fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            load_config_from(path).with_context(|| format!("failed to load {}", path.display()))
        }
        None => load_config().context("failed to load config"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load(cli.config.as_deref())?;

    // `RUST_LOG` wins over the config file's `log_level`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    match cli.command {
        Command::Receive { listen, record } => {
            let listen = resolve_addr(listen, &config.sync.listen_address, config.sync.port)?;
            run_receive(&config, listen, record.as_deref(), &running).await
        }
        Command::Send { recording, peer } => {
            let peer = resolve_addr(peer, &config.sync.peer_address, config.sync.port)?;
            run_send(&config, &recording, peer, &running).await
        }
    }
}

async fn run_receive(
    config: &AppConfig,
    listen: SocketAddr,
    record: Option<&Path>,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    let mut manager = InputManager::with_config(config.manager.clone());
    create_configured_devices(&mut manager, &config.devices);
    manager.add_listener(LoggingListener::default());
    let recorder = record.map(|_| InputRecorder::new(&mut manager));
    if let Some(recorder) = &recorder {
        recorder.start();
    }

    let mut server = StateSyncServer::bind(listen)
        .await
        .with_context(|| format!("failed to start state sync on {listen}"))?;
    server.attach(&mut manager);
    info!("receiving on {}; press Ctrl+C to stop", server.local_addr());

    let mut frames = FrameTicker::new(config.frame.rate_hz);
    while running.load(Ordering::Relaxed) {
        let delta = frames.tick().await;
        manager.update(delta);
    }

    server.shutdown(&mut manager).await;
    if let (Some(recorder), Some(path)) = (recorder, record) {
        let recording = recorder.detach(&mut manager);
        let bytes = recording
            .serialize(&manager)
            .context("failed to encode recording")?;
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(
            changes = recording.len(),
            duration_ms = recording.duration_ms(),
            "saved recording to {}",
            path.display()
        );
    }
    Ok(())
}

async fn run_send(
    config: &AppConfig,
    recording_path: &Path,
    peer: SocketAddr,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    let mut manager = InputManager::with_config(config.manager.clone());
    create_configured_devices(&mut manager, &config.devices);

    let bytes = std::fs::read(recording_path)
        .with_context(|| format!("failed to read {}", recording_path.display()))?;
    let recording = InputRecording::deserialize(&bytes, &manager)
        .with_context(|| format!("failed to load recording {}", recording_path.display()))?;
    if recording.is_empty() {
        warn!("recording {} is empty; nothing to send", recording_path.display());
        return Ok(());
    }

    let mut client = StateSyncClient::connect(peer, config.sync.outbound_capacity)
        .await
        .context("failed to connect to sync peer")?;
    client.attach(&mut manager);
    for device in recording.devices() {
        client
            .start_device_sync(&manager, device)
            .await
            .with_context(|| format!("failed to start sync of {device}"))?;
    }

    info!(
        changes = recording.len(),
        duration_ms = recording.duration_ms(),
        "replaying to {peer}"
    );
    let player = InputPlayer::new(&mut manager);
    player.set_recording(recording);
    player.start();

    let mut frames = FrameTicker::new(config.frame.rate_hz);
    while running.load(Ordering::Relaxed) && player.is_playing() {
        let delta = frames.tick().await;
        manager.update(delta);
        if manager.frame_count() % PING_EVERY_FRAMES == 0 {
            client.ping().context("sync peer went away")?;
        }
    }

    player.detach(&mut manager);
    client.close(&mut manager).await;
    info!("replay finished");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
