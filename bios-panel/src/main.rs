//! biospanel - headless DCS-BIOS panel bridge
//!
//! Listens to the simulator's export stream, logs field changes and turns
//! key events typed on stdin into command frames.

mod keys;
mod settings;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bios_link::{run_link_actor, CommandSender, ExportListener, LinkCommand, LinkEvent};
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing::{info, trace, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use keys::forward_key_lines;
use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "biospanel", about = "Headless DCS-BIOS panel bridge")]
struct Cli {
    /// Settings file (defaults to the XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Receive the export stream on this unicast address instead of multicast
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Send commands here instead of the configured address
    #[arg(long)]
    command_addr: Option<SocketAddr>,

    /// Do not read key events from stdin
    #[arg(long)]
    no_keys: bool,

    /// Write the effective settings to the config location and exit
    #[arg(long)]
    save_settings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "biospanel=info,bios_protocol=info,bios_input=info,bios_link=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    if let Some(addr) = cli.listen {
        settings.listen_addr = Some(addr);
    }
    if let Some(addr) = cli.command_addr {
        settings.command_addr = addr;
    }

    if cli.save_settings {
        let path = match &cli.config {
            Some(path) => {
                settings.save_to(path)?;
                path.clone()
            }
            None => settings.save()?,
        };
        info!("Settings written to {}", path.display());
        return Ok(());
    }

    info!("Starting biospanel");
    run(settings, !cli.no_keys).await
}

async fn run(settings: Settings, read_keys: bool) -> Result<()> {
    let recv_timeout = Duration::from_millis(settings.recv_timeout_ms);
    let listener = match settings.listen_addr {
        Some(addr) => ExportListener::bind(addr).await,
        None => {
            ExportListener::join_multicast(
                settings.multicast_group,
                settings.export_port,
                settings.multicast_interface,
            )
            .await
        }
    }
    .context("Failed to open export listener")?
    .with_recv_timeout(recv_timeout);

    let sender = CommandSender::new(settings.command_addr)
        .await
        .context("Failed to open command socket")?;

    let (cmd_tx, cmd_rx) = mpsc::channel(256);
    let (event_tx, mut event_rx) = mpsc::channel(256);
    let (out_tx, out_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let actor = tokio::spawn(run_link_actor(cmd_rx, event_tx, out_tx));
    let mut listen = tokio::spawn(listener.run(cmd_tx.clone(), shutdown_rx));
    let send = tokio::spawn(sender.run(out_rx));

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match &event {
                LinkEvent::FrameSync => trace!("{}", event.description()),
                LinkEvent::Error { .. } => warn!("{}", event.description()),
                _ => info!("{}", event.description()),
            }
        }
    });

    cmd_tx
        .send(LinkCommand::LoadProfile(settings.profile))
        .await
        .context("Link actor exited early")?;

    if read_keys {
        let key_tx = cmd_tx.clone();
        tokio::spawn(forward_key_lines(BufReader::new(tokio::io::stdin()), key_tx));
    }

    let stopped_early = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to wait for Ctrl-C")?;
            info!("Shutting down");
            None
        }
        result = &mut listen => {
            warn!("Export listener stopped, shutting down");
            Some(result)
        }
    };
    let _ = shutdown_tx.send(true);
    let listen_result = match stopped_early {
        Some(result) => result,
        None => listen.await,
    };
    match listen_result {
        Ok(Err(e)) => warn!("Export listener stopped with error: {}", e),
        Err(e) => warn!("Export listener task failed: {}", e),
        Ok(Ok(())) => {}
    }

    let _ = cmd_tx.send(LinkCommand::Shutdown).await;
    actor.await.context("Link actor task failed")?;

    // Actor dropped its frame sender, so the command sender drains and stops
    match send.await {
        Ok(Err(e)) => warn!("Command sender stopped with error: {}", e),
        Err(e) => warn!("Command sender task failed: {}", e),
        Ok(Ok(())) => {}
    }

    Ok(())
}
