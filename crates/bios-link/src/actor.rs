//! Panel Link Actor
//!
//! This module provides an async actor that owns the [`PanelLink`] engine.
//! Export datagrams, key events and profile changes all arrive over one
//! command channel, so the parser, decoders and cycle cursors are only
//! ever touched from a single task.
//!
//! # Architecture
//!
//! The actor receives commands through a channel and emits:
//! - [`LinkEvent`]s on the event channel, for logging and display
//! - raw command frames on the output channel, for the command sender
//!
//! # Example
//!
//! ```rust,ignore
//! use bios_link::{run_link_actor, LinkCommand};
//! use tokio::sync::mpsc;
//!
//! let (cmd_tx, cmd_rx) = mpsc::channel(256);
//! let (event_tx, mut event_rx) = mpsc::channel(256);
//! let (out_tx, out_rx) = mpsc::channel(64);
//!
//! tokio::spawn(run_link_actor(cmd_rx, event_tx, out_tx));
//! ```

use bios_input::{InputKey, Transition};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{PanelLink, Profile};
use crate::events::LinkEvent;
use crate::state::BiosValue;

/// Commands sent to the link actor
#[derive(Debug)]
pub enum LinkCommand {
    /// One datagram of the export stream
    ExportData(Vec<u8>),

    /// A panel key changed state
    Button {
        /// Key that changed
        key: InputKey,
        /// Edge; pulse inputs only send `Pressed`
        transition: Transition,
    },

    /// Replace the field layout and key bindings
    LoadProfile(Profile),

    /// Look up the live value of a field
    QueryValue {
        /// Control name
        name: String,
        /// Channel to send back the value (or None if unknown)
        response: oneshot::Sender<Option<BiosValue>>,
    },

    /// Shutdown the actor
    Shutdown,
}

/// Run the link actor until shutdown or until the command channel closes
///
/// # Arguments
///
/// * `cmd_rx` - Receiver for commands sent to the actor
/// * `event_tx` - Sender for events emitted by the actor
/// * `out_tx` - Sender for outbound command frames
pub async fn run_link_actor(
    mut cmd_rx: mpsc::Receiver<LinkCommand>,
    event_tx: mpsc::Sender<LinkEvent>,
    out_tx: mpsc::Sender<Vec<u8>>,
) {
    let mut link = PanelLink::new();
    info!("Link actor started");

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            LinkCommand::ExportData(data) => {
                for event in link.process_export(&data) {
                    let _ = event_tx.send(event).await;
                }
            }

            LinkCommand::Button { key, transition } => {
                let frames = link.button(key, transition);
                if frames.is_empty() {
                    debug!("{} {:?}: nothing to send", key, transition);
                }
                for frame in frames {
                    if let Err(e) = out_tx.send(frame.clone()).await {
                        warn!("Failed to queue command: {}", e);
                        let _ = event_tx
                            .send(LinkEvent::Error {
                                message: format!("Command sender gone: {}", e),
                            })
                            .await;
                        break;
                    }
                    let _ = event_tx.send(LinkEvent::CommandSent(frame)).await;
                }
            }

            LinkCommand::LoadProfile(profile) => {
                let event = match link.load_profile(&profile) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Profile rejected: {}", e);
                        LinkEvent::Error {
                            message: format!("Profile rejected: {}", e),
                        }
                    }
                };
                let _ = event_tx.send(event).await;
            }

            LinkCommand::QueryValue { name, response } => {
                let _ = response.send(link.panel().get(&name).cloned());
            }

            LinkCommand::Shutdown => {
                info!("Link actor shutting down");
                break;
            }
        }
    }

    info!("Link actor stopped");
}
