//! Key events typed on stdin
//!
//! Each line names a key and optionally an edge: `G1_M1 down`, `M_4 up`,
//! `OK`. A bare key name means a press.

use bios_input::{InputKey, Transition};
use bios_link::LinkCommand;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Why a key line was not understood
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyLineError {
    #[error("empty line")]
    Empty,

    #[error("unknown key {0:?}")]
    UnknownKey(String),

    #[error("unknown edge {0:?} (expected down/up/press/release)")]
    UnknownEdge(String),

    #[error("unexpected {0:?}")]
    TrailingInput(String),
}

/// Parse one stdin line into a key and edge
pub fn parse_key_line(line: &str) -> Result<(InputKey, Transition), KeyLineError> {
    let mut words = line.split_whitespace();
    let key = words.next().ok_or(KeyLineError::Empty)?;
    let key: InputKey = key
        .parse()
        .map_err(|_| KeyLineError::UnknownKey(key.to_string()))?;

    let transition = match words.next() {
        None => Transition::Pressed,
        Some(edge) => match edge.to_ascii_lowercase().as_str() {
            "down" | "press" | "pressed" | "1" => Transition::Pressed,
            "up" | "release" | "released" | "0" => Transition::Released,
            _ => return Err(KeyLineError::UnknownEdge(edge.to_string())),
        },
    };

    if let Some(rest) = words.next() {
        return Err(KeyLineError::TrailingInput(rest.to_string()));
    }
    Ok((key, transition))
}

/// Turn key lines into button commands until input ends or the actor goes away
///
/// Lines that are not valid UTF-8 or do not parse are logged and skipped.
pub async fn forward_key_lines<R>(reader: R, key_tx: mpsc::Sender<LinkCommand>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!("Skipping unreadable key line: {}", e);
                continue;
            }
            Err(e) => {
                warn!("Key input failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_key_line(&line) {
            Ok((key, transition)) => {
                if key_tx
                    .send(LinkCommand::Button { key, transition })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Err(e) => warn!("Ignoring key line: {}", e),
        }
    }
    debug!("Key input closed");
}
