//! Application settings

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bios_link::{
    Profile, DEFAULT_COMMAND_ADDR, DEFAULT_EXPORT_PORT, DEFAULT_MULTICAST_GROUP,
    DEFAULT_RECV_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Multicast group the export stream is sent to
    pub multicast_group: Ipv4Addr,
    /// Local interface used to join the group
    pub multicast_interface: Ipv4Addr,
    /// Export stream port
    pub export_port: u16,
    /// Listen on this unicast address instead of joining the multicast group
    pub listen_addr: Option<SocketAddr>,
    /// Where command frames are sent
    pub command_addr: SocketAddr,
    /// How long a receive may block before shutdown is checked (ms)
    pub recv_timeout_ms: u64,
    /// Field layout and key bindings of the active aircraft
    pub profile: Profile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            multicast_group: DEFAULT_MULTICAST_GROUP,
            multicast_interface: Ipv4Addr::UNSPECIFIED,
            export_port: DEFAULT_EXPORT_PORT,
            listen_addr: None,
            command_addr: SocketAddr::V4(DEFAULT_COMMAND_ADDR),
            recv_timeout_ms: DEFAULT_RECV_TIMEOUT.as_millis() as u64,
            profile: Profile::default(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for biospanel
    /// Uses $XDG_CONFIG_HOME/biospanel on Linux/macOS, falls back to ~/.config/biospanel
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("biospanel"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("biospanel"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the default location
    ///
    /// A missing file gives the defaults; an unreadable one is logged and
    /// also gives the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine settings path, using defaults");
            return Self::default();
        };
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("{:#}, using defaults", e);
            Self::default()
        })
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Save settings to the default location, returning the path written
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::settings_path().context("Could not determine settings path")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }
}
