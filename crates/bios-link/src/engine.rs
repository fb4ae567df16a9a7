//! Panel link engine
//!
//! The synchronous core that ties the export parser, the field bank, the
//! key registry and the live panel state together. The actor drives it
//! from a single task; tests drive it directly.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use bios_input::{InputKey, KeyRegistry, Transition};
use bios_protocol::{
    FieldBank, FieldSpec, FieldUpdate, FrameSyncEvent, ParserState, ProtocolParser, WriteEvent,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LinkError;
use crate::events::LinkEvent;
use crate::state::PanelState;

/// Field layout and key bindings for one aircraft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Exported fields by control name
    pub fields: BTreeMap<String, FieldSpec>,
    /// Request strings by key name, e.g. `"G1_M1" -> "UFC_1 PUSH_BUTTON"`
    pub keys: BTreeMap<String, String>,
}

/// Output of the parser subscribers, in stream order
#[derive(Debug)]
enum Decoded {
    FrameSync,
    Field(FieldUpdate),
}

type DecodedQueue = Arc<Mutex<Vec<Decoded>>>;

/// Synchronous panel link
pub struct PanelLink {
    parser: ProtocolParser,
    bank: Arc<Mutex<FieldBank>>,
    decoded: DecodedQueue,
    registry: KeyRegistry,
    panel: PanelState,
}

impl PanelLink {
    /// Create a link with no fields and no bindings
    pub fn new() -> Self {
        let bank = Arc::new(Mutex::new(FieldBank::new()));
        let decoded: DecodedQueue = Arc::new(Mutex::new(Vec::new()));

        let mut parser = ProtocolParser::new();

        let write_bank = Arc::clone(&bank);
        let write_queue = Arc::clone(&decoded);
        parser.subscribe_writes(move |event: WriteEvent| {
            let updates = write_bank
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .decode(event.address, event.value);
            if !updates.is_empty() {
                write_queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend(updates.into_iter().map(Decoded::Field));
            }
        });

        let frame_queue = Arc::clone(&decoded);
        parser.subscribe_frames(move |_: FrameSyncEvent| {
            frame_queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Decoded::FrameSync);
        });

        Self {
            parser,
            bank,
            decoded,
            registry: KeyRegistry::new(),
            panel: PanelState::new(),
        }
    }

    /// Create a link with a profile already loaded
    pub fn with_profile(profile: &Profile) -> Result<Self, LinkError> {
        let mut link = Self::new();
        link.load_profile(profile)?;
        Ok(link)
    }

    /// Replace field layout and key bindings
    ///
    /// On error the previous profile stays active. Live values are
    /// dropped; the parser keeps its position in the stream.
    pub fn load_profile(&mut self, profile: &Profile) -> Result<LinkEvent, LinkError> {
        let bank = FieldBank::from_specs(profile.fields.iter().map(|(n, s)| (n.as_str(), *s)))?;
        let registry = KeyRegistry::from_pairs(&profile.keys)?;

        for name in registry.cycle_controls() {
            if !bank.contains(name) {
                warn!("Cycle control {} has no exported field; it will start at 0", name);
            }
        }

        let event = LinkEvent::ProfileLoaded {
            fields: bank.len(),
            keys: registry.len(),
        };
        *self.bank.lock().unwrap_or_else(PoisonError::into_inner) = bank;
        self.registry = registry;
        self.panel.clear();

        info!("{}", event.description());
        Ok(event)
    }

    /// Feed one export datagram and collect what it changed
    pub fn process_export(&mut self, data: &[u8]) -> Vec<LinkEvent> {
        self.parser.process_bytes(data);

        let decoded =
            std::mem::take(&mut *self.decoded.lock().unwrap_or_else(PoisonError::into_inner));
        decoded
            .into_iter()
            .map(|d| match d {
                Decoded::FrameSync => LinkEvent::FrameSync,
                Decoded::Field(update) => {
                    self.panel.apply(&update);
                    debug!("{} = {}", update.name, update.value);
                    LinkEvent::FieldChanged(update)
                }
            })
            .collect()
    }

    /// Encode the command frames for a key event
    pub fn button(&mut self, key: InputKey, transition: Transition) -> Vec<Vec<u8>> {
        let panel = &self.panel;
        self.registry.frames(key, Some(transition), |name| panel.int_value(name))
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Current export parser state
    pub fn parser_state(&self) -> ParserState {
        self.parser.state()
    }
}

impl Default for PanelLink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PanelLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelLink")
            .field("parser_state", &self.parser.state())
            .field("keys", &self.registry.len())
            .field("values", &self.panel.len())
            .finish()
    }
}
