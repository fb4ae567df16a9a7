//! DCS-BIOS Panel Link
//!
//! This crate connects a panel to a running simulator without any UI:
//!
//! - **Engine**: export parser, field bank, key registry and live values
//! - **Actor**: runs the engine in one task, fed through a command channel
//! - **Network**: multicast export listener and UDP command sender
//!
//! # Data flow
//!
//! ```text
//! UDP export  -> ExportListener -> LinkCommand::ExportData -> actor -> LinkEvent::FieldChanged
//! key event   -> LinkCommand::Button -> actor -> command frames -> CommandSender -> UDP
//! ```
//!
//! Cycle requests are seeded from the live values the actor has decoded, so
//! the first press continues from the cockpit's current switch position.
//!
//! # Example
//!
//! ```rust
//! use bios_link::{LinkEvent, PanelLink, Profile};
//! use bios_input::{InputKey, Transition};
//! use bios_protocol::{ExportFrame, FieldSpec};
//!
//! let mut profile = Profile::default();
//! profile.fields.insert(
//!     "IFF_MASTER_KNB".into(),
//!     FieldSpec::Integer { address: 0x4424, mask: 0x0700, shift_by: 8 },
//! );
//! profile.keys.insert("G1_M1".into(), "IFF_MASTER_KNB CYCLE 1 4".into());
//!
//! let mut link = PanelLink::with_profile(&profile).unwrap();
//!
//! let mut frame = ExportFrame::new();
//! frame.word(0x4424, 0x0200);
//! let events = link.process_export(&frame.finish());
//! assert_eq!(events[0], LinkEvent::FrameSync);
//!
//! let frames = link.button(InputKey::GKey { key: 1, mode: 1 }, Transition::Pressed);
//! assert_eq!(frames, vec![b"IFF_MASTER_KNB 3\n".to_vec()]);
//! ```

pub mod actor;
pub mod engine;
pub mod error;
pub mod events;
pub mod net;
pub mod state;

pub use actor::{run_link_actor, LinkCommand};
pub use engine::{PanelLink, Profile};
pub use error::LinkError;
pub use events::LinkEvent;
pub use net::{
    CommandSender, ExportListener, DEFAULT_COMMAND_ADDR, DEFAULT_EXPORT_PORT,
    DEFAULT_MULTICAST_GROUP, DEFAULT_RECV_TIMEOUT,
};
pub use state::{BiosValue, PanelState};
