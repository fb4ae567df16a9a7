//! Panel Input Library
//!
//! This crate turns panel key events into DCS-BIOS command frames:
//!
//! - **Keys**: G-keys, extra mouse buttons and LCD soft buttons
//! - **Requests**: the `"<CTRL> <ARGS>"` binding grammar and its encoder
//! - **Cycle cursor**: zig-zag stepping for multi-position switches
//! - **Registry**: per-profile bindings from keys to requests
//!
//! Commands are ASCII lines of the form `"<CTRL> <ARG>\n"`.
//!
//! # Example
//!
//! ```rust
//! use bios_input::{InputKey, KeyRegistry, Transition};
//!
//! let mut registry = KeyRegistry::from_pairs([
//!     ("G1_M1", "UFC_COMM1_CHANNEL_SELECT INC"),
//!     ("G2_M1", "MASTER_CAUTION_RESET_SW PUSH_BUTTON"),
//! ])
//! .unwrap();
//!
//! let key: InputKey = "G2_M1".parse().unwrap();
//! let down = registry.frames(key, Some(Transition::Pressed), |_| 0);
//! let up = registry.frames(key, Some(Transition::Released), |_| 0);
//! assert_eq!(down, vec![b"MASTER_CAUTION_RESET_SW 1\n".to_vec()]);
//! assert_eq!(up, vec![b"MASTER_CAUTION_RESET_SW 0\n".to_vec()]);
//! ```

pub mod cycle;
pub mod error;
pub mod key;
pub mod registry;
pub mod request;

pub use cycle::{CycleCursor, Direction};
pub use error::RequestError;
pub use key::{InputClass, InputKey, LcdButton, Transition};
pub use registry::KeyRegistry;
pub use request::{validate_control_name, RequestModel, RequestSpec, StepDirection};
