//! DCS-BIOS Export Protocol Library
//!
//! This crate decodes the binary export stream a simulator uses to mirror
//! cockpit state to external panels:
//!
//! - **Parser**: byte-at-a-time state machine producing address/value writes
//! - **Field decoders**: string and bit-field reducers over the write stream
//! - **Field bank**: named decoders for one aircraft profile
//! - **Encoder**: builds export frames for replay and testing
//!
//! # Stream layout
//!
//! Records are `[addrLo, addrHi, countLo, countHi, data...]` in little-endian
//! order. Four `0x55` bytes in a row resynchronise the parser; a write to
//! `0xFFFE` closes the frame and releases pending string values.
//!
//! # Example
//!
//! ```rust
//! use bios_protocol::{ExportFrame, FieldBank, FieldSpec, FieldValue, ProtocolParser, WriteEvent};
//! use std::sync::{Arc, Mutex};
//!
//! let mut bank = FieldBank::from_specs([(
//!     "MASTER_ARM",
//!     FieldSpec::Integer { address: 0x1936, mask: 0x0200, shift_by: 9 },
//! )])
//! .unwrap();
//!
//! let updates = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&updates);
//! let mut parser = ProtocolParser::new();
//! parser.subscribe_writes(move |event: WriteEvent| {
//!     let decoded = bank.decode(event.address, event.value);
//!     sink.lock().unwrap().extend(decoded);
//! });
//!
//! let mut frame = ExportFrame::new();
//! frame.word(0x1936, 0x0200);
//! parser.process_bytes(&frame.finish());
//!
//! let updates = updates.lock().unwrap();
//! assert_eq!(updates[0].name, "MASTER_ARM");
//! assert_eq!(updates[0].value, FieldValue::Integer(1));
//! ```

pub mod buffer;
pub mod error;
pub mod field;
pub mod frame;
pub mod parser;

pub use buffer::{IntegerField, StringField};
pub use error::FieldError;
pub use field::{FieldBank, FieldSpec, FieldUpdate, FieldValue};
pub use frame::ExportFrame;
pub use parser::{
    FrameSubscriber, FrameSyncEvent, ParserContext, ParserState, ProtocolParser, WriteEvent,
    WriteSubscriber, ABORT_ADDRESS, FRAME_COMPLETE_ADDRESS, SYNC_BYTE, SYNC_RUN_LENGTH,
};
