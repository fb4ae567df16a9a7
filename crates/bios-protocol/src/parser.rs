//! Export stream parser
//!
//! The export stream is an unbounded sequence of little-endian records:
//!
//! ```text
//! [addrLo, addrHi, countLo, countHi, (dataLo, dataHi) * count/2]
//! ```
//!
//! interleaved with runs of four `0x55` bytes that mark the start of a new
//! export frame. The parser consumes one byte at a time and never fails:
//! a corrupted stream produces wrong writes until the next sync run
//! realigns it to a record boundary.

use tracing::trace;

/// Byte value that makes up the frame sync marker
pub const SYNC_BYTE: u8 = 0x55;

/// Number of consecutive [`SYNC_BYTE`]s that force a resync
pub const SYNC_RUN_LENGTH: u8 = 4;

/// Reserved address that aborts the record in progress
pub const ABORT_ADDRESS: u16 = 0x5555;

/// Address written once per frame after all field data has been exported
pub const FRAME_COMPLETE_ADDRESS: u16 = 0xFFFE;

/// Parser state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParserState {
    /// Waiting for four consecutive sync bytes
    #[default]
    WaitForSync,
    /// Expecting the low byte of a record address
    AddressLow,
    /// Expecting the high byte of a record address
    AddressHigh,
    /// Expecting the low byte of the record byte count
    CountLow,
    /// Expecting the high byte of the record byte count
    CountHigh,
    /// Expecting the low byte of a data word
    DataLow,
    /// Expecting the high byte of a data word
    DataHigh,
}

/// Mutable parser registers
///
/// `count` holds the number of record bytes still to be read, not words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserContext {
    /// Current state
    pub state: ParserState,
    /// Address of the next data word
    pub address: u16,
    /// Remaining data bytes in the current record
    pub count: u16,
    /// Data word being assembled
    pub data: u16,
    /// Number of consecutive sync bytes seen
    pub sync_run_length: u8,
}

/// A single 16-bit write decoded from the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteEvent {
    /// Target address
    pub address: u16,
    /// Little-endian data word
    pub value: u16,
}

/// Marker emitted when a sync run starts a new export frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameSyncEvent;

/// Receives every [`WriteEvent`] produced by a [`ProtocolParser`]
pub trait WriteSubscriber: Send {
    /// Handle one decoded write
    fn write_event(&mut self, event: WriteEvent);
}

impl<F> WriteSubscriber for F
where
    F: FnMut(WriteEvent) + Send,
{
    fn write_event(&mut self, event: WriteEvent) {
        self(event)
    }
}

/// Receives every [`FrameSyncEvent`] produced by a [`ProtocolParser`]
pub trait FrameSubscriber: Send {
    /// Handle the start of a new export frame
    fn frame_sync(&mut self, event: FrameSyncEvent);
}

impl<F> FrameSubscriber for F
where
    F: FnMut(FrameSyncEvent) + Send,
{
    fn frame_sync(&mut self, event: FrameSyncEvent) {
        self(event)
    }
}

/// Byte-at-a-time export stream parser
///
/// Subscribers are notified synchronously, in registration order, before
/// the next byte is consumed.
#[derive(Default)]
pub struct ProtocolParser {
    context: ParserContext,
    write_subscribers: Vec<Box<dyn WriteSubscriber>>,
    frame_subscribers: Vec<Box<dyn FrameSubscriber>>,
}

impl ProtocolParser {
    /// Create a parser waiting for the first sync run
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for decoded writes
    pub fn subscribe_writes<S>(&mut self, subscriber: S)
    where
        S: WriteSubscriber + 'static,
    {
        self.write_subscribers.push(Box::new(subscriber));
    }

    /// Register a subscriber for frame sync markers
    pub fn subscribe_frames<S>(&mut self, subscriber: S)
    where
        S: FrameSubscriber + 'static,
    {
        self.frame_subscribers.push(Box::new(subscriber));
    }

    /// Current state machine state
    pub fn state(&self) -> ParserState {
        self.context.state
    }

    /// Snapshot of the parser registers
    pub fn context(&self) -> ParserContext {
        self.context
    }

    /// Feed a whole datagram, byte by byte
    pub fn process_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.process_byte(byte);
        }
    }

    /// Advance the state machine by one byte
    pub fn process_byte(&mut self, byte: u8) {
        if byte == SYNC_BYTE {
            self.context.sync_run_length += 1;
        } else {
            self.context.sync_run_length = 0;
        }

        let ctx = &mut self.context;
        match ctx.state {
            ParserState::WaitForSync => {}
            ParserState::AddressLow => {
                ctx.address = u16::from(byte);
                ctx.state = ParserState::AddressHigh;
            }
            ParserState::AddressHigh => {
                ctx.address = ctx.address.wrapping_add(u16::from(byte) << 8);
                ctx.state = if ctx.address == ABORT_ADDRESS {
                    ParserState::WaitForSync
                } else {
                    ParserState::CountLow
                };
            }
            ParserState::CountLow => {
                ctx.count = u16::from(byte);
                ctx.state = ParserState::CountHigh;
            }
            ParserState::CountHigh => {
                ctx.count = ctx.count.wrapping_add(u16::from(byte) << 8);
                ctx.state = ParserState::DataLow;
            }
            ParserState::DataLow => {
                ctx.data = u16::from(byte);
                ctx.count = ctx.count.wrapping_sub(1);
                ctx.state = ParserState::DataHigh;
            }
            ParserState::DataHigh => {
                ctx.data = ctx.data.wrapping_add(u16::from(byte) << 8);
                ctx.count = ctx.count.wrapping_sub(1);

                let event = WriteEvent {
                    address: ctx.address,
                    value: ctx.data,
                };
                for subscriber in &mut self.write_subscribers {
                    subscriber.write_event(event);
                }

                let ctx = &mut self.context;
                ctx.address = ctx.address.wrapping_add(2);
                ctx.state = if ctx.count == 0 {
                    ParserState::AddressLow
                } else {
                    ParserState::DataLow
                };
            }
        }

        if self.context.sync_run_length == SYNC_RUN_LENGTH {
            trace!(previous = ?self.context.state, "export frame sync");
            self.context.state = ParserState::AddressLow;
            self.context.sync_run_length = 0;
            for subscriber in &mut self.frame_subscribers {
                subscriber.frame_sync(FrameSyncEvent);
            }
        }
    }
}

impl std::fmt::Debug for ProtocolParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolParser")
            .field("context", &self.context)
            .field("write_subscribers", &self.write_subscribers.len())
            .field("frame_subscribers", &self.frame_subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recording_parser() -> (ProtocolParser, Arc<Mutex<Vec<WriteEvent>>>, Arc<Mutex<usize>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let frames = Arc::new(Mutex::new(0usize));

        let mut parser = ProtocolParser::new();
        let sink = Arc::clone(&writes);
        parser.subscribe_writes(move |event: WriteEvent| sink.lock().unwrap().push(event));
        let counter = Arc::clone(&frames);
        parser.subscribe_frames(move |_: FrameSyncEvent| *counter.lock().unwrap() += 1);

        (parser, writes, frames)
    }

    #[test]
    fn test_starts_waiting_for_sync() {
        let parser = ProtocolParser::new();
        assert_eq!(parser.state(), ParserState::WaitForSync);
        assert_eq!(parser.context(), ParserContext::default());
    }

    #[test]
    fn test_four_sync_bytes_move_to_address_low() {
        let (mut parser, _, frames) = recording_parser();
        parser.process_bytes(&[0x55, 0x55, 0x55]);
        assert_eq!(parser.state(), ParserState::WaitForSync);
        assert_eq!(*frames.lock().unwrap(), 0);

        parser.process_byte(0x55);
        assert_eq!(parser.state(), ParserState::AddressLow);
        assert_eq!(parser.context().sync_run_length, 0);
        assert_eq!(*frames.lock().unwrap(), 1);
    }

    #[test]
    fn test_interrupted_sync_run_does_not_resync() {
        let (mut parser, _, frames) = recording_parser();
        parser.process_bytes(&[0x55, 0x55, 0x00, 0x55, 0x55]);
        assert_eq!(parser.state(), ParserState::WaitForSync);
        assert_eq!(*frames.lock().unwrap(), 0);
    }

    #[test]
    fn test_single_record() {
        let (mut parser, writes, _) = recording_parser();
        parser.process_bytes(&[0x55, 0x55, 0x55, 0x55]);
        parser.process_bytes(&[0x24, 0x19, 0x04, 0x00, 0x31, 0x32, 0x33, 0x34]);

        assert_eq!(
            *writes.lock().unwrap(),
            vec![
                WriteEvent {
                    address: 0x1924,
                    value: 0x3231
                },
                WriteEvent {
                    address: 0x1926,
                    value: 0x3433
                },
            ]
        );
        assert_eq!(parser.state(), ParserState::AddressLow);
    }

    #[test]
    fn test_state_sequence_through_record() {
        let mut parser = ProtocolParser::new();
        parser.process_bytes(&[0x55; 4]);

        let expected = [
            (0x10, ParserState::AddressHigh),
            (0x20, ParserState::CountLow),
            (0x02, ParserState::CountHigh),
            (0x00, ParserState::DataLow),
            (0x01, ParserState::DataHigh),
            (0x00, ParserState::AddressLow),
        ];
        for (byte, state) in expected {
            parser.process_byte(byte);
            assert_eq!(parser.state(), state);
        }
    }

    #[test]
    fn test_abort_address_returns_to_wait_for_sync() {
        let (mut parser, writes, _) = recording_parser();
        parser.process_bytes(&[0x55; 4]);
        // Address 0x5555
        parser.process_bytes(&[0x55, 0x55]);
        assert_eq!(parser.state(), ParserState::WaitForSync);
        parser.process_bytes(&[0x02, 0x00, 0x01, 0x00]);
        assert!(writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sync_interrupts_mid_record() {
        let (mut parser, writes, frames) = recording_parser();
        parser.process_bytes(&[0x55; 4]);
        // Record claims 8 bytes but is cut short by a sync run
        parser.process_bytes(&[0x00, 0x10, 0x08, 0x00, 0x01, 0x02]);
        parser.process_bytes(&[0x55; 4]);
        assert_eq!(parser.state(), ParserState::AddressLow);
        assert_eq!(*frames.lock().unwrap(), 2);

        parser.process_bytes(&[0x00, 0x20, 0x02, 0x00, 0x07, 0x00]);
        let writes = writes.lock().unwrap();
        assert_eq!(
            writes.last(),
            Some(&WriteEvent {
                address: 0x2000,
                value: 0x0007
            })
        );
    }

    #[test]
    fn test_write_subscribers_called_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut parser = ProtocolParser::new();
        for id in 0..3 {
            let order = Arc::clone(&order);
            parser.subscribe_writes(move |_: WriteEvent| order.lock().unwrap().push(id));
        }

        parser.process_bytes(&[0x55; 4]);
        parser.process_bytes(&[0x00, 0x10, 0x02, 0x00, 0x01, 0x00]);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_garbage_before_sync_is_ignored() {
        let (mut parser, writes, _) = recording_parser();
        parser.process_bytes(&[0x01, 0x02, 0x03, 0xFF, 0x00]);
        assert_eq!(parser.state(), ParserState::WaitForSync);
        assert!(writes.lock().unwrap().is_empty());
    }
}
