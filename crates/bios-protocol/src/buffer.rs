//! Field decoders
//!
//! Decoders reduce the raw write stream to typed values for one exported
//! field. Both are pure reducers: `on_write` returns the new value when
//! one is ready.
//!
//! - [`StringField`] buffers characters and only surfaces a string once per
//!   export frame, when the frame-complete address is written.
//! - [`IntegerField`] masks and shifts a single word and reports changes.

use crate::parser::{WriteEvent, WriteSubscriber, FRAME_COMPLETE_ADDRESS};

/// Fixed-length text field
pub struct StringField {
    base_address: u16,
    buffer: Vec<u8>,
    dirty: bool,
}

impl StringField {
    /// Create a field covering `[base_address, base_address + length)`
    pub fn new(base_address: u16, length: u16) -> Self {
        Self {
            base_address,
            buffer: vec![0; usize::from(length)],
            dirty: false,
        }
    }

    /// First address covered by this field
    pub fn base_address(&self) -> u16 {
        self.base_address
    }

    /// Field length in bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the field covers no bytes
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether a byte changed since the last emitted string
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Raw buffer contents
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Apply one write; returns the completed string at frame end if it changed
    pub fn on_write(&mut self, address: u16, value: u16) -> Option<String> {
        if let Some(offset) = self.offset_of(address) {
            let [low, high] = value.to_le_bytes();
            self.set_byte(offset, low);
            if offset + 1 < self.buffer.len() {
                self.set_byte(offset + 1, high);
            }
        }

        if address != FRAME_COMPLETE_ADDRESS || !self.dirty {
            return None;
        }

        self.dirty = false;
        Some(self.decode())
    }

    fn offset_of(&self, address: u16) -> Option<usize> {
        let offset = usize::from(address.checked_sub(self.base_address)?);
        (offset < self.buffer.len()).then_some(offset)
    }

    fn set_byte(&mut self, index: usize, byte: u8) {
        if let Some(slot) = self.buffer.get_mut(index) {
            if *slot != byte {
                *slot = byte;
                self.dirty = true;
            }
        }
    }

    /// Latin-1 decode of everything up to the first NUL
    fn decode(&self) -> String {
        self.buffer
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| char::from(b))
            .collect()
    }
}

impl WriteSubscriber for StringField {
    fn write_event(&mut self, event: WriteEvent) {
        self.on_write(event.address, event.value);
    }
}

impl std::fmt::Debug for StringField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringField")
            .field("base_address", &format_args!("0x{:04X}", self.base_address))
            .field("length", &self.buffer.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Bit-field within a single exported word
pub struct IntegerField {
    address: u16,
    mask: u16,
    shift_by: u8,
    last_value: Option<u16>,
}

impl IntegerField {
    /// Create a decoder for `(word & mask) >> shift_by` at `address`
    pub fn new(address: u16, mask: u16, shift_by: u8) -> Self {
        Self {
            address,
            mask,
            shift_by,
            last_value: None,
        }
    }

    /// Address of the word holding this field
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Last value emitted, if any write has matched yet
    pub fn last_value(&self) -> Option<u16> {
        self.last_value
    }

    /// Apply one write; returns the new value if it changed
    pub fn on_write(&mut self, address: u16, value: u16) -> Option<u16> {
        if address != self.address {
            return None;
        }

        let masked = (value & self.mask)
            .checked_shr(u32::from(self.shift_by))
            .unwrap_or(0);
        if self.last_value == Some(masked) {
            return None;
        }

        self.last_value = Some(masked);
        Some(masked)
    }
}

impl WriteSubscriber for IntegerField {
    fn write_event(&mut self, event: WriteEvent) {
        self.on_write(event.address, event.value);
    }
}

impl std::fmt::Debug for IntegerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegerField")
            .field("address", &format_args!("0x{:04X}", self.address))
            .field("mask", &format_args!("0x{:04X}", self.mask))
            .field("shift_by", &self.shift_by)
            .field("last_value", &self.last_value)
            .finish()
    }
}
