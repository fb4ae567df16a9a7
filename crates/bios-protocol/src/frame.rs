//! Export stream encoder
//!
//! Builds byte streams in the same layout the simulator exports, for
//! replaying captured state and for driving the parser in tests.

use crate::parser::{FRAME_COMPLETE_ADDRESS, SYNC_BYTE, SYNC_RUN_LENGTH};

/// Builder for one export frame
///
/// A frame starts with the sync marker, carries any number of records and
/// ends with a write to [`FRAME_COMPLETE_ADDRESS`].
#[derive(Debug, Clone)]
pub struct ExportFrame {
    bytes: Vec<u8>,
}

impl ExportFrame {
    /// Start a frame with a sync marker
    pub fn new() -> Self {
        Self {
            bytes: vec![SYNC_BYTE; usize::from(SYNC_RUN_LENGTH)],
        }
    }

    /// Append a record of consecutive words starting at `address`
    ///
    /// Empty slices are skipped; a zero-length record has no data bytes to
    /// end it and would desynchronise the parser.
    pub fn record(&mut self, address: u16, words: &[u16]) -> &mut Self {
        if words.is_empty() {
            return self;
        }
        let count = u16::try_from(words.len() * 2).unwrap_or(u16::MAX & !1);
        self.bytes.extend_from_slice(&address.to_le_bytes());
        self.bytes.extend_from_slice(&count.to_le_bytes());
        for word in words.iter().take(usize::from(count / 2)) {
            self.bytes.extend_from_slice(&word.to_le_bytes());
        }
        self
    }

    /// Append a single-word record
    pub fn word(&mut self, address: u16, value: u16) -> &mut Self {
        self.record(address, &[value])
    }

    /// Append raw bytes as a record, padding odd lengths with a NUL
    pub fn bytes(&mut self, address: u16, data: &[u8]) -> &mut Self {
        let words: Vec<u16> = data
            .chunks(2)
            .map(|pair| match *pair {
                [low, high] => u16::from_le_bytes([low, high]),
                [low] => u16::from(low),
                _ => 0,
            })
            .collect();
        self.record(address, &words)
    }

    /// Append a Latin-1 string field, NUL padded to `max_length`
    ///
    /// Characters outside Latin-1 are replaced with `?`; text longer than
    /// the field is truncated.
    pub fn text(&mut self, address: u16, max_length: u16, text: &str) -> &mut Self {
        let mut data: Vec<u8> = text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .take(usize::from(max_length))
            .collect();
        data.resize(usize::from(max_length), 0);
        self.bytes(address, &data)
    }

    /// Close the frame and return the encoded stream
    pub fn finish(mut self) -> Vec<u8> {
        self.word(FRAME_COMPLETE_ADDRESS, 0);
        self.bytes
    }
}

impl Default for ExportFrame {
    fn default() -> Self {
        Self::new()
    }
}
