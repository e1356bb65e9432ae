//! Fixed-size slot decoding

use crate::error::{Result, ShmLogError};

use super::cursor::Span;
use super::view::RingBufferView;

/// What a single slot holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    /// First byte is NUL
    Empty,
    /// NUL-terminated text, decoded
    Text(String),
    /// No NUL inside the slot bounds
    Unterminated,
}

/// Decode one slot.
///
/// Only the bytes of `slot` are examined; text running to the end of the
/// slot without a terminator is reported as [`SlotContent::Unterminated`].
pub fn decode_slot(slot: &[u8]) -> SlotContent {
    match slot.first() {
        None | Some(0) => SlotContent::Empty,
        Some(_) => match slot.iter().position(|&b| b == 0) {
            Some(nul) => SlotContent::Text(decode_latin1(&slot[..nul])),
            None => SlotContent::Unterminated,
        },
    }
}

/// ISO-8859-1: every byte maps to the code point of the same value
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Slot texts pulled out of one or more spans, with counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Decoded texts in slot order
    pub texts: Vec<String>,
    /// Whole slots visited
    pub slots_scanned: usize,
    /// Slots skipped because they were empty
    pub empty_slots: usize,
    /// Slots skipped because they were not terminated (or out of bounds)
    pub anomalies: usize,
    /// Bytes of trailing partial slots that were ignored
    pub partial_bytes: usize,
}

impl Extraction {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Slices spans into slots and decodes the occupied ones
#[derive(Debug, Clone, Copy)]
pub struct SlotExtractor {
    slot_size: usize,
}

impl SlotExtractor {
    pub fn new(slot_size: usize) -> Result<Self> {
        if slot_size == 0 {
            return Err(ShmLogError::invalid_parameter(
                "slot_size",
                "Slot size must be greater than 0",
            ));
        }
        Ok(Self { slot_size })
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Append the texts of every occupied slot in `span` to `out`
    pub fn extract(&self, view: &RingBufferView<'_>, span: Span, out: &mut Extraction) {
        let slot_count = span.slot_count(self.slot_size);
        out.partial_bytes += span.partial_bytes(self.slot_size);

        for i in 0..slot_count {
            let offset = span.offset + i * self.slot_size;
            let Some(slot) = view.slot(offset) else {
                // Cursor arithmetic ran past the log area; nothing beyond is ours
                out.anomalies += slot_count - i;
                break;
            };

            out.slots_scanned += 1;
            match decode_slot(slot) {
                SlotContent::Empty => out.empty_slots += 1,
                SlotContent::Text(text) => out.texts.push(text),
                SlotContent::Unterminated => {
                    log::debug!("Unterminated slot at log offset {}", offset);
                    out.anomalies += 1;
                }
            }
        }
    }
}
