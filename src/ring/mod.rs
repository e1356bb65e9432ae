//! Reader side of the shared log ring
//!
//! ```text
//! ┌──────────┬──────────┬──────────────────────────────────────────┐
//! │ writePos │ readPos  │ log area: slot 0 │ slot 1 │ ... │ slot N │
//! │  u32 ne  │  u32 ne  │ NUL-terminated text per fixed-size slot  │
//! └──────────┴──────────┴──────────────────────────────────────────┘
//! ```

pub mod cursor;
pub mod slots;
pub mod view;


pub use cursor::{CursorHeader, CursorPolicy, CursorProtocol, Span};
pub use slots::{decode_latin1, decode_slot, Extraction, SlotContent, SlotExtractor};
pub use view::{Drain, RingBufferView};
