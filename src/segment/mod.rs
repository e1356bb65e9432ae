//! Attaching to a producer-owned shared log segment

pub mod config;
pub mod handle;

pub use config::SegmentConfig;
pub use handle::{RingBufferHandle, SegmentSnapshot};
