//! # shmlog - Shared Memory Log Ring Reader
//!
//! shmlog drains log records that another process writes into a named
//! shared-memory ring, parses them, and hands each poll cycle's records to
//! storage and presentation sinks as one ordered batch.
//!
//! ## Features
//!
//! - **Attach-only reader**: maps an existing producer-owned segment
//! - **Scoped cross-process lock**: every cursor and slot access happens under `flock`
//! - **Wraparound-safe draining**: tail span first, then the wrapped head
//! - **Bounds-checked slots**: no read ever leaves the log area
//! - **Continue-on-error**: a bad slot, record, or insert never stalls the ring
//! - **Sinks**: durable JSON-lines journal, shared in-memory model, console
//!
//! ## Architecture
//!
//! ```text
//! producer ──► shared segment
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────────────┐
//! │ RingBufferHandle   attach + with_lock           │
//! │ CursorProtocol     header cursors ──► spans     │
//! │ SlotExtractor      spans ──► slot texts         │
//! │ LogRecord::parse   text ──► (timestamp, content)│
//! │ IngestionPump      tick: lock, drain, release   │
//! └─────────────────────────────────────────────────┘
//!                  │  one batch per cycle
//!                  ▼
//!      journal / memory / console sinks
//! ```

pub mod error;
pub mod pump;
pub mod record;
pub mod ring;
pub mod segment;
pub mod sink;

// Main API re-exports
pub use error::{Result, ShmLogError};
pub use pump::{
    CycleOutcome, CycleReport, IngestConfig, IngestContext, IngestionPump, PumpState, PumpStats,
    shutdown_on_signal,
};
pub use record::{parse_batch, LogRecord, ParsedBatch};
pub use ring::{CursorHeader, CursorPolicy, CursorProtocol, RingBufferView, SlotExtractor, Span};
pub use segment::{RingBufferHandle, SegmentConfig, SegmentSnapshot};
pub use sink::{ConsoleSink, JournalRow, JournalSink, MemorySink, RecordSink, SinkReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reference sizing and layout constants
pub mod defaults {
    use std::time::Duration;

    /// Total segment size (10 MiB)
    pub const SHMEM_SIZE: usize = 10 * 1024 * 1024;

    /// Size of one log slot
    pub const LOG_SIZE: usize = 256;

    /// Header holding the two cursors
    pub const HEADER_SIZE: usize = 8;

    /// Byte offset of `write_pos` in the header
    pub const WRITE_POS_OFFSET: usize = 0;

    /// Byte offset of `read_pos` in the header
    pub const READ_POS_OFFSET: usize = 4;

    /// Period between poll cycles
    pub const POLL_PERIOD: Duration = Duration::from_millis(100);

    /// Directory holding named POSIX shared memory objects
    pub const SEGMENT_DIR: &str = "/dev/shm";
}
