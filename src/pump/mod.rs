//! Polling driver that drains the ring into sinks

pub mod config;
pub mod context;
pub mod ingest;
pub mod shutdown;
pub mod stats;

pub use config::IngestConfig;
pub use context::IngestContext;
pub use ingest::{IngestionPump, PumpState};
pub use shutdown::shutdown_on_signal;
pub use stats::{CycleOutcome, CycleReport, PumpStats};
