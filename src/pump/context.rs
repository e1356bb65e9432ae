//! Startup context shared by the pump and its sinks

use crate::error::Result;
use crate::sink::{JournalSink, RecordSink};

use super::config::IngestConfig;

/// Configuration plus the sinks batches are delivered to.
///
/// Built once at startup and handed to [`IngestionPump`](super::IngestionPump).
pub struct IngestContext {
    config: IngestConfig,
    sinks: Vec<Box<dyn RecordSink>>,
}

impl IngestContext {
    /// Validate `config` and start with no sinks
    pub fn new(config: IngestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sinks: Vec::new(),
        })
    }

    /// Like [`new`](Self::new), also opening the configured journal
    pub fn from_config(config: IngestConfig) -> Result<Self> {
        let journal = config.journal_path.clone();
        let mut context = Self::new(config)?;
        if let Some(path) = journal {
            context.add_sink(Box::new(JournalSink::open(path)?));
        }
        Ok(context)
    }

    /// Add a sink; batches reach sinks in the order they were added
    pub fn with_sink(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn RecordSink>) {
        self.sinks.push(sink);
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub(crate) fn sinks_mut(&mut self) -> &mut [Box<dyn RecordSink>] {
        &mut self.sinks
    }
}

impl std::fmt::Debug for IngestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("IngestContext")
            .field("config", &self.config)
            .field("sinks", &names)
            .finish()
    }
}
