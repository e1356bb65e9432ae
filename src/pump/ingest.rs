//! Timer-driven ingestion pump
//!
//! Each tick moves the pump from `Idle` to `Draining`: take the segment
//! lock, read the cursors, copy out the occupied slots of every unread span,
//! set `read_pos` to the observed `write_pos`, and release the lock. Parsing
//! and sink delivery happen after the lock is released so the producer is
//! never held up by storage.

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError},
    thread,
    time::Instant,
};

use crate::error::{Result, ShmLogError};
use crate::record::{parse_batch, LogRecord};
use crate::ring::{CursorProtocol, Drain, RingBufferView, SlotExtractor};
use crate::segment::RingBufferHandle;

use super::context::IngestContext;
use super::stats::{CycleOutcome, CycleReport, PumpStats};

/// Where the pump is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    /// Waiting for the next tick
    Idle,
    /// Lock held, draining
    Draining,
}

#[derive(Debug)]
enum Attachment {
    Attached(RingBufferHandle),
    /// `pending` holds an attach error not yet returned from a tick
    Detached { pending: Option<ShmLogError> },
}

/// Polls one segment and forwards each cycle's records to the sinks
#[derive(Debug)]
pub struct IngestionPump {
    context: IngestContext,
    attachment: Attachment,
    state: PumpState,
    protocol: CursorProtocol,
    extractor: SlotExtractor,
    stats: PumpStats,
    /// Consecutive cycles lost to lock failures
    lock_streak: u64,
    /// Consecutive cycles refused for corrupt cursors
    corrupt_streak: u64,
}

impl IngestionPump {
    /// Build the pump and try to attach to the configured segment.
    ///
    /// A failed attach does not fail construction: the error is returned by
    /// the first [`tick`](Self::tick), and later ticks do nothing until
    /// [`reattach`](Self::reattach) succeeds. Only an unusable slot layout
    /// fails here.
    pub fn new(context: IngestContext) -> Result<Self> {
        let segment = context.config().segment.clone();
        let attachment = match RingBufferHandle::attach(segment) {
            Ok(handle) => Attachment::Attached(handle),
            Err(err) => {
                log::error!("{}", err);
                Attachment::Detached { pending: Some(err) }
            }
        };
        Self::with_attachment(context, attachment)
    }

    /// Build the pump around an already attached handle
    pub fn with_handle(context: IngestContext, handle: RingBufferHandle) -> Result<Self> {
        Self::with_attachment(context, Attachment::Attached(handle))
    }

    fn with_attachment(context: IngestContext, attachment: Attachment) -> Result<Self> {
        let segment = &context.config().segment;
        let protocol = CursorProtocol::new(
            segment.log_area_size(),
            segment.slot_size,
            context.config().cursor_policy,
        )?;
        let extractor = SlotExtractor::new(segment.slot_size)?;
        Ok(Self {
            context,
            attachment,
            state: PumpState::Idle,
            protocol,
            extractor,
            stats: PumpStats::new(),
            lock_streak: 0,
            corrupt_streak: 0,
        })
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.attachment, Attachment::Attached(_))
    }

    pub fn stats(&self) -> &PumpStats {
        &self.stats
    }

    pub fn context(&self) -> &IngestContext {
        &self.context
    }

    /// Retry attaching on operator request
    pub fn reattach(&mut self) -> Result<()> {
        if self.is_attached() {
            return Ok(());
        }
        match RingBufferHandle::attach(self.context.config().segment.clone()) {
            Ok(handle) => {
                self.attachment = Attachment::Attached(handle);
                Ok(())
            }
            Err(err) => {
                // Returned here, so ticks stay quiet about it
                self.attachment = Attachment::Detached { pending: None };
                Err(err)
            }
        }
    }

    /// Run one poll cycle.
    ///
    /// Only an attach failure is returned as `Err`, and only once per
    /// failure. Lock failures and corrupt cursors end the cycle early and
    /// show up in the report.
    pub fn tick(&mut self) -> Result<CycleReport> {
        let handle = match &mut self.attachment {
            Attachment::Attached(handle) => handle,
            Attachment::Detached { pending } => {
                let pending = pending.take();
                self.stats.record(&CycleReport::new(CycleOutcome::Detached));
                return match pending {
                    Some(err) => Err(err),
                    None => Ok(CycleReport::new(CycleOutcome::Detached)),
                };
            }
        };

        self.state = PumpState::Draining;
        let (protocol, extractor) = (self.protocol, self.extractor);
        let log_area_size = protocol.log_area_size();
        let slot_size = extractor.slot_size();
        let locked = handle.with_lock(|bytes| -> Result<Drain> {
            let mut view = RingBufferView::new(bytes, log_area_size, slot_size)?;
            view.drain(&protocol, &extractor)
        });
        self.state = PumpState::Idle;

        let report = match locked {
            Err(err) => self.lock_failed(err),
            Ok(Err(err)) => {
                self.lock_streak = 0;
                self.corrupt_cursor(err)
            }
            Ok(Ok(drain)) => {
                self.lock_streak = 0;
                self.corrupt_streak = 0;
                self.deliver(drain)
            }
        };

        self.stats.record(&report);
        Ok(report)
    }

    fn lock_failed(&mut self, err: ShmLogError) -> CycleReport {
        self.lock_streak += 1;
        if self.lock_streak == 1 {
            log::warn!("{}; retrying next tick", err);
        } else {
            log::debug!("{} ({} cycles in a row)", err, self.lock_streak);
        }
        CycleReport::new(CycleOutcome::LockFailed)
    }

    fn corrupt_cursor(&mut self, err: ShmLogError) -> CycleReport {
        self.corrupt_streak += 1;
        if self.corrupt_streak == 1 {
            log::error!("Cycle skipped: {}", err);
        } else {
            log::debug!("Cycle skipped: {} ({} cycles in a row)", err, self.corrupt_streak);
        }
        CycleReport::new(CycleOutcome::CorruptCursor)
    }

    /// Cycles in a row refused for corrupt cursors
    pub fn corrupt_streak(&self) -> u64 {
        self.corrupt_streak
    }

    fn deliver(&mut self, drain: Drain) -> CycleReport {
        let outcome = if drain.header.is_caught_up() {
            CycleOutcome::NoData
        } else {
            CycleOutcome::Drained
        };
        let mut report = CycleReport::new(outcome);
        report.header = Some(drain.header);
        report.slots_scanned = drain.extraction.slots_scanned;
        report.empty_slots = drain.extraction.empty_slots;
        report.decode_anomalies = drain.extraction.anomalies;
        report.spans = drain.spans;

        if report.decode_anomalies > 0 {
            log::warn!("Skipped {} unterminated slots", report.decode_anomalies);
        }

        let batch = parse_batch(&drain.extraction.texts);
        report.parse_failures = batch.failures;
        if batch.failures > 0 {
            log::warn!("Dropped {} malformed records", batch.failures);
        }

        if !batch.records.is_empty() {
            self.dispatch(&batch.records, &mut report);
            report.records_delivered = batch.records.len();
        }

        log::debug!(
            "Cycle: write_pos {:?}, {} slots, {} records, {} parse failures",
            report.observed_write_pos(),
            report.slots_scanned,
            report.records_delivered,
            report.parse_failures
        );
        report
    }

    fn dispatch(&mut self, records: &[LogRecord], report: &mut CycleReport) {
        for sink in self.context.sinks_mut() {
            match sink.ingest(records) {
                Ok(sink_report) => {
                    if sink_report.rejected > 0 {
                        log::warn!(
                            "Sink {} rejected {} of {} records",
                            sink.name(),
                            sink_report.rejected,
                            records.len()
                        );
                    }
                    report.sink_rejections += sink_report.rejected;
                }
                Err(err) => {
                    log::error!("{}", err);
                    report.sink_failures += 1;
                }
            }
        }
    }

    /// Tick on the configured period until `shutdown` receives a message or
    /// its sender is dropped.
    ///
    /// Returns early with the attach error if the segment is not attached.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<PumpStats> {
        let period = self.context.config().poll_period;
        loop {
            let deadline = Instant::now() + period;
            self.tick()?;
            match shutdown.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::info!("Pump stopped: {}", self.stats.summary());
        Ok(self.stats.clone())
    }

    /// Run exactly `cycles` ticks, one period apart
    pub fn run_cycles(&mut self, cycles: u64) -> Result<PumpStats> {
        let period = self.context.config().poll_period;
        for i in 0..cycles {
            let started = Instant::now();
            self.tick()?;
            if i + 1 < cycles {
                thread::sleep(period.saturating_sub(started.elapsed()));
            }
        }
        Ok(self.stats.clone())
    }
}
