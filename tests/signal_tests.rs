//! Interrupt handling for the run loop.
//!
//! Kept in its own test binary: the handler is installed once per process.

mod common;

use std::{thread, time::Duration};

use nix::{
    sys::signal::{kill, Signal},
    unistd::Pid,
};
use shmlog::{shutdown_on_signal, IngestConfig, IngestContext, IngestionPump, MemorySink};

use common::TestSegment;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigterm_stops_run_and_returns_stats() {
        let segment = TestSegment::create();
        let memory = MemorySink::new();
        let config = IngestConfig::default()
            .with_segment(segment.config())
            .with_poll_period(Duration::from_millis(5));
        let context = IngestContext::new(config).unwrap().with_sink(memory.clone());
        let mut pump = IngestionPump::new(context).unwrap();
        segment.push(&["[t] before signal"]);

        let shutdown_rx = shutdown_on_signal().unwrap();
        let signaller = thread::spawn(|| {
            thread::sleep(Duration::from_millis(40));
            kill(Pid::this(), Signal::SIGTERM).unwrap();
        });

        let stats = pump.run(&shutdown_rx).unwrap();
        signaller.join().unwrap();

        assert!(stats.cycles >= 1);
        assert_eq!(stats.records_delivered, 1);
        assert_eq!(memory.len(), 1);

        // A second handler cannot be installed in the same process
        assert!(shutdown_on_signal().is_err());
    }
}
