//! Stopping the run loop from SIGINT/SIGTERM

use std::sync::mpsc::{self, Receiver};

use crate::error::{Result, ShmLogError};

/// Install a process-wide interrupt handler and return the channel it
/// signals, ready to pass to [`IngestionPump::run`](super::IngestionPump::run).
///
/// Only one handler can be installed per process; a second call fails.
pub fn shutdown_on_signal() -> Result<Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, stopping after the current cycle");
        let _ = shutdown_tx.send(());
    })
    .map_err(|e| {
        ShmLogError::from_io(
            std::io::Error::new(std::io::ErrorKind::Other, e),
            "Failed to install signal handler",
        )
    })?;
    Ok(shutdown_rx)
}
