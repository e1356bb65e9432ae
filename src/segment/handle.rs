//! Attached shared log segment

use std::{
    fs::{File, OpenOptions},
    io::ErrorKind,
    path::PathBuf,
};

use memmap2::{MmapMut, MmapOptions};
use nix::{
    errno::Errno,
    fcntl::{Flock, FlockArg},
};

use crate::{
    error::{Result, ShmLogError},
    ring::{CursorHeader, CursorPolicy, CursorProtocol, RingBufferView, SlotExtractor, Span},
};

use super::config::SegmentConfig;

/// A mapped shared segment owned by another process.
///
/// The producer owns the segment's lifetime; this handle only maps the
/// backing file. Access to the mapped bytes goes through [`with_lock`],
/// which holds an exclusive `flock` on the backing file for the duration of
/// the call.
///
/// [`with_lock`]: RingBufferHandle::with_lock
#[derive(Debug)]
pub struct RingBufferHandle {
    config: SegmentConfig,
    path: PathBuf,
    /// Memory-mapped segment
    mmap: MmapMut,
    /// Backing file, also the lock target
    file: File,
}

impl RingBufferHandle {
    /// Map an existing named segment
    pub fn attach(config: SegmentConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ShmLogError::attach(&config.name, e.to_string(), None))?;

        let path = config.file_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                let message = match e.kind() {
                    ErrorKind::NotFound => format!("no segment at {}", path.display()),
                    ErrorKind::PermissionDenied => {
                        format!("permission denied on {}", path.display())
                    }
                    _ => format!("cannot open {}", path.display()),
                };
                ShmLogError::attach(&config.name, message, Some(e))
            })?;

        let actual = file
            .metadata()
            .map_err(|e| ShmLogError::attach(&config.name, "cannot stat segment", Some(e)))?
            .len();
        if actual < config.size as u64 {
            return Err(ShmLogError::attach(
                &config.name,
                format!(
                    "segment is {} bytes, expected at least {}",
                    actual, config.size
                ),
                None,
            ));
        }

        let mmap = unsafe {
            MmapOptions::new()
                .len(config.size)
                .map_mut(&file)
                .map_err(|e| {
                    ShmLogError::attach(&config.name, "failed to map segment", Some(e))
                })?
        };

        if config.trailing_bytes() > 0 {
            log::warn!(
                "Log area of segment {} is not a multiple of {}-byte slots; last {} bytes are never drained",
                config.name,
                config.slot_size,
                config.trailing_bytes()
            );
        }

        log::info!(
            "Attached segment {} at {} ({} bytes, {} slots of {} bytes)",
            config.name,
            path.display(),
            config.size,
            config.slot_count(),
            config.slot_size
        );

        Ok(Self {
            config,
            path,
            mmap,
            file,
        })
    }

    /// Run `f` with exclusive access to the segment bytes.
    ///
    /// The lock is taken without blocking; a contended or failing lock is
    /// reported as [`ShmLogError::Lock`] and `f` is not called. The lock is
    /// released when this returns, whatever `f` did.
    pub fn with_lock<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let lock_fd = self
            .file
            .try_clone()
            .map_err(|e| ShmLogError::lock(&self.config.name, format!("cannot dup fd: {}", e)))?;

        let _guard = Flock::lock(lock_fd, FlockArg::LockExclusiveNonblock).map_err(
            |(_, errno)| {
                let message = if errno == Errno::EWOULDBLOCK {
                    "held by another process".to_string()
                } else {
                    format!("flock failed: {}", errno)
                };
                ShmLogError::lock(&self.config.name, message)
            },
        )?;

        Ok(f(&mut self.mmap[..]))
    }

    /// Read the header and pending spans without moving the reader cursor
    pub fn inspect(&mut self) -> Result<SegmentSnapshot> {
        let log_area_size = self.config.log_area_size();
        let slot_size = self.config.slot_size;
        let protocol = CursorProtocol::new(log_area_size, slot_size, CursorPolicy::BestEffort)?;
        let extractor = SlotExtractor::new(slot_size)?;

        self.with_lock(|bytes| -> Result<SegmentSnapshot> {
            let view = RingBufferView::new(bytes, log_area_size, slot_size)?;
            let header = view.header()?;
            let drain = view.peek(&protocol, &extractor)?;
            Ok(SegmentSnapshot {
                header,
                log_area_size,
                pending_bytes: drain.pending_bytes(),
                pending_slots: drain.extraction.texts.len(),
                spans: drain.spans,
            })
        })?
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.config.size
    }
}

/// Point-in-time view of a segment's header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSnapshot {
    pub header: CursorHeader,
    pub log_area_size: usize,
    /// Bytes between the cursors
    pub pending_bytes: usize,
    /// Occupied slots waiting to be drained
    pub pending_slots: usize,
    pub spans: Vec<Span>,
}
