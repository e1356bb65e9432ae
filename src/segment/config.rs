//! Configuration types for attaching to a shared log segment

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::defaults::{HEADER_SIZE, LOG_SIZE, SEGMENT_DIR, SHMEM_SIZE};
use crate::error::{Result, ShmLogError};

/// Configuration for attaching to an existing shared log segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Name of the shared segment
    pub name: String,
    /// Total size of the segment in bytes, header included
    pub size: usize,
    /// Size of each log slot in bytes
    pub slot_size: usize,
    /// Optional explicit path of the backing file
    pub file_path: Option<PathBuf>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: SHMEM_SIZE,
            slot_size: LOG_SIZE,
            file_path: None,
        }
    }
}

impl SegmentConfig {
    /// Create a configuration with the reference sizing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the total segment size
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the slot size
    pub fn with_slot_size(mut self, slot_size: usize) -> Self {
        self.slot_size = slot_size;
        self
    }

    /// Set the backing file path
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Size of the log area that follows the header
    pub fn log_area_size(&self) -> usize {
        self.size.saturating_sub(HEADER_SIZE)
    }

    /// Bytes of the log area covered by whole slots
    pub fn usable_log_area(&self) -> usize {
        if self.slot_size == 0 {
            return 0;
        }
        self.log_area_size() / self.slot_size * self.slot_size
    }

    /// Bytes at the end of the log area too short to hold a slot
    pub fn trailing_bytes(&self) -> usize {
        self.log_area_size() - self.usable_log_area()
    }

    /// Number of whole slots in the log area
    pub fn slot_count(&self) -> usize {
        if self.slot_size == 0 {
            return 0;
        }
        self.log_area_size() / self.slot_size
    }

    /// Path of the backing file, `/dev/shm/<name>` unless set explicitly
    pub fn file_path(&self) -> PathBuf {
        self.file_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SEGMENT_DIR).join(&self.name))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ShmLogError::invalid_parameter(
                "name",
                "Segment name cannot be empty",
            ));
        }

        if self.name.contains('/') || self.name.contains('\0') {
            return Err(ShmLogError::invalid_parameter(
                "name",
                "Segment name cannot contain '/' or NUL",
            ));
        }

        if self.slot_size == 0 {
            return Err(ShmLogError::invalid_parameter(
                "slot_size",
                "Slot size must be greater than 0",
            ));
        }

        if self.size <= HEADER_SIZE {
            return Err(ShmLogError::invalid_parameter(
                "size",
                format!("Segment size must exceed the {}-byte header", HEADER_SIZE),
            ));
        }

        if self.log_area_size() < self.slot_size {
            return Err(ShmLogError::invalid_parameter(
                "size",
                format!(
                    "Log area of {} bytes cannot hold a {}-byte slot",
                    self.log_area_size(),
                    self.slot_size
                ),
            ));
        }

        // Cursors are 32-bit byte offsets into the log area
        if self.log_area_size() > u32::MAX as usize {
            return Err(ShmLogError::invalid_parameter(
                "size",
                "Log area exceeds the 32-bit cursor range",
            ));
        }

        Ok(())
    }
}
