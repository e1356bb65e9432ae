//! Producer-side helpers for building test segments

#![allow(dead_code)]

use std::{
    fs::{File, OpenOptions},
    os::unix::fs::FileExt,
    path::PathBuf,
};

use shmlog::SegmentConfig;
use tempfile::TempDir;

pub const SLOT: usize = 64;
pub const SLOTS: usize = 8;
pub const AREA: usize = SLOT * SLOTS;
pub const SIZE: usize = 8 + AREA;

/// A file-backed segment laid out the way a producer writes it
pub struct TestSegment {
    pub dir: TempDir,
    pub path: PathBuf,
    pub size: usize,
    pub slot_size: usize,
    file: File,
}

impl TestSegment {
    pub fn create() -> Self {
        Self::with_layout(SIZE, SLOT)
    }

    pub fn with_layout(size: usize, slot_size: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_log");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .unwrap();
        file.set_len(size as u64).unwrap();
        Self {
            dir,
            path,
            size,
            slot_size,
            file,
        }
    }

    pub fn config(&self) -> SegmentConfig {
        SegmentConfig::new("test_log")
            .with_size(self.size)
            .with_slot_size(self.slot_size)
            .with_file_path(&self.path)
    }

    pub fn log_area_size(&self) -> usize {
        self.size - 8
    }

    /// Raw write into slot `index` of the log area (NUL padded)
    pub fn write_slot(&self, index: usize, bytes: &[u8]) {
        let mut slot = vec![0u8; self.slot_size];
        let n = bytes.len().min(self.slot_size);
        slot[..n].copy_from_slice(&bytes[..n]);
        self.file
            .write_all_at(&slot, (8 + index * self.slot_size) as u64)
            .unwrap();
    }

    pub fn set_cursors(&self, write_pos: u32, read_pos: u32) {
        let mut header = [0u8; 8];
        header[..4].copy_from_slice(&write_pos.to_ne_bytes());
        header[4..].copy_from_slice(&read_pos.to_ne_bytes());
        self.file.write_all_at(&header, 0).unwrap();
    }

    pub fn set_write_pos(&self, write_pos: u32) {
        self.file.write_all_at(&write_pos.to_ne_bytes(), 0).unwrap();
    }

    pub fn cursors(&self) -> (u32, u32) {
        let mut header = [0u8; 8];
        self.file.read_exact_at(&mut header, 0).unwrap();
        (
            u32::from_ne_bytes([header[0], header[1], header[2], header[3]]),
            u32::from_ne_bytes([header[4], header[5], header[6], header[7]]),
        )
    }

    /// Append texts the way the producer does: one slot each at `write_pos`,
    /// wrapping to the start of the log area, then publish the new `write_pos`
    pub fn push(&self, texts: &[&str]) {
        let slots = self.log_area_size() / self.slot_size;
        let (write_pos, _) = self.cursors();
        let mut index = write_pos as usize / self.slot_size;
        for text in texts {
            let mut bytes = text.as_bytes().to_vec();
            bytes.push(0);
            self.write_slot(index, &bytes);
            index = (index + 1) % slots;
        }
        self.set_write_pos((index * self.slot_size) as u32);
    }
}
