//! Lightweight global metrics for hio.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - record stream (frames written/read, bytes, fsync)
//! - container (slot backpatches, lazy loads)
//! - tables (rows written/read, interleaved frames skipped)

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Record stream -----
static RECORDS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static RECORDS_READ: AtomicU64 = AtomicU64::new(0);
static BYTES_READ: AtomicU64 = AtomicU64::new(0);
static FSYNC_CALLS: AtomicU64 = AtomicU64::new(0);

// ----- Container -----
static SLOT_PATCHES: AtomicU64 = AtomicU64::new(0);
static LAZY_LOADS: AtomicU64 = AtomicU64::new(0);

// ----- Tables -----
static TABLE_ROWS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static TABLE_ROWS_READ: AtomicU64 = AtomicU64::new(0);
static TABLE_FRAMES_SKIPPED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub records_read: u64,
    pub bytes_read: u64,
    pub fsync_calls: u64,

    pub slot_patches: u64,
    pub lazy_loads: u64,

    pub table_rows_written: u64,
    pub table_rows_read: u64,
    pub table_frames_skipped: u64,
}

impl MetricsSnapshot {
    /// Share of frames a table scan had to skip (other tables' rows, values).
    pub fn table_skip_ratio(&self) -> f64 {
        let total = self.table_rows_read + self.table_frames_skipped;
        if total == 0 {
            0.0
        } else {
            self.table_frames_skipped as f64 / total as f64
        }
    }
}

// ----- Recorders (record stream) -----
pub fn record_write(frame_len: u64) {
    RECORDS_WRITTEN.fetch_add(1, Ordering::Relaxed);
    BYTES_WRITTEN.fetch_add(frame_len, Ordering::Relaxed);
}

pub fn record_read(frame_len: u64) {
    RECORDS_READ.fetch_add(1, Ordering::Relaxed);
    BYTES_READ.fetch_add(frame_len, Ordering::Relaxed);
}

pub fn record_fsync() {
    FSYNC_CALLS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (container) -----
pub fn record_slot_patch() {
    SLOT_PATCHES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_lazy_load() {
    LAZY_LOADS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (tables) -----
pub fn record_table_row_written() {
    TABLE_ROWS_WRITTEN.fetch_add(1, Ordering::Relaxed);
}

pub fn record_table_row_read() {
    TABLE_ROWS_READ.fetch_add(1, Ordering::Relaxed);
}

pub fn record_table_frame_skipped() {
    TABLE_FRAMES_SKIPPED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        records_written: RECORDS_WRITTEN.load(Ordering::Relaxed),
        bytes_written: BYTES_WRITTEN.load(Ordering::Relaxed),
        records_read: RECORDS_READ.load(Ordering::Relaxed),
        bytes_read: BYTES_READ.load(Ordering::Relaxed),
        fsync_calls: FSYNC_CALLS.load(Ordering::Relaxed),

        slot_patches: SLOT_PATCHES.load(Ordering::Relaxed),
        lazy_loads: LAZY_LOADS.load(Ordering::Relaxed),

        table_rows_written: TABLE_ROWS_WRITTEN.load(Ordering::Relaxed),
        table_rows_read: TABLE_ROWS_READ.load(Ordering::Relaxed),
        table_frames_skipped: TABLE_FRAMES_SKIPPED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    for c in [
        &RECORDS_WRITTEN,
        &BYTES_WRITTEN,
        &RECORDS_READ,
        &BYTES_READ,
        &FSYNC_CALLS,
        &SLOT_PATCHES,
        &LAZY_LOADS,
        &TABLE_ROWS_WRITTEN,
        &TABLE_ROWS_READ,
        &TABLE_FRAMES_SKIPPED,
    ] {
        c.store(0, Ordering::Relaxed);
    }
}
