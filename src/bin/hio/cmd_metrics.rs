use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use hio::inspect::{list_entries, list_records};
use hio::metrics::{self, MetricsSnapshot};

use crate::util::print_json;

#[derive(Serialize)]
struct Report {
    entries: usize,
    records: usize,
    metrics: MetricsSnapshot,
}

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    metrics::reset();
    let entries = list_entries(&path)?.len();
    let records = list_records(&path)?.len();
    let m = metrics::snapshot();

    if json {
        return print_json(&Report {
            entries,
            records,
            metrics: m,
        });
    }

    println!("hio metrics ({} entries, {} records)", entries, records);
    println!("  records_read  = {}", m.records_read);
    println!("  bytes_read    = {}", m.bytes_read);
    println!("  records_written = {}", m.records_written);
    println!("  bytes_written = {}", m.bytes_written);
    println!("  fsync_calls   = {}", m.fsync_calls);
    println!("  slot_patches  = {}", m.slot_patches);
    println!("  lazy_loads    = {}", m.lazy_loads);
    println!(
        "  table rows    = written {}, read {}, skipped frames {} (skip ratio {:.2})",
        m.table_rows_written,
        m.table_rows_read,
        m.table_frames_skipped,
        m.table_skip_ratio()
    );
    Ok(())
}
