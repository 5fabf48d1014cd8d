//! inspect - read-only diagnostics over a container file (used by the CLI).
//!
//! Works directly on the record stream, so it also describes files that were
//! never closed (status) or whose values have unknown types (ls/records).

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::config::HioConfig;
use crate::footer::FileFooter;
use crate::header::FileHeader;
use crate::rio::Stream;
use crate::table::{header_record_name, TableHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Value,
    Table,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub kind: EntryKind,
    pub pos: i64,
    pub len: i64,
    /// Row count, tables only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordInfo {
    pub name: String,
    pub pos: u64,
    pub len: u64,
    pub codec: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub path: String,
    pub file_size: u64,
    pub version: u32,
    pub finalized: bool,
    pub footer_pos: i64,
    pub entries: usize,
    pub values: usize,
    pub tables: usize,
    pub records: u64,
}

fn open_stream(path: &Path) -> Result<Stream> {
    Stream::open(path, &HioConfig::default())
}

fn read_index(s: &mut Stream) -> Result<(FileHeader, FileFooter)> {
    let header = FileHeader::read_from(s)?;
    if !header.is_finalized() {
        return Err(anyhow!("file was never closed (footer position is 0)"));
    }
    let footer = s.at(header.footer_pos as u64, FileFooter::read_from)?;
    Ok((header, footer))
}

/// Footer entries with their kind, in index order.
pub fn list_entries(path: &Path) -> Result<Vec<EntryInfo>> {
    let mut s = open_stream(path)?;
    let (_, footer) = read_index(&mut s).with_context(|| format!("read index of {}", path.display()))?;

    let mut out = Vec::with_capacity(footer.entries.len());
    for e in &footer.entries {
        let frame = s
            .at(e.pos as u64, |s| s.read_record())?
            .ok_or_else(|| anyhow!("[{}]: no record at {}", e.name, e.pos))?;
        let (kind, rows) = if frame.name == header_record_name(&e.name) {
            let th = TableHeader::decode(&frame.payload()?)?;
            (EntryKind::Table, Some(th.entries))
        } else {
            (EntryKind::Value, None)
        };
        out.push(EntryInfo {
            name: e.name.clone(),
            kind,
            pos: e.pos,
            len: e.len,
            rows,
        });
    }
    Ok(out)
}

/// Every physical record in file order.
pub fn list_records(path: &Path) -> Result<Vec<RecordInfo>> {
    let mut s = open_stream(path)?;
    let mut out = Vec::new();
    while let Some(f) = s.read_record()? {
        out.push(RecordInfo {
            codec: f.codec(),
            name: f.name,
            pos: f.pos,
            len: f.len,
        });
    }
    Ok(out)
}

pub fn status(path: &Path) -> Result<StatusInfo> {
    let mut s = open_stream(path)?;
    let header = FileHeader::read_from(&mut s)?;
    let file_size = s.len();

    let (entries, values, tables) = if header.is_finalized() {
        let list = list_entries(path)?;
        let tables = list.iter().filter(|e| e.kind == EntryKind::Table).count();
        (list.len(), list.len() - tables, tables)
    } else {
        (0, 0, 0)
    };

    let mut records = 1u64;
    while s.read_record()?.is_some() {
        records += 1;
    }

    Ok(StatusInfo {
        path: path.display().to_string(),
        file_size,
        version: header.version,
        finalized: header.is_finalized(),
        footer_pos: header.footer_pos,
        entries,
        values,
        tables,
        records,
    })
}
