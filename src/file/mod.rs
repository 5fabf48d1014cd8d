//! file - контейнер hio (File): именованные значения + таблицы в одном файле.
//!
//! Разделение по подмодулям:
//! - mod.rs    - структура File, аксессоры, общие помощники, Drop
//! - open.rs   - open/create (+ _with_config), чтение header/footer
//! - kv.rs     - get/get_into/set/del/has/keys, ленивая загрузка значений
//! - tables.rs - new_table/get_table
//! - close.rs  - финализация: backpatch заголовков таблиц и FileHeader, запись footer
//!
//! Layout on disk:
//! [hio.FileHeader][values, header/<table>, table rows ... interleaved][hio.FileFooter]

use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::HioConfig;
use crate::consts::{FILE_FOOTER_RECORD, FILE_HEADER_RECORD, TABLE_HEADER_PREFIX};
use crate::dict::Dictionary;
use crate::error::HioError;
use crate::footer::{FileEntry, FileFooter};
use crate::header::FileHeader;
use crate::omap::OrderedMap;
use crate::rio::{Mode, Slot, Stream};
use crate::table::TableHeader;

pub mod close;
pub mod kv;
pub mod open;
pub mod tables;

/// Reserved `header/<table>` slot of a table created in write mode.
struct TableSlot {
    slot: Slot,
    header: Arc<Mutex<TableHeader>>,
}

pub struct File {
    path: PathBuf,
    cfg: HioConfig,
    mode: Mode,
    stream: Arc<Mutex<Stream>>,

    header: FileHeader,
    // write mode: reserved at offset 0, patched on close
    header_slot: Option<Slot>,
    footer: FileFooter,
    // start of the payload area (right after the file header)
    begin: u64,

    dict: Dictionary,
    // values set since create, serialized on close in this order
    pending: OrderedMap<()>,
    tables: OrderedMap<TableSlot>,

    closed: bool,
}

impl File {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &HioConfig {
        &self.cfg
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Footer index as read at open (empty for a file being written).
    pub fn entries(&self) -> &[FileEntry] {
        &self.footer.entries
    }

    /// Offset of the first record after the file header.
    pub fn begin(&self) -> u64 {
        self.begin
    }

    /// Physical records read through the container's own stream.
    pub fn records_read(&self) -> u64 {
        match self.stream.lock() {
            Ok(s) => s.records_read(),
            Err(p) => p.into_inner().records_read(),
        }
    }

    /// Flush (and fsync, if configured) the container's stream.
    pub fn sync(&self) -> Result<()> {
        crate::util::lock(&self.stream, "stream")?.sync()
    }

    fn require_write(&self, op: &'static str, name: &str) -> Result<()> {
        if self.mode != Mode::Write {
            return Err(HioError::ReadOnly {
                op,
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Names of format records cannot be used for values or tables: a table
/// scan would take those frames for rows.
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name == FILE_HEADER_RECORD || name == FILE_FOOTER_RECORD || name.starts_with(TABLE_HEADER_PREFIX) {
        return Err(HioError::encode(name, "name is reserved for format records").into());
    }
    Ok(())
}

pub(crate) fn type_mismatch(name: &str, expected: &str, found: &str) -> anyhow::Error {
    HioError::TypeMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
    .into()
}

impl Drop for File {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.finalize() {
            warn!("hio: finalize {} on drop failed: {:#}", self.path.display(), e);
        }
    }
}
