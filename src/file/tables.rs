//! file/tables - new_table / get_table.

use anyhow::{Context, Result};
use log::debug;
use std::io::SeekFrom;
use std::sync::{Arc, Mutex};

use super::{check_name, type_mismatch, File, TableSlot};
use crate::dict::{Entry, TableState};
use crate::error::HioError;
use crate::metrics::record_lazy_load;
use crate::rio::{Mode, Stream};
use crate::table::{header_record_name, Table, TableHeader};
use crate::util::lock;

impl File {
    /// Declare a table: its header record is reserved now at the cursor and
    /// patched with the final row count on close.
    pub fn new_table(&mut self, name: &str) -> Result<Table> {
        self.require_write("new_table", name)?;
        check_name(name)?;

        let hdr = TableHeader::new(name);
        let rec_name = header_record_name(name);
        let bytes = hdr
            .encode()
            .map_err(|e| HioError::encode(&rec_name, format!("{:#}", e)))?;
        let slot = lock(&self.stream, "stream")?.reserve(&rec_name, &bytes)?;
        let rows_from = slot.pos + slot.len;

        let header = Arc::new(Mutex::new(hdr));
        self.pending.remove(name);
        self.tables.insert(
            name,
            TableSlot {
                slot,
                header: Arc::clone(&header),
            },
        );
        self.dict.put(
            name,
            Entry::Table(TableState {
                header: Arc::clone(&header),
                rows_from,
            }),
        );
        debug!("hio: new table [{}], rows from {}", name, rows_from);

        Table::writer(header, Arc::clone(&self.stream))
    }

    /// Table `name` for reading, on its own stream so its cursor is
    /// independent of the container's and of other tables'.
    pub fn get_table(&mut self, name: &str) -> Result<Table> {
        let state = match self.dict.get(name)? {
            Entry::Table(t) => t.clone(),
            Entry::Value(p) => return Err(type_mismatch(name, "table", p.type_name())),
            Entry::Unresolved => {
                let frame = self.load_frame(name)?;
                if frame.name != header_record_name(name) {
                    return Err(type_mismatch(name, "table", "value"));
                }
                let hdr = TableHeader::decode(&frame.payload()?)
                    .map_err(|e| HioError::decode(&frame.name, format!("{:#}", e)))?;
                let st = TableState {
                    header: Arc::new(Mutex::new(hdr)),
                    rows_from: frame.end(),
                };
                self.dict.put(name, Entry::Table(st.clone()));
                record_lazy_load();
                debug!("hio: loaded table header [{}] from {}", name, frame.pos);
                st
            }
        };

        // строки, ещё лежащие в буфере writer'а, должны быть видны читателю
        if self.mode == Mode::Write {
            lock(&self.stream, "stream")?.flush()?;
        }
        let mut s = Stream::open(&self.path, &self.cfg)
            .with_context(|| format!("table [{}]: open secondary stream", name))?;
        s.seek(SeekFrom::Start(state.rows_from))?;
        Table::reader(state.header, s)
    }
}
