//! Table - append-only sequence of rows stored as records named after the
//! table, interleaved with anything else in the file.
//!
//! - Writable table: shares the container's stream, appends at its cursor.
//! - Readable table (from `File::get_table`): owns a secondary stream on the
//!   same path, positioned right after its `header/<name>` record, and scans
//!   forward picking only frames with its own name.
//!
//! Строки не индексируются: чтение таблицы - последовательный скан файла.

use anyhow::{anyhow, Context, Result};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use crate::consts::{TABLE_HEADER_PREFIX, TABLE_VERSION};
use crate::error::{HioError, RioError};
use crate::metrics::{record_table_frame_skipped, record_table_row_read, record_table_row_written};
use crate::rio::{Record, Stream};
use crate::util::{lock, read_str16, write_str16};

/// Record name of the header of table `table`.
pub fn header_record_name(table: &str) -> String {
    format!("{}{}", TABLE_HEADER_PREFIX, table)
}

/// Payload of `header/<name>`: [name_len u16][name][version u32][entries i64].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub name: String,
    pub version: u32,
    pub entries: i64,
}

impl TableHeader {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: TABLE_VERSION,
            entries: 0,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(2 + self.name.len() + 12);
        write_str16(&mut out, &self.name, "table header")?;
        out.write_u32::<LittleEndian>(self.version)?;
        out.write_i64::<LittleEndian>(self.entries)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let (name, off) = read_str16(buf, 0, "table header")?;
        if buf.len() != off + 12 {
            return Err(anyhow!(
                "table header [{}]: expected {} bytes, got {}",
                name,
                off + 12,
                buf.len()
            ));
        }
        let version = LittleEndian::read_u32(&buf[off..off + 4]);
        let entries = LittleEndian::read_i64(&buf[off + 4..off + 12]);
        Ok(Self {
            name,
            version,
            entries,
        })
    }
}

pub struct Table {
    name: String,
    hdr: Arc<Mutex<TableHeader>>,
    stream: Option<Arc<Mutex<Stream>>>,
    rec: Option<Record>,
    owns_stream: bool,
}

fn connect_record(s: &Stream, name: &str) -> Result<Record> {
    let mut rec = s.record(name);
    match rec.connect(name) {
        Ok(()) | Err(RioError::BlockConnected { .. }) => Ok(rec),
        Err(e) => Err(HioError::encode(name, e).into()),
    }
}

impl Table {
    /// Table appending to the container's own stream.
    pub(crate) fn writer(hdr: Arc<Mutex<TableHeader>>, stream: Arc<Mutex<Stream>>) -> Result<Self> {
        let name = lock(&hdr, "table header")?.name.clone();
        Ok(Self {
            name,
            hdr,
            stream: Some(stream),
            rec: None,
            owns_stream: false,
        })
    }

    /// Table scanning a private stream; the stream is closed with the table.
    pub(crate) fn reader(hdr: Arc<Mutex<TableHeader>>, stream: Stream) -> Result<Self> {
        let name = lock(&hdr, "table header")?.name.clone();
        debug!("table [{}]: reader at pos {}", name, stream.pos());
        Ok(Self {
            name,
            hdr,
            stream: Some(Arc::new(Mutex::new(stream))),
            rec: None,
            owns_stream: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        match self.hdr.lock() {
            Ok(h) => h.version,
            Err(p) => p.into_inner().version,
        }
    }

    /// Rows written so far (writer) or recorded in the file (reader).
    pub fn entries(&self) -> i64 {
        match self.hdr.lock() {
            Ok(h) => h.entries,
            Err(p) => p.into_inner().entries,
        }
    }

    fn stream(&self) -> Result<&Arc<Mutex<Stream>>> {
        self.stream
            .as_ref()
            .ok_or_else(|| anyhow!("table [{}] is closed", self.name))
    }

    /// Append one row at the stream cursor.
    pub fn write<T: Serialize + ?Sized>(&mut self, row: &T) -> Result<()> {
        let stream = Arc::clone(self.stream()?);
        let mut s = lock(&stream, "stream")?;
        let rec = match self.rec.take() {
            Some(rec) => rec,
            None => connect_record(&s, &self.name)?,
        };
        let res = s.write_record(&rec, row);
        self.rec = Some(rec);
        res.with_context(|| format!("table [{}]: write row", self.name))?;
        drop(s);

        lock(&self.hdr, "table header")?.entries += 1;
        record_table_row_written();
        Ok(())
    }

    /// Next row of this table. After the last row: `HioError::EndOfTable`.
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<T> {
        let stream = Arc::clone(self.stream()?);
        let mut s = lock(&stream, "stream")?;
        let mut rec = self.rec.take().unwrap_or_else(|| s.record(&self.name));
        rec.set_unpack(true);
        let res = next_row(&mut s, &rec);
        self.rec = Some(rec);
        res
    }

    pub fn read_into<T: DeserializeOwned>(&mut self, out: &mut T) -> Result<()> {
        *out = self.read()?;
        Ok(())
    }

    /// Iterate over the remaining rows; stops cleanly at the end of table.
    pub fn rows<T: DeserializeOwned>(&mut self) -> Rows<'_, T> {
        Rows {
            table: self,
            done: false,
            _row: PhantomData,
        }
    }

    /// Sync the bound stream and release the secondary handle if owned.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        let mut s = lock(&stream, "stream")?;
        // общий поток контейнера уже закрыт - нечего синхронизировать
        if s.is_closed() {
            return Ok(());
        }
        s.sync()
            .with_context(|| format!("table [{}]: sync", self.name))?;
        if self.owns_stream {
            s.close()
                .with_context(|| format!("table [{}]: close", self.name))?;
        }
        debug!("table [{}]: closed ({} rows)", self.name, self.entries());
        Ok(())
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("table [{}]: release on drop failed: {:#}", self.name, e);
        }
    }
}

fn next_row<T: DeserializeOwned>(s: &mut Stream, rec: &Record) -> Result<T> {
    loop {
        let Some(frame) = s.read_record()? else {
            return Err(HioError::EndOfTable {
                name: rec.name().to_string(),
            }
            .into());
        };
        match rec.unpack_frame::<T>(&frame)? {
            Some(row) => {
                record_table_row_read();
                return Ok(row);
            }
            None => record_table_frame_skipped(),
        }
    }
}

/// Iterator returned by [`Table::rows`].
pub struct Rows<'a, T> {
    table: &'a mut Table,
    done: bool,
    _row: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Iterator for Rows<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.table.read::<T>() {
            Ok(row) => Some(Ok(row)),
            Err(e) if crate::error::is_end_of_table(&e) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
