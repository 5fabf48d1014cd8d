//! rio - record stream: named, CRC-framed binary records in one file.
//!
//! Разделение:
//! - encode.rs - кодирование/запись кадров (заголовок + CRC + имя + payload).
//! - reader.rs - последовательное чтение кадров с проверкой CRC.
//! - record.rs - дескриптор Record (connect/unpack) и прочитанный Frame.
//! - codec.rs  - bincode для типизированных payload'ов + gzip/zstd сжатие.
//!
//! В этом модуле (mod.rs) лежит сам Stream: open/create, запись/чтение
//! кадров, seek/pos, sync/close, а также двухфазная запись слота
//! (reserve -> patch) для записей, содержимое которых известно только позже.

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::HioConfig;
use crate::consts::CODEC_NONE;
use crate::error::{HioError, RioError};
use crate::metrics::{record_fsync, record_read, record_slot_patch, record_write};

pub mod codec;
pub mod encode;
pub mod reader;
pub mod record;

pub use codec::Compression;
pub use record::{Frame, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// A reserved frame: written once with provisional content, patched in place
/// later with content of exactly the same encoded length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub pos: u64,
    pub len: u64,
}

enum Handle {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

pub struct Stream {
    path: PathBuf,
    mode: Mode,
    handle: Option<Handle>,
    pos: u64,
    // reader: file length at open; writer: high-water mark
    end: u64,
    compression: Compression,
    fsync: bool,
    records_read: u64,
    records_written: u64,
}

fn reader_of<'a>(handle: &'a mut Option<Handle>, path: &Path) -> Result<&'a mut BufReader<File>> {
    match handle.as_mut() {
        Some(Handle::Reader(r)) => Ok(r),
        Some(Handle::Writer(_)) => Err(RioError::WrongMode {
            path: path.display().to_string(),
            op: "reading",
        }
        .into()),
        None => Err(RioError::Closed {
            path: path.display().to_string(),
        }
        .into()),
    }
}

fn writer_of<'a>(handle: &'a mut Option<Handle>, path: &Path) -> Result<&'a mut BufWriter<File>> {
    match handle.as_mut() {
        Some(Handle::Writer(w)) => Ok(w),
        Some(Handle::Reader(_)) => Err(RioError::WrongMode {
            path: path.display().to_string(),
            op: "writing",
        }
        .into()),
        None => Err(RioError::Closed {
            path: path.display().to_string(),
        }
        .into()),
    }
}

impl Stream {
    /// Create (truncate) `path` for writing.
    pub fn create(path: &Path, cfg: &HioConfig) -> Result<Self> {
        let f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("create {}", path.display()))?;
        debug!("rio: create {} ({})", path.display(), cfg);
        Ok(Self {
            path: path.to_path_buf(),
            mode: Mode::Write,
            handle: Some(Handle::Writer(BufWriter::with_capacity(cfg.buffer_size, f))),
            pos: 0,
            end: 0,
            compression: cfg.compression,
            fsync: cfg.fsync,
            records_read: 0,
            records_written: 0,
        })
    }

    /// Open `path` for sequential reading from offset 0.
    pub fn open(path: &Path, cfg: &HioConfig) -> Result<Self> {
        let f = OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("open {}", path.display()))?;
        let len = f
            .metadata()
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        debug!("rio: open {} (len={})", path.display(), len);
        Ok(Self {
            path: path.to_path_buf(),
            mode: Mode::Read,
            handle: Some(Handle::Reader(BufReader::with_capacity(cfg.buffer_size, f))),
            pos: 0,
            end: len,
            compression: cfg.compression,
            fsync: cfg.fsync,
            records_read: 0,
            records_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current absolute cursor.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Reader: file length seen at open. Writer: bytes written so far.
    pub fn len(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Named record descriptor for this stream.
    pub fn record(&self, name: &str) -> Record {
        Record::new(name)
    }

    // ---------------- write path ----------------

    fn write_raw(&mut self, name: &str, flags: u16, payload: &[u8]) -> Result<(u64, u64)> {
        let pos = self.pos;
        let w = writer_of(&mut self.handle, &self.path)?;
        let len = encode::write_frame(w, name, flags, payload).with_context(|| {
            format!("write record [{}] at {} in {}", name, pos, self.path.display())
        })?;
        self.pos += len;
        self.end = self.end.max(self.pos);
        self.records_written += 1;
        record_write(len);
        Ok((pos, len))
    }

    /// Append a frame at the cursor, compressed per the stream config.
    /// Returns (pos, len) of the frame.
    pub fn write_frame(&mut self, name: &str, payload: &[u8]) -> Result<(u64, u64)> {
        match self.compression {
            Compression::None => self.write_raw(name, CODEC_NONE, payload),
            c => {
                let stored = c
                    .compress(payload)
                    .map_err(|e| HioError::encode(name, format!("{c}: {e:#}")))?;
                self.write_raw(name, c.flags(), &stored)
            }
        }
    }

    /// Append a frame that is never compressed (format records).
    pub fn write_plain(&mut self, name: &str, payload: &[u8]) -> Result<(u64, u64)> {
        self.write_raw(name, CODEC_NONE, payload)
    }

    /// Encode `payload` for a connected record and append it.
    pub fn write_record<T: Serialize + ?Sized>(&mut self, rec: &Record, payload: &T) -> Result<(u64, u64)> {
        if !rec.is_connected() {
            return Err(HioError::encode(
                rec.name(),
                RioError::NotConnected {
                    record: rec.name().to_string(),
                },
            )
            .into());
        }
        let bytes = codec::encode_value(rec.name(), payload)?;
        self.write_frame(rec.name(), &bytes)
    }

    /// Phase 1: write `payload` now and remember where it went.
    pub fn reserve(&mut self, name: &str, payload: &[u8]) -> Result<Slot> {
        let (pos, len) = self.write_plain(name, payload)?;
        debug!("rio: reserved [{}] at {} ({} bytes)", name, pos, len);
        Ok(Slot {
            name: name.to_string(),
            pos,
            len,
        })
    }

    /// Phase 2: overwrite a reserved slot in place. The new frame must have
    /// exactly the reserved length; the cursor is restored afterwards.
    pub fn patch(&mut self, slot: &Slot, payload: &[u8]) -> Result<()> {
        let want = encode::frame_len(&slot.name, payload.len());
        if want != slot.len {
            return Err(HioError::encode(
                &slot.name,
                format!(
                    "patch would change record size at {} ({} -> {} bytes)",
                    slot.pos, slot.len, want
                ),
            )
            .into());
        }
        self.at(slot.pos, |s| s.write_plain(&slot.name, payload).map(|_| ()))?;
        record_slot_patch();
        debug!("rio: patched [{}] at {}", slot.name, slot.pos);
        Ok(())
    }

    // ---------------- read path ----------------

    /// Read the next physical frame. Ok(None) at the end of the stream.
    pub fn read_record(&mut self) -> Result<Option<Frame>> {
        let pos = self.pos;
        let r = reader_of(&mut self.handle, &self.path)?;
        let next = reader::read_next_frame(r, pos, self.end)
            .with_context(|| format!("read record at {} in {}", pos, self.path.display()))?;
        match next {
            Some((frame, next_pos)) => {
                self.pos = next_pos;
                self.records_read += 1;
                record_read(frame.len);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    // ---------------- positioning ----------------

    pub fn seek(&mut self, to: SeekFrom) -> Result<u64> {
        let res = match self.handle.as_mut() {
            Some(Handle::Reader(r)) => r.seek(to),
            Some(Handle::Writer(w)) => w.seek(to),
            None => {
                return Err(RioError::Closed {
                    path: self.path.display().to_string(),
                }
                .into())
            }
        };
        let pos = res.with_context(|| format!("seek {:?} in {}", to, self.path.display()))?;
        self.pos = pos;
        Ok(pos)
    }

    /// Run `f` with the cursor at `pos`, then restore the previous cursor,
    /// also when `f` fails.
    pub fn at<R>(&mut self, pos: u64, f: impl FnOnce(&mut Stream) -> Result<R>) -> Result<R> {
        let saved = self.pos;
        self.seek(SeekFrom::Start(pos))?;
        let out = f(self);
        let restored = self.seek(SeekFrom::Start(saved));
        let out = out?;
        restored?;
        Ok(out)
    }

    // ---------------- durability ----------------

    pub fn flush(&mut self) -> Result<()> {
        match self.handle.as_mut() {
            Some(Handle::Writer(w)) => w
                .flush()
                .with_context(|| format!("flush {}", self.path.display())),
            Some(Handle::Reader(_)) => Ok(()),
            None => Err(RioError::Closed {
                path: self.path.display().to_string(),
            }
            .into()),
        }
    }

    /// Flush buffered frames and, if configured, fsync the file.
    pub fn sync(&mut self) -> Result<()> {
        self.flush()?;
        if let Some(Handle::Writer(w)) = self.handle.as_mut() {
            if self.fsync {
                w.get_ref()
                    .sync_all()
                    .with_context(|| format!("fsync {}", self.path.display()))?;
                record_fsync();
            }
        }
        Ok(())
    }

    /// Release the file handle. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(Handle::Writer(w)) => {
                w.into_inner()
                    .map_err(|e| anyhow!("flush {} on close: {}", self.path.display(), e.error()))?;
                debug!("rio: closed {} (writer, {} records)", self.path.display(), self.records_written);
            }
            Some(Handle::Reader(_)) => {
                debug!("rio: closed {} (reader, {} records)", self.path.display(), self.records_read);
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_ID: AtomicU64 = AtomicU64::new(1);

    fn unique_path(prefix: &str) -> PathBuf {
        let pid = std::process::id();
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("hio-rio-{prefix}-{pid}-{id}.hio"))
    }

    fn cfg() -> HioConfig {
        HioConfig::default().with_fsync(false)
    }

    #[test]
    fn write_then_read_records() -> Result<()> {
        let path = unique_path("rw");
        {
            let mut w = Stream::create(&path, &cfg())?;
            let mut rec = w.record("n");
            rec.connect("n").unwrap();
            let (p0, l0) = w.write_record(&rec, &42i64)?;
            assert_eq!(p0, 0);
            let (p1, _) = w.write_record(&rec, &43i64)?;
            assert_eq!(p1, l0);
            assert_eq!(w.records_written(), 2);
            w.sync()?;
            w.close()?;
            w.close()?; // no-op
        }

        let mut r = Stream::open(&path, &cfg())?;
        let mut rec = r.record("n");
        rec.set_unpack(true);
        let f0 = r.read_record()?.expect("first");
        assert_eq!(rec.unpack_frame::<i64>(&f0)?, Some(42));
        let f1 = r.read_record()?.expect("second");
        assert_eq!(f1.decode::<i64>()?, 43);
        assert!(r.read_record()?.is_none());
        assert_eq!(r.records_read(), 2);

        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn unconnected_record_cannot_be_written() -> Result<()> {
        let path = unique_path("unconnected");
        let mut w = Stream::create(&path, &cfg())?;
        let rec = w.record("x");
        let err = w.write_record(&rec, &1u8).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HioError>(),
            Some(HioError::Encode { .. })
        ));
        w.close()?;
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn reserve_and_patch_in_place() -> Result<()> {
        let path = unique_path("patch");
        {
            let mut w = Stream::create(&path, &cfg())?;
            let slot = w.reserve("slot", &0u64.to_le_bytes())?;
            w.write_plain("tail", b"after")?;
            let before = w.pos();

            w.patch(&slot, &7u64.to_le_bytes())?;
            assert_eq!(w.pos(), before, "cursor restored after patch");

            // different size must be refused
            assert!(w.patch(&slot, &[1, 2, 3]).is_err());
            assert_eq!(w.pos(), before);
            w.close()?;
        }

        let mut r = Stream::open(&path, &cfg())?;
        let f = r.read_record()?.expect("slot frame");
        assert_eq!(f.name, "slot");
        assert_eq!(f.stored_payload(), &7u64.to_le_bytes());
        let tail = r.read_record()?.expect("tail frame");
        assert_eq!(tail.stored_payload(), b"after");

        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn at_restores_cursor_on_error() -> Result<()> {
        let path = unique_path("at");
        {
            let mut w = Stream::create(&path, &cfg())?;
            w.write_plain("a", b"1")?;
            w.write_plain("b", b"2")?;
            w.close()?;
        }
        let mut r = Stream::open(&path, &cfg())?;
        let first = r.read_record()?.expect("a");
        let here = r.pos();
        let res: Result<()> = r.at(0, |_| Err(anyhow!("boom")));
        assert!(res.is_err());
        assert_eq!(r.pos(), here);
        let again = r.at(0, |s| s.read_record())?.expect("a again");
        assert_eq!(again.name, first.name);
        assert_eq!(r.read_record()?.expect("b").name, "b");

        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn compressed_frames_decode_transparently() -> Result<()> {
        let path = unique_path("zstd");
        let cfg = cfg().with_compression(Compression::Zstd { level: 3 });
        let rows: Vec<u64> = (0..512).collect();
        {
            let mut w = Stream::create(&path, &cfg)?;
            let mut rec = w.record("rows");
            rec.connect("rows").unwrap();
            w.write_record(&rec, &rows)?;
            w.write_plain("plain", b"raw")?;
            w.close()?;
        }
        let mut r = Stream::open(&path, &cfg)?;
        let f = r.read_record()?.expect("rows");
        assert_eq!(f.codec(), "zstd");
        assert_eq!(f.decode::<Vec<u64>>()?, rows);
        let p = r.read_record()?.expect("plain");
        assert_eq!(p.codec(), "none");

        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn wrong_mode_is_reported() -> Result<()> {
        let path = unique_path("mode");
        let mut w = Stream::create(&path, &cfg())?;
        let err = w.read_record().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RioError>(),
            Some(RioError::WrongMode { .. })
        ));
        w.close()?;
        assert!(matches!(
            w.write_plain("x", b"").unwrap_err().downcast_ref::<RioError>(),
            Some(RioError::Closed { .. })
        ));
        let _ = std::fs::remove_file(&path);
        Ok(())
    }
}
