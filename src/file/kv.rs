//! file/kv - значения: get/get_into/set/del/has/keys.
//!
//! Unresolved entries (from the footer) are loaded on first get: scoped seek
//! to the footer position, one record read, cursor restored. The decoded value
//! is cached, so later gets never touch the disk.

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::any::type_name;

use super::{check_name, type_mismatch, File};
use crate::dict::Entry;
use crate::error::HioError;
use crate::metrics::record_lazy_load;
use crate::rio::Frame;
use crate::table::header_record_name;
use crate::util::lock;
use crate::value::{boxed, decode_stored, downcast, Value};

impl File {
    pub fn has(&self, name: &str) -> bool {
        self.dict.has(name)
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All names, lexicographically sorted.
    pub fn keys(&self) -> Vec<String> {
        self.dict.keys()
    }

    /// True once `name` is held in memory (set, or loaded by a get).
    pub fn is_resolved(&self, name: &str) -> bool {
        self.dict.is_resolved(name)
    }

    /// Value stored under `name`.
    pub fn get<T: Value>(&mut self, name: &str) -> Result<T> {
        match self.dict.get(name)? {
            Entry::Value(p) => return downcast(name, &**p),
            Entry::Table(_) => return Err(type_mismatch(name, type_name::<T>(), "table")),
            Entry::Unresolved => {}
        }

        let frame = self.load_frame(name)?;
        if frame.name != name {
            return Err(type_mismatch(name, type_name::<T>(), "table"));
        }
        // при несовпадении типа словарь не трогаем
        let v: T = decode_stored(name, &frame.payload()?)?;
        self.dict.put(name, Entry::Value(boxed(v.clone())));
        record_lazy_load();
        debug!("hio: loaded [{}] from {} ({} bytes)", name, frame.pos, frame.len);
        Ok(v)
    }

    /// Same as `get`, assigning into `out`.
    pub fn get_into<T: Value>(&mut self, name: &str, out: &mut T) -> Result<()> {
        *out = self.get(name)?;
        Ok(())
    }

    /// Insert or overwrite a value; written to disk on close.
    pub fn set<T: Value>(&mut self, name: &str, v: T) -> Result<()> {
        self.require_write("set", name)?;
        check_name(name)?;
        if self.tables.remove(name).is_some() {
            debug!("hio: set [{}] replaces a table, its header slot is dropped", name);
        }
        self.dict.put(name, Entry::Value(boxed(v)));
        self.pending.insert(name, ());
        Ok(())
    }

    pub fn del(&mut self, name: &str) -> Result<()> {
        self.require_write("del", name)?;
        self.dict.del(name)?;
        self.pending.remove(name);
        self.tables.remove(name);
        Ok(())
    }

    /// Read the record the footer indexes for `name`, restoring the cursor.
    /// The frame is either `name` (value) or `header/<name>` (table).
    pub(super) fn load_frame(&self, name: &str) -> Result<Frame> {
        let entry = self
            .footer
            .find(name)
            .ok_or_else(|| anyhow!("[{}] has no position in the footer", name))?;
        let pos = u64::try_from(entry.pos)
            .map_err(|_| HioError::decode(name, format!("negative position {}", entry.pos)))?;

        let mut s = lock(&self.stream, "stream")?;
        let frame = s
            .at(pos, |s| s.read_record())
            .with_context(|| format!("load [{}] at {} in {}", name, pos, self.path.display()))?
            .ok_or_else(|| HioError::decode(name, format!("no record at {}", pos)))?;

        if frame.name != name && frame.name != header_record_name(name) {
            return Err(HioError::decode(
                name,
                format!("footer points at record [{}] ({} at {})", frame.name, frame.len, pos),
            )
            .into());
        }
        Ok(frame)
    }
}
