//! file/close - финализация контейнера.
//!
//! Write mode, in order:
//! 1) patch every reserved `header/<table>` slot with the final row count;
//! 2) serialize pending values at the cursor (insertion order);
//! 3) footer_pos = cursor; patch the file header at offset 0;
//! 4) write the footer at footer_pos (old entries + new ones);
//! 5) sync + close the stream.
//!
//! `close(self)` consumes the container, so the sequence runs at most once.
//! A failed close leaves the file unreadable (header may already point at a
//! footer that was never written).

use anyhow::{anyhow, Context, Result};
use log::info;
use std::io::SeekFrom;
use std::sync::Arc;

use super::File;
use crate::consts::FILE_FOOTER_RECORD;
use crate::dict::Entry;
use crate::footer::FileEntry;
use crate::rio::Mode;
use crate::util::lock;

impl File {
    /// Finalize and release the file. Any error here means the file must be
    /// considered invalid.
    pub fn close(mut self) -> Result<()> {
        self.finalize()
    }

    pub(super) fn finalize(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        // Drop не повторяет неудачный close
        self.closed = true;

        let stream = Arc::clone(&self.stream);
        let mut s = lock(&stream, "stream")?;

        if self.mode == Mode::Read {
            s.sync()?;
            return s.close();
        }

        let mut appended: Vec<FileEntry> = Vec::with_capacity(self.tables.len() + self.pending.len());

        // 1) table headers
        for (name, ts) in self.tables.iter() {
            let hdr = lock(&ts.header, "table header")?.clone();
            let bytes = hdr.encode()?;
            s.patch(&ts.slot, &bytes)
                .with_context(|| format!("close: patch header of table [{}]", name))?;
            appended.push(FileEntry {
                name: name.to_string(),
                pos: ts.slot.pos as i64,
                len: ts.slot.len as i64,
            });
        }

        // 2) pending values
        for (name, _) in self.pending.iter() {
            let payload = match self.dict.get(name)? {
                Entry::Value(p) => p.encode(name)?,
                _ => return Err(anyhow!("close: pending entry [{}] is not a value", name)),
            };
            let (pos, len) = s
                .write_frame(name, &payload)
                .with_context(|| format!("close: write value [{}]", name))?;
            appended.push(FileEntry {
                name: name.to_string(),
                pos: pos as i64,
                len: len as i64,
            });
        }

        // 3) file header -> footer position
        let footer_pos = s.pos();
        self.header.footer_pos = footer_pos as i64;
        if let Some(slot) = &self.header_slot {
            s.patch(slot, &self.header.encode())
                .context("close: patch file header")?;
        }

        // 4) footer
        s.seek(SeekFrom::Start(footer_pos))?;
        let (tables, values) = (self.tables.len(), self.pending.len());
        self.footer.entries.extend(appended);
        let bytes = self.footer.encode()?;
        s.write_plain(FILE_FOOTER_RECORD, &bytes)
            .context("close: write footer")?;

        // 5)
        s.sync()?;
        s.close()?;

        info!(
            "hio: closed {} ({} values, {} tables, footer at {}, {} bytes)",
            self.path.display(),
            values,
            tables,
            footer_pos,
            s.len()
        );
        Ok(())
    }
}
