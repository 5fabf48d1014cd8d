// src/footer.rs - hio.FileFooter (position index)
//
// Payload (LE):
// u32 count
// повторяется count раз:
//   u16 name_len, name bytes, i64 pos, i64 len
//
// pos/len - абсолютное смещение и полная длина кадра записи (значение или
// header/<table>). Строки таблиц не индексируются.

use anyhow::{anyhow, Result};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::consts::FILE_FOOTER_RECORD;
use crate::rio::Stream;
use crate::util::{read_str16, write_str16};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub pos: i64,
    pub len: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFooter {
    pub entries: Vec<FileEntry>,
}

impl FileFooter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, name: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let count = u32::try_from(self.entries.len())
            .map_err(|_| anyhow!("too many footer entries: {}", self.entries.len()))?;
        let mut out = Vec::with_capacity(4 + self.entries.len() * 32);
        out.write_u32::<LittleEndian>(count)?;
        for e in &self.entries {
            write_str16(&mut out, &e.name, "footer entry")?;
            out.write_i64::<LittleEndian>(e.pos)?;
            out.write_i64::<LittleEndian>(e.len)?;
        }
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 4 {
            return Err(anyhow!("footer too short ({} bytes)", buf.len()));
        }
        let count = LittleEndian::read_u32(&buf[0..4]) as usize;
        let mut off = 4usize;
        let mut entries = Vec::with_capacity(count.min(4096));
        for i in 0..count {
            let (name, next) = read_str16(buf, off, "footer entry")?;
            if buf.len() < next + 16 {
                return Err(anyhow!("footer entry #{} [{}] truncated", i, name));
            }
            let pos = LittleEndian::read_i64(&buf[next..next + 8]);
            let len = LittleEndian::read_i64(&buf[next + 8..next + 16]);
            entries.push(FileEntry { name, pos, len });
            off = next + 16;
        }
        if off != buf.len() {
            return Err(anyhow!(
                "footer has {} trailing bytes",
                buf.len() - off
            ));
        }
        Ok(Self { entries })
    }

    /// Read the next record of `s` and decode it as the footer.
    pub fn read_from(s: &mut Stream) -> Result<Self> {
        let frame = s
            .read_record()?
            .ok_or_else(|| anyhow!("missing {} record", FILE_FOOTER_RECORD))?;
        if frame.name != FILE_FOOTER_RECORD {
            return Err(anyhow!(
                "expected {} record at {}, found [{}]",
                FILE_FOOTER_RECORD,
                frame.pos,
                frame.name
            ));
        }
        Self::decode(&frame.payload()?)
    }
}
