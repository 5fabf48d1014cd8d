// src/header.rs - hio.FileHeader
//
// Payload (LE, fixed 16 bytes):
// MAGIC4     = "HIO\0"
// u32 version = HIO_FORMAT_VERSION
// i64 footer_pos (0 = файл ещё пишется, footer не записан)
//
// Запись всегда первая в файле (offset 0). При create пишется с footer_pos=0
// (резерв слота), при close перезаписывается на месте с реальным footer_pos.

use anyhow::{anyhow, Result};
use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{FILE_HEADER_RECORD, FILE_HEADER_SIZE, HIO_FORMAT_VERSION, HIO_MAGIC};
use crate::rio::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u32,
    pub footer_pos: i64,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHeader {
    pub fn new() -> Self {
        Self {
            version: HIO_FORMAT_VERSION,
            footer_pos: 0,
        }
    }

    /// True once close() has recorded where the footer lives.
    pub fn is_finalized(&self) -> bool {
        self.footer_pos != 0
    }

    pub fn encode(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        buf[0..4].copy_from_slice(HIO_MAGIC);
        LittleEndian::write_u32(&mut buf[4..8], self.version);
        LittleEndian::write_i64(&mut buf[8..16], self.footer_pos);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != FILE_HEADER_SIZE {
            return Err(anyhow!(
                "file header must be {} bytes, got {}",
                FILE_HEADER_SIZE,
                buf.len()
            ));
        }
        if &buf[0..4] != HIO_MAGIC {
            return Err(anyhow!("bad file header magic"));
        }
        let version = LittleEndian::read_u32(&buf[4..8]);
        if version != HIO_FORMAT_VERSION {
            return Err(anyhow!(
                "unsupported format version {} (expected {})",
                version,
                HIO_FORMAT_VERSION
            ));
        }
        let footer_pos = LittleEndian::read_i64(&buf[8..16]);
        if footer_pos < 0 {
            return Err(anyhow!("negative footer position {}", footer_pos));
        }
        Ok(Self {
            version,
            footer_pos,
        })
    }

    /// Read the next record of `s` and decode it as the file header.
    pub fn read_from(s: &mut Stream) -> Result<Self> {
        let frame = s
            .read_record()?
            .ok_or_else(|| anyhow!("missing {} record", FILE_HEADER_RECORD))?;
        if frame.name != FILE_HEADER_RECORD {
            return Err(anyhow!(
                "expected {} record at {}, found [{}]",
                FILE_HEADER_RECORD,
                frame.pos,
                frame.name
            ));
        }
        Self::decode(&frame.payload()?)
    }
}
