//! rio/encode - помощники для кодирования и записи кадров (HREC).
//!
//! Что здесь:
//! - build_hdr_with_crc: построить заголовок кадра (16 байт) с CRC32 по
//!   header[0..crc) + name + payload.
//! - frame_len: полная длина кадра на диске.
//! - write_frame: записать [header][name][payload] по текущей позиции writer'а.

use anyhow::Result;
use byteorder::{ByteOrder, LittleEndian};
use crc32fast::Hasher as Crc32;
use std::io::Write;

use crate::consts::{
    REC_HDR_SIZE, REC_MAGIC, REC_MAX_NAME_LEN, REC_OFF_CRC32, REC_OFF_FLAGS, REC_OFF_LEN,
    REC_OFF_MAGIC, REC_OFF_NAME_LEN,
};
use crate::error::HioError;

/// CRC32 по трём срезам без промежуточного буфера.
#[inline]
pub fn crc32_of_parts(head_without_crc: &[u8], name: &[u8], payload: &[u8]) -> u32 {
    let mut h = Crc32::new();
    h.update(head_without_crc);
    h.update(name);
    h.update(payload);
    h.finalize()
}

/// Total on-disk size of a frame with this name and stored payload.
#[inline]
pub fn frame_len(name: &str, payload_len: usize) -> u64 {
    (REC_HDR_SIZE + name.len() + payload_len) as u64
}

/// Построить заголовок кадра с заполненным CRC32.
pub fn build_hdr_with_crc(name: &str, flags: u16, payload: &[u8]) -> Result<[u8; REC_HDR_SIZE]> {
    if name.len() > REC_MAX_NAME_LEN {
        return Err(HioError::encode(
            name,
            format!("record name too long: {} bytes (max {})", name.len(), REC_MAX_NAME_LEN),
        )
        .into());
    }
    if payload.len() > u32::MAX as usize {
        return Err(HioError::encode(
            name,
            format!("payload too large: {} bytes (max {})", payload.len(), u32::MAX),
        )
        .into());
    }

    let mut hdr = [0u8; REC_HDR_SIZE];
    hdr[REC_OFF_MAGIC..REC_OFF_MAGIC + 4].copy_from_slice(REC_MAGIC);
    LittleEndian::write_u16(
        &mut hdr[REC_OFF_NAME_LEN..REC_OFF_NAME_LEN + 2],
        name.len() as u16,
    );
    LittleEndian::write_u16(&mut hdr[REC_OFF_FLAGS..REC_OFF_FLAGS + 2], flags);
    LittleEndian::write_u32(
        &mut hdr[REC_OFF_LEN..REC_OFF_LEN + 4],
        payload.len() as u32,
    );

    let crc = crc32_of_parts(&hdr[..REC_OFF_CRC32], name.as_bytes(), payload);
    LittleEndian::write_u32(&mut hdr[REC_OFF_CRC32..REC_OFF_CRC32 + 4], crc);
    Ok(hdr)
}

/// Записать один кадр [header][name][payload] в текущую позицию writer'а.
///
/// Не делает seek - ответственность за позицию лежит на вызывающем коде.
/// Возвращает полную длину кадра.
pub fn write_frame<W: Write>(writer: &mut W, name: &str, flags: u16, payload: &[u8]) -> Result<u64> {
    let hdr = build_hdr_with_crc(name, flags, payload)?;
    writer.write_all(&hdr)?;
    writer.write_all(name.as_bytes())?;
    if !payload.is_empty() {
        writer.write_all(payload)?;
    }
    Ok(frame_len(name, payload.len()))
}
