//! rio/reader - последовательное чтение кадров (HREC) с проверкой CRC.
//!
//! Назначение:
//! - Единый, протестируемый путь чтения кадров для Stream::read_record.
//! - Валидирует magic и CRC32 по header[0..crc) + name + payload.
//! - Толерантен к частичному хвосту (возвращает Ok(None) и пишет warn!).
//!
//! Reader должен стоять ровно на `pos` - функция не делает seek, чтобы не
//! сбрасывать буфер BufReader'а на каждом кадре.

use anyhow::{anyhow, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::warn;
use std::io::{ErrorKind, Read};

use super::encode::crc32_of_parts;
use super::record::Frame;
use crate::consts::{
    REC_HDR_SIZE, REC_MAGIC, REC_OFF_CRC32, REC_OFF_FLAGS, REC_OFF_LEN, REC_OFF_MAGIC,
    REC_OFF_NAME_LEN,
};
use crate::error::HioError;

/// Считать следующий кадр с позиции pos. file_len - длина файла.
///
/// Возвращает:
/// * Ok(Some((Frame, next_pos))) - кадр прочитан и валиден;
/// * Ok(None) - конец потока или частичный хвост;
/// * Err(e) - нарушение целостности (magic/CRC) или I/O ошибка.
pub fn read_next_frame<R: Read>(r: &mut R, pos: u64, file_len: u64) -> Result<Option<(Frame, u64)>> {
    if pos >= file_len {
        return Ok(None);
    }

    // Достаточно места под заголовок кадра?
    if pos + (REC_HDR_SIZE as u64) > file_len {
        warn!(
            "rio: partial frame header at pos={} (file_len={}), treating as end of stream",
            pos, file_len
        );
        return Ok(None);
    }

    let mut hdr = [0u8; REC_HDR_SIZE];
    if let Err(e) = r.read_exact(&mut hdr) {
        if e.kind() == ErrorKind::UnexpectedEof {
            return Ok(None);
        }
        return Err(anyhow!("rio read frame header at pos {}: {}", pos, e));
    }

    if &hdr[REC_OFF_MAGIC..REC_OFF_MAGIC + 4] != REC_MAGIC {
        return Err(HioError::decode(
            "<frame>",
            format!("bad record magic at pos {}", pos),
        )
        .into());
    }

    let name_len = LittleEndian::read_u16(&hdr[REC_OFF_NAME_LEN..REC_OFF_NAME_LEN + 2]) as usize;
    let flags = LittleEndian::read_u16(&hdr[REC_OFF_FLAGS..REC_OFF_FLAGS + 2]);
    let payload_len = LittleEndian::read_u32(&hdr[REC_OFF_LEN..REC_OFF_LEN + 4]) as usize;

    let total = (REC_HDR_SIZE + name_len + payload_len) as u64;
    let next_pos = pos + total;
    if next_pos > file_len {
        warn!(
            "rio: partial frame body at pos={} (need {} bytes, file_len={}), treating as end of stream",
            pos, total, file_len
        );
        return Ok(None);
    }

    let mut name = vec![0u8; name_len];
    let mut payload = vec![0u8; payload_len];
    for buf in [&mut name, &mut payload] {
        if let Err(e) = r.read_exact(buf) {
            if e.kind() == ErrorKind::UnexpectedEof {
                return Ok(None);
            }
            return Err(anyhow!("rio read frame body at pos {}: {}", pos, e));
        }
    }

    let stored_crc = LittleEndian::read_u32(&hdr[REC_OFF_CRC32..REC_OFF_CRC32 + 4]);
    let calc_crc = crc32_of_parts(&hdr[..REC_OFF_CRC32], &name, &payload);
    let name = String::from_utf8(name)
        .map_err(|_| HioError::decode("<frame>", format!("record name at pos {} is not UTF-8", pos)))?;
    if stored_crc != calc_crc {
        return Err(HioError::decode(
            &name,
            format!(
                "CRC mismatch at pos {} (stored={}, calc={})",
                pos, stored_crc, calc_crc
            ),
        )
        .into());
    }

    Ok(Some((Frame::new(name, flags, pos, total, payload), next_pos)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rio::encode::write_frame;
    use std::io::Cursor;

    fn two_frames() -> Vec<u8> {
        let mut buf = Vec::new();
        write_frame(&mut buf, "first", 0, b"one").unwrap();
        write_frame(&mut buf, "second", 0, b"").unwrap();
        buf
    }

    #[test]
    fn reads_frames_in_order_then_none() {
        let buf = two_frames();
        let len = buf.len() as u64;
        let mut cur = Cursor::new(buf);

        let (f1, next) = read_next_frame(&mut cur, 0, len).unwrap().unwrap();
        assert_eq!(f1.name, "first");
        assert_eq!(f1.pos, 0);
        assert_eq!(next, f1.len);
        assert_eq!(f1.stored_payload(), b"one");

        let (f2, next2) = read_next_frame(&mut cur, next, len).unwrap().unwrap();
        assert_eq!(f2.name, "second");
        assert!(f2.stored_payload().is_empty());
        assert_eq!(next2, len);

        assert!(read_next_frame(&mut cur, next2, len).unwrap().is_none());
    }

    #[test]
    fn partial_tail_is_end_of_stream() {
        let mut buf = two_frames();
        buf.truncate(buf.len() - 2);
        let len = buf.len() as u64;
        let mut cur = Cursor::new(buf);
        let (_, next) = read_next_frame(&mut cur, 0, len).unwrap().unwrap();
        assert!(read_next_frame(&mut cur, next, len).unwrap().is_none());
    }

    #[test]
    fn corrupted_payload_fails_crc() {
        let mut buf = two_frames();
        buf[REC_HDR_SIZE + 5] ^= 0xFF; // first payload byte
        let len = buf.len() as u64;
        let mut cur = Cursor::new(buf);
        let err = read_next_frame(&mut cur, 0, len).unwrap_err();
        assert!(format!("{err:#}").contains("CRC mismatch"));
    }

    #[test]
    fn bad_magic_fails() {
        let mut buf = two_frames();
        buf[0] = b'X';
        let len = buf.len() as u64;
        let mut cur = Cursor::new(buf);
        assert!(read_next_frame(&mut cur, 0, len).is_err());
    }
}
