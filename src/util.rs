//! Мелкие общие помощники.

use anyhow::{anyhow, Result};
use std::sync::{Mutex, MutexGuard};

/// Lock a shared stream/header, turning poisoning into an error instead of a
/// panic.
pub(crate) fn lock<'a, T>(m: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    m.lock().map_err(|_| anyhow!("{} lock poisoned", what))
}

/// Read a length-prefixed (u16) UTF-8 string at `off`; returns it and the
/// offset right after it.
pub(crate) fn read_str16(buf: &[u8], off: usize, what: &str) -> Result<(String, usize)> {
    use byteorder::{ByteOrder, LittleEndian};
    if buf.len() < off + 2 {
        return Err(anyhow!("{}: truncated name length at {}", what, off));
    }
    let n = LittleEndian::read_u16(&buf[off..off + 2]) as usize;
    let start = off + 2;
    if buf.len() < start + n {
        return Err(anyhow!("{}: truncated name ({} bytes at {})", what, n, start));
    }
    let s = std::str::from_utf8(&buf[start..start + n])
        .map_err(|_| anyhow!("{}: name is not UTF-8", what))?
        .to_string();
    Ok((s, start + n))
}

/// Append a u16 length-prefixed string.
pub(crate) fn write_str16(out: &mut Vec<u8>, s: &str, what: &str) -> Result<()> {
    use byteorder::{LittleEndian, WriteBytesExt};
    let n = u16::try_from(s.len()).map_err(|_| anyhow!("{}: name too long ({} bytes)", what, s.len()))?;
    out.write_u16::<LittleEndian>(n)?;
    out.extend_from_slice(s.as_bytes());
    Ok(())
}
