//! rio/codec - payload encoding for records.
//!
//! Two layers:
//! - typed values <-> bytes: bincode (fixed-int, LE, trailing bytes rejected);
//! - bytes <-> stored payload: optional per-record compression (gzip/zstd),
//!   announced in the frame flags.

use anyhow::{anyhow, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};

use crate::consts::{CODEC_GZIP, CODEC_NONE, CODEC_ZSTD, REC_FLAG_CODEC_MASK};
use crate::error::HioError;

pub const GZIP_DEFAULT_LEVEL: u32 = 6;
pub const ZSTD_DEFAULT_LEVEL: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip { level: u32 },
    Zstd { level: i32 },
}

impl Compression {
    /// Parse "none|gzip|zstd" with an optional level.
    pub fn parse(s: &str, level: Option<i32>) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip {
                level: level
                    .map(|l| l.clamp(0, 9) as u32)
                    .unwrap_or(GZIP_DEFAULT_LEVEL),
            }),
            "zstd" => Ok(Compression::Zstd {
                level: level.unwrap_or(ZSTD_DEFAULT_LEVEL),
            }),
            _ => Err(anyhow!(
                "invalid compression '{}' (supported: none|gzip|zstd)",
                s
            )),
        }
    }

    /// Codec bits stored in the frame flags.
    pub fn flags(&self) -> u16 {
        match self {
            Compression::None => CODEC_NONE,
            Compression::Gzip { .. } => CODEC_GZIP,
            Compression::Zstd { .. } => CODEC_ZSTD,
        }
    }

    pub fn compress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        match *self {
            Compression::None => Ok(raw.to_vec()),
            Compression::Gzip { level } => {
                let mut enc = flate2::write::GzEncoder::new(
                    Vec::with_capacity(raw.len() / 2 + 16),
                    flate2::Compression::new(level),
                );
                enc.write_all(raw)?;
                Ok(enc.finish()?)
            }
            Compression::Zstd { level } => Ok(zstd::bulk::compress(raw, level)?),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip { level } => write!(f, "gzip(level={})", level),
            Compression::Zstd { level } => write!(f, "zstd(level={})", level),
        }
    }
}

/// Human-readable codec name for frame flags (used by inspect/CLI).
pub fn codec_name(flags: u16) -> &'static str {
    match flags & REC_FLAG_CODEC_MASK {
        CODEC_NONE => "none",
        CODEC_GZIP => "gzip",
        CODEC_ZSTD => "zstd",
        _ => "unknown",
    }
}

/// Undo the codec announced in `flags`. Plain payloads are borrowed.
pub fn decompress<'a>(name: &str, flags: u16, stored: &'a [u8]) -> Result<Cow<'a, [u8]>> {
    match flags & REC_FLAG_CODEC_MASK {
        CODEC_NONE => Ok(Cow::Borrowed(stored)),
        CODEC_GZIP => {
            let mut out = Vec::with_capacity(stored.len() * 2);
            flate2::read::GzDecoder::new(stored)
                .read_to_end(&mut out)
                .map_err(|e| HioError::decode(name, format!("gzip: {e}")))?;
            Ok(Cow::Owned(out))
        }
        CODEC_ZSTD => {
            let out = zstd::stream::decode_all(stored)
                .map_err(|e| HioError::decode(name, format!("zstd: {e}")))?;
            Ok(Cow::Owned(out))
        }
        other => Err(HioError::decode(name, format!("unknown payload codec {}", other)).into()),
    }
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Serialize a typed payload for record `name`.
pub fn encode_value<T: Serialize + ?Sized>(name: &str, v: &T) -> Result<Vec<u8>> {
    options()
        .serialize(v)
        .map_err(|e| HioError::encode(name, e).into())
}

/// Deserialize a typed payload of record `name`.
pub fn decode_value<T: DeserializeOwned>(name: &str, bytes: &[u8]) -> Result<T> {
    options()
        .deserialize(bytes)
        .map_err(|e| HioError::decode(name, e).into())
}
