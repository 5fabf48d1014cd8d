//! Centralized configuration for hio containers and record streams.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - `HioConfig::from_env()` reads the HIO_* variables; `File::open` /
//!   `File::create` use it, the `*_with_config` variants take an explicit one.
//!
//! Defaults:
//! - compression = none (payload records stored as-is)
//! - fsync = true (`sync()` calls `sync_all` on the data file)
//! - buffer_size = 64 KiB for buffered reader/writer

use std::fmt;

use log::warn;

use crate::consts::DEFAULT_BUFFER_SIZE;
use crate::rio::Compression;

/// Top-level configuration for hio (writer/reader).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HioConfig {
    /// Codec applied to value and table-row records. Format records
    /// (file header, footer, table headers) are always stored plain.
    /// Env: HIO_COMPRESSION = none|gzip|zstd (default none),
    ///      HIO_COMPRESSION_LEVEL = integer (default: codec default)
    pub compression: Compression,

    /// Whether `sync()` performs a physical fsync.
    /// Env: HIO_FSYNC (default true; "0|false|off|no" => false)
    pub fsync: bool,

    /// Capacity of the buffered reader/writer in bytes.
    /// Env: HIO_BUFFER_SIZE (default 65536)
    pub buffer_size: usize,
}

impl Default for HioConfig {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            fsync: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl HioConfig {
    /// Load configuration from environment variables. Invalid values are
    /// logged and the default is kept.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        let level = std::env::var("HIO_COMPRESSION_LEVEL")
            .ok()
            .and_then(|s| s.trim().parse::<i32>().ok());

        if let Ok(v) = std::env::var("HIO_COMPRESSION") {
            match Compression::parse(&v, level) {
                Ok(c) => cfg.compression = c,
                Err(e) => warn!("ignoring HIO_COMPRESSION: {e:#}"),
            }
        }

        if let Ok(v) = std::env::var("HIO_FSYNC") {
            match parse_bool(&v) {
                Some(on) => cfg.fsync = on,
                None => warn!("ignoring HIO_FSYNC='{}' (expected 0|1|true|false|on|off|yes|no)", v),
            }
        }

        if let Ok(v) = std::env::var("HIO_BUFFER_SIZE") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => cfg.buffer_size = n,
                _ => warn!("ignoring HIO_BUFFER_SIZE='{}'", v),
            }
        }

        cfg
    }

    // Fluent setters (builder-style) to override specific fields.

    pub fn with_compression(mut self, c: Compression) -> Self {
        self.compression = c;
        self
    }

    pub fn with_fsync(mut self, on: bool) -> Self {
        self.fsync = on;
        self
    }

    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes.max(1);
        self
    }
}

impl fmt::Display for HioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HioConfig {{ compression: {}, fsync: {}, buffer_size: {} }}",
            self.compression, self.fsync, self.buffer_size
        )
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for s in ["1", "true", "ON", " yes "] {
            assert_eq!(parse_bool(s), Some(true), "{s}");
        }
        for s in ["0", "False", "off", "no"] {
            assert_eq!(parse_bool(s), Some(false), "{s}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = HioConfig::default()
            .with_compression(Compression::Zstd { level: 5 })
            .with_fsync(false)
            .with_buffer_size(0);
        assert_eq!(cfg.compression, Compression::Zstd { level: 5 });
        assert!(!cfg.fsync);
        assert_eq!(cfg.buffer_size, 1);
        assert!(cfg.to_string().contains("zstd"));
    }
}
