// tests/compression.rs
//
// Значения и строки таблиц сжимаются выбранным кодеком (gzip/zstd);
// записи формата (header/footer/header/<table>) всегда хранятся как есть,
// иначе их нельзя было бы перезаписать на месте.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use hio::inspect::list_records;
use hio::{Compression, File, HioConfig};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("hiotest-codec-{prefix}-{pid}-{t}-{id}.hio"))
}

fn round_trip(c: Compression, codec: &str) -> Result<()> {
    let path = unique_root(codec);
    let cfg = HioConfig::default().with_fsync(false).with_compression(c);
    let big: Vec<u32> = (0..10_000).map(|i| i % 17).collect();
    {
        let mut f = File::create_with_config(&path, cfg.clone())?;
        f.set("big", big.clone())?;
        let mut t = f.new_table("t")?;
        for i in 0..20u64 {
            t.write(&vec![i; 64])?;
        }
        t.close()?;
        f.close()?;
    }

    let size = std::fs::metadata(&path)?.len();
    assert!(size < (big.len() * 4) as u64, "{codec}: file should be smaller than raw data");

    for r in list_records(&path)? {
        let want = if r.name == "big" || r.name == "t" { codec } else { "none" };
        assert_eq!(r.codec, want, "record [{}]", r.name);
    }

    // reading doesn't depend on the reader's compression setting
    let mut f = File::open_with_config(&path, HioConfig::default())?;
    assert_eq!(f.get::<Vec<u32>>("big")?, big);
    let mut t = f.get_table("t")?;
    for i in 0..20u64 {
        assert_eq!(t.read::<Vec<u64>>()?, vec![i; 64]);
    }
    assert!(hio::is_end_of_table(&t.read::<Vec<u64>>().unwrap_err()));

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[test]
fn gzip_round_trip() -> Result<()> {
    round_trip(Compression::Gzip { level: 6 }, "gzip")
}

#[test]
fn zstd_round_trip() -> Result<()> {
    round_trip(Compression::Zstd { level: 3 }, "zstd")
}
