// tests/lazy_resolution.rs
//
// После open все имена известны (has/keys), но ничего не загружено.
// Первый get читает ровно одну запись, повторный - ни одной.
// Несовпадение типов - TypeMismatch, а не паника/мусор.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use hio::{File, HioConfig, HioError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("hiotest-lazy-{prefix}-{pid}-{t}-{id}.hio"))
}

fn cfg() -> HioConfig {
    HioConfig::default().with_fsync(false)
}

fn build(path: &Path) -> Result<()> {
    let mut f = File::create_with_config(path, cfg())?;
    f.set("a", 1i64)?;
    f.set("b", String::from("bee"))?;
    f.set("c", vec![1.0f32, 2.0, 3.0])?;
    let mut t = f.new_table("rows")?;
    t.write(&10u32)?;
    t.close()?;
    f.close()
}

#[test]
fn first_get_reads_once_then_cached() -> Result<()> {
    let path = unique_root("once");
    build(&path)?;

    let mut f = File::open_with_config(&path, cfg())?;
    for n in ["a", "b", "c", "rows"] {
        assert!(f.has(n));
        assert!(!f.is_resolved(n), "[{n}] must not be loaded at open");
    }
    // header + footer
    let after_open = f.records_read();
    assert_eq!(after_open, 2);

    assert_eq!(f.get::<String>("b")?, "bee");
    assert!(f.is_resolved("b"));
    assert!(!f.is_resolved("a"));
    assert_eq!(f.records_read(), after_open + 1);

    for _ in 0..3 {
        assert_eq!(f.get::<String>("b")?, "bee");
    }
    assert_eq!(f.records_read(), after_open + 1, "cached get must not touch disk");

    // out of order loads land on the right record
    assert_eq!(f.get::<Vec<f32>>("c")?, vec![1.0, 2.0, 3.0]);
    assert_eq!(f.get::<i64>("a")?, 1);
    assert_eq!(f.records_read(), after_open + 3);

    // table header is resolved through its own handle; container reads one record
    let t = f.get_table("rows")?;
    assert_eq!(t.entries(), 1);
    assert!(f.is_resolved("rows"));
    assert_eq!(f.records_read(), after_open + 4);
    t.close()?;
    let _t2 = f.get_table("rows")?;
    assert_eq!(f.records_read(), after_open + 4);

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[test]
fn missing_names_are_not_found() -> Result<()> {
    let path = unique_root("missing");
    build(&path)?;
    let mut f = File::open_with_config(&path, cfg())?;

    let err = f.get::<i64>("nope").unwrap_err();
    assert_eq!(
        err.downcast_ref::<HioError>(),
        Some(&HioError::not_found("nope"))
    );
    let err = f.get_table("nope").err().expect("missing table");
    assert!(matches!(
        err.downcast_ref::<HioError>(),
        Some(HioError::NotFound { .. })
    ));

    let _ = std::fs::remove_file(&path);
    Ok(())
}

fn is_mismatch(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<HioError>(),
        Some(HioError::TypeMismatch { .. })
    )
}

#[test]
fn shape_mismatches() -> Result<()> {
    let path = unique_root("mismatch");
    build(&path)?;
    let mut f = File::open_with_config(&path, cfg())?;

    // unresolved: stored type name differs
    assert!(is_mismatch(&f.get::<String>("a").unwrap_err()));
    assert!(!f.is_resolved("a"));

    // resolved: checked downcast
    assert_eq!(f.get::<i64>("a")?, 1);
    assert!(is_mismatch(&f.get::<u64>("a").unwrap_err()));

    // value vs table, both directions
    assert!(is_mismatch(&f.get::<u32>("rows").unwrap_err()));
    assert!(is_mismatch(&f.get_table("b").err().expect("value is not a table")));
    let _t = f.get_table("rows")?;
    assert!(is_mismatch(&f.get::<u32>("rows").unwrap_err()));

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[test]
fn same_width_mismatch_is_not_cached() -> Result<()> {
    let path = unique_root("width");
    let mut f = File::create_with_config(&path, cfg())?;
    f.set("n", 42i64)?;
    f.close()?;

    let mut f = File::open_with_config(&path, cfg())?;
    // f64 тоже 8 байт, но хранится i64
    let err = f.get::<f64>("n").unwrap_err();
    match err.downcast_ref::<HioError>() {
        Some(HioError::TypeMismatch { expected, found, .. }) => {
            assert_eq!(expected, "f64");
            assert_eq!(found, "i64");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!f.is_resolved("n"));

    assert_eq!(f.get::<i64>("n")?, 42);
    assert!(f.is_resolved("n"));
    assert!(is_mismatch(&f.get::<f64>("n").unwrap_err()));

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[test]
fn write_mode_gets_see_set_values() -> Result<()> {
    let path = unique_root("wget");
    let mut f = File::create_with_config(&path, cfg())?;
    f.set("x", 3u8)?;
    assert!(f.is_resolved("x"));
    assert_eq!(f.get::<u8>("x")?, 3);
    assert!(is_mismatch(&f.get::<i8>("x").unwrap_err()));
    f.close()?;

    let _ = std::fs::remove_file(&path);
    Ok(())
}
