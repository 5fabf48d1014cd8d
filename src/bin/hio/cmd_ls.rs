use anyhow::Result;
use std::path::PathBuf;

use hio::inspect::{list_entries, EntryKind};

use crate::util::print_json;

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let entries = list_entries(&path)?;
    if json {
        return print_json(&entries);
    }

    println!("{:<6} {:>12} {:>10} {:>10}  name", "kind", "pos", "len", "rows");
    for e in &entries {
        let kind = match e.kind {
            EntryKind::Value => "value",
            EntryKind::Table => "table",
        };
        let rows = e.rows.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
        println!("{:<6} {:>12} {:>10} {:>10}  {}", kind, e.pos, e.len, rows, e.name);
    }
    Ok(())
}
