use anyhow::Result;
use std::path::PathBuf;

use hio::inspect::list_records;

use crate::util::print_json;

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let recs = list_records(&path)?;
    if json {
        return print_json(&recs);
    }

    println!("{:>12} {:>10} {:<5}  name", "pos", "len", "codec");
    for r in &recs {
        println!("{:>12} {:>10} {:<5}  {}", r.pos, r.len, r.codec, r.name);
    }
    println!("{} records", recs.len());
    Ok(())
}
