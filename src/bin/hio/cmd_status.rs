use anyhow::Result;
use std::path::PathBuf;

use hio::inspect::status;

use crate::util::{human_bytes, print_json};

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let st = status(&path)?;
    if json {
        return print_json(&st);
    }

    println!("hio status");
    println!("  path        = {}", st.path);
    println!("  size        = {} ({})", st.file_size, human_bytes(st.file_size));
    println!("  version     = {}", st.version);
    if st.finalized {
        println!("  footer_pos  = {}", st.footer_pos);
    } else {
        println!("  footer_pos  = 0 (not closed)");
    }
    println!(
        "  entries     = {} ({} values, {} tables)",
        st.entries, st.values, st.tables
    );
    println!("  records     = {}", st.records);
    Ok(())
}
