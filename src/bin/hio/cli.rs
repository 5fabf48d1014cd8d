use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect hio container files
#[derive(Parser, Debug)]
#[command(name = "hio", version, about = "hio container inspector")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// List footer entries (values and tables)
    Ls {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List every physical record in file order
    Records {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Header/footer summary
    Status {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Scan the file (index + all records) and print I/O counters
    Metrics {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
}
