use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod cmd_ls;
mod cmd_metrics;
mod cmd_records;
mod cmd_status;
mod util;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт - info.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Ls { path, json } => cmd_ls::exec(path, json),
        cli::Cmd::Records { path, json } => cmd_records::exec(path, json),
        cli::Cmd::Status { path, json } => cmd_status::exec(path, json),
        cli::Cmd::Metrics { path, json } => cmd_metrics::exec(path, json),
    }
}
