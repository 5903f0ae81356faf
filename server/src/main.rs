#![allow(dead_code)]

use cja::setup::{setup_sentry, setup_tracing};
use clap::Parser;
use commands::Command;

pub use cja::Result;

mod commands;
mod cron;
mod http_server;
mod recipes;
mod validation;

pub mod state;
pub(crate) use state::AppState;

#[derive(Parser)]
#[command(author, version, about)]
struct CliArgs {
    #[clap(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    let _sentry_guard = setup_sentry();

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?
        .block_on(async { _main().await })
}

async fn _main() -> Result<()> {
    setup_tracing("forked")?;

    let cli = CliArgs::parse();
    let command = cli.command.unwrap_or_default();

    command.run().await
}
