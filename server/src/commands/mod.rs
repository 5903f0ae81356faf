use cja::Result;
use clap::Subcommand;

pub(crate) mod info;
pub(crate) mod seed;
pub(crate) mod serve;

#[derive(Subcommand, Default)]
pub(crate) enum Command {
    /// Run the HTTP API and the cron worker
    #[default]
    Serve,
    /// Create the default recipe categories
    Seed,
    /// Print the version and what is in the database
    Info,
}

impl Command {
    pub(crate) async fn run(&self) -> Result<()> {
        match &self {
            Command::Serve => serve::serve().await,
            Command::Seed => seed::seed().await,
            Command::Info => info::print_info().await,
        }
    }
}
