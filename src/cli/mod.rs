use clap::Parser;
use error_stack::{Result, ResultExt};
use thiserror::Error;

mod admin;
mod migrate;
mod server;

#[derive(Debug, Error)]
#[error("Command failed")]
pub struct CommandError;

/// Command line options for Huddle.
#[derive(Debug, Parser)]
#[command(about = "Utility suite for the Huddle backend", version, author)]
pub struct Cli {
    #[clap(subcommand)]
    pub subcommand: Subcommand,
}

impl Cli {
    pub fn run(self) -> Result<(), CommandError> {
        match self.subcommand {
            Subcommand::Server(args) => server::run(args).change_context(CommandError),
            Subcommand::Migrate(args) => migrate::run(args).change_context(CommandError),
            Subcommand::Admin(args) => admin::run(args).change_context(CommandError),
        }
    }
}

#[derive(Debug, Parser)]
pub enum Subcommand {
    /// Expose the Huddle API HTTP server
    Server(server::ServerCommand),
    /// Apply or inspect versioned database migrations
    Migrate(migrate::MigrateCommand),
    /// Parameterized maintenance commands
    Admin(admin::AdminCommand),
}

pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

pub(crate) fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}
