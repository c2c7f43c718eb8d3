use clap::Parser;
use error_stack::{Result, ResultExt};
use thiserror::Error;

use huddle::database::migrations::{self, MIGRATIONS};
use huddle::{config, App};

#[derive(Debug, Error)]
#[error("Could not run database migrations")]
pub struct MigrateError;

#[derive(Debug, Parser)]
pub struct MigrateCommand {
    #[clap(subcommand)]
    pub action: MigrateAction,
}

#[derive(Debug, Parser)]
pub enum MigrateAction {
    /// Apply every pending migration
    Run,
    /// Show which migrations are applied and which are pending
    Status,
}

pub fn run(args: MigrateCommand) -> Result<(), MigrateError> {
    let config = config::Server::load().change_context(MigrateError)?;
    super::init_tracing();

    super::build_runtime()
        .change_context(MigrateError)?
        .block_on(async move {
            let app = App::new(config).await.change_context(MigrateError)?;

            match args.action {
                MigrateAction::Run => {
                    let ran = migrations::run_pending(&app.primary_db)
                        .await
                        .change_context(MigrateError)?;
                    println!("{ran} migration(s) applied");
                }
                MigrateAction::Status => {
                    let applied = migrations::applied_versions(&app.primary_db)
                        .await
                        .change_context(MigrateError)?;

                    for migration in MIGRATIONS {
                        let state = if applied.contains(&migration.version) {
                            "applied"
                        } else {
                            "pending"
                        };
                        println!("{:04} {:<24} {state}", migration.version, migration.name);
                    }
                }
            }

            Ok(())
        })
}
