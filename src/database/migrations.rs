use chrono::Utc;
use error_stack::ResultExt;
use sqlx::Executor;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use super::error::ErrorExt;
use super::Pool;

/// One forward-only schema step. Steps are applied in ascending
/// `version` order and recorded in `schema_migrations`; an applied
/// version is never run again.
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        sql: include_str!("../../migrations/0001_create_users.sql"),
    },
    Migration {
        version: 2,
        name: "create_channels",
        sql: include_str!("../../migrations/0002_create_channels.sql"),
    },
    Migration {
        version: 3,
        name: "create_messages",
        sql: include_str!("../../migrations/0003_create_messages.sql"),
    },
    Migration {
        version: 4,
        name: "create_tasks",
        sql: include_str!("../../migrations/0004_create_tasks.sql"),
    },
    Migration {
        version: 5,
        name: "create_files",
        sql: include_str!("../../migrations/0005_create_files.sql"),
    },
];

#[derive(Debug, Error)]
#[error("Failed to perform database migrations")]
pub struct MigrationError;

/// Applies every migration that is not yet recorded in
/// `schema_migrations`, each inside its own transaction. Returns
/// how many steps ran.
#[tracing::instrument(skip_all, name = "migrations.run_pending")]
pub async fn run_pending(pool: &Pool) -> error_stack::Result<u32, MigrationError> {
    let now = Instant::now();

    let applied = applied_versions(pool).await.change_context(MigrationError)?;

    let mut ran = 0u32;
    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }

        debug!(
            "applying migration {:04} ({})",
            migration.version, migration.name
        );
        apply(pool, migration).await.change_context(MigrationError)?;
        ran += 1;
    }

    if ran > 0 {
        let elapsed = now.elapsed();
        info!("Applied {ran} database migration(s)! took {elapsed:.2?}");
    }

    Ok(ran)
}

/// Versions recorded in the migration history table, ascending.
/// Creates the history table when it does not exist yet so this is
/// safe to call against a fresh database.
#[tracing::instrument(skip_all, name = "migrations.applied_versions")]
pub async fn applied_versions(pool: &Pool) -> super::Result<Vec<i64>> {
    let mut conn = pool.get().await?;
    (&mut *conn)
        .execute(
            r"CREATE TABLE IF NOT EXISTS schema_migrations (
                version BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMP NOT NULL
            )",
        )
        .await
        .into_db_error()?;

    sqlx::query_scalar::<_, i64>("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(&mut *conn)
        .await
        .into_db_error()
}

async fn apply(pool: &Pool, migration: &Migration) -> super::Result<()> {
    let mut tx = pool.begin().await?;
    (&mut *tx).execute(migration.sql).await.into_db_error()?;

    sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES ($1, $2, $3)")
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now().naive_utc())
        .execute(&mut *tx)
        .await
        .into_db_error()?;

    tx.commit().await.into_db_error()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_strictly_increasing() {
        for pair in MIGRATIONS.windows(2) {
            assert!(
                pair[0].version < pair[1].version,
                "{} must come before {}",
                pair[0].name,
                pair[1].name
            );
        }
    }

    #[test]
    fn test_steps_are_not_empty() {
        for migration in MIGRATIONS {
            assert!(
                !migration.sql.trim().is_empty(),
                "{} has an empty SQL body",
                migration.name
            );
        }
    }

    #[test]
    fn test_steps_never_drop_schema() {
        // forward-only: a step must not undo another one
        for migration in MIGRATIONS {
            let lowered = migration.sql.to_lowercase();
            assert!(
                !lowered.contains("drop table"),
                "{} drops a table",
                migration.name
            );
        }
    }
}
