use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use tracing::info;

use crate::config::DatabaseTarget;

static POSTGRES_MIGRATIONS: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/postgres");
static SQLITE_MIGRATIONS: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

/// Connection pool for whichever backend the configuration selected.
///
/// Queries are written once and dispatched to the concrete pool with
/// [`with_pool!`]; both schemas keep the same column names and use
/// `$N` placeholders, which SQLite accepts as numbered parameters.
#[derive(Debug, Clone)]
pub enum Db {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// Runs `$body` with `$pool` bound to the concrete sqlx pool behind a `&Db`.
macro_rules! with_pool {
    ($db:expr, |$pool:ident| $body:expr) => {
        match $db {
            $crate::db::Db::Postgres($pool) => $body,
            $crate::db::Db::Sqlite($pool) => $body,
        }
    };
}
pub(crate) use with_pool;

impl Db {
    /// Opens a pool for the configured target.
    pub async fn connect(target: &DatabaseTarget) -> Result<Self> {
        match target {
            DatabaseTarget::Postgres { url } => {
                info!("Connecting to PostgreSQL...");
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                info!("PostgreSQL connection pool established");
                Ok(Db::Postgres(pool))
            }
            DatabaseTarget::Sqlite { path } => {
                info!("No DATABASE_URL set, using SQLite at {}", path.display());
                Ok(Db::Sqlite(open_sqlite_file(path).await?))
            }
        }
    }

    /// Applies the backend's embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        match self {
            Db::Postgres(pool) => POSTGRES_MIGRATIONS.run(pool).await,
            Db::Sqlite(pool) => SQLITE_MIGRATIONS.run(pool).await,
        }
        .context("failed to apply database migrations")?;
        info!("Database migrations applied ({})", self.backend());
        Ok(())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Db::Postgres(_) => "postgres",
            Db::Sqlite(_) => "sqlite",
        }
    }

    /// A private in-memory SQLite database with migrations applied.
    ///
    /// Pinned to one connection that never expires, since every new
    /// connection to `:memory:` would see an empty database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Db::Sqlite(pool);
        db.migrate().await?;
        Ok(db)
    }
}

async fn open_sqlite_file(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_file_is_created_and_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("learn.db");

        let db = Db::connect(&DatabaseTarget::Sqlite { path: path.clone() })
            .await
            .unwrap();
        db.migrate().await.unwrap();

        assert!(path.exists());
        assert_eq!(db.backend(), "sqlite");

        let tables: i64 = with_pool!(&db, |pool| {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
                 ('users', 'roadmaps', 'modules', 'progress', 'assessments', \
                  'chat_history', 'badges', 'learning_streaks')",
            )
            .fetch_one(pool)
            .await
        })
        .unwrap();
        assert_eq!(tables, 8);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Db::in_memory().await.unwrap();
        db.migrate().await.unwrap();
    }
}
