use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

/// Schema migrations compiled into the binary, applied in version order.
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "create_games",
    include_str!("../../migrations/0001_create_games.sql"),
)];

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    /// Open the pool and bring the schema up to date.
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)
            .context("invalid sqlite database url")?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own empty database,
        // so the pool must hold exactly one connection and never recycle it.
        let in_memory = is_in_memory(database_url);
        let mut opts = pool_options(in_memory, max_connections);
        if in_memory {
            opts = opts.idle_timeout(None).max_lifetime(None);
        }

        let pool = opts
            .connect_with(connect_options)
            .await
            .context("failed to connect to database")?;
        info!(in_memory, "connected to db");

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Fresh in-memory database with the schema applied. Used by tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Cheap connectivity probe for health checks.
    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _sqlx_migrations (
                version BIGINT PRIMARY KEY,
                description TEXT,
                installed_at TEXT DEFAULT CURRENT_TIMESTAMP
             )",
        )
        .execute(pool)
        .await
        .context("failed to create migration tracking table")?;

        let applied_rows = sqlx::query("SELECT version FROM _sqlx_migrations")
            .fetch_all(pool)
            .await?;
        let mut applied: HashSet<i64> = HashSet::new();
        for r in applied_rows {
            applied.insert(r.try_get::<i64, _>(0)?);
        }

        for &(version, description, sql) in MIGRATIONS {
            if applied.contains(&version) {
                continue;
            }
            info!(version, description, "applying migration");
            let mut tx = pool.begin().await?;
            sqlx::raw_sql(sql)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("migration {version}_{description} failed"))?;
            sqlx::query("INSERT INTO _sqlx_migrations (version, description) VALUES (?, ?)")
                .bind(version)
                .bind(description)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            applied.insert(version);
        }

        info!(applied = applied.len(), "migrations up-to-date");
        Ok(())
    }
}

fn pool_options(in_memory: bool, max_connections: u32) -> SqlitePoolOptions {
    let max = if in_memory { 1 } else { max_connections.max(1) };
    SqlitePoolOptions::new()
        .max_connections(max)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
