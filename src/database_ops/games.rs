use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, instrument};

use crate::database_ops::db::Db;

pub const DEFAULT_APP_VERSION: &str = "1.0";

const GAME_COLUMNS: &str = "id, publisher_id, name, platform, store_id, bundle_id, app_version, \
     is_published, created_at, updated_at";

/// A persisted game row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: i64,
    pub publisher_id: Option<String>,
    pub name: String,
    pub platform: String,
    pub store_id: Option<String>,
    pub bundle_id: Option<String>,
    pub app_version: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every mutable field of a game. Used both as the API body for create/replace
/// and as an import candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGame {
    #[serde(default)]
    pub publisher_id: Option<String>,
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub bundle_id: Option<String>,
    #[serde(default = "default_app_version")]
    pub app_version: String,
    #[serde(default)]
    pub is_published: bool,
}

fn default_app_version() -> String {
    DEFAULT_APP_VERSION.to_string()
}

/// Search filters; blank values are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameSearch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl GameSearch {
    fn name_filter(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    fn platform_filter(&self) -> Option<&str> {
        non_blank(self.platform.as_deref())
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.trim().is_empty())
}

/// Storage operations over the `games` table.
#[async_trait::async_trait]
pub trait GameStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Game>>;
    async fn get(&self, id: i64) -> Result<Option<Game>>;
    async fn search(&self, filter: &GameSearch) -> Result<Vec<Game>>;
    /// Exact match on the (name, platform) natural key. Returns the oldest row
    /// if duplicates slipped in.
    async fn find_by_natural_key(&self, name: &str, platform: &str) -> Result<Option<Game>>;
    async fn create(&self, game: &NewGame) -> Result<Game>;
    /// Overwrite every mutable field of an existing row.
    async fn update(&self, id: i64, game: &NewGame) -> Result<Game>;
    /// Hard delete. `false` when no row had that id.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait::async_trait]
impl GameStore for Db {
    async fn list(&self) -> Result<Vec<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games ORDER BY id");
        sqlx::query_as::<_, Game>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list games")
    }

    async fn get(&self, id: i64) -> Result<Option<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?");
        sqlx::query_as::<_, Game>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load game {id}"))
    }

    #[instrument(skip(self))]
    async fn search(&self, filter: &GameSearch) -> Result<Vec<Game>> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {GAME_COLUMNS} FROM games WHERE 1 = 1"));
        if let Some(name) = filter.name_filter() {
            // SQLite LIKE is case-insensitive for ASCII.
            qb.push(" AND name LIKE ").push_bind(format!("%{name}%"));
        }
        if let Some(platform) = filter.platform_filter() {
            qb.push(" AND platform = ").push_bind(platform.to_string());
        }
        qb.push(" ORDER BY name ASC, id ASC");

        let games = qb
            .build_query_as::<Game>()
            .fetch_all(&self.pool)
            .await
            .context("game search failed")?;
        debug!(hits = games.len(), "search finished");
        Ok(games)
    }

    async fn find_by_natural_key(&self, name: &str, platform: &str) -> Result<Option<Game>> {
        let sql = format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE name = ? AND platform = ? ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, Game>(&sql)
            .bind(name)
            .bind(platform)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("lookup of ({name}, {platform}) failed"))
    }

    async fn create(&self, game: &NewGame) -> Result<Game> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO games (publisher_id, name, platform, store_id, bundle_id, app_version, \
             is_published, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {GAME_COLUMNS}"
        );
        sqlx::query_as::<_, Game>(&sql)
            .bind(&game.publisher_id)
            .bind(&game.name)
            .bind(&game.platform)
            .bind(&game.store_id)
            .bind(&game.bundle_id)
            .bind(&game.app_version)
            .bind(game.is_published)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to create game {:?}", game.name))
    }

    async fn update(&self, id: i64, game: &NewGame) -> Result<Game> {
        let sql = format!(
            "UPDATE games SET publisher_id = ?, name = ?, platform = ?, store_id = ?, \
             bundle_id = ?, app_version = ?, is_published = ?, updated_at = ? \
             WHERE id = ? RETURNING {GAME_COLUMNS}"
        );
        sqlx::query_as::<_, Game>(&sql)
            .bind(&game.publisher_id)
            .bind(&game.name)
            .bind(&game.platform)
            .bind(&game.store_id)
            .bind(&game.bundle_id)
            .bind(&game.app_version)
            .bind(game.is_published)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to update game {id}"))?
            .ok_or_else(|| anyhow!("game {id} no longer exists"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM games WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete game {id}"))?;
        Ok(res.rows_affected() > 0)
    }
}
