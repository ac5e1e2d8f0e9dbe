use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hd_core::preferences::{validate_decay, BASELINE_WEIGHT};
use hd_core::storage::delivery_cutoff;
use hd_core::{DigestStore, Error, Item, ItemId, MessageId, Result, TagWeight};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use crate::{StorageBackend, DEFAULT_DB_PATH};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        summary TEXT NOT NULL,
        tags TEXT NOT NULL,
        engagement_score INTEGER NOT NULL,
        fetched_at TEXT NOT NULL,
        delivered_at TEXT,
        message_id INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_items_delivered_at ON items (delivered_at)",
    "CREATE INDEX IF NOT EXISTS idx_items_message_id ON items (message_id)",
    r#"
    CREATE TABLE IF NOT EXISTS tag_weights (
        tag TEXT PRIMARY KEY,
        weight REAL NOT NULL,
        occurrences INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS likes (
        item_id INTEGER PRIMARY KEY,
        liked_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Fixed-width so that stored timestamps compare correctly as text.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse timestamp {}: {}", value, e)))
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Database(format!("{}: {}", context, e))
}

fn item_from_row(row: &SqliteRow) -> Result<Item> {
    let tags: String = row.try_get("tags").map_err(db_error("Failed to read tags"))?;
    let fetched_at: String = row.try_get("fetched_at").map_err(db_error("Failed to read fetched_at"))?;
    let delivered_at: Option<String> = row
        .try_get("delivered_at")
        .map_err(db_error("Failed to read delivered_at"))?;
    let engagement: i64 = row
        .try_get("engagement_score")
        .map_err(db_error("Failed to read engagement_score"))?;

    Ok(Item {
        id: row.try_get("id").map_err(db_error("Failed to read id"))?,
        title: row.try_get("title").map_err(db_error("Failed to read title"))?,
        url: row.try_get("url").map_err(db_error("Failed to read url"))?,
        summary: row.try_get("summary").map_err(db_error("Failed to read summary"))?,
        tags: serde_json::from_str(&tags)?,
        engagement_score: u32::try_from(engagement).unwrap_or(u32::MAX),
        fetched_at: parse_timestamp(&fetched_at)?,
        delivered_at: delivered_at.as_deref().map(parse_timestamp).transpose()?,
        message_id: row.try_get("message_id").map_err(db_error("Failed to read message_id"))?,
    })
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at ./digest.db"
    }

    async fn new() -> Result<Self> {
        Self::new_with_path(Path::new(DEFAULT_DB_PATH)).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }
        debug!("SQLite storage ready at {}", db_path.display());

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl DigestStore for SQLiteStorage {
    async fn apply_decay(&self, rate: f64, floor: f64) -> Result<()> {
        validate_decay(rate, floor)?;
        sqlx::query("UPDATE tag_weights SET weight = MAX(?, weight * (1.0 - ?))")
            .bind(floor)
            .bind(rate)
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to apply decay"))?;
        Ok(())
    }

    async fn recently_delivered_ids(&self, window: Duration) -> Result<HashSet<ItemId>> {
        let cutoff = format_timestamp(delivery_cutoff(Utc::now(), window)?);
        let rows = sqlx::query("SELECT id FROM items WHERE delivered_at IS NOT NULL AND delivered_at >= ?")
            .bind(cutoff)
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to load recent deliveries"))?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>("id").map_err(db_error("Failed to read id")))
            .collect()
    }

    async fn all_tag_weights(&self) -> Result<HashMap<String, TagWeight>> {
        let rows = sqlx::query("SELECT tag, weight, occurrences FROM tag_weights")
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to load tag weights"))?;

        let mut weights = HashMap::with_capacity(rows.len());
        for row in rows {
            let tag: String = row.try_get("tag").map_err(db_error("Failed to read tag"))?;
            let occurrences: i64 = row
                .try_get("occurrences")
                .map_err(db_error("Failed to read occurrences"))?;
            let weight = TagWeight {
                tag: tag.clone(),
                weight: row.try_get("weight").map_err(db_error("Failed to read weight"))?,
                occurrences: u32::try_from(occurrences).unwrap_or(u32::MAX),
            };
            weights.insert(tag, weight);
        }
        Ok(weights)
    }

    async fn boost(&self, tag: &str, delta: f64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tag_weights (tag, weight, occurrences)
            VALUES (?, ?, 1)
            ON CONFLICT (tag) DO UPDATE SET
                weight = weight + ?,
                occurrences = occurrences + 1
            "#,
        )
        .bind(tag)
        .bind(BASELINE_WEIGHT + delta)
        .bind(delta)
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to boost tag"))?;
        Ok(())
    }

    async fn save_item(&self, item: &Item) -> Result<()> {
        let tags = serde_json::to_string(&item.tags)?;

        sqlx::query(
            r#"
            INSERT INTO items
            (id, title, url, summary, tags, engagement_score, fetched_at, delivered_at, message_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                title = excluded.title,
                url = excluded.url,
                summary = excluded.summary,
                tags = excluded.tags,
                engagement_score = excluded.engagement_score,
                fetched_at = excluded.fetched_at,
                delivered_at = COALESCE(excluded.delivered_at, items.delivered_at),
                message_id = COALESCE(excluded.message_id, items.message_id)
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.summary)
        .bind(tags)
        .bind(i64::from(item.engagement_score))
        .bind(format_timestamp(item.fetched_at))
        .bind(item.delivered_at.map(format_timestamp))
        .bind(item.message_id)
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to store item"))?;

        Ok(())
    }

    async fn mark_delivered(&self, id: ItemId, when: DateTime<Utc>, message_id: MessageId) -> Result<()> {
        let result = sqlx::query("UPDATE items SET delivered_at = ?, message_id = ? WHERE id = ?")
            .bind(format_timestamp(when))
            .bind(message_id)
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to mark item delivered"))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("item {}", id)));
        }
        Ok(())
    }

    async fn item_by_message_id(&self, message_id: MessageId) -> Result<Option<Item>> {
        let row = sqlx::query("SELECT * FROM items WHERE message_id = ? LIMIT 1")
            .bind(message_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to look up item by message id"))?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn is_liked(&self, item_id: ItemId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM likes WHERE item_id = ?")
            .bind(item_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to check like"))?;
        Ok(row.is_some())
    }

    async fn record_like(&self, item_id: ItemId, when: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO likes (item_id, liked_at) VALUES (?, ?)")
            .bind(item_id)
            .bind(format_timestamp(when))
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to record like"))?;
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to read setting"))?;

        row.map(|row| row.try_get("value").map_err(db_error("Failed to read setting value")))
            .transpose()
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to write setting"))?;
        Ok(())
    }
}
