pub mod models;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use models::{Cursor, Feed, FeedUpdate, NewFeed, clamp_interval};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::error::{FeedError, Result};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` and applies migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // every connection to an in-memory database gets its own empty copy
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        Ok(Self::new(pool))
    }

    pub async fn insert(&self, feed: &NewFeed) -> Result<Feed> {
        let result = sqlx::query_as::<_, Feed>(
            r#"
            INSERT INTO feeds (guild_id, name, url, channel_id, interval_seconds)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, guild_id, name, url, channel_id, interval_seconds, cursor_at,
                      cursor_id, last_checked
            "#,
        )
        .bind(feed.guild_id as i64)
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(feed.channel_id as i64)
        .bind(clamp_interval(feed.interval_seconds))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(feed) => Ok(feed),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(FeedError::DuplicateName(feed.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, guild_id: u64, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM feeds WHERE guild_id = ? AND name = ?")
            .bind(guild_id as i64)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FeedError::NotFound(name.to_string()));
        }
        Ok(())
    }

    pub async fn configure(&self, guild_id: u64, name: &str, update: &FeedUpdate) -> Result<Feed> {
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            UPDATE feeds
            SET url = COALESCE(?, url),
                channel_id = COALESCE(?, channel_id),
                interval_seconds = COALESCE(?, interval_seconds)
            WHERE guild_id = ? AND name = ?
            RETURNING id, guild_id, name, url, channel_id, interval_seconds, cursor_at,
                      cursor_id, last_checked
            "#,
        )
        .bind(update.url.as_deref())
        .bind(update.channel_id.map(|id| id as i64))
        .bind(update.interval_seconds.map(clamp_interval))
        .bind(guild_id as i64)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        feed.ok_or_else(|| FeedError::NotFound(name.to_string()))
    }

    pub async fn feeds(&self) -> Result<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>(
            "SELECT id, guild_id, name, url, channel_id, interval_seconds, cursor_at, cursor_id, \
             last_checked FROM feeds ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    pub async fn guild(&self, guild_id: u64) -> Result<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>(
            "SELECT id, guild_id, name, url, channel_id, interval_seconds, cursor_at, cursor_id, \
             last_checked FROM feeds WHERE guild_id = ? ORDER BY name",
        )
        .bind(guild_id as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    pub async fn find(&self, guild_id: u64, name: &str) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>(
            "SELECT id, guild_id, name, url, channel_id, interval_seconds, cursor_at, cursor_id, \
             last_checked FROM feeds WHERE guild_id = ? AND name = ? LIMIT 1",
        )
        .bind(guild_id as i64)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(feed)
    }

    pub async fn advance(&self, id: i64, cursor: &Cursor) -> Result<()> {
        let result = sqlx::query("UPDATE feeds SET cursor_at = ?, cursor_id = ? WHERE id = ?")
            .bind(cursor.timestamp)
            .bind(cursor.id.as_deref())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FeedError::Gone(id));
        }
        Ok(())
    }

    pub async fn checked(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE feeds SET last_checked = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FeedError::Gone(id));
        }
        Ok(())
    }
}
