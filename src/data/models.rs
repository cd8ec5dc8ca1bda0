use chrono::{DateTime, TimeDelta, Utc};

pub const MIN_INTERVAL: i64 = 60;
pub const MAX_INTERVAL: i64 = 86_400;
pub const DEFAULT_INTERVAL: i64 = 600;

pub fn clamp_interval(seconds: i64) -> i64 {
    seconds.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub guild_id: i64,
    pub name: String,
    pub url: String,
    pub channel_id: i64,
    pub interval_seconds: i64,
    pub cursor_at: Option<DateTime<Utc>>,
    pub cursor_id: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Feed {
    /// The freshness watermark, if the feed has completed its first check.
    /// Rows written before identifiers were tracked carry a timestamp only.
    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor_at.map(|timestamp| Cursor {
            timestamp,
            id: self.cursor_id.clone(),
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_checked {
            Some(last) => now.signed_duration_since(last) >= TimeDelta::seconds(self.interval_seconds),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub timestamp: DateTime<Utc>,
    pub id: Option<String>,
}

impl Cursor {
    pub fn new(timestamp: DateTime<Utc>, id: impl Into<String>) -> Self {
        Self {
            timestamp,
            id: Some(id.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFeed {
    pub guild_id: u64,
    pub name: String,
    pub url: String,
    pub channel_id: u64,
    pub interval_seconds: i64,
}

/// Config fields an edit may touch. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedUpdate {
    pub url: Option<String>,
    pub channel_id: Option<u64>,
    pub interval_seconds: Option<i64>,
}

impl FeedUpdate {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.channel_id.is_none() && self.interval_seconds.is_none()
    }
}
