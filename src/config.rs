use std::{path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use chrono::FixedOffset;
use serde::Deserialize;

use crate::scheduler::{DEFAULT_TICK, freshness::DEFAULT_MAX_POSTS};

pub const CONFIG_PATH_VAR: &str = "RSS_JOHNNY_CONFIG";
pub const TOKEN_VAR: &str = "DISCORD_TOKEN";

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub tick: Duration,
    pub max_posts: usize,
    pub offset: FixedOffset,
    pub database_url: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    bot: RawBot,
    #[serde(default)]
    database: RawDatabase,
}

#[derive(Debug, Default, Deserialize)]
struct RawBot {
    token: Option<String>,
    tick_seconds: Option<u64>,
    max_posts_per_check: Option<usize>,
    utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDatabase {
    url: Option<String>,
}

impl Config {
    /// Loads the config file named by `RSS_JOHNNY_CONFIG` (default
    /// `config.toml`), letting `DISCORD_TOKEN` override the file's token.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());
        let token = std::env::var(TOKEN_VAR).ok();
        Self::from_file(path, token)
    }

    pub fn from_file(path: impl AsRef<Path>, token: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text, token)
    }

    pub fn parse(text: &str, token: Option<String>) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text).context("Invalid config file")?;

        let token = token
            .or(raw.bot.token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let Some(token) = token else {
            bail!("Bot token missing: set bot.token in the config file or {}", TOKEN_VAR);
        };

        let offset_minutes = raw.bot.utc_offset_minutes.unwrap_or(0);
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .with_context(|| format!("utc_offset_minutes out of range: {}", offset_minutes))?;

        Ok(Self {
            token,
            tick: raw
                .bot
                .tick_seconds
                .map(|s| Duration::from_secs(s.max(1)))
                .unwrap_or(DEFAULT_TICK),
            max_posts: raw.bot.max_posts_per_check.unwrap_or(DEFAULT_MAX_POSTS).max(1),
            offset,
            database_url: raw
                .database
                .url
                .unwrap_or_else(|| "sqlite://rss-johnny.db".to_string()),
        })
    }
}
