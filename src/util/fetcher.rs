use std::time::Duration;

use async_trait::async_trait;
use feed_rs::model::Entry;
use reqwest::Client;
use tokio::time::timeout;
use url::Url;

use crate::{
    error::{FeedError, Result},
    util::parser,
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_BYTES: usize = 5_000_000;

/// Where feed entries come from.
#[async_trait]
pub trait Source: Send + Sync {
    async fn entries(&self, url: &str) -> Result<Vec<Entry>>;
}

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("rss-johnny/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::invalid(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, String> {
        let response = self.client.get(url).send().await.map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        if let Some(length) = response.content_length() {
            if length as usize > MAX_FEED_BYTES {
                return Err(format!("Feed too large: {} bytes", length));
            }
        }

        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        if bytes.len() > MAX_FEED_BYTES {
            return Err(format!("Feed too large: {} bytes", bytes.len()));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn entries(&self, url: &str) -> Result<Vec<Entry>> {
        let content = match timeout(FETCH_TIMEOUT, self.fetch(url)).await {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => return Err(FeedError::invalid(format!("Unable to fetch feed: {}", e))),
            Err(_) => return Err(FeedError::invalid("Timeout fetching feed")),
        };

        Ok(parser::parse(&content)?.entries)
    }
}

/// Checks that `url` points at a feed worth subscribing to and returns its
/// entry count.
pub async fn validate(source: &dyn Source, url: &str) -> Result<usize> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => return Err(FeedError::invalid("Invalid URL format.")),
    }

    let entries = source.entries(url).await?;

    if entries.is_empty() {
        return Err(FeedError::invalid("Feed contains no entries."));
    }

    if !entries.iter().any(|e| e.published.or(e.updated).is_some()) {
        return Err(FeedError::invalid("Feed entries have no timestamps."));
    }

    Ok(entries.len())
}
