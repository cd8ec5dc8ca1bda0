#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use feed_rs::model::Entry;
use futures::future::BoxFuture;
use rss_johnny::{
    data::{Database, models::NewFeed},
    error::{FeedError, Result},
    scheduler::{Clock, Poller},
    util::{fetcher::Source, parser, parser::NormalizedEntry, poster::Deliver},
};

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

/// An RSS document with one item per `(guid, seconds)` pair, in the given order.
pub fn rss(items: &[(&str, i64)]) -> String {
    let items: String = items
        .iter()
        .map(|(id, seconds)| {
            format!(
                "<item><title>Item {id}</title><link>https://example.com/{id}</link>\
                 <guid>{id}</guid><pubDate>{}</pubDate><description>Body of {id}</description></item>",
                at(*seconds).to_rfc2822()
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Fixture</title><link>https://example.com</link>
<description>fixture feed</description>{items}</channel></rss>"#
    )
}

#[derive(Default)]
pub struct StaticSource {
    feeds: Mutex<HashMap<String, std::result::Result<String, String>>>,
}

impl StaticSource {
    pub fn set(&self, url: &str, xml: String) {
        self.feeds.lock().unwrap().insert(url.to_string(), Ok(xml));
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.feeds
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(reason.to_string()));
    }
}

#[async_trait]
impl Source for StaticSource {
    async fn entries(&self, url: &str) -> Result<Vec<Entry>> {
        let feed = self.feeds.lock().unwrap().get(url).cloned();
        match feed {
            Some(Ok(xml)) => Ok(parser::parse(xml.as_bytes())?.entries),
            Some(Err(reason)) => Err(FeedError::invalid(reason)),
            None => Err(FeedError::invalid("Unable to fetch feed: HTTP 404 Not Found")),
        }
    }
}

#[derive(Default)]
pub struct RecordingPoster {
    sent: Mutex<Vec<(u64, NormalizedEntry)>>,
    fail_on: Mutex<Option<String>>,
}

impl RecordingPoster {
    /// Identifiers of every delivered entry, in delivery order.
    pub fn ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, entry)| entry.id.clone())
            .collect()
    }

    pub fn channels(&self) -> Vec<u64> {
        self.sent.lock().unwrap().iter().map(|(channel, _)| *channel).collect()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, entry)| entry.title.clone())
            .collect()
    }

    pub fn fail_on(&self, id: Option<&str>) {
        *self.fail_on.lock().unwrap() = id.map(str::to_string);
    }
}

#[async_trait]
impl Deliver for RecordingPoster {
    async fn deliver(&self, channel_id: u64, entry: &NormalizedEntry) -> Result<()> {
        if self.fail_on.lock().unwrap().as_deref() == entry.id.as_deref() && entry.id.is_some() {
            return Err(FeedError::Delivery {
                channel_id,
                reason: "Missing Access".to_string(),
            });
        }
        self.sent.lock().unwrap().push((channel_id, entry.clone()));
        Ok(())
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, seconds: i64) {
        *self.now.lock().unwrap() += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        self.advance(duration.as_secs() as i64);
        Box::pin(tokio::task::yield_now())
    }
}

pub struct Harness {
    pub database: Arc<Database>,
    pub source: Arc<StaticSource>,
    pub poster: Arc<RecordingPoster>,
    pub clock: Arc<ManualClock>,
    pub poller: Poller,
}

impl Harness {
    pub async fn new(max_posts: usize) -> Self {
        let database = Arc::new(Database::connect("sqlite::memory:").await.unwrap());
        let source = Arc::new(StaticSource::default());
        let poster = Arc::new(RecordingPoster::default());
        let clock = Arc::new(ManualClock::new(at(10_000)));

        let poller = Poller {
            database: database.clone(),
            source: source.clone(),
            poster: poster.clone(),
            clock: clock.clone(),
            max_posts,
            fetch_timeout: Duration::from_secs(5),
        };

        Self {
            database,
            source,
            poster,
            clock,
            poller,
        }
    }

    pub async fn add_feed(&self, guild_id: u64, name: &str, channel_id: u64) -> String {
        let url = format!("https://feeds.example.com/{guild_id}/{name}.xml");
        self.database
            .insert(&NewFeed {
                guild_id,
                name: name.to_string(),
                url: url.clone(),
                channel_id,
                interval_seconds: 600,
            })
            .await
            .unwrap();
        url
    }
}
