pub mod freshness;
pub mod tasks;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tracing::{error, info};

use crate::{
    data::Database,
    util::{fetcher::Source, poster::Deliver},
};

pub const DEFAULT_TICK: Duration = Duration::from_secs(30);
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Everything a feed check needs.
#[derive(Clone)]
pub struct Poller {
    pub database: Arc<Database>,
    pub source: Arc<dyn Source>,
    pub poster: Arc<dyn Deliver>,
    pub clock: Arc<dyn Clock>,
    pub max_posts: usize,
    pub fetch_timeout: Duration,
}

/// Runs a check, waits `period`, and repeats. A tick always finishes before
/// the wait for the next one starts.
pub async fn run(poller: Poller, period: Duration) {
    info!("Scheduler started, checking feeds every {:?}", period);

    loop {
        if let Err(e) = tasks::check(&poller).await {
            error!("Feed check error: {}", e);
        }
        poller.clock.sleep(period).await;
    }
}
