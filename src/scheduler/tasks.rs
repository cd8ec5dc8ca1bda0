use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::{
    data::models::Feed,
    error::{FeedError, Result},
    scheduler::{Poller, freshness},
    util::parser,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub due: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub posted: usize,
}

/// One scheduler tick: checks every feed whose interval has elapsed.
pub async fn check(poller: &Poller) -> anyhow::Result<Summary> {
    let now = poller.clock.now();
    let feeds = poller.database.feeds().await?;
    let due: Vec<Feed> = feeds.into_iter().filter(|feed| feed.is_due(now)).collect();

    let mut summary = Summary {
        due: due.len(),
        ..Default::default()
    };

    for feed in &due {
        match process(poller, feed).await {
            Ok(count) => {
                summary.succeeded += 1;
                summary.posted += count;
            }
            Err(e) => {
                summary.failed += 1;
                error!("Failed to check feed '{}' ({}): {}", feed.name, feed.url, e);
            }
        }

        // stamped whatever the outcome so failing feeds retry at their normal cadence
        if let Err(e) = poller.database.checked(feed.id, now).await {
            warn!("Could not stamp feed '{}' as checked: {}", feed.name, e);
        }
    }

    if summary.due > 0 {
        info!(
            "Feed check complete: {} due, {} successful, {} failed, {} posted",
            summary.due, summary.succeeded, summary.failed, summary.posted
        );
    }

    Ok(summary)
}

/// Checks one feed and returns how many entries were posted.
async fn process(poller: &Poller, feed: &Feed) -> Result<usize> {
    // only the fetch is bounded; delivery always runs through to the cursor write
    let entries = timeout(poller.fetch_timeout, poller.source.entries(&feed.url))
        .await
        .map_err(|_| FeedError::invalid("Timeout fetching feed"))??;
    let candidates: Vec<_> = entries.iter().filter_map(parser::normalize).collect();

    if candidates.is_empty() {
        warn!("Feed '{}' has no valid timestamped entries", feed.name);
        return Ok(0);
    }

    let cursor = feed.cursor();
    let evaluation = freshness::evaluate(cursor.as_ref(), candidates, poller.max_posts);

    if cursor.is_none() {
        if let Some(initial) = &evaluation.cursor {
            poller.database.advance(feed.id, initial).await?;
            info!("Feed '{}' initialized at {}", feed.name, initial.timestamp);
        }
        return Ok(0);
    }

    let channel_id = feed.channel_id as u64;
    let mut delivered = None;
    let mut posted = 0;
    let mut failure = None;

    for entry in &evaluation.posts {
        info!("Posting '{}' from feed '{}'", entry.title, feed.name);
        match poller.poster.deliver(channel_id, entry).await {
            Ok(()) => {
                delivered = Some(entry);
                posted += 1;
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    // only what actually went out moves the cursor; the rest is retried next check
    if let Some(last) = delivered.and_then(|entry| entry.cursor()) {
        poller.database.advance(feed.id, &last).await?;
        info!("Feed '{}': posted {} new entries", feed.name, posted);
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(posted),
    }
}
