mod common;

use common::{RecordingPoster, StaticSource, rss};
use rss_johnny::{
    cmd::{add::add, edit::edit_feed, latest},
    data::{
        Database,
        models::{FeedUpdate, MAX_INTERVAL, NewFeed},
    },
    error::FeedError,
};
use tokio_test::assert_ok;

const URL: &str = "https://example.com/feed.xml";

async fn setup() -> (Database, StaticSource) {
    let database = Database::connect("sqlite::memory:").await.unwrap();
    let source = StaticSource::default();
    source.set(URL, rss(&[("c", 30), ("b", 20), ("a", 10)]));
    (database, source)
}

fn new_feed(guild_id: u64, name: &str, url: &str) -> NewFeed {
    NewFeed {
        guild_id,
        name: name.to_string(),
        url: url.to_string(),
        channel_id: 55,
        interval_seconds: 600,
    }
}

#[tokio::test]
async fn add_stores_feed_without_cursor() {
    let (database, source) = setup().await;

    let (feed, entries) = add(&database, &source, &new_feed(1, "news", URL)).await.unwrap();

    assert_eq!(entries, 3);
    assert_eq!(feed.name, "news");
    assert_eq!(feed.channel_id, 55);
    assert_eq!(feed.interval_seconds, 600);
    assert_eq!(feed.cursor(), None);
}

#[tokio::test]
async fn add_rejects_feed_without_entries() {
    let (database, source) = setup().await;
    let empty = "https://example.com/empty.xml";
    source.set(empty, rss(&[]));

    let err = add(&database, &source, &new_feed(1, "empty", empty)).await.unwrap_err();

    assert!(matches!(&err, FeedError::Source(reason) if reason == "Feed contains no entries."));
    assert_eq!(database.find(1, "empty").await.unwrap(), None);
}

#[tokio::test]
async fn add_rejects_unreachable_feed() {
    let (database, source) = setup().await;

    let err = add(&database, &source, &new_feed(1, "gone", "https://example.com/404.xml"))
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::Source(_)));
    assert!(database.feeds().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_rejects_duplicate_name_within_guild() {
    let (database, source) = setup().await;
    assert_ok!(add(&database, &source, &new_feed(1, "news", URL)).await);

    let err = add(&database, &source, &new_feed(1, "news", URL)).await.unwrap_err();
    assert!(matches!(err, FeedError::DuplicateName(_)));

    assert_ok!(add(&database, &source, &new_feed(2, "news", URL)).await);
    assert_eq!(database.feeds().await.unwrap().len(), 2);
}

#[tokio::test]
async fn add_rejects_blank_name() {
    let (database, source) = setup().await;

    let err = add(&database, &source, &new_feed(1, "  ", URL)).await.unwrap_err();
    assert!(matches!(err, FeedError::Rejected(_)));
}

#[tokio::test]
async fn edit_updates_config_only() {
    let (database, source) = setup().await;
    assert_ok!(add(&database, &source, &new_feed(1, "news", URL)).await);

    let other = "https://example.com/other.xml";
    source.set(other, rss(&[("x", 5)]));

    let update = FeedUpdate {
        url: Some(other.to_string()),
        interval_seconds: Some(1_000_000),
        ..Default::default()
    };
    let feed = edit_feed(&database, &source, 1, "news", &update).await.unwrap();

    assert_eq!(feed.url, other);
    assert_eq!(feed.channel_id, 55);
    assert_eq!(feed.interval_seconds, MAX_INTERVAL);
}

#[tokio::test]
async fn edit_with_invalid_url_changes_nothing() {
    let (database, source) = setup().await;
    assert_ok!(add(&database, &source, &new_feed(1, "news", URL)).await);

    let update = FeedUpdate {
        url: Some("https://example.com/404.xml".to_string()),
        channel_id: Some(77),
        ..Default::default()
    };
    let err = edit_feed(&database, &source, 1, "news", &update).await.unwrap_err();
    assert!(matches!(err, FeedError::Source(_)));

    let feed = database.find(1, "news").await.unwrap().unwrap();
    assert_eq!(feed.url, URL);
    assert_eq!(feed.channel_id, 55);
}

#[tokio::test]
async fn edit_reports_missing_feed_and_empty_update() {
    let (database, source) = setup().await;

    let update = FeedUpdate {
        channel_id: Some(9),
        ..Default::default()
    };
    let err = edit_feed(&database, &source, 1, "nope", &update).await.unwrap_err();
    assert!(matches!(err, FeedError::NotFound(_)));

    assert_ok!(add(&database, &source, &new_feed(1, "news", URL)).await);
    let err = edit_feed(&database, &source, 1, "news", &FeedUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Rejected(_)));
}

#[tokio::test]
async fn latest_posts_newest_entries_oldest_first() {
    let (database, source) = setup().await;
    assert_ok!(add(&database, &source, &new_feed(1, "news", URL)).await);

    let entries = latest::latest(&database, &source, 1, "news", 2).await.unwrap();
    let ids: Vec<_> = entries.iter().filter_map(|e| e.id.as_deref()).collect();
    assert_eq!(ids, ["b", "c"]);

    let poster = RecordingPoster::default();
    let posted = latest::post_latest(&database, &source, &poster, 1, "news", 1, 900)
        .await
        .unwrap();
    assert_eq!(posted, 1);
    assert_eq!(poster.ids(), ["c"]);
    assert_eq!(poster.channels(), [900]);
}

#[tokio::test]
async fn latest_count_is_clamped() {
    let (database, source) = setup().await;
    let many = "https://example.com/many.xml";
    let items: Vec<(String, i64)> = (0..8).map(|n| (format!("e{n}"), 100 - n)).collect();
    let items: Vec<(&str, i64)> = items.iter().map(|(id, t)| (id.as_str(), *t)).collect();
    source.set(many, rss(&items));
    assert_ok!(add(&database, &source, &new_feed(1, "many", many)).await);

    assert_eq!(latest::latest(&database, &source, 1, "many", 50).await.unwrap().len(), 5);
    assert_eq!(latest::latest(&database, &source, 1, "many", 0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn latest_on_unknown_feed_is_not_found() {
    let (database, source) = setup().await;

    let err = latest::latest(&database, &source, 1, "nope", 1).await.unwrap_err();
    assert!(matches!(err, FeedError::NotFound(name) if name == "nope"));
}
