use std::sync::Arc;

use anyhow::Result;
use serenity::{all::CommandInteraction, prelude::*};
use tracing::info;

use crate::{
    cmd::{self, channel, defer_response, edit_reply, integer_option, required_name, string_option},
    data::{
        Database,
        models::{DEFAULT_INTERVAL, Feed, NewFeed},
    },
    error::{self, FeedError},
    util::fetcher::{Source, validate},
};

pub async fn execute(
    ctx: &Context,
    command: &CommandInteraction,
    database: &Arc<Database>,
    source: &dyn Source,
) -> Result<()> {
    let Some(guild_id) = cmd::guild(ctx, command).await? else {
        return Ok(());
    };
    if !cmd::check_permissions(ctx, command).await? {
        return Ok(());
    }

    let name = required_name(command)?;
    let url = string_option(command, "url").ok_or_else(|| anyhow::anyhow!("URL is required"))?;
    let channel_id = channel(command, "channel").unwrap_or(command.channel_id).get();
    let interval_seconds = integer_option(command, "interval_seconds").unwrap_or(DEFAULT_INTERVAL);

    defer_response(command, &ctx.http).await?;

    let new_feed = NewFeed {
        guild_id,
        name,
        url,
        channel_id,
        interval_seconds,
    };
    let outcome = add(database, source, &new_feed).await.map(|(feed, entries)| {
        info!("Feed added: {} ({}) in guild {}", feed.name, feed.url, guild_id);
        format!(
            "Feed '{}' added to <#{}>\n{} items • checked every {}s",
            feed.name, feed.channel_id, entries, feed.interval_seconds
        )
    });

    edit_reply(command, &ctx.http, &cmd::user_message(outcome)?).await
}

/// Validates the source and stores the feed. Returns the stored row and the
/// number of entries the source currently offers.
pub async fn add(
    database: &Database,
    source: &dyn Source,
    feed: &NewFeed,
) -> error::Result<(Feed, usize)> {
    if feed.name.trim().is_empty() {
        return Err(FeedError::Rejected("Feed name cannot be empty.".to_string()));
    }

    if database.find(feed.guild_id, &feed.name).await?.is_some() {
        return Err(FeedError::DuplicateName(feed.name.clone()));
    }

    let entries = validate(source, &feed.url).await?;
    let stored = database.insert(feed).await?;
    Ok((stored, entries))
}
