use std::sync::Arc;

use anyhow::Result;
use serenity::{all::CommandInteraction, prelude::*};
use tracing::info;

use crate::{
    cmd::{self, channel, defer_response, edit_reply, integer_option, required_name, string_option},
    data::{
        Database,
        models::{Feed, FeedUpdate},
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
    let update = FeedUpdate {
        url: string_option(command, "url"),
        channel_id: channel(command, "channel").map(|id| id.get()),
        interval_seconds: integer_option(command, "interval_seconds"),
    };

    defer_response(command, &ctx.http).await?;

    let outcome = edit_feed(database, source, guild_id, &name, &update)
        .await
        .map(|feed| {
            info!("Feed updated: {} in guild {}", feed.name, guild_id);
            format!(
                "Feed '{}' updated: {} → <#{}>, every {}s",
                feed.name, feed.url, feed.channel_id, feed.interval_seconds
            )
        });

    edit_reply(command, &ctx.http, &cmd::user_message(outcome)?).await
}

/// Applies `update` to the named feed, validating a new URL first. The
/// freshness cursor is left alone.
pub async fn edit_feed(
    database: &Database,
    source: &dyn Source,
    guild_id: u64,
    name: &str,
    update: &FeedUpdate,
) -> error::Result<Feed> {
    if update.is_empty() {
        return Err(FeedError::Rejected(
            "Nothing to change: give a new url, channel or interval.".to_string(),
        ));
    }

    if database.find(guild_id, name).await?.is_none() {
        return Err(FeedError::NotFound(name.to_string()));
    }

    if let Some(url) = &update.url {
        validate(source, url).await?;
    }

    database.configure(guild_id, name, update).await
}
