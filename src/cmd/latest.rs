use std::sync::Arc;

use anyhow::Result;
use chrono::FixedOffset;
use serenity::{all::CommandInteraction, prelude::*};

use crate::{
    cmd::{self, defer_response, edit_reply, integer_option, required_name},
    data::Database,
    error::{self, FeedError},
    util::{
        fetcher::Source,
        parser::{self, NormalizedEntry},
        poster::{ChannelPoster, Deliver},
    },
};

pub const MAX_LATEST: i64 = 5;

pub async fn execute(
    ctx: &Context,
    command: &CommandInteraction,
    database: &Arc<Database>,
    source: &dyn Source,
    offset: FixedOffset,
) -> Result<()> {
    let Some(guild_id) = cmd::guild(ctx, command).await? else {
        return Ok(());
    };

    let name = required_name(command)?;
    let count = integer_option(command, "count").unwrap_or(1);

    defer_response(command, &ctx.http).await?;

    let poster = ChannelPoster::new(ctx.http.clone(), offset);
    let channel_id = command.channel_id.get();
    let outcome = post_latest(database, source, &poster, guild_id, &name, count, channel_id)
        .await
        .map(|posted| format!("Posted {} item(s).", posted));

    edit_reply(command, &ctx.http, &cmd::user_message(outcome)?).await
}

/// The newest `count` entries of the named feed (clamped to 1..=5), oldest
/// of them first.
pub async fn latest(
    database: &Database,
    source: &dyn Source,
    guild_id: u64,
    name: &str,
    count: i64,
) -> error::Result<Vec<NormalizedEntry>> {
    let feed = database
        .find(guild_id, name)
        .await?
        .ok_or_else(|| FeedError::NotFound(name.to_string()))?;

    let count = count.clamp(1, MAX_LATEST) as usize;
    let entries = source.entries(&feed.url).await?;

    let mut newest: Vec<NormalizedEntry> = entries.iter().take(count).map(parser::clean).collect();
    newest.reverse();
    Ok(newest)
}

pub async fn post_latest(
    database: &Database,
    source: &dyn Source,
    poster: &dyn Deliver,
    guild_id: u64,
    name: &str,
    count: i64,
    channel_id: u64,
) -> error::Result<usize> {
    let entries = latest(database, source, guild_id, name, count).await?;

    for entry in &entries {
        poster.deliver(channel_id, entry).await?;
    }
    Ok(entries.len())
}
