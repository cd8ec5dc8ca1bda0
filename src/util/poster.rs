use std::sync::Arc;

use async_trait::async_trait;
use chrono::FixedOffset;
use serenity::all::{ChannelId, CreateEmbed, CreateEmbedFooter, CreateMessage, Http};

use crate::{
    error::{FeedError, Result},
    util::{parser::NormalizedEntry, truncate},
};

const EMBED_COLOR: u32 = 0xb4befe;
const MAX_TITLE_CHARS: usize = 256;

/// Where new entries get sent.
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, channel_id: u64, entry: &NormalizedEntry) -> Result<()>;
}

pub struct ChannelPoster {
    http: Arc<Http>,
    offset: FixedOffset,
}

impl ChannelPoster {
    pub fn new(http: Arc<Http>, offset: FixedOffset) -> Self {
        Self { http, offset }
    }
}

#[async_trait]
impl Deliver for ChannelPoster {
    async fn deliver(&self, channel_id: u64, entry: &NormalizedEntry) -> Result<()> {
        let message = CreateMessage::new().embed(embed(entry, self.offset));

        ChannelId::new(channel_id)
            .send_message(&self.http, message)
            .await
            .map_err(|e| FeedError::Delivery {
                channel_id,
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

pub fn embed(entry: &NormalizedEntry, offset: FixedOffset) -> CreateEmbed {
    let description = if entry.body.is_empty() {
        "No description available."
    } else {
        entry.body.as_str()
    };

    let mut embed = CreateEmbed::new()
        .title(truncate(&entry.title, MAX_TITLE_CHARS))
        .description(description)
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new(format!("Published: {}", published(entry, offset))));

    if let Some(link) = &entry.link {
        embed = embed.url(link);
    }

    if let Some(published) = entry.published {
        embed = embed.timestamp(published);
    }

    embed
}

fn published(entry: &NormalizedEntry, offset: FixedOffset) -> String {
    entry
        .published
        .map(|at| at.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}
