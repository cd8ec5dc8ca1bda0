use std::sync::Arc;

use anyhow::Result;
use serenity::{
    all::{
        CommandInteraction, CreateEmbed, CreateInteractionResponse,
        CreateInteractionResponseMessage,
    },
    prelude::*,
};

use crate::{
    cmd::{self, respond},
    data::{Database, models::Feed},
    util::truncate,
};

const MAX_DESCRIPTION: usize = 4096;

pub async fn execute(
    ctx: &Context,
    command: &CommandInteraction,
    database: &Arc<Database>,
) -> Result<()> {
    let Some(guild_id) = cmd::guild(ctx, command).await? else {
        return Ok(());
    };

    let feeds = database.guild(guild_id).await?;
    if feeds.is_empty() {
        return respond(command, &ctx.http, "No feeds configured.").await;
    }

    let embed = CreateEmbed::new()
        .title("RSS Feeds")
        .description(describe(&feeds))
        .color(0x7289da);

    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .embed(embed)
            .ephemeral(true),
    );
    command.create_response(&ctx.http, response).await?;
    Ok(())
}

pub fn describe(feeds: &[Feed]) -> String {
    let mut description = String::new();

    for feed in feeds {
        description.push_str(&format!(
            "{} | <#{}> | every {}s\n",
            feed.name, feed.channel_id, feed.interval_seconds
        ));
    }

    let total = format!("\nTotal: {} feeds configured", feeds.len());
    let room = MAX_DESCRIPTION - total.chars().count();
    if description.chars().count() > room {
        description = truncate(&description, room - 1) + "\n";
    }

    description.push_str(&total);
    description
}
