use std::sync::Arc;

use anyhow::Result;
use serenity::{all::CommandInteraction, prelude::*};
use tracing::info;

use crate::{
    cmd::{self, required_name, respond},
    data::Database,
};

pub async fn execute(
    ctx: &Context,
    command: &CommandInteraction,
    database: &Arc<Database>,
) -> Result<()> {
    let Some(guild_id) = cmd::guild(ctx, command).await? else {
        return Ok(());
    };
    if !cmd::check_permissions(ctx, command).await? {
        return Ok(());
    }

    let name = required_name(command)?;
    let outcome = database.remove(guild_id, &name).await.map(|()| {
        info!("Feed removed: {} in guild {}", name, guild_id);
        format!("Feed '{}' removed.", name)
    });

    respond(command, &ctx.http, &cmd::user_message(outcome)?).await
}
