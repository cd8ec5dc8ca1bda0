pub mod add;
pub mod edit;
pub mod latest;
pub mod list;
pub mod remove;

use anyhow::Result;
use serenity::{
    all::{
        ChannelId, ChannelType, CommandInteraction, CommandOptionType, CreateCommand,
        CreateCommandOption, CreateInteractionResponse, CreateInteractionResponseMessage,
        EditInteractionResponse, Http, Permissions,
    },
    prelude::*,
};

use crate::error::FeedError;

pub const COMMAND_FAILED: &str = "An error occurred while processing the command.";

pub fn commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("addfeed")
            .description("Add a new RSS feed")
            .default_member_permissions(Permissions::MANAGE_GUILD)
            .add_option(name_option())
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "url", "RSS feed URL")
                    .required(true),
            )
            .add_option(channel_option("Channel to post new items to").required(true))
            .add_option(interval_option("Seconds between checks (60-86400, default 600)")),
        CreateCommand::new("editfeed")
            .description("Edit an existing feed")
            .default_member_permissions(Permissions::MANAGE_GUILD)
            .add_option(name_option())
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "url",
                "New RSS feed URL",
            ))
            .add_option(channel_option("New channel to post to"))
            .add_option(interval_option("New number of seconds between checks")),
        CreateCommand::new("removefeed")
            .description("Remove a feed")
            .default_member_permissions(Permissions::MANAGE_GUILD)
            .add_option(name_option()),
        CreateCommand::new("listfeeds").description("List configured feeds"),
        CreateCommand::new("latest")
            .description("Post latest items from a feed")
            .add_option(name_option())
            .add_option(CreateCommandOption::new(
                CommandOptionType::Integer,
                "count",
                "Number of items to post (1-5, default 1)",
            )),
    ]
}

fn name_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "name", "Feed name").required(true)
}

fn channel_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Channel, "channel", description)
        .channel_types(vec![ChannelType::Text, ChannelType::News])
}

fn interval_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Integer, "interval_seconds", description)
}

pub(crate) fn string_option(command: &CommandInteraction, name: &str) -> Option<String> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn integer_option(command: &CommandInteraction, name: &str) -> Option<i64> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_i64())
}

pub(crate) fn channel(command: &CommandInteraction, name: &str) -> Option<ChannelId> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_channel_id())
}

pub(crate) fn required_name(command: &CommandInteraction) -> Result<String> {
    string_option(command, "name").ok_or_else(|| anyhow::anyhow!("Feed name is required"))
}

/// The guild a command was used in. Answers the caller and returns `None`
/// when the command came from a DM.
pub(crate) async fn guild(ctx: &Context, command: &CommandInteraction) -> Result<Option<u64>> {
    match command.guild_id {
        Some(guild_id) => Ok(Some(guild_id.get())),
        None => {
            respond(command, &ctx.http, "This command can only be used in a server.").await?;
            Ok(None)
        }
    }
}

pub(crate) async fn check_permissions(ctx: &Context, command: &CommandInteraction) -> Result<bool> {
    let allowed = command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .is_some_and(|permissions| permissions.administrator() || permissions.manage_guild());

    if !allowed {
        respond(
            command,
            &ctx.http,
            "You need the **Manage Server** permission to manage feeds.",
        )
        .await?;
    }
    Ok(allowed)
}

pub(crate) async fn respond(command: &CommandInteraction, http: &Http, content: &str) -> Result<()> {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    command.create_response(http, response).await?;
    Ok(())
}

pub(crate) async fn defer_response(command: &CommandInteraction, http: &Http) -> Result<()> {
    let response =
        CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new().ephemeral(true));
    command.create_response(http, response).await?;
    Ok(())
}

pub(crate) async fn edit_reply(command: &CommandInteraction, http: &Http, content: &str) -> Result<()> {
    let edit_response = EditInteractionResponse::new().content(content);
    command.edit_response(http, edit_response).await?;
    Ok(())
}

/// Tells the caller a command failed. Deferred commands have already been
/// acknowledged, so the reply falls back to editing the pending response.
pub async fn report_failure(command: &CommandInteraction, http: &Http) -> Result<()> {
    if command.create_response(http, failure_response()).await.is_ok() {
        return Ok(());
    }
    command.edit_response(http, failure_edit()).await?;
    Ok(())
}

fn failure_response() -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(COMMAND_FAILED)
            .ephemeral(true),
    )
}

fn failure_edit() -> EditInteractionResponse {
    EditInteractionResponse::new().content(COMMAND_FAILED)
}

/// Shows domain errors to the caller and hands anything else back for the
/// generic error path.
pub(crate) fn user_message(outcome: std::result::Result<String, FeedError>) -> Result<String> {
    match outcome {
        Ok(message) => Ok(message),
        Err(e) if e.is_user_facing() => Ok(e.to_string()),
        Err(e) => Err(e.into()),
    }
}
