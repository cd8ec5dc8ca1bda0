use std::sync::Arc;

use anyhow::Result;
use chrono::FixedOffset;
use rss_johnny::{
    cmd,
    config::Config,
    data::Database,
    scheduler::{self, Poller, SystemClock},
    util::{
        fetcher::{HttpSource, Source},
        poster::ChannelPoster,
    },
};
use serenity::{
    all::{ActivityData, Command, Interaction, OnlineStatus, Ready},
    async_trait,
    prelude::*,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Handler {
    database: Arc<Database>,
    source: Arc<dyn Source>,
    offset: FixedOffset,
}

impl Handler {
    async fn update(&self, ctx: &Context) {
        match self.database.feeds().await {
            Ok(feeds) => {
                let count = feeds.len();
                let activity = ActivityData::watching(format!("{} feeds", count));
                ctx.set_presence(Some(activity), OnlineStatus::Online);
                info!("Updated status: Watching {} feeds", count);
            }
            Err(e) => error!("Failed to get feed count for status: {}", e),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            let source = self.source.as_ref();
            let result = match command.data.name.as_str() {
                "addfeed" => {
                    let result = cmd::add::execute(&ctx, &command, &self.database, source).await;
                    self.update(&ctx).await;
                    result
                }
                "editfeed" => cmd::edit::execute(&ctx, &command, &self.database, source).await,
                "removefeed" => {
                    let result = cmd::remove::execute(&ctx, &command, &self.database).await;
                    self.update(&ctx).await;
                    result
                }
                "listfeeds" => cmd::list::execute(&ctx, &command, &self.database).await,
                "latest" => {
                    cmd::latest::execute(&ctx, &command, &self.database, source, self.offset).await
                }
                _ => Ok(()),
            };

            if let Err(e) = result {
                error!("Command error: {}", e);
                if let Err(e) = cmd::report_failure(&command, &ctx.http).await {
                    error!("Failed to report command error: {}", e);
                }
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        self.update(&ctx).await;

        if let Err(e) = Command::set_global_commands(&ctx.http, cmd::commands()).await {
            error!("Failed to set commands: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let database = Arc::new(Database::connect(&config.database_url).await?);
    let source: Arc<dyn Source> = Arc::new(HttpSource::new()?);

    let mut client = Client::builder(&config.token, GatewayIntents::GUILDS)
        .event_handler(Handler {
            database: database.clone(),
            source: source.clone(),
            offset: config.offset,
        })
        .await?;

    let poller = Poller {
        database,
        source,
        poster: Arc::new(ChannelPoster::new(client.http.clone(), config.offset)),
        clock: Arc::new(SystemClock),
        max_posts: config.max_posts,
        fetch_timeout: scheduler::FETCH_TIMEOUT,
    };
    tokio::spawn(scheduler::run(poller, config.tick));

    client.start().await?;
    Ok(())
}
