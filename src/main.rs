use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;

use sharefile_bot::cli::{Cli, Commands};
use sharefile_bot::core::config::Config;
use sharefile_bot::service::{AdminService, AuthService, ChatService, FileService};
use sharefile_bot::state::{AwaitMarkerStore, RedisAwaitMarkerStore, RedisStateStore, StateStore, KEY_PREFIX};
use sharefile_bot::storage::{
    create_pool, migrate, ChatStore, DownloadStore, FileStore, PgChatStore, PgDownloadStore,
    PgFileStore, PgUserStore, UserStore,
};
use sharefile_bot::telegram::client::{BotMembershipClient, MembershipClient};
use sharefile_bot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init_timed();
    let _ = dotenv();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Migrate) => run_migrate().await,
        Some(Commands::Run { webhook }) => run_bot(webhook).await,
        None => run_bot(false).await,
    }
}

async fn run_migrate() -> Result<()> {
    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    migrate(&pool).await?;
    log::info!("schema applied");
    Ok(())
}

async fn run_bot(webhook: bool) -> Result<()> {
    let config = Config::from_env()?;

    let bot = create_bot()?;
    let me = bot.get_me().await?;
    let bot_username = me.username().to_owned();
    let bot_id = i64::try_from(me.id.0).unwrap_or_default();
    log::info!("authorized as @{}", bot_username);

    setup_bot_commands(&bot).await?;

    let pool = create_pool(&config.database_url).await?;
    migrate(&pool).await?;

    let redis_client = redis::Client::open(config.redis_url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let files: Arc<dyn FileStore> = Arc::new(PgFileStore::new(pool.clone()));
    let chats: Arc<dyn ChatStore> = Arc::new(PgChatStore::new(pool.clone()));
    let downloads: Arc<dyn DownloadStore> = Arc::new(PgDownloadStore::new(pool));

    let telegram: Arc<dyn MembershipClient> = Arc::new(BotMembershipClient::new(bot.clone()));
    let markers: Arc<dyn AwaitMarkerStore> =
        Arc::new(RedisAwaitMarkerStore::new(redis_conn.clone(), KEY_PREFIX));
    let state: Arc<dyn StateStore> = Arc::new(RedisStateStore::new(redis_conn, KEY_PREFIX));

    let deps = HandlerDeps {
        auth: Arc::new(AuthService::new(users.clone())),
        files: Arc::new(FileService::new(
            files.clone(),
            chats.clone(),
            downloads.clone(),
            telegram.clone(),
            markers,
        )),
        chats: Arc::new(ChatService::new(
            chats.clone(),
            files.clone(),
            downloads.clone(),
            telegram,
            bot_id,
            bot_username.clone(),
        )),
        admin: Arc::new(AdminService::new(users, files, chats, downloads)),
        state,
        bot_username,
    };

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema(deps)).enable_ctrlc_handler().build();

    if webhook {
        let url = config
            .webhook_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("WEBHOOK_URL is required with --webhook"))?;
        log::info!("listening for webhook updates on {}", config.bind_addr);
        let listener = webhooks::axum(bot, webhooks::Options::new(config.bind_addr, url)).await?;
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        log::info!("long polling for updates");
        dispatcher.dispatch().await;
    }
    Ok(())
}
