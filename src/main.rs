mod bot;
mod config;
mod error;
mod model;
mod processor;
mod scheduler;
mod service;

use std::sync::Arc;

use serenity::http::Http;
use tracing_subscriber::EnvFilter;

use crate::bot::handler::Handler;
use crate::config::Config;
use crate::error::AppError;
use crate::processor::EventProcessor;
use crate::scheduler::role_refresh::{self, RefreshJob};
use crate::service::auto_roles::AutoRolesActions;
use crate::service::report::Reporter;
use crate::service::static_source::StaticSource;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let source = Arc::new(match &config.auto_roles_file {
        Some(path) => StaticSource::from_file(path)?,
        None => {
            tracing::warn!("AUTO_ROLES_FILE not set, reactions will not change any roles");
            StaticSource::default()
        }
    });

    // Processor callbacks run outside of any gateway event, so they get their
    // own HTTP client
    let http = Arc::new(Http::new(&config.discord_bot_token));

    let reporter = Reporter::new(http.clone(), config.report_channel);
    if config.report_channel.is_none() {
        tracing::warn!("REPORT_CHANNEL not set, role change reports will only be logged");
    }

    let actions = Arc::new(AutoRolesActions::new(
        http.clone(),
        config.clone(),
        source.clone(),
        source.clone(),
        reporter.clone(),
    ));
    let processor = Arc::new(EventProcessor::start(config.processor, actions));

    let handler = Handler::new(
        config.clone(),
        processor.clone(),
        source.clone(),
        source.clone(),
        reporter.clone(),
    );
    let client = bot::start::init_bot(&config, handler).await?;

    let mut scheduler = role_refresh::start_scheduler(
        &config.role_refresh_cron,
        RefreshJob {
            http: client.http.clone(),
            config: config.clone(),
            roles: source.clone(),
            nicknames: source,
            reporter,
        },
    )
    .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            shard_manager.shutdown_all().await;
        }
    });

    bot::start::start_bot(client).await?;

    // Let reactions queued before the gateway closed settle
    let grace = config.processor.quiescence_threshold + config.processor.rewake_delay * 2;
    match tokio::time::timeout(grace, processor.wait_for_idle()).await {
        Ok(result) => result?,
        Err(_) => tracing::warn!(
            "{} users still had pending reaction events at shutdown",
            processor.pending_users()
        ),
    }
    processor.shutdown();

    scheduler.shutdown().await?;

    Ok(())
}
