use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal::unix::SignalKind;
use tokio::{select, time};

use crate::config::DatabaseMode;
use crate::store::{MemoryUserStore, PgUserStore, UserStore};
use crate::utils::context::Context;
use crate::utils::logging;
use crate::utils::signal::SignalHandler;

mod api;
mod config;
mod database;
mod global;
mod mailer;
mod store;
mod utils;


#[tokio::main]
async fn main() -> Result<()> {
    let config = config::AppConfig::parse()?;

    logging::init(&config.logging.level, config.logging.json)?;

    if let Some(file) = &config.config_file {
        tracing::info!(file = file.as_str(), "loaded config from file");
    }

    tracing::debug!("config: {:#?}", config);

    let store: Arc<dyn UserStore> = match config.database.mode {
        DatabaseMode::Postgres => Arc::new(PgUserStore::connect(&config.database.uri).await?),
        DatabaseMode::Memory => {
            tracing::warn!("using the in-memory store, data will not survive a restart");
            Arc::new(MemoryUserStore::default())
        }
    };

    let (ctx, handler) = Context::new();

    let global = Arc::new(global::GlobalState::new(config, store, ctx));

    let api_future = tokio::spawn(api::run(global.clone()));

    // Listen on both sigint and sigterm and cancel the context when either is received
    let mut signal_handler = SignalHandler::new()
        .with_signal(SignalKind::interrupt())
        .with_signal(SignalKind::terminate());

    select! {
        r = api_future => tracing::error!("api stopped unexpectedly: {:?}", r),
        _ = signal_handler.recv() => tracing::info!("shutting down"),
    }

    // We cannot have a context in scope when we cancel the handler, otherwise it will deadlock.
    drop(global);

    // Cancel the context
    tracing::info!("waiting for tasks to finish");

    select! {
        _ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
        _ = signal_handler.recv() => tracing::warn!("force shutting down"),
        _ = handler.cancel() => tracing::info!("shutting down"),
    }

    Ok(())
}
