use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use taskboard_core::{BoardRegistry, Settings};
use taskboard_core::impls::{RestTaskStore, SupabaseSessionResolver};
use taskboard_core::observability::init_tracing;
use taskboard_core::ports::SystemClock;
use taskboard_web::{AppState, serve};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings from TASKBOARD__* variables")?;
    init_tracing(&settings.log.level)?;

    let store_config = settings.store_config().context("invalid store settings")?;
    info!(url = %store_config.url, table = %store_config.table, "using remote store");

    let clock = Arc::new(SystemClock);
    let store = RestTaskStore::new(store_config.clone());
    let resolver = SupabaseSessionResolver::new(store_config, clock.clone());
    info!(cookie = resolver.cookie_name(), "session cookie");

    let boards = BoardRegistry::new(Arc::new(store), clock).with_limits(
        Duration::seconds(settings.views.idle_secs),
        settings.views.max_views,
    );
    let state = AppState::new(boards, Arc::new(resolver));
    serve(&settings.server, state).await
}
