use std::sync::Arc;

use anyhow::Context;

use toolrent_api::app::{self, services::AppServices};
use toolrent_infra::{AppConfig, MovementWorker};
use toolrent_inventory::MovementRecord;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    toolrent_observability::init();

    let config = AppConfig::from_env()?;
    let services = Arc::new(AppServices::in_memory(config.loans).context("invalid loan settings")?);

    // Ledger feed: every committed bucket mutation shows up here.
    let ledger = MovementWorker::spawn("movement-ledger", services.movements.as_ref(), |m: MovementRecord| {
        tracing::info!(
            tool_id = %m.tool_id,
            name = %m.name_snapshot,
            category = %m.category_snapshot,
            actor = %m.actor,
            kind = %m.kind,
            stock = m.stock,
            date = %m.date,
            "movement recorded"
        );
        Ok::<_, std::convert::Infallible>(())
    })
    .context("failed to start movement worker")?;

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    ledger.shutdown();
    Ok(())
}
