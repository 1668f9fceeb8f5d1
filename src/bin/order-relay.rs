//! # Order Relay Service
//!
//! Runs the HTTP gateway and both queue consumers in one process against
//! PostgreSQL (order table) and pgmq (stage queues). Stops on Ctrl-C.

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use order_relay::config::RelayConfig;
use order_relay::database::{run_migrations, OrderTableStore, PgOrderTable};
use order_relay::logging::init_structured_logging;
use order_relay::messaging::{OrderQueue, PgmqQueue};
use order_relay::relay::{FinalizeConsumer, QueueWorker, SeedConsumer};
use order_relay::web::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config = RelayConfig::load().context("loading configuration")?;

    let pool = PgOrderTable::connect_pool(&config.database)
        .await
        .with_context(|| format!("connecting to {}", config.redacted_database_url()))?;
    run_migrations(&pool).await.context("running migrations")?;

    let store: Arc<dyn OrderTableStore> =
        Arc::new(PgOrderTable::new(pool.clone(), config.table.name.clone())?);
    store.ensure_table().await.context("creating order table")?;

    let queue: Arc<dyn OrderQueue> = Arc::new(PgmqQueue::new_with_pool(pool.clone()).await);
    for queue_name in [&config.queues.orders, &config.queues.orders_finalize] {
        queue
            .create_queue(queue_name)
            .await
            .with_context(|| format!("creating queue {queue_name}"))?;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let seed_worker = Arc::new(QueueWorker::new(
        config.queues.orders.clone(),
        queue.clone(),
        Arc::new(SeedConsumer::new(
            store.clone(),
            queue.clone(),
            config.queues.orders_finalize.clone(),
        )),
        config.consumer.clone(),
    ));
    let finalize_worker = Arc::new(QueueWorker::new(
        config.queues.orders_finalize.clone(),
        queue.clone(),
        Arc::new(FinalizeConsumer::new(store.clone())),
        config.consumer.clone(),
    ));
    for worker in [&seed_worker, &finalize_worker] {
        info!(
            worker_id = %worker.worker_id(),
            queue = %worker.queue_name(),
            "🔁 Starting queue worker"
        );
    }
    let workers = vec![
        seed_worker.spawn(shutdown_rx.clone()),
        finalize_worker.spawn(shutdown_rx.clone()),
    ];

    let app_state = AppState::new(&config, store, queue);
    let auth_enabled = app_state.auth_enabled();
    let app = create_app(app_state);
    let listener = TcpListener::bind(&config.web.bind_address)
        .await
        .with_context(|| format!("binding {}", config.web.bind_address))?;

    info!(
        bind_address = %config.web.bind_address,
        auth_enabled,
        "🌐 Order relay listening"
    );

    let mut server_shutdown = shutdown_rx.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = server_shutdown.wait_for(|stop| *stop).await;
    });

    let signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown requested");
    };

    let mut server_task = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server_task => {
            result.context("joining HTTP server")?.context("serving HTTP")?;
        }
        _ = signal => {
            let _ = shutdown_tx.send(true);
            server_task
                .await
                .context("joining HTTP server")?
                .context("serving HTTP")?;
        }
    }

    let _ = shutdown_tx.send(true);
    for worker in workers {
        if let Err(e) = worker.await {
            error!(error = %e, "Queue worker task failed");
        }
    }

    pool.close().await;
    info!("👋 Order relay stopped");
    Ok(())
}
