//! Process bootstrap: connect dependencies, start background tasks, serve,
//! and tear everything down in order.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use petstore_auth::SessionStore;
use petstore_infra::{db, storage, workers};
use petstore_invoicing::InvoiceRenderer;

use crate::app::{self, services::AppServices};
use crate::config::Config;

pub async fn run(config: Config) -> anyhow::Result<()> {
    let pool = db::connect(&config.db.postgres)
        .await
        .context("failed to connect to postgres")?;
    db::migrations::run(&pool)
        .await
        .context("failed to run migrations")?;

    let storage = storage::connect(&config.storage)
        .await
        .context("failed to connect to object storage")?;

    let renderer = match &config.workers.invoice.template {
        Some(path) => InvoiceRenderer::from_file(path),
        None => InvoiceRenderer::new(),
    }
    .context("failed to load invoice template")?;

    let sessions = Arc::new(SessionStore::from_config(&config.auth));
    let services = Arc::new(AppServices::postgres(
        pool,
        Arc::clone(&storage),
        Arc::clone(&sessions),
        config.auth.bcrypt_cost,
    ));

    let background = CancellationToken::new();
    let sweeper = sessions.spawn_sweeper(config.auth.ttl, background.child_token());
    let archive = config
        .workers
        .invoice
        .archive
        .then(|| Arc::clone(&services.invoices));
    let invoices = workers::dispatch_invoice_worker(
        &config.workers.invoice,
        Arc::clone(&services.orders),
        storage,
        Arc::new(renderer),
        archive,
    );

    let addr = config.server.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    let served = axum::serve(listener, app::build_app(services))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    invoices.stop();
    background.cancel();
    let drained = tokio::time::timeout(config.server.shutdown_timeout, async {
        invoices.shutdown().await;
        if let Err(e) = sweeper.await {
            error!(error = %e, "session sweeper panicked");
        }
    })
    .await;
    if drained.is_err() {
        warn!(
            timeout_ms = config.server.shutdown_timeout.as_millis() as u64,
            "background tasks did not stop in time"
        );
    }

    served.context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
