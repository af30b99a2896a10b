use anyhow::Context;
use clap::Parser;
use gridworld_server::{build_router, ServerConfig};
use parking_lot::Mutex;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gridworld_core=info,gridworld_server=info"));
    fmt().with_env_filter(filter).init();
}

/// Resolves once `signal` fires. If the hook cannot be installed the
/// server keeps running instead of stopping at once.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            warn!(error = %err, "cannot listen for ctrl-c; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = ServerConfig::parse();

    let sim = config.build_simulation()?;
    let grid = sim.grid();
    info!(
        width = grid.width(),
        height = grid.height(),
        resources = grid.resources().len(),
        models_dir = %config.models_dir.display(),
        "simulation ready"
    );

    let app = build_router(Arc::new(Mutex::new(sim)));
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!(addr = %config.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(tokio::signal::ctrl_c()))
        .await
        .context("server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_ends_the_wait() {
        wait_for_shutdown(async { Ok(()) }).await;
    }

    #[tokio::test]
    async fn failed_signal_hook_keeps_serving() {
        let wait = wait_for_shutdown(async { Err(io::Error::other("no signal support")) });
        let outcome = tokio::time::timeout(Duration::from_millis(50), wait).await;
        assert!(outcome.is_err(), "shutdown must not resolve without a signal");
    }
}
