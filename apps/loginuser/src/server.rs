//! Server assembly: store, seeds, background sweeping and the listener.

use crate::api::{AppState, create_router};
use crate::auth::{AuthState, now};
use crate::cli::{CliError, load_seed_file};
use crate::config::ServerConfig;
use loginuser_core::{MemoryStore, Resolver, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Validate `config`, create the store and load any seeded sessions.
pub fn build_state(config: &ServerConfig) -> Result<AppState, CliError> {
    config.validate()?;

    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new(config.max_sessions));
    if let Some(path) = &config.seeds {
        let records = load_seed_file(path, now(), config.session.ttl_secs)?;
        let count = records.len();
        if count > config.max_sessions {
            return Err(CliError::TooManySeeds {
                path: path.clone(),
                count,
                capacity: config.max_sessions,
            });
        }
        for record in records {
            store.save(record)?;
        }
        tracing::info!(count, path = %path.display(), "seeded sessions");
    }

    let resolver = Resolver::new(store, config.session);
    let auth = AuthState::new(resolver, config.cookie_name.as_str(), config.failure_policy);
    Ok(AppState::new(auth))
}

/// Periodically drop expired sessions from `store`.
///
/// The first sweep happens one full interval after spawning.
pub fn spawn_purge_task(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired(now()) {
                Ok(0) => {}
                Ok(purged) => {
                    let remaining = store.len().ok();
                    tracing::debug!(purged, ?remaining, "swept expired sessions");
                }
                Err(err) => tracing::warn!(error = %err, "expired-session sweep failed"),
            }
        }
    })
}

/// Run the HTTP server until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), CliError> {
    let state = build_state(&config)?;

    let sweeper = (config.purge_interval_secs > 0).then(|| {
        spawn_purge_task(
            Arc::clone(state.auth.resolver().store()),
            Duration::from_secs(config.purge_interval_secs),
        )
    });

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| CliError::Bind {
            addr: config.bind,
            source,
        })?;
    tracing::info!(
        addr = %config.bind,
        cookie = %config.cookie_name,
        ttl_secs = config.session.ttl_secs,
        sliding = config.session.sliding,
        policy = ?config.failure_policy,
        "loginuser listening"
    );

    let result = axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(CliError::Server);

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("server stopped");
    result
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
