// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `intervox serve` command implementation.
//!
//! Wires the Gemini gateway, session registry, connection manager, and
//! persistence worker together and runs the realtime server until SIGINT
//! or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use intervox_config::IntervoxConfig;
use intervox_core::{AiGateway, IntervoxError};
use intervox_gemini::GeminiClient;
use intervox_realtime::{start_server, ConnectionManager, RealtimeState, ServerConfig};
use intervox_session::{event_channel, spawn_persistence_worker, SessionRegistry};

use crate::store::FileStore;

/// How long shutdown waits for the persistence worker to drain.
const PERSISTENCE_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the `intervox serve` command.
pub async fn run_serve(config: IntervoxConfig) -> Result<(), IntervoxError> {
    init_tracing(&config.agent.log_level);

    info!("starting intervox serve");

    let gateway: Arc<dyn AiGateway> = {
        let client = GeminiClient::from_config(&config.gemini).map_err(|e| {
            eprintln!(
                "error: Gemini API key required. Set via config or INTERVOX_GEMINI_API_KEY."
            );
            e
        })?;
        Arc::new(client)
    };

    let store = FileStore::open(&config.storage.data_dir).await?;
    let (events, events_rx) = event_channel();
    let persistence = spawn_persistence_worker(events_rx, store.clone(), store.clone());

    let registry = Arc::new(SessionRegistry::new());
    let connections = Arc::new(ConnectionManager::new());

    let state = RealtimeState {
        registry: registry.clone(),
        connections: connections.clone(),
        gateway,
        profiles: store,
        events,
        history_window: config.session.history_window,
        start_time: std::time::Instant::now(),
    };

    let shutdown = install_signal_handler();
    let sweeper = spawn_idle_sweeper(
        registry.clone(),
        connections.clone(),
        &config,
        shutdown.clone(),
    );

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    tokio::select! {
        result = start_server(&server_config, state) => result?,
        _ = shutdown.cancelled() => {
            info!("shutdown signal received, stopping server");
        }
    }

    // Drop every event sender so the persistence worker can drain and exit.
    sweeper.abort();
    let _ = sweeper.await;
    drop(registry);
    drop(connections);
    if tokio::time::timeout(PERSISTENCE_DRAIN_TIMEOUT, persistence)
        .await
        .is_err()
    {
        warn!("persistence worker did not drain in time");
    }

    info!("intervox serve stopped");
    Ok(())
}

/// Periodically cancels and evicts sessions idle past the configured
/// timeout, closing their connections.
fn spawn_idle_sweeper(
    registry: Arc<SessionRegistry>,
    connections: Arc<ConnectionManager>,
    config: &IntervoxConfig,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let idle_timeout = chrono::Duration::seconds(config.session.idle_timeout_secs as i64);
    let sweep_interval = Duration::from_secs(config.session.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let evicted = registry.evict_idle(idle_timeout).await;
                    for id in &evicted {
                        connections.close_session(id);
                    }
                    if !evicted.is_empty() {
                        info!(count = evicted.len(), "evicted idle sessions");
                    }
                }
            }
        }
        debug!("idle sweeper stopped");
    })
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    token_clone.cancel();
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("intervox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
