//! HTTP surface of the weather stream service.

use domain::error::Error as DomainError;
use domain::gateway::open_meteo::OpenMeteoClient;
use domain::replay::load_campaign;
use domain::StreamDefaults;
use log::*;
use serde_json::Value;
use service::config::Config;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

mod controller;
mod error;
mod params;
pub mod router;
mod sse;

// Shared by every request handler. Clone must stay cheap since axum clones it
// per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stream_defaults: StreamDefaults,
    pub open_meteo: OpenMeteoClient,
    pub campaign: Arc<[Value]>,
    /// Root of every session's cancellation token. Cancelling it ends all
    /// open streams.
    pub shutdown: CancellationToken,
    active_sessions: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: Config, shutdown: CancellationToken) -> Result<Self, DomainError> {
        let open_meteo = OpenMeteoClient::new(&config)?;
        let campaign = load_campaign(&config)?;

        Ok(Self {
            stream_defaults: StreamDefaults::from_config(&config),
            open_meteo,
            campaign,
            shutdown,
            active_sessions: Arc::new(AtomicUsize::new(0)),
            config,
        })
    }

    /// Number of streams currently being fed.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }

    pub(crate) fn begin_session(&self) -> SessionGuard {
        let open = self.active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Stream session started, {open} open");
        SessionGuard {
            active_sessions: Arc::clone(&self.active_sessions),
        }
    }
}

/// Counts a session as open until dropped.
pub(crate) struct SessionGuard {
    active_sessions: Arc<AtomicUsize>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let open = self.active_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!("Stream session ended, {open} open");
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{}:{}", interface, app_state.config.port);
    let shutdown = app_state.shutdown.clone();

    let listener = TcpListener::bind(&server_url).await?;
    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, router::define_routes(app_state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_guard_tracks_open_sessions() {
        let state = AppState::new(Config::default(), CancellationToken::new()).unwrap();

        let first = state.begin_session();
        let second = state.clone().begin_session();
        assert_eq!(state.active_sessions(), 2);

        drop(first);
        assert_eq!(state.active_sessions(), 1);
        drop(second);
        assert_eq!(state.active_sessions(), 0);
    }

    #[test]
    fn test_new_loads_builtin_campaign() {
        let state = AppState::new(Config::default(), CancellationToken::new()).unwrap();
        assert_eq!(state.campaign.len(), 3);
        assert_eq!(state.stream_defaults.interval_secs, 30);
    }
}
