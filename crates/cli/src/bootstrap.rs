//! Process setup shared by the one-shot binary and the interactive shell.

use crate::terminal::TerminalSurface;
use pharmassist_api_client::RemoteBackend;
use pharmassist_core::config::{
    data_source_from_env_values, request_timeout_from_env_value, state_file_from_env_value,
};
use pharmassist_core::{
    AppContext, ClientConfig, ClientResult, Dashboard, DataAccess, DataSource, FileStorage,
    LocalBackend, PersistedStorage,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber. Logs go to stderr so that command output
/// on stdout stays clean.
///
/// # Errors
///
/// Returns an error if the default filter directive does not parse.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pharmassist=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

/// Resolve the client configuration from the process environment.
///
/// # Environment Variables
/// - `PHARMASSIST_DATA_SOURCE`: `local` or `remote`
/// - `PHARMASSIST_API_URL`: Device base URL (default: "http://192.168.4.1")
/// - `PHARMASSIST_STATE_FILE`: Persisted client state (default: ".pharmassist/state.json")
/// - `PHARMASSIST_REQUEST_TIMEOUT_SECS`: Request timeout in seconds (default: 10)
///
/// # Errors
///
/// Returns `InvalidConfig` for an unknown data source, a malformed URL or a
/// non-numeric or zero timeout.
pub fn config_from_env() -> ClientResult<ClientConfig> {
    let data_source = data_source_from_env_values(
        std::env::var("PHARMASSIST_DATA_SOURCE").ok(),
        std::env::var("PHARMASSIST_API_URL").ok(),
    )?;
    let request_timeout =
        request_timeout_from_env_value(std::env::var("PHARMASSIST_REQUEST_TIMEOUT_SECS").ok())?;
    let state_file = state_file_from_env_value(std::env::var("PHARMASSIST_STATE_FILE").ok());

    ClientConfig::new(data_source, state_file, request_timeout)
}

/// The data access implementation selected by `config`.
pub fn build_access(config: &ClientConfig) -> ClientResult<Arc<dyn DataAccess>> {
    match config.data_source() {
        DataSource::Local => {
            tracing::info!("++ Using offline sample data");
            Ok(Arc::new(LocalBackend::with_sample_data()))
        }
        DataSource::Remote { .. } => Ok(Arc::new(RemoteBackend::from_config(config)?)),
    }
}

/// A dashboard wired to the terminal.
pub struct Client {
    dashboard: Dashboard,
    terminal: Arc<TerminalSurface>,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        access: Arc<dyn DataAccess>,
        storage: Arc<dyn PersistedStorage>,
    ) -> Self {
        let terminal = Arc::new(TerminalSurface::new());
        let ctx = AppContext::new(config, access, terminal.clone(), storage);
        Self {
            dashboard: Dashboard::new(ctx),
            terminal,
        }
    }

    /// Build the backend and file storage named by `config`.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let access = build_access(&config)?;
        let storage = Arc::new(FileStorage::new(config.state_file()));
        Ok(Self::new(config, access, storage))
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn terminal(&self) -> &TerminalSurface {
        &self.terminal
    }
}
