//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the
//! application context. Nothing in the controllers reads environment variables,
//! which keeps behaviour stable across test harnesses and long-running shells.

use crate::constants::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STATE_FILE};
use crate::error::{ClientError, ClientResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the dashboard reads and writes its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// In-memory offline backend seeded with sample data.
    Local,
    /// REST backend reachable at `base_url`.
    Remote { base_url: String },
}

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    data_source: DataSource,
    state_file: PathBuf,
    request_timeout: Duration,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if the remote base URL is not an
    /// `http`/`https` URL or the request timeout is zero.
    pub fn new(
        data_source: DataSource,
        state_file: PathBuf,
        request_timeout: Duration,
    ) -> ClientResult<Self> {
        let data_source = match data_source {
            DataSource::Remote { base_url } => DataSource::Remote {
                base_url: validate_base_url(&base_url)?,
            },
            DataSource::Local => DataSource::Local,
        };

        if request_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            data_source,
            state_file,
            request_timeout,
        })
    }

    /// Offline configuration with an explicit state file, used by tests and demos.
    pub fn local(state_file: PathBuf) -> Self {
        Self {
            data_source: DataSource::Local,
            state_file,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn data_source(&self) -> &DataSource {
        &self.data_source
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn validate_base_url(raw: &str) -> ClientResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ClientError::InvalidConfig(format!("invalid API URL '{trimmed}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::InvalidConfig(format!(
            "API URL must use http or https, got: {}",
            parsed.scheme()
        )));
    }

    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data source from the raw `PHARMASSIST_DATA_SOURCE` and
/// `PHARMASSIST_API_URL` values.
///
/// Without an explicit kind, a configured URL selects the remote backend and
/// its absence selects the offline one.
pub fn data_source_from_env_values(
    kind: Option<String>,
    api_url: Option<String>,
) -> ClientResult<DataSource> {
    let api_url = non_blank(api_url);

    match non_blank(kind).map(|k| k.to_ascii_lowercase()).as_deref() {
        Some("local") => Ok(DataSource::Local),
        Some("remote") => Ok(DataSource::Remote {
            base_url: api_url.unwrap_or_else(|| DEFAULT_API_BASE_URL.into()),
        }),
        Some(other) => Err(ClientError::InvalidConfig(format!(
            "unknown data source '{other}' (expected 'local' or 'remote')"
        ))),
        None => Ok(match api_url {
            Some(base_url) => DataSource::Remote { base_url },
            None => DataSource::Local,
        }),
    }
}

/// Parse the request timeout from an optional string value.
///
/// If `value` is `None` or blank, returns the default timeout.
pub fn request_timeout_from_env_value(value: Option<String>) -> ClientResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        Some(v) => {
            let secs: u64 = v.parse().map_err(|_| {
                ClientError::InvalidConfig(format!("request timeout '{v}' is not a number"))
            })?;
            Ok(Duration::from_secs(secs))
        }
    }
}

/// Resolve the state file path, falling back to [`DEFAULT_STATE_FILE`].
pub fn state_file_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
}
