use crate::envelope::{parse_ack, parse_list, parse_login, rejection, Envelope};
use async_trait::async_trait;
use pharmassist_core::access::{
    DataAccess, DiagnosticEvent, LoginOutcome, SessionValidation, SubmissionAck,
};
use pharmassist_core::constants::SESSION_COOKIE_NAME;
use pharmassist_core::model::{Credentials, LoginIdentifier, Notification, Patient, Prescription};
use pharmassist_core::{ClientConfig, ClientError, ClientResult, DataSource};
use reqwest::cookie::Jar;
use reqwest::{IntoUrl, RequestBuilder};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LoginRequest<'a> {
    Username { username: &'a str, password: &'a str },
    Email { email: &'a str, password: &'a str },
}

impl<'a> From<&'a Credentials> for LoginRequest<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        let password = credentials.password.as_str();
        match &credentials.identifier {
            LoginIdentifier::Username(username) => LoginRequest::Username {
                username: username.as_str(),
                password,
            },
            LoginIdentifier::Email(email) => LoginRequest::Email {
                email: email.as_str(),
                password,
            },
        }
    }
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
}

fn network(e: reqwest::Error) -> ClientError {
    ClientError::NetworkFailure(e.to_string())
}

/// [`DataAccess`] over the dispensing unit's REST API.
pub struct RemoteBackend {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: String,
    origin: Url,
}

impl RemoteBackend {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - `http` or `https` URL of the device; a trailing slash is ignored.
    /// * `timeout` - Limit applied to connecting and to each whole request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the URL does not parse, uses another scheme,
    /// or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let cleaned = base_url.trim_end_matches('/');
        let origin = Url::parse(cleaned)
            .map_err(|e| ClientError::InvalidConfig(format!("invalid API URL '{cleaned}': {e}")))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "API URL must use http or https, got: {}",
                origin.scheme()
            )));
        }

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

        tracing::info!("++ Using PharmAssist API at {}", cleaned);

        Ok(Self {
            http,
            jar,
            base_url: cleaned.to_string(),
            origin,
        })
    }

    /// Build the backend named by a remote data source.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        match config.data_source() {
            DataSource::Remote { base_url } => Self::new(base_url, config.request_timeout()),
            DataSource::Local => Err(ClientError::InvalidConfig(
                "configuration selects the local data source".into(),
            )),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/{collection}/{id}/{action}` with `id` percent-encoded as a
    /// single path segment. Dot segments and empty ids have no such URL.
    fn resource_url(&self, collection: &str, id: &str, action: &str) -> Option<Url> {
        if matches!(id, "" | "." | "..") {
            return None;
        }
        let mut url = self.origin.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["api", collection, id, action]);
        Some(url)
    }

    fn set_session_cookie(&self, value: &str) {
        self.jar.add_cookie_str(value, &self.origin);
    }

    /// Send a request and return the body of a 2xx answer.
    async fn send(&self, request: RequestBuilder) -> ClientResult<String> {
        let response = request.send().await.map_err(network)?;
        let status = response.status();
        let body = response.text().await.map_err(network)?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(rejection(status.as_u16(), &body))
        }
    }

    async fn get_list<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        kind: &str,
    ) -> ClientResult<Vec<T>> {
        let body = self.send(self.http.get(self.url(path))).await?;
        parse_list(&body, kind)
    }

    async fn post<U: IntoUrl>(&self, url: U) -> ClientResult<Envelope> {
        let body = self.send(self.http.post(url)).await?;
        parse_ack(&body)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> ClientResult<Envelope> {
        let body = self
            .send(self.http.post(self.url(path)).json(payload))
            .await?;
        parse_ack(&body)
    }

    async fn sign_in(&self, path: &str, request: RequestBuilder) -> ClientResult<LoginOutcome> {
        let body = self.send(request).await?;
        let response = parse_login(&body)?;
        let user = response
            .user
            .ok_or_else(|| ClientError::ServerRejection("login response had no user".into()))?;

        if let Some(token) = &response.session_token {
            self.resume_session(token);
        }
        tracing::debug!("{} accepted: {}", path, response.message.unwrap_or_default());

        Ok(LoginOutcome {
            user,
            session_token: response.session_token,
        })
    }
}

#[async_trait]
impl DataAccess for RemoteBackend {
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginOutcome> {
        let request = self
            .http
            .post(self.url("/api/login"))
            .json(&LoginRequest::from(credentials));
        self.sign_in("/api/login", request).await
    }

    async fn register(&self, email: &str, password: &str) -> ClientResult<LoginOutcome> {
        let request = self
            .http
            .post(self.url("/api/register"))
            .json(&RegisterRequest { email, password });
        self.sign_in("/api/register", request).await
    }

    async fn logout(&self) -> ClientResult<()> {
        let result = self.post(self.url("/api/logout")).await.map(|_| ());
        self.set_session_cookie(&format!("{SESSION_COOKIE_NAME}=; Path=/; Max-Age=0"));
        result
    }

    fn resume_session(&self, token: &str) {
        self.set_session_cookie(&format!("{SESSION_COOKIE_NAME}={token}; Path=/"));
    }

    async fn validate_session(&self) -> ClientResult<SessionValidation> {
        match self
            .send(self.http.get(self.url("/api/validate-session")))
            .await
        {
            Ok(body) => serde_json::from_str(&body).map_err(|e| {
                ClientError::ServerRejection(format!("malformed session response: {e}"))
            }),
            Err(ClientError::Unauthenticated) => Ok(SessionValidation::default()),
            Err(e) => Err(e),
        }
    }

    async fn fetch_prescriptions(&self) -> ClientResult<Vec<Prescription>> {
        self.get_list("/api/prescriptions", "prescriptions").await
    }

    async fn fetch_notifications(&self) -> ClientResult<Vec<Notification>> {
        self.get_list("/api/notifications", "notifications").await
    }

    async fn fetch_patients(&self) -> ClientResult<Vec<Patient>> {
        self.get_list("/api/patients", "patients").await
    }

    async fn submit_prescription(&self, prescription: &Prescription) -> ClientResult<SubmissionAck> {
        let ack = self.post_json("/api/prescription", prescription).await?;
        Ok(SubmissionAck {
            message: ack.message,
            assigned_id: ack.id,
        })
    }

    async fn collect_prescription(&self, id: &str) -> ClientResult<()> {
        let url = self
            .resource_url("prescriptions", id, "collect")
            .ok_or_else(|| ClientError::UnknownPrescription(id.to_string()))?;
        self.post(url).await.map(|_| ())
    }

    async fn cancel_prescription(&self, id: &str) -> ClientResult<()> {
        let url = self
            .resource_url("prescriptions", id, "cancel")
            .ok_or_else(|| ClientError::UnknownPrescription(id.to_string()))?;
        self.post(url).await.map(|_| ())
    }

    async fn mark_notification_read(&self, id: &str) -> ClientResult<()> {
        let url = self
            .resource_url("notifications", id, "read")
            .ok_or_else(|| ClientError::UnknownNotification(id.to_string()))?;
        self.post(url).await.map(|_| ())
    }

    async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        self.post(self.url("/api/notifications/mark-all-read"))
            .await
            .map(|_| ())
    }

    async fn log_event(&self, event: &DiagnosticEvent) -> ClientResult<()> {
        self.post_json("/api/log", event).await.map(|_| ())
    }
}
