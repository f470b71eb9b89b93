//! Data-access capability.
//!
//! Every controller talks to the backend through [`DataAccess`]. The REST
//! implementation lives in the `pharmassist-api-client` crate; the offline
//! [`LocalBackend`] lives here. Which one is used is decided by configuration
//! at the composition root.

#[cfg(test)]
pub(crate) mod fake;
mod local;

pub use local::LocalBackend;

use crate::error::ClientResult;
use crate::model::{Credentials, Notification, Patient, Prescription, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Answer of the session validation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionValidation {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Identity and token returned by a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user: User,
    pub session_token: Option<String>,
}

/// Backend acknowledgement of a submitted prescription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionAck {
    pub message: Option<String>,
    /// Identifier assigned by the backend, when it reports one.
    pub assigned_id: Option<String>,
}

/// Client-side diagnostic event forwarded to the backend log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEvent {
    pub context: String,
    pub details: serde_json::Value,
}

impl DiagnosticEvent {
    pub fn new(context: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            context: context.into(),
            details,
        }
    }
}

#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginOutcome>;

    async fn register(&self, email: &str, password: &str) -> ClientResult<LoginOutcome>;

    async fn logout(&self) -> ClientResult<()>;

    /// Re-install a persisted session token before validating it.
    fn resume_session(&self, token: &str);

    async fn validate_session(&self) -> ClientResult<SessionValidation>;

    async fn fetch_prescriptions(&self) -> ClientResult<Vec<Prescription>>;

    async fn fetch_notifications(&self) -> ClientResult<Vec<Notification>>;

    async fn fetch_patients(&self) -> ClientResult<Vec<Patient>>;

    async fn submit_prescription(&self, prescription: &Prescription) -> ClientResult<SubmissionAck>;

    async fn collect_prescription(&self, id: &str) -> ClientResult<()>;

    async fn cancel_prescription(&self, id: &str) -> ClientResult<()>;

    async fn mark_notification_read(&self, id: &str) -> ClientResult<()>;

    async fn mark_all_notifications_read(&self) -> ClientResult<()>;

    async fn log_event(&self, event: &DiagnosticEvent) -> ClientResult<()>;
}
