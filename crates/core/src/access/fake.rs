//! Test backend that wraps [`LocalBackend`] and fails chosen operations.

use super::{DataAccess, DiagnosticEvent, LocalBackend, LoginOutcome, SessionValidation, SubmissionAck};
use crate::error::{ClientError, ClientResult};
use crate::model::{Credentials, Notification, Patient, Prescription};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) enum Fault {
    Network(String),
    Rejected(String),
}

impl Fault {
    fn to_error(&self) -> ClientError {
        match self {
            Fault::Network(m) => ClientError::NetworkFailure(m.clone()),
            Fault::Rejected(m) => ClientError::ServerRejection(m.clone()),
        }
    }
}

#[derive(Default)]
pub(crate) struct FaultyBackend {
    inner: LocalBackend,
    faults: Mutex<HashMap<&'static str, Fault>>,
    validation: Mutex<Option<SessionValidation>>,
    resumed: Mutex<Vec<String>>,
}

impl FaultyBackend {
    pub(crate) fn wrapping(inner: LocalBackend) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Make `operation` fail until [`FaultyBackend::heal`] is called.
    pub(crate) fn fail(&self, operation: &'static str, fault: Fault) {
        self.faults.lock().unwrap().insert(operation, fault);
    }

    pub(crate) fn heal(&self, operation: &'static str) {
        self.faults.lock().unwrap().remove(operation);
    }

    /// Answer session validation with `validation` instead of asking the
    /// wrapped backend.
    pub(crate) fn answer_validation(&self, validation: SessionValidation) {
        *self.validation.lock().unwrap() = Some(validation);
    }

    pub(crate) fn resumed_tokens(&self) -> Vec<String> {
        self.resumed.lock().unwrap().clone()
    }

    fn check(&self, operation: &'static str) -> ClientResult<()> {
        match self.faults.lock().unwrap().get(operation) {
            Some(fault) => Err(fault.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataAccess for FaultyBackend {
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginOutcome> {
        self.check("login")?;
        self.inner.login(credentials).await
    }

    async fn register(&self, email: &str, password: &str) -> ClientResult<LoginOutcome> {
        self.check("register")?;
        self.inner.register(email, password).await
    }

    async fn logout(&self) -> ClientResult<()> {
        self.check("logout")?;
        self.inner.logout().await
    }

    fn resume_session(&self, token: &str) {
        self.resumed.lock().unwrap().push(token.to_string());
        self.inner.resume_session(token);
    }

    async fn validate_session(&self) -> ClientResult<SessionValidation> {
        self.check("validate_session")?;
        let answer = self.validation.lock().unwrap().clone();
        match answer {
            Some(validation) => Ok(validation),
            None => self.inner.validate_session().await,
        }
    }

    async fn fetch_prescriptions(&self) -> ClientResult<Vec<Prescription>> {
        self.check("fetch_prescriptions")?;
        self.inner.fetch_prescriptions().await
    }

    async fn fetch_notifications(&self) -> ClientResult<Vec<Notification>> {
        self.check("fetch_notifications")?;
        self.inner.fetch_notifications().await
    }

    async fn fetch_patients(&self) -> ClientResult<Vec<Patient>> {
        self.check("fetch_patients")?;
        self.inner.fetch_patients().await
    }

    async fn submit_prescription(&self, prescription: &Prescription) -> ClientResult<SubmissionAck> {
        self.check("submit_prescription")?;
        self.inner.submit_prescription(prescription).await
    }

    async fn collect_prescription(&self, id: &str) -> ClientResult<()> {
        self.check("collect_prescription")?;
        self.inner.collect_prescription(id).await
    }

    async fn cancel_prescription(&self, id: &str) -> ClientResult<()> {
        self.check("cancel_prescription")?;
        self.inner.cancel_prescription(id).await
    }

    async fn mark_notification_read(&self, id: &str) -> ClientResult<()> {
        self.check("mark_notification_read")?;
        self.inner.mark_notification_read(id).await
    }

    async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        self.check("mark_all_notifications_read")?;
        self.inner.mark_all_notifications_read().await
    }

    async fn log_event(&self, event: &DiagnosticEvent) -> ClientResult<()> {
        self.check("log_event")?;
        self.inner.log_event(event).await
    }
}
