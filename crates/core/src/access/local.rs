//! Offline, in-memory backend.
//!
//! Behaves like the dispensing unit's REST service closely enough for the
//! dashboard to run without a network: it assigns canonical prescription ids,
//! validates status transitions and raises the same pharmacy notifications.

use super::{DataAccess, DiagnosticEvent, LoginOutcome, SessionValidation, SubmissionAck};
use crate::constants::{DEFAULT_DISPENSER, PRESCRIPTION_ID_PREFIX};
use crate::error::{ClientError, ClientResult};
use crate::model::{
    parse_prescription_sequence, Credentials, LoginIdentifier, Notification,
    NotificationPriority, NotificationType, Patient, Prescription, PrescriptionStatus, Priority,
    User,
};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

const SAMPLE_DATA: &str = include_str!("sample_data.json");

#[derive(Debug, Default, Deserialize)]
struct LocalState {
    #[serde(skip)]
    signed_in: Option<User>,
    #[serde(skip)]
    token: Option<String>,
    #[serde(default)]
    prescriptions: Vec<Prescription>,
    #[serde(default)]
    notifications: Vec<Notification>,
    #[serde(default)]
    patients: Vec<Patient>,
}

/// In-memory [`DataAccess`].
///
/// `validate_session` reports valid whenever a token is installed, whether it
/// came from a login or from `resume_session`; a restored session is never
/// rejected in local mode.
#[derive(Debug, Default)]
pub struct LocalBackend {
    state: Mutex<LocalState>,
}

impl LocalBackend {
    /// An empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend seeded with the demo ward's orders, alerts and patients.
    pub fn with_sample_data() -> Self {
        let state = match serde_json::from_str::<LocalState>(SAMPLE_DATA) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("failed to parse bundled sample data: {}", e);
                LocalState::default()
            }
        };

        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with_records(
        prescriptions: Vec<Prescription>,
        notifications: Vec<Notification>,
        patients: Vec<Patient>,
    ) -> Self {
        Self {
            state: Mutex::new(LocalState {
                prescriptions,
                notifications,
                patients,
                ..LocalState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn sign_in(&self, user: User) -> LoginOutcome {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut state = self.lock();
        state.signed_in = Some(user.clone());
        state.token = Some(token.clone());
        tracing::info!("local session opened for {}", user.name);

        LoginOutcome {
            user,
            session_token: Some(token),
        }
    }

    fn transition(
        &self,
        id: &str,
        next: PrescriptionStatus,
    ) -> ClientResult<(String, String, String)> {
        let mut state = self.lock();
        let rx = state
            .prescriptions
            .iter_mut()
            .find(|rx| rx.id == id)
            .ok_or_else(|| ClientError::UnknownPrescription(id.to_string()))?;

        if !rx.status.can_transition_to(next) {
            return Err(ClientError::InvalidTransition {
                from: rx.status,
                to: next,
            });
        }

        rx.status = next;
        rx.completed_date = Some(Self::today());
        if next == PrescriptionStatus::Dispensed {
            rx.dispensed_by = Some(DEFAULT_DISPENSER.to_string());
        }

        Ok((
            rx.id.clone(),
            rx.patient_name.clone(),
            medication_names(rx),
        ))
    }

    fn push_notification(
        state: &mut LocalState,
        title: &str,
        content: String,
        kind: NotificationType,
        priority: NotificationPriority,
        related_order_id: &str,
    ) {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        state.notifications.insert(
            0,
            Notification {
                id: format!("NOTIF-{}", &suffix[..9]),
                title: title.to_string(),
                content,
                kind,
                priority,
                time_label: "Just now".into(),
                read: false,
                action_required: false,
                related_order_id: Some(related_order_id.to_string()),
            },
        );
    }
}

fn medication_names(rx: &Prescription) -> String {
    rx.medications
        .iter()
        .map(|m| m.medication_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `smith.j@ward.org` -> `Smith.j`
fn display_name(identifier: &str) -> String {
    let local = identifier.split('@').next().unwrap_or_default();
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn random_license() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("MD-{n:09}")
}

#[async_trait]
impl DataAccess for LocalBackend {
    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginOutcome> {
        let identifier = credentials.identifier.value();
        if identifier.is_empty() || credentials.password.is_empty() {
            return Err(ClientError::ServerRejection("Invalid credentials".into()));
        }

        let email = match &credentials.identifier {
            LoginIdentifier::Email(email) => email.clone(),
            LoginIdentifier::Username(_) => String::new(),
        };

        Ok(self.sign_in(User {
            name: display_name(identifier),
            email,
            license: random_license(),
            department: None,
        }))
    }

    async fn register(&self, email: &str, password: &str) -> ClientResult<LoginOutcome> {
        let email = email.trim();
        if !email.contains('@') || password.is_empty() {
            return Err(ClientError::ServerRejection(
                "Missing email or password".into(),
            ));
        }

        Ok(self.sign_in(User {
            name: display_name(email),
            email: email.to_string(),
            license: "MD-NEW".into(),
            department: Some("General Practice".into()),
        }))
    }

    async fn logout(&self) -> ClientResult<()> {
        let mut state = self.lock();
        state.signed_in = None;
        state.token = None;
        Ok(())
    }

    fn resume_session(&self, token: &str) {
        self.lock().token = Some(token.to_string());
    }

    async fn validate_session(&self) -> ClientResult<SessionValidation> {
        let state = self.lock();
        Ok(SessionValidation {
            valid: state.token.is_some(),
            username: state.signed_in.as_ref().map(|u| u.name.clone()),
            full_name: state.signed_in.as_ref().map(|u| u.name.clone()),
        })
    }

    async fn fetch_prescriptions(&self) -> ClientResult<Vec<Prescription>> {
        Ok(self.lock().prescriptions.clone())
    }

    async fn fetch_notifications(&self) -> ClientResult<Vec<Notification>> {
        Ok(self.lock().notifications.clone())
    }

    async fn fetch_patients(&self) -> ClientResult<Vec<Patient>> {
        Ok(self.lock().patients.clone())
    }

    async fn submit_prescription(&self, prescription: &Prescription) -> ClientResult<SubmissionAck> {
        prescription
            .check_invariants()
            .map_err(ClientError::ServerRejection)?;

        let mut state = self.lock();
        let next_sequence = state
            .prescriptions
            .iter()
            .filter_map(|rx| parse_prescription_sequence(&rx.id))
            .max()
            .unwrap_or(0)
            + 1;

        let mut stored = prescription.clone();
        stored.id = format!(
            "{PRESCRIPTION_ID_PREFIX}-{}-{:03}",
            stored.date.year(),
            next_sequence
        );
        stored.status = PrescriptionStatus::Pending;

        let content = format!(
            "New prescription for {} - {} has been submitted to pharmacy.",
            stored.patient_name,
            medication_names(&stored)
        );
        let priority = if stored.priority == Priority::Stat {
            NotificationPriority::Urgent
        } else {
            NotificationPriority::Normal
        };
        let assigned_id = stored.id.clone();

        state.prescriptions.insert(0, stored);
        Self::push_notification(
            &mut state,
            "Prescription Submitted",
            content,
            NotificationType::Success,
            priority,
            &assigned_id,
        );

        Ok(SubmissionAck {
            message: Some("Prescription received and saved.".into()),
            assigned_id: Some(assigned_id),
        })
    }

    async fn collect_prescription(&self, id: &str) -> ClientResult<()> {
        let (id, patient, medications) = self.transition(id, PrescriptionStatus::Dispensed)?;
        let mut state = self.lock();
        Self::push_notification(
            &mut state,
            "Medication Collected",
            format!("{medications} for {patient} has been collected."),
            NotificationType::Success,
            NotificationPriority::Normal,
            &id,
        );
        Ok(())
    }

    async fn cancel_prescription(&self, id: &str) -> ClientResult<()> {
        let (id, patient, medications) = self.transition(id, PrescriptionStatus::Cancelled)?;
        let mut state = self.lock();
        Self::push_notification(
            &mut state,
            "Prescription Cancelled",
            format!("Prescription for {patient} - {medications} has been cancelled."),
            NotificationType::Unread,
            NotificationPriority::Normal,
            &id,
        );
        Ok(())
    }

    async fn mark_notification_read(&self, id: &str) -> ClientResult<()> {
        let mut state = self.lock();
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ClientError::UnknownNotification(id.to_string()))?;
        notification.read = true;
        Ok(())
    }

    async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        for notification in self.lock().notifications.iter_mut() {
            notification.read = true;
        }
        Ok(())
    }

    async fn log_event(&self, event: &DiagnosticEvent) -> ClientResult<()> {
        tracing::info!("[client log] {} : {}", event.context, event.details);
        Ok(())
    }
}
