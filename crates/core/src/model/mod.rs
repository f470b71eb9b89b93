//! Domain records exchanged with the backend and cached by the data store.

mod notification;
mod patient;
mod prescription;
mod session;

pub use notification::{compute_unread_count, Notification, NotificationPriority, NotificationType};
pub use patient::Patient;
pub use prescription::{
    generate_prescription_id, parse_prescription_sequence, MedicationLine, Prescription,
    PrescriptionStatus, Priority,
};
pub use session::{Credentials, LoginIdentifier, SessionDescriptor, User};

use serde::{Deserialize, Deserializer};

/// Error returned when a wire string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

/// Treat missing, `null` and blank strings alike.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}
