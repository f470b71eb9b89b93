use crate::model::PrescriptionStatus;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("server rejected request: {0}")]
    ServerRejection(String),
    #[error("missing required fields: {}", .0.join(", "))]
    ValidationGap(Vec<&'static str>),
    #[error("a prescription may carry at most {max} medication lines, got {got}")]
    TooManyMedicationLines { max: usize, got: usize },
    #[error("not authenticated")]
    Unauthenticated,
    #[error("unknown prescription: {0}")]
    UnknownPrescription(String),
    #[error("unknown notification: {0}")]
    UnknownNotification(String),
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: PrescriptionStatus,
        to: PrescriptionStatus,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read persisted state: {0}")]
    StorageRead(std::io::Error),
    #[error("failed to write persisted state: {0}")]
    StorageWrite(std::io::Error),
    #[error("failed to serialize persisted state: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize persisted state: {0}")]
    Deserialization(serde_json::Error),
}

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request never produced a response.
    NetworkFailure,
    /// The backend answered with `success:false` or a non-2xx status.
    ServerRejection,
    /// Required input was missing before anything was sent.
    ValidationGap,
    /// Local failures: configuration, storage, unknown ids.
    Local,
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::NetworkFailure(_) => ErrorCategory::NetworkFailure,
            ClientError::ServerRejection(_)
            | ClientError::Unauthenticated
            | ClientError::InvalidTransition { .. } => ErrorCategory::ServerRejection,
            ClientError::ValidationGap(_) | ClientError::TooManyMedicationLines { .. } => {
                ErrorCategory::ValidationGap
            }
            _ => ErrorCategory::Local,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
