//! Response envelopes of the REST API.
//!
//! Every endpoint answers with a JSON object carrying `success` and either a
//! `message`, an `error` or a `data` payload.

use pharmassist_core::model::User;
use pharmassist_core::{ClientError, ClientResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    /// Identifier of a newly stored record, when the backend reports one.
    #[serde(default)]
    pub id: Option<String>,
}

impl Envelope {
    fn reason(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .filter(|r| !r.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

fn malformed(what: &str, e: serde_json::Error) -> ClientError {
    ClientError::ServerRejection(format!("malformed {what} response: {e}"))
}

/// Turn a non-2xx answer into an error.
///
/// A 401 without an explanatory message means the session is gone.
pub(crate) fn rejection(status: u16, body: &str) -> ClientError {
    let envelope: Envelope = serde_json::from_str(body).unwrap_or_default();
    if status == 401 && envelope.message.is_none() {
        return ClientError::Unauthenticated;
    }

    let reason = envelope
        .reason()
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("HTTP {status}"));
    ClientError::ServerRejection(reason)
}

/// Parse a `{success, data: [...]}` list.
///
/// Records that fail to parse are skipped; a missing or non-array `data`
/// fails the whole list.
pub(crate) fn parse_list<T: DeserializeOwned>(body: &str, kind: &str) -> ClientResult<Vec<T>> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| malformed(kind, e))?;
    if envelope.success != Some(true) {
        return Err(ClientError::ServerRejection(
            envelope
                .reason()
                .unwrap_or_else(|| format!("{kind} request was not successful")),
        ));
    }

    let Some(Value::Array(items)) = envelope.data else {
        return Err(ClientError::ServerRejection(format!(
            "{kind} response did not carry a list"
        )));
    };

    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping malformed {} record #{}: {}", kind, index, e);
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!("kept {} of {} {} records", records.len(), total, kind);
    }
    Ok(records)
}

/// Parse the acknowledgement of a mutating request.
///
/// An empty body counts as success; an explicit `success: false` does not.
pub(crate) fn parse_ack(body: &str) -> ClientResult<Envelope> {
    if body.trim().is_empty() {
        return Ok(Envelope {
            success: Some(true),
            ..Envelope::default()
        });
    }

    let envelope: Envelope = serde_json::from_str(body).map_err(|e| malformed("action", e))?;
    if envelope.success == Some(false) {
        return Err(ClientError::ServerRejection(
            envelope
                .reason()
                .unwrap_or_else(|| "request was rejected".into()),
        ));
    }
    Ok(envelope)
}

pub(crate) fn parse_login(body: &str) -> ClientResult<LoginResponse> {
    let response: LoginResponse = serde_json::from_str(body).map_err(|e| malformed("login", e))?;
    if !response.success || response.user.is_none() {
        return Err(ClientError::ServerRejection(
            response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "login was not accepted".into()),
        ));
    }
    Ok(response)
}
