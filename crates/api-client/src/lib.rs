//! # PharmAssist API Client
//!
//! [`RemoteBackend`] implements [`DataAccess`](pharmassist_core::DataAccess)
//! over the dispensing unit's REST API.
//!
//! The session token travels in the `session_token` cookie, kept in a cookie
//! jar owned by the backend. A persisted token can be put back into the jar
//! with [`resume_session`](pharmassist_core::DataAccess::resume_session)
//! before it is validated.

mod envelope;
mod remote;

pub use remote::RemoteBackend;
