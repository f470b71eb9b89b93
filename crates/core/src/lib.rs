//! # PharmAssist Core
//!
//! Client-side logic for the PharmAssist prescription dashboard.
//!
//! This crate contains everything that does not depend on a transport or a
//! display:
//! - Domain records (prescriptions, notifications, patients, sessions)
//! - The [`DataAccess`] capability and the offline [`LocalBackend`]
//! - The [`DataStore`] cache and the controllers built on it
//! - Pure view models and the [`Surface`] binding boundary
//!
//! **No HTTP code**: the REST backend lives in `pharmassist-api-client`, and
//! terminal rendering in `pharmassist-cli`.

pub mod access;
pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod navigation;
pub mod notifications;
pub mod prescriptions;
pub mod session;
pub mod storage;
pub mod store;
pub mod surface;
pub mod view;

pub use access::{DataAccess, LocalBackend};
pub use app::{AppContext, Dashboard};
pub use config::{ClientConfig, DataSource};
pub use error::{ClientError, ClientResult, ErrorCategory};
pub use navigation::{NavigationController, PageId};
pub use notifications::NotificationController;
pub use prescriptions::{ActionOutcome, MedicationInput, PrescriptionController, PrescriptionForm};
pub use session::{SessionManager, SessionState};
pub use storage::{FileStorage, MemoryStorage, PersistedStorage, Theme};
pub use store::{CollectionKind, DataStore, RefreshOutcome, RefreshSummary};
pub use surface::{HeadlessSurface, Surface};
