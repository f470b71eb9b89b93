//! Signed-in identity and its persisted descriptor.

use crate::access::LoginOutcome;
use crate::app::AppContext;
use crate::constants::SESSION_STORAGE_KEY;
use crate::error::{ClientError, ClientResult};
use crate::model::{Credentials, SessionDescriptor, User};
use crate::navigation::NavigationController;
use crate::surface::{Toast, ToastKind};
use std::sync::{Arc, Mutex, PoisonError};

/// Result of [`SessionManager::initialise`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(User),
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

pub struct SessionManager {
    ctx: Arc<AppContext>,
    navigation: Arc<NavigationController>,
    user: Mutex<Option<User>>,
}

impl SessionManager {
    pub fn new(ctx: Arc<AppContext>, navigation: Arc<NavigationController>) -> Self {
        Self {
            ctx,
            navigation,
            user: Mutex::new(None),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Restore a persisted session and confirm it with the backend.
    ///
    /// Any failure along the way clears the local session; the caller decides
    /// what to do with [`SessionState::Unauthenticated`].
    pub async fn initialise(&self) -> SessionState {
        let Some(descriptor) = self.load_descriptor() else {
            self.ctx.surface.show_login();
            return SessionState::Unauthenticated;
        };

        if let Some(token) = &descriptor.token {
            self.ctx.access.resume_session(token);
        }

        match self.ctx.access.validate_session().await {
            Ok(validation) if validation.valid => {
                let mut user = descriptor.user;
                if let Some(full_name) = validation.full_name.filter(|n| !n.trim().is_empty()) {
                    user.name = full_name;
                }
                tracing::info!("++ Restored session for {}", user.name);
                self.establish(user.clone(), descriptor.token);
                SessionState::Authenticated(user)
            }
            Ok(_) => {
                tracing::info!("stored session is no longer valid");
                self.discard();
                SessionState::Unauthenticated
            }
            Err(e) => {
                tracing::warn!("session validation failed: {}", e);
                self.discard();
                SessionState::Unauthenticated
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> ClientResult<User> {
        let outcome = self.ctx.access.login(credentials).await;
        self.finish_sign_in("Login", outcome)
    }

    pub async fn register(&self, email: &str, password: &str) -> ClientResult<User> {
        let outcome = self.ctx.access.register(email, password).await;
        self.finish_sign_in("Registration", outcome)
    }

    /// Forget the local session and return to the login screen.
    ///
    /// The backend is told as well, but its answer does not matter.
    pub async fn logout(&self) {
        if let Err(e) = self.ctx.access.logout().await {
            tracing::debug!("backend logout failed: {}", e);
        }

        if let Some(user) = self.current_user() {
            tracing::info!("++ Logged out {}", user.name);
        }
        self.navigation.close_mobile_nav();
        self.discard();
    }

    fn finish_sign_in(
        &self,
        action: &str,
        outcome: ClientResult<LoginOutcome>,
    ) -> ClientResult<User> {
        match outcome {
            Ok(LoginOutcome {
                user,
                session_token,
            }) => {
                tracing::info!("++ {} succeeded for {}", action, user.name);
                self.establish(user.clone(), session_token);
                Ok(user)
            }
            Err(e) => {
                tracing::error!("{} failed: {}", action.to_lowercase(), e);
                self.ctx
                    .surface
                    .show_toast(Toast::new(ToastKind::Error, format!("{action} failed: {e}")));
                Err(e)
            }
        }
    }

    fn establish(&self, user: User, token: Option<String>) {
        let descriptor = SessionDescriptor {
            user: user.clone(),
            token,
        };
        if let Err(e) = self.save_descriptor(&descriptor) {
            tracing::warn!("failed to persist session: {}", e);
        }

        self.ctx.surface.show_dashboard(&user);
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    fn discard(&self) {
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(e) = self.ctx.storage.remove(SESSION_STORAGE_KEY) {
            tracing::warn!("failed to clear persisted session: {}", e);
        }
        self.ctx.surface.show_login();
    }

    fn load_descriptor(&self) -> Option<SessionDescriptor> {
        let raw = match self.ctx.storage.get(SESSION_STORAGE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("failed to read persisted session: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                tracing::warn!("discarding unreadable session descriptor: {}", e);
                if let Err(e) = self.ctx.storage.remove(SESSION_STORAGE_KEY) {
                    tracing::warn!("failed to clear persisted session: {}", e);
                }
                None
            }
        }
    }

    fn save_descriptor(&self, descriptor: &SessionDescriptor) -> ClientResult<()> {
        let json = serde_json::to_string(descriptor).map_err(ClientError::Serialization)?;
        self.ctx.storage.set(SESSION_STORAGE_KEY, &json)
    }
}
