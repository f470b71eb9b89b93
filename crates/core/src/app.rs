//! Application context and the dashboard composition root.

use crate::access::{DataAccess, DiagnosticEvent};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::model::{Credentials, User};
use crate::navigation::{NavigationController, PageId};
use crate::notifications::NotificationController;
use crate::prescriptions::PrescriptionController;
use crate::session::{SessionManager, SessionState};
use crate::storage::{load_theme, save_theme, PersistedStorage, Theme};
use crate::store::{DataStore, RefreshSummary};
use crate::surface::Surface;
use std::sync::Arc;

/// Shared state handed to every controller.
pub struct AppContext {
    pub config: ClientConfig,
    pub access: Arc<dyn DataAccess>,
    pub store: DataStore,
    pub surface: Arc<dyn Surface>,
    pub storage: Arc<dyn PersistedStorage>,
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        access: Arc<dyn DataAccess>,
        surface: Arc<dyn Surface>,
        storage: Arc<dyn PersistedStorage>,
    ) -> Self {
        Self {
            store: DataStore::new(Arc::clone(&access)),
            config,
            access,
            surface,
            storage,
        }
    }

    /// Forward a diagnostic event to the backend without waiting for it.
    pub fn log_event(&self, event: DiagnosticEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime for diagnostic event {}", event.context);
            return;
        };

        let access = Arc::clone(&self.access);
        handle.spawn(async move {
            if let Err(e) = access.log_event(&event).await {
                tracing::debug!("diagnostic event {} not delivered: {}", event.context, e);
            }
        });
    }
}

/// The whole client: context plus the four controllers wired together.
pub struct Dashboard {
    ctx: Arc<AppContext>,
    session: Arc<SessionManager>,
    navigation: Arc<NavigationController>,
    prescriptions: PrescriptionController,
    notifications: NotificationController,
}

impl Dashboard {
    pub fn new(ctx: AppContext) -> Self {
        let ctx = Arc::new(ctx);
        let navigation = Arc::new(NavigationController::new(Arc::clone(&ctx)));
        let session = Arc::new(SessionManager::new(
            Arc::clone(&ctx),
            Arc::clone(&navigation),
        ));
        let prescriptions = PrescriptionController::new(
            Arc::clone(&ctx),
            Arc::clone(&session),
            Arc::clone(&navigation),
        );
        let notifications = NotificationController::new(Arc::clone(&ctx), Arc::clone(&navigation));

        Self {
            ctx,
            session,
            navigation,
            prescriptions,
            notifications,
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn prescriptions(&self) -> &PrescriptionController {
        &self.prescriptions
    }

    pub fn notifications(&self) -> &NotificationController {
        &self.notifications
    }

    /// Apply the saved theme and restore the previous session, loading data
    /// when it is still valid.
    pub async fn start(&self) -> SessionState {
        self.ctx.surface.apply_theme(self.theme());

        let state = self.session.initialise().await;
        if state.is_authenticated() {
            self.load_dashboard().await;
        }
        state
    }

    pub async fn login(&self, credentials: &Credentials) -> ClientResult<User> {
        let user = self.session.login(credentials).await?;
        self.load_dashboard().await;
        Ok(user)
    }

    pub async fn register(&self, email: &str, password: &str) -> ClientResult<User> {
        let user = self.session.register(email, password).await?;
        self.load_dashboard().await;
        Ok(user)
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        self.ctx.store.clear().await;
        self.notifications.sync_badges().await;
    }

    /// Reload every collection, then badges and the current page.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let summary = self.ctx.store.refresh_all().await;
        self.notifications.sync_badges().await;
        self.navigation.render_current().await;
        summary
    }

    pub fn theme(&self) -> Theme {
        load_theme(self.ctx.storage.as_ref())
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = self.theme().toggled();
        if let Err(e) = save_theme(self.ctx.storage.as_ref(), theme) {
            tracing::warn!("failed to save theme preference: {}", e);
        }
        self.ctx.surface.apply_theme(theme);
        theme
    }

    async fn load_dashboard(&self) {
        self.refresh_all().await;
        self.navigation.show(PageId::PrescriptionOrder).await;
    }
}
