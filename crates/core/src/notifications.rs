//! Notification actions and the unread badge.
//!
//! Badges hold no state of their own. After every notification mutation the
//! unread count is recomputed from the store and pushed to every
//! [`BadgeLocation`].

use crate::access::DiagnosticEvent;
use crate::app::AppContext;
use crate::error::ClientResult;
use crate::model::compute_unread_count;
use crate::navigation::NavigationController;
use crate::store::CollectionKind;
use crate::surface::{BadgeLocation, BadgeState, Toast, ToastKind};
use serde_json::json;
use std::sync::Arc;

/// Push the current unread count to every badge and return it.
pub async fn sync_badges(ctx: &AppContext) -> usize {
    let count = compute_unread_count(&ctx.store.notifications().await);
    let badge = BadgeState::from_count(count);
    for location in BadgeLocation::ALL {
        ctx.surface.set_badge(location, badge);
    }
    count
}

pub struct NotificationController {
    ctx: Arc<AppContext>,
    navigation: Arc<NavigationController>,
}

impl NotificationController {
    pub fn new(ctx: Arc<AppContext>, navigation: Arc<NavigationController>) -> Self {
        Self { ctx, navigation }
    }

    pub async fn unread_count(&self) -> usize {
        compute_unread_count(&self.ctx.store.notifications().await)
    }

    pub async fn sync_badges(&self) -> usize {
        sync_badges(&self.ctx).await
    }

    /// Mark one notification read, then refetch and update badges.
    pub async fn mark_read(&self, id: &str) -> ClientResult<()> {
        if let Err(e) = self.ctx.access.mark_notification_read(id).await {
            tracing::error!("failed to mark notification {} as read: {}", id, e);
            self.ctx.surface.show_toast(Toast::new(
                ToastKind::Error,
                format!("Could not update notification: {e}"),
            ));
            return Err(e);
        }

        self.reload().await;
        Ok(())
    }

    pub async fn mark_all_read(&self) -> ClientResult<()> {
        if let Err(e) = self.ctx.access.mark_all_notifications_read().await {
            tracing::error!("failed to mark all notifications as read: {}", e);
            self.ctx.surface.show_toast(Toast::new(
                ToastKind::Error,
                format!("Could not update notifications: {e}"),
            ));
            return Err(e);
        }

        let unread = self.reload().await;
        self.ctx.log_event(DiagnosticEvent::new(
            "notifications_mark_all_read",
            json!({ "unread": unread }),
        ));
        self.ctx.surface.show_toast(Toast::new(
            ToastKind::Success,
            "All notifications marked as read.",
        ));
        Ok(())
    }

    async fn reload(&self) -> usize {
        self.ctx.store.refresh(CollectionKind::Notifications).await;
        let unread = self.sync_badges().await;
        self.navigation.render_current().await;
        unread
    }
}
