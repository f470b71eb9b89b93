//! Page state machine.

use crate::app::AppContext;
use crate::constants::MOBILE_BREAKPOINT_PX;
use crate::model::{ParseVariantError, Prescription, PrescriptionStatus};
use crate::notifications::sync_badges;
use crate::prescriptions::filter_history;
use crate::store::CollectionKind;
use crate::surface::Container;
use crate::view;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PageId {
    #[default]
    PrescriptionOrder,
    ActivePrescriptions,
    PrescriptionHistory,
    Notifications,
}

impl PageId {
    pub const ALL: [PageId; 4] = [
        PageId::PrescriptionOrder,
        PageId::ActivePrescriptions,
        PageId::PrescriptionHistory,
        PageId::Notifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageId::PrescriptionOrder => "prescription-order",
            PageId::ActivePrescriptions => "active-prescriptions",
            PageId::PrescriptionHistory => "prescription-history",
            PageId::Notifications => "notifications",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PageId::PrescriptionOrder => "New Prescription Order",
            PageId::ActivePrescriptions => "Active Prescriptions",
            PageId::PrescriptionHistory => "Prescription History",
            PageId::Notifications => "Notifications",
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageId {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageId::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| ParseVariantError {
                kind: "page",
                value: s.to_string(),
            })
    }
}

pub struct NavigationController {
    ctx: Arc<AppContext>,
    current: Mutex<PageId>,
    mobile_nav_open: AtomicBool,
}

impl NavigationController {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            current: Mutex::new(PageId::default()),
            mobile_nav_open: AtomicBool::new(false),
        }
    }

    pub fn current_page(&self) -> PageId {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_mobile_nav_open(&self) -> bool {
        self.mobile_nav_open.load(Ordering::SeqCst)
    }

    /// Switch to `page`, refresh the data it shows and render it.
    ///
    /// Calling this repeatedly for the same page renders the same output.
    pub async fn show(&self, page: PageId) {
        self.enter(page).await;
        self.render_page(page).await;
        self.close_mobile_nav();
    }

    /// Switch to the history page and render only the orders matching the
    /// filter, instead of the full history.
    pub async fn show_filtered_history(
        &self,
        date: Option<NaiveDate>,
        status: Option<PrescriptionStatus>,
    ) -> Vec<Prescription> {
        self.enter(PageId::PrescriptionHistory).await;
        let filtered = filter_history(&self.ctx.store.prescriptions().await, date, status);
        self.ctx.surface.render_list(
            Container::HistoryOrders,
            view::filtered_history_view(&filtered),
        );
        self.close_mobile_nav();
        filtered
    }

    async fn enter(&self, page: PageId) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = page;
        self.ctx.surface.activate_page(page);
        tracing::debug!("showing page {}", page);

        self.refresh_page(page).await;
    }

    /// Re-render the current page from cached data without fetching.
    pub async fn render_current(&self) {
        self.render_page(self.current_page()).await;
    }

    async fn refresh_page(&self, page: PageId) {
        match page {
            PageId::PrescriptionOrder => {
                self.ctx.store.refresh(CollectionKind::Patients).await;
            }
            PageId::ActivePrescriptions | PageId::PrescriptionHistory => {
                self.ctx.store.refresh(CollectionKind::Prescriptions).await;
            }
            PageId::Notifications => {
                self.ctx.store.refresh(CollectionKind::Notifications).await;
                sync_badges(&self.ctx).await;
            }
        }
    }

    async fn render_page(&self, page: PageId) {
        let store = &self.ctx.store;
        let (container, list) = match page {
            PageId::PrescriptionOrder => return,
            PageId::ActivePrescriptions => (
                Container::ActiveOrders,
                view::active_orders_view(&store.prescriptions().await),
            ),
            PageId::PrescriptionHistory => (
                Container::HistoryOrders,
                view::history_view(&store.prescriptions().await),
            ),
            PageId::Notifications => (
                Container::Notifications,
                view::notifications_view(&store.notifications().await),
            ),
        };
        self.ctx.surface.render_list(container, list);
    }

    pub fn toggle_mobile_nav(&self) -> bool {
        let open = !self.mobile_nav_open.fetch_xor(true, Ordering::SeqCst);
        self.ctx.surface.set_mobile_nav(open);
        open
    }

    pub fn close_mobile_nav(&self) {
        if self.mobile_nav_open.swap(false, Ordering::SeqCst) {
            self.ctx.surface.set_mobile_nav(false);
        }
    }

    /// Wide viewports have no mobile overlay.
    pub fn on_viewport_resize(&self, width: u32) {
        if width > MOBILE_BREAKPOINT_PX {
            self.close_mobile_nav();
        }
    }

    /// Jump to the page listing `order_id` and highlight it.
    ///
    /// Returns `false` when the order is not in the cache.
    pub async fn view_related_order(&self, order_id: &str) -> bool {
        let Some(rx) = self.ctx.store.find_prescription(order_id).await else {
            tracing::debug!("related order {} not found", order_id);
            return false;
        };

        let page = if rx.status.is_active() {
            PageId::ActivePrescriptions
        } else {
            PageId::PrescriptionHistory
        };
        self.show(page).await;
        self.ctx.surface.highlight_order(order_id);
        true
    }
}
