//! Binding boundary between controllers and whatever draws the dashboard.
//!
//! Controllers push view models and effects through [`Surface`]; they never
//! format output themselves. [`HeadlessSurface`] records every effect so the
//! dashboard can be driven and inspected without a terminal or browser.

use crate::model::User;
use crate::navigation::PageId;
use crate::storage::Theme;
use crate::view::ListView;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Places where the unread count is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BadgeLocation {
    Header,
    Desktop,
    Sidebar,
}

impl BadgeLocation {
    pub const ALL: [BadgeLocation; 3] = [
        BadgeLocation::Header,
        BadgeLocation::Desktop,
        BadgeLocation::Sidebar,
    ];
}

/// A badge is hidden when there is nothing unread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeState {
    pub count: usize,
    pub visible: bool,
}

impl BadgeState {
    pub fn from_count(count: usize) -> Self {
        Self {
            count,
            visible: count > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// List containers on the dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Container {
    ActiveOrders,
    HistoryOrders,
    Notifications,
}

pub trait Surface: Send + Sync {
    fn show_login(&self);

    fn show_dashboard(&self, user: &User);

    fn activate_page(&self, page: PageId);

    fn render_list(&self, container: Container, view: ListView);

    fn set_badge(&self, location: BadgeLocation, state: BadgeState);

    fn show_toast(&self, toast: Toast);

    fn set_mobile_nav(&self, open: bool);

    /// Ask the user a yes/no question.
    fn confirm(&self, prompt: &str) -> bool;

    fn highlight_order(&self, order_id: &str);

    fn apply_theme(&self, theme: Theme);
}

/// Which top-level screen is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Blank,
    Login,
    Dashboard { user_name: String },
}

/// Everything a [`HeadlessSurface`] has been told so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceSnapshot {
    pub screen: Screen,
    pub active_page: Option<PageId>,
    pub lists: BTreeMap<Container, ListView>,
    pub badges: BTreeMap<BadgeLocation, BadgeState>,
    pub toasts: Vec<Toast>,
    pub mobile_nav_open: bool,
    pub prompts: Vec<String>,
    pub highlighted: Option<String>,
    pub theme: Option<Theme>,
    pub render_count: usize,
}

impl SurfaceSnapshot {
    pub fn last_toast(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn badge(&self, location: BadgeLocation) -> BadgeState {
        self.badges.get(&location).copied().unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct HeadlessSurface {
    state: Mutex<SurfaceSnapshot>,
    confirm_answer: Mutex<bool>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    /// A surface that answers every confirmation with yes.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SurfaceSnapshot::default()),
            confirm_answer: Mutex::new(true),
        }
    }

    pub fn set_confirm_answer(&self, answer: bool) {
        *self
            .confirm_answer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = answer;
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Surface for HeadlessSurface {
    fn show_login(&self) {
        self.lock().screen = Screen::Login;
    }

    fn show_dashboard(&self, user: &User) {
        self.lock().screen = Screen::Dashboard {
            user_name: user.name.clone(),
        };
    }

    fn activate_page(&self, page: PageId) {
        self.lock().active_page = Some(page);
    }

    fn render_list(&self, container: Container, view: ListView) {
        let mut state = self.lock();
        state.lists.insert(container, view);
        state.render_count += 1;
    }

    fn set_badge(&self, location: BadgeLocation, badge: BadgeState) {
        self.lock().badges.insert(location, badge);
    }

    fn show_toast(&self, toast: Toast) {
        self.lock().toasts.push(toast);
    }

    fn set_mobile_nav(&self, open: bool) {
        self.lock().mobile_nav_open = open;
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.lock().prompts.push(prompt.to_string());
        *self
            .confirm_answer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn highlight_order(&self, order_id: &str) {
        self.lock().highlighted = Some(order_id.to_string());
    }

    fn apply_theme(&self, theme: Theme) {
        self.lock().theme = Some(theme);
    }
}
