//! A [`Surface`] that writes to the terminal.
//!
//! Lists and toasts are printed as they arrive. Screen changes are only
//! announced when the user actually signs in or out, so a restored session
//! does not repeat itself on every command.

use crate::format::{format_list, format_toast};
use pharmassist_core::model::User;
use pharmassist_core::navigation::PageId;
use pharmassist_core::storage::Theme;
use pharmassist_core::surface::{BadgeLocation, BadgeState, Container, Surface, Toast, ToastKind};
use pharmassist_core::view::ListView;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Unknown,
    Login,
    Dashboard,
}

#[derive(Debug)]
pub struct TerminalSurface {
    screen: Mutex<Screen>,
    unread: Mutex<Option<usize>>,
    assume_yes: AtomicBool,
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self {
            screen: Mutex::new(Screen::Unknown),
            unread: Mutex::new(None),
            assume_yes: AtomicBool::new(false),
        }
    }

    /// Answer every confirmation with yes instead of asking on stdin.
    pub fn set_assume_yes(&self, yes: bool) {
        self.assume_yes.store(yes, Ordering::SeqCst);
    }

    fn switch_screen(&self, next: Screen) -> Screen {
        let mut screen = self.screen.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *screen, next)
    }
}

impl Surface for TerminalSurface {
    fn show_login(&self) {
        if self.switch_screen(Screen::Login) == Screen::Dashboard {
            println!("Signed out.");
        }
    }

    fn show_dashboard(&self, user: &User) {
        if self.switch_screen(Screen::Dashboard) == Screen::Login {
            match &user.department {
                Some(department) => println!("Signed in as {} ({})", user.name, department),
                None => println!("Signed in as {}", user.name),
            }
        }
    }

    fn activate_page(&self, page: PageId) {
        tracing::debug!("page {}", page);
    }

    fn render_list(&self, container: Container, view: ListView) {
        let title = match container {
            Container::ActiveOrders => PageId::ActivePrescriptions.title(),
            Container::HistoryOrders => PageId::PrescriptionHistory.title(),
            Container::Notifications => PageId::Notifications.title(),
        };
        println!("== {} ==", title);
        println!("{}", format_list(&view));
    }

    fn set_badge(&self, location: BadgeLocation, state: BadgeState) {
        // All three locations always carry the same value.
        if location != BadgeLocation::Header {
            return;
        }
        let mut unread = self.unread.lock().unwrap_or_else(PoisonError::into_inner);
        if *unread != Some(state.count) {
            if unread.is_some() || state.visible {
                println!("Unread notifications: {}", state.count);
            }
            *unread = Some(state.count);
        }
    }

    fn show_toast(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Error => eprintln!("{}", format_toast(&toast)),
            _ => println!("{}", format_toast(&toast)),
        }
    }

    fn set_mobile_nav(&self, open: bool) {
        tracing::debug!("mobile navigation open: {}", open);
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes.load(Ordering::SeqCst) {
            return true;
        }

        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                tracing::warn!("could not read confirmation: {}", e);
                false
            }
        }
    }

    fn highlight_order(&self, order_id: &str) {
        println!("-> {}", order_id);
    }

    fn apply_theme(&self, theme: Theme) {
        tracing::debug!("theme {}", theme.as_str());
    }
}
