//! Pure view models.
//!
//! Functions here map domain records to display fragments. They perform no I/O
//! and never mutate their input, so every rendering rule can be checked
//! headlessly. Turning fragments into pixels or text is the job of a
//! [`Surface`](crate::surface::Surface).

use crate::model::{Notification, NotificationType, Prescription, PrescriptionStatus};
use chrono::NaiveDate;

/// A button rendered on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
    Collect { order_id: String },
    Modify { order_id: String },
    Cancel { order_id: String },
    ViewOrder { order_id: String },
    MarkRead { notification_id: String },
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            CardAction::Collect { .. } => "Collect",
            CardAction::Modify { .. } => "Modify",
            CardAction::Cancel { .. } => "Cancel",
            CardAction::ViewOrder { .. } => "View Order",
            CardAction::MarkRead { .. } => "Mark as Read",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionCard {
    pub id: String,
    pub title: String,
    pub patient: String,
    pub quantity: u64,
    pub route: String,
    pub frequency: String,
    pub ward: String,
    pub bed: Option<String>,
    pub indication: String,
    pub order_date: String,
    pub status: PrescriptionStatus,
    pub status_label: &'static str,
    pub status_class: String,
    pub priority_label: String,
    pub priority_class: String,
    /// Extra lines for completed orders (who dispensed, partial quantities).
    pub completion: Vec<String>,
    pub actions: Vec<CardAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCard {
    pub id: String,
    pub title: String,
    pub content: String,
    pub time_label: String,
    pub unread: bool,
    /// `urgent` or `success` accent, if any.
    pub tone: Option<&'static str>,
    pub actions: Vec<CardAction>,
}

/// Placeholder shown instead of an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyState {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const NO_ACTIVE_PRESCRIPTIONS: EmptyState = EmptyState {
    icon: "📋",
    title: "No Active Prescriptions",
    description: "All prescription orders have been completed or there are no pending orders.",
};

pub const NO_PRESCRIPTION_HISTORY: EmptyState = EmptyState {
    icon: "📚",
    title: "No Prescription History",
    description: "Completed prescriptions will appear here once they are dispensed.",
};

pub const NO_NOTIFICATIONS: EmptyState = EmptyState {
    icon: "🔔",
    title: "No Notifications",
    description: "Pharmacy updates and medication alerts will appear here.",
};

pub const NO_FILTER_RESULTS: EmptyState = EmptyState {
    icon: "🔍",
    title: "No Results Found",
    description: "No prescriptions match your current filters.",
};

/// Content of a list container. Never "nothing": an empty collection renders
/// as [`ListView::Empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Prescriptions(Vec<PrescriptionCard>),
    Notifications(Vec<NotificationCard>),
    Empty(EmptyState),
}

impl ListView {
    pub fn len(&self) -> usize {
        match self {
            ListView::Prescriptions(cards) => cards.len(),
            ListView::Notifications(cards) => cards.len(),
            ListView::Empty(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Buttons offered for an order in its current state.
pub fn order_actions(rx: &Prescription) -> Vec<CardAction> {
    let order_id = rx.id.clone();
    match rx.status {
        PrescriptionStatus::Ready => vec![CardAction::Collect { order_id }],
        PrescriptionStatus::Pending | PrescriptionStatus::Processing => vec![
            CardAction::Modify {
                order_id: order_id.clone(),
            },
            CardAction::Cancel { order_id },
        ],
        _ => Vec::new(),
    }
}

fn completion_lines(rx: &Prescription) -> Vec<String> {
    let when = rx
        .completed_date
        .map(format_date)
        .unwrap_or_else(|| "date not recorded".into());

    match rx.status {
        PrescriptionStatus::Dispensed => vec![format!(
            "Dispensed: {when} by {}",
            rx.dispensed_by.as_deref().unwrap_or("pharmacy")
        )],
        PrescriptionStatus::PartiallyDispensed => {
            let mut lines = vec![format!(
                "Partially Dispensed: {}/{} units",
                rx.partial_quantity.unwrap_or_default(),
                rx.total_quantity()
            )];
            if let Some(reason) = &rx.partial_reason {
                lines.push(format!("Reason: {reason}"));
            }
            lines
        }
        PrescriptionStatus::Cancelled if rx.completed_date.is_some() => {
            vec![format!("Cancelled: {when}")]
        }
        _ => Vec::new(),
    }
}

pub fn prescription_card(rx: &Prescription) -> PrescriptionCard {
    PrescriptionCard {
        id: rx.id.clone(),
        title: rx.medication_summary(),
        patient: format!("{} ({})", rx.patient_name, rx.patient_mrn),
        quantity: rx.total_quantity(),
        route: rx.route.clone(),
        frequency: rx.frequency.clone(),
        ward: format_ward_name(&rx.ward),
        bed: rx.bed_number.clone(),
        indication: rx
            .indication
            .clone()
            .unwrap_or_else(|| "Not specified".into()),
        order_date: format_date(rx.date),
        status: rx.status,
        status_label: rx.status.label(),
        status_class: format!("status-{}", rx.status.as_str()),
        priority_label: rx.priority.label(),
        priority_class: format!("priority-{}", rx.priority.as_str()),
        completion: completion_lines(rx),
        actions: order_actions(rx),
    }
}

pub fn notification_card(notification: &Notification) -> NotificationCard {
    let mut actions = Vec::new();
    if notification.action_required {
        if let Some(order_id) = &notification.related_order_id {
            actions.push(CardAction::ViewOrder {
                order_id: order_id.clone(),
            });
        }
        if !notification.read {
            actions.push(CardAction::MarkRead {
                notification_id: notification.id.clone(),
            });
        }
    }

    NotificationCard {
        id: notification.id.clone(),
        title: notification.title.clone(),
        content: notification.content.clone(),
        time_label: notification.time_label.clone(),
        unread: !notification.read,
        tone: match notification.kind {
            NotificationType::Urgent => Some("urgent"),
            NotificationType::Success => Some("success"),
            _ => None,
        },
        actions,
    }
}

fn prescription_list<'a>(
    prescriptions: impl Iterator<Item = &'a Prescription>,
    empty: EmptyState,
) -> ListView {
    let cards: Vec<_> = prescriptions.map(prescription_card).collect();
    if cards.is_empty() {
        ListView::Empty(empty)
    } else {
        ListView::Prescriptions(cards)
    }
}

/// Orders still in flight.
pub fn active_orders_view(prescriptions: &[Prescription]) -> ListView {
    prescription_list(
        prescriptions.iter().filter(|rx| rx.status.is_active()),
        NO_ACTIVE_PRESCRIPTIONS,
    )
}

/// Completed, partially dispensed and cancelled orders.
pub fn history_view(prescriptions: &[Prescription]) -> ListView {
    prescription_list(
        prescriptions.iter().filter(|rx| rx.status.is_completed()),
        NO_PRESCRIPTION_HISTORY,
    )
}

/// Result of a history filter; an empty result says so explicitly.
pub fn filtered_history_view(filtered: &[Prescription]) -> ListView {
    prescription_list(filtered.iter(), NO_FILTER_RESULTS)
}

pub fn notifications_view(notifications: &[Notification]) -> ListView {
    if notifications.is_empty() {
        return ListView::Empty(NO_NOTIFICATIONS);
    }
    ListView::Notifications(notifications.iter().map(notification_card).collect())
}

pub fn format_ward_name(ward: &str) -> String {
    match ward {
        "emergency" => "Emergency Department",
        "icu" => "Intensive Care Unit",
        "cardiology" => "Cardiology",
        "surgery" => "General Surgery",
        "pediatrics" => "Pediatrics",
        "internal" => "Internal Medicine",
        "outpatient" => "Outpatient Clinic",
        other => other,
    }
    .to_string()
}

/// `2024-01-16` -> `Jan 16, 2024`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
