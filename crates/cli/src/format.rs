//! Plain-text rendering of view models.

use pharmassist_core::model::Patient;
use pharmassist_core::surface::{Toast, ToastKind};
use pharmassist_core::view::{CardAction, EmptyState, ListView, NotificationCard, PrescriptionCard};

pub fn format_list(view: &ListView) -> String {
    match view {
        ListView::Prescriptions(cards) => cards
            .iter()
            .map(format_prescription)
            .collect::<Vec<_>>()
            .join("\n\n"),
        ListView::Notifications(cards) => cards
            .iter()
            .map(format_notification)
            .collect::<Vec<_>>()
            .join("\n\n"),
        ListView::Empty(empty) => format_empty(empty),
    }
}

fn format_empty(empty: &EmptyState) -> String {
    format!("{} {}\n   {}", empty.icon, empty.title, empty.description)
}

fn format_actions(actions: &[CardAction]) -> Option<String> {
    if actions.is_empty() {
        return None;
    }
    let labels: Vec<_> = actions.iter().map(|a| format!("[{}]", a.label())).collect();
    Some(format!("   {}", labels.join(" ")))
}

/// ```text
/// RX-2024-003  Epinephrine 1mg/ml (injection)  [READY] STAT
///    Patient: Emma Thompson (MRN-34567890)
///    ...
/// ```
pub fn format_prescription(card: &PrescriptionCard) -> String {
    let mut lines = vec![
        format!(
            "{}  {}  [{}] {}",
            card.id,
            card.title,
            card.status_label.to_uppercase(),
            card.priority_label
        ),
        format!("   Patient: {}", card.patient),
        format!(
            "   Quantity: {}  Route: {}  Frequency: {}",
            card.quantity, card.route, card.frequency
        ),
    ];

    match &card.bed {
        Some(bed) => lines.push(format!("   Ward: {}  Bed: {}", card.ward, bed)),
        None => lines.push(format!("   Ward: {}", card.ward)),
    }
    lines.push(format!("   Indication: {}", card.indication));
    lines.push(format!("   Ordered: {}", card.order_date));
    lines.extend(card.completion.iter().map(|c| format!("   {c}")));
    lines.extend(format_actions(&card.actions));

    lines.join("\n")
}

pub fn format_notification(card: &NotificationCard) -> String {
    let marker = if card.unread { "*" } else { " " };
    let mut lines = vec![format!(
        "{} {}  {}  ({})",
        marker, card.id, card.title, card.time_label
    )];
    if !card.content.is_empty() {
        lines.push(format!("   {}", card.content));
    }
    lines.extend(format_actions(&card.actions));
    lines.join("\n")
}

pub fn format_patient(patient: &Patient) -> String {
    let mut out = format!("{} ({})", patient.name, patient.mrn);
    if !patient.ward.is_empty() {
        out.push_str(&format!(" - {}", patient.ward));
        if !patient.bed.is_empty() {
            out.push_str(&format!(" {}", patient.bed));
        }
    }
    out
}

pub fn format_toast(toast: &Toast) -> String {
    let tag = match toast.kind {
        ToastKind::Success => "ok",
        ToastKind::Error => "error",
        ToastKind::Warning => "warning",
        ToastKind::Info => "info",
    };
    format!("[{}] {}", tag, toast.message)
}
