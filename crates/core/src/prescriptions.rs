//! Prescription order form, submission and order actions.

use crate::access::{DiagnosticEvent, SubmissionAck};
use crate::app::AppContext;
use crate::constants::{MAX_MEDICATION_LINES, MAX_PATIENT_SUGGESTIONS};
use crate::error::{ClientError, ClientResult};
use crate::model::{
    generate_prescription_id, MedicationLine, Patient, Prescription, PrescriptionStatus, Priority,
};
use crate::navigation::NavigationController;
use crate::notifications::sync_badges;
use crate::session::SessionManager;
use crate::store::CollectionKind;
use crate::surface::{Container, Toast, ToastKind};
use crate::view;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};

/// Raw input of one medication slot on the order form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicationInput {
    pub medication_name: String,
    pub strength: String,
    pub dosage_form: String,
    pub quantity: String,
}

impl MedicationInput {
    pub fn new(
        medication_name: impl Into<String>,
        strength: impl Into<String>,
        dosage_form: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            medication_name: medication_name.into(),
            strength: strength.into(),
            dosage_form: dosage_form.into(),
            quantity: quantity.into(),
        }
    }

    fn is_blank(&self) -> bool {
        [
            &self.medication_name,
            &self.strength,
            &self.dosage_form,
            &self.quantity,
        ]
        .iter()
        .all(|field| field.trim().is_empty())
    }
}

/// Values entered on the new-order page.
///
/// A failed submission leaves the form untouched so it can be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionForm {
    pub patient_name: String,
    pub patient_mrn: String,
    pub ward: String,
    pub bed_number: String,
    pub medications: Vec<MedicationInput>,
    pub route: String,
    pub frequency: String,
    pub priority: Priority,
    pub indication: String,
    pub special_instructions: String,
}

impl Default for PrescriptionForm {
    fn default() -> Self {
        Self::new()
    }
}

fn require(missing: &mut Vec<&'static str>, name: &'static str, value: &str) {
    if value.trim().is_empty() && !missing.contains(&name) {
        missing.push(name);
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl PrescriptionForm {
    /// An empty form with a single medication slot.
    pub fn new() -> Self {
        Self {
            patient_name: String::new(),
            patient_mrn: String::new(),
            ward: String::new(),
            bed_number: String::new(),
            medications: vec![MedicationInput::default()],
            route: String::new(),
            frequency: String::new(),
            priority: Priority::default(),
            indication: String::new(),
            special_instructions: String::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Fill the patient section from an autocomplete suggestion.
    pub fn apply_patient(&mut self, patient: &Patient) {
        self.patient_name = patient.name.clone();
        self.patient_mrn = patient.mrn.clone();
        self.ward = patient.ward.clone();
        self.bed_number = patient.bed.clone();
    }

    pub fn add_medication_line(&mut self, line: MedicationInput) -> ClientResult<()> {
        if self.medications.len() >= MAX_MEDICATION_LINES {
            return Err(ClientError::TooManyMedicationLines {
                max: MAX_MEDICATION_LINES,
                got: self.medications.len() + 1,
            });
        }
        self.medications.push(line);
        Ok(())
    }

    /// Remove a medication slot. The first slot always stays.
    pub fn remove_medication_line(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.medications.len() {
            return false;
        }
        self.medications.remove(index);
        true
    }

    /// Build the order record, or name every required field left empty.
    ///
    /// Blank medication slots are ignored; at least one line must be filled.
    ///
    /// # Arguments
    ///
    /// * `id` - Provisional identifier; the backend may assign another.
    /// * `physician` - Prescriber name, taken from the signed-in user.
    /// * `today` - Order date.
    ///
    /// # Errors
    ///
    /// Returns `ValidationGap` listing the missing fields, or
    /// `TooManyMedicationLines` when more than three lines are filled.
    pub fn validate(
        &self,
        id: String,
        physician: &str,
        today: NaiveDate,
    ) -> ClientResult<Prescription> {
        let filled: Vec<&MedicationInput> =
            self.medications.iter().filter(|m| !m.is_blank()).collect();
        if filled.len() > MAX_MEDICATION_LINES {
            return Err(ClientError::TooManyMedicationLines {
                max: MAX_MEDICATION_LINES,
                got: filled.len(),
            });
        }

        let mut missing = Vec::new();
        require(&mut missing, "patientName", &self.patient_name);
        require(&mut missing, "patientMRN", &self.patient_mrn);
        require(&mut missing, "ward", &self.ward);

        let mut lines = Vec::with_capacity(filled.len());
        if filled.is_empty() {
            missing.extend(["medicationName", "strength", "dosageForm", "quantity"]);
        }
        for input in filled {
            require(&mut missing, "medicationName", &input.medication_name);
            require(&mut missing, "strength", &input.strength);
            require(&mut missing, "dosageForm", &input.dosage_form);
            match input.quantity.trim().parse::<u32>() {
                Ok(quantity) if quantity > 0 => lines.push(MedicationLine {
                    medication_name: input.medication_name.trim().to_string(),
                    strength: input.strength.trim().to_string(),
                    dosage_form: input.dosage_form.trim().to_string(),
                    quantity,
                }),
                _ => {
                    if !missing.contains(&"quantity") {
                        missing.push("quantity");
                    }
                }
            }
        }

        require(&mut missing, "route", &self.route);
        require(&mut missing, "frequency", &self.frequency);

        if !missing.is_empty() {
            return Err(ClientError::ValidationGap(missing));
        }

        Ok(Prescription {
            id,
            patient_name: self.patient_name.trim().to_string(),
            patient_mrn: self.patient_mrn.trim().to_string(),
            medications: lines,
            route: self.route.trim().to_string(),
            frequency: self.frequency.trim().to_string(),
            priority: self.priority,
            indication: optional(&self.indication),
            special_instructions: optional(&self.special_instructions),
            ward: self.ward.trim().to_string(),
            bed_number: optional(&self.bed_number),
            status: PrescriptionStatus::Pending,
            date: today,
            prescribing_physician: physician.to_string(),
            completed_date: None,
            dispensed_by: None,
            partial_quantity: None,
            partial_reason: None,
        })
    }
}

/// Completed orders matching an exact date and/or status.
pub fn filter_history(
    prescriptions: &[Prescription],
    date: Option<NaiveDate>,
    status: Option<PrescriptionStatus>,
) -> Vec<Prescription> {
    prescriptions
        .iter()
        .filter(|rx| rx.status.is_completed())
        .filter(|rx| date.map_or(true, |d| rx.date == d))
        .filter(|rx| status.map_or(true, |s| rx.status == s))
        .cloned()
        .collect()
}

/// Whether a confirmed action actually went ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Declined,
}

/// A provisional id and the one the backend stored the order under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAssignment {
    pub provisional: String,
    pub assigned: Option<String>,
}

impl IdAssignment {
    pub fn canonical(&self) -> &str {
        self.assigned.as_deref().unwrap_or(&self.provisional)
    }
}

pub struct PrescriptionController {
    ctx: Arc<AppContext>,
    session: Arc<SessionManager>,
    navigation: Arc<NavigationController>,
    submitted: Mutex<Vec<IdAssignment>>,
}

impl PrescriptionController {
    pub fn new(
        ctx: Arc<AppContext>,
        session: Arc<SessionManager>,
        navigation: Arc<NavigationController>,
    ) -> Self {
        Self {
            ctx,
            session,
            navigation,
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Provisional id from the cached prescription count.
    pub async fn generate_id(&self) -> String {
        let existing = self.ctx.store.prescriptions().await.len();
        generate_prescription_id(existing, today())
    }

    /// Ids handed out by successful submissions in this session.
    pub fn submitted_ids(&self) -> Vec<IdAssignment> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate and send the form. The form is cleared only on success.
    pub async fn submit(&self, form: &mut PrescriptionForm) -> ClientResult<IdAssignment> {
        let Some(user) = self.session.current_user() else {
            self.toast(ToastKind::Error, "Please log in to submit prescriptions.");
            return Err(ClientError::Unauthenticated);
        };

        let provisional = self.generate_id().await;
        let prescription = match form.validate(provisional.clone(), &user.prescriber_name(), today())
        {
            Ok(prescription) => prescription,
            Err(e) => {
                self.toast(ToastKind::Warning, format!("Cannot submit prescription: {e}"));
                return Err(e);
            }
        };

        let SubmissionAck {
            message,
            assigned_id,
        } = match self.ctx.access.submit_prescription(&prescription).await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::error!("prescription {} rejected: {}", provisional, e);
                self.ctx.log_event(DiagnosticEvent::new(
                    "prescription_submit_failed",
                    json!({ "id": provisional, "error": e.to_string() }),
                ));
                self.toast(ToastKind::Error, format!("Failed to submit prescription: {e}"));
                return Err(e);
            }
        };

        let assignment = IdAssignment {
            provisional,
            assigned: assigned_id,
        };
        tracing::info!(
            "++ Submitted prescription {} ({})",
            assignment.canonical(),
            message.as_deref().unwrap_or("accepted")
        );
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(assignment.clone());

        form.reset();
        self.toast(ToastKind::Success, "Prescription submitted successfully!");
        self.reload_orders().await;
        Ok(assignment)
    }

    pub async fn collect(&self, id: &str) -> ClientResult<()> {
        let medication = self
            .ctx
            .store
            .find_prescription(id)
            .await
            .map(|rx| rx.medication_summary())
            .unwrap_or_else(|| id.to_string());

        if let Err(e) = self.ctx.access.collect_prescription(id).await {
            return Err(self.action_failed("collect", id, e));
        }

        tracing::info!("++ Collected prescription {}", id);
        self.toast(
            ToastKind::Success,
            format!("{medication} collected successfully!"),
        );
        self.reload_orders().await;
        Ok(())
    }

    /// Cancel an order after the user confirms.
    pub async fn cancel(&self, id: &str) -> ClientResult<ActionOutcome> {
        if !self
            .ctx
            .surface
            .confirm("Are you sure you want to cancel this prescription order?")
        {
            tracing::debug!("cancellation of {} declined", id);
            return Ok(ActionOutcome::Declined);
        }

        if let Err(e) = self.ctx.access.cancel_prescription(id).await {
            return Err(self.action_failed("cancel", id, e));
        }

        tracing::info!("++ Cancelled prescription {}", id);
        self.toast(ToastKind::Warning, format!("Prescription {id} cancelled."));
        self.reload_orders().await;
        Ok(ActionOutcome::Completed)
    }

    pub fn modify(&self, id: &str) {
        tracing::debug!("modify requested for {}", id);
        self.toast(
            ToastKind::Info,
            "Prescription modification feature coming soon!",
        );
    }

    /// Filter the cached history and render the result.
    pub async fn filter_history(
        &self,
        date: Option<NaiveDate>,
        status: Option<PrescriptionStatus>,
    ) -> Vec<Prescription> {
        let filtered = filter_history(&self.ctx.store.prescriptions().await, date, status);
        self.ctx.surface.render_list(
            Container::HistoryOrders,
            view::filtered_history_view(&filtered),
        );
        filtered
    }

    /// Autocomplete suggestions from the cached patient list.
    pub async fn search_patients(&self, query: &str) -> Vec<Patient> {
        self.ctx
            .store
            .patients()
            .await
            .iter()
            .filter(|p| p.matches(query))
            .take(MAX_PATIENT_SUGGESTIONS)
            .cloned()
            .collect()
    }

    fn action_failed(&self, action: &str, id: &str, e: ClientError) -> ClientError {
        tracing::error!("failed to {} prescription {}: {}", action, id, e);
        self.ctx.log_event(DiagnosticEvent::new(
            format!("prescription_{action}_failed"),
            json!({ "id": id, "error": e.to_string() }),
        ));
        self.toast(
            ToastKind::Error,
            format!("Failed to {action} prescription {id}: {e}"),
        );
        e
    }

    /// Mutations raise backend notifications, so both collections reload.
    async fn reload_orders(&self) {
        tokio::join!(
            self.ctx.store.refresh(CollectionKind::Prescriptions),
            self.ctx.store.refresh(CollectionKind::Notifications),
        );
        sync_badges(&self.ctx).await;
        self.navigation.render_current().await;
    }

    fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        self.ctx.surface.show_toast(Toast::new(kind, message));
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::fake::{Fault, FaultyBackend};
    use crate::access::LocalBackend;
    use crate::app::tests::{headless_context, headless_context_with};
    use crate::model::Credentials;
    use crate::navigation::PageId;
    use crate::surface::HeadlessSurface;
    use crate::view::{ListView, NO_FILTER_RESULTS};

    fn filled_form() -> PrescriptionForm {
        let mut form = PrescriptionForm::new();
        form.patient_name = "Sarah Johnson".into();
        form.patient_mrn = "MRN-78901234".into();
        form.ward = "cardiology".into();
        form.medications[0] = MedicationInput::new("Lisinopril", "10mg", "tablet", "30");
        form.add_medication_line(MedicationInput::new("Aspirin", "81mg", "tablet", "30"))
            .unwrap();
        form.route = "oral".into();
        form.frequency = "once-daily".into();
        form
    }

    struct Harness {
        controller: PrescriptionController,
        session: Arc<SessionManager>,
        navigation: Arc<NavigationController>,
        surface: Arc<HeadlessSurface>,
        ctx: Arc<AppContext>,
    }

    fn harness(ctx: Arc<AppContext>, surface: Arc<HeadlessSurface>) -> Harness {
        let navigation = Arc::new(NavigationController::new(Arc::clone(&ctx)));
        let session = Arc::new(SessionManager::new(
            Arc::clone(&ctx),
            Arc::clone(&navigation),
        ));
        Harness {
            controller: PrescriptionController::new(
                Arc::clone(&ctx),
                Arc::clone(&session),
                Arc::clone(&navigation),
            ),
            session,
            navigation,
            surface,
            ctx,
        }
    }

    async fn signed_in_local() -> Harness {
        let (ctx, surface) = headless_context(LocalBackend::with_sample_data());
        let h = harness(ctx, surface);
        h.session
            .login(&Credentials::new("smith@ward.org", "secret"))
            .await
            .unwrap();
        h.ctx.store.refresh_all().await;
        h
    }

    #[test]
    fn test_validate_names_missing_fields() {
        let mut form = PrescriptionForm::new();
        form.patient_name = "Sarah Johnson".into();
        form.medications[0] = MedicationInput::new("Lisinopril", "", "tablet", "zero");

        let err = form
            .validate("RX-2024-006".into(), "Dr. Smith", NaiveDate::default())
            .unwrap_err();
        match err {
            ClientError::ValidationGap(fields) => assert_eq!(
                fields,
                vec!["patientMRN", "ward", "strength", "quantity", "route", "frequency"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_builds_pending_order() {
        let mut form = filled_form();
        form.medications.push(MedicationInput::default());
        form.indication = "  ".into();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let rx = form.validate("RX-2024-006".into(), "Dr. Smith", today).unwrap();

        assert_eq!(rx.status, PrescriptionStatus::Pending);
        assert_eq!(rx.date, today);
        assert_eq!(rx.prescribing_physician, "Dr. Smith");
        assert_eq!(rx.medications.len(), 2);
        assert_eq!(rx.total_quantity(), 60);
        assert_eq!(rx.indication, None);
    }

    #[test]
    fn test_medication_lines_are_capped() {
        let mut form = filled_form();
        form.add_medication_line(MedicationInput::new("Atorvastatin", "20mg", "tablet", "30"))
            .unwrap();
        assert!(matches!(
            form.add_medication_line(MedicationInput::default()),
            Err(ClientError::TooManyMedicationLines { max: 3, got: 4 })
        ));

        form.medications
            .push(MedicationInput::new("Metformin", "500mg", "tablet", "60"));
        assert!(matches!(
            form.validate("RX-1".into(), "Dr. Smith", NaiveDate::default()),
            Err(ClientError::TooManyMedicationLines { max: 3, got: 4 })
        ));

        assert!(!form.remove_medication_line(0));
        assert!(form.remove_medication_line(3));
    }

    #[test]
    fn test_apply_patient_and_reset() {
        let mut form = PrescriptionForm::new();
        form.apply_patient(&Patient {
            name: "Emma Thompson".into(),
            mrn: "MRN-34567890".into(),
            ward: "emergency".into(),
            bed: "ER-03".into(),
        });
        assert_eq!(form.ward, "emergency");
        assert_eq!(form.bed_number, "ER-03");

        form.reset();
        assert_eq!(form, PrescriptionForm::new());
    }

    #[tokio::test]
    async fn test_filter_history_only_returns_completed_matches() {
        use crate::access::DataAccess;
        let all = LocalBackend::with_sample_data()
            .fetch_prescriptions()
            .await
            .unwrap();

        let everything = filter_history(&all, None, None);
        assert!(everything.iter().all(|rx| rx.status.is_completed()));
        assert_eq!(everything.len(), 2);

        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let by_date = filter_history(&all, Some(day), None);
        assert!(by_date.iter().all(|rx| rx.date == day));
        assert_eq!(by_date.len(), 1);

        let by_status = filter_history(&all, None, Some(PrescriptionStatus::PartiallyDispensed));
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].id, "RX-2024-005");

        assert!(filter_history(&all, Some(day), Some(PrescriptionStatus::Cancelled)).is_empty());
        assert!(filter_history(&all, None, Some(PrescriptionStatus::Ready)).is_empty());
    }

    #[tokio::test]
    async fn test_submit_then_refetch_shows_new_active_order() {
        let h = signed_in_local().await;
        h.navigation.show(PageId::ActivePrescriptions).await;
        let mut form = filled_form();

        let assignment = h.controller.submit(&mut form).await.unwrap();

        assert_eq!(assignment.provisional, format!("RX-{}-006", today().format("%Y")));
        assert!(assignment.assigned.is_some());
        assert_eq!(form, PrescriptionForm::new());

        let stored = h
            .ctx
            .store
            .find_prescription(assignment.canonical())
            .await
            .unwrap();
        assert_eq!(stored.status, PrescriptionStatus::Pending);
        assert_eq!(stored.prescribing_physician, "Dr. Smith");
        assert!(h
            .ctx
            .store
            .active_prescriptions()
            .await
            .iter()
            .any(|rx| rx.id == stored.id));

        let snapshot = h.surface.snapshot();
        assert_eq!(
            snapshot.lists.get(&Container::ActiveOrders).map(ListView::len),
            Some(4)
        );
        assert_eq!(h.controller.submitted_ids(), vec![assignment]);
        assert_eq!(h.ctx.store.unread_count().await, 4);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_form_and_collection() {
        let backend = Arc::new(FaultyBackend::wrapping(LocalBackend::with_sample_data()));
        backend.fail(
            "submit_prescription",
            Fault::Rejected("Storage full".into()),
        );
        let (ctx, surface) = headless_context_with(backend);
        let h = harness(ctx, surface);
        h.session
            .login(&Credentials::new("smith", "secret"))
            .await
            .unwrap();
        h.ctx.store.refresh_all().await;
        let before_orders = h.ctx.store.prescriptions().await;

        let mut form = filled_form();
        let before = form.clone();
        let result = h.controller.submit(&mut form).await;

        assert!(matches!(result, Err(ClientError::ServerRejection(_))));
        assert_eq!(form, before);
        assert_eq!(h.ctx.store.prescriptions().await, before_orders);
        assert!(h.controller.submitted_ids().is_empty());
        let toast = h.surface.snapshot().last_toast().cloned().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn test_submit_requires_session() {
        let (ctx, surface) = headless_context(LocalBackend::new());
        let h = harness(ctx, surface);

        let mut form = filled_form();
        assert!(matches!(
            h.controller.submit(&mut form).await,
            Err(ClientError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_collect_moves_order_to_history() {
        let h = signed_in_local().await;
        h.navigation.show(PageId::ActivePrescriptions).await;

        h.controller.collect("RX-2024-003").await.unwrap();

        let rx = h.ctx.store.find_prescription("RX-2024-003").await.unwrap();
        assert_eq!(rx.status, PrescriptionStatus::Dispensed);
        assert_eq!(
            h.surface.snapshot().last_toast().unwrap().message,
            "Epinephrine 1mg/ml (injection) collected successfully!"
        );
        assert_eq!(h.ctx.store.unread_count().await, 4);
    }

    #[tokio::test]
    async fn test_failed_collect_leaves_state_untouched() {
        let h = signed_in_local().await;

        let result = h.controller.collect("RX-2024-004").await;

        assert!(matches!(result, Err(ClientError::InvalidTransition { .. })));
        let rx = h.ctx.store.find_prescription("RX-2024-004").await.unwrap();
        assert_eq!(rx.status, PrescriptionStatus::Dispensed);
        assert_eq!(
            h.surface.snapshot().last_toast().map(|t| t.kind),
            Some(ToastKind::Error)
        );
    }

    #[tokio::test]
    async fn test_cancel_requires_confirmation() {
        let h = signed_in_local().await;

        h.surface.set_confirm_answer(false);
        assert_eq!(
            h.controller.cancel("RX-2024-002").await.unwrap(),
            ActionOutcome::Declined
        );
        let rx = h.ctx.store.find_prescription("RX-2024-002").await.unwrap();
        assert_eq!(rx.status, PrescriptionStatus::Pending);

        h.surface.set_confirm_answer(true);
        assert_eq!(
            h.controller.cancel("RX-2024-002").await.unwrap(),
            ActionOutcome::Completed
        );
        let rx = h.ctx.store.find_prescription("RX-2024-002").await.unwrap();
        assert_eq!(rx.status, PrescriptionStatus::Cancelled);
        assert_eq!(h.surface.snapshot().prompts.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_history_renders_empty_state() {
        let h = signed_in_local().await;

        let none = h
            .controller
            .filter_history(None, Some(PrescriptionStatus::Cancelled))
            .await;

        assert!(none.is_empty());
        assert_eq!(
            h.surface.snapshot().lists.get(&Container::HistoryOrders),
            Some(&ListView::Empty(NO_FILTER_RESULTS))
        );
    }

    #[tokio::test]
    async fn test_search_patients() {
        let h = signed_in_local().await;

        let matches = h.controller.search_patients("son").await;
        let names: Vec<_> = matches.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Sarah Johnson", "Emma Thompson", "James Anderson"]);

        assert!(h.controller.search_patients("").await.is_empty());
        assert_eq!(h.controller.search_patients("MRN").await.len(), 7);
    }

    #[tokio::test]
    async fn test_modify_shows_info_toast() {
        let h = signed_in_local().await;
        h.controller.modify("RX-2024-002");
        assert_eq!(
            h.surface.snapshot().last_toast(),
            Some(&Toast::new(
                ToastKind::Info,
                "Prescription modification feature coming soon!"
            ))
        );
    }
}
