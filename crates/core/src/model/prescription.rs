use super::{empty_as_none, ParseVariantError};
use crate::constants::PRESCRIPTION_ID_PREFIX;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a prescription order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrescriptionStatus {
    Pending,
    Processing,
    Dispensing,
    Ready,
    Dispensed,
    PartiallyDispensed,
    Cancelled,
}

impl PrescriptionStatus {
    /// States shown on the active orders page.
    pub const ACTIVE: [PrescriptionStatus; 4] = [
        PrescriptionStatus::Pending,
        PrescriptionStatus::Processing,
        PrescriptionStatus::Dispensing,
        PrescriptionStatus::Ready,
    ];

    /// Terminal states shown on the history page.
    pub const COMPLETED: [PrescriptionStatus; 3] = [
        PrescriptionStatus::Dispensed,
        PrescriptionStatus::PartiallyDispensed,
        PrescriptionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionStatus::Pending => "pending",
            PrescriptionStatus::Processing => "processing",
            PrescriptionStatus::Dispensing => "dispensing",
            PrescriptionStatus::Ready => "ready",
            PrescriptionStatus::Dispensed => "dispensed",
            PrescriptionStatus::PartiallyDispensed => "partially-dispensed",
            PrescriptionStatus::Cancelled => "cancelled",
        }
    }

    /// Human readable status label.
    pub fn label(&self) -> &'static str {
        match self {
            PrescriptionStatus::Pending => "Pending Review",
            PrescriptionStatus::Processing => "Processing",
            PrescriptionStatus::Dispensing => "Being Dispensed",
            PrescriptionStatus::Ready => "Ready for Collection",
            PrescriptionStatus::Dispensed => "Dispensed",
            PrescriptionStatus::PartiallyDispensed => "Partially Dispensed",
            PrescriptionStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_completed(&self) -> bool {
        Self::COMPLETED.contains(self)
    }

    fn stage(&self) -> u8 {
        match self {
            PrescriptionStatus::Pending => 0,
            PrescriptionStatus::Processing => 1,
            PrescriptionStatus::Dispensing => 2,
            PrescriptionStatus::Ready => 3,
            _ => 4,
        }
    }

    /// Whether an order in this state may move to `next`.
    ///
    /// Active states only move forward, any active state may be cancelled,
    /// and only `dispensing`/`ready` orders can be (partially) dispensed.
    /// Terminal states never change.
    pub fn can_transition_to(self, next: PrescriptionStatus) -> bool {
        if self.is_completed() || self == next {
            return false;
        }

        match next {
            PrescriptionStatus::Cancelled => true,
            PrescriptionStatus::Dispensed | PrescriptionStatus::PartiallyDispensed => matches!(
                self,
                PrescriptionStatus::Dispensing | PrescriptionStatus::Ready
            ),
            _ => next.stage() > self.stage(),
        }
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrescriptionStatus {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ACTIVE
            .iter()
            .chain(Self::COMPLETED.iter())
            .copied()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ParseVariantError {
                kind: "prescription status",
                value: s.to_string(),
            })
    }
}

/// Clinical urgency of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Routine,
    Urgent,
    Stat,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Routine => "routine",
            Priority::Urgent => "urgent",
            Priority::Stat => "stat",
        }
    }

    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "routine" => Ok(Priority::Routine),
            "urgent" => Ok(Priority::Urgent),
            "stat" => Ok(Priority::Stat),
            _ => Err(ParseVariantError {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// One medication on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLine {
    pub medication_name: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub dosage_form: String,
    #[serde(default)]
    pub quantity: u32,
}

impl MedicationLine {
    /// `Lisinopril 10mg (tablet)`
    pub fn summary(&self) -> String {
        let mut out = self.medication_name.clone();
        if !self.strength.is_empty() {
            out.push(' ');
            out.push_str(&self.strength);
        }
        if !self.dosage_form.is_empty() {
            out.push_str(&format!(" ({})", self.dosage_form));
        }
        out
    }
}

/// A physician-submitted prescription order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PrescriptionRecord")]
pub struct Prescription {
    pub id: String,
    pub patient_name: String,
    #[serde(rename = "patientMRN")]
    pub patient_mrn: String,
    pub medications: Vec<MedicationLine>,
    pub route: String,
    pub frequency: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub ward: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_number: Option<String>,
    pub status: PrescriptionStatus,
    pub date: NaiveDate,
    pub prescribing_physician: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispensed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_reason: Option<String>,
}

impl Prescription {
    /// Sum of the quantities of every medication line.
    /// Wider than a line quantity; backend lines may total more than `u32::MAX`.
    pub fn total_quantity(&self) -> u64 {
        self.medications.iter().map(|m| u64::from(m.quantity)).sum()
    }

    pub fn primary_medication(&self) -> Option<&MedicationLine> {
        self.medications.first()
    }

    /// Medication summaries joined for a card title.
    pub fn medication_summary(&self) -> String {
        self.medications
            .iter()
            .map(MedicationLine::summary)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check the record-level invariants: at least one medication line, a
    /// total that fits in a `u32`, and a partial quantity never larger than the
    /// ordered quantity.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.medications.is_empty() {
            return Err(format!("prescription {} has no medication lines", self.id));
        }

        let total = self.total_quantity();
        if total > u64::from(u32::MAX) {
            return Err(format!(
                "prescription {} orders {total} units in total",
                self.id
            ));
        }

        if let Some(partial) = self.partial_quantity {
            if u64::from(partial) > total {
                return Err(format!(
                    "prescription {} partially dispensed {partial} of {total} units",
                    self.id
                ));
            }
        }

        Ok(())
    }
}

/// Wire shape accepted when reading prescriptions.
///
/// Submissions use a `medications` array; list endpoints may flatten the first
/// medication onto the record instead.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrescriptionRecord {
    id: String,
    #[serde(default)]
    patient_name: String,
    #[serde(rename = "patientMRN", default)]
    patient_mrn: String,
    #[serde(default)]
    medications: Vec<MedicationLine>,
    #[serde(default, deserialize_with = "empty_as_none")]
    medication_name: Option<String>,
    #[serde(default)]
    strength: Option<String>,
    #[serde(default)]
    dosage_form: Option<String>,
    #[serde(default)]
    quantity: Option<u32>,
    #[serde(default)]
    route: String,
    #[serde(default)]
    frequency: String,
    #[serde(default)]
    priority: Priority,
    #[serde(default, deserialize_with = "empty_as_none")]
    indication: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    special_instructions: Option<String>,
    #[serde(default)]
    ward: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    bed_number: Option<String>,
    #[serde(default = "pending")]
    status: PrescriptionStatus,
    date: NaiveDate,
    #[serde(default)]
    prescribing_physician: String,
    #[serde(default)]
    completed_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    dispensed_by: Option<String>,
    #[serde(default)]
    partial_quantity: Option<u32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    partial_reason: Option<String>,
}

fn pending() -> PrescriptionStatus {
    PrescriptionStatus::Pending
}

impl TryFrom<PrescriptionRecord> for Prescription {
    type Error = String;

    fn try_from(record: PrescriptionRecord) -> Result<Self, Self::Error> {
        let mut medications = record.medications;
        if medications.is_empty() {
            if let Some(medication_name) = record.medication_name {
                medications.push(MedicationLine {
                    medication_name,
                    strength: record.strength.unwrap_or_default(),
                    dosage_form: record.dosage_form.unwrap_or_default(),
                    quantity: record.quantity.unwrap_or_default(),
                });
            }
        }

        let prescription = Prescription {
            id: record.id,
            patient_name: record.patient_name,
            patient_mrn: record.patient_mrn,
            medications,
            route: record.route,
            frequency: record.frequency,
            priority: record.priority,
            indication: record.indication,
            special_instructions: record.special_instructions,
            ward: record.ward,
            bed_number: record.bed_number,
            status: record.status,
            date: record.date,
            prescribing_physician: record.prescribing_physician,
            completed_date: record.completed_date,
            dispensed_by: record.dispensed_by,
            partial_quantity: record.partial_quantity,
            partial_reason: record.partial_reason,
        };

        prescription.check_invariants()?;
        Ok(prescription)
    }
}

/// Build an identifier of the form `RX-<year>-<zero padded sequence>`.
///
/// The sequence is `existing + 1`. Identifiers built this way are provisional:
/// two sessions computing from the same count will collide, so the backend's
/// identifier always wins once the order has been stored.
pub fn generate_prescription_id(existing: usize, today: NaiveDate) -> String {
    format!(
        "{PRESCRIPTION_ID_PREFIX}-{}-{:03}",
        today.year(),
        existing + 1
    )
}

/// Extract the numeric sequence from an `RX-<year>-<seq>` identifier.
pub fn parse_prescription_sequence(id: &str) -> Option<u32> {
    let mut parts = id.splitn(3, '-');
    if parts.next()? != PRESCRIPTION_ID_PREFIX {
        return None;
    }
    parts.next()?.parse::<i32>().ok()?;
    parts.next()?.parse().ok()
}
