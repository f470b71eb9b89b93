//! The dashboard command set.

use crate::bootstrap::Client;
use crate::format::format_patient;
use chrono::NaiveDate;
use clap::Subcommand;
use pharmassist_core::model::{Credentials, PrescriptionStatus, Priority};
use pharmassist_core::{
    ActionOutcome, ClientError, ClientResult, CollectionKind, DataSource, MedicationInput, PageId,
    PrescriptionForm,
};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Sign in with a username or e-mail address
    Login {
        /// Username or e-mail address
        identifier: String,
        /// Password
        password: String,
    },
    /// Create an account and sign in
    Register {
        /// E-mail address
        email: String,
        /// Password
        password: String,
    },
    /// Sign out
    Logout,
    /// Show who is signed in and the unread count
    Status,
    /// List active prescription orders
    Active,
    /// List completed prescription orders
    History {
        /// Only orders placed on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only orders with this status (dispensed, partially-dispensed, cancelled)
        #[arg(long)]
        status: Option<PrescriptionStatus>,
    },
    /// List notifications
    Notifications,
    /// Mark one notification as read
    MarkRead {
        /// Notification ID
        id: String,
    },
    /// Mark every notification as read
    MarkAllRead,
    /// Collect a ready prescription
    Collect {
        /// Prescription ID
        id: String,
    },
    /// Cancel a prescription order
    Cancel {
        /// Prescription ID
        id: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Modify a prescription order
    Modify {
        /// Prescription ID
        id: String,
    },
    /// Submit a new prescription order
    Submit {
        /// Patient MRN; name, ward and bed are looked up when omitted
        #[arg(long)]
        mrn: String,
        /// Patient name
        #[arg(long)]
        patient: Option<String>,
        /// Ward code (e.g. cardiology)
        #[arg(long)]
        ward: Option<String>,
        /// Bed number
        #[arg(long)]
        bed: Option<String>,
        /// Medication as NAME:STRENGTH:FORM:QUANTITY (up to three)
        #[arg(long = "med", required = true, value_parser = parse_medication)]
        medications: Vec<MedicationInput>,
        /// Route of administration
        #[arg(long)]
        route: String,
        /// Dosing frequency
        #[arg(long)]
        frequency: String,
        /// routine, urgent or stat
        #[arg(long, default_value = "routine")]
        priority: Priority,
        /// Clinical indication (optional)
        #[arg(long)]
        indication: Option<String>,
        /// Special instructions (optional)
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Search patients by name or MRN
    Patients {
        /// Part of a name or MRN
        query: String,
    },
    /// Switch between dark and light theme
    Theme,
    /// Show the order a notification refers to
    Related {
        /// Prescription ID
        order_id: String,
    },
}

/// Parse `NAME:STRENGTH:FORM:QUANTITY`.
pub fn parse_medication(value: &str) -> Result<MedicationInput, String> {
    let parts: Vec<&str> = value.split(':').map(str::trim).collect();
    match parts.as_slice() {
        [name, strength, form, quantity] => {
            Ok(MedicationInput::new(*name, *strength, *form, *quantity))
        }
        _ => Err(format!(
            "expected NAME:STRENGTH:FORM:QUANTITY, got '{value}'"
        )),
    }
}

fn require_session(client: &Client) -> ClientResult<()> {
    if client.dashboard().session().is_authenticated() {
        Ok(())
    } else {
        eprintln!("Please log in first.");
        Err(ClientError::Unauthenticated)
    }
}

impl Commands {
    /// Whether the command works without a signed-in user.
    fn is_public(&self) -> bool {
        matches!(
            self,
            Commands::Login { .. }
                | Commands::Register { .. }
                | Commands::Status
                | Commands::Theme
        )
    }

    /// Run the command against an already started dashboard.
    ///
    /// Failures have been shown to the user by the time this returns; the
    /// error is passed on so callers can set an exit status.
    pub async fn execute(self, client: &Client) -> ClientResult<()> {
        if !self.is_public() {
            require_session(client)?;
        }
        let dashboard = client.dashboard();

        match self {
            Commands::Login {
                identifier,
                password,
            } => {
                dashboard
                    .login(&Credentials::new(&identifier, password))
                    .await?;
            }
            Commands::Register { email, password } => {
                dashboard.register(&email, &password).await?;
            }
            Commands::Logout => {
                dashboard.logout().await;
            }
            Commands::Status => {
                let ctx = dashboard.context();
                match ctx.config.data_source() {
                    DataSource::Local => println!("Data source: offline sample data"),
                    DataSource::Remote { base_url } => println!("Data source: {}", base_url),
                }
                match dashboard.session().current_user() {
                    Some(user) => {
                        println!("Signed in as: {}", user.name);
                        if !user.email.is_empty() {
                            println!("E-mail: {}", user.email);
                        }
                        if !user.license.is_empty() {
                            println!("Licence: {}", user.license);
                        }
                        println!(
                            "Active orders: {}",
                            ctx.store.active_prescriptions().await.len()
                        );
                        println!(
                            "Unread notifications: {}",
                            dashboard.notifications().unread_count().await
                        );
                    }
                    None => println!("Not signed in."),
                }
                println!("Theme: {}", dashboard.theme().as_str());
            }
            Commands::Active => {
                dashboard.navigation().show(PageId::ActivePrescriptions).await;
            }
            Commands::History { date, status } => {
                if date.is_none() && status.is_none() {
                    dashboard
                        .navigation()
                        .show(PageId::PrescriptionHistory)
                        .await;
                } else {
                    let matches = dashboard
                        .navigation()
                        .show_filtered_history(date, status)
                        .await;
                    println!("{} matching order(s)", matches.len());
                }
            }
            Commands::Notifications => {
                dashboard.navigation().show(PageId::Notifications).await;
            }
            Commands::MarkRead { id } => {
                dashboard.notifications().mark_read(&id).await?;
            }
            Commands::MarkAllRead => {
                dashboard.notifications().mark_all_read().await?;
            }
            Commands::Collect { id } => {
                dashboard.prescriptions().collect(&id).await?;
            }
            Commands::Cancel { id, yes } => {
                client.terminal().set_assume_yes(yes);
                let outcome = dashboard.prescriptions().cancel(&id).await;
                client.terminal().set_assume_yes(false);
                if outcome? == ActionOutcome::Declined {
                    println!("Prescription {} was not cancelled.", id);
                }
            }
            Commands::Modify { id } => {
                dashboard.prescriptions().modify(&id);
            }
            Commands::Submit {
                mrn,
                patient,
                ward,
                bed,
                medications,
                route,
                frequency,
                priority,
                indication,
                instructions,
            } => {
                let mut form = PrescriptionForm::new();
                if let Some(known) = dashboard
                    .prescriptions()
                    .search_patients(&mrn)
                    .await
                    .into_iter()
                    .find(|p| p.mrn.eq_ignore_ascii_case(mrn.trim()))
                {
                    form.apply_patient(&known);
                }
                form.patient_mrn = mrn;
                if let Some(patient) = patient {
                    form.patient_name = patient;
                }
                if let Some(ward) = ward {
                    form.ward = ward;
                }
                if let Some(bed) = bed {
                    form.bed_number = bed;
                }

                let mut lines = medications.into_iter();
                if let Some(first) = lines.next() {
                    form.medications[0] = first;
                }
                for line in lines {
                    if let Err(e) = form.add_medication_line(line) {
                        eprintln!("Error adding medication: {}", e);
                        return Err(e);
                    }
                }

                form.route = route;
                form.frequency = frequency;
                form.priority = priority;
                form.indication = indication.unwrap_or_default();
                form.special_instructions = instructions.unwrap_or_default();

                let assignment = dashboard.prescriptions().submit(&mut form).await?;
                println!("Prescription ID: {}", assignment.canonical());
            }
            Commands::Patients { query } => {
                let ctx = dashboard.context();
                if ctx.store.patients().await.is_empty() {
                    ctx.store.refresh(CollectionKind::Patients).await;
                }
                let patients = dashboard.prescriptions().search_patients(&query).await;
                if patients.is_empty() {
                    println!("No patients found.");
                } else {
                    for patient in patients {
                        println!("{}", format_patient(&patient));
                    }
                }
            }
            Commands::Theme => {
                let theme = dashboard.toggle_theme();
                println!("Theme: {}", theme.as_str());
            }
            Commands::Related { order_id } => {
                if !dashboard.navigation().view_related_order(&order_id).await {
                    println!("Order {} not found.", order_id);
                    return Err(ClientError::UnknownPrescription(order_id));
                }
            }
        }

        Ok(())
    }
}
