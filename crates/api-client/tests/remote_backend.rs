mod common;

use common::{seeded, spawn_device, DeviceState, PASSWORD, TOKEN, USERNAME};
use pharmassist_api_client::RemoteBackend;
use pharmassist_core::access::DiagnosticEvent;
use pharmassist_core::model::{Credentials, MedicationLine, Prescription, PrescriptionStatus, Priority};
use pharmassist_core::{ClientError, DataAccess};
use serde_json::json;
use std::time::Duration;

fn backend(base_url: &str) -> RemoteBackend {
    RemoteBackend::new(base_url, Duration::from_secs(5)).unwrap()
}

async fn signed_in(base_url: &str) -> RemoteBackend {
    let backend = backend(base_url);
    backend
        .login(&Credentials::new(USERNAME, PASSWORD))
        .await
        .unwrap();
    backend
}

fn order(id: &str) -> Prescription {
    Prescription {
        id: id.into(),
        patient_name: "Sarah Johnson".into(),
        patient_mrn: "MRN-12345678".into(),
        medications: vec![
            MedicationLine {
                medication_name: "Lisinopril".into(),
                strength: "10mg".into(),
                dosage_form: "tablet".into(),
                quantity: 30,
            },
            MedicationLine {
                medication_name: "Aspirin".into(),
                strength: "75mg".into(),
                dosage_form: "tablet".into(),
                quantity: 28,
            },
        ],
        route: "oral".into(),
        frequency: "once-daily".into(),
        priority: Priority::Urgent,
        indication: Some("Hypertension".into()),
        special_instructions: None,
        ward: "cardiology".into(),
        bed_number: Some("C-12".into()),
        status: PrescriptionStatus::Pending,
        date: chrono::NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
        prescribing_physician: "Dr. Jane Smith".into(),
        completed_date: None,
        dispensed_by: None,
        partial_quantity: None,
        partial_reason: None,
    }
}

#[tokio::test]
async fn test_login_installs_session_cookie() {
    let (base_url, _device) = spawn_device(seeded()).await;
    let backend = backend(&base_url);

    let outcome = backend
        .login(&Credentials::new(USERNAME, PASSWORD))
        .await
        .unwrap();

    assert_eq!(outcome.user.name, "Dr. Jane Smith");
    assert_eq!(outcome.session_token.as_deref(), Some(TOKEN));

    let validation = backend.validate_session().await.unwrap();
    assert!(validation.valid);
    assert_eq!(validation.full_name.as_deref(), Some("Dr. Jane Smith"));
}

#[tokio::test]
async fn test_login_by_email() {
    let (base_url, _device) = spawn_device(seeded()).await;

    let outcome = backend(&base_url)
        .login(&Credentials::new("jane.smith@hospital.org", PASSWORD))
        .await
        .unwrap();

    assert_eq!(outcome.user.license, "MD-12345");
}

#[tokio::test]
async fn test_wrong_password_is_a_rejection_not_a_lost_session() {
    let (base_url, _device) = spawn_device(seeded()).await;

    let result = backend(&base_url)
        .login(&Credentials::new(USERNAME, "guess"))
        .await;

    assert!(matches!(
        result,
        Err(ClientError::ServerRejection(m)) if m == "Invalid credentials"
    ));
}

#[tokio::test]
async fn test_register_signs_in() {
    let (base_url, _device) = spawn_device(seeded()).await;
    let backend = backend(&base_url);

    backend
        .register("new.doctor@hospital.org", "pw")
        .await
        .unwrap();

    assert_eq!(backend.fetch_patients().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fetch_without_session_is_unauthenticated() {
    let (base_url, _device) = spawn_device(seeded()).await;
    let backend = backend(&base_url);

    assert!(matches!(
        backend.fetch_prescriptions().await,
        Err(ClientError::Unauthenticated)
    ));
    assert!(!backend.validate_session().await.unwrap().valid);
}

#[tokio::test]
async fn test_resumed_token_is_sent_by_a_fresh_client() {
    let (base_url, _device) = spawn_device(seeded()).await;
    let backend = backend(&base_url);

    backend.resume_session(TOKEN);

    assert!(backend.validate_session().await.unwrap().valid);
    assert_eq!(backend.fetch_notifications().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_prescription_list_accepts_both_shapes_and_skips_broken_records() {
    let (base_url, _device) = spawn_device(seeded()).await;
    let backend = signed_in(&base_url).await;

    let prescriptions = backend.fetch_prescriptions().await.unwrap();

    let ids: Vec<_> = prescriptions.iter().map(|rx| rx.id.as_str()).collect();
    assert_eq!(ids, ["RX-2024-001", "RX-2024-002", "RX-2024-003"]);
    assert_eq!(prescriptions[1].medication_summary(), "Epinephrine 1mg/ml (injection)");
    assert_eq!(prescriptions[1].total_quantity(), 2);
    assert_eq!(prescriptions[2].dispensed_by.as_deref(), Some("J. Patel"));
}

#[tokio::test]
async fn test_notification_list_normalises_empty_related_order() {
    let (base_url, _device) = spawn_device(seeded()).await;
    let backend = signed_in(&base_url).await;

    let notifications = backend.fetch_notifications().await.unwrap();

    assert_eq!(
        notifications[0].related_order_id.as_deref(),
        Some("RX-2024-002")
    );
    assert_eq!(notifications[1].related_order_id, None);
}

#[tokio::test]
async fn test_submit_sends_medication_lines() {
    let (base_url, device) = spawn_device(seeded()).await;
    let backend = signed_in(&base_url).await;

    let ack = backend
        .submit_prescription(&order("RX-2024-004"))
        .await
        .unwrap();

    assert_eq!(ack.message.as_deref(), Some("Prescription received and saved."));
    assert_eq!(ack.assigned_id, None);

    let state = device.lock();
    let sent = &state.submissions[0];
    assert_eq!(sent["id"], "RX-2024-004");
    assert_eq!(sent["patientMRN"], "MRN-12345678");
    assert_eq!(sent["priority"], "urgent");
    assert_eq!(sent["bedNumber"], "C-12");
    assert_eq!(sent["medications"].as_array().unwrap().len(), 2);
    assert_eq!(sent["medications"][1]["medicationName"], "Aspirin");
}

#[tokio::test]
async fn test_submit_reports_assigned_id() {
    let (base_url, _device) = spawn_device(DeviceState {
        assign_id: Some("RX-2024-101".into()),
        ..seeded()
    })
    .await;
    let backend = signed_in(&base_url).await;

    let ack = backend
        .submit_prescription(&order("RX-2024-004"))
        .await
        .unwrap();

    assert_eq!(ack.assigned_id.as_deref(), Some("RX-2024-101"));
}

#[tokio::test]
async fn test_submit_refused_by_device() {
    let (base_url, device) = spawn_device(DeviceState {
        refuse_submissions: Some("Storage full".into()),
        ..seeded()
    })
    .await;
    let backend = signed_in(&base_url).await;

    let result = backend.submit_prescription(&order("RX-2024-004")).await;

    assert!(matches!(
        result,
        Err(ClientError::ServerRejection(m)) if m == "Storage full"
    ));
    assert!(device.lock().submissions.is_empty());
}

#[tokio::test]
async fn test_order_actions() {
    let (base_url, device) = spawn_device(seeded()).await;
    let backend = signed_in(&base_url).await;

    backend.collect_prescription("RX-2024-002").await.unwrap();
    backend.cancel_prescription("RX-2024-001").await.unwrap();

    {
        let state = device.lock();
        assert_eq!(state.prescriptions[0]["status"], "cancelled");
        assert_eq!(state.prescriptions[1]["status"], "dispensed");
    }

    assert!(matches!(
        backend.collect_prescription("RX-9999-999").await,
        Err(ClientError::ServerRejection(m)) if m == "Prescription not found"
    ));
}

#[tokio::test]
async fn test_order_ids_are_sent_as_one_path_segment() {
    let mut state = seeded();
    state.prescriptions[0]["id"] = json!("RX/2024?001#a");
    let (base_url, device) = spawn_device(state).await;
    let backend = signed_in(&base_url).await;

    backend.collect_prescription("RX/2024?001#a").await.unwrap();
    assert_eq!(device.lock().prescriptions[0]["status"], "dispensed");

    assert!(matches!(
        backend.cancel_prescription("RX/2024").await,
        Err(ClientError::ServerRejection(m)) if m == "Prescription not found"
    ));
    assert!(matches!(
        backend.cancel_prescription("..").await,
        Err(ClientError::UnknownPrescription(id)) if id == ".."
    ));
    assert!(matches!(
        backend.mark_notification_read("").await,
        Err(ClientError::UnknownNotification(_))
    ));
}

#[tokio::test]
async fn test_mark_read_and_mark_all_read() {
    let (base_url, _device) = spawn_device(seeded()).await;
    let backend = signed_in(&base_url).await;

    backend.mark_notification_read("NOTIF-001").await.unwrap();
    let unread = backend
        .fetch_notifications()
        .await
        .unwrap()
        .iter()
        .filter(|n| !n.read)
        .count();
    assert_eq!(unread, 1);

    backend.mark_all_notifications_read().await.unwrap();
    assert!(backend
        .fetch_notifications()
        .await
        .unwrap()
        .iter()
        .all(|n| n.read));
}

#[tokio::test]
async fn test_log_event_posts_context_and_details() {
    let (base_url, device) = spawn_device(seeded()).await;
    let backend = backend(&base_url);

    backend
        .log_event(&DiagnosticEvent::new(
            "prescription_submit_failed",
            json!({"id": "RX-2024-004"}),
        ))
        .await
        .unwrap();

    assert_eq!(
        device.lock().logs,
        vec![json!({"context": "prescription_submit_failed", "details": {"id": "RX-2024-004"}})]
    );
}

#[tokio::test]
async fn test_logout_drops_the_session() {
    let (base_url, device) = spawn_device(seeded()).await;
    let backend = signed_in(&base_url).await;

    backend.logout().await.unwrap();

    assert!(device.lock().logged_out);
    assert!(!backend.validate_session().await.unwrap().valid);
    assert!(matches!(
        backend.fetch_patients().await,
        Err(ClientError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_unreachable_device_is_a_network_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = RemoteBackend::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();

    assert!(matches!(
        backend.fetch_prescriptions().await,
        Err(ClientError::NetworkFailure(_))
    ));
}
