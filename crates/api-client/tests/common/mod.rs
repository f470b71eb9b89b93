//! In-process stand-in for the dispensing unit's REST API.

#![allow(dead_code)]

use axum::{
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};

pub const TOKEN: &str = "f00dcafe";
pub const USERNAME: &str = "smith";
pub const PASSWORD: &str = "secret";

/// Records held by the fake device plus everything it has been sent.
#[derive(Debug, Default)]
pub struct DeviceState {
    pub prescriptions: Vec<Value>,
    pub notifications: Vec<Value>,
    pub patients: Vec<Value>,
    pub submissions: Vec<Value>,
    pub logs: Vec<Value>,
    pub logged_out: bool,
    /// Refuse new prescriptions with this message.
    pub refuse_submissions: Option<String>,
    /// Id reported back for accepted prescriptions.
    pub assign_id: Option<String>,
}

#[derive(Clone)]
pub struct Device(Arc<Mutex<DeviceState>>);

impl Device {
    pub fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.0.lock().unwrap()
    }
}

/// Records in the shapes the device firmware serves.
pub fn seeded() -> DeviceState {
    DeviceState {
        prescriptions: vec![
            json!({
                "id": "RX-2024-001", "patientName": "Sarah Johnson", "patientMRN": "MRN-12345678",
                "medications": [{"medicationName": "Lisinopril", "strength": "10mg",
                                 "dosageForm": "tablet", "quantity": 30}],
                "route": "oral", "frequency": "once-daily", "priority": "routine",
                "ward": "cardiology", "bedNumber": "C-12", "status": "pending",
                "date": "2024-01-16", "prescribingPhysician": "Dr. Smith"
            }),
            // Older firmware flattens the first medication onto the record.
            json!({
                "id": "RX-2024-002", "patientName": "Emma Thompson", "patientMRN": "MRN-34567890",
                "medicationName": "Epinephrine", "strength": "1mg/ml", "dosageForm": "injection",
                "quantity": 2, "route": "intramuscular", "frequency": "as-needed",
                "priority": "stat", "ward": "emergency", "status": "ready",
                "date": "2024-01-16", "prescribingPhysician": "Dr. Smith"
            }),
            json!({
                "id": "RX-2024-003", "patientName": "Robert Chen", "patientMRN": "MRN-45678901",
                "medicationName": "Metformin", "strength": "500mg", "dosageForm": "tablet",
                "quantity": 60, "route": "oral", "frequency": "twice-daily",
                "priority": "routine", "ward": "internal", "status": "dispensed",
                "date": "2024-01-15", "completedDate": "2024-01-15",
                "dispensedBy": "J. Patel", "prescribingPhysician": "Dr. Smith"
            }),
            json!({"id": "RX-BROKEN", "patientName": "No date"}),
        ],
        notifications: vec![
            json!({"id": "NOTIF-001", "title": "Prescription Ready for Collection",
                   "content": "Epinephrine is ready.", "type": "success", "priority": "urgent",
                   "time": "5 minutes ago", "read": false, "actionRequired": true,
                   "relatedOrderId": "RX-2024-002"}),
            json!({"id": "NOTIF-002", "title": "Stock Alert", "content": "Low stock.",
                   "type": "warning", "priority": "high", "time": "1 hour ago",
                   "read": false, "actionRequired": false, "relatedOrderId": ""}),
            json!({"id": "NOTIF-003", "title": "Dispensed", "content": "Metformin dispensed.",
                   "type": "info", "priority": "normal", "time": "Yesterday",
                   "read": true, "actionRequired": false}),
        ],
        patients: vec![
            json!({"name": "Sarah Johnson", "mrn": "MRN-12345678", "ward": "cardiology", "bed": "C-12"}),
            json!({"name": "Emma Thompson", "mrn": "MRN-34567890", "ward": "emergency", "bed": "E-4"}),
            json!({"name": "Robert Chen", "mrn": "MRN-45678901", "ward": "internal", "bed": "I-7"}),
        ],
        ..DeviceState::default()
    }
}

/// Serve `state` on an ephemeral local port and return its base URL.
pub async fn spawn_device(state: DeviceState) -> (String, Device) {
    let device = Device(Arc::new(Mutex::new(state)));

    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/logout", post(logout))
        .route("/api/validate-session", get(validate_session))
        .route("/api/prescriptions", get(list_prescriptions))
        .route("/api/notifications", get(list_notifications))
        .route("/api/patients", get(list_patients))
        .route("/api/prescription", post(submit_prescription))
        .route("/api/prescriptions/:id/collect", post(collect))
        .route("/api/prescriptions/:id/cancel", post(cancel))
        .route("/api/notifications/:id/read", post(mark_read))
        .route("/api/notifications/mark-all-read", post(mark_all_read))
        .route("/api/log", post(log))
        .with_state(device.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/"), device)
}

fn has_session(headers: &HeaderMap) -> bool {
    let expected = format!("session_token={TOKEN}");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .any(|pair| pair.trim() == expected)
}

fn unauthorised() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Unauthorized"})),
    )
        .into_response()
}

fn signed_in(message: &str) -> Response {
    (
        [(
            header::SET_COOKIE,
            format!("session_token={TOKEN}; Path=/; Max-Age=3600"),
        )],
        Json(json!({
            "success": true,
            "message": message,
            "session_token": TOKEN,
            "user": {
                "name": "Dr. Jane Smith",
                "email": "jane.smith@hospital.org",
                "license": "MD-12345",
                "department": "Cardiology"
            }
        })),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let identity_ok = match body["type"].as_str() {
        Some("username") => body["username"] == USERNAME,
        Some("email") => body["email"] == "jane.smith@hospital.org",
        _ => false,
    };

    if identity_ok && body["password"] == PASSWORD {
        signed_in("Login successful")
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["email"].as_str().is_some_and(|e| e.contains('@')) {
        signed_in("Registration successful")
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Invalid email"})),
        )
            .into_response()
    }
}

async fn logout(State(device): State<Device>) -> Response {
    device.lock().logged_out = true;
    (
        [(header::SET_COOKIE, "session_token=; Path=/; Max-Age=0")],
        Json(json!({"success": true, "message": "Logged out successfully"})),
    )
        .into_response()
}

async fn validate_session(headers: HeaderMap) -> Json<Value> {
    if has_session(&headers) {
        Json(json!({"valid": true, "username": USERNAME, "fullName": "Dr. Jane Smith"}))
    } else {
        Json(json!({"valid": false}))
    }
}

fn list(headers: &HeaderMap, records: Vec<Value>) -> Response {
    if !has_session(headers) {
        return unauthorised();
    }
    Json(json!({"success": true, "data": records})).into_response()
}

async fn list_prescriptions(State(device): State<Device>, headers: HeaderMap) -> Response {
    let records = device.lock().prescriptions.clone();
    list(&headers, records)
}

async fn list_notifications(State(device): State<Device>, headers: HeaderMap) -> Response {
    let records = device.lock().notifications.clone();
    list(&headers, records)
}

async fn list_patients(State(device): State<Device>, headers: HeaderMap) -> Response {
    let records = device.lock().patients.clone();
    list(&headers, records)
}

async fn submit_prescription(
    State(device): State<Device>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !has_session(&headers) {
        return unauthorised();
    }

    let mut state = device.lock();
    if let Some(message) = state.refuse_submissions.clone() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "message": message})),
        )
            .into_response();
    }

    state.submissions.push(body.clone());
    let assigned = state.assign_id.clone();
    if let Some(id) = &assigned {
        body["id"] = json!(id);
    }
    state.prescriptions.push(body);

    let mut answer = json!({"success": true, "message": "Prescription received and saved."});
    if let Some(id) = assigned {
        answer["id"] = json!(id);
    }
    Json(answer).into_response()
}

fn set_status(device: &Device, id: &str, status: &str) -> Response {
    let mut state = device.lock();
    match state.prescriptions.iter_mut().find(|rx| rx["id"] == id) {
        Some(rx) => {
            rx["status"] = json!(status);
            Json(json!({"success": true})).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Prescription not found"})),
        )
            .into_response(),
    }
}

async fn collect(
    State(device): State<Device>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Response {
    if !has_session(&headers) {
        return unauthorised();
    }
    set_status(&device, &id, "dispensed")
}

async fn cancel(
    State(device): State<Device>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Response {
    if !has_session(&headers) {
        return unauthorised();
    }
    set_status(&device, &id, "cancelled")
}

async fn mark_read(
    State(device): State<Device>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Response {
    if !has_session(&headers) {
        return unauthorised();
    }
    let mut state = device.lock();
    for n in state.notifications.iter_mut().filter(|n| n["id"] == id) {
        n["read"] = json!(true);
    }
    Json(json!({"success": true})).into_response()
}

async fn mark_all_read(State(device): State<Device>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return unauthorised();
    }
    for n in device.lock().notifications.iter_mut() {
        n["read"] = json!(true);
    }
    // The firmware answers this one with an empty body.
    StatusCode::OK.into_response()
}

async fn log(State(device): State<Device>, Json(body): Json<Value>) -> StatusCode {
    device.lock().logs.push(body);
    StatusCode::OK
}
