//! In-memory cache of the three backend collections.
//!
//! The store exclusively owns prescriptions, notifications and patients.
//! Collections are replaced wholesale: readers get an `Arc` snapshot of the
//! last applied response and never see a partially loaded list.
//!
//! Each refresh takes a per-collection sequence number before it suspends on
//! the network. A response is applied only when its number is newer than the
//! last one applied, so a slow earlier request can never overwrite the result
//! of a faster later one.

use crate::access::DataAccess;
use crate::error::ClientResult;
use crate::model::{compute_unread_count, Notification, Patient, Prescription};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Prescriptions,
    Notifications,
    Patients,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CollectionKind::Prescriptions => "prescriptions",
            CollectionKind::Notifications => "notifications",
            CollectionKind::Patients => "patients",
        })
    }
}

/// What a single refresh did to its collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the collection.
    Applied { len: usize },
    /// The fetch failed and the collection was emptied.
    Failed { reason: String },
    /// A newer response had already been applied; this one was dropped.
    Stale,
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RefreshOutcome::Applied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub prescriptions: RefreshOutcome,
    pub notifications: RefreshOutcome,
    pub patients: RefreshOutcome,
}

struct Slot<T> {
    items: Arc<Vec<T>>,
    applied: u64,
}

struct Collection<T> {
    slot: RwLock<Slot<T>>,
    issued: AtomicU64,
}

impl<T> Collection<T> {
    fn new() -> Self {
        Self {
            slot: RwLock::new(Slot {
                items: Arc::new(Vec::new()),
                applied: 0,
            }),
            issued: AtomicU64::new(0),
        }
    }

    fn next_ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the items if `ticket` is newer than the last applied one.
    async fn apply(&self, ticket: u64, items: Vec<T>) -> bool {
        let mut slot = self.slot.write().await;
        if ticket <= slot.applied {
            return false;
        }
        slot.items = Arc::new(items);
        slot.applied = ticket;
        true
    }

    async fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.slot.read().await.items)
    }

    async fn refresh<F>(&self, kind: CollectionKind, fetch: F) -> RefreshOutcome
    where
        F: Future<Output = ClientResult<Vec<T>>>,
    {
        let ticket = self.next_ticket();

        match fetch.await {
            Ok(items) => {
                let len = items.len();
                if self.apply(ticket, items).await {
                    tracing::info!("++ Refreshed {}: {} records", kind, len);
                    RefreshOutcome::Applied { len }
                } else {
                    tracing::debug!("discarded stale {} response #{}", kind, ticket);
                    RefreshOutcome::Stale
                }
            }
            Err(e) => {
                if self.apply(ticket, Vec::new()).await {
                    tracing::warn!("failed to load {}: {}", kind, e);
                    RefreshOutcome::Failed {
                        reason: e.to_string(),
                    }
                } else {
                    tracing::debug!("discarded stale {} failure #{}: {}", kind, ticket, e);
                    RefreshOutcome::Stale
                }
            }
        }
    }

    async fn clear(&self) {
        let ticket = self.next_ticket();
        self.apply(ticket, Vec::new()).await;
    }
}

pub struct DataStore {
    access: Arc<dyn DataAccess>,
    prescriptions: Collection<Prescription>,
    notifications: Collection<Notification>,
    patients: Collection<Patient>,
}

impl DataStore {
    pub fn new(access: Arc<dyn DataAccess>) -> Self {
        Self {
            access,
            prescriptions: Collection::new(),
            notifications: Collection::new(),
            patients: Collection::new(),
        }
    }

    /// Fetch one collection and replace the cached copy.
    ///
    /// Never fails: a fetch error leaves the collection empty and is reported
    /// through the returned [`RefreshOutcome`].
    pub async fn refresh(&self, kind: CollectionKind) -> RefreshOutcome {
        match kind {
            CollectionKind::Prescriptions => {
                self.prescriptions
                    .refresh(kind, self.access.fetch_prescriptions())
                    .await
            }
            CollectionKind::Notifications => {
                self.notifications
                    .refresh(kind, self.access.fetch_notifications())
                    .await
            }
            CollectionKind::Patients => {
                self.patients
                    .refresh(kind, self.access.fetch_patients())
                    .await
            }
        }
    }

    /// Refresh all three collections concurrently.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let (prescriptions, notifications, patients) = tokio::join!(
            self.refresh(CollectionKind::Prescriptions),
            self.refresh(CollectionKind::Notifications),
            self.refresh(CollectionKind::Patients),
        );

        RefreshSummary {
            prescriptions,
            notifications,
            patients,
        }
    }

    /// Empty every collection and drop responses still in flight.
    pub async fn clear(&self) {
        self.prescriptions.clear().await;
        self.notifications.clear().await;
        self.patients.clear().await;
    }

    pub async fn prescriptions(&self) -> Arc<Vec<Prescription>> {
        self.prescriptions.snapshot().await
    }

    pub async fn notifications(&self) -> Arc<Vec<Notification>> {
        self.notifications.snapshot().await
    }

    pub async fn patients(&self) -> Arc<Vec<Patient>> {
        self.patients.snapshot().await
    }

    pub async fn active_prescriptions(&self) -> Vec<Prescription> {
        self.prescriptions()
            .await
            .iter()
            .filter(|rx| rx.status.is_active())
            .cloned()
            .collect()
    }

    pub async fn completed_prescriptions(&self) -> Vec<Prescription> {
        self.prescriptions()
            .await
            .iter()
            .filter(|rx| rx.status.is_completed())
            .cloned()
            .collect()
    }

    pub async fn find_prescription(&self, id: &str) -> Option<Prescription> {
        self.prescriptions()
            .await
            .iter()
            .find(|rx| rx.id == id)
            .cloned()
    }

    pub async fn unread_count(&self) -> usize {
        compute_unread_count(&self.notifications().await)
    }
}
