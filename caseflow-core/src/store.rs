use crate::error::StoreError;
use crate::events::TimelineEntry;
use crate::types::{Incident, IncidentApproval, Referral, WorkflowStep};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Persistence trait for all caseflow state.
///
/// The engines operate exclusively through this trait, enabling
/// pluggable backends (MemoryStore for tests and POC, a relational
/// store in production).
///
/// The `commit_*` methods are compare-and-set transactions: they verify
/// the caller's previously-read status/level, apply the state write and
/// the audit append as one unit, and fail with [`StoreError::Conflict`]
/// if another request won the race. A crash can never leave a state
/// change without its audit record or vice versa.
#[async_trait]
pub trait CaseStore: Send + Sync {
    // ── Referrals ──

    async fn save_referral(&self, referral: &Referral) -> Result<(), StoreError>;
    async fn load_referral(&self, id: Uuid) -> Result<Option<Referral>, StoreError>;

    /// CAS on `expected_status`: persist `updated` and append `entry`
    /// atomically.
    async fn commit_advance(
        &self,
        id: Uuid,
        expected_status: WorkflowStep,
        updated: &Referral,
        entry: &TimelineEntry,
    ) -> Result<(), StoreError>;

    // ── Incidents ──

    async fn save_incident(&self, incident: &Incident) -> Result<(), StoreError>;
    async fn load_incident(&self, id: Uuid) -> Result<Option<Incident>, StoreError>;

    /// CAS on `expected_level`: persist `updated`, append the approval
    /// history record and the timeline entry atomically.
    async fn commit_approval(
        &self,
        id: Uuid,
        expected_level: u8,
        updated: &Incident,
        approval: &IncidentApproval,
        entry: &TimelineEntry,
    ) -> Result<(), StoreError>;

    /// Approval history for an incident, in insertion (chronological) order.
    async fn load_approvals(&self, incident_id: Uuid) -> Result<Vec<IncidentApproval>, StoreError>;

    // ── Timeline (append-only) ──

    async fn append_timeline(&self, entry: &TimelineEntry) -> Result<(), StoreError>;

    /// Timeline entries for one entity, in insertion order.
    async fn read_timeline(&self, entity_id: Uuid) -> Result<Vec<TimelineEntry>, StoreError>;
}

// ── MemoryStore ──

#[derive(Default)]
struct Tables {
    referrals: HashMap<Uuid, Referral>,
    incidents: HashMap<Uuid, Incident>,
    approvals: Vec<IncidentApproval>,
    timeline: Vec<TimelineEntry>,
}

/// In-memory CaseStore for tests and POC.
///
/// A single lock guards all tables, so each `commit_*` call is a real
/// transaction: the CAS check and both writes happen under one write
/// guard.
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_err<T>(err: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Backend(format!("lock poisoned: {err}"))
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn save_referral(&self, referral: &Referral) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(lock_err)?;
        tables.referrals.insert(referral.id, referral.clone());
        Ok(())
    }

    async fn load_referral(&self, id: Uuid) -> Result<Option<Referral>, StoreError> {
        let tables = self.inner.read().map_err(lock_err)?;
        Ok(tables.referrals.get(&id).cloned())
    }

    async fn commit_advance(
        &self,
        id: Uuid,
        expected_status: WorkflowStep,
        updated: &Referral,
        entry: &TimelineEntry,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(lock_err)?;
        let current = tables
            .referrals
            .get(&id)
            .ok_or_else(|| StoreError::Backend(format!("referral {id} vanished mid-commit")))?;
        if current.workflow_status != expected_status {
            return Err(StoreError::Conflict {
                entity: "referral",
                id,
            });
        }
        tables.referrals.insert(id, updated.clone());
        tables.timeline.push(entry.clone());
        Ok(())
    }

    async fn save_incident(&self, incident: &Incident) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(lock_err)?;
        tables.incidents.insert(incident.id, incident.clone());
        Ok(())
    }

    async fn load_incident(&self, id: Uuid) -> Result<Option<Incident>, StoreError> {
        let tables = self.inner.read().map_err(lock_err)?;
        Ok(tables.incidents.get(&id).cloned())
    }

    async fn commit_approval(
        &self,
        id: Uuid,
        expected_level: u8,
        updated: &Incident,
        approval: &IncidentApproval,
        entry: &TimelineEntry,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(lock_err)?;
        let current = tables
            .incidents
            .get(&id)
            .ok_or_else(|| StoreError::Backend(format!("incident {id} vanished mid-commit")))?;
        if current.current_approval_level != expected_level {
            return Err(StoreError::Conflict {
                entity: "incident",
                id,
            });
        }
        tables.incidents.insert(id, updated.clone());
        tables.approvals.push(approval.clone());
        tables.timeline.push(entry.clone());
        Ok(())
    }

    async fn load_approvals(&self, incident_id: Uuid) -> Result<Vec<IncidentApproval>, StoreError> {
        let tables = self.inner.read().map_err(lock_err)?;
        Ok(tables
            .approvals
            .iter()
            .filter(|a| a.incident_id == incident_id)
            .cloned()
            .collect())
    }

    async fn append_timeline(&self, entry: &TimelineEntry) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(lock_err)?;
        tables.timeline.push(entry.clone());
        Ok(())
    }

    async fn read_timeline(&self, entity_id: Uuid) -> Result<Vec<TimelineEntry>, StoreError> {
        let tables = self.inner.read().map_err(lock_err)?;
        Ok(tables
            .timeline
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect())
    }
}
