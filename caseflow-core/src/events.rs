//! Audit timeline — the durable trail behind every state mutation.
//!
//! Entries are append-only: the store assigns insertion order, nothing
//! updates or deletes them.

use crate::types::{ApprovalAction, WorkflowStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which aggregate a timeline entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Referral,
    Incident,
}

/// One audit record, written in the same transaction as the state
/// change it describes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: Uuid,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub previous_status: Option<String>,
    pub new_status: Option<String>,
    pub action: String,
    pub description: String,
    pub performed_by: String,
    pub performed_by_role: String,
    pub created_at: DateTime<Utc>,
}

impl TimelineEntry {
    /// Audit record for a successful workflow advance.
    pub fn workflow_transition(
        referral_id: Uuid,
        from: WorkflowStep,
        to: WorkflowStep,
        message: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_kind: EntityKind::Referral,
            entity_id: referral_id,
            previous_status: Some(from.to_string()),
            new_status: Some(to.to_string()),
            action: to.to_string(),
            description: message.to_string(),
            performed_by: "system".to_string(),
            performed_by_role: "System".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Audit record for an approval action on an incident.
    pub fn approval(
        incident_id: Uuid,
        action: ApprovalAction,
        approver_name: &str,
        approver_role: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_kind: EntityKind::Incident,
            entity_id: incident_id,
            previous_status: None,
            new_status: None,
            action: format!("approval_{action}"),
            description: format!("{approver_role} {action} the incident"),
            performed_by: approver_name.to_string(),
            performed_by_role: approver_role.to_string(),
            created_at: Utc::now(),
        }
    }
}
