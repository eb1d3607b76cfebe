//! Incident approval engine.
//!
//! An incident climbs a fixed sign-off ladder, level 1 (Team Leader)
//! through level 4 (CEO). Which levels are required depends on severity
//! and NDIS notification; every decision lands in an append-only
//! history, atomic with the level/status write.

use crate::error::EngineError;
use crate::events::TimelineEntry;
use crate::store::CaseStore;
use crate::types::{ApprovalAction, Incident, IncidentApproval, IncidentStatus, Severity};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const MAX_APPROVAL_LEVEL: u8 = 4;

/// One rung of the sign-off ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LevelRequirement {
    pub level: u8,
    pub role: &'static str,
    pub required: bool,
}

/// The four-level ladder for a given incident profile.
///
/// Level 1 is always required; 2 for high/critical severity; 3 for
/// critical; 4 once the NDIS commission has been notified.
pub fn approval_chain(severity: Severity, ndis_notified: bool) -> [LevelRequirement; 4] {
    let high_or_critical = matches!(severity, Severity::High | Severity::Critical);
    [
        LevelRequirement {
            level: 1,
            role: "Team Leader",
            required: true,
        },
        LevelRequirement {
            level: 2,
            role: "Manager",
            required: high_or_critical,
        },
        LevelRequirement {
            level: 3,
            role: "Director",
            required: severity == Severity::Critical,
        },
        LevelRequirement {
            level: 4,
            role: "CEO",
            required: ndis_notified,
        },
    ]
}

/// Highest required level for an incident profile. At least 1.
pub fn required_level(severity: Severity, ndis_notified: bool) -> u8 {
    approval_chain(severity, ndis_notified)
        .iter()
        .filter(|r| r.required)
        .map(|r| r.level)
        .max()
        .unwrap_or(1)
}

/// An approval submission, as received from the caller. The approver
/// identity/role is resolved upstream and passed in.
#[derive(Clone, Debug)]
pub struct ApprovalRequest {
    pub action: ApprovalAction,
    pub comments: String,
    pub approver_name: String,
    pub approver_role: String,
    pub approval_level: u8,
}

/// The approval engine. Operates exclusively through a [`CaseStore`].
pub struct ApprovalEngine {
    store: Arc<dyn CaseStore>,
}

impl ApprovalEngine {
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self { store }
    }

    /// Record an approval decision and, for approving actions, advance
    /// the incident's level by exactly one.
    ///
    /// Approving actions (`approved`, `escalated`) must target
    /// `current_approval_level + 1` — no skipping. The level write, the
    /// history append and the timeline append commit as one unit; a
    /// concurrent submission past the same boundary loses the
    /// compare-and-set and gets [`EngineError::StateConflict`].
    pub async fn submit_approval(
        &self,
        incident_id: Uuid,
        request: ApprovalRequest,
    ) -> Result<IncidentApproval, EngineError> {
        let comments = request.comments.trim();
        if comments.is_empty() {
            return Err(EngineError::Validation("Comments are required".to_string()));
        }
        if request.approver_name.trim().is_empty() {
            return Err(EngineError::Validation(
                "Approver name is required".to_string(),
            ));
        }
        if request.approval_level < 1 || request.approval_level > MAX_APPROVAL_LEVEL {
            return Err(EngineError::Validation(format!(
                "Approval level must be between 1 and {MAX_APPROVAL_LEVEL}"
            )));
        }

        let incident = self
            .store
            .load_incident(incident_id)
            .await?
            .ok_or(EngineError::IncidentNotFound(incident_id))?;

        if incident.status.is_final() {
            return Err(EngineError::Validation(
                "Approval workflow already complete".to_string(),
            ));
        }

        let mut updated = incident.clone();
        if request.action.advances_level() {
            let expected = incident.current_approval_level + 1;
            if request.approval_level != expected {
                return Err(EngineError::InvalidLevel {
                    submitted: request.approval_level,
                    expected,
                });
            }
            updated.current_approval_level = expected;
            updated.status = if expected >= required_level(incident.severity, incident.ndis_notified)
            {
                IncidentStatus::Approved
            } else if request.action == ApprovalAction::Escalated {
                IncidentStatus::Escalated
            } else {
                IncidentStatus::UnderReview
            };
        }
        updated.updated_at = Utc::now();

        let approval = IncidentApproval {
            id: Uuid::new_v4(),
            incident_id,
            approval_level: request.approval_level,
            approver_name: request.approver_name.clone(),
            approver_role: request.approver_role.clone(),
            action: request.action,
            comments: comments.to_string(),
            created_at: Utc::now(),
        };
        let entry = TimelineEntry::approval(
            incident_id,
            request.action,
            &request.approver_name,
            &request.approver_role,
        );

        self.store
            .commit_approval(
                incident_id,
                incident.current_approval_level,
                &updated,
                &approval,
                &entry,
            )
            .await?;

        info!(
            incident = %incident_id,
            action = %request.action,
            level = request.approval_level,
            new_level = updated.current_approval_level,
            status = ?updated.status,
            "approval recorded"
        );
        Ok(approval)
    }

    /// Approval history for an incident, oldest first.
    pub async fn approvals(&self, incident_id: Uuid) -> Result<Vec<IncidentApproval>, EngineError> {
        if self.store.load_incident(incident_id).await?.is_none() {
            return Err(EngineError::IncidentNotFound(incident_id));
        }
        Ok(self.store.load_approvals(incident_id).await?)
    }

    /// Register an incident. Test/seed convenience; report intake forms
    /// are outside the engine.
    pub async fn register(&self, incident: &Incident) -> Result<(), EngineError> {
        Ok(self.store.save_incident(incident).await?)
    }
}
