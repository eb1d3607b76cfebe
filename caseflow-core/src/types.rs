use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ─── Workflow steps ───────────────────────────────────────────

/// One stage in the referral-to-service-commencement sequence.
///
/// The variant order is the canonical workflow order; `index()` is the
/// position in that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    ReferralReceived,
    DataVerified,
    PendingServiceAgreement,
    AgreementSent,
    AgreementSigned,
    PendingFundingVerification,
    FundingVerified,
    ReadyForAllocation,
    WorkerAllocated,
    MeetGreetScheduled,
    MeetGreetCompleted,
    ServiceCommenced,
}

impl WorkflowStep {
    /// All steps in workflow order.
    pub const SEQUENCE: [WorkflowStep; 12] = [
        WorkflowStep::ReferralReceived,
        WorkflowStep::DataVerified,
        WorkflowStep::PendingServiceAgreement,
        WorkflowStep::AgreementSent,
        WorkflowStep::AgreementSigned,
        WorkflowStep::PendingFundingVerification,
        WorkflowStep::FundingVerified,
        WorkflowStep::ReadyForAllocation,
        WorkflowStep::WorkerAllocated,
        WorkflowStep::MeetGreetScheduled,
        WorkflowStep::MeetGreetCompleted,
        WorkflowStep::ServiceCommenced,
    ];

    /// Position in the workflow sequence.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The step after this one, or `None` at the end of the sequence.
    pub fn next(self) -> Option<WorkflowStep> {
        Self::SEQUENCE.get(self.index() + 1).copied()
    }

    /// Terminal step — the workflow is complete, no further advance.
    pub fn is_terminal(self) -> bool {
        self == WorkflowStep::ServiceCommenced
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::ReferralReceived => "referral_received",
            WorkflowStep::DataVerified => "data_verified",
            WorkflowStep::PendingServiceAgreement => "pending_service_agreement",
            WorkflowStep::AgreementSent => "agreement_sent",
            WorkflowStep::AgreementSigned => "agreement_signed",
            WorkflowStep::PendingFundingVerification => "pending_funding_verification",
            WorkflowStep::FundingVerified => "funding_verified",
            WorkflowStep::ReadyForAllocation => "ready_for_allocation",
            WorkflowStep::WorkerAllocated => "worker_allocated",
            WorkflowStep::MeetGreetScheduled => "meet_greet_scheduled",
            WorkflowStep::MeetGreetCompleted => "meet_greet_completed",
            WorkflowStep::ServiceCommenced => "service_commenced",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStep {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SEQUENCE
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| EngineError::UnknownStep(s.to_string()))
    }
}

/// Display state of one step relative to a referral's current position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

// ─── Referral ─────────────────────────────────────────────────

/// A participant's intake case moving through the onboarding workflow.
///
/// `workflow_status` only ever moves forward through
/// `WorkflowStep::SEQUENCE`; the progression engine is the sole writer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub participant_name: String,
    pub workflow_status: WorkflowStep,
    pub mandatory_fields_complete: bool,
    pub agreement_signed_at: Option<DateTime<Utc>>,
    pub funding_verified: bool,
    pub allocated_staff_id: Option<Uuid>,
    pub meet_greet_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Referral {
    /// A freshly submitted referral, at the start of the workflow.
    pub fn new(participant_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            participant_name: participant_name.into(),
            workflow_status: WorkflowStep::ReferralReceived,
            mandatory_fields_complete: false,
            agreement_signed_at: None,
            funding_verified: false,
            allocated_staff_id: None,
            meet_greet_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// ─── Severity ─────────────────────────────────────────────────

/// Incident / compliance-check severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Weight used by compliance scoring.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(EngineError::UnknownSeverity(other.to_string())),
        }
    }
}

// ─── Incidents ────────────────────────────────────────────────

/// Incident sign-off status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Pending,
    UnderReview,
    Escalated,
    Approved,
    Closed,
}

impl IncidentStatus {
    /// Approved and closed incidents accept no further approval actions.
    pub fn is_final(self) -> bool {
        matches!(self, IncidentStatus::Approved | IncidentStatus::Closed)
    }
}

/// A reportable incident with its approval state machine fields.
///
/// `current_approval_level` is 0 (unapproved) through 4, non-decreasing.
/// The approval engine is the sole writer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub incident_number: String,
    pub participant_name: String,
    pub description: String,
    pub reported_by: String,
    pub severity: Severity,
    pub ndis_notified: bool,
    pub status: IncidentStatus,
    pub current_approval_level: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    pub fn new(
        participant_name: impl Into<String>,
        description: impl Into<String>,
        reported_by: impl Into<String>,
        severity: Severity,
        ndis_notified: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            incident_number: format!("INC-{}", now.timestamp_millis()),
            participant_name: participant_name.into(),
            description: description.into(),
            reported_by: reported_by.into(),
            severity,
            ndis_notified,
            status: IncidentStatus::Pending,
            current_approval_level: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Action taken at one approval level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approved,
    Rejected,
    Escalated,
    RequestInfo,
}

impl ApprovalAction {
    /// Approval and escalation move the incident to the next level;
    /// rejection and information requests only record history.
    pub fn advances_level(self) -> bool {
        matches!(self, ApprovalAction::Approved | ApprovalAction::Escalated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalAction::Approved => "approved",
            ApprovalAction::Rejected => "rejected",
            ApprovalAction::Escalated => "escalated",
            ApprovalAction::RequestInfo => "request_info",
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in an incident's append-only approval history.
/// Immutable once written; never deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentApproval {
    pub id: Uuid,
    pub incident_id: Uuid,
    pub approval_level: u8,
    pub approver_name: String,
    pub approver_role: String,
    pub action: ApprovalAction,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}

// ─── Compliance checks ────────────────────────────────────────

/// Outcome of a single compliance check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Compliant,
    NonCompliant,
    Pending,
    Review,
}

impl FromStr for CheckStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compliant" => Ok(CheckStatus::Compliant),
            "non_compliant" => Ok(CheckStatus::NonCompliant),
            "pending" => Ok(CheckStatus::Pending),
            "review" => Ok(CheckStatus::Review),
            other => Err(EngineError::Validation(format!(
                "unknown check status '{other}'"
            ))),
        }
    }
}

/// A single pass/fail assessment against an NDIS practice requirement.
/// Computed per request, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub id: String,
    pub name: String,
    pub category: String,
    pub severity: Severity,
    pub status: CheckStatus,
}
