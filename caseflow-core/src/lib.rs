//! caseflow-core — workflow and approval engines for an NDIS
//! case-management service.
//!
//! Three pieces of transition logic live here:
//!
//! - the referral workflow: a fixed twelve-step onboarding sequence
//!   with per-step advance gates ([`workflow`], [`registry`]);
//! - the incident approval ladder: levels 1–4 with severity-driven
//!   requirements and an append-only decision history ([`approvals`]);
//! - severity-weighted compliance scoring ([`compliance`]).
//!
//! All state goes through the [`store::CaseStore`] trait; mutations
//! commit together with their audit record via compare-and-set, so
//! concurrent requests get at most one winner per transition.

pub mod approvals;
pub mod compliance;
pub mod error;
pub mod events;
pub mod registry;
pub mod store;
pub mod types;
pub mod workflow;

pub use approvals::{ApprovalEngine, ApprovalRequest};
pub use compliance::calculate_compliance_score;
pub use error::{EngineError, StoreError};
pub use store::{CaseStore, MemoryStore};
pub use types::{
    ApprovalAction, CheckStatus, ComplianceCheck, Incident, IncidentApproval, IncidentStatus,
    Referral, Severity, StepState, WorkflowStep,
};
pub use workflow::{AdvanceOutcome, WorkflowEngine};
