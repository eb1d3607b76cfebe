//! Workflow step registry.
//!
//! Pure and stateless: the step sequence itself lives on
//! [`WorkflowStep::SEQUENCE`]; this module holds the per-step
//! advance-eligibility predicates and the positional status view.

use crate::types::{Referral, StepState, WorkflowStep};

// ── Eligibility ──
// A predicate gates leaving its step. Steps without a listed predicate
// advance unconditionally; the terminal step never advances (the engine
// short-circuits before consulting the registry).

/// Can this referral advance out of its current step?
///
/// Returns the unmet requirement as a display-ready reason on failure.
pub fn can_advance(referral: &Referral) -> Result<(), &'static str> {
    match referral.workflow_status {
        WorkflowStep::ReferralReceived if !referral.mandatory_fields_complete => {
            Err("Mandatory fields are not complete")
        }
        WorkflowStep::AgreementSent if referral.agreement_signed_at.is_none() => {
            Err("Service agreement has not been signed")
        }
        WorkflowStep::PendingFundingVerification if !referral.funding_verified => {
            Err("Funding has not been verified")
        }
        WorkflowStep::ReadyForAllocation if referral.allocated_staff_id.is_none() => {
            Err("No support worker has been allocated")
        }
        WorkflowStep::MeetGreetScheduled if !referral.meet_greet_completed => {
            Err("Meet & greet has not been completed")
        }
        _ => Ok(()),
    }
}

/// Positional state of `candidate` relative to the current step.
///
/// `Blocked` is never derivable from position alone — the engine
/// assigns it only when the current step's predicate fails.
pub fn status_of(current: WorkflowStep, candidate: WorkflowStep) -> StepState {
    if candidate.index() < current.index() {
        StepState::Completed
    } else if candidate == current {
        StepState::InProgress
    } else {
        StepState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn status_of_is_positional() {
        let current = WorkflowStep::AgreementSigned;
        assert_eq!(
            status_of(current, WorkflowStep::ReferralReceived),
            StepState::Completed
        );
        assert_eq!(
            status_of(current, WorkflowStep::AgreementSigned),
            StepState::InProgress
        );
        assert_eq!(
            status_of(current, WorkflowStep::ServiceCommenced),
            StepState::Pending
        );
    }

    #[test]
    fn gated_steps_report_their_unmet_requirement() {
        let mut referral = Referral::new("Alex Chen");

        assert_eq!(
            can_advance(&referral),
            Err("Mandatory fields are not complete")
        );
        referral.mandatory_fields_complete = true;
        assert_eq!(can_advance(&referral), Ok(()));

        referral.workflow_status = WorkflowStep::AgreementSent;
        assert_eq!(
            can_advance(&referral),
            Err("Service agreement has not been signed")
        );
        referral.agreement_signed_at = Some(Utc::now());
        assert_eq!(can_advance(&referral), Ok(()));

        referral.workflow_status = WorkflowStep::PendingFundingVerification;
        assert_eq!(can_advance(&referral), Err("Funding has not been verified"));

        referral.workflow_status = WorkflowStep::ReadyForAllocation;
        assert_eq!(
            can_advance(&referral),
            Err("No support worker has been allocated")
        );
        referral.allocated_staff_id = Some(Uuid::new_v4());
        assert_eq!(can_advance(&referral), Ok(()));

        referral.workflow_status = WorkflowStep::MeetGreetScheduled;
        assert_eq!(
            can_advance(&referral),
            Err("Meet & greet has not been completed")
        );
    }

    #[test]
    fn ungated_steps_always_advance() {
        let mut referral = Referral::new("Alex Chen");
        for step in [
            WorkflowStep::DataVerified,
            WorkflowStep::PendingServiceAgreement,
            WorkflowStep::AgreementSigned,
            WorkflowStep::FundingVerified,
            WorkflowStep::WorkerAllocated,
            WorkflowStep::MeetGreetCompleted,
        ] {
            referral.workflow_status = step;
            assert_eq!(can_advance(&referral), Ok(()), "step {step} should be open");
        }
    }
}
