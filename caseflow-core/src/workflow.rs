//! Workflow progression engine.
//!
//! Moves a referral through [`WorkflowStep::SEQUENCE`] one step at a
//! time. Each successful advance is exactly one status write plus one
//! timeline append, committed atomically through the store's
//! compare-and-set.

use crate::error::EngineError;
use crate::events::TimelineEntry;
use crate::registry;
use crate::store::CaseStore;
use crate::types::{Referral, StepState, WorkflowStep};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Outcome of a single advance attempt.
///
/// Business-rule refusals are values, not errors: the caller always
/// gets a display-ready message.
#[derive(Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The referral moved one step forward.
    Advanced { new_status: WorkflowStep },
    /// The current step's eligibility predicate is unmet; nothing changed.
    NotEligible { reason: String },
    /// The referral is already at `service_commenced`; nothing changed.
    AlreadyComplete,
}

impl AdvanceOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced { .. })
    }

    pub fn message(&self) -> String {
        match self {
            AdvanceOutcome::Advanced { new_status } => format!("Moved to {new_status}"),
            AdvanceOutcome::NotEligible { reason } => reason.clone(),
            AdvanceOutcome::AlreadyComplete => "Workflow already complete".to_string(),
        }
    }
}

/// One step of the sequence as seen from a referral's position.
#[derive(Clone, Debug, Serialize)]
pub struct StepView {
    pub step: WorkflowStep,
    pub state: StepState,
}

/// The progression engine. Operates exclusively through a [`CaseStore`].
pub struct WorkflowEngine {
    store: Arc<dyn CaseStore>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self { store }
    }

    /// Attempt to move a referral to the next step.
    ///
    /// `expected_status` is the caller's redundant confirmation of the
    /// state it acted on; a mismatch with the stored status fails with
    /// [`EngineError::StateConflict`] so the caller can re-fetch.
    ///
    /// No cascading: a successful call advances exactly one step, and a
    /// follow-up call re-evaluates eligibility for the new step.
    pub async fn advance(
        &self,
        referral_id: Uuid,
        expected_status: WorkflowStep,
    ) -> Result<AdvanceOutcome, EngineError> {
        let referral = self
            .store
            .load_referral(referral_id)
            .await?
            .ok_or(EngineError::ReferralNotFound(referral_id))?;

        if referral.workflow_status != expected_status {
            return Err(EngineError::StateConflict);
        }

        if referral.workflow_status.is_terminal() {
            return Ok(AdvanceOutcome::AlreadyComplete);
        }

        if let Err(reason) = registry::can_advance(&referral) {
            return Ok(AdvanceOutcome::NotEligible {
                reason: reason.to_string(),
            });
        }

        // Not terminal, so the sequence has a next step.
        let next = match referral.workflow_status.next() {
            Some(step) => step,
            None => return Ok(AdvanceOutcome::AlreadyComplete),
        };

        let mut updated = referral.clone();
        updated.workflow_status = next;
        updated.updated_at = Utc::now();

        let outcome = AdvanceOutcome::Advanced { new_status: next };
        let entry = TimelineEntry::workflow_transition(
            referral.id,
            referral.workflow_status,
            next,
            &outcome.message(),
        );

        self.store
            .commit_advance(referral.id, referral.workflow_status, &updated, &entry)
            .await?;

        info!(
            referral = %referral.id,
            from = %referral.workflow_status,
            to = %next,
            "workflow advanced"
        );
        Ok(outcome)
    }

    /// Render the full sequence for a referral.
    ///
    /// Positional states come from the registry; the current step is
    /// downgraded to `Blocked` while its eligibility predicate fails.
    pub async fn step_states(&self, referral_id: Uuid) -> Result<Vec<StepView>, EngineError> {
        let referral = self
            .store
            .load_referral(referral_id)
            .await?
            .ok_or(EngineError::ReferralNotFound(referral_id))?;

        let current = referral.workflow_status;
        let blocked = !current.is_terminal() && registry::can_advance(&referral).is_err();

        Ok(WorkflowStep::SEQUENCE
            .iter()
            .map(|&step| {
                let mut state = registry::status_of(current, step);
                if blocked && state == StepState::InProgress {
                    state = StepState::Blocked;
                }
                StepView { step, state }
            })
            .collect())
    }

    /// Audit history for a referral, oldest first.
    pub async fn timeline(&self, referral_id: Uuid) -> Result<Vec<TimelineEntry>, EngineError> {
        if self.store.load_referral(referral_id).await?.is_none() {
            return Err(EngineError::ReferralNotFound(referral_id));
        }
        Ok(self.store.read_timeline(referral_id).await?)
    }

    /// Register a referral. Test/seed convenience; creation forms are
    /// outside the engine.
    pub async fn register(&self, referral: &Referral) -> Result<(), EngineError> {
        Ok(self.store.save_referral(referral).await?)
    }
}
