use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Compare-and-set lost: another request modified the record between
    /// our read and our write.
    #[error("concurrent modification of {entity} {id}")]
    Conflict { entity: &'static str, id: Uuid },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Engine error taxonomy.
///
/// Expected business-rule outcomes ("not yet eligible", "workflow
/// complete") are not errors — the engines return them as discriminated
/// outcome values. These variants cover malformed input, missing
/// records, lost concurrency races, and registry/data inconsistencies.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or missing input; safe to surface verbatim to the caller.
    #[error("{0}")]
    Validation(String),

    #[error("referral {0} not found")]
    ReferralNotFound(Uuid),

    #[error("incident {0} not found")]
    IncidentNotFound(Uuid),

    /// An approving action must target exactly the next pending level.
    #[error("approval level {submitted} is not the next pending level (expected {expected})")]
    InvalidLevel { submitted: u8, expected: u8 },

    /// The record changed under us; the caller should re-fetch and retry.
    #[error("record was modified by another request; refresh and try again")]
    StateConflict,

    /// A wire value named a workflow step that is not registered.
    #[error("unknown workflow step '{0}'")]
    UnknownStep(String),

    /// A wire value named a severity that is not registered.
    #[error("unknown severity '{0}'")]
    UnknownSeverity(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => EngineError::StateConflict,
            other => EngineError::Store(other),
        }
    }
}
