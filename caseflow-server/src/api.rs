//! REST surface over the caseflow engines.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use caseflow_core::{
    approvals::{ApprovalEngine, ApprovalRequest},
    calculate_compliance_score,
    events::TimelineEntry,
    types::{ApprovalAction, CheckStatus, ComplianceCheck, IncidentApproval, Severity},
    workflow::{StepView, WorkflowEngine},
    EngineError, WorkflowStep,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};
use uuid::Uuid;

// ── State ──

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WorkflowEngine>,
    pub approvals: Arc<ApprovalEngine>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/referrals/:id/advance", post(advance_referral))
        .route("/api/referrals/:id/workflow", get(referral_workflow))
        .route("/api/referrals/:id/timeline", get(referral_timeline))
        .route(
            "/api/incidents/:id/approvals",
            post(submit_approval).get(incident_approvals),
        )
        .route("/api/compliance/score", post(compliance_score))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

// ── Error mapping ──

/// Hard failures, mapped to status codes with a display-ready message.
/// Business-rule refusals never come through here — they are 200
/// responses with `success: false`.
pub struct ApiError(EngineError);

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::UnknownStep(_) | EngineError::UnknownSeverity(_) => {
                // Registry/data inconsistency at the wire boundary —
                // flag for operator attention, don't silently default.
                warn!(error = %self.0, "rejected unrecognized wire value");
                StatusCode::BAD_REQUEST
            }
            EngineError::ReferralNotFound(_) | EngineError::IncidentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            EngineError::InvalidLevel { .. } | EngineError::StateConflict => StatusCode::CONFLICT,
            EngineError::Store(_) => {
                error!(error = %self.0, "store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &self.0 {
            EngineError::Store(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

// ── Health ──

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
    data: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        data: "OK",
    })
}

// ── Workflow ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvanceBody {
    /// The status the caller believes the referral is at; a mismatch
    /// with the stored status is a 409.
    current_status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdvanceResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_status: Option<WorkflowStep>,
}

async fn advance_referral(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AdvanceBody>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    let expected: WorkflowStep = body.current_status.parse()?;
    let outcome = state.workflow.advance(id, expected).await?;
    Ok(Json(AdvanceResponse {
        success: outcome.succeeded(),
        message: outcome.message(),
        new_status: match outcome {
            caseflow_core::AdvanceOutcome::Advanced { new_status } => Some(new_status),
            _ => None,
        },
    }))
}

async fn referral_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StepView>>, ApiError> {
    Ok(Json(state.workflow.step_states(id).await?))
}

async fn referral_timeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimelineEntry>>, ApiError> {
    Ok(Json(state.workflow.timeline(id).await?))
}

// ── Approvals ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalBody {
    action: ApprovalAction,
    comments: String,
    approver_name: String,
    approver_role: String,
    approval_level: u8,
}

async fn submit_approval(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ApprovalBody>,
) -> Result<(StatusCode, Json<IncidentApproval>), ApiError> {
    let approval = state
        .approvals
        .submit_approval(
            id,
            ApprovalRequest {
                action: body.action,
                comments: body.comments,
                approver_name: body.approver_name,
                approver_role: body.approver_role,
                approval_level: body.approval_level,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(approval)))
}

async fn incident_approvals(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<IncidentApproval>>, ApiError> {
    Ok(Json(state.approvals.approvals(id).await?))
}

// ── Compliance ──

#[derive(Deserialize)]
struct ComplianceCheckBody {
    id: String,
    name: String,
    category: String,
    severity: String,
    status: String,
}

#[derive(Deserialize)]
struct ScoreBody {
    checks: Vec<ComplianceCheckBody>,
}

#[derive(Serialize)]
struct ScoreResponse {
    score: u8,
}

async fn compliance_score(
    Json(body): Json<ScoreBody>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let checks = body
        .checks
        .into_iter()
        .map(|c| {
            Ok(ComplianceCheck {
                severity: c.severity.parse::<Severity>()?,
                status: c.status.parse::<CheckStatus>()?,
                id: c.id,
                name: c.name,
                category: c.category,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;
    Ok(Json(ScoreResponse {
        score: calculate_compliance_score(&checks),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use caseflow_core::{CaseStore, Incident, MemoryStore, Referral};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app() -> (Router, Arc<MemoryStore>, Referral, Incident) {
        let store = Arc::new(MemoryStore::new());
        let referral = Referral::new("Alex Chen");
        store.save_referral(&referral).await.unwrap();
        let incident = Incident::new(
            "Alex Chen",
            "unwitnessed fall",
            "J. Staff",
            Severity::Critical,
            true,
        );
        store.save_incident(&incident).await.unwrap();

        let state = AppState {
            workflow: Arc::new(WorkflowEngine::new(store.clone())),
            approvals: Arc::new(ApprovalEngine::new(store.clone())),
        };
        (create_router(state), store, referral, incident)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn ineligible_advance_is_200_with_failure_body() {
        let (app, _, referral, _) = test_app().await;
        let response = app
            .oneshot(post_json(
                &format!("/api/referrals/{}/advance", referral.id),
                json!({ "currentStatus": "referral_received" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("Mandatory fields are not complete"));
        assert!(body.get("newStatus").is_none());
    }

    #[tokio::test]
    async fn eligible_advance_reports_new_status() {
        let (app, store, referral, _) = test_app().await;
        let mut fixed = referral.clone();
        fixed.mandatory_fields_complete = true;
        store.save_referral(&fixed).await.unwrap();

        let response = app
            .oneshot(post_json(
                &format!("/api/referrals/{}/advance", referral.id),
                json!({ "currentStatus": "referral_received" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["newStatus"], json!("data_verified"));
    }

    #[tokio::test]
    async fn stale_current_status_is_409_and_unknown_step_is_400() {
        let (app, _, referral, _) = test_app().await;
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/referrals/{}/advance", referral.id),
                json!({ "currentStatus": "funding_verified" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(post_json(
                &format!("/api/referrals/{}/advance", referral.id),
                json!({ "currentStatus": "no_such_step" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], json!("unknown workflow step 'no_such_step'"));
    }

    #[tokio::test]
    async fn missing_referral_is_404() {
        let (app, _, _, _) = test_app().await;
        let response = app
            .oneshot(post_json(
                &format!("/api/referrals/{}/advance", Uuid::new_v4()),
                json!({ "currentStatus": "referral_received" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn approval_post_creates_record_and_get_returns_history() {
        let (app, _, _, incident) = test_app().await;
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/incidents/{}/approvals", incident.id),
                json!({
                    "action": "approved",
                    "comments": "reviewed on site",
                    "approverName": "T. Lead",
                    "approverRole": "Team Leader",
                    "approvalLevel": 1
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["approvalLevel"], json!(1));
        assert_eq!(body["action"], json!("approved"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/incidents/{}/approvals", incident.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn level_skip_is_409_and_blank_comments_400() {
        let (app, _, _, incident) = test_app().await;
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/incidents/{}/approvals", incident.id),
                json!({
                    "action": "approved",
                    "comments": "jumping ahead",
                    "approverName": "M. Manager",
                    "approverRole": "Manager",
                    "approvalLevel": 3
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(post_json(
                &format!("/api/incidents/{}/approvals", incident.id),
                json!({
                    "action": "approved",
                    "comments": "  ",
                    "approverName": "T. Lead",
                    "approverRole": "Team Leader",
                    "approvalLevel": 1
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn workflow_view_shows_blocked_current_step() {
        let (app, _, referral, _) = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/referrals/{}/workflow", referral.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let steps = body.as_array().unwrap();
        assert_eq!(steps.len(), 12);
        assert_eq!(steps[0]["step"], json!("referral_received"));
        assert_eq!(steps[0]["state"], json!("blocked"));
        assert_eq!(steps[1]["state"], json!("pending"));
    }

    #[tokio::test]
    async fn compliance_score_endpoint_weighs_checks() {
        let (app, _, _, _) = test_app().await;
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/compliance/score",
                json!({ "checks": [
                    { "id": "c1", "name": "Plan current", "category": "documentation",
                      "severity": "critical", "status": "compliant" },
                    { "id": "c2", "name": "Notes filed", "category": "documentation",
                      "severity": "low", "status": "non_compliant" }
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["score"], json!(80));

        // Empty list is vacuously compliant.
        let response = app
            .clone()
            .oneshot(post_json("/api/compliance/score", json!({ "checks": [] })))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["score"], json!(100));

        // Malformed severity is rejected, not defaulted.
        let response = app
            .oneshot(post_json(
                "/api/compliance/score",
                json!({ "checks": [
                    { "id": "c1", "name": "x", "category": "y",
                      "severity": "catastrophic", "status": "compliant" }
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], json!("unknown severity 'catastrophic'"));
    }
}
