mod api;

use api::AppState;
use caseflow_core::{
    ApprovalEngine, CaseStore, Incident, MemoryStore, Referral, Severity, WorkflowEngine,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "caseflow_server=info,tower_http=debug".to_string()),
        )
        .init();

    dotenvy::dotenv().ok();

    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    if std::env::var("CASEFLOW_SEED_DEMO").is_ok() {
        seed_demo(store.as_ref()).await?;
    }

    let state = AppState {
        workflow: Arc::new(WorkflowEngine::new(store.clone())),
        approvals: Arc::new(ApprovalEngine::new(store)),
    };
    let app = api::create_router(state);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    info!("starting caseflow server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Demo fixtures: one referral at the start of the workflow and one
/// critical, NDIS-notified incident awaiting its first sign-off.
async fn seed_demo(store: &dyn CaseStore) -> anyhow::Result<()> {
    let mut referral = Referral::new("Jordan Riley");
    referral.mandatory_fields_complete = true;
    store.save_referral(&referral).await?;
    info!(referral = %referral.id, "seeded demo referral");

    let incident = Incident::new(
        "Jordan Riley",
        "Unwitnessed fall during community access",
        "S. Nguyen",
        Severity::Critical,
        true,
    );
    store.save_incident(&incident).await?;
    info!(incident = %incident.id, number = %incident.incident_number, "seeded demo incident");

    Ok(())
}
