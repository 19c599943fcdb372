//! Endpoints administrativos de campanhas de outreach (WhatsApp)
//!
//! Protegidos pelo middleware de API key (`X-Admin-Key`).

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use disparador::{CampaignStatus, DispatchMode, DispatchSummary};

use crm_leads_middleware::models::{CreateCampaignRequest, DispatchParams};
use crm_leads_middleware::utils::logging::*;
use crm_leads_middleware::utils::{AppError, AppResult};
use crm_leads_middleware::AppState;

/// Cria uma campanha com a lista completa de mensagens
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCampaignRequest>,
) -> AppResult<Json<Value>> {
    log_request_received("/admin/outreach/campaigns", "POST");

    if request.name.trim().is_empty() {
        log_validation_error("name", "nome da campanha é obrigatório");
        return Err(AppError::ValidationError("Missing campaign name".to_string()));
    }

    let id = state
        .outreach
        .create_campaign(request.name.clone(), request.messages)
        .await?;

    Ok(Json(json!({
        "status": "created",
        "campaign_id": id,
        "name": request.name
    })))
}

/// Dispara uma campanha
///
/// Sem `?mode=full` explícito o disparo é dry run (amostra limitada), para
/// validar o conteúdo antes do envio completo.
pub async fn dispatch_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<DispatchParams>,
) -> AppResult<Json<DispatchSummary>> {
    log_request_received("/admin/outreach/campaigns/:id/dispatch", "POST");

    let mode = params.mode.unwrap_or(DispatchMode::DryRun);
    let summary = state.outreach.dispatch(id, mode).await?;

    log_campaign_dispatched(&id.to_string(), summary.sent, summary.failed);

    Ok(Json(summary))
}

/// Visão externa de uma campanha
pub async fn campaign_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CampaignStatus>> {
    log_request_received("/admin/outreach/campaigns/:id", "GET");

    let status = state.outreach.campaign_status(id).await?;
    Ok(Json(status))
}
