//! Endpoints de consulta de leads consumidos pelo frontend

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crm_leads_middleware::models::{
    LeadQueryRequest, SetPageRequest, SetPageSizeRequest, UniqueValuesParams,
};
use crm_leads_middleware::services::QuerySnapshot;
use crm_leads_middleware::utils::logging::*;
use crm_leads_middleware::utils::{AppError, AppResult};
use crm_leads_middleware::AppState;

/// Aplica o estado de consulta enviado pelo frontend e devolve o snapshot
///
/// Falhas de consulta NÃO viram erro HTTP: aparecem no campo `error` do
/// snapshot, com os dados anteriores preservados, e o frontend decide como
/// renderizar.
pub async fn query_leads(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LeadQueryRequest>,
) -> Json<QuerySnapshot> {
    log_request_received("/leads/query", "POST");

    state.lead_query.apply_query(request).await;
    Json(state.lead_query.snapshot().await)
}

/// Vai para uma página específica mantendo filtros e ordenação
pub async fn set_page(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetPageRequest>,
) -> Json<QuerySnapshot> {
    log_request_received("/leads/page", "POST");

    state.lead_query.set_page(request.page).await;
    Json(state.lead_query.snapshot().await)
}

/// Troca o tamanho de página (sempre volta para a página 1)
pub async fn set_page_size(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetPageSizeRequest>,
) -> Json<QuerySnapshot> {
    log_request_received("/leads/page-size", "POST");

    state.lead_query.set_page_size(request.page_size).await;
    Json(state.lead_query.snapshot().await)
}

/// Recarrega com os parâmetros atuais, ignorando a deduplicação
pub async fn refresh_leads(State(state): State<Arc<AppState>>) -> Json<QuerySnapshot> {
    log_request_received("/leads/refresh", "POST");

    state.lead_query.refresh_leads().await;
    Json(state.lead_query.snapshot().await)
}

/// Valores distintos de um campo, para os pickers de filtro
pub async fn unique_values(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UniqueValuesParams>,
) -> AppResult<Json<Value>> {
    log_request_received("/leads/unique-values", "GET");

    if params.field.is_empty() {
        log_validation_error("field", "parâmetro obrigatório");
        return Err(AppError::ValidationError("Missing 'field' parameter".to_string()));
    }

    let values = state
        .lead_query
        .get_unique_values(&params.field, params.search.as_deref())
        .await
        .map_err(AppError::CrmApi)?;

    Ok(Json(json!({
        "field": params.field,
        "values": values,
        "count": values.len()
    })))
}

/// Exporta todos os leads que casam com os filtros atuais (sem paginação)
pub async fn export_leads(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/leads/export", "POST");

    let leads = state
        .lead_query
        .load_all_filtered_leads()
        .await
        .map_err(AppError::CrmApi)?;

    log_info(&format!("📦 Exportação: {} leads", leads.len()));

    Ok(Json(json!({
        "count": leads.len(),
        "items": leads
    })))
}
