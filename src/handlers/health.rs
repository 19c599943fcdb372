use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crm_leads_middleware::utils::logging::*;
use crm_leads_middleware::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "crm-leads-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn ready_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    log_integration_status_check();

    // Testa a conexão com o backend de CRM (consulta mínima)
    let crm_status = match state.lead_query.manager().test_connection().await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let overall_ready = crm_status == "connected";

    let response = json!({
        "ready": overall_ready,
        "service": "crm-leads-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "crm": {
                "status": crm_status,
                "base_url": state.settings.crm.base_url
            }
        }
    });

    if overall_ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_integration_status_check();

    // Verificar se o backend de CRM está configurado
    let crm_configured =
        !state.settings.crm.base_url.is_empty() && !state.settings.crm.api_token.is_empty();

    let mut crm_info = json!({
        "configured": crm_configured,
        "base_url": state.settings.crm.base_url,
        "token_configured": !state.settings.crm.api_token.is_empty()
    });

    let crm_connected = if crm_configured {
        match state.lead_query.manager().test_connection().await {
            Ok(_) => {
                crm_info["connection"] = json!("success");
                true
            }
            Err(e) => {
                crm_info["connection"] = json!("failed");
                crm_info["error"] = json!(e.to_string());
                false
            }
        }
    } else {
        crm_info["connection"] = json!("not_configured");
        false
    };

    // Estado da sessão de consulta e das campanhas de outreach
    let query_snapshot = state.lead_query.snapshot().await;
    let outreach_stats = state.outreach.stats().await;

    Json(json!({
        "service": "crm-leads-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()),
        "crm_connected": crm_connected,
        "integrations": {
            "crm": crm_info,
            "outreach": {
                "campaigns": outreach_stats,
            }
        },
        "query_session": {
            "loading": query_snapshot.loading,
            "error": query_snapshot.error,
            "page": query_snapshot.pagination.page,
            "total": query_snapshot.pagination.total,
            "active_filters": query_snapshot.filters.len(),
        }
    }))
}
