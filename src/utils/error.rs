use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    CrmApi(String),
    Outreach(String),
    ConfigError(String),
    JsonError(serde_json::Error),
    ValidationError(String),
    NotFound(String),
    Conflict(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::CrmApi(msg) => write!(f, "CRM API error: {}", msg),
            AppError::Outreach(msg) => write!(f, "Outreach error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::JsonError(err) => write!(f, "JSON error: {}", err),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<leads::LeadsError> for AppError {
    fn from(err: leads::LeadsError) -> Self {
        match err {
            leads::LeadsError::NotFound(msg) => AppError::NotFound(msg),
            leads::LeadsError::ValidationError(msg) => AppError::ValidationError(msg),
            leads::LeadsError::ConfigError(msg) => AppError::ConfigError(msg),
            other => AppError::CrmApi(other.to_string()),
        }
    }
}

impl From<disparador::OutreachError> for AppError {
    fn from(err: disparador::OutreachError) -> Self {
        match err {
            disparador::OutreachError::UnknownCampaign(id) => {
                AppError::NotFound(format!("Campanha não encontrada: {}", id))
            }
            disparador::OutreachError::AlreadyDispatching(id) => {
                AppError::Conflict(format!("Campanha já está em disparo: {}", id))
            }
            disparador::OutreachError::EmptyCampaign => {
                AppError::ValidationError("Campanha sem mensagens".to_string())
            }
            disparador::OutreachError::NoChannel => {
                AppError::Outreach("Nenhum canal de envio configurado".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::CrmApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Outreach(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::JsonError(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = json!({
            "error": error_message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
