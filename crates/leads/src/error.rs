//! Tipos de erro para o crate leads

use thiserror::Error;

/// Erros do cliente da API de CRM
#[derive(Debug, Error)]
pub enum LeadsError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API de CRM (status code não-2xx)
    #[error("CRM API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de autenticação (401/403)
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Recurso não encontrado (lead, campo, etc)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Erro de validação
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, LeadsError>;
