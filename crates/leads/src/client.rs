//! Cliente HTTP para o backend de CRM

use crate::error::{LeadsError, Result};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Cliente para interagir com a API REST do backend de CRM
///
/// Todos os endpoints de listagem aceitam os mesmos parâmetros de query
/// (`page`, `page_size`, `sort_by`, `sort_dir`, `search`, `filters`); o
/// cliente só cuida do transporte e da autenticação, a montagem dos
/// parâmetros fica em [`crate::query::LeadQuery`].
#[derive(Clone)]
pub struct LeadsClient {
    http_client: HttpClient,
    api_token: String,
    base_url: String,
}

impl LeadsClient {
    /// Cria um novo cliente para o backend de CRM
    ///
    /// # Argumentos
    ///
    /// * `base_url` - URL base da API (ex: `https://crm.example.com/api/v1`)
    /// * `api_token` - Token de autenticação (Bearer)
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(base_url, api_token, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| LeadsError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(LeadsError::ConfigError(
                "base_url do backend de CRM não configurada".to_string(),
            ));
        }

        Ok(Self {
            http_client,
            api_token: api_token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Executa uma requisição GET com parâmetros de query
    pub(crate) async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("GET {} ({} params)", url, params.len());

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Executa uma requisição GET e parseia JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let response = self.get(endpoint, params).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("CRM API error ({}): {}", status_code, error_body);

        // Tentar extrair mensagem de erro do JSON
        let message = if let Ok(json) = serde_json::from_str::<Value>(&error_body) {
            json.get("err")
                .or_else(|| json.get("error"))
                .or_else(|| json.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or(&error_body)
                .to_string()
        } else {
            error_body
        };

        match status_code {
            401 | 403 => Err(LeadsError::AuthError(message)),
            404 => Err(LeadsError::NotFound(message)),
            _ => Err(LeadsError::ApiError {
                status: status_code,
                message,
            }),
        }
    }

    /// Obtém o token de autenticação
    pub fn token(&self) -> &str {
        &self.api_token
    }

    /// Obtém a URL base configurada
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
