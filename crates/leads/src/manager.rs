//! Operações tipadas sobre os endpoints de leads do backend
//!
//! Encapsula as chamadas de listagem que o restante do sistema consome:
//!
//! 1. **Listagem paginada** (`list_leads`, `list_duplicates`)
//! 2. **Suporte a deduplicação** (`duplicate_ids`)
//! 3. **Pickers de filtro** (`unique_values`)
//! 4. **Conectividade** (`test_connection`)
//!
//! Toda resposta passa pela normalização de [`crate::types`]: o consumidor
//! nunca enxerga o shape cru do backend.

use crate::client::LeadsClient;
use crate::error::Result;
use crate::filters::ConditionMap;
use crate::query::LeadQuery;
use crate::types::{LeadPage, RawPage};
use serde_json::Value;

/// Gerenciador das operações de leads
///
/// Implementa `Clone` e pode ser compartilhado entre tasks via `Arc<>`.
#[derive(Clone)]
pub struct LeadManager {
    client: LeadsClient,
}

impl LeadManager {
    pub fn new(client: LeadsClient) -> Self {
        Self { client }
    }

    /// Cria um LeadManager a partir das credenciais (conveniência)
    pub fn from_credentials(base_url: String, api_token: String) -> Result<Self> {
        let client = LeadsClient::new(base_url, api_token)?;
        Ok(Self::new(client))
    }

    /// Lista leads com paginação, ordenação, busca e filtros
    ///
    /// `GET /leads`
    pub async fn list_leads(&self, query: &LeadQuery) -> Result<LeadPage> {
        let raw: RawPage = self.client.get_json("/leads", &query.to_params()).await?;
        Ok(raw.into_page(query.page, query.page_size))
    }

    /// Lista apenas os leads marcados como duplicados pelo backend
    ///
    /// `GET /leads/duplicates` — aceita os mesmos parâmetros da listagem
    pub async fn list_duplicates(&self, query: &LeadQuery) -> Result<LeadPage> {
        let raw: RawPage = self
            .client
            .get_json("/leads/duplicates", &query.to_params())
            .await?;
        Ok(raw.into_page(query.page, query.page_size))
    }

    /// Conjunto completo de ids de leads duplicados
    ///
    /// `GET /leads/duplicates/ids` — usado pelo modo "únicos", que exclui
    /// esses ids da listagem via condição `nin`.
    pub async fn duplicate_ids(&self) -> Result<Vec<String>> {
        let raw: Value = self.client.get_json("/leads/duplicates/ids", &[]).await?;
        Ok(extract_string_list(raw, &["ids", "items", "data"]))
    }

    /// Valores distintos de um campo sob o contexto de filtros atual
    ///
    /// `GET /leads/unique-values` — alimenta os pickers de filtro do
    /// frontend. Sem cache: quem chama é responsável por debounce.
    pub async fn unique_values(
        &self,
        backend_field: &str,
        search: Option<&str>,
        filters: &ConditionMap,
    ) -> Result<Vec<String>> {
        let mut params = vec![("field".to_string(), backend_field.to_string())];

        if let Some(search) = search.filter(|s| !s.is_empty()) {
            params.push(("search".to_string(), search.to_string()));
        }
        if !filters.is_empty() {
            let encoded = serde_json::to_string(filters).unwrap_or_default();
            params.push(("filters".to_string(), encoded));
        }

        let raw: Value = self.client.get_json("/leads/unique-values", &params).await?;
        Ok(extract_string_list(raw, &["values", "items", "data"]))
    }

    /// Testa conectividade com o backend de CRM
    ///
    /// Consulta mínima (uma página de 1 item) para validar token e alcance
    /// da API. Usado pelo health check `/ready`.
    pub async fn test_connection(&self) -> Result<()> {
        let query = LeadQuery {
            page_size: 1,
            ..LeadQuery::default()
        };
        self.list_leads(&query).await?;
        Ok(())
    }
}

/// Extrai uma lista de strings de uma resposta que pode ser um array puro
/// ou um objeto com a lista sob uma das chaves conhecidas
fn extract_string_list(raw: Value, keys: &[&str]) -> Vec<String> {
    let array = match raw {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => keys.iter().find_map(|key| match map.remove(*key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }),
        _ => None,
    };

    array
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Condition;
    use httpmock::prelude::*;
    use serde_json::json;

    fn manager_for(server: &MockServer) -> LeadManager {
        let client = LeadsClient::new(server.base_url(), "test-token").unwrap();
        LeadManager::new(client)
    }

    #[tokio::test]
    async fn test_list_leads_sends_query_params_and_normalizes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/leads")
                    .query_param("page", "2")
                    .query_param("page_size", "10")
                    .query_param("sort_by", "UpdatedAt")
                    .query_param("sort_dir", "desc");
                then.status(200).json_body(json!({
                    "items": [{"Id": "l1", "Name": "Maria", "Value": "99.5"}],
                    "page": 2,
                    "page_size": 10,
                    "total": 12,
                    "total_pages": 2
                }));
            })
            .await;

        let manager = manager_for(&server);
        let query = LeadQuery {
            page: 2,
            page_size: 10,
            ..LeadQuery::default()
        };
        let page = manager.list_leads(&query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.total, 12);
        assert_eq!(page.items[0].value, 99.5);
    }

    #[tokio::test]
    async fn test_list_leads_sends_encoded_filters() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/leads")
                    .query_param("filters", r#"{"Stage":{"op":"eq","value":"Novo"}}"#);
                then.status(200).json_body(json!({"items": [], "total": 0}));
            })
            .await;

        let manager = manager_for(&server);
        let mut query = LeadQuery::default();
        query.filters.insert(
            "Stage".to_string(),
            Condition::Eq {
                value: "Novo".to_string(),
            },
        );
        manager.list_leads(&query).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_leads_accepts_data_count_variant() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(200).json_body(json!({
                    "data": [{"Id": "l1", "Name": "Maria"}],
                    "count": 1
                }));
            })
            .await;

        let manager = manager_for(&server);
        let page = manager.list_leads(&LeadQuery::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_duplicate_ids_accepts_wrapped_and_raw_shapes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads/duplicates/ids");
                then.status(200).json_body(json!({"ids": ["a", "b"]}));
            })
            .await;

        let manager = manager_for(&server);
        let ids = manager.duplicate_ids().await.unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unique_values_sends_field_and_context() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/leads/unique-values")
                    .query_param("field", "Source")
                    .query_param("search", "face");
                then.status(200).json_body(json!(["Facebook Ads", "Facebook Orgânico"]));
            })
            .await;

        let manager = manager_for(&server);
        let values = manager
            .unique_values("Source", Some("face"), &ConditionMap::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(values.len(), 2);
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(500).json_body(json!({"error": "database exploded"}));
            })
            .await;

        let manager = manager_for(&server);
        let err = manager.list_leads(&LeadQuery::default()).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("500"), "mensagem deve conter o status: {}", message);
        assert!(message.contains("database exploded"));
    }

    #[tokio::test]
    async fn test_auth_error_maps_to_auth_variant() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(401).json_body(json!({"message": "invalid token"}));
            })
            .await;

        let manager = manager_for(&server);
        let err = manager.list_leads(&LeadQuery::default()).await.unwrap_err();
        assert!(matches!(err, crate::error::LeadsError::AuthError(_)));
    }

    #[test]
    fn test_extract_string_list_shapes() {
        assert_eq!(
            extract_string_list(json!(["a", "b"]), &["values"]),
            vec!["a", "b"]
        );
        assert_eq!(
            extract_string_list(json!({"values": ["x"]}), &["values", "items"]),
            vec!["x"]
        );
        assert!(extract_string_list(json!({"other": 1}), &["values"]).is_empty());
        assert!(extract_string_list(json!("nope"), &["values"]).is_empty());
    }
}
