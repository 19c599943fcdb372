//! Orquestração das consultas de leads
//!
//! Este serviço é o dono do estado de consulta de uma sessão do frontend:
//! filtros, busca, ordenação, modo de duplicados e os contadores de
//! paginação. Toda transição externa (trocar página, trocar tamanho de
//! página, aplicar filtros) converge para uma única ação de carga
//! (`load_leads`), que:
//!
//! 1. Traduz o estado de filtros para as condições do backend
//! 2. Consulta a admissão no [`FetchGate`] (deduplicação de requisições)
//! 3. Escolhe o modo de consulta (todos / duplicados / únicos)
//! 4. Atualiza leads e contadores SOMENTE em caso de sucesso
//!
//! Falhas de rede nunca propagam: viram uma mensagem no campo `error` do
//! estado, com os dados e contadores anteriores preservados. A chave de
//! sucesso da deduplicação é limpa na falha para permitir retry idêntico.
//!
//! Concorrência: uma única consulta lógica por instância. Uma segunda
//! requisição IDÊNTICA disparada com uma em voo é descartada (no-op), não
//! enfileirada. Requisições distintas em voo simultâneo não têm garantia
//! de ordem de chegada: a última atualização de estado vence.

use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::RwLock;

use leads::{
    filters::{self, FilterState},
    Condition, DuplicateFilter, Lead, LeadManager, LeadPage, LeadQuery, SortDir, BULK_PAGE_SIZE,
    DEFAULT_PAGE_SIZE,
};

use crate::models::LeadQueryRequest;
use crate::utils::logging::log_leads_loaded;

/// Contadores de paginação expostos ao frontend
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Página 1-based
    pub page: u32,
    pub page_size: u32,
    /// Total de registros que casam com os filtros
    pub total: u64,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total: 0,
            total_pages: 0,
        }
    }
}

/// Estado de consulta de uma sessão
#[derive(Debug)]
struct QueryState {
    filters: FilterState,
    search: Option<String>,
    sort_by: String,
    sort_dir: SortDir,
    duplicate_filter: DuplicateFilter,
    pagination: Pagination,
    leads: Vec<Lead>,
    loading: bool,
    error: Option<String>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            filters: FilterState::new(),
            search: None,
            sort_by: "updatedAt".to_string(),
            sort_dir: SortDir::Desc,
            duplicate_filter: DuplicateFilter::All,
            pagination: Pagination::default(),
            leads: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

/// Cópia do estado atual, devolvida ao frontend após cada operação
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySnapshot {
    pub leads: Vec<Lead>,
    pub pagination: Pagination,
    pub filters: FilterState,
    pub search: Option<String>,
    pub sort_by: String,
    pub sort_dir: SortDir,
    pub duplicate_filter: DuplicateFilter,
    pub loading: bool,
    pub error: Option<String>,
}

/// Admissão de requisições: no máximo uma consulta em voo, e consultas
/// idênticas à última bem-sucedida são suprimidas
///
/// Máquina de estados explícita (`Idle` / `InFlight`) guardada por mutex:
/// a transição é verificada e efetivada atomicamente antes de cada fetch.
#[derive(Debug)]
struct FetchGate {
    inner: Mutex<GateInner>,
}

#[derive(Debug)]
enum GateState {
    Idle,
    InFlight(String),
}

#[derive(Debug)]
struct GateInner {
    state: GateState,
    last_success: Option<String>,
}

impl FetchGate {
    fn new() -> Self {
        Self {
            inner: Mutex::new(GateInner {
                state: GateState::Idle,
                last_success: None,
            }),
        }
    }

    /// Tenta iniciar uma consulta com a chave dada
    ///
    /// Nega quando há consulta em voo ou quando a chave é igual à da última
    /// consulta bem-sucedida. Quem recebe `false` trata como no-op.
    fn try_begin(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        match inner.state {
            GateState::InFlight(_) => false,
            GateState::Idle => {
                if inner.last_success.as_deref() == Some(key) {
                    false
                } else {
                    inner.state = GateState::InFlight(key.to_string());
                    true
                }
            }
        }
    }

    fn complete_ok(&self, key: String) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.state = GateState::Idle;
        inner.last_success = Some(key);
    }

    /// Falha limpa a chave de sucesso: retry com parâmetros idênticos não
    /// pode ficar suprimido para sempre
    fn complete_err(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.state = GateState::Idle;
        inner.last_success = None;
    }

    /// Invalida a chave de sucesso (refresh explícito)
    fn invalidate(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.last_success = None;
    }
}

/// Serviço de consulta de leads
pub struct LeadQueryService {
    manager: LeadManager,
    state: RwLock<QueryState>,
    gate: FetchGate,
}

impl LeadQueryService {
    pub fn new(manager: LeadManager) -> Self {
        Self {
            manager,
            state: RwLock::new(QueryState::default()),
            gate: FetchGate::new(),
        }
    }

    /// Acesso ao manager subjacente (health checks)
    pub fn manager(&self) -> &LeadManager {
        &self.manager
    }

    /// Carrega leads com o estado atual, opcionalmente ajustando página,
    /// filtros e tamanho de página antes da consulta
    ///
    /// Um patch de filtros reposiciona na página 1; filtros vazios no patch
    /// removem a entrada correspondente do estado. O `source` identifica a
    /// operação que disparou a carga, só para os logs.
    pub async fn load_leads(
        &self,
        page: Option<u32>,
        filter_patch: Option<FilterState>,
        page_size_override: Option<u32>,
        source: Option<&str>,
    ) {
        let query = {
            let mut state = self.state.write().await;

            if let Some(patch) = filter_patch {
                for (field, value) in patch {
                    if value.is_empty() {
                        state.filters.remove(&field);
                    } else {
                        state.filters.insert(field, value);
                    }
                }
                state.pagination.page = 1;
            }
            if let Some(size) = page_size_override {
                state.pagination.page_size = size;
            }
            if let Some(page) = page {
                state.pagination.page = page;
            }

            LeadQuery {
                page: state.pagination.page,
                page_size: state.pagination.page_size,
                sort_by: state.sort_by.clone(),
                sort_dir: state.sort_dir,
                search: state.search.clone(),
                filters: filters::translate(&state.filters),
                duplicate_filter: state.duplicate_filter,
            }
        };

        let source = source.unwrap_or("load");
        let key = query.request_key();
        if !self.gate.try_begin(&key) {
            tracing::debug!(
                "⏭ Consulta suprimida pela deduplicação (origem: {}, key {})",
                source,
                &key[..12]
            );
            return;
        }

        tracing::debug!(
            "🔄 Carregando leads (origem: {}, página {}, modo {:?})",
            source,
            query.page,
            query.duplicate_filter
        );

        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let page_requested = query.page;
        let result = self.fetch_page(query).await;

        let mut state = self.state.write().await;
        state.loading = false;

        match result {
            Ok(page) => {
                log_leads_loaded(page.items.len(), page.total, page.page);
                state.leads = page.items;
                state.pagination = Pagination {
                    page: page.page,
                    page_size: page.page_size,
                    total: page.total,
                    total_pages: page.total_pages,
                };
                state.error = None;
                self.gate.complete_ok(key);
            }
            Err(message) => {
                // Dados e contadores anteriores ficam intactos; só o flag de
                // erro muda e a deduplicação libera o retry
                tracing::error!(
                    "❌ Falha ao carregar leads (página {}): {}",
                    page_requested,
                    message
                );
                state.error = Some(message);
                self.gate.complete_err();
            }
        }
    }

    /// Executa a consulta no modo de duplicados configurado
    async fn fetch_page(&self, mut query: LeadQuery) -> Result<LeadPage, String> {
        match query.duplicate_filter {
            DuplicateFilter::All => {
                self.manager.list_leads(&query).await.map_err(|e| e.to_string())
            }
            DuplicateFilter::Duplicates => self
                .manager
                .list_duplicates(&query)
                .await
                .map_err(|e| e.to_string()),
            DuplicateFilter::Unique => {
                // Únicos = listagem normal excluindo o conjunto de ids
                // duplicados via condição nin
                let ids = self.manager.duplicate_ids().await.map_err(|e| e.to_string())?;
                if !ids.is_empty() {
                    query
                        .filters
                        .insert("Id".to_string(), Condition::NotIn { values: ids });
                }
                self.manager.list_leads(&query).await.map_err(|e| e.to_string())
            }
        }
    }

    /// Vai para a página `n` mantendo filtros e ordenação
    pub async fn set_page(&self, page: u32) {
        self.load_leads(Some(page), None, None, Some("set_page")).await;
    }

    /// Troca o tamanho de página e volta para a página 1
    pub async fn set_page_size(&self, page_size: u32) {
        self.load_leads(Some(1), None, Some(page_size), Some("set_page_size")).await;
    }

    /// Aplica um patch de filtros e recarrega a partir da página 1
    pub async fn update_filters(&self, patch: FilterState) {
        self.load_leads(None, Some(patch), None, Some("update_filters")).await;
    }

    /// Recarrega com os parâmetros atuais, ignorando a deduplicação
    pub async fn refresh_leads(&self) {
        self.gate.invalidate();
        self.load_leads(None, None, None, Some("refresh")).await;
    }

    /// Aplica uma requisição completa do frontend e recarrega
    ///
    /// Mudanças de ordenação, busca ou modo de duplicados reposicionam na
    /// página 1, a menos que a requisição peça uma página explícita.
    pub async fn apply_query(&self, request: LeadQueryRequest) {
        {
            let mut state = self.state.write().await;
            let mut reset_page = false;

            if let Some(sort_by) = request.sort_by {
                if state.sort_by != sort_by {
                    state.sort_by = sort_by;
                    reset_page = true;
                }
            }
            if let Some(sort_dir) = request.sort_dir {
                if state.sort_dir != sort_dir {
                    state.sort_dir = sort_dir;
                    reset_page = true;
                }
            }
            if let Some(search) = request.search {
                let search = if search.is_empty() { None } else { Some(search) };
                if state.search != search {
                    state.search = search;
                    reset_page = true;
                }
            }
            if let Some(mode) = request.duplicate_filter {
                if state.duplicate_filter != mode {
                    state.duplicate_filter = mode;
                    reset_page = true;
                }
            }

            if reset_page && request.page.is_none() {
                state.pagination.page = 1;
            }
        }

        self.load_leads(request.page, request.filters, request.page_size, Some("query"))
            .await;
    }

    /// Carrega TODOS os leads que casam com os filtros atuais, sem paginação
    ///
    /// Usa uma página única muito grande; destinado a exportações com
    /// volumes moderados (sem streaming, sem cursor).
    pub async fn load_all_filtered_leads(&self) -> Result<Vec<Lead>, String> {
        let query = {
            let state = self.state.read().await;
            LeadQuery {
                page: 1,
                page_size: BULK_PAGE_SIZE,
                sort_by: state.sort_by.clone(),
                sort_dir: state.sort_dir,
                search: state.search.clone(),
                filters: filters::translate(&state.filters),
                duplicate_filter: state.duplicate_filter,
            }
        };

        match self.fetch_page(query).await {
            Ok(page) => Ok(page.items),
            Err(message) => {
                let mut state = self.state.write().await;
                state.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Valores distintos de um campo sob o contexto de filtros atual
    ///
    /// Alimenta os pickers de filtro. Sem cache: o frontend faz debounce.
    pub async fn get_unique_values(
        &self,
        field: &str,
        search: Option<&str>,
    ) -> Result<Vec<String>, String> {
        let conditions = {
            let state = self.state.read().await;
            filters::translate(&state.filters)
        };

        self.manager
            .unique_values(leads::fields::backend_field(field), search, &conditions)
            .await
            .map_err(|e| e.to_string())
    }

    /// Cópia do estado atual
    pub async fn snapshot(&self) -> QuerySnapshot {
        let state = self.state.read().await;
        QuerySnapshot {
            leads: state.leads.clone(),
            pagination: state.pagination.clone(),
            filters: state.filters.clone(),
            search: state.search.clone(),
            sort_by: state.sort_by.clone(),
            sort_dir: state.sort_dir,
            duplicate_filter: state.duplicate_filter,
            loading: state.loading,
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use leads::{FilterValue, LeadsClient};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn service_for(server: &MockServer) -> LeadQueryService {
        let client = LeadsClient::new(server.base_url(), "test-token").unwrap();
        LeadQueryService::new(LeadManager::new(client))
    }

    fn lead_body(total: u64) -> serde_json::Value {
        json!({
            "items": [{"Id": "l1", "Name": "Maria"}],
            "total": total,
            "total_pages": 1
        })
    }

    #[tokio::test]
    async fn test_load_updates_state_and_counters() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(200).json_body(lead_body(42));
            })
            .await;

        let service = service_for(&server);
        service.load_leads(None, None, None, None).await;

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.leads.len(), 1);
        assert_eq!(snapshot.pagination.total, 42);
        assert_eq!(snapshot.error, None);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_identical_repeated_load_is_deduplicated() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(200).json_body(lead_body(1));
            })
            .await;

        let service = service_for(&server);
        service.load_leads(None, None, None, None).await;
        service.load_leads(None, None, None, None).await;

        assert_eq!(mock.hits_async().await, 1, "Consulta idêntica deve ser suprimida");
    }

    #[tokio::test]
    async fn test_concurrent_identical_loads_fire_one_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(200)
                    .delay(Duration::from_millis(100))
                    .json_body(lead_body(1));
            })
            .await;

        let service = Arc::new(service_for(&server));
        let a = Arc::clone(&service);
        let b = Arc::clone(&service);

        tokio::join!(
            async move { a.load_leads(None, None, None, None).await },
            async move { b.load_leads(None, None, None, None).await },
        );

        assert_eq!(mock.hits_async().await, 1, "Só uma consulta em voo por vez");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_counters_and_sets_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads").query_param("page", "1");
                then.status(200).json_body(lead_body(42));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads").query_param("page", "2");
                then.status(500).json_body(json!({"error": "backend caiu"}));
            })
            .await;

        let service = service_for(&server);
        service.load_leads(None, None, None, None).await;
        service.set_page(2).await;

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.pagination.total, 42, "Contadores anteriores intactos");
        let error = snapshot.error.expect("erro deve estar preenchido");
        assert!(error.contains("backend caiu"));
    }

    #[tokio::test]
    async fn test_retry_after_failure_is_admitted() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(500).json_body(json!({"error": "boom"}));
            })
            .await;

        let service = service_for(&server);
        service.load_leads(None, None, None, None).await;
        service.load_leads(None, None, None, None).await;

        assert_eq!(
            mock.hits_async().await,
            2,
            "Falha limpa a chave de dedup e permite retry idêntico"
        );
    }

    #[tokio::test]
    async fn test_set_page_size_resets_to_first_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(200).json_body(json!({"items": [], "total": 0}));
            })
            .await;

        let service = service_for(&server);
        service.set_page(7).await;
        service.set_page_size(50).await;

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.pagination.page, 1);
        assert_eq!(snapshot.pagination.page_size, 50);
    }

    #[tokio::test]
    async fn test_update_filters_resets_page_and_translates() {
        let server = MockServer::start_async().await;
        let filtered = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/leads")
                    .query_param("page", "1")
                    .query_param("filters", r#"{"Stage":{"op":"eq","value":"Novo"}}"#);
                then.status(200).json_body(lead_body(3));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads").query_param("page", "4");
                then.status(200).json_body(lead_body(99));
            })
            .await;

        let service = service_for(&server);
        service.set_page(4).await;

        let mut patch = FilterState::new();
        patch.insert(
            "stage".to_string(),
            FilterValue::Values(vec!["Novo".to_string()]),
        );
        service.update_filters(patch).await;

        assert_eq!(filtered.hits_async().await, 1);
        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.pagination.page, 1);
        assert_eq!(snapshot.pagination.total, 3);
    }

    #[tokio::test]
    async fn test_empty_filter_patch_removes_entry() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(200).json_body(lead_body(1));
            })
            .await;

        let service = service_for(&server);

        let mut patch = FilterState::new();
        patch.insert(
            "stage".to_string(),
            FilterValue::Values(vec!["Novo".to_string()]),
        );
        service.update_filters(patch).await;

        let mut clear = FilterState::new();
        clear.insert("stage".to_string(), FilterValue::Values(Vec::new()));
        service.update_filters(clear).await;

        let snapshot = service.snapshot().await;
        assert!(snapshot.filters.is_empty());
    }

    #[tokio::test]
    async fn test_unique_mode_excludes_duplicate_ids() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/leads/duplicates/ids");
                then.status(200).json_body(json!(["a", "b"]));
            })
            .await;
        let listed = server
            .mock_async(|when, then| {
                when.method(GET).path("/leads").query_param(
                    "filters",
                    r#"{"Id":{"op":"nin","values":["a","b"]},"Stage":{"op":"eq","value":"Novo"}}"#,
                );
                then.status(200).json_body(lead_body(5));
            })
            .await;

        let service = service_for(&server);

        let mut request = LeadQueryRequest::default();
        request.duplicate_filter = Some(DuplicateFilter::Unique);
        let mut filters = FilterState::new();
        filters.insert(
            "stage".to_string(),
            FilterValue::Values(vec!["Novo".to_string()]),
        );
        request.filters = Some(filters);
        service.apply_query(request).await;

        assert_eq!(
            listed.hits_async().await,
            1,
            "A condição nin deve ser mesclada aos demais filtros"
        );
    }

    #[tokio::test]
    async fn test_duplicates_mode_uses_dedicated_endpoint() {
        let server = MockServer::start_async().await;
        let duplicates = server
            .mock_async(|when, then| {
                when.method(GET).path("/leads/duplicates");
                then.status(200).json_body(lead_body(2));
            })
            .await;

        let service = service_for(&server);
        let mut request = LeadQueryRequest::default();
        request.duplicate_filter = Some(DuplicateFilter::Duplicates);
        service.apply_query(request).await;

        assert_eq!(duplicates.hits_async().await, 1);
        assert_eq!(service.snapshot().await.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_dedup() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/leads");
                then.status(200).json_body(lead_body(1));
            })
            .await;

        let service = service_for(&server);
        service.load_leads(None, None, None, None).await;
        service.refresh_leads().await;

        assert_eq!(mock.hits_async().await, 2);
    }

    #[tokio::test]
    async fn test_load_all_filtered_uses_bulk_page_size() {
        let server = MockServer::start_async().await;
        let bulk = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/leads")
                    .query_param("page_size", "10000");
                then.status(200).json_body(json!({
                    "items": [{"Id": "l1", "Name": "Maria"}, {"Id": "l2", "Name": "José"}],
                    "total": 2
                }));
            })
            .await;

        let service = service_for(&server);
        let all = service.load_all_filtered_leads().await.unwrap();

        assert_eq!(bulk.hits_async().await, 1);
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_get_unique_values_translates_field_and_context() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/leads/unique-values")
                    .query_param("field", "Source");
                then.status(200).json_body(json!(["Facebook", "Google"]));
            })
            .await;

        let service = service_for(&server);
        let values = service.get_unique_values("source", None).await.unwrap();

        assert_eq!(mock.hits_async().await, 1);
        assert_eq!(values, vec!["Facebook", "Google"]);
    }
}
