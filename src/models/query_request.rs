//! DTOs do surface HTTP voltado ao frontend
//!
//! O frontend manda o estado de consulta no shape camelCase que já usa
//! internamente; os tipos de filtro são os do crate `leads`, então o corpo
//! da requisição entra direto na tradução sem conversão intermediária.

use serde::Deserialize;

use leads::{DuplicateFilter, FilterState, SortDir};

/// Corpo de `POST /leads/query` — todos os campos são opcionais: o que não
/// vier mantém o estado atual da sessão de consulta
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadQueryRequest {
    /// Página 1-based
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDir>,
    /// Busca em texto livre; string vazia limpa a busca
    pub search: Option<String>,
    /// Patch de filtros: filtros vazios removem a entrada correspondente
    pub filters: Option<FilterState>,
    pub duplicate_filter: Option<DuplicateFilter>,
}

/// Corpo de `POST /leads/page`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPageRequest {
    pub page: u32,
}

/// Corpo de `POST /leads/page-size`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPageSizeRequest {
    pub page_size: u32,
}

/// Query string de `GET /leads/unique-values`
#[derive(Debug, Deserialize)]
pub struct UniqueValuesParams {
    /// Nome de campo na convenção do frontend
    pub field: String,
    pub search: Option<String>,
}
