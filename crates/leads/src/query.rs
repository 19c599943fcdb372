//! Montagem dos parâmetros de query dos endpoints de listagem
//!
//! Todo endpoint de listagem aceita o mesmo conjunto de parâmetros:
//! `page`, `page_size`, `sort_by`, `sort_dir`, `search` e `filters`
//! (mapa de condições codificado em JSON).

use crate::fields::backend_field;
use crate::filters::ConditionMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Página padrão de listagem
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Tamanho de página usado por cargas completas (exportação em massa)
pub const BULK_PAGE_SIZE: u32 = 10_000;

/// Direção de ordenação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

/// Modo de visualização de duplicados
///
/// - `All`: listagem paginada direta
/// - `Duplicates`: endpoint dedicado de duplicados
/// - `Unique`: exclui os ids duplicados via condição `nin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateFilter {
    All,
    Duplicates,
    Unique,
}

/// Query completa de uma listagem de leads
#[derive(Debug, Clone, PartialEq)]
pub struct LeadQuery {
    /// Página 1-based
    pub page: u32,
    pub page_size: u32,
    /// Nome de campo na convenção do frontend (traduzido em `to_params`)
    pub sort_by: String,
    pub sort_dir: SortDir,
    pub search: Option<String>,
    /// Condições já traduzidas para o vocabulário do backend
    pub filters: ConditionMap,
    pub duplicate_filter: DuplicateFilter,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: "updatedAt".to_string(),
            sort_dir: SortDir::Desc,
            search: None,
            filters: ConditionMap::new(),
            duplicate_filter: DuplicateFilter::All,
        }
    }
}

impl LeadQuery {
    /// Monta os pares `(nome, valor)` de query string
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
            ("sort_by".to_string(), backend_field(&self.sort_by).to_string()),
            ("sort_dir".to_string(), self.sort_dir.as_str().to_string()),
        ];

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search".to_string(), search.to_string()));
        }

        if !self.filters.is_empty() {
            // ConditionMap é um BTreeMap: a serialização é determinística
            let encoded = serde_json::to_string(&self.filters).unwrap_or_default();
            params.push(("filters".to_string(), encoded));
        }

        params
    }

    /// Chave estável da requisição, usada pela deduplicação
    ///
    /// Cobre todos os parâmetros que afetam a resposta, inclusive o modo de
    /// duplicados (que muda o endpoint consultado). Queries iguais produzem
    /// chaves iguais.
    pub fn request_key(&self) -> String {
        let filters_json = serde_json::to_string(&self.filters).unwrap_or_default();
        let canonical = format!(
            "page={}|size={}|sort={}|dir={}|search={}|filters={}|dup={:?}",
            self.page,
            self.page_size,
            backend_field(&self.sort_by),
            self.sort_dir.as_str(),
            self.search.as_deref().unwrap_or(""),
            filters_json,
            self.duplicate_filter,
        );

        let digest = Sha256::digest(canonical.as_bytes());
        hex::encode(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Condition;

    #[test]
    fn test_default_query() {
        let query = LeadQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(query.sort_by, "updatedAt");
        assert_eq!(query.sort_dir, SortDir::Desc);
        assert_eq!(query.duplicate_filter, DuplicateFilter::All);
    }

    #[test]
    fn test_to_params_basic() {
        let query = LeadQuery::default();
        let params = query.to_params();

        assert!(params.contains(&("page".to_string(), "1".to_string())));
        assert!(params.contains(&("page_size".to_string(), "25".to_string())));
        assert!(params.contains(&("sort_by".to_string(), "UpdatedAt".to_string())));
        assert!(params.contains(&("sort_dir".to_string(), "desc".to_string())));
        // Sem search nem filters quando vazios
        assert!(!params.iter().any(|(k, _)| k == "search"));
        assert!(!params.iter().any(|(k, _)| k == "filters"));
    }

    #[test]
    fn test_to_params_encodes_filters_as_json() {
        let mut query = LeadQuery::default();
        query.filters.insert(
            "Stage".to_string(),
            Condition::Eq {
                value: "Novo".to_string(),
            },
        );

        let params = query.to_params();
        let filters = params
            .iter()
            .find(|(k, _)| k == "filters")
            .map(|(_, v)| v.as_str())
            .unwrap();

        assert_eq!(filters, r#"{"Stage":{"op":"eq","value":"Novo"}}"#);
    }

    #[test]
    fn test_request_key_is_stable() {
        let a = LeadQuery::default();
        let b = LeadQuery::default();
        assert_eq!(a.request_key(), b.request_key());
    }

    #[test]
    fn test_request_key_changes_with_any_component() {
        let base = LeadQuery::default();

        let mut other_page = base.clone();
        other_page.page = 2;
        assert_ne!(base.request_key(), other_page.request_key());

        let mut other_search = base.clone();
        other_search.search = Some("silva".to_string());
        assert_ne!(base.request_key(), other_search.request_key());

        let mut other_dup = base.clone();
        other_dup.duplicate_filter = DuplicateFilter::Unique;
        assert_ne!(base.request_key(), other_dup.request_key());

        let mut other_filters = base.clone();
        other_filters.filters.insert(
            "Stage".to_string(),
            Condition::Eq {
                value: "Novo".to_string(),
            },
        );
        assert_ne!(base.request_key(), other_filters.request_key());
    }

    #[test]
    fn test_empty_search_is_omitted() {
        let mut query = LeadQuery::default();
        query.search = Some(String::new());
        assert!(!query.to_params().iter().any(|(k, _)| k == "search"));
    }
}
