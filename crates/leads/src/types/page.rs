//! Adaptação das respostas paginadas do backend para o shape canônico
//!
//! O contrato do backend evoluiu e convive com variantes de nome para os
//! mesmos campos (`items`/`data`, `page`/`page_number`, `total`/`count`,
//! `total_pages`/`totalPages`). Este módulo é o ÚNICO ponto que conhece
//! essas variantes: uma variante nova entra aqui como mais um `alias`, e o
//! resto do sistema só enxerga [`LeadPage`].

use super::lead::{Lead, RawLead};
use serde::{Deserialize, Serialize};

/// Página canônica de leads normalizados
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPage {
    pub items: Vec<Lead>,
    /// Página 1-based
    pub page: u32,
    pub page_size: u32,
    /// Total de registros que casam com os filtros
    pub total: u64,
    pub total_pages: u32,
}

/// Resposta paginada crua, tolerante às variantes conhecidas do backend
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPage {
    #[serde(alias = "data")]
    pub items: Vec<RawLead>,
    #[serde(alias = "page_number")]
    pub page: Option<u32>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<u32>,
    #[serde(alias = "count")]
    pub total: Option<u64>,
    #[serde(alias = "totalPages")]
    pub total_pages: Option<u32>,
}

impl RawPage {
    /// Converte para a página canônica, normalizando cada registro
    ///
    /// `fallback_page`/`fallback_page_size` vêm da query enviada, para os
    /// casos em que o backend omite os contadores. `total_pages` ausente é
    /// derivado por divisão com teto.
    pub fn into_page(self, fallback_page: u32, fallback_page_size: u32) -> LeadPage {
        let page = self.page.unwrap_or(fallback_page);
        let page_size = self.page_size.unwrap_or(fallback_page_size);
        let total = self.total.unwrap_or(0);
        let total_pages = self
            .total_pages
            .unwrap_or_else(|| derive_total_pages(total, page_size));

        LeadPage {
            items: self.items.into_iter().map(RawLead::normalize).collect(),
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

/// `ceil(total / page_size)`, com proteção contra divisão por zero
fn derive_total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64) as u32
}
