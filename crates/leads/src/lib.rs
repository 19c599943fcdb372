//! Cliente tipado do backend de CRM para a camada de consulta de leads
//!
//! Este crate fornece uma interface tipo-segura para os endpoints de leads
//! do backend, cobrindo o caminho completo de uma listagem:
//!
//! - Tradução de filtros do frontend para condições do backend (`filters`)
//! - Mapeamento de nomes de campo frontend → backend (`fields`)
//! - Montagem de parâmetros de query e chave de deduplicação (`query`)
//! - Normalização defensiva dos registros crus (`types`)
//! - Operações tipadas de listagem (`manager`)
//!
//! # Contrato de query
//!
//! Todos os endpoints de listagem aceitam:
//! - `page` (1-based), `page_size`
//! - `sort_by` (nome de coluna do backend), `sort_dir` (`asc`|`desc`)
//! - `search` (texto livre, opcional)
//! - `filters` (mapa `coluna → condição` codificado em JSON)
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use leads::{filters, LeadManager, LeadQuery};
//!
//! #[tokio::main]
//! async fn main() -> leads::Result<()> {
//!     let manager = LeadManager::from_credentials(
//!         std::env::var("CRM_API_BASE_URL").expect("CRM_API_BASE_URL não configurada"),
//!         std::env::var("CRM_API_TOKEN").expect("CRM_API_TOKEN não configurado"),
//!     )?;
//!
//!     let mut query = LeadQuery::default();
//!     query.filters = filters::translate(&minha_ui_filter_state);
//!
//!     let page = manager.list_leads(&query).await?;
//!     println!("{} leads de {}", page.items.len(), page.total);
//!     Ok(())
//! }
//! ```

// Módulos públicos
pub mod client;
pub mod error;
pub mod fields;
pub mod filters;
pub mod manager;
pub mod query;
pub mod types;

// Re-exports principais
pub use client::LeadsClient;
pub use error::{LeadsError, Result};
pub use filters::{Condition, ConditionMap, FilterState, FilterValue, TextCondition, TextOperator};
pub use manager::LeadManager;
pub use query::{DuplicateFilter, LeadQuery, SortDir, BULK_PAGE_SIZE, DEFAULT_PAGE_SIZE};
pub use types::{Lead, LeadPage, RawLead, RawPage};
