// Biblioteca do middleware de leads do CRM
// Expõe módulos para uso em testes e binários

pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub lead_query: Arc<services::LeadQueryService>,
    pub outreach: Arc<disparador::OutreachService>,
}
