/// Main Application: middleware de consulta de leads do CRM
///
/// Arquitetura:
/// - O frontend manda o estado de consulta (filtros, paginação, ordenação)
/// - O orquestrador traduz filtros, deduplica requisições e consulta o
///   backend de CRM, devolvendo leads normalizados
/// - Campanhas de outreach (WhatsApp) são disparadas com throttling e dry
///   run, entregando cada mensagem ao canal externo de transporte
///
/// Estado de consulta em memória, por processo: nada é persistido além da
/// sessão atual.

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Importar módulos da biblioteca
use crm_leads_middleware::{config, middleware as app_middleware, services, utils, AppState};

mod handlers;

use config::Settings;
use disparador::{OutreachConfig, OutreachService};
use handlers::{
    campaign_status, create_campaign, dispatch_campaign, export_leads, health_check, query_leads,
    ready_check, refresh_leads, set_page, set_page_size, status_check, unique_values,
};
use leads::{LeadManager, LeadsClient};
use services::LeadQueryService;
use utils::logging::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carregar variáveis de ambiente do arquivo .env (se existir)
    if dotenvy::dotenv().is_err() {
        // Em produção não existe .env - variáveis vêm do ambiente
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Inicializar tracing
    tracing_subscriber::fmt::init();

    // Carregar configurações
    let settings = Settings::new().context("Failed to load settings")?;

    log_config_loaded(&std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()));

    // Cliente do backend de CRM
    let crm_client = LeadsClient::with_timeouts(
        settings.crm.base_url.clone(),
        settings.crm.api_token.clone(),
        settings.crm.timeout_secs.unwrap_or(30),
        settings.crm.connect_timeout_secs.unwrap_or(5),
    )
    .context("Failed to create CRM client")?;

    let lead_query = Arc::new(LeadQueryService::new(LeadManager::new(crm_client)));
    log_info("⚡ Lead query service configurado com o backend de CRM");

    // Canal externo de transporte de WhatsApp: o disparador entrega as
    // mensagens aqui; quem consome é o gateway responsável pelo envio real
    let (send_tx, mut send_rx) =
        tokio::sync::mpsc::unbounded_channel::<disparador::OutreachMessage>();
    tokio::spawn(async move {
        while let Some(message) = send_rx.recv().await {
            tracing::info!(
                "📨 Mensagem entregue ao canal de WhatsApp (to: {}, {} chars)",
                message.to,
                message.body.len()
            );
        }
    });

    // Configuração do disparador (intervalos vêm do settings)
    let outreach_config = OutreachConfig {
        delay_between_sends: settings
            .outreach
            .as_ref()
            .and_then(|o| o.delay_between_sends_secs)
            .map(Duration::from_secs)
            .unwrap_or(disparador::DEFAULT_DELAY_BETWEEN_SENDS),
        dry_run_sample: settings
            .outreach
            .as_ref()
            .and_then(|o| o.dry_run_sample)
            .unwrap_or(disparador::DEFAULT_DRY_RUN_SAMPLE),
    };

    let outreach = Arc::new(OutreachService::new(outreach_config).with_send_callback(
        move |message| {
            send_tx
                .send(message.clone())
                .map_err(|e| format!("Canal de envio fechado: {}", e))
        },
    ));
    log_info("✅ Outreach dispatcher configurado (throttling + dry run)");

    // Inicializar estado da aplicação
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        lead_query,
        outreach,
    });

    // Configurar rotas base
    let mut app = Router::new()
        // Health checks (públicos)
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/status", get(status_check))

        // Consulta de leads (consumida pelo frontend)
        .route("/leads/query", post(query_leads))
        .route("/leads/page", post(set_page))
        .route("/leads/page-size", post(set_page_size))
        .route("/leads/refresh", post(refresh_leads))
        .route("/leads/unique-values", get(unique_values))
        .route("/leads/export", post(export_leads))

        .with_state(app_state.clone());

    // Rotas administrativas de outreach protegidas com API key
    let admin_routes = Router::new()
        .route("/admin/outreach/campaigns", post(create_campaign))
        .route("/admin/outreach/campaigns/:id/dispatch", post(dispatch_campaign))
        .route("/admin/outreach/campaigns/:id", get(campaign_status))
        .layer(middleware::from_fn(app_middleware::require_admin_key))
        .with_state(app_state);

    app = app.merge(admin_routes);

    // O frontend (SPA) chama direto do browser
    app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Iniciar servidor
    // Em ambientes gerenciados, usar a variável de ambiente PORT
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("{}:{}", settings.server.host, port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
