//! Disparador de campanhas de WhatsApp
//!
//! Comportamento:
//! - Cada campanha tem sua própria fila de mensagens
//! - O disparo é serializado e espaçado (`delay_between_sends`, padrão 6s)
//!   para respeitar os limites do canal de envio
//! - Modo dry run: envia apenas uma amostra (as primeiras N mensagens) para
//!   validar o conteúdo antes do disparo completo
//! - O envio real é delegado ao callback registrado (`with_send_callback`):
//!   o serviço nunca fala com o WhatsApp diretamente, apenas entrega cada
//!   mensagem ao canal externo responsável pelo transporte
//! - Uma campanha em disparo rejeita um segundo disparo concorrente
//!
//! Exemplo:
//! ```text
//! Campanha "Follow-up Julho": 120 mensagens
//!     -> dispatch(DryRun)  -> 3 mensagens entregues ao canal
//!     -> revisão manual do conteúdo
//!     -> dispatch(Full)    -> 120 mensagens, uma a cada 6s
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Intervalo padrão entre envios consecutivos
pub const DEFAULT_DELAY_BETWEEN_SENDS: Duration = Duration::from_secs(6);

/// Tamanho padrão da amostra de dry run
pub const DEFAULT_DRY_RUN_SAMPLE: usize = 3;

/// Uma mensagem de outreach endereçada a um contato
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachMessage {
    /// Telefone de destino (formato internacional)
    pub to: String,
    pub body: String,
}

/// Estado de uma campanha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    Draft,
    Dispatching,
    Done,
}

/// Modo de disparo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Amostra limitada para validar conteúdo antes do disparo completo
    DryRun,
    Full,
}

/// Resultado de um disparo
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub campaign_id: Uuid,
    pub mode: DispatchMode,
    /// Mensagens tentadas neste disparo
    pub attempted: usize,
    /// Entregues ao canal com sucesso
    pub sent: usize,
    pub failed: usize,
}

/// Visão externa de uma campanha (para monitoramento)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatus {
    pub id: Uuid,
    pub name: String,
    pub state: CampaignState,
    pub total_messages: usize,
    pub sent: usize,
    pub failed: usize,
    pub created_at: DateTime<Utc>,
}

/// Erros do disparador
#[derive(Debug, Error)]
pub enum OutreachError {
    #[error("Campanha não encontrada: {0}")]
    UnknownCampaign(Uuid),

    #[error("Campanha já está em disparo: {0}")]
    AlreadyDispatching(Uuid),

    #[error("Nenhum canal de envio configurado")]
    NoChannel,

    #[error("Campanha sem mensagens")]
    EmptyCampaign,
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, OutreachError>;

/// Callback de envio: entrega uma mensagem ao canal externo de transporte
type SendCallback =
    Arc<dyn Fn(&OutreachMessage) -> std::result::Result<(), String> + Send + Sync>;

/// Campanha interna
#[derive(Debug)]
struct Campaign {
    id: Uuid,
    name: String,
    messages: Vec<OutreachMessage>,
    state: CampaignState,
    sent: usize,
    failed: usize,
    created_at: DateTime<Utc>,
}

/// Configuração do disparador
#[derive(Debug, Clone)]
pub struct OutreachConfig {
    pub delay_between_sends: Duration,
    pub dry_run_sample: usize,
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            delay_between_sends: DEFAULT_DELAY_BETWEEN_SENDS,
            dry_run_sample: DEFAULT_DRY_RUN_SAMPLE,
        }
    }
}

/// Serviço de disparo de campanhas
pub struct OutreachService {
    campaigns: Arc<RwLock<HashMap<Uuid, Campaign>>>,
    config: OutreachConfig,
    on_send: Option<SendCallback>,
}

impl OutreachService {
    pub fn new(config: OutreachConfig) -> Self {
        Self {
            campaigns: Arc::new(RwLock::new(HashMap::new())),
            config,
            on_send: None,
        }
    }

    /// Define o callback que entrega cada mensagem ao canal de transporte
    pub fn with_send_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&OutreachMessage) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.on_send = Some(Arc::new(callback));
        self
    }

    /// Cria uma campanha com a lista completa de mensagens
    pub async fn create_campaign(
        &self,
        name: String,
        messages: Vec<OutreachMessage>,
    ) -> Result<Uuid> {
        if messages.is_empty() {
            return Err(OutreachError::EmptyCampaign);
        }

        let id = Uuid::new_v4();
        let campaign = Campaign {
            id,
            name: name.clone(),
            messages,
            state: CampaignState::Draft,
            sent: 0,
            failed: 0,
            created_at: Utc::now(),
        };

        let mut campaigns = self.campaigns.write().await;
        let total = campaign.messages.len();
        campaigns.insert(id, campaign);

        tracing::info!("📋 Campanha '{}' criada: {} mensagens (id: {})", name, total, id);
        Ok(id)
    }

    /// Dispara uma campanha no modo indicado
    ///
    /// Dry run entrega só as primeiras `dry_run_sample` mensagens; o modo
    /// completo entrega todas. Os envios são espaçados por
    /// `delay_between_sends`. Retorna o resumo do disparo quando a última
    /// mensagem foi entregue ao canal.
    pub async fn dispatch(&self, id: Uuid, mode: DispatchMode) -> Result<DispatchSummary> {
        let callback = self.on_send.clone().ok_or(OutreachError::NoChannel)?;

        // Reservar a campanha para este disparo
        let batch: Vec<OutreachMessage> = {
            let mut campaigns = self.campaigns.write().await;
            let campaign = campaigns
                .get_mut(&id)
                .ok_or(OutreachError::UnknownCampaign(id))?;

            if campaign.state == CampaignState::Dispatching {
                return Err(OutreachError::AlreadyDispatching(id));
            }
            campaign.state = CampaignState::Dispatching;

            match mode {
                DispatchMode::DryRun => campaign
                    .messages
                    .iter()
                    .take(self.config.dry_run_sample)
                    .cloned()
                    .collect(),
                DispatchMode::Full => campaign.messages.clone(),
            }
        };

        tracing::info!(
            "🚀 Disparando campanha {} ({:?}): {} mensagens, intervalo {:?}",
            id,
            mode,
            batch.len(),
            self.config.delay_between_sends
        );

        let mut sent = 0usize;
        let mut failed = 0usize;

        for (index, message) in batch.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.delay_between_sends).await;
            }

            match callback(message) {
                Ok(()) => {
                    sent += 1;
                    tracing::debug!(
                        "📤 Campanha {}: mensagem {}/{} entregue ao canal ({})",
                        id,
                        index + 1,
                        batch.len(),
                        message.to
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        "⚠️ Campanha {}: falha ao entregar mensagem {}/{} ({}): {}",
                        id,
                        index + 1,
                        batch.len(),
                        message.to,
                        e
                    );
                }
            }
        }

        // Liberar a campanha e acumular contadores
        {
            let mut campaigns = self.campaigns.write().await;
            if let Some(campaign) = campaigns.get_mut(&id) {
                campaign.state = CampaignState::Done;
                campaign.sent += sent;
                campaign.failed += failed;
            }
        }

        tracing::info!(
            "✅ Campanha {} ({:?}): {} entregues, {} falhas",
            id,
            mode,
            sent,
            failed
        );

        Ok(DispatchSummary {
            campaign_id: id,
            mode,
            attempted: batch.len(),
            sent,
            failed,
        })
    }

    /// Visão externa de uma campanha
    pub async fn campaign_status(&self, id: Uuid) -> Result<CampaignStatus> {
        let campaigns = self.campaigns.read().await;
        let campaign = campaigns.get(&id).ok_or(OutreachError::UnknownCampaign(id))?;

        Ok(CampaignStatus {
            id: campaign.id,
            name: campaign.name.clone(),
            state: campaign.state,
            total_messages: campaign.messages.len(),
            sent: campaign.sent,
            failed: campaign.failed,
            created_at: campaign.created_at,
        })
    }

    /// Contagem de campanhas por estado (para debug/monitoring)
    pub async fn stats(&self) -> HashMap<&'static str, usize> {
        let campaigns = self.campaigns.read().await;
        let mut stats: HashMap<&'static str, usize> = HashMap::new();

        for campaign in campaigns.values() {
            let key = match campaign.state {
                CampaignState::Draft => "draft",
                CampaignState::Dispatching => "dispatching",
                CampaignState::Done => "done",
            };
            *stats.entry(key).or_insert(0) += 1;
        }

        stats
    }
}
