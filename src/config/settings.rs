use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub crm: CrmSettings,
    pub outreach: Option<OutreachSettings>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrmSettings {
    pub base_url: String,
    pub api_token: String,
    pub timeout_secs: Option<u64>,          // Timeout total das chamadas ao backend
    pub connect_timeout_secs: Option<u64>,  // Timeout de conexão
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutreachSettings {
    pub delay_between_sends_secs: Option<u64>,  // Intervalo entre envios de WhatsApp
    pub dry_run_sample: Option<usize>,          // Tamanho da amostra de dry run
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Adicionar variáveis de ambiente específicas
        if let Ok(base_url) = std::env::var("CRM_API_BASE_URL") {
            builder = builder.set_override("crm.base_url", base_url)?;
        }
        if let Ok(token) = std::env::var("CRM_API_TOKEN") {
            builder = builder.set_override("crm.api_token", token)?;
        }

        // Prefixo genérico para os demais overrides (CRM_MIDDLEWARE_SERVER__PORT etc)
        builder = builder.add_source(Environment::with_prefix("CRM_MIDDLEWARE").separator("__"));

        let s = builder.build()?;

        s.try_deserialize()
    }
}
