//! DTOs dos endpoints administrativos de outreach

use disparador::{DispatchMode, OutreachMessage};
use serde::Deserialize;

/// Corpo de `POST /admin/outreach/campaigns`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub name: String,
    pub messages: Vec<OutreachMessage>,
}

/// Query string de `POST /admin/outreach/campaigns/{id}/dispatch`
///
/// Sem `mode` explícito o disparo é dry run: o caminho perigoso (disparo
/// completo) exige opt-in.
#[derive(Debug, Default, Deserialize)]
pub struct DispatchParams {
    pub mode: Option<DispatchMode>,
}
