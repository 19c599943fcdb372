//! Modelo de domínio de lead e normalização do formato de transporte
//!
//! O backend devolve registros "crus": campos planos tipados como string,
//! com `Tags`, `SelectedPortfolios` e `AdditionalInfo` codificados como
//! strings JSON. A normalização é defensiva campo a campo: um registro com
//! dados malformados NUNCA derruba a página inteira, cada campo degrada
//! para um padrão seguro de forma independente, com warning estruturado
//! para o problema ficar observável.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lead normalizado, pronto para consumo pelo frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub alternate_email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub occupation: Option<String>,

    // Classificação
    pub source: Option<String>,
    pub campaign: Option<String>,
    pub product: Option<String>,
    pub stage: Option<String>,
    pub priority: Option<String>,
    pub tags: Vec<String>,
    pub portfolios: Vec<String>,

    // Atribuição
    pub assigned_to: Option<String>,
    pub assigned_to_name: Option<String>,
    pub created_by: Option<String>,

    // Timestamps ISO-8601 (strings, como o backend envia)
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_interaction_at: Option<String>,
    pub last_gestor_interaction_at: Option<String>,
    pub next_follow_up: Option<String>,

    pub notes: Option<String>,

    // Campos numéricos coagidos de string
    pub document_number: i64,
    pub document_type: Option<String>,
    pub value: f64,
    pub age: Option<u32>,

    // Metadados de detecção de duplicados (calculados pelo backend)
    pub is_duplicate: bool,
    pub is_dup_by_email: bool,
    pub is_dup_by_document_number: bool,
    pub is_dup_by_phone: bool,
    pub duplicate_email_key: Option<String>,
    pub duplicate_document_number_key: Option<String>,
    pub duplicate_phone_key: Option<String>,
    pub duplicate_by: Vec<String>,

    pub additional_info: Option<Map<String, Value>>,
}

/// Registro cru como chega do backend (PascalCase, campos string-tipados)
///
/// Os campos sujeitos a coerção usam `Value` para aceitar qualquer shape
/// que o backend mande (string, número, booleano, array, null) sem falhar
/// a desserialização da página.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RawLead {
    pub id: String,
    pub name: String,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub alternate_email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub occupation: Option<String>,

    pub source: Option<String>,
    pub campaign: Option<String>,
    pub product: Option<String>,
    pub stage: Option<String>,
    pub priority: Option<String>,
    pub tags: Value,
    pub selected_portfolios: Value,

    pub assigned_to: Option<String>,
    pub assigned_to_name: Option<String>,
    pub created_by: Option<String>,

    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_interaction_at: Option<String>,
    pub last_gestor_interaction_at: Option<String>,
    pub next_follow_up: Option<String>,

    pub notes: Option<String>,

    pub document_number: Value,
    pub document_type: Option<String>,
    pub value: Value,
    pub age: Value,

    pub is_duplicate: Value,
    pub is_dup_by_email: Value,
    pub is_dup_by_document_number: Value,
    pub is_dup_by_phone: Value,
    pub duplicate_email_key: Option<String>,
    pub duplicate_document_number_key: Option<String>,
    pub duplicate_phone_key: Option<String>,
    pub duplicate_by: Value,

    pub additional_info: Value,
}

impl RawLead {
    /// Normaliza o registro cru para o modelo de domínio
    ///
    /// Nunca falha: qualquer campo malformado degrada para o padrão seguro
    /// daquele campo, com `tracing::warn!` para observabilidade.
    pub fn normalize(self) -> Lead {
        let id = self.id;

        // Tags são um conjunto: remove repetições preservando a ordem
        let mut tags: Vec<String> = Vec::new();
        for tag in parse_string_list(&self.tags, &id, "Tags") {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Lead {
            name: self.name,
            first_name: self.first_name,
            email: self.email,
            alternate_email: self.alternate_email,
            phone: self.phone,
            company: self.company,
            occupation: self.occupation,
            source: self.source,
            campaign: self.campaign,
            product: self.product,
            stage: self.stage,
            priority: self.priority,
            tags,
            portfolios: parse_string_list(&self.selected_portfolios, &id, "SelectedPortfolios"),
            assigned_to: self.assigned_to,
            assigned_to_name: self.assigned_to_name,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_interaction_at: self.last_interaction_at,
            last_gestor_interaction_at: self.last_gestor_interaction_at,
            next_follow_up: self.next_follow_up,
            notes: self.notes,
            document_number: coerce_i64(&self.document_number, &id, "DocumentNumber"),
            document_type: self.document_type,
            value: coerce_f64(&self.value, &id, "Value"),
            age: coerce_age(&self.age, &id),
            is_duplicate: coerce_bool(&self.is_duplicate),
            is_dup_by_email: coerce_bool(&self.is_dup_by_email),
            is_dup_by_document_number: coerce_bool(&self.is_dup_by_document_number),
            is_dup_by_phone: coerce_bool(&self.is_dup_by_phone),
            duplicate_email_key: self.duplicate_email_key,
            duplicate_document_number_key: self.duplicate_document_number_key,
            duplicate_phone_key: self.duplicate_phone_key,
            duplicate_by: parse_string_list(&self.duplicate_by, &id, "DuplicateBy"),
            additional_info: parse_additional_info(&self.additional_info, &id),
            id,
        }
    }
}

/// Extrai uma lista de strings de um campo que pode vir como array JSON,
/// string JSON codificada ou null
fn parse_string_list(value: &Value, lead_id: &str, field: &str) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => collect_strings(items),
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Vec::new();
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(items)) => collect_strings(&items),
                Ok(_) | Err(_) => {
                    tracing::warn!(
                        "⚠️ Lead '{}': campo {} não é um array JSON válido, usando lista vazia",
                        lead_id,
                        field
                    );
                    Vec::new()
                }
            }
        }
        other => {
            tracing::warn!(
                "⚠️ Lead '{}': campo {} com shape inesperado ({}), usando lista vazia",
                lead_id,
                field,
                json_type_name(other)
            );
            Vec::new()
        }
    }
}

fn collect_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Extrai o mapa de informações adicionais (objeto JSON ou string codificada)
fn parse_additional_info(value: &Value, lead_id: &str) -> Option<Map<String, Value>> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(map.clone()),
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Some(map),
                Ok(_) | Err(_) => {
                    tracing::warn!(
                        "⚠️ Lead '{}': AdditionalInfo não é um objeto JSON válido, descartando",
                        lead_id
                    );
                    None
                }
            }
        }
        other => {
            tracing::warn!(
                "⚠️ Lead '{}': AdditionalInfo com shape inesperado ({}), descartando",
                lead_id,
                json_type_name(other)
            );
            None
        }
    }
}

/// Coage um campo numérico inteiro que pode vir como número ou string
fn coerce_i64(value: &Value, lead_id: &str, field: &str) -> i64 {
    match value {
        Value::Null => 0,
        Value::Number(n) => n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64),
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return 0;
            }
            raw.parse::<i64>().unwrap_or_else(|_| {
                tracing::warn!(
                    "⚠️ Lead '{}': campo {} não numérico ('{}'), usando 0",
                    lead_id,
                    field,
                    raw
                );
                0
            })
        }
        _ => {
            tracing::warn!("⚠️ Lead '{}': campo {} com shape inesperado, usando 0", lead_id, field);
            0
        }
    }
}

/// Coage um campo numérico decimal que pode vir como número ou string
fn coerce_f64(value: &Value, lead_id: &str, field: &str) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return 0.0;
            }
            raw.parse::<f64>().unwrap_or_else(|_| {
                tracing::warn!(
                    "⚠️ Lead '{}': campo {} não numérico ('{}'), usando 0",
                    lead_id,
                    field,
                    raw
                );
                0.0
            })
        }
        _ => {
            tracing::warn!("⚠️ Lead '{}': campo {} com shape inesperado, usando 0", lead_id, field);
            0.0
        }
    }
}

/// Idade é opcional: ausente ou inválida vira `None`, não 0
fn coerce_age(value: &Value, lead_id: &str) -> Option<u32> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_u64().map(|v| v as u32),
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            match raw.parse::<u32>() {
                Ok(age) => Some(age),
                Err(_) => {
                    tracing::warn!(
                        "⚠️ Lead '{}': Age não numérica ('{}'), descartando",
                        lead_id,
                        raw
                    );
                    None
                }
            }
        }
        _ => None,
    }
}

/// Coage flags de duplicado que podem vir como booleano, string ou número
fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Value::Number(n) => n.as_i64().map(|v| v != 0).unwrap_or(false),
        _ => false,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_from(value: Value) -> RawLead {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_tags_parse_from_encoded_json() {
        let raw = raw_from(json!({"Id": "l1", "Name": "Maria", "Tags": "[\"a\",\"b\"]"}));
        let lead = raw.normalize();
        assert_eq!(lead.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_tags_degrade_to_empty() {
        let raw = raw_from(json!({"Id": "l1", "Name": "Maria", "Tags": "not json"}));
        let lead = raw.normalize();
        assert!(lead.tags.is_empty());
    }

    #[test]
    fn test_null_tags_degrade_to_empty() {
        let raw = raw_from(json!({"Id": "l1", "Name": "Maria", "Tags": null}));
        assert!(raw.normalize().tags.is_empty());
    }

    #[test]
    fn test_tags_accept_plain_array() {
        // Backend mais novo já manda array de verdade
        let raw = raw_from(json!({"Id": "l1", "Name": "Maria", "Tags": ["x", "y"]}));
        assert_eq!(raw.normalize().tags, vec!["x", "y"]);
    }

    #[test]
    fn test_tags_are_deduplicated() {
        let raw = raw_from(json!({"Id": "l1", "Name": "M", "Tags": "[\"a\",\"b\",\"a\"]"}));
        assert_eq!(raw.normalize().tags, vec!["a", "b"]);
    }

    #[test]
    fn test_numeric_coercion_scenario() {
        // Cenário do contrato: strings numéricas, Age vazia, Tags null
        let raw = raw_from(json!({
            "Id": "l1",
            "Name": "Maria",
            "DocumentNumber": "12345",
            "Value": "99.5",
            "Age": "",
            "Tags": null
        }));
        let lead = raw.normalize();

        assert_eq!(lead.document_number, 12345);
        assert_eq!(lead.value, 99.5);
        assert_eq!(lead.age, None);
        assert!(lead.tags.is_empty());
    }

    #[test]
    fn test_non_numeric_strings_default_without_panic() {
        let raw = raw_from(json!({
            "Id": "l1",
            "Name": "Maria",
            "DocumentNumber": "abc",
            "Value": "x",
            "Age": "quinze"
        }));
        let lead = raw.normalize();

        assert_eq!(lead.document_number, 0);
        assert_eq!(lead.value, 0.0);
        assert_eq!(lead.age, None);
    }

    #[test]
    fn test_numbers_accepted_directly() {
        let raw = raw_from(json!({
            "Id": "l1",
            "Name": "Maria",
            "DocumentNumber": 999,
            "Value": 10.25,
            "Age": 31
        }));
        let lead = raw.normalize();

        assert_eq!(lead.document_number, 999);
        assert_eq!(lead.value, 10.25);
        assert_eq!(lead.age, Some(31));
    }

    #[test]
    fn test_duplicate_flags_default_false_and_keys_none() {
        let raw = raw_from(json!({"Id": "l1", "Name": "Maria"}));
        let lead = raw.normalize();

        assert!(!lead.is_duplicate);
        assert!(!lead.is_dup_by_email);
        assert!(!lead.is_dup_by_document_number);
        assert!(!lead.is_dup_by_phone);
        assert_eq!(lead.duplicate_email_key, None);
        assert!(lead.duplicate_by.is_empty());
    }

    #[test]
    fn test_duplicate_metadata_passes_through() {
        let raw = raw_from(json!({
            "Id": "l1",
            "Name": "Maria",
            "IsDuplicate": true,
            "IsDupByEmail": "true",
            "DuplicateEmailKey": "maria@x.com",
            "DuplicateBy": "[\"email\"]"
        }));
        let lead = raw.normalize();

        assert!(lead.is_duplicate);
        assert!(lead.is_dup_by_email);
        assert_eq!(lead.duplicate_email_key.as_deref(), Some("maria@x.com"));
        assert_eq!(lead.duplicate_by, vec!["email"]);
    }

    #[test]
    fn test_additional_info_parses_encoded_object() {
        let raw = raw_from(json!({
            "Id": "l1",
            "Name": "Maria",
            "AdditionalInfo": "{\"origem_form\":\"landing\"}"
        }));
        let info = raw.normalize().additional_info.unwrap();
        assert_eq!(info.get("origem_form"), Some(&json!("landing")));
    }

    #[test]
    fn test_malformed_additional_info_degrades_to_none() {
        let raw = raw_from(json!({
            "Id": "l1",
            "Name": "Maria",
            "AdditionalInfo": "{{nope"
        }));
        assert_eq!(raw.normalize().additional_info, None);
    }

    #[test]
    fn test_each_field_degrades_independently() {
        // Um campo ruim não pode contaminar os demais
        let raw = raw_from(json!({
            "Id": "l1",
            "Name": "Maria",
            "Tags": "broken",
            "SelectedPortfolios": "[\"carteira-a\"]",
            "AdditionalInfo": "also broken",
            "Value": "150.0"
        }));
        let lead = raw.normalize();

        assert!(lead.tags.is_empty());
        assert_eq!(lead.portfolios, vec!["carteira-a"]);
        assert_eq!(lead.additional_info, None);
        assert_eq!(lead.value, 150.0);
    }

    #[test]
    fn test_lead_serializes_camel_case() {
        let raw = raw_from(json!({"Id": "l1", "Name": "Maria", "FirstName": "Maria"}));
        let lead = raw.normalize();
        let value = serde_json::to_value(&lead).unwrap();

        assert_eq!(value.get("firstName"), Some(&json!("Maria")));
        assert_eq!(value.get("isDuplicate"), Some(&json!(false)));
        assert!(value.get("FirstName").is_none());
    }
}
