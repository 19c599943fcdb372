//! Tradução do estado de filtros do frontend para condições do backend
//!
//! O frontend envia um mapa `campo → filtro`, onde cada filtro é:
//! - um filtro de coluna: lista de valores discretos aceitos; ou
//! - uma lista ordenada de condições de texto (operador + valor).
//!
//! A tradução produz o mapa `coluna do backend → objeto de condição`
//! serializado no parâmetro `filters` dos endpoints de listagem:
//! - 1 valor aceito → `{op:"eq"}`; N>1 valores → `{op:"in"}`
//! - pares de data (`createdAt`/`createdAtEnd`, etc) viram UMA condição de
//!   intervalo: `between` (dois limites), `gte` (só inferior), `lte` (só
//!   superior). Datas sem hora (10 caracteres) são normalizadas para
//!   início/fim do dia.
//! - condições de texto: apenas a PRIMEIRA condição por campo é aplicada,
//!   paridade com o comportamento histórico do frontend.

use crate::fields::backend_field;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Campos de data que chegam como par `campo` / `campoEnd`
const DATE_RANGE_FIELDS: &[&str] = &[
    "createdAt",
    "updatedAt",
    "nextFollowUp",
    "lastInteraction",
    "lastGestorInteractionAt",
];

/// Operadores de condição de texto suportados pelo frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

/// Uma condição de texto do frontend (operador + valor opcional)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextCondition {
    pub operator: TextOperator,
    #[serde(default)]
    pub value: Option<String>,
}

/// Filtro de um campo no estado do frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Filtro de coluna: conjunto de valores discretos aceitos
    Values(Vec<String>),
    /// Condições de texto ordenadas
    Conditions(Vec<TextCondition>),
}

impl FilterValue {
    /// Verifica se o filtro não restringe nada (remoção em merges de patch)
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Values(v) => v.is_empty(),
            FilterValue::Conditions(c) => c.is_empty(),
        }
    }

    /// Primeiro valor escalar do filtro (usado pelos pares de data)
    fn first_scalar(&self) -> Option<&str> {
        match self {
            FilterValue::Values(v) => v.iter().map(|s| s.as_str()).find(|s| !s.is_empty()),
            FilterValue::Conditions(c) => c
                .first()
                .and_then(|cond| cond.value.as_deref())
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Estado completo de filtros do frontend (campo → filtro)
pub type FilterState = BTreeMap<String, FilterValue>;

/// Objeto de condição aceito pelo backend no parâmetro `filters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Condition {
    #[serde(rename = "eq")]
    Eq { value: String },
    #[serde(rename = "neq")]
    Neq { value: String },
    #[serde(rename = "in")]
    In { values: Vec<String> },
    #[serde(rename = "nin")]
    NotIn { values: Vec<String> },
    #[serde(rename = "between")]
    Between { from: String, to: String },
    #[serde(rename = "gt")]
    Gt { value: String },
    #[serde(rename = "gte")]
    Gte { value: String },
    #[serde(rename = "lt")]
    Lt { value: String },
    #[serde(rename = "lte")]
    Lte { value: String },
    #[serde(rename = "contains")]
    Contains { value: String },
    #[serde(rename = "ncontains")]
    NotContains { value: String },
    #[serde(rename = "startswith")]
    StartsWith { value: String },
    #[serde(rename = "endswith")]
    EndsWith { value: String },
    #[serde(rename = "isnull")]
    IsNull,
    #[serde(rename = "notnull")]
    NotNull,
}

/// Mapa de condições já no vocabulário do backend
pub type ConditionMap = BTreeMap<String, Condition>;

/// Traduz o estado de filtros do frontend para o mapa de condições do backend
///
/// Função pura: não tem efeitos colaterais e ignora silenciosamente filtros
/// vazios ou condições sem valor (exceto `isEmpty`/`isNotEmpty`).
pub fn translate(filters: &FilterState) -> ConditionMap {
    let mut out = ConditionMap::new();

    // 1. Pares de data viram UMA condição de intervalo por campo lógico
    for field in DATE_RANGE_FIELDS {
        let end_key = format!("{}End", field);
        let lower = filters.get(*field).and_then(|f| f.first_scalar());
        let upper = filters.get(end_key.as_str()).and_then(|f| f.first_scalar());

        let condition = match (lower, upper) {
            (Some(from), Some(to)) => Some(Condition::Between {
                from: normalize_date_bound(from, false),
                to: normalize_date_bound(to, true),
            }),
            (Some(from), None) => Some(Condition::Gte {
                value: normalize_date_bound(from, false),
            }),
            (None, Some(to)) => Some(Condition::Lte {
                value: normalize_date_bound(to, true),
            }),
            (None, None) => None,
        };

        if let Some(condition) = condition {
            out.insert(backend_field(field).to_string(), condition);
        }
    }

    // 2. Demais campos
    for (field, value) in filters {
        if is_date_range_key(field) {
            continue;
        }

        let condition = match value {
            FilterValue::Values(values) => {
                let mut values: Vec<String> =
                    values.iter().filter(|v| !v.is_empty()).cloned().collect();
                match values.len() {
                    0 => None,
                    1 => values.pop().map(|value| Condition::Eq { value }),
                    _ => Some(Condition::In { values }),
                }
            }
            FilterValue::Conditions(conditions) => {
                if conditions.len() > 1 {
                    tracing::debug!(
                        "Campo '{}' tem {} condições de texto; apenas a primeira é aplicada",
                        field,
                        conditions.len()
                    );
                }
                conditions.first().and_then(translate_condition)
            }
        };

        if let Some(condition) = condition {
            out.insert(backend_field(field).to_string(), condition);
        }
    }

    out
}

/// Verifica se o nome de campo participa de um par de data
fn is_date_range_key(field: &str) -> bool {
    DATE_RANGE_FIELDS.contains(&field)
        || field
            .strip_suffix("End")
            .map(|stem| DATE_RANGE_FIELDS.contains(&stem))
            .unwrap_or(false)
}

/// Converte uma condição de texto do frontend para o vocabulário do backend
///
/// Operadores que exigem valor são descartados quando o valor está ausente
/// ou vazio.
fn translate_condition(condition: &TextCondition) -> Option<Condition> {
    use TextOperator::*;

    match condition.operator {
        IsEmpty => return Some(Condition::IsNull),
        IsNotEmpty => return Some(Condition::NotNull),
        _ => {}
    }

    let value = condition.value.as_deref().filter(|v| !v.is_empty())?.to_string();

    let translated = match condition.operator {
        Equals => Condition::Eq { value },
        NotEquals => Condition::Neq { value },
        Contains => Condition::Contains { value },
        NotContains => Condition::NotContains { value },
        StartsWith => Condition::StartsWith { value },
        EndsWith => Condition::EndsWith { value },
        GreaterThan => Condition::Gt { value },
        GreaterThanOrEqual => Condition::Gte { value },
        LessThan => Condition::Lt { value },
        LessThanOrEqual => Condition::Lte { value },
        IsEmpty | IsNotEmpty => unreachable!(),
    };

    Some(translated)
}

/// Normaliza limites de data sem componente de hora (10 caracteres ISO)
///
/// Limite inferior → início do dia, limite superior → fim do dia. Valores
/// com hora passam inalterados.
fn normalize_date_bound(value: &str, is_upper: bool) -> String {
    let bytes = value.as_bytes();
    let is_date_only =
        value.len() == 10 && bytes[4] == b'-' && bytes[7] == b'-' && !value.contains('T');

    if is_date_only {
        if is_upper {
            format!("{}T23:59:59", value)
        } else {
            format!("{}T00:00:00", value)
        }
    } else {
        value.to_string()
    }
}
