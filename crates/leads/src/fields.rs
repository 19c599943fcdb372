//! Mapeamento de nomes de campo: convenção do frontend → convenção do backend
//!
//! O frontend trabalha com nomes camelCase (`createdAt`, `assignedTo`), o
//! backend espera os nomes PascalCase das colunas (`CreatedAt`, `AssignedTo`).
//! A tabela é fixa e exaustiva; nomes fora da tabela passam sem tradução.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static FIELD_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("name", "Name"),
        ("firstName", "FirstName"),
        ("email", "Email"),
        ("phone", "Phone"),
        ("company", "Company"),
        ("occupation", "Occupation"),
        ("source", "Source"),
        ("campaign", "Campaign"),
        ("product", "Product"),
        ("stage", "Stage"),
        ("priority", "Priority"),
        ("value", "Value"),
        ("assignedTo", "AssignedTo"),
        ("assignedToName", "AssignedToName"),
        ("createdAt", "CreatedAt"),
        ("updatedAt", "UpdatedAt"),
        ("nextFollowUp", "NextFollowUp"),
        ("lastInteraction", "LastInteractionAt"),
        ("lastGestorInteractionAt", "LastGestorInteractionAt"),
        ("notes", "Notes"),
        ("tags", "Tags"),
        ("documentNumber", "DocumentNumber"),
        ("documentType", "DocumentType"),
        ("alternateEmail", "AlternateEmail"),
        ("isDuplicate", "IsDuplicate"),
        ("isDupByEmail", "IsDupByEmail"),
        ("isDupByDocumentNumber", "IsDupByDocumentNumber"),
        ("isDupByPhone", "IsDupByPhone"),
        ("duplicateEmailKey", "DuplicateEmailKey"),
        ("duplicateDocumentNumberKey", "DuplicateDocumentNumberKey"),
        ("duplicatePhoneKey", "DuplicatePhoneKey"),
    ])
});

/// Traduz um nome de campo do frontend para o nome esperado pelo backend
///
/// Nomes não mapeados passam inalterados (campos custom, por exemplo).
pub fn backend_field(ui_name: &str) -> &str {
    FIELD_MAP.get(ui_name).copied().unwrap_or(ui_name)
}
