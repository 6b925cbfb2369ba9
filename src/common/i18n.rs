// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "pt"];

// Catálogo: código do erro -> mensagem
const EN: &[(&str, &str)] = &[
    ("invalid_name", "Customer name must be at least 2 characters"),
    ("invalid_phone", "Phone number must have exactly 10 digits"),
    ("missing_category", "Category is required"),
    ("invalid_status", "Status must be 'win' or 'lost'"),
    ("invalid_invoice", "Invoice number must be at least 3 alphanumeric characters"),
    ("invalid_price", "Sale price must be between ₹500 and ₹5,00,000"),
    ("invalid_deal_size", "Deal size must be a positive number with at most 2 decimal places"),
    ("invalid_model", "Model name must be at least 2 characters"),
    ("invalid_timeline", "Invalid purchase timeline"),
    ("missing_reason", "Tell us why the customer is not buying today"),
    ("invalid_reason", "Invalid reason"),
    ("missing_other_reason", "Describe the reason when choosing 'other'"),
    ("other_reason_too_long", "The reason must have at most 200 characters"),
    ("invalid_rating", "Lead rating must be between 1 and 5"),
    ("invalid_review_status", "Review status must be 'reviewed' or 'yet_to_review'"),
    ("invalid_incentive_amount", "Incentive amount must be greater than zero, with at most 2 decimal places"),
    ("invalid_fields", "One or more fields are invalid."),
    ("required", "This field is required"),
    ("invalid_category_name", "Category name must be at least 2 characters"),
    ("empty_selection", "Select at least one lead"),
    ("duplicate_invoice", "Invoice number already exists"),
    ("incentive_requires_review", "Incentives can only be set on reviewed leads"),
    ("concurrent_update", "The lead was changed by another request, please try again"),
    ("invalid_token", "Invalid or missing authentication token"),
    ("forbidden", "You are not allowed to perform this action"),
    ("lead_not_found", "Lead not found"),
    ("category_not_found", "Category not found"),
    ("customer_not_found", "Customer not found"),
    ("internal_error", "An unexpected error occurred"),
];

const PT: &[(&str, &str)] = &[
    ("invalid_name", "O nome do cliente deve ter no mínimo 2 caracteres"),
    ("invalid_phone", "O telefone deve ter exatamente 10 dígitos"),
    ("missing_category", "A categoria é obrigatória"),
    ("invalid_status", "O status deve ser 'win' ou 'lost'"),
    ("invalid_invoice", "A nota fiscal deve ter no mínimo 3 caracteres alfanuméricos"),
    ("invalid_price", "O preço de venda deve estar entre ₹500 e ₹5,00,000"),
    ("invalid_deal_size", "O tamanho do negócio deve ser um número positivo, com no máximo 2 casas decimais"),
    ("invalid_model", "O modelo deve ter no mínimo 2 caracteres"),
    ("invalid_timeline", "Prazo de compra inválido"),
    ("missing_reason", "Informe por que o cliente não comprou hoje"),
    ("invalid_reason", "Motivo inválido"),
    ("missing_other_reason", "Descreva o motivo ao escolher 'outro'"),
    ("other_reason_too_long", "O motivo deve ter no máximo 200 caracteres"),
    ("invalid_rating", "A nota do lead deve estar entre 1 e 5"),
    ("invalid_review_status", "O status de revisão deve ser 'reviewed' ou 'yet_to_review'"),
    ("invalid_incentive_amount", "O valor do incentivo deve ser maior que zero, com no máximo 2 casas decimais"),
    ("invalid_fields", "Um ou mais campos são inválidos."),
    ("required", "Campo obrigatório"),
    ("invalid_category_name", "O nome da categoria deve ter no mínimo 2 caracteres"),
    ("empty_selection", "Selecione ao menos um lead"),
    ("duplicate_invoice", "Esta nota fiscal já está cadastrada"),
    ("incentive_requires_review", "Incentivos só podem ser definidos em leads revisados"),
    ("concurrent_update", "O lead foi alterado por outra requisição, tente novamente"),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("forbidden", "Você não tem permissão para realizar esta ação"),
    ("lead_not_found", "Lead não encontrado"),
    ("category_not_found", "Categoria não encontrada"),
    ("customer_not_found", "Cliente não encontrado"),
    ("internal_error", "Ocorreu um erro inesperado."),
];

/// Mensagens traduzidas por idioma, carregadas uma vez no AppState.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("en", EN.iter().copied().collect());
        catalogs.insert("pt", PT.iter().copied().collect());
        Self { catalogs }
    }

    /// Idioma pedido -> inglês -> o próprio código.
    pub fn translate(&self, lang: &str, code: &str) -> String {
        [lang, DEFAULT_LANGUAGE]
            .iter()
            .find_map(|l| self.catalogs.get(*l).and_then(|c| c.get(code)))
            .map(|m| m.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
