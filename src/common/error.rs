// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

/// Falhas de entrada do intake e das operações de revisão. Sempre corrigíveis pelo chamador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("nome inválido")]
    InvalidName,
    #[error("telefone inválido")]
    InvalidPhone,
    #[error("categoria ausente")]
    MissingCategory,
    #[error("status inválido")]
    InvalidStatus,
    #[error("nota fiscal inválida")]
    InvalidInvoice,
    #[error("preço de venda inválido")]
    InvalidPrice,
    #[error("tamanho do negócio inválido")]
    InvalidDealSize,
    #[error("modelo inválido")]
    InvalidModel,
    #[error("prazo de compra inválido")]
    InvalidTimeline,
    #[error("motivo ausente")]
    MissingReason,
    #[error("motivo inválido")]
    InvalidReason,
    #[error("descrição do motivo ausente")]
    MissingOtherReason,
    #[error("descrição do motivo longa demais")]
    OtherReasonTooLong,
    #[error("nota do lead inválida")]
    InvalidRating,
    #[error("status de revisão inválido")]
    InvalidReviewStatus,
    #[error("valor de incentivo inválido")]
    InvalidIncentiveAmount,
}

impl ValidationError {
    /// Código estável enviado ao frontend (e chave do catálogo de mensagens).
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidName => "invalid_name",
            Self::InvalidPhone => "invalid_phone",
            Self::MissingCategory => "missing_category",
            Self::InvalidStatus => "invalid_status",
            Self::InvalidInvoice => "invalid_invoice",
            Self::InvalidPrice => "invalid_price",
            Self::InvalidDealSize => "invalid_deal_size",
            Self::InvalidModel => "invalid_model",
            Self::InvalidTimeline => "invalid_timeline",
            Self::MissingReason => "missing_reason",
            Self::InvalidReason => "invalid_reason",
            Self::MissingOtherReason => "missing_other_reason",
            Self::OtherReasonTooLong => "other_reason_too_long",
            Self::InvalidRating => "invalid_rating",
            Self::InvalidReviewStatus => "invalid_review_status",
            Self::InvalidIncentiveAmount => "invalid_incentive_amount",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação: {0}")]
    Validation(#[from] ValidationError),

    #[error("Erro de validação do payload")]
    PayloadValidation(#[from] validator::ValidationErrors),

    #[error("Nota fiscal '{0}' já existe")]
    DuplicateInvoice(String),

    #[error("Incentivo exige lead revisado")]
    IncentiveRequiresReview,

    #[error("Lead alterado por outra requisição")]
    ConcurrentUpdate,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Categoria não encontrada")]
    CategoryNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` carrega o contexto de qualquer outro erro inesperado.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::PayloadValidation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateInvoice(_)
            | AppError::IncentiveRequiresReview
            | AppError::ConcurrentUpdate => StatusCode::CONFLICT,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::LeadNotFound | AppError::CategoryNotFound | AppError::CustomerNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(v) => v.code(),
            AppError::PayloadValidation(_) => "invalid_fields",
            AppError::DuplicateInvoice(_) => "duplicate_invoice",
            AppError::IncentiveRequiresReview => "incentive_requires_review",
            AppError::ConcurrentUpdate => "concurrent_update",
            AppError::InvalidToken => "invalid_token",
            AppError::Forbidden => "forbidden",
            AppError::LeadNotFound => "lead_not_found",
            AppError::CategoryNotFound => "category_not_found",
            AppError::CustomerNotFound => "customer_not_found",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "internal_error",
        }
    }

    /// Converte para a resposta HTTP, com a mensagem no idioma do chamador.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let code = self.code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe fica no log, nunca na resposta.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match &self {
            AppError::PayloadValidation(errors) => {
                let mut fields = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                            Value::String(i18n.translate(&locale.0, key))
                        })
                        .collect();
                    fields.insert(field.to_string(), Value::Array(codes));
                }
                Some(Value::Object(fields))
            }
            AppError::DuplicateInvoice(invoice_no) => Some(json!({ "invoiceNo": invoice_no })),
            _ => None,
        };

        ApiError {
            status,
            code: code.to_string(),
            error: i18n.translate(&locale.0, code),
            details,
        }
    }
}

// O erro que de fato sai pela API
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "code": self.code,
            "error": self.error,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes_map_to_http_families() {
        assert_eq!(AppError::from(ValidationError::InvalidPhone).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DuplicateInvoice("INV001".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::ConcurrentUpdate.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::LeadNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let i18n = I18nStore::new();
        let api = AppError::InternalServerError(anyhow::anyhow!("senha do banco: xyz"))
            .to_api_error(&Locale("en".into()), &i18n);

        assert_eq!(api.code, "internal_error");
        assert!(!api.error.contains("xyz"));
        assert!(api.details.is_none());
    }

    #[test]
    fn message_follows_locale() {
        let i18n = I18nStore::new();
        let en = AppError::LeadNotFound.to_api_error(&Locale("en".into()), &i18n);
        let pt = AppError::LeadNotFound.to_api_error(&Locale("pt".into()), &i18n);

        assert_eq!(en.error, "Lead not found");
        assert_eq!(pt.error, "Lead não encontrado");
    }
}
