// src/services/intake.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::{AppError, ValidationError},
    db::LeadStore,
    models::{
        auth::CallerContext,
        catalog::{ModelResolution, ProductModel},
        lead::{
            is_storable_money, Incentive, Lead, LeadOutcome, LeadRating, LeadStatus, LostDetails, NotTodayReason, PurchaseTimeline,
            ReasonCode, ReviewState, WinDetails,
        },
    },
};

const MIN_NAME_CHARS: usize = 2;
const PHONE_DIGITS: usize = 10;
const MIN_INVOICE_CHARS: usize = 3;
const MIN_MODEL_CHARS: usize = 2;
const MAX_OTHER_REASON_CHARS: usize = 200;

fn min_sale_price() -> Decimal {
    Decimal::from(500)
}

fn max_sale_price() -> Decimal {
    Decimal::from(500_000)
}

/// Número vindo do formulário: o frontend manda ora `1000`, ora `"1000"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumericInput {
    fn to_decimal(&self) -> Option<Decimal> {
        let raw = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        if raw.is_empty() {
            return None;
        }
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .ok()
    }
}

/// O formulário de criação de lead, como chega do cliente.
/// Tudo é opcional aqui: a validação decide o que falta e em que ordem avisar.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[schema(example = "Ravi Kumar")]
    pub customer_name: Option<String>,
    #[schema(example = "9876543210")]
    pub customer_phone: Option<String>,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub category_id: Option<String>,
    #[schema(example = "win")]
    pub status: Option<String>,

    // Win
    #[schema(example = "INV001")]
    pub invoice_no: Option<String>,
    #[schema(value_type = Option<f64>, example = 1000)]
    pub sale_price: Option<NumericInput>,

    // Lost
    #[schema(value_type = Option<f64>, example = 150000)]
    pub deal_size: Option<NumericInput>,
    #[schema(example = "Frost Free 350L")]
    pub model_name: Option<String>,
    #[schema(example = "3_days")]
    pub purchase_timeline: Option<String>,
    #[schema(example = "price_high")]
    pub not_today_reason: Option<String>,
    pub other_reason: Option<String>,
    #[schema(value_type = Option<i64>, example = 4)]
    pub lead_rating: Option<NumericInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidBranch {
    Win {
        invoice_no: String,
        sale_price: Decimal,
    },
    Lost {
        deal_size: Decimal,
        model_name: String,
        purchase_timeline: PurchaseTimeline,
        not_today_reason: Option<NotTodayReason>,
        lead_rating: LeadRating,
    },
}

/// Formulário já normalizado (nomes aparados, números convertidos).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLead {
    pub customer_name: String,
    pub customer_phone: String,
    pub category_id: Uuid,
    pub branch: ValidBranch,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Regras síncronas, na ordem em que o vendedor deve ser avisado.
pub fn validate(payload: &CreateLeadPayload) -> Result<ValidLead, ValidationError> {
    let customer_name = payload
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| n.chars().count() >= MIN_NAME_CHARS)
        .ok_or(ValidationError::InvalidName)?
        .to_string();

    let customer_phone = payload
        .customer_phone
        .as_deref()
        .filter(|p| p.len() == PHONE_DIGITS && p.bytes().all(|b| b.is_ascii_digit()))
        .ok_or(ValidationError::InvalidPhone)?
        .to_string();

    // Um id que não é UUID não aponta para categoria nenhuma.
    let category_id = non_blank(payload.category_id.as_deref())
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or(ValidationError::MissingCategory)?;

    let status = payload
        .status
        .as_deref()
        .and_then(LeadStatus::parse)
        .ok_or(ValidationError::InvalidStatus)?;

    let branch = match status {
        LeadStatus::Win => validate_win(payload)?,
        LeadStatus::Lost => validate_lost(payload)?,
    };

    Ok(ValidLead {
        customer_name,
        customer_phone,
        category_id,
        branch,
    })
}

fn validate_win(payload: &CreateLeadPayload) -> Result<ValidBranch, ValidationError> {
    let invoice_no = payload
        .invoice_no
        .as_deref()
        .map(str::trim)
        .filter(|i| i.len() >= MIN_INVOICE_CHARS && i.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or(ValidationError::InvalidInvoice)?
        .to_string();

    let sale_price = payload
        .sale_price
        .as_ref()
        .and_then(NumericInput::to_decimal)
        .filter(|p| is_storable_money(*p) && (min_sale_price()..=max_sale_price()).contains(p))
        .ok_or(ValidationError::InvalidPrice)?;

    Ok(ValidBranch::Win {
        invoice_no,
        sale_price,
    })
}

fn validate_lost(payload: &CreateLeadPayload) -> Result<ValidBranch, ValidationError> {
    let deal_size = payload
        .deal_size
        .as_ref()
        .and_then(NumericInput::to_decimal)
        .filter(|d| is_storable_money(*d))
        .ok_or(ValidationError::InvalidDealSize)?;

    let model_name = payload
        .model_name
        .as_deref()
        .map(str::trim)
        .filter(|m| m.chars().count() >= MIN_MODEL_CHARS)
        .ok_or(ValidationError::InvalidModel)?
        .to_string();

    let purchase_timeline = payload
        .purchase_timeline
        .as_deref()
        .and_then(PurchaseTimeline::parse)
        .ok_or(ValidationError::InvalidTimeline)?;

    // Com prazo "today" o motivo não existe, mesmo que o formulário mande um.
    let not_today_reason = if purchase_timeline.is_today() {
        None
    } else {
        Some(validate_reason(payload)?)
    };

    let lead_rating = payload
        .lead_rating
        .as_ref()
        .and_then(NumericInput::to_decimal)
        .filter(Decimal::is_integer)
        .and_then(|r| i64::try_from(r).ok())
        .and_then(LeadRating::new)
        .ok_or(ValidationError::InvalidRating)?;

    Ok(ValidBranch::Lost {
        deal_size,
        model_name,
        purchase_timeline,
        not_today_reason,
        lead_rating,
    })
}

fn validate_reason(payload: &CreateLeadPayload) -> Result<NotTodayReason, ValidationError> {
    let raw = non_blank(payload.not_today_reason.as_deref()).ok_or(ValidationError::MissingReason)?;
    let code = ReasonCode::parse(raw).ok_or(ValidationError::InvalidReason)?;

    Ok(match code {
        ReasonCode::NeedFamilyApproval => NotTodayReason::NeedFamilyApproval,
        ReasonCode::PriceHigh => NotTodayReason::PriceHigh,
        ReasonCode::WantMoreOptions => NotTodayReason::WantMoreOptions,
        ReasonCode::JustBrowsing => NotTodayReason::JustBrowsing,
        ReasonCode::Other => {
            let text = non_blank(payload.other_reason.as_deref()).ok_or(ValidationError::MissingOtherReason)?;
            if text.chars().count() > MAX_OTHER_REASON_CHARS {
                return Err(ValidationError::OtherReasonTooLong);
            }
            NotTodayReason::Other(text.to_string())
        }
    })
}

/// Um lead pronto para gravar, com o modelo novo (se houver) que deve entrar junto.
#[derive(Debug, Clone)]
pub struct PreparedLead {
    pub lead: Lead,
    pub new_model: Option<ProductModel>,
}

/// Validação completa: regras síncronas e depois as consultas ao store
/// (categoria, nota fiscal, modelo). Nada é gravado aqui.
pub async fn prepare(
    store: &dyn LeadStore,
    ctx: &CallerContext,
    payload: &CreateLeadPayload,
    now: DateTime<Utc>,
) -> Result<PreparedLead, AppError> {
    let valid = validate(payload)?;

    store
        .find_category(ctx.organization_id, valid.category_id)
        .await?
        .ok_or(AppError::CategoryNotFound)?;

    let (outcome, new_model) = match valid.branch {
        ValidBranch::Win {
            invoice_no,
            sale_price,
        } => {
            if store.invoice_exists(ctx.organization_id, &invoice_no).await? {
                return Err(AppError::DuplicateInvoice(invoice_no));
            }
            let outcome = LeadOutcome::Win(WinDetails {
                invoice_no,
                sale_price,
                review: ReviewState::Pending,
                incentive: Incentive::Unset,
            });
            (outcome, None)
        }
        ValidBranch::Lost {
            deal_size,
            model_name,
            purchase_timeline,
            not_today_reason,
            lead_rating,
        } => {
            // Busca-ou-cria sem trava: duas criações simultâneas podem gerar modelos repetidos.
            let resolution = match store
                .find_model(ctx.organization_id, valid.category_id, &model_name)
                .await?
            {
                Some(model) => ModelResolution::Existing(model.id),
                None => ModelResolution::Create(ProductModel::new(
                    ctx.organization_id,
                    valid.category_id,
                    &model_name,
                )),
            };

            let outcome = LeadOutcome::Lost(LostDetails {
                deal_size,
                model_id: resolution.model_id(),
                purchase_timeline,
                not_today_reason,
                lead_rating,
                auto_expired_at: None,
            });
            let new_model = match resolution {
                ModelResolution::Create(model) => Some(model),
                ModelResolution::Existing(_) => None,
            };
            (outcome, new_model)
        }
    };

    let lead = Lead {
        id: Uuid::new_v4(),
        organization_id: ctx.organization_id,
        sales_rep_id: ctx.user_id,
        customer_name: valid.customer_name,
        customer_phone: valid.customer_phone,
        category_id: valid.category_id,
        outcome,
        whatsapp_sent: false,
        whatsapp_sent_at: None,
        created_at: now,
        updated_at: now,
    };

    Ok(PreparedLead { lead, new_model })
}
