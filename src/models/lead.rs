// src/models/lead.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- ENUMS (mapeiam os CREATE TYPE do banco) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Win,
    Lost,
}

impl LeadStatus {
    /// Aceita apenas os valores exatos `win` e `lost`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "win" => Some(Self::Win),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "review_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    YetToReview,
    Reviewed,
}

impl ReviewStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "yet_to_review" => Some(Self::YetToReview),
            "reviewed" => Some(Self::Reviewed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "purchase_timeline")]
pub enum PurchaseTimeline {
    #[sqlx(rename = "today")]
    #[serde(rename = "today")]
    Today,
    #[sqlx(rename = "3_days")]
    #[serde(rename = "3_days")]
    ThreeDays,
    #[sqlx(rename = "7_days")]
    #[serde(rename = "7_days")]
    SevenDays,
    #[sqlx(rename = "30_days")]
    #[serde(rename = "30_days")]
    ThirtyDays,
}

impl PurchaseTimeline {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "today" => Some(Self::Today),
            "3_days" => Some(Self::ThreeDays),
            "7_days" => Some(Self::SevenDays),
            "30_days" => Some(Self::ThirtyDays),
            _ => None,
        }
    }

    pub fn is_today(self) -> bool {
        matches!(self, Self::Today)
    }
}

/// Código do motivo gravado na coluna `not_today_reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "not_today_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    NeedFamilyApproval,
    PriceHigh,
    WantMoreOptions,
    JustBrowsing,
    Other,
}

impl ReasonCode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "need_family_approval" => Some(Self::NeedFamilyApproval),
            "price_high" => Some(Self::PriceHigh),
            "want_more_options" => Some(Self::WantMoreOptions),
            "just_browsing" => Some(Self::JustBrowsing),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Motivo de o cliente não comprar hoje. O texto livre só existe em `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotTodayReason {
    NeedFamilyApproval,
    PriceHigh,
    WantMoreOptions,
    JustBrowsing,
    Other(String),
}

impl NotTodayReason {
    pub fn code(&self) -> ReasonCode {
        match self {
            Self::NeedFamilyApproval => ReasonCode::NeedFamilyApproval,
            Self::PriceHigh => ReasonCode::PriceHigh,
            Self::WantMoreOptions => ReasonCode::WantMoreOptions,
            Self::JustBrowsing => ReasonCode::JustBrowsing,
            Self::Other(_) => ReasonCode::Other,
        }
    }

    pub fn other_text(&self) -> Option<&str> {
        match self {
            Self::Other(text) => Some(text),
            _ => None,
        }
    }

    fn from_parts(code: ReasonCode, other: Option<String>) -> Option<Self> {
        Some(match code {
            ReasonCode::NeedFamilyApproval => Self::NeedFamilyApproval,
            ReasonCode::PriceHigh => Self::PriceHigh,
            ReasonCode::WantMoreOptions => Self::WantMoreOptions,
            ReasonCode::JustBrowsing => Self::JustBrowsing,
            ReasonCode::Other => Self::Other(other?),
        })
    }
}

/// Nota de 1 a 5 estrelas dada pelo vendedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LeadRating(u8);

impl LeadRating {
    pub fn new(value: i64) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

// --- DINHEIRO ---
// Preço, tamanho do negócio e incentivo vão para colunas NUMERIC(14, 2).

pub const MONEY_DECIMALS: u32 = 2;

/// 999.999.999.999,99
pub fn max_money() -> Decimal {
    Decimal::new(99_999_999_999_999, MONEY_DECIMALS)
}

/// Positivo, com no máximo dois decimais e dentro da coluna: o banco grava exatamente o valor.
pub fn is_storable_money(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount.normalize().scale() <= MONEY_DECIMALS && amount <= max_money()
}

// --- SUB-ESTADOS DO WIN ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incentive {
    /// Ainda não decidido pelo admin.
    Unset,
    Declined,
    Granted(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    Pending,
    YetToReview,
    Reviewed { reviewed_by: Uuid },
}

impl ReviewState {
    pub fn status(&self) -> ReviewStatus {
        match self {
            Self::Pending => ReviewStatus::Pending,
            Self::YetToReview => ReviewStatus::YetToReview,
            Self::Reviewed { .. } => ReviewStatus::Reviewed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinDetails {
    pub invoice_no: String,
    pub sale_price: Decimal,
    pub review: ReviewState,
    /// Só é gravado com o lead em `Reviewed`, mas sobrevive a uma volta para `yet_to_review`.
    pub incentive: Incentive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LostDetails {
    pub deal_size: Decimal,
    pub model_id: Uuid,
    pub purchase_timeline: PurchaseTimeline,
    pub not_today_reason: Option<NotTodayReason>,
    pub lead_rating: LeadRating,
    pub auto_expired_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadOutcome {
    Win(WinDetails),
    Lost(LostDetails),
}

// --- O LEAD ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub sales_rep_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub category_id: Uuid,
    pub outcome: LeadOutcome,
    pub whatsapp_sent: bool,
    pub whatsapp_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn status(&self) -> LeadStatus {
        match self.outcome {
            LeadOutcome::Win(_) => LeadStatus::Win,
            LeadOutcome::Lost(_) => LeadStatus::Lost,
        }
    }

    pub fn win(&self) -> Option<&WinDetails> {
        match &self.outcome {
            LeadOutcome::Win(win) => Some(win),
            LeadOutcome::Lost(_) => None,
        }
    }

    pub fn lost(&self) -> Option<&LostDetails> {
        match &self.outcome {
            LeadOutcome::Lost(lost) => Some(lost),
            LeadOutcome::Win(_) => None,
        }
    }

    /// Valor usado no histórico do cliente: preço de venda (Win) ou tamanho do negócio (Lost).
    pub fn value(&self) -> Decimal {
        match &self.outcome {
            LeadOutcome::Win(win) => win.sale_price,
            LeadOutcome::Lost(lost) => lost.deal_size,
        }
    }
}

// --- LINHA DO BANCO (formato plano) ---
// É também o formato de resposta da API: todas as colunas, nulas no ramo que não se aplica.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadRow {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub sales_rep_id: Uuid,
    #[schema(example = "Ravi Kumar")]
    pub customer_name: String,
    #[schema(example = "9876543210")]
    pub customer_phone: String,
    pub category_id: Uuid,
    pub status: LeadStatus,

    // Win
    #[schema(example = "INV001")]
    pub invoice_no: Option<String>,
    #[schema(example = "1000")]
    pub sale_price: Option<Decimal>,
    pub review_status: Option<ReviewStatus>,
    pub reviewed_by: Option<Uuid>,
    pub has_incentive: Option<bool>,
    pub incentive_amount: Option<Decimal>,

    // Lost
    #[schema(example = "150000")]
    pub deal_size: Option<Decimal>,
    pub model_id: Option<Uuid>,
    pub purchase_timeline: Option<PurchaseTimeline>,
    pub not_today_reason: Option<ReasonCode>,
    pub other_reason: Option<String>,
    #[schema(example = 4)]
    pub lead_rating: Option<i16>,
    pub auto_expired_at: Option<DateTime<Utc>>,

    pub whatsapp_sent: bool,
    pub whatsapp_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lead> for LeadRow {
    fn from(lead: &Lead) -> Self {
        let mut row = LeadRow {
            id: lead.id,
            organization_id: lead.organization_id,
            sales_rep_id: lead.sales_rep_id,
            customer_name: lead.customer_name.clone(),
            customer_phone: lead.customer_phone.clone(),
            category_id: lead.category_id,
            status: lead.status(),
            invoice_no: None,
            sale_price: None,
            review_status: None,
            reviewed_by: None,
            has_incentive: None,
            incentive_amount: None,
            deal_size: None,
            model_id: None,
            purchase_timeline: None,
            not_today_reason: None,
            other_reason: None,
            lead_rating: None,
            auto_expired_at: None,
            whatsapp_sent: lead.whatsapp_sent,
            whatsapp_sent_at: lead.whatsapp_sent_at,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        };

        match &lead.outcome {
            LeadOutcome::Win(win) => {
                row.invoice_no = Some(win.invoice_no.clone());
                row.sale_price = Some(win.sale_price);
                row.review_status = Some(win.review.status());
                if let ReviewState::Reviewed { reviewed_by } = &win.review {
                    row.reviewed_by = Some(*reviewed_by);
                }
                match &win.incentive {
                    Incentive::Unset => {}
                    Incentive::Declined => row.has_incentive = Some(false),
                    Incentive::Granted(amount) => {
                        row.has_incentive = Some(true);
                        row.incentive_amount = Some(*amount);
                    }
                }
            }
            LeadOutcome::Lost(lost) => {
                row.deal_size = Some(lost.deal_size);
                row.model_id = Some(lost.model_id);
                row.purchase_timeline = Some(lost.purchase_timeline);
                row.not_today_reason = lost.not_today_reason.as_ref().map(NotTodayReason::code);
                row.other_reason = lost
                    .not_today_reason
                    .as_ref()
                    .and_then(|r| r.other_text())
                    .map(str::to_owned);
                row.lead_rating = Some(lost.lead_rating.value() as i16);
                row.auto_expired_at = lost.auto_expired_at;
            }
        }

        row
    }
}

fn corrupt(id: Uuid, what: &str) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("lead {} inconsistente: {}", id, what))
}

impl TryFrom<LeadRow> for Lead {
    type Error = AppError;

    /// Remonta o lead a partir da linha, recusando combinações que violam as invariantes.
    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let win_columns = row.invoice_no.is_some()
            || row.sale_price.is_some()
            || row.review_status.is_some()
            || row.reviewed_by.is_some()
            || row.has_incentive.is_some()
            || row.incentive_amount.is_some();
        let lost_columns = row.deal_size.is_some()
            || row.model_id.is_some()
            || row.purchase_timeline.is_some()
            || row.not_today_reason.is_some()
            || row.other_reason.is_some()
            || row.lead_rating.is_some()
            || row.auto_expired_at.is_some();

        let outcome = match row.status {
            LeadStatus::Win => {
                if lost_columns {
                    return Err(corrupt(id, "win com campos de lost"));
                }
                let invoice_no = row.invoice_no.ok_or_else(|| corrupt(id, "sem invoice_no"))?;
                let sale_price = row.sale_price.ok_or_else(|| corrupt(id, "sem sale_price"))?;
                let status = row.review_status.ok_or_else(|| corrupt(id, "sem review_status"))?;

                let review = match status {
                    ReviewStatus::Reviewed => ReviewState::Reviewed {
                        reviewed_by: row.reviewed_by.ok_or_else(|| corrupt(id, "reviewed sem reviewed_by"))?,
                    },
                    _ if row.reviewed_by.is_some() => return Err(corrupt(id, "revisor fora de reviewed")),
                    ReviewStatus::YetToReview => ReviewState::YetToReview,
                    ReviewStatus::Pending => ReviewState::Pending,
                };
                let incentive = match (row.has_incentive, row.incentive_amount) {
                    (None, None) => Incentive::Unset,
                    (Some(false), None) => Incentive::Declined,
                    (Some(true), Some(amount)) => Incentive::Granted(amount),
                    _ => return Err(corrupt(id, "incentivo incoerente")),
                };
                // Pending nunca passou por revisão, então não pode ter incentivo.
                if review == ReviewState::Pending && incentive != Incentive::Unset {
                    return Err(corrupt(id, "incentivo em lead pending"));
                }

                LeadOutcome::Win(WinDetails { invoice_no, sale_price, review, incentive })
            }
            LeadStatus::Lost => {
                if win_columns {
                    return Err(corrupt(id, "lost com campos de win"));
                }
                let purchase_timeline = row
                    .purchase_timeline
                    .ok_or_else(|| corrupt(id, "sem purchase_timeline"))?;
                let not_today_reason = match row.not_today_reason {
                    Some(code) => Some(
                        NotTodayReason::from_parts(code, row.other_reason)
                            .ok_or_else(|| corrupt(id, "motivo other sem texto"))?,
                    ),
                    None if row.other_reason.is_some() => return Err(corrupt(id, "texto sem motivo")),
                    None => None,
                };
                if purchase_timeline.is_today() && not_today_reason.is_some() {
                    return Err(corrupt(id, "motivo com timeline today"));
                }
                let lead_rating = row
                    .lead_rating
                    .and_then(|r| LeadRating::new(r.into()))
                    .ok_or_else(|| corrupt(id, "lead_rating ausente ou fora de 1..5"))?;

                LeadOutcome::Lost(LostDetails {
                    deal_size: row.deal_size.ok_or_else(|| corrupt(id, "sem deal_size"))?,
                    model_id: row.model_id.ok_or_else(|| corrupt(id, "sem model_id"))?,
                    purchase_timeline,
                    not_today_reason,
                    lead_rating,
                    auto_expired_at: row.auto_expired_at,
                })
            }
        };

        Ok(Lead {
            id,
            organization_id: row.organization_id,
            sales_rep_id: row.sales_rep_id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            category_id: row.category_id,
            outcome,
            whatsapp_sent: row.whatsapp_sent,
            whatsapp_sent_at: row.whatsapp_sent_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// --- RESPOSTAS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoreCategory {
    Hot,
    Warm,
    Cold,
}

/// Lead no formato plano + o score calculado na leitura (nunca persistido).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    #[serde(flatten)]
    pub lead: LeadRow,
    #[schema(example = 80)]
    pub score: u8,
    pub score_category: ScoreCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lost_lead(timeline: PurchaseTimeline, reason: Option<NotTodayReason>) -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            sales_rep_id: Uuid::new_v4(),
            customer_name: "Asha".into(),
            customer_phone: "9876543210".into(),
            category_id: Uuid::new_v4(),
            outcome: LeadOutcome::Lost(LostDetails {
                deal_size: Decimal::new(30000, 0),
                model_id: Uuid::new_v4(),
                purchase_timeline: timeline,
                not_today_reason: reason,
                lead_rating: LeadRating::new(3).unwrap(),
                auto_expired_at: None,
            }),
            whatsapp_sent: false,
            whatsapp_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn lost_row_leaves_win_columns_empty() {
        let lead = lost_lead(PurchaseTimeline::SevenDays, Some(NotTodayReason::Other("call back".into())));
        let row = LeadRow::from(&lead);

        assert_eq!(row.status, LeadStatus::Lost);
        assert!(row.invoice_no.is_none() && row.sale_price.is_none() && row.review_status.is_none());
        assert_eq!(row.not_today_reason, Some(ReasonCode::Other));
        assert_eq!(row.other_reason.as_deref(), Some("call back"));
        assert_eq!(Lead::try_from(row).unwrap(), lead);
    }

    #[test]
    fn reviewed_win_row_carries_incentive() {
        let mut lead = lost_lead(PurchaseTimeline::Today, None);
        let reviewer = Uuid::new_v4();
        lead.outcome = LeadOutcome::Win(WinDetails {
            invoice_no: "INV001".into(),
            sale_price: Decimal::new(1000, 0),
            review: ReviewState::Reviewed { reviewed_by: reviewer },
            incentive: Incentive::Granted(Decimal::new(5000, 0)),
        });

        let row = LeadRow::from(&lead);
        assert_eq!(row.review_status, Some(ReviewStatus::Reviewed));
        assert_eq!(row.reviewed_by, Some(reviewer));
        assert_eq!(row.has_incentive, Some(true));
        assert_eq!(row.incentive_amount, Some(Decimal::new(5000, 0)));
        assert!(row.deal_size.is_none() && row.lead_rating.is_none());
        assert_eq!(Lead::try_from(row).unwrap(), lead);
    }

    #[test]
    fn row_with_both_groups_is_rejected() {
        let lead = lost_lead(PurchaseTimeline::Today, None);
        let mut row = LeadRow::from(&lead);
        row.invoice_no = Some("INV002".into());

        assert!(Lead::try_from(row).is_err());
    }

    fn win_row(review_status: ReviewStatus) -> LeadRow {
        let lead = lost_lead(PurchaseTimeline::Today, None);
        let mut row = LeadRow::from(&lead);
        row.status = LeadStatus::Win;
        row.deal_size = None;
        row.model_id = None;
        row.purchase_timeline = None;
        row.lead_rating = None;
        row.invoice_no = Some("INV003".into());
        row.sale_price = Some(Decimal::new(900, 0));
        row.review_status = Some(review_status);
        row.has_incentive = Some(true);
        row.incentive_amount = Some(Decimal::new(10, 0));
        row
    }

    #[test]
    fn pending_row_with_incentive_is_rejected() {
        assert!(Lead::try_from(win_row(ReviewStatus::Pending)).is_err());
    }

    #[test]
    fn unreviewed_row_keeps_its_incentive() {
        let lead = Lead::try_from(win_row(ReviewStatus::YetToReview)).unwrap();
        let win = lead.win().unwrap();

        assert_eq!(win.review, ReviewState::YetToReview);
        assert_eq!(win.incentive, Incentive::Granted(Decimal::new(10, 0)));
    }

    #[test]
    fn money_must_fit_the_column() {
        assert!(is_storable_money(Decimal::new(500055, 2)));
        assert!(is_storable_money(Decimal::new(50000, 3))); // 50.000 == 50.00
        assert!(is_storable_money(max_money()));

        assert!(!is_storable_money(Decimal::ZERO));
        assert!(!is_storable_money(Decimal::new(1, 3))); // 0.001
        assert!(!is_storable_money(Decimal::new(5000555, 3))); // 5000.555
        assert!(!is_storable_money(Decimal::from(10_000_000_000_000i64))); // 1e13
    }

    #[test]
    fn timeline_wire_names() {
        assert_eq!(PurchaseTimeline::parse("3_days"), Some(PurchaseTimeline::ThreeDays));
        assert_eq!(PurchaseTimeline::parse("3 days"), None);
        assert_eq!(serde_json::to_string(&PurchaseTimeline::ThirtyDays).unwrap(), "\"30_days\"");
        assert_eq!(LeadStatus::parse("Win"), None);
        assert!(LeadRating::new(0).is_none() && LeadRating::new(6).is_none());
    }
}
