// src/services/scoring.rs

// Prioridade de follow-up dos leads Lost. Calculada em toda leitura, nunca gravada.

use rust_decimal::Decimal;

use crate::models::lead::{
    Lead, LeadResponse, LeadRow, NotTodayReason, PurchaseTimeline, ScoreCategory,
};

const MAX_SCORE: u8 = 100;

fn timeline_points(timeline: PurchaseTimeline) -> u8 {
    match timeline {
        PurchaseTimeline::Today => 40,
        PurchaseTimeline::ThreeDays => 30,
        PurchaseTimeline::SevenDays => 20,
        PurchaseTimeline::ThirtyDays => 10,
    }
}

fn deal_size_points(deal_size: Decimal) -> u8 {
    if deal_size >= Decimal::from(100_000) {
        25
    } else if deal_size >= Decimal::from(50_000) {
        20
    } else if deal_size >= Decimal::from(25_000) {
        15
    } else if deal_size > Decimal::ZERO {
        10
    } else {
        0
    }
}

fn reason_points(reason: Option<&NotTodayReason>) -> u8 {
    match reason {
        Some(NotTodayReason::NeedFamilyApproval) => 20,
        Some(NotTodayReason::PriceHigh) => 15,
        Some(NotTodayReason::Other(_)) | Some(NotTodayReason::WantMoreOptions) => 10,
        Some(NotTodayReason::JustBrowsing) => 5,
        None => 0,
    }
}

/// Score de 0 a 100. Leads Win valem 0.
pub fn score(lead: &Lead) -> u8 {
    let Some(lost) = lead.lost() else {
        return 0;
    };

    let total = timeline_points(lost.purchase_timeline)
        + deal_size_points(lost.deal_size)
        + reason_points(lost.not_today_reason.as_ref())
        + lost.lead_rating.value() * 3;

    total.min(MAX_SCORE)
}

pub fn categorize(score: u8) -> ScoreCategory {
    match score {
        80.. => ScoreCategory::Hot,
        50..=79 => ScoreCategory::Warm,
        _ => ScoreCategory::Cold,
    }
}

/// O lead no formato da API, já com o score do momento.
pub fn decorate(lead: &Lead) -> LeadResponse {
    let score = score(lead);
    LeadResponse {
        lead: LeadRow::from(lead),
        score,
        score_category: categorize(score),
    }
}
