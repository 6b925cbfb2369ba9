// src/services/expiry.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::lead::{Lead, LeadOutcome, LeadResponse, NotTodayReason};

/// Texto gravado em `other_reason` dos leads expirados. Também serve de marca
/// para que execuções seguidas não reprocessem o mesmo lead.
pub const AUTO_EXPIRE_MARKER: &str = "Auto-expired";
pub const AUTO_EXPIRE_REASON: &str =
    "Auto-expired: No follow-up within 30 days of expected purchase timeline";

pub const STALE_AFTER_DAYS: i64 = 30;

pub fn cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(STALE_AFTER_DAYS)
}

/// Lost, parado desde antes do corte, com prazo diferente de hoje e ainda não expirado.
pub fn is_expiry_candidate(lead: &Lead, cutoff: DateTime<Utc>) -> bool {
    let Some(lost) = lead.lost() else {
        return false;
    };

    let already_marked = lost
        .not_today_reason
        .as_ref()
        .and_then(NotTodayReason::other_text)
        .is_some_and(|text| text.contains(AUTO_EXPIRE_MARKER));

    lead.updated_at < cutoff
        && !lost.purchase_timeline.is_today()
        && lost.auto_expired_at.is_none()
        && !already_marked
}

/// O lead depois da expiração. Só o motivo e as datas mudam.
pub fn expire(lead: &Lead, now: DateTime<Utc>) -> Lead {
    let mut expired = lead.clone();
    if let LeadOutcome::Lost(lost) = &mut expired.outcome {
        lost.not_today_reason = Some(NotTodayReason::Other(AUTO_EXPIRE_REASON.to_string()));
        lost.auto_expired_at = Some(now);
        expired.updated_at = now;
    }
    expired
}

/// Resultado de uma varredura.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    #[schema(example = 3)]
    pub expired_count: usize,
    pub leads: Vec<LeadResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::models::lead::{LeadRating, LostDetails, PurchaseTimeline};
    use crate::services::scoring;

    fn lost_lead(timeline: PurchaseTimeline, updated_days_ago: i64, now: DateTime<Utc>) -> Lead {
        let reason = (!timeline.is_today()).then_some(NotTodayReason::NeedFamilyApproval);
        Lead {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            sales_rep_id: Uuid::new_v4(),
            customer_name: "Farhan".into(),
            customer_phone: "9000000001".into(),
            category_id: Uuid::new_v4(),
            outcome: LeadOutcome::Lost(LostDetails {
                deal_size: Decimal::from(60_000),
                model_id: Uuid::new_v4(),
                purchase_timeline: timeline,
                not_today_reason: reason,
                lead_rating: LeadRating::new(4).unwrap(),
                auto_expired_at: None,
            }),
            whatsapp_sent: false,
            whatsapp_sent_at: None,
            created_at: now - Duration::days(updated_days_ago),
            updated_at: now - Duration::days(updated_days_ago),
        }
    }

    #[test]
    fn stale_lost_lead_is_candidate_unless_today() {
        let now = Utc::now();
        assert!(is_expiry_candidate(&lost_lead(PurchaseTimeline::SevenDays, 31, now), cutoff(now)));
        assert!(!is_expiry_candidate(&lost_lead(PurchaseTimeline::Today, 31, now), cutoff(now)));
        assert!(!is_expiry_candidate(&lost_lead(PurchaseTimeline::SevenDays, 29, now), cutoff(now)));
    }

    #[test]
    fn expired_lead_is_no_longer_candidate() {
        let now = Utc::now();
        let lead = lost_lead(PurchaseTimeline::ThirtyDays, 45, now);
        let expired = expire(&lead, now);

        let lost = expired.lost().unwrap();
        assert_eq!(
            lost.not_today_reason,
            Some(NotTodayReason::Other(AUTO_EXPIRE_REASON.to_string()))
        );
        assert_eq!(lost.auto_expired_at, Some(now));
        assert_eq!(expired.updated_at, now);
        assert_eq!(lost.deal_size, lead.lost().unwrap().deal_size);

        // Mesmo um relógio bem adiantado não reprocessa.
        let later = now + Duration::days(90);
        assert!(!is_expiry_candidate(&expired, cutoff(later)));
    }

    #[test]
    fn marker_text_alone_excludes_the_lead() {
        let now = Utc::now();
        let mut lead = lost_lead(PurchaseTimeline::ThreeDays, 40, now);
        if let LeadOutcome::Lost(lost) = &mut lead.outcome {
            lost.not_today_reason = Some(NotTodayReason::Other(format!("{AUTO_EXPIRE_MARKER} earlier")));
        }
        assert!(!is_expiry_candidate(&lead, cutoff(now)));
    }

    #[test]
    fn expiry_lowers_reason_points() {
        let now = Utc::now();
        let lead = lost_lead(PurchaseTimeline::SevenDays, 31, now);
        // need_family_approval (20) -> other (10)
        assert_eq!(scoring::score(&lead) - scoring::score(&expire(&lead, now)), 10);
    }
}
