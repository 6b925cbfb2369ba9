// src/services/review.rs

// Máquina de estados da revisão (só leads Win):
//   pending -> reviewed | yet_to_review
//   yet_to_review <-> reviewed
// Não há caminho de volta para pending. O incentivo só é decidido com o lead em
// `reviewed`, mas fica gravado se o lead voltar para `yet_to_review`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::{AppError, ValidationError},
    models::lead::{is_storable_money, Incentive, Lead, LeadOutcome, ReviewState, ReviewStatus, WinDetails},
};

fn win_mut(lead: &mut Lead) -> Result<&mut WinDetails, AppError> {
    match &mut lead.outcome {
        LeadOutcome::Win(win) => Ok(win),
        LeadOutcome::Lost(_) => Err(AppError::LeadNotFound),
    }
}

/// Move a revisão para `target`. `reviewed` grava quem revisou (mesmo que já estivesse
/// revisado); `yet_to_review` apaga o revisor. O incentivo não é tocado.
pub fn set_review_status(
    lead: &Lead,
    target: ReviewStatus,
    acting_user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Lead, AppError> {
    let mut updated = lead.clone();
    let win = win_mut(&mut updated)?;

    let next = match target {
        ReviewStatus::Pending => return Err(ValidationError::InvalidReviewStatus.into()),
        ReviewStatus::YetToReview => ReviewState::YetToReview,
        ReviewStatus::Reviewed => ReviewState::Reviewed {
            reviewed_by: acting_user_id,
        },
    };

    if win.review != next {
        win.review = next;
        updated.updated_at = now;
    }
    Ok(updated)
}

/// Decide o incentivo de um lead revisado. `false` descarta qualquer valor enviado.
/// Repetir a mesma decisão devolve o lead intacto.
pub fn set_incentive(
    lead: &Lead,
    has_incentive: bool,
    amount: Option<Decimal>,
    now: DateTime<Utc>,
) -> Result<Lead, AppError> {
    let mut updated = lead.clone();
    let win = win_mut(&mut updated)?;

    if !matches!(win.review, ReviewState::Reviewed { .. }) {
        return Err(AppError::IncentiveRequiresReview);
    }

    let next = if has_incentive {
        let amount = amount
            .filter(|a| is_storable_money(*a))
            .ok_or(ValidationError::InvalidIncentiveAmount)?;
        Incentive::Granted(amount)
    } else {
        Incentive::Declined
    };

    if win.incentive != next {
        win.incentive = next;
        updated.updated_at = now;
    }
    Ok(updated)
}
