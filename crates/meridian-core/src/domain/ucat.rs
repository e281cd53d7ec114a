use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Lowest scaled score a UCAT cognitive subtest can award.
pub const SUBTEST_MIN: u16 = 300;
/// Highest scaled score a UCAT cognitive subtest can award.
pub const SUBTEST_MAX: u16 = 900;
/// Situational judgement bands run 1 (best) to 4.
pub const SJT_BAND_MIN: u8 = 1;
pub const SJT_BAND_MAX: u8 = 4;

/// One sitting of the UCAT, as tracked in the portal score tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UcatAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sat_on: NaiveDate,
    pub verbal_reasoning: u16,
    pub decision_making: u16,
    pub quantitative_reasoning: u16,
    pub abstract_reasoning: u16,
    pub situational_judgement_band: u8,
    pub created_at: DateTime<Utc>,
}

impl UcatAttempt {
    /// Create an attempt, validating every score against the published ranges.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: Uuid,
        sat_on: NaiveDate,
        verbal_reasoning: u16,
        decision_making: u16,
        quantitative_reasoning: u16,
        abstract_reasoning: u16,
        situational_judgement_band: u8,
    ) -> Result<Self, DomainError> {
        for (name, score) in [
            ("verbal reasoning", verbal_reasoning),
            ("decision making", decision_making),
            ("quantitative reasoning", quantitative_reasoning),
            ("abstract reasoning", abstract_reasoning),
        ] {
            if !(SUBTEST_MIN..=SUBTEST_MAX).contains(&score) {
                return Err(DomainError::Validation(format!(
                    "{name} score {score} outside {SUBTEST_MIN}-{SUBTEST_MAX}"
                )));
            }
        }

        if !(SJT_BAND_MIN..=SJT_BAND_MAX).contains(&situational_judgement_band) {
            return Err(DomainError::Validation(format!(
                "situational judgement band {situational_judgement_band} outside {SJT_BAND_MIN}-{SJT_BAND_MAX}"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            sat_on,
            verbal_reasoning,
            decision_making,
            quantitative_reasoning,
            abstract_reasoning,
            situational_judgement_band,
            created_at: Utc::now(),
        })
    }

    /// Sum of the four cognitive subtests (1200-3600).
    pub fn cognitive_total(&self) -> u16 {
        self.verbal_reasoning
            + self.decision_making
            + self.quantitative_reasoning
            + self.abstract_reasoning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(vr: u16, sjt: u8) -> Result<UcatAttempt, DomainError> {
        UcatAttempt::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 7, 20).unwrap(),
            vr,
            700,
            650,
            720,
            sjt,
        )
    }

    #[test]
    fn valid_scores_accepted() {
        let a = attempt(680, 2).unwrap();
        assert_eq!(a.cognitive_total(), 680 + 700 + 650 + 720);
    }

    #[test]
    fn out_of_range_subtest_rejected() {
        assert!(matches!(attempt(299, 2), Err(DomainError::Validation(_))));
        assert!(matches!(attempt(901, 2), Err(DomainError::Validation(_))));
    }

    #[test]
    fn out_of_range_band_rejected() {
        assert!(matches!(attempt(680, 0), Err(DomainError::Validation(_))));
        assert!(matches!(attempt(680, 5), Err(DomainError::Validation(_))));
    }
}
