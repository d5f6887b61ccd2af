//! Expiry-state derivation.
//!
//! Only calendar dates are stored and compared; there is no time-of-day
//! component. "Today" is the current UTC calendar date, taken once per read
//! via [`today`] so a record's status stays correct as time advances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Days ahead of expiry at which an item is flagged for triage.
///
/// Fixed policy constant; a candidate configuration point if per-household
/// windows are ever needed.
pub const NEAR_EXPIRY_WINDOW_DAYS: i64 = 3;

/// Derived triage label for a food record. Never persisted; recomputed on
/// every read.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FreshnessStatus {
    Fresh,
    NearExpiry,
    Expired,
}

/// Signed whole days until expiry; negative once the date has passed.
pub fn days_until_expiry(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

/// Classify a record's expiry date against a reference date.
pub fn classify(expiry: NaiveDate, today: NaiveDate) -> FreshnessStatus {
    let days_left = days_until_expiry(expiry, today);
    if days_left < 0 {
        FreshnessStatus::Expired
    } else if days_left <= NEAR_EXPIRY_WINDOW_DAYS {
        FreshnessStatus::NearExpiry
    } else {
        FreshnessStatus::Fresh
    }
}

/// The current UTC calendar date.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn classification_boundaries() {
        let today = date(2024, 6, 15);

        assert_eq!(classify(date(2024, 6, 14), today), FreshnessStatus::Expired);
        assert_eq!(
            classify(date(2024, 6, 15), today),
            FreshnessStatus::NearExpiry
        );
        assert_eq!(
            classify(date(2024, 6, 18), today),
            FreshnessStatus::NearExpiry
        );
        assert_eq!(classify(date(2024, 6, 19), today), FreshnessStatus::Fresh);
    }

    #[test]
    fn days_until_expiry_is_signed() {
        let today = date(2024, 6, 15);

        assert_eq!(days_until_expiry(date(2024, 6, 20), today), 5);
        assert_eq!(days_until_expiry(date(2024, 6, 15), today), 0);
        assert_eq!(days_until_expiry(date(2024, 6, 12), today), -3);
    }

    #[test]
    fn near_expiry_then_expired_over_time() {
        let expiry = date(2024, 1, 10);

        let today = date(2024, 1, 8);
        assert_eq!(classify(expiry, today), FreshnessStatus::NearExpiry);
        assert_eq!(days_until_expiry(expiry, today), 2);

        let today = date(2024, 1, 11);
        assert_eq!(classify(expiry, today), FreshnessStatus::Expired);
        assert_eq!(days_until_expiry(expiry, today), -1);
    }

    #[test]
    fn classification_spans_month_boundaries() {
        let today = date(2024, 1, 31);
        assert_eq!(classify(date(2024, 2, 2), today), FreshnessStatus::NearExpiry);
        assert_eq!(classify(date(2024, 2, 10), today), FreshnessStatus::Fresh);
    }
}
