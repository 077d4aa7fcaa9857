//! Rating values and per-store aggregates.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::profile::ValidationError;

/// A star rating from 1 to 5 inclusive.
///
/// ```
/// use store_ratings_core::RatingValue;
///
/// assert!(RatingValue::new(5).is_ok());
/// assert!(RatingValue::new(0).is_err());
/// assert!(RatingValue::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct RatingValue(i16);

impl RatingValue {
    /// Lowest rating.
    pub const MIN: i16 = 1;
    /// Highest rating.
    pub const MAX: i16 = 5;

    /// Create a rating from any integer.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::RatingOutOfRange` if the value is not 1-5.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        i16::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(ValidationError::RatingOutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                actual: value,
            })
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for i16 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for RatingValue {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RatingValue {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for RatingValue {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Mean and count of the ratings a store has received.
///
/// The mean is computed with exact decimal arithmetic and rounded to one
/// decimal place (midpoint away from zero). A store with no ratings has an
/// average of `0.0` and a count of `0`.
///
/// Serializes as `{"average_rating": 4.5, "rating_count": 2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingSummary {
    average: Decimal,
    count: i64,
}

impl RatingSummary {
    /// Summary of a store nobody has rated yet.
    pub const EMPTY: Self = Self {
        average: Decimal::ZERO,
        count: 0,
    };

    /// Build a summary from the sum and number of rating values.
    ///
    /// Storage backends aggregate with `SUM`/`COUNT`, so this is the single
    /// place the mean and its rounding are defined.
    #[must_use]
    pub fn from_totals(sum: i64, count: i64) -> Self {
        if count <= 0 {
            return Self::EMPTY;
        }

        let average = (Decimal::from(sum) / Decimal::from(count))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

        Self { average, count }
    }

    /// Build a summary from individual rating values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = RatingValue>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0_i64, 0_i64), |(sum, count), v| {
                (sum + i64::from(v.as_i16()), count + 1)
            });
        Self::from_totals(sum, count)
    }

    /// Rounded mean rating.
    #[must_use]
    pub const fn average(&self) -> Decimal {
        self.average
    }

    /// Rounded mean rating as a float, for JSON output.
    #[must_use]
    pub fn average_f64(&self) -> f64 {
        self.average.to_f64().unwrap_or(0.0)
    }

    /// Number of ratings.
    #[must_use]
    pub const fn count(&self) -> i64 {
        self.count
    }

    /// Whether the store has no ratings.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Serialize for RatingSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RatingSummary", 2)?;
        state.serialize_field("average_rating", &self.average_f64())?;
        state.serialize_field("rating_count", &self.count)?;
        state.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn values(raw: &[i64]) -> Vec<RatingValue> {
        raw.iter().map(|v| RatingValue::new(*v).unwrap()).collect()
    }

    #[test]
    fn test_rating_range() {
        for v in 1..=5 {
            assert_eq!(RatingValue::new(v).unwrap().as_i16(), i16::try_from(v).unwrap());
        }
        assert!(RatingValue::new(0).is_err());
        assert!(RatingValue::new(6).is_err());
        assert!(RatingValue::new(-3).is_err());
        assert!(RatingValue::new(i64::MAX).is_err());
    }

    #[test]
    fn test_rating_error_reports_value() {
        let err = RatingValue::new(9).unwrap_err();
        assert_eq!(
            err.to_string(),
            "rating must be an integer between 1 and 5 (got 9)"
        );
    }

    #[test]
    fn test_rating_deserialize_validates() {
        let v: RatingValue = serde_json::from_str("4").unwrap();
        assert_eq!(v.as_i16(), 4);
        assert!(serde_json::from_str::<RatingValue>("7").is_err());
        assert!(serde_json::from_str::<RatingValue>("2.5").is_err());
        assert_eq!(serde_json::to_string(&v).unwrap(), "4");
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = RatingSummary::from_values(Vec::new());
        assert_eq!(summary, RatingSummary::EMPTY);
        assert_eq!(summary.average(), Decimal::ZERO);
        assert_eq!(summary.count(), 0);
        assert!(summary.is_empty());
        assert!((summary.average_f64() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_of_five_and_four() {
        let summary = RatingSummary::from_values(values(&[5, 4]));
        assert_eq!(summary.average(), Decimal::new(45, 1));
        assert_eq!(summary.count(), 2);
    }

    #[test]
    fn test_average_of_five_four_three() {
        let summary = RatingSummary::from_values(values(&[5, 4, 3]));
        assert_eq!(summary.average(), Decimal::new(40, 1));
        assert!((summary.average_f64() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        // 14 / 3 = 4.666...
        let summary = RatingSummary::from_values(values(&[5, 5, 4]));
        assert_eq!(summary.average(), Decimal::new(47, 1));

        // 13 / 4 = 3.25, midpoint rounds away from zero
        let summary = RatingSummary::from_values(values(&[5, 3, 3, 2]));
        assert_eq!(summary.average(), Decimal::new(33, 1));
    }

    #[test]
    fn test_from_totals_ignores_non_positive_count() {
        assert_eq!(RatingSummary::from_totals(10, 0), RatingSummary::EMPTY);
        assert_eq!(RatingSummary::from_totals(0, -1), RatingSummary::EMPTY);
    }

    #[test]
    fn test_summary_serializes_as_number() {
        let summary = RatingSummary::from_totals(9, 2);
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "average_rating": 4.5, "rating_count": 2 })
        );
    }
}
