use crate::errors::ServiceError;
use crate::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Success with a human-readable message and no payload
pub fn message_response(message: impl Into<String>) -> Response {
    (StatusCode::OK, Json(ApiResponse::<()>::message(message))).into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

static PLATE_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,9})\s*(?:จาน)?\s*$").unwrap());

/// Parses a whole number of plates: `"500"`, `"500 จาน"` or `"500จาน"`.
pub fn parse_plate_count(value: &str) -> Result<i32, ServiceError> {
    PLATE_COUNT_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("'{}' is not a plate count", value.trim()))
        })
}

/// Renders a count the way the shop writes it
pub fn format_plate_count(count: i32) -> String {
    format!("{} จาน", count)
}

/// A plate count that accepts either a JSON number or the legacy
/// `"<N> จาน"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = i32)]
pub struct PlateCount(pub i32);

impl From<PlateCount> for i32 {
    fn from(value: PlateCount) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for PlateCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlateCountVisitor;

        impl<'de> de::Visitor<'de> for PlateCountVisitor {
            type Value = PlateCount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative whole number or a string like \"500 จาน\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i32::try_from(v)
                    .map(PlateCount)
                    .map_err(|_| E::custom("plate count is too large"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                if v < 0 {
                    return Err(E::custom("plate count must not be negative"));
                }
                self.visit_u64(v as u64)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                if v.fract() != 0.0 || v < 0.0 || v > f64::from(i32::MAX) {
                    return Err(E::custom("plate count must be a whole number"));
                }
                Ok(PlateCount(v as i32))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                parse_plate_count(v)
                    .map(PlateCount)
                    .map_err(|e| E::custom(e.response_message()))
            }
        }

        deserializer.deserialize_any(PlateCountVisitor)
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp and keeps the date.
pub fn parse_flexible_date(value: &str) -> Result<NaiveDate, ServiceError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| ServiceError::ValidationError(format!("'{}' is not a valid date", value)))
}

/// serde helper for optional date fields that may arrive in either format
pub mod flexible_date {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_flexible_date(value)
                .map(Some)
                .map_err(|e| de::Error::custom(e.response_message())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("500", 500)]
    #[case("500 จาน", 500)]
    #[case("500จาน", 500)]
    #[case("  12 จาน ", 12)]
    #[case("0", 0)]
    fn plate_counts_parse(#[case] input: &str, #[case] expected: i32) {
        assert_eq!(parse_plate_count(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("จาน")]
    #[case("-3")]
    #[case("1.5 จาน")]
    #[case("five")]
    fn bad_plate_counts_are_rejected(#[case] input: &str) {
        assert!(parse_plate_count(input).is_err());
    }

    #[test]
    fn plate_count_from_json_number_or_string() {
        let n: PlateCount = serde_json::from_str("120").unwrap();
        let s: PlateCount = serde_json::from_str("\"120 จาน\"").unwrap();
        assert_eq!(n, s);
        assert!(serde_json::from_str::<PlateCount>("-1").is_err());
        assert!(serde_json::from_str::<PlateCount>("2.5").is_err());
    }

    #[test]
    fn dates_accept_plain_or_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_flexible_date("2024-03-15").unwrap(), expected);
        assert_eq!(
            parse_flexible_date("2024-03-15T08:30:00.000Z").unwrap(),
            expected
        );
        assert!(parse_flexible_date("15/03/2024").is_err());
    }

    proptest! {
        #[test]
        fn display_form_parses_back(n in 0i32..1_000_000) {
            prop_assert_eq!(parse_plate_count(&format_plate_count(n)).unwrap(), n);
            prop_assert_eq!(parse_plate_count(&n.to_string()).unwrap(), n);
        }
    }
}
