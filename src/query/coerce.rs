//! Coerce raw string filter values (e.g. from URL query strings) to the field's type.

use crate::field::{Field, FieldType};
use crate::query::Filter;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

/// Typed JSON value for `raw`, or the raw string when it does not parse.
pub fn coerce_value(field_type: &FieldType, raw: &str) -> Value {
    let parsed = match field_type {
        FieldType::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
        FieldType::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        // Decimals keep their digits; the string is only checked to be numeric.
        FieldType::Decimal => {
            let trimmed = raw.trim();
            trimmed
                .parse::<f64>()
                .is_ok_and(f64::is_finite)
                .then(|| Value::String(trimmed.to_string()))
        }
        FieldType::Boolean => {
            if raw.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        FieldType::BinaryId => uuid::Uuid::parse_str(raw)
            .ok()
            .map(|u| Value::String(u.to_string())),
        FieldType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        FieldType::Time => NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
            .map(|t| Value::String(t.format("%H:%M:%S").to_string())),
        FieldType::NaiveDatetime => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .ok()
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        FieldType::UtcDatetime => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|d| Value::String(d.with_timezone(&Utc).to_rfc3339())),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Coerce the string values of a normalized filter against its field.
pub fn coerce_filter(field: &Field, filter: Filter) -> Filter {
    let coerce = |v: Value| match v {
        Value::String(s) => coerce_value(&field.field_type, &s),
        other => other,
    };
    let value = match filter.value {
        Value::Array(items) => Value::Array(items.into_iter().map(coerce).collect()),
        other => coerce(other),
    };
    Filter { value, ..filter }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(FieldType::Integer, "42", json!(42))]
    #[case(FieldType::Integer, "x", json!("x"))]
    #[case(FieldType::Float, "12.5", json!(12.5))]
    #[case(FieldType::Decimal, " 12.50 ", json!("12.50"))]
    #[case(FieldType::Decimal, "12345678901234567.89", json!("12345678901234567.89"))]
    #[case(FieldType::Decimal, "NaN", json!("NaN"))]
    #[case(FieldType::Boolean, "TRUE", json!(true))]
    #[case(FieldType::Date, "2024-03-09", json!("2024-03-09"))]
    #[case(FieldType::Date, "09/03/2024", json!("09/03/2024"))]
    #[case(FieldType::Time, "08:30", json!("08:30:00"))]
    #[case(FieldType::UtcDatetime, "2024-03-09T10:00:00+02:00", json!("2024-03-09T08:00:00+00:00"))]
    #[case(FieldType::String, "42", json!("42"))]
    fn coerces_by_type(#[case] field_type: FieldType, #[case] raw: &str, #[case] expected: Value) {
        assert_eq!(coerce_value(&field_type, raw), expected);
    }

    #[test]
    fn uuid_is_canonicalized() {
        assert_eq!(
            coerce_value(&FieldType::BinaryId, "A0EEBC99-9C0B-4EF8-BB6D-6BB9BD380A11"),
            json!("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11")
        );
    }
}
