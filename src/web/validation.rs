use serde_json::Value;

use crate::error::RequestError;
use crate::ml::{FeatureRange, HouseFeatures, FEATURE_RANGES};

/// Turn a `/predict` payload into a feature vector.
///
/// Every field is first read as a float and range-checked in `FEATURE_RANGES`
/// order; the first missing, non-numeric or out-of-range field wins. Only then
/// are integer fields given as strings required to parse as whole numbers.
/// JSON numbers are truncated for integer fields. Non-object payloads behave
/// like an empty object.
pub fn parse_features(payload: &Value) -> Result<HouseFeatures, RequestError> {
    let mut values = [0.0; HouseFeatures::NUM_FEATURES];

    for (slot, range) in values.iter_mut().zip(FEATURE_RANGES.iter()) {
        let value = coerce_float(range, field(payload, range)?)?;
        if !range.contains(value) {
            return Err(RequestError::Validation(range.message.to_string()));
        }
        *slot = value;
    }

    for range in FEATURE_RANGES.iter().filter(|r| r.integer) {
        let raw = field(payload, range)?;
        if let Value::String(s) = raw {
            if s.trim().parse::<i64>().is_err() {
                return Err(conversion_error(range, "an integer", raw));
            }
        }
    }

    Ok(HouseFeatures::from_values(values))
}

fn field<'a>(payload: &'a Value, range: &FeatureRange) -> Result<&'a Value, RequestError> {
    payload
        .get(range.name)
        .ok_or_else(|| RequestError::InputFormat(format!("missing field '{}'", range.name)))
}

/// Non-finite strings ("inf", "nan") parse here and are left to the range check.
fn coerce_float(range: &FeatureRange, raw: &Value) -> Result<f64, RequestError> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| conversion_error(range, "a number", raw))
}

fn conversion_error(range: &FeatureRange, kind: &str, raw: &Value) -> RequestError {
    RequestError::InputFormat(format!("could not convert {} to {}: {}", range.name, kind, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "square_feet": 2000,
            "bedrooms": 3,
            "bathrooms": 2,
            "age_years": 10,
            "garage_spaces": 2,
            "location_score": 7
        })
    }

    fn expect_validation(payload: Value) -> String {
        match parse_features(&payload) {
            Err(RequestError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_payload() {
        let f = parse_features(&valid()).unwrap();
        assert_eq!(f.square_feet, 2000.0);
        assert_eq!(f.bedrooms, 3);
        assert_eq!(f.location_score, 7);
    }

    #[test]
    fn test_each_field_one_unit_outside_range() {
        let cases = [
            ("square_feet", 499.0, 10001.0, "Square footage must be between 500 and 10,000"),
            ("bedrooms", 0.0, 11.0, "Bedrooms must be between 1 and 10"),
            ("bathrooms", 0.0, 9.0, "Bathrooms must be between 1 and 8"),
            ("age_years", -1.0, 101.0, "Age must be between 0 and 100 years"),
            ("garage_spaces", -1.0, 5.0, "Garage spaces must be between 0 and 4"),
            ("location_score", 0.0, 11.0, "Location score must be between 1 and 10"),
        ];

        for (field, below, above, message) in cases {
            for bad in [below, above] {
                let mut payload = valid();
                payload[field] = json!(bad);
                assert_eq!(expect_validation(payload), message, "{} = {}", field, bad);
            }
        }
    }

    #[test]
    fn test_boundaries_are_accepted() {
        let payload = json!({
            "square_feet": 10000,
            "bedrooms": 1,
            "bathrooms": 8,
            "age_years": 0,
            "garage_spaces": 4,
            "location_score": 10
        });
        assert!(parse_features(&payload).is_ok());
    }

    #[test]
    fn test_missing_field_is_format_error() {
        let mut payload = valid();
        payload.as_object_mut().unwrap().remove("bedrooms");
        match parse_features(&payload) {
            Err(e @ RequestError::InputFormat(_)) => {
                assert!(e.to_string().starts_with("Invalid input format"));
                assert!(e.to_string().contains("bedrooms"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_strings_accepted_others_rejected() {
        let mut payload = valid();
        payload["square_feet"] = json!("1850.5");
        assert_eq!(parse_features(&payload).unwrap().square_feet, 1850.5);

        payload["square_feet"] = json!("big");
        assert!(matches!(parse_features(&payload), Err(RequestError::InputFormat(_))));

        payload["square_feet"] = Value::Null;
        assert!(matches!(parse_features(&payload), Err(RequestError::InputFormat(_))));
    }

    #[test]
    fn test_range_checked_before_later_format_errors() {
        let mut payload = valid();
        payload["square_feet"] = json!(100);
        payload["bedrooms"] = json!("three");
        assert_eq!(expect_validation(payload), "Square footage must be between 500 and 10,000");
    }

    #[test]
    fn test_fractional_string_for_integer_field() {
        let mut payload = valid();
        payload["bedrooms"] = json!("3.5");
        match parse_features(&payload) {
            Err(e @ RequestError::InputFormat(_)) => assert!(e.to_string().contains("bedrooms")),
            other => panic!("expected format error, got {:?}", other),
        }

        payload["bedrooms"] = json!(" 4 ");
        assert_eq!(parse_features(&payload).unwrap().bedrooms, 4);

        payload["bedrooms"] = json!(3.5);
        assert_eq!(parse_features(&payload).unwrap().bedrooms, 3);
    }

    #[test]
    fn test_integer_coercion_runs_after_all_range_checks() {
        let mut payload = valid();
        payload["bedrooms"] = json!("3.5");
        payload["location_score"] = json!(20);
        assert_eq!(expect_validation(payload), "Location score must be between 1 and 10");
    }

    #[test]
    fn test_non_finite_strings_fail_range_check() {
        let mut payload = valid();
        payload["square_feet"] = json!("inf");
        assert_eq!(expect_validation(payload.clone()), "Square footage must be between 500 and 10,000");

        payload["square_feet"] = json!(2000);
        payload["age_years"] = json!("nan");
        assert_eq!(expect_validation(payload), "Age must be between 0 and 100 years");
    }

    #[test]
    fn test_non_object_payload() {
        assert!(matches!(parse_features(&json!([1, 2, 3])), Err(RequestError::InputFormat(_))));
    }
}
