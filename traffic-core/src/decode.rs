//! Response decoding and schema validation.
//!
//! Response bodies carry a fixed security preamble that must be stripped
//! before the remainder parses as JSON. The metric series lives at a fixed
//! nesting depth: `body[0][1]` is a sequence of `[timestamp_ms, [[_, value]]]`
//! entries. The value sits in the first inner pair; that pair's own first
//! element is unused.
//!
//! All "is this the shape we expect" logic lives here. A malformed body is a
//! [`ShapeError`]; a malformed individual element is a [`ShapeAnomaly`] and
//! is rejected, never skipped silently.

use crate::series::{timestamp_from_millis, TimePoint};
use serde_json::Value;
use thiserror::Error;

/// Fixed leading text on every response; must be present and stripped.
pub const SECURITY_PREAMBLE: &str = ")]}'\n";

/// The whole body is unusable. Not retried — the raw payload is preserved
/// for out-of-band inspection and the window becomes a recorded gap.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("response is missing the security preamble")]
    MissingPreamble,

    #[error("response body is empty")]
    EmptyBody,

    #[error("response is not valid JSON: {0}")]
    Json(String),

    #[error("unexpected payload structure: {0}")]
    Structure(&'static str),
}

/// A single payload element that did not match the expected pair shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeAnomaly {
    /// Index of the offending element within the series sequence.
    pub index: usize,
    pub reason: &'static str,
}

/// Result of decoding one window's body: the points that matched the schema
/// plus every element that did not.
#[derive(Debug, Default)]
pub struct DecodedWindow {
    pub points: Vec<TimePoint>,
    pub anomalies: Vec<ShapeAnomaly>,
}

/// Strip the security preamble. Its absence means the body is not a payload
/// we recognize at all.
pub fn strip_preamble(body: &str) -> Result<&str, ShapeError> {
    body.strip_prefix(SECURITY_PREAMBLE)
        .ok_or(ShapeError::MissingPreamble)
}

/// Decode a raw response body into points and anomalies.
pub fn decode_body(body: &str) -> Result<DecodedWindow, ShapeError> {
    let stripped = strip_preamble(body)?;
    if stripped.trim().is_empty() {
        return Err(ShapeError::EmptyBody);
    }
    let value: Value = serde_json::from_str(stripped).map_err(|e| ShapeError::Json(e.to_string()))?;
    decode_payload(&value)
}

/// Validate the decoded JSON against the expected nesting and extract the
/// series sequence.
pub fn decode_payload(value: &Value) -> Result<DecodedWindow, ShapeError> {
    let rows = value
        .as_array()
        .ok_or(ShapeError::Structure("top level is not an array"))?
        .first()
        .ok_or(ShapeError::Structure("top-level array is empty"))?
        .as_array()
        .ok_or(ShapeError::Structure("first element is not an array"))?
        .get(1)
        .ok_or(ShapeError::Structure("first element has no series slot"))?
        .as_array()
        .ok_or(ShapeError::Structure("series slot is not an array"))?;

    let mut decoded = DecodedWindow::default();

    for (index, row) in rows.iter().enumerate() {
        match decode_pair(row) {
            Ok(point) => decoded.points.push(point),
            Err(reason) => decoded.anomalies.push(ShapeAnomaly { index, reason }),
        }
    }

    Ok(decoded)
}

/// Decode one `[timestamp_ms, [[_, value]]]` entry. The value is the second
/// field of the first pair inside the value slot.
fn decode_pair(row: &Value) -> Result<TimePoint, &'static str> {
    let pair = row.as_array().ok_or("element is not an array")?;
    if pair.len() < 2 {
        return Err("element has fewer than two fields");
    }

    let millis = pair[0].as_i64().ok_or("timestamp is not an integer")?;
    let timestamp = timestamp_from_millis(millis).ok_or("timestamp is out of range")?;

    let inner = pair[1].as_array().ok_or("value slot is not an array")?;
    let value = inner
        .first()
        .ok_or("value slot is empty")?
        .as_array()
        .ok_or("value entry is not an array")?
        .get(1)
        .ok_or("value entry has no value field")?
        .as_f64()
        .ok_or("value is not a number")?;

    Ok(TimePoint { timestamp, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::format_timestamp;

    fn with_preamble(json: &str) -> String {
        format!("{SECURITY_PREAMBLE}{json}")
    }

    #[test]
    fn decodes_valid_payload() {
        let body = with_preamble(
            r#"[[0, [[1546300800000, [[0, 1.02]]], [1546304400000, [[0, 0.98]]]]]]"#,
        );
        let decoded = decode_body(&body).unwrap();
        assert_eq!(decoded.points.len(), 2);
        assert!(decoded.anomalies.is_empty());
        assert_eq!(
            format_timestamp(decoded.points[0].timestamp),
            "2019-01-01 00:00:00.000"
        );
        assert_eq!(decoded.points[0].value, 1.02);
    }

    #[test]
    fn value_is_read_from_the_first_inner_pair() {
        // Live payloads carry a null in the inner pair's unused slot.
        let body = with_preamble(
            r#"[[0, [[1546300800000, [[null, 1.02]]], [1546304400000, [[null, 0.98]]]]]]"#,
        );
        let decoded = decode_body(&body).unwrap();
        assert_eq!(decoded.points.len(), 2);
        assert!(decoded.anomalies.is_empty());
        assert_eq!(decoded.points[0].value, 1.02);
        assert_eq!(decoded.points[1].value, 0.98);
    }

    #[test]
    fn flat_value_slot_is_an_anomaly() {
        // A bare [_, value] pair misses the inner nesting level.
        let body = with_preamble(r#"[[0, [[1546300800000, [0, 1.02]]]]]"#);
        let decoded = decode_body(&body).unwrap();
        assert!(decoded.points.is_empty());
        assert_eq!(decoded.anomalies.len(), 1);
        assert_eq!(decoded.anomalies[0].reason, "value entry is not an array");
    }

    #[test]
    fn missing_preamble_is_shape_error() {
        let err = decode_body(r#"[[0, []]]"#).unwrap_err();
        assert_eq!(err, ShapeError::MissingPreamble);
    }

    #[test]
    fn empty_body_after_preamble() {
        let err = decode_body(&with_preamble("  \n")).unwrap_err();
        assert_eq!(err, ShapeError::EmptyBody);
    }

    #[test]
    fn invalid_json_is_shape_error() {
        let err = decode_body(&with_preamble("[[0, [")).unwrap_err();
        assert!(matches!(err, ShapeError::Json(_)));
    }

    #[test]
    fn wrong_nesting_is_shape_error() {
        let err = decode_body(&with_preamble(r#"{"not": "an array"}"#)).unwrap_err();
        assert!(matches!(err, ShapeError::Structure(_)));

        let err = decode_body(&with_preamble("[]")).unwrap_err();
        assert!(matches!(err, ShapeError::Structure(_)));

        let err = decode_body(&with_preamble("[[0]]")).unwrap_err();
        assert!(matches!(err, ShapeError::Structure(_)));
    }

    #[test]
    fn malformed_elements_become_anomalies_not_skips() {
        let body = with_preamble(
            r#"[[0, [
                [1546300800000, [[0, 1.0]]],
                "not a pair",
                [1546304400000, [[0, null]]],
                [1546308000000, [[0, 2.0]]]
            ]]]"#,
        );
        let decoded = decode_body(&body).unwrap();
        assert_eq!(decoded.points.len(), 2);
        assert_eq!(decoded.anomalies.len(), 2);
        assert_eq!(decoded.anomalies[0].index, 1);
        assert_eq!(decoded.anomalies[1].index, 2);
    }

    #[test]
    fn non_integer_timestamp_is_anomaly() {
        let body = with_preamble(r#"[[0, [["soon", [[0, 1.0]]]]]]"#);
        let decoded = decode_body(&body).unwrap();
        assert!(decoded.points.is_empty());
        assert_eq!(decoded.anomalies.len(), 1);
    }
}
