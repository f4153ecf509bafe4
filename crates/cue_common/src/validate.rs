//! Schema validation for the answer-set payload.
//!
//! Every update path goes through [`answer_map`]; there is no second,
//! looser parser anywhere. Failures are reported to the uploader in-band
//! (`is_ok: false`), so the error type here never crosses the wire.

use serde_json::Value;
use thiserror::Error;

/// Message sent back for a rejected upload.
pub const REJECT_MESSAGE: &str = "Answers should be\nvalid json";

/// Message sent back for an accepted upload.
pub const ACCEPT_MESSAGE: &str = "Answers have been\nupdated";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("answer payload is not a JSON object")]
    NotAnObject,

    #[error("answer for key {key:?} is not a string")]
    NonStringValue { key: String },
}

/// Validate an `updatedAnswers` payload into ordered key/value pairs.
///
/// Accepts only a JSON object whose every value is a string. Pair order is
/// the object's own field order, which downstream matching relies on for
/// tie-breaking.
pub fn answer_map(payload: &Value) -> Result<Vec<(String, String)>, ValidationError> {
    let object = match payload {
        Value::Object(map) => map,
        _ => return Err(ValidationError::NotAnObject),
    };

    let mut entries = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            Value::String(text) => entries.push((key.clone(), text.clone())),
            _ => {
                return Err(ValidationError::NonStringValue {
                    key: key.clone(),
                })
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_string_map() {
        let entries = answer_map(&json!({"hello": "hi there", "hru": "good"})).unwrap();
        assert_eq!(
            entries,
            vec![
                ("hello".to_string(), "hi there".to_string()),
                ("hru".to_string(), "good".to_string()),
            ]
        );
    }

    #[test]
    fn accepts_empty_map() {
        assert_eq!(answer_map(&json!({})).unwrap(), vec![]);
    }

    #[test]
    fn rejects_non_object_payloads() {
        for payload in [json!(null), json!(42), json!("text"), json!(["a", "b"])] {
            assert_eq!(answer_map(&payload), Err(ValidationError::NotAnObject));
        }
    }

    #[test]
    fn rejects_non_string_values() {
        let err = answer_map(&json!({"a": 1})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonStringValue {
                key: "a".to_string()
            }
        );

        assert!(answer_map(&json!({"a": "ok", "b": {"nested": true}})).is_err());
    }
}
