//! Thread schema validation.
//!
//! Untrusted thread records (scroll imports, operator input) are parsed
//! field by field into a typed [`Thread`]. The rule set is an explicit
//! contract: length limits, the safe-text pattern for free text, enum
//! membership, and the hash format.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::thread::{Intention, Thread, TimeOfDay};

/// Maximum characters in a thread id.
pub const MAX_ID_CHARS: usize = 32;

/// Maximum characters in a thread title.
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum characters in a thread region.
pub const MAX_REGION_CHARS: usize = 50;

/// Letters, digits, whitespace and `- _ . , ! ? ' " ( )`.
static SAFE_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[a-zA-Z0-9\s\-_.,!?'"()]*$"#).expect("valid safe-text regex"));

static HASH_HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-fA-F0-9]{64}$").expect("valid hash regex"));

/// A thread field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Intention,
    Time,
    Region,
    Title,
    Timestamp,
    PreviousHash,
    Hash,
}

impl Field {
    fn key(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Intention => "intention",
            Field::Time => "time",
            Field::Region => "region",
            Field::Title => "title",
            Field::Timestamp => "timestamp",
            Field::PreviousHash => "previousHash",
            Field::Hash => "hash",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The rule a thread record broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("thread must be a JSON object")]
    NotAnObject,

    #[error("field '{0}' is missing or not a string")]
    NotAString(Field),

    #[error("field 'timestamp' is missing or not an integer")]
    NotAnInteger,

    #[error("field '{field}' exceeds {max} characters")]
    TooLong { field: Field, max: usize },

    #[error("field '{0}' contains characters outside the safe-text set")]
    UnsafeText(Field),

    #[error("'{0}' is not a known intention")]
    UnknownIntention(String),

    #[error("'{0}' is not a known time of day")]
    UnknownTime(String),

    #[error("field 'hash' is not a 64-character hex digest")]
    MalformedHash,
}

/// Check a free-text field against its length limit and the safe-text set.
pub fn check_text(field: Field, value: &str, max: usize) -> Result<(), SchemaViolation> {
    if value.chars().count() > max {
        return Err(SchemaViolation::TooLong { field, max });
    }
    if !SAFE_TEXT.is_match(value) {
        return Err(SchemaViolation::UnsafeText(field));
    }
    Ok(())
}

/// Check the operator-supplied text of a new thread.
pub fn check_new_thread_text(region: &str, title: &str) -> Result<(), SchemaViolation> {
    check_text(Field::Region, region, MAX_REGION_CHARS)?;
    check_text(Field::Title, title, MAX_TITLE_CHARS)
}

/// Parse one untrusted record into a [`Thread`].
///
/// Unknown extra keys are ignored. The `hash` is kept verbatim; chain
/// verification decides whether it matches the content.
pub fn validate_thread(value: &Value) -> Result<Thread, SchemaViolation> {
    let obj = value.as_object().ok_or(SchemaViolation::NotAnObject)?;

    let id = string_field(obj, Field::Id)?;
    let intention = string_field(obj, Field::Intention)?;
    let time = string_field(obj, Field::Time)?;
    let region = string_field(obj, Field::Region)?;
    let title = string_field(obj, Field::Title)?;
    let hash = string_field(obj, Field::Hash)?;
    let previous_hash = string_field(obj, Field::PreviousHash)?;
    let timestamp = obj
        .get(Field::Timestamp.key())
        .and_then(Value::as_i64)
        .ok_or(SchemaViolation::NotAnInteger)?;

    if id.chars().count() > MAX_ID_CHARS {
        return Err(SchemaViolation::TooLong {
            field: Field::Id,
            max: MAX_ID_CHARS,
        });
    }
    check_text(Field::Title, title, MAX_TITLE_CHARS)?;
    check_text(Field::Region, region, MAX_REGION_CHARS)?;

    let intention: Intention = intention
        .parse()
        .map_err(|_| SchemaViolation::UnknownIntention(intention.to_string()))?;
    let time: TimeOfDay = time
        .parse()
        .map_err(|_| SchemaViolation::UnknownTime(time.to_string()))?;

    if !HASH_HEX.is_match(hash) {
        return Err(SchemaViolation::MalformedHash);
    }

    Ok(Thread {
        id: id.to_string(),
        intention,
        time,
        region: region.to_string(),
        title: title.to_string(),
        timestamp,
        previous_hash: previous_hash.to_string(),
        hash: hash.to_string(),
        integrity_status: None,
    })
}

fn string_field<'a>(obj: &'a Map<String, Value>, field: Field) -> Result<&'a str, SchemaViolation> {
    obj.get(field.key())
        .and_then(Value::as_str)
        .ok_or(SchemaViolation::NotAString(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "id": "abcdef012345",
            "intention": "serenity",
            "time": "dawn",
            "region": "coast",
            "title": "First light (again), isn't it?",
            "timestamp": 1700000000000i64,
            "previousHash": "GENESIS_HASH",
            "hash": "a".repeat(64),
        })
    }

    #[test]
    fn test_valid_record_parses() {
        let thread = validate_thread(&record()).unwrap();
        assert_eq!(thread.intention, Intention::Serenity);
        assert_eq!(thread.time, TimeOfDay::Dawn);
        assert_eq!(thread.timestamp, 1700000000000);
    }

    #[test]
    fn test_script_title_rejected() {
        let mut value = record();
        value["title"] = json!("<script>alert(1)</script>");
        assert_eq!(
            validate_thread(&value).unwrap_err(),
            SchemaViolation::UnsafeText(Field::Title)
        );
    }

    #[test]
    fn test_length_limits() {
        let mut value = record();
        value["region"] = json!("r".repeat(51));
        assert_eq!(
            validate_thread(&value).unwrap_err(),
            SchemaViolation::TooLong {
                field: Field::Region,
                max: MAX_REGION_CHARS
            }
        );

        let mut value = record();
        value["id"] = json!("x".repeat(33));
        assert!(matches!(
            validate_thread(&value).unwrap_err(),
            SchemaViolation::TooLong { field: Field::Id, .. }
        ));

        let mut value = record();
        value["title"] = json!("t".repeat(100));
        assert!(validate_thread(&value).is_ok());
    }

    #[test]
    fn test_length_limits_are_inclusive() {
        let mut value = record();
        value["region"] = json!("r".repeat(MAX_REGION_CHARS));
        value["id"] = json!("x".repeat(MAX_ID_CHARS));
        value["title"] = json!("t".repeat(MAX_TITLE_CHARS));
        let thread = validate_thread(&value).unwrap();
        assert_eq!(thread.region.len(), 50);
        assert_eq!(thread.id.len(), 32);

        let mut value = record();
        value["title"] = json!("t".repeat(MAX_TITLE_CHARS + 1));
        assert!(matches!(
            validate_thread(&value).unwrap_err(),
            SchemaViolation::TooLong { field: Field::Title, .. }
        ));
    }

    #[test]
    fn test_type_and_enum_rules() {
        let mut value = record();
        value["timestamp"] = json!("yesterday");
        assert_eq!(validate_thread(&value).unwrap_err(), SchemaViolation::NotAnInteger);

        let mut value = record();
        value["intention"] = json!("fury");
        assert_eq!(
            validate_thread(&value).unwrap_err(),
            SchemaViolation::UnknownIntention("fury".to_string())
        );

        let mut value = record();
        value["time"] = json!(7);
        assert_eq!(
            validate_thread(&value).unwrap_err(),
            SchemaViolation::NotAString(Field::Time)
        );

        assert_eq!(
            validate_thread(&json!([1, 2])).unwrap_err(),
            SchemaViolation::NotAnObject
        );
    }

    #[test]
    fn test_hash_format() {
        let mut value = record();
        value["hash"] = json!("A".repeat(64));
        assert!(validate_thread(&value).is_ok());

        value["hash"] = json!("g".repeat(64));
        assert_eq!(validate_thread(&value).unwrap_err(), SchemaViolation::MalformedHash);

        value["hash"] = json!("a".repeat(63));
        assert_eq!(validate_thread(&value).unwrap_err(), SchemaViolation::MalformedHash);
    }
}
