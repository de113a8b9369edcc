//! Conversion of raw CLI tokens into typed request values
//!
//! Most tokens are plain identifiers (`alice`, `data1`, `read`) and pass
//! through untouched. ABAC models need structured subjects instead, so a
//! token shaped like `{"Age":30}` becomes a one-field [`AttributeRecord`]
//! that the engine can query as `r.sub.Age`.
//!
//! Only a single key/value pair per token is understood. In
//! `{"Age":30, Name:bob}` the first key wins and everything after its
//! colon, further pairs included, ends up in the value text.

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::OnceLock;

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"\{\s*"?(\w+)"?\s*:\s*(?:"?([^"{}]+)"?)\s*\}"#)
            .expect("attribute pattern is valid")
    })
}

/// Value carried by an attribute record
///
/// Integers are 32-bit, matching what the matcher language compares
/// against; anything that does not fit stays text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i32),
    Text(String),
}

impl AttributeValue {
    /// Coerce raw matched text: integer when it parses cleanly, text otherwise
    ///
    /// Surrounding whitespace is ignored for the integer test but kept in
    /// the text form.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().parse::<i32>() {
            Ok(n) => AttributeValue::Integer(n),
            Err(_) => AttributeValue::Text(raw.to_string()),
        }
    }
}

/// A single named attribute, e.g. `Age = 30`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRecord {
    name: String,
    value: AttributeValue,
}

impl AttributeRecord {
    /// Build a record, upper-casing the first letter of `name`
    ///
    /// Attribute names are capitalised so `{"age":30}` and `{"Age":30}`
    /// both resolve to `r.sub.Age`.
    pub fn new(name: &str, value: AttributeValue) -> Self {
        AttributeRecord {
            name: capitalize(name),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }
}

impl Serialize for AttributeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.value)?;
        map.end()
    }
}

impl fmt::Display for AttributeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// One positional component of an enforcement request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestValue {
    /// Token passed through verbatim
    PlainToken(String),
    /// Structured single-field attribute
    AttributeRecord(AttributeRecord),
}

/// Engine form: plain tokens as strings, records as one-entry maps.
impl Serialize for RequestValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RequestValue::PlainToken(token) => serializer.serialize_str(token),
            RequestValue::AttributeRecord(record) => record.serialize(serializer),
        }
    }
}

impl fmt::Display for RequestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestValue::PlainToken(token) => f.write_str(token),
            RequestValue::AttributeRecord(record) => write!(f, "{}", record),
        }
    }
}

/// Ordered request values, shaped by the model's request definition
pub type EnforcementRequest = Vec<RequestValue>;

/// Encode raw CLI tokens into request values
///
/// The mapping is 1:1 and order-preserving: the output always has exactly
/// as many values as there were tokens.
///
/// # Examples
///
/// ```rust
/// use casbin_cli::params::{encode, AttributeValue, RequestValue};
///
/// let values = encode(&[r#"{"Age":30}"#, "/data1", "read"]);
/// assert_eq!(values.len(), 3);
///
/// match &values[0] {
///     RequestValue::AttributeRecord(record) => {
///         assert_eq!(record.name(), "Age");
///         assert_eq!(record.value(), &AttributeValue::Integer(30));
///     }
///     other => panic!("expected an attribute record, got {:?}", other),
/// }
/// assert_eq!(values[1], RequestValue::PlainToken("/data1".to_string()));
/// ```
pub fn encode<S: AsRef<str>>(tokens: &[S]) -> EnforcementRequest {
    tokens.iter().map(|t| decode_token(t.as_ref())).collect()
}

fn decode_token(token: &str) -> RequestValue {
    let Some(caps) = attribute_regex().captures(token) else {
        return RequestValue::PlainToken(token.to_string());
    };

    // Both groups are mandatory in the pattern, so a match always has them.
    match (caps.get(1), caps.get(2)) {
        (Some(name), Some(value)) => RequestValue::AttributeRecord(AttributeRecord::new(
            name.as_str(),
            AttributeValue::coerce(value.as_str()),
        )),
        _ => RequestValue::PlainToken(token.to_string()),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: &RequestValue) -> &AttributeRecord {
        match value {
            RequestValue::AttributeRecord(record) => record,
            other => panic!("expected attribute record, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_count_is_preserved() {
        assert_eq!(encode(&["alice", "data1", "read"]).len(), 3);
        assert_eq!(encode(&[r#"{"Age":30}"#, "/data1", "read"]).len(), 3);
        assert_eq!(encode(&["bob", r#"{"Owner":"bob"}"#]).len(), 2);
        assert!(encode::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_integer_attribute() {
        let values = encode(&[r#"{"Age":30}"#, "/data1", "read"]);
        let age = record(&values[0]);
        assert_eq!(age.name(), "Age");
        assert_eq!(age.value(), &AttributeValue::Integer(30));
    }

    #[test]
    fn test_string_attribute() {
        let values = encode(&[r#"{"Name":"alice"}"#]);
        let name = record(&values[0]);
        assert_eq!(name.name(), "Name");
        assert_eq!(name.value(), &AttributeValue::Text("alice".to_string()));
    }

    #[test]
    fn test_plain_tokens_pass_through() {
        let values = encode(&["alice", "data1", "read"]);
        assert_eq!(
            values,
            vec![
                RequestValue::PlainToken("alice".to_string()),
                RequestValue::PlainToken("data1".to_string()),
                RequestValue::PlainToken("read".to_string()),
            ]
        );
    }

    #[test]
    fn test_field_name_is_capitalized() {
        let values = encode(&["{age: 21}"]);
        let age = record(&values[0]);
        assert_eq!(age.name(), "Age");
        assert_eq!(age.value(), &AttributeValue::Integer(21));
    }

    #[test]
    fn test_only_first_pair_is_extracted() {
        let values = encode(&[r#"{"Age":30, Name:bob}"#]);
        assert_eq!(values.len(), 1);
        let age = record(&values[0]);
        assert_eq!(age.name(), "Age");
        assert_eq!(age.value(), &AttributeValue::Text("30, Name:bob".to_string()));
    }

    #[test]
    fn test_out_of_range_integer_stays_text() {
        let values = encode(&[r#"{"Id":3000000000}"#]);
        assert_eq!(
            record(&values[0]).value(),
            &AttributeValue::Text("3000000000".to_string())
        );
    }

    #[test]
    fn test_unbalanced_braces_are_plain() {
        let values = encode(&[r#"{"Age":30"#, "{}"]);
        assert_eq!(values[0], RequestValue::PlainToken(r#"{"Age":30"#.to_string()));
        assert_eq!(values[1], RequestValue::PlainToken("{}".to_string()));
    }

    #[test]
    fn test_textual_forms() {
        let values = encode(&["alice", r#"{"Age":30}"#, r#"{"name":"bob"}"#]);
        assert_eq!(values[0].to_string(), "alice");
        assert_eq!(values[1].to_string(), r#"{"Age":30}"#);
        assert_eq!(values[2].to_string(), r#"{"Name":"bob"}"#);
    }

    #[test]
    fn test_engine_form_is_a_map() {
        let values = encode(&[r#"{"Age":30}"#, "read"]);
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, serde_json::json!([{ "Age": 30 }, "read"]));
    }
}
