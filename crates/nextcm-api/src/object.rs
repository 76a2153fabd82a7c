// Response object wrapper
//
// Central Manager responses are JSON objects; RestObject guarantees
// the mapping shape at construction so downstream property access
// never has to re-check it.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::Error;

/// A decoded JSON mapping returned by the Central Manager REST API.
///
/// Immutable after construction. The `Display` rendering is indented
/// JSON and never fails: a value that cannot be serialized renders as
/// a descriptive error string instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RestObject {
    properties: Map<String, Value>,
}

impl RestObject {
    /// Wrap a decoded response value.
    ///
    /// Fails with [`Error::InvalidObject`] unless the value is a JSON
    /// object.
    pub fn new(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(properties) => Ok(Self { properties }),
            other => Err(Error::InvalidObject(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// The wrapped property map.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Look up a single property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl TryFrom<Value> for RestObject {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Error> {
        Self::new(value)
    }
}

impl fmt::Display for RestObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.properties) {
            Ok(rendered) => f.write_str(&rendered),
            Err(e) => write!(f, "error converting to string: {e}"),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn object_values_are_accepted() {
        let obj = RestObject::new(json!({ "name": "cm-1", "state": "HEALTHY" })).unwrap();

        assert_eq!(obj.get("name"), Some(&json!("cm-1")));
        assert_eq!(obj.properties().len(), 2);
    }

    #[test]
    fn non_object_values_are_rejected() {
        for value in [json!([1, 2, 3]), json!("scalar"), json!(42), json!(null)] {
            let result = RestObject::new(value);
            assert!(matches!(result, Err(Error::InvalidObject(_))));
        }
    }

    #[test]
    fn display_renders_indented_json() {
        let obj = RestObject::new(json!({ "id": "abc123" })).unwrap();
        let rendered = obj.to_string();

        assert!(rendered.contains("\"id\": \"abc123\""));
        assert!(rendered.starts_with('{'));
    }
}
