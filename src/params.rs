//! Argument checking against a tool's JSON Schema.
//!
//! Only the subset the built-in schemas use is understood: `type`,
//! `required`, `enum`, and `default`. Unknown properties pass through.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Check `params` against `schema` and fill in declared defaults.
///
/// `null` is accepted as an empty argument object, since some clients
/// omit `arguments` entirely for zero-argument tools.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value, ToolError> {
    let params_obj = match params {
        Value::Object(m) => m.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(ToolError::Validation(format!(
                "arguments must be an object, got {}",
                json_type_name(other)
            )))
        }
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for field in &required {
        if !params_obj.contains_key(*field) {
            return Err(ToolError::Validation(format!(
                "missing required parameter: {}",
                field
            )));
        }
    }

    let mut result = params_obj.clone();
    for (prop_name, prop_schema) in &properties {
        match params_obj.get(prop_name) {
            Some(value) => {
                if let Some(expected) = prop_schema.get("type").and_then(|t| t.as_str()) {
                    if !type_matches(expected, value) {
                        return Err(ToolError::Validation(format!(
                            "parameter '{}' must be of type '{}', got {}",
                            prop_name,
                            expected,
                            json_type_name(value)
                        )));
                    }
                }
                if let Some(allowed) = prop_schema.get("enum").and_then(|e| e.as_array()) {
                    if !allowed.contains(value) {
                        let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                        return Err(ToolError::Validation(format!(
                            "parameter '{}' must be one of [{}], got {}",
                            prop_name,
                            names.join(", "),
                            value
                        )));
                    }
                }
            }
            None => {
                if let Some(default) = prop_schema.get("default") {
                    result.insert(prop_name.clone(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(result))
}

/// Deserialize validated arguments into a typed parameter struct.
pub fn parse<T: DeserializeOwned>(params: Value) -> Result<T, ToolError> {
    serde_json::from_value(params).map_err(|e| ToolError::Validation(e.to_string()))
}

/// Trimmed, non-empty string argument.
pub fn non_empty<'a>(name: &str, value: &'a str) -> Result<&'a str, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ToolError::Validation(format!("{} must not be empty", name)))
    } else {
        Ok(trimmed)
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "session_id": { "type": "string", "default": "default" },
                "mode": { "type": "string", "enum": ["a", "b"] }
            },
            "required": ["query"]
        })
    }

    #[test]
    fn test_missing_required_is_validation_error() {
        let err = validate_params(&schema(), &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = validate_params(&schema(), &json!({ "query": 5 })).unwrap_err();
        assert!(err.to_string().contains("must be of type 'string', got number"));
    }

    #[test]
    fn test_enum_and_defaults() {
        assert!(validate_params(&schema(), &json!({ "query": "x", "mode": "c" })).is_err());
        let ok = validate_params(&schema(), &json!({ "query": "x" })).unwrap();
        assert_eq!(ok["session_id"], "default");
    }

    #[test]
    fn test_null_arguments_accepted_without_required() {
        let schema = json!({ "type": "object", "properties": {} });
        assert_eq!(validate_params(&schema, &Value::Null).unwrap(), json!({}));
        assert!(validate_params(&schema, &json!([1])).is_err());
    }

    #[test]
    fn test_parse_typed() {
        #[derive(Deserialize)]
        struct P {
            query: String,
        }
        let p: P = parse(json!({ "query": "button" })).unwrap();
        assert_eq!(p.query, "button");
        assert!(non_empty("query", "   ").is_err());
        assert_eq!(non_empty("query", " x ").unwrap(), "x");
    }
}
