//! Value conversion from UI submissions to native values
//!
//! The inverse of the widget mapping: a raw UI-submitted value (string or
//! native primitive) is converted against a type descriptor into the value
//! the target callable expects. Total for any input: failures come back as a
//! structured `ConversionError`, never a panic.

use serde_json::{Number, Value};

use crate::annotations::{TypeCategory, TypeInfo};
use crate::python;

/// A conversion failure: what went wrong and the offending value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    pub message: String,
    pub value: String,
}

impl ConversionError {
    fn new(message: impl Into<String>, value: &Value) -> Self {
        Self {
            message: message.into(),
            value: render(value),
        }
    }
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.message, self.value)
    }
}

pub type ConversionResult = Result<Value, ConversionError>;

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Only an absent value or a zero-length string is empty. Boolean false,
/// numeric zero, and empty containers are valid values.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Convert a raw value against a type descriptor.
///
/// Empty-value policy: empty against an optional type succeeds with null;
/// empty against a required type fails. Values already in the correct native
/// form pass through without a text round trip.
pub fn convert_value(raw: &Value, info: &TypeInfo) -> ConversionResult {
    if is_empty_value(raw) {
        if info.is_optional {
            return Ok(Value::Null);
        }
        return Err(ConversionError::new("value is required", raw));
    }

    match info.category {
        TypeCategory::Integer => convert_integer(raw),
        TypeCategory::Float => convert_float(raw),
        TypeCategory::Boolean => convert_boolean(raw),
        TypeCategory::String
        | TypeCategory::Path
        | TypeCategory::Enum
        | TypeCategory::Literal => Ok(Value::String(render(raw))),
        TypeCategory::List => convert_list(raw, info),
        TypeCategory::Dict | TypeCategory::Any | TypeCategory::Unknown => Ok(convert_json_ish(raw)),
        // ISO-8601 text passes through; rendering/validation is the date
        // widget's job, not this layer's.
        TypeCategory::Date | TypeCategory::DateTime | TypeCategory::Time => {
            Ok(Value::String(render(raw)))
        }
        TypeCategory::Decimal => convert_decimal(raw),
    }
}

fn convert_integer(raw: &Value) -> ConversionResult {
    match raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(raw.clone()),
        Value::Number(_) => Err(ConversionError::new("expected an integer", raw)),
        Value::String(s) => {
            let text = s.trim();
            match python::parse_int_literal(text) {
                Some(i) => Ok(Value::from(i)),
                None => Err(ConversionError::new("invalid integer", raw)),
            }
        }
        _ => Err(ConversionError::new("expected an integer", raw)),
    }
}

fn convert_float(raw: &Value) -> ConversionResult {
    match raw {
        // A native integer offered for a float field widens.
        Value::Number(n) => match n.as_f64().and_then(Number::from_f64) {
            Some(widened) => Ok(Value::Number(widened)),
            None => Err(ConversionError::new("invalid number", raw)),
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| ConversionError::new("invalid number", raw)),
            _ => Err(ConversionError::new("invalid number", raw)),
        },
        _ => Err(ConversionError::new("expected a number", raw)),
    }
}

fn convert_boolean(raw: &Value) -> ConversionResult {
    match raw {
        Value::Bool(_) => Ok(raw.clone()),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(ConversionError::new("invalid boolean", raw)),
        },
        _ => Err(ConversionError::new("expected a boolean", raw)),
    }
}

/// Lists arrive as newline-delimited text; blank lines are skipped and each
/// remaining line converts against the inner type when one is known.
fn convert_list(raw: &Value, info: &TypeInfo) -> ConversionResult {
    if let Value::Array(_) = raw {
        return Ok(raw.clone());
    }
    let Value::String(text) = raw else {
        return Err(ConversionError::new("expected list text", raw));
    };

    let mut items = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item = Value::String(line.to_string());
        match &info.inner {
            Some(inner) => items.push(convert_value(&item, inner)?),
            None => items.push(item),
        }
    }
    Ok(Value::Array(items))
}

/// Structured categories try JSON first and keep the raw string on failure.
fn convert_json_ish(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| raw.clone()),
        other => other.clone(),
    }
}

/// Decimals validate numeric well-formedness but keep the original string
/// representation, avoiding binary-float precision loss.
fn convert_decimal(raw: &Value) -> ConversionResult {
    match raw {
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::String(s) => {
            let text = s.trim();
            if text.parse::<f64>().map(|f| f.is_finite()).unwrap_or(false) {
                Ok(Value::String(text.to_string()))
            } else {
                Err(ConversionError::new("invalid decimal", raw))
            }
        }
        _ => Err(ConversionError::new("expected a decimal", raw)),
    }
}
