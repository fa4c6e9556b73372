//! `Annotated[T, ...]` metadata overrides
//!
//! Mapping-like metadata entries override widget choice, option lists,
//! numeric bounds, and regex constraints on the descriptor parsed for `T`.
//! String entries in `key=value` form are parsed the same way; bare
//! list/tuple entries become the option list when none was given.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::{display_literal, TypeInfo};
use crate::models::WidgetKind;

/// One metadata entry: either a safely evaluated literal or raw text.
#[derive(Debug, Clone)]
pub(crate) enum MetaValue {
    Literal(Value),
    Text(String),
}

static WIDGET_ALIASES: Lazy<HashMap<String, WidgetKind>> = Lazy::new(|| {
    let mut aliases = HashMap::new();
    for widget in WidgetKind::all() {
        aliases.insert(widget.tag().to_string(), *widget);
        // Accept the unseparated spelling too ("spinbox", "combobox").
        aliases.insert(widget.tag().replace('_', ""), *widget);
    }
    aliases
});

fn normalize_widget_name(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

fn parse_widget_override(value: &Value) -> Option<WidgetKind> {
    let text = value.as_str()?;
    let text = text.strip_prefix("WidgetType.").unwrap_or(text);
    WIDGET_ALIASES.get(&normalize_widget_name(text)).copied()
}

/// Coerce into a number, rejecting booleans.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(_) => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Coerce into a list of option strings: an array stringifies items, a
/// string splits on commas.
fn coerce_options(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().map(display_literal).collect()),
        Value::String(s) => {
            let text = s.trim();
            if text.is_empty() {
                return Some(Vec::new());
            }
            Some(
                text.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect(),
            )
        }
        _ => None,
    }
}

/// Parse a `key=value` metadata string; the value is literal-evaluated when
/// possible and kept as text otherwise.
fn parse_metadata_string(text: &str) -> Option<(String, Value)> {
    let (key, raw_value) = text.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let raw_value = raw_value.trim();
    let value = crate::python::parse_expression(raw_value)
        .and_then(|tree| {
            let node = crate::python::expression_root(&tree)?;
            crate::python::literal_eval(&node, raw_value)
        })
        .unwrap_or_else(|| Value::String(raw_value.to_string()));
    Some((key.to_string(), value))
}

/// Apply metadata overrides to a descriptor.
pub(crate) fn apply(info: &mut TypeInfo, values: &[MetaValue]) {
    let mut overrides: Map<String, Value> = Map::new();

    for meta in values {
        match meta {
            MetaValue::Literal(Value::Object(map)) => {
                for (key, value) in map {
                    overrides.insert(key.clone(), value.clone());
                }
            }
            MetaValue::Literal(Value::String(text)) => {
                if let Some((key, value)) = parse_metadata_string(text) {
                    overrides.insert(key, value);
                }
            }
            MetaValue::Literal(array @ Value::Array(_)) => {
                if !overrides.contains_key("options") && !overrides.contains_key("choices") {
                    overrides.insert("options".to_string(), array.clone());
                }
            }
            MetaValue::Literal(_) => {}
            MetaValue::Text(text) => {
                if let Some((key, value)) = parse_metadata_string(text) {
                    overrides.insert(key, value);
                }
            }
        }
    }

    let widget_override = overrides
        .get("widget")
        .or_else(|| overrides.get("widget_type"))
        .and_then(parse_widget_override);
    if let Some(widget) = widget_override {
        info.widget = widget;
    }

    let options = overrides
        .get("options")
        .or_else(|| overrides.get("choices"))
        .and_then(coerce_options);
    if let Some(options) = options {
        info.options = options;
        if widget_override.is_none() && info.widget != WidgetKind::ComboBox {
            info.widget = WidgetKind::ComboBox;
        }
    }

    if let Some(min) = overrides.get("min").and_then(coerce_number) {
        info.validation.min = Some(min);
    }
    if let Some(max) = overrides.get("max").and_then(coerce_number) {
        info.validation.max = Some(max);
    }
    if let Some(regex) = overrides.get("regex") {
        if !regex.is_null() {
            info.validation.regex = Some(match regex {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
    }
}
