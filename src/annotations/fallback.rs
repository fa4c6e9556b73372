//! Regex recovery for annotation text the grammar rejects
//!
//! Only reached when structural parsing fails (already-broken or
//! macro-expanded text). Regex cannot balance nested brackets containing
//! commas, so this path is deliberately best-effort: whatever it cannot
//! place degrades to the unknown descriptor.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{from_name, parse_type_annotation, TypeCategory, TypeInfo};
use crate::models::WidgetKind;

static OPTIONAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:typing\.)?Optional\[(.+)\]$").unwrap());
static UNION_NONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:typing\.)?Union\[(.+),\s*None\]$|^(?:typing\.)?Union\[None,\s*(.+)\]$")
        .unwrap()
});
static PIPE_NONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*\|\s*None$|^None\s*\|\s*(.+)$").unwrap());
static LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:typing\.)?(?:list|List)\[(.+)\]$").unwrap());
static TUPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:typing\.)?(?:tuple|Tuple)\[(.+)\]$").unwrap());
static DICT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:typing\.)?(?:dict|Dict)(?:\[.+\])?$").unwrap());
static LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:typing\.)?Literal\[(.+)\]$").unwrap());
static ANNOTATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:typing\.)?Annotated\[(.+?),\s*(.+)\]$").unwrap());

fn optional_inner(raw: &str) -> Option<&str> {
    if let Some(captures) = OPTIONAL.captures(raw) {
        return captures.get(1).map(|m| m.as_str());
    }
    if let Some(captures) = UNION_NONE.captures(raw) {
        return captures.get(1).or_else(|| captures.get(2)).map(|m| m.as_str());
    }
    if let Some(captures) = PIPE_NONE.captures(raw) {
        return captures.get(1).or_else(|| captures.get(2)).map(|m| m.as_str());
    }
    None
}

/// Best-effort parse of broken annotation text. Total.
pub(crate) fn parse(raw: &str) -> TypeInfo {
    // Annotated wrapper: recover the base type; metadata is unreliable
    // without balanced parsing and is dropped here.
    if let Some(captures) = ANNOTATED.captures(raw) {
        if let Some(base) = captures.get(1) {
            return parse_type_annotation(Some(base.as_str()));
        }
    }

    if let Some(inner) = optional_inner(raw) {
        let mut info = parse_type_annotation(Some(inner));
        info.is_optional = true;
        return info;
    }

    if let Some(captures) = LITERAL.captures(raw) {
        let mut info = TypeInfo::of(TypeCategory::Literal, raw);
        info.options = split_literal_values(captures.get(1).map_or("", |m| m.as_str()));
        return info;
    }

    if let Some(captures) = LIST.captures(raw) {
        let inner = parse_type_annotation(captures.get(1).map(|m| m.as_str()));
        let mut info = TypeInfo::of(TypeCategory::List, raw);
        info.inner = Some(Box::new(inner));
        info.widget = WidgetKind::PlainTextEdit;
        return info;
    }

    if let Some(captures) = TUPLE.captures(raw) {
        // Tuples behave like lists for input; take the first element type.
        let first = captures
            .get(1)
            .map_or("", |m| m.as_str())
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        let inner = parse_type_annotation(Some(&first));
        let mut info = TypeInfo::of(TypeCategory::List, raw);
        info.inner = Some(Box::new(inner));
        info.widget = WidgetKind::PlainTextEdit;
        return info;
    }

    if DICT.is_match(raw) {
        return TypeInfo::of(TypeCategory::Dict, raw);
    }

    from_name(raw)
}

/// Remove one wrapper for base-type extraction, regex edition.
pub(crate) fn unwrap_once(raw: &str) -> Option<String> {
    if let Some(captures) = ANNOTATED.captures(raw) {
        return captures.get(1).map(|m| m.as_str().to_string());
    }
    optional_inner(raw).map(|s| s.to_string())
}

/// Split the contents of `Literal[...]` on commas, respecting quotes.
fn split_literal_values(content: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut string_char: Option<char> = None;

    for c in content.chars() {
        match string_char {
            None if c == '"' || c == '\'' => {
                string_char = Some(c);
                current.push(c);
            }
            Some(open) if c == open => {
                string_char = None;
                current.push(c);
            }
            None if c == ',' => {
                values.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        values.push(current.trim().to_string());
    }

    values
        .into_iter()
        .map(|part| {
            let stripped = part
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .or_else(|| part.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
            stripped.map(|s| s.to_string()).unwrap_or(part)
        })
        .collect()
}
