//! Type annotation parsing
//!
//! Turns a raw annotation string (never a live type object) into a
//! normalized `TypeInfo`: semantic category, optionality, inner type for
//! containers, literal options, widget choice, and validation bounds.
//!
//! This module is organized into focused sub-modules:
//! - structural: tree-sitter based parsing (preferred — balances nested
//!   brackets that regex cannot)
//! - fallback: regex recovery for text the grammar rejects
//! - metadata: `Annotated[T, ...]` override handling
//!
//! `parse_type_annotation` is total: any input, including garbage, yields a
//! well-formed descriptor. Unknown constructs degrade to `Unknown` with a
//! line-edit widget.

pub(crate) mod fallback;
pub(crate) mod metadata;
pub(crate) mod structural;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::models::{ParamValidation, WidgetKind};
use crate::widgets;

/// Semantic buckets a type annotation maps to, independent of the exact
/// source spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Integer,
    Float,
    Boolean,
    String,
    Path,
    Enum,
    Literal,
    List,
    Dict,
    Date,
    DateTime,
    Time,
    Decimal,
    Any,
    Unknown,
}

/// Parsed type information (internal; not persisted as-is).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub category: TypeCategory,
    pub raw: String,
    /// Inner type for containers and nothing else.
    pub inner: Option<Box<TypeInfo>>,
    /// Ordered choice values for enum/literal categories.
    pub options: Vec<String>,
    pub is_optional: bool,
    pub widget: WidgetKind,
    pub validation: ParamValidation,
}

impl TypeInfo {
    /// A descriptor with the category's default widget and validation.
    pub fn of(category: TypeCategory, raw: impl Into<String>) -> Self {
        Self {
            category,
            raw: raw.into(),
            inner: None,
            options: Vec::new(),
            is_optional: false,
            widget: widgets::default_widget(category),
            validation: widgets::default_validation(category),
        }
    }

    /// The safe degraded descriptor.
    pub fn unknown(raw: impl Into<String>) -> Self {
        Self::of(TypeCategory::Unknown, raw)
    }
}

/// Simple name lookups, both bare and dotted spellings.
static SIMPLE_TYPES: Lazy<HashMap<&'static str, TypeCategory>> = Lazy::new(|| {
    HashMap::from([
        ("int", TypeCategory::Integer),
        ("float", TypeCategory::Float),
        ("bool", TypeCategory::Boolean),
        ("str", TypeCategory::String),
        ("list", TypeCategory::List),
        ("List", TypeCategory::List),
        ("set", TypeCategory::List),
        ("Set", TypeCategory::List),
        ("tuple", TypeCategory::List),
        ("Tuple", TypeCategory::List),
        ("dict", TypeCategory::Dict),
        ("Dict", TypeCategory::Dict),
        ("Path", TypeCategory::Path),
        ("pathlib.Path", TypeCategory::Path),
        ("PurePath", TypeCategory::Path),
        ("date", TypeCategory::Date),
        ("datetime.date", TypeCategory::Date),
        ("datetime", TypeCategory::DateTime),
        ("datetime.datetime", TypeCategory::DateTime),
        ("time", TypeCategory::Time),
        ("datetime.time", TypeCategory::Time),
        ("Decimal", TypeCategory::Decimal),
        ("decimal.Decimal", TypeCategory::Decimal),
        ("Any", TypeCategory::Any),
        ("typing.Any", TypeCategory::Any),
        ("object", TypeCategory::Any),
        ("None", TypeCategory::Any),
        ("NoneType", TypeCategory::Any),
    ])
});

/// Names that look PascalCase but are known not to be enums.
const KNOWN_NON_ENUMS: &[&str] = &[
    "Path", "PurePath", "Decimal", "Any", "None", "NoneType", "List", "Dict", "Set", "Tuple",
    "Optional", "Union", "Callable", "Type", "Generic", "Protocol",
];

/// Heuristic enum detection without live values: a PascalCase name (initial
/// uppercase, contains a lowercase letter) that is not a known non-enum.
/// This is a deliberate approximation under the no-import guarantee.
pub fn looks_like_enum(raw: &str) -> bool {
    let name = raw.rsplit('.').next().unwrap_or(raw);
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }
    // Only identifier-shaped names qualify; broken text never does.
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return false;
    }
    if !name.chars().any(|c| c.is_lowercase()) {
        return false;
    }
    !KNOWN_NON_ENUMS.contains(&name)
}

/// Descriptor for a simple (non-subscripted) name or dotted attribute.
pub(crate) fn from_name(raw_name: &str) -> TypeInfo {
    let raw_name = raw_name.trim();
    if let Some(category) = SIMPLE_TYPES.get(raw_name) {
        return TypeInfo::of(*category, raw_name);
    }

    let base_name = raw_name.rsplit('.').next().unwrap_or(raw_name);
    if let Some(category) = SIMPLE_TYPES.get(base_name) {
        return TypeInfo::of(*category, raw_name);
    }

    if looks_like_enum(raw_name) {
        // Line edit until introspection or the enum pre-scan supplies
        // values; an empty combo box would be unusable.
        let mut info = TypeInfo::of(TypeCategory::Enum, raw_name);
        info.widget = WidgetKind::LineEdit;
        return info;
    }

    TypeInfo::unknown(raw_name)
}

/// Render a literal value the way the source language displays it in choice
/// lists.
pub(crate) fn display_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Parse a type annotation string into a `TypeInfo`. Never fails.
pub fn parse_type_annotation(raw: Option<&str>) -> TypeInfo {
    let Some(raw) = raw else {
        return TypeInfo::unknown("");
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return TypeInfo::unknown("");
    }

    if let Some(mut info) = structural::parse(raw) {
        info.raw = raw.to_string();
        return info;
    }

    let mut info = fallback::parse(raw);
    info.raw = raw.to_string();
    info
}

/// Strip Optional/Union-None/Annotated wrappers and return the base type
/// text, for side-table lookups keyed by type name.
pub fn base_type_name(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(inner) = structural::unwrap_once(raw) {
        return base_type_name(&inner);
    }
    if let Some(inner) = fallback::unwrap_once(raw) {
        return base_type_name(&inner);
    }
    raw.to_string()
}
