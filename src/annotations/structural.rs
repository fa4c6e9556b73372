//! Structural annotation parsing via tree-sitter
//!
//! Parses the annotation text as a Python expression and pattern-matches the
//! node kinds. This path balances nested brackets correctly (e.g. a tuple
//! type inside an `Annotated` wrapper), which regex cannot; anything the
//! grammar rejects falls through to the regex recovery path.

use serde_json::Value;
use tree_sitter::Node;

use super::metadata::{self, MetaValue};
use super::{display_literal, from_name, TypeCategory, TypeInfo};
use crate::models::WidgetKind;
use crate::python;

/// Parse a full annotation string. `None` means "not a valid expression".
pub(crate) fn parse(raw: &str) -> Option<TypeInfo> {
    let tree = python::parse_expression(raw)?;
    let expr = python::expression_root(&tree)?;
    from_expr(&expr, raw)
}

/// Subscript slice elements, in order. `x[a, b]` yields `[a, b]`.
fn subscript_elements<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name("subscript", &mut cursor).collect()
}

fn base_name_of(node: &Node, source: &str) -> String {
    let full = python::node_text(node, source);
    full.rsplit('.').next().unwrap_or(&full).to_string()
}

fn meta_value(node: &Node, source: &str) -> MetaValue {
    match python::literal_eval(node, source) {
        Some(value) => MetaValue::Literal(value),
        None => MetaValue::Text(python::node_text(node, source)),
    }
}

fn optional_of(inner: Option<TypeInfo>, fallback_raw: String) -> TypeInfo {
    let mut info = inner.unwrap_or_else(|| TypeInfo::unknown(fallback_raw));
    info.is_optional = true;
    info
}

/// Build a descriptor from an annotation expression node.
pub(crate) fn from_expr(expr: &Node, source: &str) -> Option<TypeInfo> {
    match expr.kind() {
        // Quoted forward reference: parse the string's content.
        "string" => {
            let text = python::string_literal_value(expr, source)?;
            Some(super::parse_type_annotation(Some(&text)))
        }
        "none" => Some(from_name("None")),
        "identifier" | "attribute" => Some(from_name(&python::node_text(expr, source))),
        "binary_operator" => {
            let operator = expr.child_by_field_name("operator")?;
            if operator.kind() != "|" {
                return None;
            }
            let left = expr.child_by_field_name("left")?;
            let right = expr.child_by_field_name("right")?;
            if python::is_none_expr(&left, source) {
                return Some(optional_of(
                    from_expr(&right, source),
                    python::node_text(&right, source),
                ));
            }
            if python::is_none_expr(&right, source) {
                return Some(optional_of(
                    from_expr(&left, source),
                    python::node_text(&left, source),
                ));
            }
            // A union of two real types is ambiguous.
            Some(TypeInfo::unknown(python::node_text(expr, source)))
        }
        "subscript" => {
            let value = expr.child_by_field_name("value")?;
            let base_name = base_name_of(&value, source);
            let elements = subscript_elements(expr);
            if elements.is_empty() {
                return Some(TypeInfo::unknown(python::node_text(expr, source)));
            }
            let raw = python::node_text(expr, source);

            match base_name.as_str() {
                "Annotated" => {
                    let base = &elements[0];
                    let mut info = from_expr(base, source)
                        .unwrap_or_else(|| TypeInfo::unknown(python::node_text(base, source)));
                    let values: Vec<MetaValue> = elements[1..]
                        .iter()
                        .map(|node| meta_value(node, source))
                        .collect();
                    metadata::apply(&mut info, &values);
                    info.raw = raw;
                    Some(info)
                }
                "Optional" => Some(optional_of(
                    from_expr(&elements[0], source),
                    python::node_text(&elements[0], source),
                )),
                "Union" => {
                    let non_none: Vec<&Node> = elements
                        .iter()
                        .filter(|node| !python::is_none_expr(node, source))
                        .collect();
                    let none_count = elements.len() - non_none.len();
                    if none_count >= 1 && non_none.len() == 1 {
                        Some(optional_of(
                            from_expr(non_none[0], source),
                            python::node_text(non_none[0], source),
                        ))
                    } else {
                        Some(TypeInfo::unknown(raw))
                    }
                }
                "List" | "list" | "Tuple" | "tuple" | "Set" | "set" => {
                    let inner = from_expr(&elements[0], source);
                    let mut info = TypeInfo::of(TypeCategory::List, raw);
                    info.inner = inner.map(Box::new);
                    info.widget = WidgetKind::PlainTextEdit;
                    Some(info)
                }
                "Dict" | "dict" => {
                    // Key/value type detail is ignored; a structured editor
                    // covers arbitrary mappings.
                    Some(TypeInfo::of(TypeCategory::Dict, raw))
                }
                "Literal" => {
                    let options = elements
                        .iter()
                        .map(|node| match python::literal_eval(node, source) {
                            Some(value) => literal_option(&value),
                            None => python::node_text(node, source),
                        })
                        .collect();
                    let mut info = TypeInfo::of(TypeCategory::Literal, raw);
                    info.options = options;
                    Some(info)
                }
                _ => Some(TypeInfo::unknown(raw)),
            }
        }
        _ => None,
    }
}

fn literal_option(value: &Value) -> String {
    display_literal(value)
}

/// Remove one Optional/Union-None/pipe-None/Annotated wrapper, returning the
/// inner type text. Used for base-type extraction.
pub(crate) fn unwrap_once(raw: &str) -> Option<String> {
    let tree = python::parse_expression(raw)?;
    let expr = python::expression_root(&tree)?;
    match expr.kind() {
        "subscript" => {
            let value = expr.child_by_field_name("value")?;
            let base_name = base_name_of(&value, raw);
            let elements = subscript_elements(&expr);
            match base_name.as_str() {
                "Annotated" | "Optional" => {
                    elements.first().map(|node| python::node_text(node, raw))
                }
                "Union" => {
                    let non_none: Vec<&Node> = elements
                        .iter()
                        .filter(|node| !python::is_none_expr(node, raw))
                        .collect();
                    if non_none.len() == 1 && non_none.len() < elements.len() {
                        Some(python::node_text(non_none[0], raw))
                    } else {
                        None
                    }
                }
                _ => None,
            }
        }
        "binary_operator" => {
            let operator = expr.child_by_field_name("operator")?;
            if operator.kind() != "|" {
                return None;
            }
            let left = expr.child_by_field_name("left")?;
            let right = expr.child_by_field_name("right")?;
            if python::is_none_expr(&left, raw) {
                Some(python::node_text(&right, raw))
            } else if python::is_none_expr(&right, raw) {
                Some(python::node_text(&left, raw))
            } else {
                None
            }
        }
        _ => None,
    }
}
