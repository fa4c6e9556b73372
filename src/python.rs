//! Shared tree-sitter plumbing for Python sources
//!
//! Parser construction, node text access, string handling, and a
//! `literal_eval` that mirrors the source language's literal evaluation rule:
//! only plain literals (and containers of them) produce values, and only
//! JSON-representable results are returned. Anything else yields `None`.

use anyhow::Result;
use serde_json::{Map, Number, Value};
use tree_sitter::{Node, Parser, Tree};

/// Build a parser configured for Python.
pub fn parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| anyhow::anyhow!("Failed to set Python parser language: {}", e))?;
    Ok(parser)
}

/// Parse a whole module. Returns the tree even when it contains syntax
/// errors; callers decide how to react via `Tree::root_node().has_error()`.
pub fn parse_module(source: &str) -> Result<Tree> {
    parser()?
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("Parser returned no tree"))
}

/// Parse a standalone expression (e.g. an annotation string).
///
/// Returns `None` when the text is not a single valid expression, which is
/// the signal to fall back to regex-based recovery.
pub fn parse_expression(raw: &str) -> Option<Tree> {
    let tree = parse_module(raw).ok()?;
    // Exactly one expression statement, nothing else.
    let is_single_expression = {
        let root = tree.root_node();
        !root.has_error()
            && root.named_child_count() == 1
            && root
                .named_child(0)
                .map(|statement| statement.kind() == "expression_statement")
                .unwrap_or(false)
    };
    if !is_single_expression {
        return None;
    }
    Some(tree)
}

/// The expression node inside a tree produced by `parse_expression`.
pub fn expression_root(tree: &Tree) -> Option<Node<'_>> {
    let root = tree.root_node();
    let statement = root.named_child(0)?;
    statement.named_child(0)
}

/// Source text of a node.
pub fn node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes())
        .unwrap_or_default()
        .to_string()
}

/// Strip string delimiters (quotes) and any literal prefix from a Python
/// string token. Handles triple quotes (`"""` or `'''`), double quotes,
/// and single quotes, with optional prefixes like `r"..."`.
pub fn strip_string_delimiters(s: &str) -> String {
    let quote_pos = s.find(['"', '\'']);
    let (prefix, body) = match quote_pos {
        Some(pos) => s.split_at(pos),
        None => return s.to_string(),
    };
    let raw = prefix.contains('r') || prefix.contains('R');

    let delimiters = [("\"\"\"", 3usize), ("'''", 3), ("\"", 1), ("'", 1)];
    for (delimiter, strip_count) in &delimiters {
        if body.starts_with(delimiter) && body.ends_with(delimiter) && body.len() >= strip_count * 2
        {
            let inner = &body[*strip_count..body.len() - strip_count];
            return if raw {
                inner.to_string()
            } else {
                unescape(inner)
            };
        }
    }

    s.to_string()
}

/// Resolve the common escape sequences. Unknown escapes pass through intact.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// True for a `string` node with interpolations (an f-string). Those are not
/// constants and must never be treated as literal values.
fn has_interpolation(node: &Node) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| child.kind() == "interpolation");
    found
}

/// The text value of a plain string literal node, or `None` for f-strings.
pub fn string_literal_value(node: &Node, source: &str) -> Option<String> {
    if node.kind() != "string" || has_interpolation(node) {
        return None;
    }
    Some(strip_string_delimiters(&node_text(node, source)))
}

/// True when the expression is the `None` constant.
pub fn is_none_expr(node: &Node, source: &str) -> bool {
    match node.kind() {
        "none" => true,
        "identifier" => node_text(node, source) == "None",
        _ => false,
    }
}

pub(crate) fn parse_int_literal(text: &str) -> Option<i64> {
    let cleaned = text.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        cleaned.parse::<i64>().ok()
    }
}

/// Evaluate a literal expression node into a JSON value.
///
/// Mirrors the source language's safe-literal rule: strings, numbers,
/// booleans, `None`, and lists/tuples/dicts of those. Sets are rejected
/// because they have no JSON representation; so is anything non-literal
/// (names, calls, comprehensions, f-strings).
pub fn literal_eval(node: &Node, source: &str) -> Option<Value> {
    match node.kind() {
        "string" => string_literal_value(node, source).map(Value::String),
        "concatenated_string" => {
            let mut cursor = node.walk();
            let mut joined = String::new();
            for child in node.named_children(&mut cursor) {
                joined.push_str(&string_literal_value(&child, source)?);
            }
            Some(Value::String(joined))
        }
        "integer" => parse_int_literal(&node_text(node, source)).map(Value::from),
        "float" => {
            let parsed: f64 = node_text(node, source).replace('_', "").parse().ok()?;
            Number::from_f64(parsed).map(Value::Number)
        }
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "none" => Some(Value::Null),
        "unary_operator" => {
            let argument = node.child_by_field_name("argument")?;
            let operator = node.child(0)?.kind();
            let inner = literal_eval(&argument, source)?;
            match (operator, inner) {
                ("-", Value::Number(n)) => {
                    if let Some(i) = n.as_i64() {
                        Some(Value::from(-i))
                    } else {
                        Number::from_f64(-n.as_f64()?).map(Value::Number)
                    }
                }
                ("+", value @ Value::Number(_)) => Some(value),
                _ => None,
            }
        }
        "list" | "tuple" => {
            let mut cursor = node.walk();
            let mut items = Vec::new();
            for child in node.named_children(&mut cursor) {
                items.push(literal_eval(&child, source)?);
            }
            Some(Value::Array(items))
        }
        "dictionary" => {
            let mut cursor = node.walk();
            let mut map = Map::new();
            for child in node.named_children(&mut cursor) {
                if child.kind() != "pair" {
                    return None;
                }
                let key_node = child.child_by_field_name("key")?;
                let value_node = child.child_by_field_name("value")?;
                let key = match literal_eval(&key_node, source)? {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                map.insert(key, literal_eval(&value_node, source)?);
            }
            Some(Value::Object(map))
        }
        "parenthesized_expression" => {
            let inner = node.named_child(0)?;
            literal_eval(&inner, source)
        }
        _ => None,
    }
}

/// Extract a docstring from a definition node's body block: the first
/// statement must be a bare string expression.
pub fn docstring(definition: &Node, source: &str) -> Option<String> {
    let body = definition.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    string_literal_value(&expr, source)
}
