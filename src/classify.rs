//! Decorator extraction and action kind classification
//!
//! Decorator evidence always outranks naming convention: a CLI-decorated
//! function literally named `main` is a CLI command, never an entrypoint.
//! Only fully qualified decorator names are attributed to a framework; a
//! bare `@command` could be anything and is tagged generic.

use tree_sitter::Node;

use crate::config::AnalyzerConfig;
use crate::models::{ActionKind, InvocationPlan};
use crate::python;

/// Extract decorator names from a definition node, in source order.
///
/// Call parentheses are dropped (`@lru_cache(maxsize=128)` -> `lru_cache`)
/// and dotted names are kept whole (`@click.command` -> `click.command`).
pub fn extract_decorators(node: &Node, source: &str) -> Vec<String> {
    let decorated = if node.kind() == "decorated_definition" {
        Some(*node)
    } else {
        node.parent()
            .filter(|parent| parent.kind() == "decorated_definition")
    };

    let mut decorators = Vec::new();
    if let Some(decorated) = decorated {
        let mut cursor = decorated.walk();
        for child in decorated.children(&mut cursor) {
            if child.kind() != "decorator" {
                continue;
            }
            let Some(expr) = child.named_child(0) else {
                continue;
            };
            let name = if expr.kind() == "call" {
                expr.child_by_field_name("function")
                    .map(|f| python::node_text(&f, source))
                    .unwrap_or_else(|| python::node_text(&expr, source))
            } else {
                python::node_text(&expr, source)
            };
            if !decorators.contains(&name) {
                decorators.push(name);
            }
        }
    }
    decorators
}

/// Scan a function body for an argument-parser construction call.
///
/// Matches `ArgumentParser(...)` by bare name or attribute access anywhere
/// in the body, regardless of the function's name.
pub fn uses_argument_parser(node: &Node, source: &str) -> bool {
    if node.kind() == "call" {
        if let Some(function) = node.child_by_field_name("function") {
            let constructor = match function.kind() {
                "identifier" => python::node_text(&function, source),
                "attribute" => function
                    .child_by_field_name("attribute")
                    .map(|a| python::node_text(&a, source))
                    .unwrap_or_default(),
                _ => String::new(),
            };
            if constructor == "ArgumentParser" {
                return true;
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if uses_argument_parser(&child, source) {
            return true;
        }
    }
    false
}

/// Classify a top-level function into a kind and invocation plan.
///
/// Priority, first match wins:
/// 1. recognized CLI-framework decorator (fully qualified)
/// 2. bare CLI-looking decorator name
/// 3. argument-parser construction anywhere in the body
/// 4. configured entrypoint name
/// 5. plain function
pub fn classify_function(
    config: &AnalyzerConfig,
    name: &str,
    decorators: &[String],
    function_node: &Node,
    source: &str,
) -> (ActionKind, InvocationPlan) {
    for decorator in decorators {
        if let Some(plan) = config.framework_plan(decorator) {
            return (ActionKind::CliCommand, plan);
        }
        if config.is_bare_cli_decorator(decorator) {
            return (ActionKind::CliCommand, InvocationPlan::CliGeneric);
        }
    }

    if uses_argument_parser(function_node, source) {
        return (ActionKind::Entrypoint, InvocationPlan::CliGeneric);
    }

    if config.is_entrypoint_name(name) {
        return (ActionKind::Entrypoint, InvocationPlan::DirectCall);
    }

    (ActionKind::Function, InvocationPlan::DirectCall)
}
