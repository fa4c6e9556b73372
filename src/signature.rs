//! Signature extraction
//!
//! Reconstructs an ordered parameter list from a tree-sitter `parameters`
//! node. The intermediate `RawSignature` mirrors the source language's own
//! arguments object: positional-only and positional-or-keyword parameters
//! share one right-aligned defaults array, keyword-only parameters carry a
//! parallel defaults array with holes. Lowering applies the trailing-defaults
//! rule exactly as the language binds them, independent of where the `/`
//! separator falls.

use tree_sitter::Node;

use crate::models::{Annotation, DefaultValue, ParamKind, ParamSpec};
use crate::python;

/// One parameter before kind/default resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParam {
    pub name: String,
    /// Raw annotation text, or `None` when absent or unreadable.
    pub annotation: Option<String>,
}

impl RawParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
        }
    }

    pub fn annotated(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation.into()),
        }
    }
}

/// A function signature in the shape the source language stores it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSignature {
    pub posonly: Vec<RawParam>,
    pub args: Vec<RawParam>,
    /// Defaults for the trailing entries of `posonly + args`, in order.
    pub defaults: Vec<DefaultValue>,
    pub vararg: Option<RawParam>,
    pub kwonly: Vec<RawParam>,
    /// Parallel to `kwonly`; `None` marks a keyword-only parameter without a
    /// default.
    pub kw_defaults: Vec<Option<DefaultValue>>,
    pub kwarg: Option<RawParam>,
}

impl RawSignature {
    /// Build from a tree-sitter `parameters` node.
    ///
    /// Malformed children degrade to unannotated parameters; this never
    /// fails.
    pub fn from_node(parameters: &Node, source: &str) -> Self {
        let mut sig = RawSignature::default();
        let mut keyword_only = false;

        let mut cursor = parameters.walk();
        for child in parameters.children(&mut cursor) {
            match child.kind() {
                "positional_separator" => {
                    // Everything seen so far was positional-only.
                    sig.posonly.append(&mut sig.args);
                }
                "keyword_separator" => keyword_only = true,
                "identifier" => {
                    let param = RawParam::new(python::node_text(&child, source));
                    sig.push_param(param, keyword_only, None);
                }
                "typed_parameter" => {
                    let annotation = child
                        .child_by_field_name("type")
                        .map(|t| python::node_text(&t, source));
                    match child.named_child(0) {
                        Some(inner) if inner.kind() == "list_splat_pattern" => {
                            sig.vararg = Some(RawParam {
                                name: splat_name(&inner, source),
                                annotation,
                            });
                            keyword_only = true;
                        }
                        Some(inner) if inner.kind() == "dictionary_splat_pattern" => {
                            sig.kwarg = Some(RawParam {
                                name: splat_name(&inner, source),
                                annotation,
                            });
                        }
                        Some(inner) => {
                            let param = RawParam {
                                name: python::node_text(&inner, source),
                                annotation,
                            };
                            sig.push_param(param, keyword_only, None);
                        }
                        None => {}
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| python::node_text(&n, source))
                        .unwrap_or_default();
                    let annotation = child
                        .child_by_field_name("type")
                        .map(|t| python::node_text(&t, source));
                    let default = child
                        .child_by_field_name("value")
                        .map(|v| extract_default(&v, source));
                    sig.push_param(RawParam { name, annotation }, keyword_only, default);
                }
                "list_splat_pattern" => {
                    sig.vararg = Some(RawParam::new(splat_name(&child, source)));
                    keyword_only = true;
                }
                "dictionary_splat_pattern" => {
                    sig.kwarg = Some(RawParam::new(splat_name(&child, source)));
                }
                _ => {}
            }
        }

        sig
    }

    fn push_param(&mut self, param: RawParam, keyword_only: bool, default: Option<DefaultValue>) {
        if keyword_only {
            self.kwonly.push(param);
            self.kw_defaults.push(default);
        } else {
            self.args.push(param);
            if let Some(default) = default {
                self.defaults.push(default);
            }
        }
    }

    /// Drop the leading positional parameter (a classmethod's implicit
    /// class reference). Keeps the trailing-defaults alignment intact.
    pub fn strip_leading_param(&mut self) {
        if !self.posonly.is_empty() {
            self.posonly.remove(0);
        } else if !self.args.is_empty() {
            self.args.remove(0);
        } else {
            return;
        }
        let positional = self.posonly.len() + self.args.len();
        if self.defaults.len() > positional {
            self.defaults.remove(0);
        }
    }

    /// Lower to an ordered `ParamSpec` list.
    ///
    /// Defaults apply to the last `defaults.len()` entries of the combined
    /// positional sequence (`first_default_index = positional_count -
    /// default_count`), regardless of how that sequence splits across
    /// positional-only and positional-or-keyword parameters.
    pub fn build_params(&self) -> Vec<ParamSpec> {
        let mut params = Vec::new();

        let num_positional = self.posonly.len() + self.args.len();
        let first_default_index = num_positional.saturating_sub(self.defaults.len());

        for (combined_idx, (raw, kind)) in self
            .posonly
            .iter()
            .map(|p| (p, ParamKind::PositionalOnly))
            .chain(self.args.iter().map(|p| (p, ParamKind::PositionalOrKeyword)))
            .enumerate()
        {
            let mut param = make_param(raw, kind);
            if combined_idx >= first_default_index {
                let default_idx = combined_idx - first_default_index;
                if let Some(default) = self.defaults.get(default_idx) {
                    param.required = false;
                    param.default = default.clone();
                }
            }
            params.push(param);
        }

        if let Some(raw) = &self.vararg {
            let mut param = make_param(raw, ParamKind::VarPositional);
            param.required = false;
            params.push(param);
        }

        for (i, raw) in self.kwonly.iter().enumerate() {
            let mut param = make_param(raw, ParamKind::KeywordOnly);
            if let Some(Some(default)) = self.kw_defaults.get(i) {
                param.required = false;
                param.default = default.clone();
            }
            params.push(param);
        }

        if let Some(raw) = &self.kwarg {
            let mut param = make_param(raw, ParamKind::VarKeyword);
            param.required = false;
            params.push(param);
        }

        params
    }
}

fn make_param(raw: &RawParam, kind: ParamKind) -> ParamSpec {
    let mut param = ParamSpec::new(raw.name.clone(), kind);
    param.annotation = Annotation {
        raw: raw.annotation.clone(),
        resolved: None,
    };
    param
}

/// Name inside a `*args` / `**kwargs` splat pattern.
fn splat_name(node: &Node, source: &str) -> String {
    if let Some(inner) = node.named_child(0) {
        return python::node_text(&inner, source);
    }
    python::node_text(node, source)
        .trim_start_matches('*')
        .to_string()
}

/// Extract a default value from its expression node. Non-literal defaults
/// keep their source text only and are never evaluated.
pub fn extract_default(node: &Node, source: &str) -> DefaultValue {
    let repr = python::node_text(node, source);
    match python::literal_eval(node, source) {
        Some(value) => DefaultValue {
            present: true,
            repr: Some(repr),
            literal: Some(value),
            is_literal: true,
        },
        None => DefaultValue {
            present: true,
            repr: Some(repr),
            literal: None,
            is_literal: false,
        },
    }
}

/// Stable action ID: qualified name plus a hash of the structural signature.
///
/// The hash covers parameter names, kinds, and raw annotation text, never
/// line numbers, so pure whitespace/comment moves keep the ID stable while
/// any signature change produces a new one.
pub fn make_action_id(qualname: &str, sig: &RawSignature) -> String {
    let mut parts: Vec<String> = Vec::new();

    for param in &sig.posonly {
        parts.push(format!(
            "/{}:{}",
            param.name,
            param.annotation.as_deref().unwrap_or("")
        ));
    }
    for param in &sig.args {
        parts.push(format!(
            "{}:{}",
            param.name,
            param.annotation.as_deref().unwrap_or("")
        ));
    }
    if let Some(param) = &sig.vararg {
        parts.push(format!(
            "*{}:{}",
            param.name,
            param.annotation.as_deref().unwrap_or("")
        ));
    }
    for param in &sig.kwonly {
        parts.push(format!(
            "kw:{}:{}",
            param.name,
            param.annotation.as_deref().unwrap_or("")
        ));
    }
    if let Some(param) = &sig.kwarg {
        parts.push(format!(
            "**{}:{}",
            param.name,
            param.annotation.as_deref().unwrap_or("")
        ));
    }

    let key = format!("{}({})", qualname, parts.join(","));
    let digest = md5::compute(key.as_bytes());
    let hash = format!("{:x}", digest);
    format!("{}:{}", qualname, &hash[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::parse_module;
    use serde_json::json;

    /// Parse a def and return its parameters node signature.
    fn signature_of(source: &str) -> RawSignature {
        let tree = parse_module(source).unwrap();
        let def = tree.root_node().named_child(0).unwrap();
        assert_eq!(def.kind(), "function_definition", "source: {}", source);
        let parameters = def.child_by_field_name("parameters").unwrap();
        RawSignature::from_node(&parameters, source)
    }

    fn params_of(source: &str) -> Vec<ParamSpec> {
        signature_of(source).build_params()
    }

    #[test]
    fn test_defaults_span_positional_only_boundary() {
        // Defaults bind to the trailing entries of the combined positional
        // sequence, including positional-only parameters.
        let params = params_of("def f(a, b=1, /, c=2, d=3): pass\n");
        assert_eq!(params.len(), 4);

        assert_eq!(params[0].name, "a");
        assert_eq!(params[0].kind, ParamKind::PositionalOnly);
        assert!(params[0].required);
        assert!(!params[0].default.present);

        assert_eq!(params[1].name, "b");
        assert_eq!(params[1].kind, ParamKind::PositionalOnly);
        assert!(!params[1].required);
        assert_eq!(params[1].default.literal, Some(json!(1)));

        assert_eq!(params[2].name, "c");
        assert_eq!(params[2].kind, ParamKind::PositionalOrKeyword);
        assert_eq!(params[2].default.literal, Some(json!(2)));

        assert_eq!(params[3].name, "d");
        assert_eq!(params[3].kind, ParamKind::PositionalOrKeyword);
        assert_eq!(params[3].default.literal, Some(json!(3)));
    }

    #[test]
    fn test_trailing_defaults_across_random_split_points() {
        // Property: with N combined positional params and D trailing
        // defaults, the first N-D are required, however the /-boundary falls.
        let total = 5usize;
        for num_defaults in 0..=total {
            for split in 0..=total {
                let mut sig = RawSignature::default();
                for i in 0..total {
                    let param = RawParam::new(format!("p{}", i));
                    if i < split {
                        sig.posonly.push(param);
                    } else {
                        sig.args.push(param);
                    }
                }
                for d in 0..num_defaults {
                    sig.defaults.push(DefaultValue {
                        present: true,
                        repr: Some(d.to_string()),
                        literal: Some(json!(d)),
                        is_literal: true,
                    });
                }

                let params = sig.build_params();
                let first_default = total - num_defaults;
                for (i, param) in params.iter().enumerate() {
                    assert_eq!(
                        param.required,
                        i < first_default,
                        "split={} defaults={} param={}",
                        split,
                        num_defaults,
                        i
                    );
                }
            }
        }
    }

    #[test]
    fn test_keyword_only_defaults_have_holes() {
        let params = params_of("def f(*, a, b=2, c): pass\n");
        assert_eq!(params.len(), 3);
        for param in &params {
            assert_eq!(param.kind, ParamKind::KeywordOnly);
        }
        assert!(params[0].required);
        assert!(!params[1].required);
        assert_eq!(params[1].default.literal, Some(json!(2)));
        assert!(params[2].required, "a hole in kw defaults stays required");
    }

    #[test]
    fn test_variadic_parameters_never_required() {
        let params = params_of("def f(a, *args, **kwargs): pass\n");
        assert_eq!(params.len(), 3);
        assert_eq!(params[1].name, "args");
        assert_eq!(params[1].kind, ParamKind::VarPositional);
        assert!(!params[1].required);
        assert!(!params[1].default.present);
        assert_eq!(params[2].name, "kwargs");
        assert_eq!(params[2].kind, ParamKind::VarKeyword);
        assert!(!params[2].required);
    }

    #[test]
    fn test_star_args_starts_keyword_only_section() {
        let params = params_of("def f(a, *args, b=1): pass\n");
        assert_eq!(params[2].name, "b");
        assert_eq!(params[2].kind, ParamKind::KeywordOnly);
        assert!(!params[2].required);
    }

    #[test]
    fn test_annotations_and_typed_defaults() {
        let params = params_of("def f(a: int, b: str = 'x', *args: int, **kw: str): pass\n");
        assert_eq!(params[0].annotation.raw.as_deref(), Some("int"));
        assert_eq!(params[1].annotation.raw.as_deref(), Some("str"));
        assert_eq!(params[1].default.literal, Some(json!("x")));
        assert_eq!(params[2].annotation.raw.as_deref(), Some("int"));
        assert_eq!(params[3].annotation.raw.as_deref(), Some("str"));
    }

    #[test]
    fn test_non_literal_default_kept_as_repr_only() {
        let params = params_of("def f(a=make_thing(), b=SOME_CONST): pass\n");
        assert!(params[0].default.present);
        assert_eq!(params[0].default.repr.as_deref(), Some("make_thing()"));
        assert!(!params[0].default.is_literal);
        assert_eq!(params[0].default.literal, None);
        assert_eq!(params[1].default.repr.as_deref(), Some("SOME_CONST"));
        assert!(!params[1].default.is_literal);
    }

    #[test]
    fn test_strip_leading_param() {
        let mut sig = signature_of("def make(cls, name, count=3): pass\n");
        sig.strip_leading_param();
        let params = sig.build_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "name");
        assert!(params[0].required);
        assert_eq!(params[1].name, "count");
        assert_eq!(params[1].default.literal, Some(json!(3)));
    }

    #[test]
    fn test_action_id_stable_across_line_moves() {
        let a = signature_of("def f(a: int, b: str = 'x'): pass\n");
        let b = signature_of("\n\n\ndef f(a: int, b: str = 'x'): pass\n");
        assert_eq!(
            make_action_id("mod.f", &a),
            make_action_id("mod.f", &b),
            "line position must not affect the action id"
        );
    }

    #[test]
    fn test_action_id_changes_with_signature() {
        let base = signature_of("def f(a: int): pass\n");
        let added = signature_of("def f(a: int, b: int): pass\n");
        let renamed = signature_of("def f(c: int): pass\n");
        let reannotated = signature_of("def f(a: str): pass\n");
        let id = make_action_id("mod.f", &base);
        assert_ne!(id, make_action_id("mod.f", &added));
        assert_ne!(id, make_action_id("mod.f", &renamed));
        assert_ne!(id, make_action_id("mod.f", &reannotated));
    }

    #[test]
    fn test_action_id_format() {
        let sig = signature_of("def f(): pass\n");
        let id = make_action_id("pkg.mod.f", &sig);
        assert!(id.starts_with("pkg.mod.f:"));
        let suffix = id.rsplit(':').next().unwrap();
        assert_eq!(suffix.len(), 8);
    }
}
