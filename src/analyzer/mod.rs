//! Module and project analysis
//!
//! Orchestrates per-file analysis and the project walk. Each file moves
//! through `discovered -> read -> parsed -> (syntax_error | analyzed)`; a
//! read or syntax error records a warning and never aborts the run. The
//! final module list is sorted by module id so re-running over an identical
//! tree produces byte-identical output (aside from the timestamp, which the
//! content hash excludes).

pub mod introspect;
pub mod pyproject;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::debug;
use tree_sitter::Node;

use crate::classify;
use crate::config::AnalyzerConfig;
use crate::models::{
    ActionKind, ActionSpec, AnalysisMode, AnalysisResult, AnalysisWarning, DocSpec,
    IntrospectionStatus, InvocationPlan, ModuleSpec,
};
use crate::python;
use crate::signature::{self, RawSignature};
use crate::utils::ignore;
use crate::widgets::{self, SideTables};

/// Fatal analysis errors. Everything recoverable is an `AnalysisWarning`.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("project root not found: {0}")]
    ProjectRootNotFound(PathBuf),
}

/// The static analyzer. Configuration is fixed at construction; separate
/// instances never interfere.
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a project directory or a single file.
    ///
    /// Ignore patterns apply only while walking a directory; an explicitly
    /// given file is always analyzed. Always returns a result (possibly with
    /// an empty module list) unless the root itself does not exist.
    pub fn analyze(
        &self,
        project_root: &Path,
        mode: AnalysisMode,
    ) -> Result<AnalysisResult, AnalyzerError> {
        if !project_root.exists() {
            return Err(AnalyzerError::ProjectRootNotFound(project_root.to_path_buf()));
        }
        let root_is_file = project_root.is_file();

        let mut warnings = Vec::new();
        let files = if root_is_file {
            vec![project_root.to_path_buf()]
        } else {
            let mut files = Vec::new();
            self.walk(project_root, &mut files);
            files
        };
        debug!("Discovered {} Python files under {}", files.len(), project_root.display());

        let mut modules = Vec::new();
        for file in &files {
            if let Some(module) =
                self.analyze_file(project_root, root_is_file, file, &mut warnings)
            {
                modules.push(module);
            }
        }
        modules.sort_by(|a, b| a.module_id.cmp(&b.module_id));

        if !root_is_file {
            let scripts = pyproject::load_console_scripts(project_root, &mut warnings);
            pyproject::apply_console_scripts(&mut modules, &scripts);
        }

        if mode == AnalysisMode::Introspect {
            introspect::enrich(&self.config, project_root, root_is_file, &mut modules);
        }

        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_default();

        Ok(AnalysisResult {
            spec_version: "1.0".to_string(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at,
            project_root: project_root.display().to_string(),
            analysis_mode: mode,
            modules,
            warnings,
        })
    }

    /// Recursive directory walk with ignore filtering. Entries are visited
    /// in name order for determinism.
    fn walk(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        let mut entries: Vec<_> = entries.flatten().collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if path.is_dir() {
                if !ignore::skip_dir(&name, &self.config.ignore_dir_patterns) {
                    self.walk(&path, files);
                }
            } else if name.ends_with(".py")
                && !ignore::skip_file(&name, &self.config.ignore_file_patterns)
            {
                files.push(path);
            }
        }
    }

    fn analyze_file(
        &self,
        project_root: &Path,
        root_is_file: bool,
        file: &Path,
        warnings: &mut Vec<AnalysisWarning>,
    ) -> Option<ModuleSpec> {
        let file_display = relative_unix_path(project_root, root_is_file, file);

        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                warnings.push(
                    AnalysisWarning::new("READ_ERROR", format!("cannot read file: {}", e))
                        .with_file(&file_display),
                );
                return None;
            }
        };

        let tree = match python::parse_module(&source) {
            Ok(tree) => tree,
            Err(e) => {
                warnings.push(
                    AnalysisWarning::new("SYNTAX_ERROR", e.to_string()).with_file(&file_display),
                );
                return None;
            }
        };
        let root = tree.root_node();
        if root.has_error() {
            let mut warning = AnalysisWarning::new("SYNTAX_ERROR", "file has syntax errors")
                .with_file(&file_display);
            if let Some(line) = first_error_line(&root) {
                warning = warning.with_line(line);
            }
            warnings.push(warning);
            return None;
        }

        let module_id = derive_module_id(&self.config, project_root, root_is_file, file);
        if let Some(line) = find_input_call(&root, &source) {
            warnings.push(
                AnalysisWarning::new(
                    "INPUT_USAGE",
                    "module calls input(); GUI execution provides no stdin",
                )
                .with_file(&file_display)
                .with_line(line),
            );
        }

        self.analyze_module(&module_id, &file_display, &root, &source)
    }

    /// Per-module analysis over a parsed tree.
    fn analyze_module(
        &self,
        module_id: &str,
        file_display: &str,
        root: &Node,
        source: &str,
    ) -> Option<ModuleSpec> {
        let scan = scan_top_level(root, source);
        let tables = prescan_side_tables(root, source);

        // (enclosing class, action) pairs; the class name drives export
        // filtering for methods.
        let mut actions: Vec<(Option<String>, ActionSpec)> = Vec::new();

        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            let definition = unwrap_decorated(&statement);
            match definition.kind() {
                "function_definition" => {
                    if let Some(action) =
                        self.build_function_action(module_id, &definition, source, &tables)
                    {
                        actions.push((None, action));
                    }
                }
                "class_definition" => {
                    self.collect_method_actions(module_id, &definition, source, &tables, &mut actions);
                }
                _ => {}
            }
        }

        // Export filtering: a function must be listed itself; a method's
        // enclosing class must be listed. A method name matching an
        // unrelated entry never retains the action.
        if let Some(exports) = &scan.all_exports {
            actions.retain(|(class_name, action)| match class_name {
                Some(class_name) => exports.contains(class_name),
                None => exports.contains(&action.name),
            });
        }

        let actions: Vec<ActionSpec> = actions.into_iter().map(|(_, action)| action).collect();
        if actions.is_empty() && !scan.has_main_block {
            debug!("Dropping module {} (nothing to expose)", module_id);
            return None;
        }
        debug!("Module {} exposes {} actions", module_id, actions.len());

        let display_name = module_id
            .rsplit('.')
            .next()
            .unwrap_or(module_id)
            .to_string();
        let source_hash = blake3::hash(source.as_bytes()).to_hex().to_string();

        Some(ModuleSpec {
            module_id: module_id.to_string(),
            display_name,
            file_path: Some(file_display.to_string()),
            import_path: Some(module_id.to_string()),
            module_source_hash: Some(source_hash[..16].to_string()),
            actions,
            has_main_block: scan.has_main_block,
            all_exports: scan.all_exports,
            side_effect_risk: scan.side_effect_risk,
        })
    }

    /// Build an action for a module-level function. Underscore-prefixed
    /// names are never surfaced.
    fn build_function_action(
        &self,
        module_id: &str,
        function_node: &Node,
        source: &str,
        tables: &SideTables,
    ) -> Option<ActionSpec> {
        let name = node_name(function_node, source)?;
        if name.starts_with('_') {
            return None;
        }
        let decorators = classify::extract_decorators(function_node, source);
        let (kind, plan) =
            classify::classify_function(&self.config, &name, &decorators, function_node, source);
        let qualname = format!("{}.{}", module_id, name);
        self.assemble_action(
            &name, &qualname, module_id, function_node, source, tables, kind, plan, decorators,
            false,
        )
    }

    /// Surface static/class methods of a class. Plain instance methods are
    /// deliberately excluded in v1.
    fn collect_method_actions(
        &self,
        module_id: &str,
        class_node: &Node,
        source: &str,
        tables: &SideTables,
        actions: &mut Vec<(Option<String>, ActionSpec)>,
    ) {
        let Some(class_name) = node_name(class_node, source) else {
            return;
        };
        if class_name.starts_with('_') {
            return;
        }
        let Some(body) = class_node.child_by_field_name("body") else {
            return;
        };

        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            let definition = unwrap_decorated(&statement);
            if definition.kind() != "function_definition" {
                continue;
            }
            let Some(method_name) = node_name(&definition, source) else {
                continue;
            };
            if method_name.starts_with('_') {
                continue;
            }

            let decorators = classify::extract_decorators(&definition, source);
            let kind = if decorators.iter().any(|d| d == "staticmethod") {
                ActionKind::Staticmethod
            } else if decorators.iter().any(|d| d == "classmethod") {
                ActionKind::Classmethod
            } else {
                continue;
            };

            // Methods import through their class, so the class joins the
            // import path and the qualname carries the full dotted chain.
            let import_path = format!("{}.{}", module_id, class_name);
            let qualname = format!("{}.{}", import_path, method_name);
            let mut tags_extra = decorators;
            tags_extra.push(format!("class:{}", class_name));
            if let Some(action) = self.assemble_action(
                &method_name,
                &qualname,
                &import_path,
                &definition,
                source,
                tables,
                kind,
                InvocationPlan::DirectCall,
                tags_extra,
                kind == ActionKind::Classmethod,
            ) {
                actions.push((Some(class_name.clone()), action));
            }
        }
    }

    /// `qualname` is the fully module-qualified dotted name
    /// (`pkg.mod.Class.method`); consumers key on it directly.
    #[allow(clippy::too_many_arguments)]
    fn assemble_action(
        &self,
        name: &str,
        qualname: &str,
        import_path: &str,
        function_node: &Node,
        source: &str,
        tables: &SideTables,
        kind: ActionKind,
        plan: InvocationPlan,
        tags: Vec<String>,
        strip_class_param: bool,
    ) -> Option<ActionSpec> {
        let parameters_node = function_node.child_by_field_name("parameters")?;
        let mut sig = RawSignature::from_node(&parameters_node, source);
        if strip_class_param {
            sig.strip_leading_param();
        }

        let mut parameters = sig.build_params();
        widgets::finalize_parameters(&mut parameters, tables);

        let return_raw = function_node
            .child_by_field_name("return_type")
            .map(|node| python::node_text(&node, source));
        let returns = widgets::return_spec(return_raw.as_deref());

        let doc = DocSpec {
            text: python::docstring(function_node, source),
            format: "plain".to_string(),
        };

        Some(ActionSpec {
            action_id: signature::make_action_id(qualname, &sig),
            kind,
            qualname: qualname.to_string(),
            name: name.to_string(),
            module_import_path: import_path.to_string(),
            doc,
            parameters,
            returns,
            invocation_plan: plan,
            introspection: IntrospectionStatus::default(),
            tags,
            side_effect_risk: false,
            source_line: Some(function_node.start_position().row as u32 + 1),
        })
    }
}

/// Flags gathered in one pass over the module's top-level statements.
#[derive(Debug, Default)]
struct TopLevelScan {
    has_main_block: bool,
    all_exports: Option<Vec<String>>,
    side_effect_risk: bool,
}

/// Whether importing this module runs anything beyond safe declarations.
///
/// Safe top-level constructs: imports, def/class (decorated or not),
/// comments, bare constant expressions (docstrings, `...`), scalar-constant
/// assignments to plain names (a literal `__all__` list is the one container
/// exception), annotated assignments with no value, and the script-guard
/// block. Anything else marks the module side-effect-risky.
fn scan_top_level(root: &Node, source: &str) -> TopLevelScan {
    let mut scan = TopLevelScan::default();

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        match statement.kind() {
            "comment"
            | "import_statement"
            | "import_from_statement"
            | "future_import_statement"
            | "function_definition"
            | "class_definition"
            | "decorated_definition" => {}
            "expression_statement" => {
                let Some(expr) = statement.named_child(0) else {
                    continue;
                };
                match expr.kind() {
                    "assignment" => {
                        if !scan_assignment(&expr, source, &mut scan) {
                            scan.side_effect_risk = true;
                        }
                    }
                    _ if is_scalar_constant(&expr, source) => {}
                    _ => scan.side_effect_risk = true,
                }
            }
            "if_statement" => {
                if is_main_guard(&statement, source) {
                    scan.has_main_block = true;
                } else {
                    scan.side_effect_risk = true;
                }
            }
            _ => scan.side_effect_risk = true,
        }
    }

    scan
}

/// Returns true when the assignment is safe. Captures a literal `__all__`
/// list on the way; a computed `__all__` yields no filtering at all.
fn scan_assignment(assignment: &Node, source: &str, scan: &mut TopLevelScan) -> bool {
    let Some(left) = assignment.child_by_field_name("left") else {
        return false;
    };
    if left.kind() != "identifier" {
        return false;
    }

    let Some(right) = assignment.child_by_field_name("right") else {
        // Annotated declaration with no value (`x: int`).
        return true;
    };
    let Some(literal) = python::literal_eval(&right, source) else {
        return false;
    };

    if python::node_text(&left, source) == "__all__" {
        if let serde_json::Value::Array(items) = &literal {
            let names: Option<Vec<String>> = items
                .iter()
                .map(|item| item.as_str().map(|s| s.to_string()))
                .collect();
            if let Some(names) = names {
                scan.all_exports = Some(names);
            }
        }
        return true;
    }

    // Only scalar constants are safe for plain names; list/dict/tuple
    // literals still construct objects on import.
    !matches!(
        literal,
        serde_json::Value::Array(_) | serde_json::Value::Object(_)
    )
}

/// A bare constant expression: strings (f-strings excluded), numbers,
/// booleans, `None`, and `...`.
fn is_scalar_constant(node: &Node, source: &str) -> bool {
    match node.kind() {
        "integer" | "float" | "true" | "false" | "none" | "ellipsis" => true,
        "string" | "concatenated_string" => matches!(
            python::literal_eval(node, source),
            Some(serde_json::Value::String(_))
        ),
        _ => false,
    }
}

/// Detect `if __name__ == "__main__":` (either operand order).
fn is_main_guard(if_statement: &Node, source: &str) -> bool {
    let Some(condition) = if_statement.child_by_field_name("condition") else {
        return false;
    };
    let text = python::node_text(&condition, source)
        .replace(['(', ')'], "")
        .replace('\'', "\"");
    let normalized: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized == "__name__ == \"__main__\"" || normalized == "\"__main__\" == __name__"
}

/// Pre-scan module-level enum and dataclass declarations for the widget
/// mapper's side tables.
fn prescan_side_tables(root: &Node, source: &str) -> SideTables {
    let mut tables = SideTables::default();

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        let definition = unwrap_decorated(&statement);
        if definition.kind() != "class_definition" {
            continue;
        }
        let Some(class_name) = node_name(&definition, source) else {
            continue;
        };

        let decorators = classify::extract_decorators(&definition, source);
        if decorators
            .iter()
            .any(|d| d == "dataclass" || d == "dataclasses.dataclass")
        {
            tables.dataclass_names.insert(class_name.clone());
            continue;
        }

        if has_enum_base(&definition, source) {
            tables
                .enum_members
                .insert(class_name, enum_member_values(&definition, source));
        }
    }

    tables
}

fn has_enum_base(class_node: &Node, source: &str) -> bool {
    let Some(superclasses) = class_node.child_by_field_name("superclasses") else {
        return false;
    };
    let mut cursor = superclasses.walk();
    let found = superclasses
        .named_children(&mut cursor)
        .any(|base| python::node_text(&base, source).ends_with("Enum"));
    found
}

/// Member values of an enum class body: the literal value when evaluable,
/// the member name otherwise. Underscore-prefixed members are skipped.
fn enum_member_values(class_node: &Node, source: &str) -> Vec<String> {
    let mut values = Vec::new();
    let Some(body) = class_node.child_by_field_name("body") else {
        return values;
    };

    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(expr) = statement.named_child(0) else {
            continue;
        };
        if expr.kind() != "assignment" {
            continue;
        }
        let Some(left) = expr.child_by_field_name("left") else {
            continue;
        };
        if left.kind() != "identifier" {
            continue;
        }
        let member_name = python::node_text(&left, source);
        if member_name.starts_with('_') {
            continue;
        }
        let value = expr
            .child_by_field_name("right")
            .and_then(|right| python::literal_eval(&right, source))
            .map(|literal| crate::annotations::display_literal(&literal))
            .unwrap_or(member_name);
        values.push(value);
    }
    values
}

/// The definition inside a `decorated_definition`, or the node itself.
fn unwrap_decorated<'t>(node: &Node<'t>) -> Node<'t> {
    if node.kind() == "decorated_definition" {
        if let Some(definition) = node.child_by_field_name("definition") {
            return definition;
        }
    }
    *node
}

fn node_name(node: &Node, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|name| python::node_text(&name, source))
}

/// Line of the first syntax-error node, 1-based.
fn first_error_line(node: &Node) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row as u32 + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(&child) {
            return Some(line);
        }
    }
    None
}

/// Line of the first bare `input(...)` call, 1-based.
fn find_input_call(node: &Node, source: &str) -> Option<u32> {
    if node.kind() == "call" {
        if let Some(function) = node.child_by_field_name("function") {
            if function.kind() == "identifier" && python::node_text(&function, source) == "input" {
                return Some(node.start_position().row as u32 + 1);
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = find_input_call(&child, source) {
            return Some(line);
        }
    }
    None
}

/// Dotted module id from the file's location relative to the project root.
///
/// A configured top-level source directory (`src`) is stripped when it lacks
/// a package marker; `pkg/__init__.py` collapses to `pkg`.
fn derive_module_id(
    config: &AnalyzerConfig,
    project_root: &Path,
    root_is_file: bool,
    file: &Path,
) -> String {
    if root_is_file {
        return file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
    }

    let relative = file.strip_prefix(project_root).unwrap_or(file);
    let mut components: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    if components.len() > 1 {
        let first = components[0].clone();
        if config.source_root_dirs.contains(&first)
            && !project_root.join(&first).join("__init__.py").exists()
        {
            components.remove(0);
        }
    }

    let file_name = components.pop().unwrap_or_default();
    if file_name != "__init__.py" {
        let stem = file_name.strip_suffix(".py").unwrap_or(&file_name);
        components.push(stem.to_string());
    }

    if components.is_empty() {
        // `__init__.py` directly at the root falls back to the root name.
        return project_root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
    }
    components.join(".")
}

/// Unix-style path of the analyzed file relative to the project root.
fn relative_unix_path(project_root: &Path, root_is_file: bool, file: &Path) -> String {
    let relative = if root_is_file {
        Path::new(file.file_name().unwrap_or(file.as_os_str()))
    } else {
        file.strip_prefix(project_root).unwrap_or(file)
    };
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParamKind, WidgetKind};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, path: &str, content: &str) {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    fn analyze(dir: &TempDir) -> AnalysisResult {
        Analyzer::default()
            .analyze(dir.path(), AnalysisMode::AstOnly)
            .unwrap()
    }

    fn module<'r>(result: &'r AnalysisResult, module_id: &str) -> &'r ModuleSpec {
        result
            .modules
            .iter()
            .find(|m| m.module_id == module_id)
            .unwrap_or_else(|| panic!("module {} not in result", module_id))
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let result = Analyzer::default().analyze(Path::new("/no/such/dir"), AnalysisMode::AstOnly);
        assert!(matches!(result, Err(AnalyzerError::ProjectRootNotFound(_))));
    }

    #[test]
    fn test_side_effect_and_main_block_flags() {
        let dir = TempDir::new().unwrap();
        write(&dir, "noisy.py", "def work(): pass\n\nprint(\"hi\")\n");
        write(
            &dir,
            "quiet.py",
            "def main(): pass\n\nif __name__ == \"__main__\":\n    main()\n",
        );
        let result = analyze(&dir);

        let noisy = module(&result, "noisy");
        assert!(noisy.side_effect_risk);
        assert!(!noisy.has_main_block);

        let quiet = module(&result, "quiet");
        assert!(!quiet.side_effect_risk);
        assert!(quiet.has_main_block);
    }

    #[test]
    fn test_safe_top_level_constructs() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "safe.py",
            concat!(
                "\"\"\"Module docstring.\"\"\"\n",
                "import os\n",
                "from typing import Optional\n",
                "__all__ = [\"work\"]\n",
                "LIMIT = 100\n",
                "NAME: str = \"x\"\n",
                "EMPTY: int\n",
                "def work(): pass\n",
                "class Helper: pass\n",
                "if __name__ == '__main__':\n    work()\n",
            ),
        );
        let result = analyze(&dir);
        let safe = module(&result, "safe");
        assert!(!safe.side_effect_risk);
        assert!(safe.has_main_block);
        assert_eq!(safe.all_exports, Some(vec!["work".to_string()]));
    }

    #[test]
    fn test_computed_assignment_is_risky() {
        let dir = TempDir::new().unwrap();
        write(&dir, "mod.py", "def f(): pass\nVALUE = compute()\n");
        let result = analyze(&dir);
        assert!(module(&result, "mod").side_effect_risk);
    }

    #[test]
    fn test_container_literal_assignment_is_risky() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "colors.py",
            "COLORS = [\"red\", \"green\"]\n\ndef f(): pass\n",
        );
        write(
            &dir,
            "limits.py",
            "LIMITS = {\"a\": 1}\n\ndef g(): pass\n",
        );
        let result = analyze(&dir);
        assert!(
            module(&result, "colors").side_effect_risk,
            "a list literal constructs an object on import"
        );
        assert!(
            module(&result, "limits").side_effect_risk,
            "a dict literal constructs an object on import"
        );
    }

    #[test]
    fn test_bare_constant_expressions_are_safe() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "stub.py",
            "\"\"\"Stub module.\"\"\"\n...\n42\n\ndef f(): pass\n",
        );
        let result = analyze(&dir);
        assert!(!module(&result, "stub").side_effect_risk);
    }

    #[test]
    fn test_computed_all_yields_no_filtering() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "mod.py",
            "def f(): pass\ndef g(): pass\n__all__ = [n for n in (\"f\",)]\n",
        );
        let result = analyze(&dir);
        let m = module(&result, "mod");
        assert_eq!(m.all_exports, None, "computed __all__ is not honored");
        assert_eq!(m.actions.len(), 2);
        assert!(m.side_effect_risk, "a computed assignment is a side effect");
    }

    #[test]
    fn test_export_filtering_spans_functions_and_classes() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "mod.py",
            concat!(
                "__all__ = [\"f\", \"C\"]\n",
                "def f(): pass\n",
                "def g(): pass\n",
                "class C:\n",
                "    @staticmethod\n",
                "    def helper(): pass\n",
                "class Unrelated:\n",
                "    @staticmethod\n",
                "    def f(): pass\n",
            ),
        );
        let result = analyze(&dir);
        let m = module(&result, "mod");
        let names: Vec<&str> = m.actions.iter().map(|a| a.qualname.as_str()).collect();
        assert!(names.contains(&"mod.f"));
        assert!(!names.contains(&"mod.g"));
        assert!(names.contains(&"mod.C.helper"));
        assert!(
            !names.contains(&"mod.Unrelated.f"),
            "a method is retained by its class name, never its own"
        );
    }

    #[test]
    fn test_module_with_nothing_to_expose_is_dropped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "constants.py", "LIMIT = 10\nNAME = \"x\"\n");
        write(&dir, "real.py", "def work(): pass\n");
        let result = analyze(&dir);
        assert!(result.modules.iter().all(|m| m.module_id != "constants"));
        assert_eq!(result.modules.len(), 1);
    }

    #[test]
    fn test_module_id_derivation() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/app.py", "def run(): pass\n");
        write(&dir, "pkg/__init__.py", "def init_fn(): pass\n");
        write(&dir, "pkg/sub/tool.py", "def tool_fn(): pass\n");
        let result = analyze(&dir);
        let ids: Vec<&str> = result.modules.iter().map(|m| m.module_id.as_str()).collect();
        assert!(ids.contains(&"app"), "src/ stripped without a package marker: {:?}", ids);
        assert!(ids.contains(&"pkg"), "__init__.py collapses to the package: {:?}", ids);
        assert!(ids.contains(&"pkg.sub.tool"));
    }

    #[test]
    fn test_src_with_init_is_a_real_package() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/__init__.py", "def top(): pass\n");
        write(&dir, "src/app.py", "def run(): pass\n");
        let result = analyze(&dir);
        let ids: Vec<&str> = result.modules.iter().map(|m| m.module_id.as_str()).collect();
        assert!(ids.contains(&"src.app"), "{:?}", ids);
    }

    #[test]
    fn test_ignore_patterns_in_walk_but_not_explicit_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "app.py", "def run(): pass\n");
        write(&dir, "tests/test_app.py", "def test_run(): pass\n");
        write(&dir, "conftest.py", "def fixture(): pass\n");
        write(&dir, ".hidden/secret.py", "def hidden(): pass\n");
        let result = analyze(&dir);
        assert_eq!(result.modules.len(), 1);
        assert_eq!(result.modules[0].module_id, "app");

        // The same ignored file analyzed explicitly is never filtered.
        let explicit = Analyzer::default()
            .analyze(&dir.path().join("conftest.py"), AnalysisMode::AstOnly)
            .unwrap();
        assert_eq!(explicit.modules.len(), 1);
        assert_eq!(explicit.modules[0].module_id, "conftest");
    }

    #[test]
    fn test_syntax_error_warns_and_continues() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken.py", "def broken(:\n");
        write(&dir, "fine.py", "def fine(): pass\n");
        let result = analyze(&dir);
        assert_eq!(result.modules.len(), 1);
        assert_eq!(result.modules[0].module_id, "fine");
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == "SYNTAX_ERROR" && w.file_path.as_deref() == Some("broken.py")));
    }

    #[test]
    fn test_input_usage_warning() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "asks.py",
            "def ask():\n    name = input(\"who? \")\n    return name\n",
        );
        let result = analyze(&dir);
        let warning = result
            .warnings
            .iter()
            .find(|w| w.code == "INPUT_USAGE")
            .expect("input() should warn");
        assert_eq!(warning.line, Some(2));
    }

    #[test]
    fn test_private_names_and_instance_methods_excluded() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "mod.py",
            concat!(
                "def _private(): pass\n",
                "def public(): pass\n",
                "class Service:\n",
                "    def instance_method(self): pass\n",
                "    @staticmethod\n",
                "    def build(): pass\n",
                "    @classmethod\n",
                "    def create(cls, name: str, retries: int = 2): pass\n",
                "    @staticmethod\n",
                "    def _hidden(): pass\n",
                "class _Internal:\n",
                "    @staticmethod\n",
                "    def skipped(): pass\n",
            ),
        );
        let result = analyze(&dir);
        let m = module(&result, "mod");
        let quals: Vec<&str> = m.actions.iter().map(|a| a.qualname.as_str()).collect();
        assert_eq!(
            quals,
            vec!["mod.public", "mod.Service.build", "mod.Service.create"]
        );

        let create = m.actions.iter().find(|a| a.name == "create").unwrap();
        assert_eq!(create.kind, ActionKind::Classmethod);
        assert_eq!(
            create.module_import_path, "mod.Service",
            "methods import through their class"
        );
        assert!(create.tags.contains(&"class:Service".to_string()));
        // cls is stripped; name stays required, retries keeps its default.
        assert_eq!(create.parameters.len(), 2);
        assert_eq!(create.parameters[0].name, "name");
        assert!(create.parameters[0].required);
        assert_eq!(create.parameters[1].name, "retries");
        assert!(!create.parameters[1].required);
    }

    #[test]
    fn test_action_details_and_widgets() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "mod.py",
            concat!(
                "from enum import Enum\n",
                "class Color(Enum):\n",
                "    RED = \"red\"\n",
                "    GREEN = \"green\"\n",
                "    _IGNORED = 0\n",
                "def paint(color: Color, count: int = 1, output_path=None) -> str:\n",
                "    \"\"\"Paint things.\"\"\"\n",
                "    return \"ok\"\n",
            ),
        );
        let result = analyze(&dir);
        let m = module(&result, "mod");
        let paint = m.actions.iter().find(|a| a.name == "paint").unwrap();

        assert_eq!(paint.doc.text.as_deref(), Some("Paint things."));
        assert_eq!(paint.source_line, Some(6));
        assert_eq!(paint.returns.annotation.raw.as_deref(), Some("str"));

        let color = &paint.parameters[0];
        assert_eq!(color.ui.widget, WidgetKind::ComboBox, "enum pre-scan fills choices");
        assert_eq!(color.ui.options, vec!["red", "green"]);

        let count = &paint.parameters[1];
        assert_eq!(count.ui.widget, WidgetKind::SpinBox);
        assert_eq!(count.kind, ParamKind::PositionalOrKeyword);

        let output = &paint.parameters[2];
        assert_eq!(output.ui.widget, WidgetKind::FilePicker, "path-like name heuristic");
    }

    #[test]
    fn test_dataclass_prescan_promotes_to_json_editor() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "mod.py",
            concat!(
                "from dataclasses import dataclass\n",
                "@dataclass\n",
                "class Settings:\n",
                "    retries: int = 3\n",
                "def apply(settings: Settings): pass\n",
            ),
        );
        let result = analyze(&dir);
        let m = module(&result, "mod");
        let apply = m.actions.iter().find(|a| a.name == "apply").unwrap();
        assert_eq!(apply.parameters[0].ui.widget, WidgetKind::JsonEditor);
    }

    #[test]
    fn test_console_script_upgrade_from_pyproject() {
        let dir = TempDir::new().unwrap();
        write(&dir, "pyproject.toml", "[project.scripts]\nmytool = \"cli:main\"\n");
        write(&dir, "cli.py", "def main(): pass\n");
        let result = analyze(&dir);
        let m = module(&result, "cli");
        let main = &m.actions[0];
        assert_eq!(main.invocation_plan, InvocationPlan::ConsoleScriptEntrypoint);
        assert!(main.tags.contains(&"console_script:mytool".to_string()));
    }

    #[test]
    fn test_cli_decorator_precedence_end_to_end() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "cli.py",
            "import click\n@click.command()\ndef main(name: str): pass\n",
        );
        let result = analyze(&dir);
        let main = &module(&result, "cli").actions[0];
        assert_eq!(main.kind, ActionKind::CliCommand);
        assert_eq!(main.invocation_plan, InvocationPlan::ClickCommand);
        assert!(main.tags.contains(&"click.command".to_string()));
    }

    #[test]
    fn test_deterministic_output_and_content_hash() {
        let dir = TempDir::new().unwrap();
        write(&dir, "zeta.py", "def z(): pass\n");
        write(&dir, "alpha.py", "def a(): pass\n");
        write(&dir, "pkg/beta.py", "def b(): pass\n");

        let first = analyze(&dir);
        let second = analyze(&dir);

        let ids: Vec<&str> = first.modules.iter().map(|m| m.module_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "pkg.beta", "zeta"], "sorted by module id");
        assert_eq!(
            first.content_hash(),
            second.content_hash(),
            "re-running over an identical tree is byte-identical minus the timestamp"
        );
    }

    #[test]
    fn test_single_file_analysis() {
        let dir = TempDir::new().unwrap();
        write(&dir, "tool.py", "def run(x: int = 1): pass\n");
        let result = Analyzer::default()
            .analyze(&dir.path().join("tool.py"), AnalysisMode::AstOnly)
            .unwrap();
        assert_eq!(result.modules.len(), 1);
        let m = &result.modules[0];
        assert_eq!(m.module_id, "tool");
        assert_eq!(m.file_path.as_deref(), Some("tool.py"));
        assert_eq!(m.actions[0].qualname, "tool.run");
    }

    #[test]
    fn test_read_failure_warns() {
        let dir = TempDir::new().unwrap();
        write(&dir, "ok.py", "def f(): pass\n");
        // Invalid UTF-8 makes read_to_string fail.
        fs::write(dir.path().join("binary.py"), [0xff, 0xfe, 0x00, 0x01]).unwrap();
        let result = analyze(&dir);
        assert_eq!(result.modules.len(), 1);
        assert!(result.warnings.iter().any(|w| w.code == "READ_ERROR"));
    }

    #[test]
    fn test_demo_project_fixture() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_samples/demo_project");
        let result = Analyzer::default().analyze(&root, AnalysisMode::AstOnly).unwrap();
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);

        let ids: Vec<&str> = result.modules.iter().map(|m| m.module_id.as_str()).collect();
        assert_eq!(ids, vec!["demo", "demo.cli", "demo.images"]);

        // __init__.py collapses to the package and honors its __all__.
        let demo = module(&result, "demo");
        assert_eq!(demo.all_exports, Some(vec!["tasks".to_string()]));
        assert_eq!(demo.actions.len(), 1);

        // The pyproject script declaration upgrades the entrypoint.
        let cli = module(&result, "demo.cli");
        assert!(cli.has_main_block);
        let main = cli.actions.iter().find(|a| a.name == "main").unwrap();
        assert_eq!(main.invocation_plan, InvocationPlan::ConsoleScriptEntrypoint);
        assert!(main.tags.contains(&"console_script:demo".to_string()));
        let retries = main.parameters.iter().find(|p| p.name == "retries").unwrap();
        assert!(!retries.required);

        let images = module(&result, "demo.images");
        let quals: Vec<&str> = images.actions.iter().map(|a| a.qualname.as_str()).collect();
        assert_eq!(
            quals,
            vec![
                "demo.images.Resizer.supported_formats",
                "demo.images.Resizer.with_quality",
                "demo.images.convert"
            ]
        );
        let convert = images.actions.iter().find(|a| a.name == "convert").unwrap();
        let target = convert.parameters.iter().find(|p| p.name == "target").unwrap();
        assert_eq!(target.ui.widget, WidgetKind::ComboBox);
        assert_eq!(target.ui.options, vec!["png", "jpeg"]);
        let source = convert.parameters.iter().find(|p| p.name == "source_path").unwrap();
        assert_eq!(source.ui.widget, WidgetKind::FilePicker);
    }

    #[test]
    fn test_action_ids_embed_module_path() {
        let dir = TempDir::new().unwrap();
        write(&dir, "pkg/mod.py", "def f(a: int): pass\n");
        let result = analyze(&dir);
        let action = &module(&result, "pkg.mod").actions[0];
        assert!(action.action_id.starts_with("pkg.mod.f:"));
        assert_eq!(action.qualname, "pkg.mod.f", "qualnames are module-qualified");
        assert_eq!(action.name, "f");
        assert_eq!(action.module_import_path, "pkg.mod");
    }
}
