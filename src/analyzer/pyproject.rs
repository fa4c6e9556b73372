//! Console-script entrypoint metadata
//!
//! Reads `pyproject.toml` script declarations (`[project.scripts]` and
//! `[project.entry-points.console_scripts]`) and upgrades matching actions
//! from a plain direct call to a console-script entrypoint. Metadata problems
//! degrade to warnings; this never fails an analysis.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::models::{AnalysisWarning, InvocationPlan, ModuleSpec};

/// One declared console script: `name = "module:attr"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleScript {
    pub name: String,
    pub module: String,
    pub attr: String,
}

/// Parse a `module:attr` target string. The attribute part may carry
/// whitespace-delimited extras, which are dropped.
fn parse_target(name: &str, target: &str) -> Option<ConsoleScript> {
    let (module, attr) = target.split_once(':')?;
    let module = module.trim();
    let attr = attr.split_whitespace().next().unwrap_or("").trim();
    if module.is_empty() || attr.is_empty() {
        return None;
    }
    Some(ConsoleScript {
        name: name.to_string(),
        module: module.to_string(),
        attr: attr.to_string(),
    })
}

fn collect_table(
    table: Option<&toml::Value>,
    scripts: &mut Vec<ConsoleScript>,
    warnings: &mut Vec<AnalysisWarning>,
    file_path: &str,
) {
    let Some(toml::Value::Table(entries)) = table else {
        return;
    };
    for (name, value) in entries {
        let Some(target) = value.as_str() else {
            warnings.push(
                AnalysisWarning::new(
                    "PYPROJECT_INVALID",
                    format!("script '{}' has a non-string target", name),
                )
                .with_file(file_path),
            );
            continue;
        };
        match parse_target(name, target) {
            Some(script) => {
                // A later table wins on name collision (entry-points
                // override [project.scripts]).
                scripts.retain(|existing| existing.name != script.name);
                scripts.push(script);
            }
            None => warnings.push(
                AnalysisWarning::new(
                    "PYPROJECT_INVALID",
                    format!("script '{}' target '{}' is not 'module:attr'", name, target),
                )
                .with_file(file_path),
            ),
        }
    }
}

/// Load console-script declarations from `<project_root>/pyproject.toml`.
///
/// An absent file simply yields no scripts; unreadable or unparseable
/// metadata yields a warning and no scripts.
pub fn load_console_scripts(
    project_root: &Path,
    warnings: &mut Vec<AnalysisWarning>,
) -> Vec<ConsoleScript> {
    let path = project_root.join("pyproject.toml");
    if !path.exists() {
        return Vec::new();
    }
    let file_path = path.display().to_string();

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", file_path, e);
            warnings.push(
                AnalysisWarning::new("PYPROJECT_PARSE_ERROR", format!("cannot read: {}", e))
                    .with_file(&file_path),
            );
            return Vec::new();
        }
    };

    let document: toml::Value = match toml::from_str(&content) {
        Ok(document) => document,
        Err(e) => {
            warnings.push(
                AnalysisWarning::new("PYPROJECT_PARSE_ERROR", format!("invalid TOML: {}", e))
                    .with_file(&file_path),
            );
            return Vec::new();
        }
    };

    let mut scripts = Vec::new();
    let project = document.get("project");
    collect_table(
        project.and_then(|p| p.get("scripts")),
        &mut scripts,
        warnings,
        &file_path,
    );
    collect_table(
        project
            .and_then(|p| p.get("entry-points"))
            .and_then(|e| e.get("console_scripts")),
        &mut scripts,
        warnings,
        &file_path,
    );

    debug!("Loaded {} console script declarations", scripts.len());
    scripts
}

/// Upgrade actions whose fully qualified name matches a declared target.
///
/// Only plain direct-call actions are upgraded; CLI commands keep their
/// framework plan. The `console_script:<name>` tag is attached either way.
pub fn apply_console_scripts(modules: &mut [ModuleSpec], scripts: &[ConsoleScript]) {
    for script in scripts {
        let target = format!("{}.{}", script.module, script.attr);
        for module in modules.iter_mut() {
            if module.module_id != script.module {
                continue;
            }
            for action in &mut module.actions {
                if action.qualname != target {
                    continue;
                }
                if action.invocation_plan == InvocationPlan::DirectCall {
                    action.invocation_plan = InvocationPlan::ConsoleScriptEntrypoint;
                }
                let tag = format!("console_script:{}", script.name);
                if !action.tags.contains(&tag) {
                    action.tags.push(tag);
                }
            }
        }
    }
}
