//! Optional runtime-introspection enrichment
//!
//! Spawns one isolated Python child per analysis run, sends the action batch
//! as JSON over stdin, and reads per-action annotation text back over stdout.
//! The child is bounded by a wall-clock timeout; a timeout, spawn failure,
//! nonzero exit, or malformed response fails the whole batch, and every
//! action records "attempted but failed". The AST-derived result is always
//! returned intact — import-time side effects of project code never run in
//! this process.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::models::{IntrospectionStatus, ModuleSpec};

/// The program run in the child. Imports each module, resolves the attribute
/// path, and reads live parameter/return annotations via `inspect`.
const INTROSPECT_PROGRAM: &str = r#"
import importlib
import inspect
import json
import os
import sys


def annotation_text(value):
    if value is inspect.Signature.empty or value is inspect.Parameter.empty:
        return None
    if isinstance(value, str):
        return value
    name = getattr(value, "__name__", None)
    return name if name is not None else str(value)


def introspect_action(action):
    module = importlib.import_module(action["module_id"])
    target = module
    for part in action["attr_path"].split("."):
        target = getattr(target, part)
    parameters = []
    return_annotation = None
    try:
        signature = inspect.signature(target)
    except (TypeError, ValueError):
        signature = None
    if signature is not None:
        for name, parameter in signature.parameters.items():
            parameters.append(
                {"name": name, "annotation": annotation_text(parameter.annotation)}
            )
        return_annotation = annotation_text(signature.return_annotation)
    return parameters, return_annotation


def main():
    request = json.load(sys.stdin)
    root = request["project_root"]
    if request.get("project_root_is_file"):
        root = os.path.dirname(root) or "."
    sys.path.insert(0, root)

    results = {}
    for action in request.get("actions", []):
        action_id = action["action_id"]
        try:
            parameters, return_annotation = introspect_action(action)
            results[action_id] = {
                "success": True,
                "parameters": parameters,
                "return_annotation": return_annotation,
                "error": None,
            }
        except BaseException as exc:
            results[action_id] = {
                "success": False,
                "parameters": [],
                "return_annotation": None,
                "error": "%s: %s" % (type(exc).__name__, exc),
            }
    json.dump(results, sys.stdout)


main()
"#;

/// One action reference sent to the child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRef {
    pub action_id: String,
    pub module_id: String,
    pub attr_path: String,
}

#[derive(Debug, Serialize)]
struct IntrospectRequest<'a> {
    project_root: String,
    project_root_is_file: bool,
    actions: &'a [ActionRef],
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ActionIntrospection {
    pub success: bool,
    #[serde(default)]
    pub parameters: Vec<IntrospectedParam>,
    #[serde(default)]
    pub return_annotation: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IntrospectedParam {
    pub name: String,
    #[serde(default)]
    pub annotation: Option<String>,
}

pub(crate) type BatchOutcome = Result<HashMap<String, ActionIntrospection>, String>;

/// Run the enrichment pass over all actions in all modules.
pub fn enrich(
    config: &AnalyzerConfig,
    project_root: &Path,
    root_is_file: bool,
    modules: &mut [ModuleSpec],
) {
    let refs = collect_refs(modules);
    if refs.is_empty() {
        return;
    }
    debug!("Introspecting {} actions", refs.len());
    let outcome = run_batch(config, project_root, root_is_file, &refs);
    if let Err(ref e) = outcome {
        warn!("Introspection batch failed: {}", e);
    }
    apply_outcome(modules, &outcome);
}

fn collect_refs(modules: &[ModuleSpec]) -> Vec<ActionRef> {
    modules
        .iter()
        .flat_map(|module| {
            let prefix = format!("{}.", module.module_id);
            module.actions.iter().map(move |action| ActionRef {
                action_id: action.action_id.clone(),
                module_id: module.module_id.clone(),
                // The child resolves attributes relative to the imported
                // module, so the module part comes off the qualname.
                attr_path: action
                    .qualname
                    .strip_prefix(&prefix)
                    .unwrap_or(&action.qualname)
                    .to_string(),
            })
        })
        .collect()
}

/// Spawn the child, feed it the batch, and collect its response within the
/// configured deadline.
fn run_batch(
    config: &AnalyzerConfig,
    project_root: &Path,
    root_is_file: bool,
    refs: &[ActionRef],
) -> BatchOutcome {
    let request = IntrospectRequest {
        project_root: project_root.display().to_string(),
        project_root_is_file: root_is_file,
        actions: refs,
    };
    let payload =
        serde_json::to_vec(&request).map_err(|e| format!("request serialization: {}", e))?;

    let mut child = Command::new(&config.python_executable)
        .args(["-c", INTROSPECT_PROGRAM])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to spawn {}: {}", config.python_executable, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        // A child that exits before reading breaks the pipe; that surfaces
        // as a nonzero exit below, not an error here.
        let _ = stdin.write_all(&payload);
    }

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = match wait_with_deadline(&mut child, config.introspect_timeout) {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(format!(
                "introspection timed out after {:?}",
                config.introspect_timeout
            ));
        }
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(format!(
            "introspection child exited with {}: {}",
            status,
            stderr.trim()
        ));
    }

    serde_json::from_str(&stdout).map_err(|e| format!("malformed introspection response: {}", e))
}

fn spawn_reader<R: Read + Send + 'static>(
    stream: Option<R>,
) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_string(&mut buffer);
        }
        buffer
    })
}

/// Poll the child until it exits or the deadline passes. `None` on timeout.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(_) => return None,
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(25));
    }
}

/// Record the batch outcome on each action: resolved annotation text on
/// success, the captured error on failure. Never touches the static fields.
pub(crate) fn apply_outcome(modules: &mut [ModuleSpec], outcome: &BatchOutcome) {
    for module in modules.iter_mut() {
        for action in &mut module.actions {
            let status = match outcome {
                Err(batch_error) => IntrospectionStatus {
                    attempted: true,
                    success: false,
                    error: Some(batch_error.clone()),
                    annotations_resolved: false,
                },
                Ok(results) => match results.get(&action.action_id) {
                    None => IntrospectionStatus {
                        attempted: true,
                        success: false,
                        error: Some("no introspection result for action".to_string()),
                        annotations_resolved: false,
                    },
                    Some(result) if !result.success => IntrospectionStatus {
                        attempted: true,
                        success: false,
                        error: result.error.clone(),
                        annotations_resolved: false,
                    },
                    Some(result) => {
                        let mut resolved_any = false;
                        for introspected in &result.parameters {
                            let Some(annotation) = &introspected.annotation else {
                                continue;
                            };
                            if let Some(param) = action
                                .parameters
                                .iter_mut()
                                .find(|p| p.name == introspected.name)
                            {
                                param.annotation.resolved = Some(annotation.clone());
                                resolved_any = true;
                            }
                        }
                        if let Some(annotation) = &result.return_annotation {
                            action.returns.annotation.resolved = Some(annotation.clone());
                            resolved_any = true;
                        }
                        IntrospectionStatus {
                            attempted: true,
                            success: true,
                            error: None,
                            annotations_resolved: resolved_any,
                        }
                    }
                },
            };
            action.introspection = status;
        }
    }
}
