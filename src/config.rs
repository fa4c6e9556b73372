//! Analyzer configuration
//!
//! All tunable tables live in an immutable `AnalyzerConfig` passed to the
//! analyzer at construction. Nothing here is global mutable state, so several
//! analyses can run with different configurations without interference.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::models::InvocationPlan;

/// Configuration for a single analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Directory name patterns skipped during directory walks (fnmatch-style
    /// wildcards). Never applied to an explicitly specified file.
    pub ignore_dir_patterns: Vec<String>,
    /// File name patterns skipped during directory walks.
    pub ignore_file_patterns: Vec<String>,
    /// Top-level directories treated as source roots when they lack a
    /// package marker (`__init__.py`).
    pub source_root_dirs: BTreeSet<String>,
    /// Function names classified as entrypoints when no CLI evidence exists.
    pub entrypoint_names: BTreeSet<String>,
    /// Fully qualified CLI decorators mapped to a framework-specific plan.
    pub cli_framework_decorators: Vec<(String, InvocationPlan)>,
    /// Bare decorator names that look like CLI commands but cannot be
    /// attributed to a framework without import context.
    pub cli_bare_decorators: BTreeSet<String>,
    /// Executable used for the optional runtime-introspection child.
    pub python_executable: String,
    /// Wall-clock budget for the whole introspection batch.
    pub introspect_timeout: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ignore_dir_patterns: [
                "tests",
                "test",
                "__pycache__",
                "venv",
                ".venv",
                "env",
                "build",
                "dist",
                ".git",
                ".tox",
                ".nox",
                ".mypy_cache",
                ".pytest_cache",
                "node_modules",
                ".eggs",
                "*.egg-info",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ignore_file_patterns: ["setup.py", "conftest.py", "test_*.py", "*_test.py"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            source_root_dirs: ["src"].iter().map(|s| s.to_string()).collect(),
            entrypoint_names: ["main", "run", "cli", "start", "execute"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cli_framework_decorators: vec![
                ("click.command".to_string(), InvocationPlan::ClickCommand),
                ("click.group".to_string(), InvocationPlan::ClickCommand),
                ("typer.command".to_string(), InvocationPlan::TyperCommand),
                ("app.command".to_string(), InvocationPlan::TyperCommand),
                ("typer.Typer".to_string(), InvocationPlan::TyperCommand),
            ],
            cli_bare_decorators: ["command", "group", "Typer"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            python_executable: "python3".to_string(),
            introspect_timeout: Duration::from_secs(5),
        }
    }
}

impl AnalyzerConfig {
    /// Look up the invocation plan for a fully qualified CLI decorator.
    pub fn framework_plan(&self, decorator: &str) -> Option<InvocationPlan> {
        self.cli_framework_decorators
            .iter()
            .find(|(name, _)| name == decorator)
            .map(|(_, plan)| *plan)
    }

    pub fn is_bare_cli_decorator(&self, decorator: &str) -> bool {
        self.cli_bare_decorators.contains(decorator)
    }

    pub fn is_entrypoint_name(&self, name: &str) -> bool {
        self.entrypoint_names.contains(name)
    }
}
