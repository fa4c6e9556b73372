// actionscan - tree-sitter powered static analysis of Python callables
//
// Inspects Python sources without executing them and derives a serializable
// description of each callable action (functions, static/class methods, CLI
// commands, script entrypoints) suitable for driving a generated UI or a
// headless runner. Parsing is recovery-oriented: unknown constructs degrade
// to safe defaults instead of failing the analysis.

pub mod analyzer;
pub mod annotations;
pub mod classify;
pub mod config;
pub mod convert;
pub mod models;
pub mod protocol;
pub mod python;
pub mod signature;
pub mod utils;
pub mod widgets;

pub use analyzer::{Analyzer, AnalyzerError};
pub use config::AnalyzerConfig;
pub use models::{AnalysisMode, AnalysisResult};
