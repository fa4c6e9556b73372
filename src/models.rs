//! Data model for the analysis result document
//!
//! These types define the structured output of code analysis, which drives
//! generated UIs and the headless runner. Everything here serializes to plain
//! JSON: strings, numbers, booleans, null, ordered lists, string-keyed maps.
//! Enum variants render as lowercase snake_case tags.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the analysis was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    AstOnly,
    Introspect,
}

/// How each action should be invoked at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationPlan {
    DirectCall,
    ModuleAsScript,
    ScriptPath,
    ClickCommand,
    TyperCommand,
    ConsoleScriptEntrypoint,
    CliGeneric,
}

/// The kind of callable detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Function,
    Method,
    Staticmethod,
    Classmethod,
    Class,
    Entrypoint,
    CliCommand,
}

/// Parameter kind, matching the source language's binding rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

/// Widget kinds for parameter input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    SpinBox,
    DoubleSpinBox,
    CheckBox,
    LineEdit,
    FilePicker,
    ComboBox,
    PlainTextEdit,
    JsonEditor,
    DateEdit,
    DatetimeEdit,
    TimeEdit,
}

impl WidgetKind {
    /// All widget kinds, for alias lookup tables.
    pub fn all() -> &'static [WidgetKind] {
        &[
            WidgetKind::SpinBox,
            WidgetKind::DoubleSpinBox,
            WidgetKind::CheckBox,
            WidgetKind::LineEdit,
            WidgetKind::FilePicker,
            WidgetKind::ComboBox,
            WidgetKind::PlainTextEdit,
            WidgetKind::JsonEditor,
            WidgetKind::DateEdit,
            WidgetKind::DatetimeEdit,
            WidgetKind::TimeEdit,
        ]
    }

    /// The snake_case tag used in serialized documents.
    pub fn tag(&self) -> &'static str {
        match self {
            WidgetKind::SpinBox => "spin_box",
            WidgetKind::DoubleSpinBox => "double_spin_box",
            WidgetKind::CheckBox => "check_box",
            WidgetKind::LineEdit => "line_edit",
            WidgetKind::FilePicker => "file_picker",
            WidgetKind::ComboBox => "combo_box",
            WidgetKind::PlainTextEdit => "plain_text_edit",
            WidgetKind::JsonEditor => "json_editor",
            WidgetKind::DateEdit => "date_edit",
            WidgetKind::DatetimeEdit => "datetime_edit",
            WidgetKind::TimeEdit => "time_edit",
        }
    }
}

/// Result display kinds for return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    None,
    Text,
    Json,
    Table,
    File,
    Repr,
}

/// A parameter's default value.
///
/// Non-literal defaults (calls, names) are preserved as `repr` only and are
/// never evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultValue {
    pub present: bool,
    pub repr: Option<String>,
    pub literal: Option<Value>,
    pub is_literal: bool,
}

/// Type annotation information. `raw` is the unparsed source text; `resolved`
/// is only filled by the opt-in runtime introspection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub raw: Option<String>,
    pub resolved: Option<String>,
}

/// UI configuration for a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamUi {
    pub widget: WidgetKind,
    pub options: Vec<String>,
}

impl Default for ParamUi {
    fn default() -> Self {
        Self {
            widget: WidgetKind::LineEdit,
            options: Vec::new(),
        }
    }
}

/// Validation rules for a parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamValidation {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub regex: Option<String>,
}

/// Specification for a function/method parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub default: DefaultValue,
    pub annotation: Annotation,
    pub ui: ParamUi,
    pub validation: ParamValidation,
}

impl ParamSpec {
    /// A required positional-or-keyword parameter with no annotation.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: DefaultValue::default(),
            annotation: Annotation::default(),
            ui: ParamUi::default(),
            validation: ParamValidation::default(),
        }
    }
}

/// UI configuration for return value display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnUi {
    pub result_kind: ResultKind,
    pub options: serde_json::Map<String, Value>,
}

impl Default for ReturnUi {
    fn default() -> Self {
        Self {
            result_kind: ResultKind::Text,
            options: serde_json::Map::new(),
        }
    }
}

/// Specification for a return value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSpec {
    pub annotation: Annotation,
    pub ui: ReturnUi,
}

/// Documentation for a callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSpec {
    pub text: Option<String>,
    pub format: String,
}

impl Default for DocSpec {
    fn default() -> Self {
        Self {
            text: None,
            format: "plain".to_string(),
        }
    }
}

/// Status of runtime introspection for a single action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntrospectionStatus {
    pub attempted: bool,
    pub success: bool,
    pub error: Option<String>,
    pub annotations_resolved: bool,
}

/// Specification for a single callable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub action_id: String,
    pub kind: ActionKind,
    pub qualname: String,
    pub name: String,
    pub module_import_path: String,
    pub doc: DocSpec,
    pub parameters: Vec<ParamSpec>,
    pub returns: ReturnSpec,
    pub invocation_plan: InvocationPlan,
    pub introspection: IntrospectionStatus,
    pub tags: Vec<String>,
    pub side_effect_risk: bool,
    pub source_line: Option<u32>,
}

/// Specification for an analyzed module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub module_id: String,
    pub display_name: String,
    pub file_path: Option<String>,
    pub import_path: Option<String>,
    pub module_source_hash: Option<String>,
    pub actions: Vec<ActionSpec>,
    pub has_main_block: bool,
    pub all_exports: Option<Vec<String>>,
    pub side_effect_risk: bool,
}

/// A non-fatal analysis diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub code: String,
    pub message: String,
    pub file_path: Option<String>,
    pub line: Option<u32>,
}

impl AnalysisWarning {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            file_path: None,
            line: None,
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

/// Top-level analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub spec_version: String,
    pub generator_version: String,
    pub created_at: String,
    pub project_root: String,
    pub analysis_mode: AnalysisMode,
    pub modules: Vec<ModuleSpec>,
    pub warnings: Vec<AnalysisWarning>,
}

impl AnalysisResult {
    /// Serialize to a JSON value (the external document contract).
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Content hash of the document, for change detection.
    ///
    /// Volatile fields (`created_at`) are excluded so that re-running the
    /// analysis over an identical tree produces an identical hash.
    pub fn content_hash(&self) -> String {
        let mut value = self.to_value();
        if let Value::Object(ref mut map) = value {
            map.remove("created_at");
        }
        let canonical = serde_json::to_string(&value).unwrap_or_default();
        blake3::hash(canonical.as_bytes()).to_hex().to_string()
    }
}
