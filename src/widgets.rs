//! UI/widget mapping
//!
//! Maps each type category to a default widget and validation rule, then
//! applies heuristic overrides: path-like parameter names, enum/dataclass
//! side tables populated by the module pre-scan, and the fixed widgets for
//! variadic parameters. Return annotations map to a result display kind the
//! same way.

use std::collections::{BTreeSet, HashMap};

use crate::annotations::{self, TypeCategory};
use crate::models::{
    ParamKind, ParamSpec, ParamValidation, ResultKind, ReturnSpec, ReturnUi, WidgetKind,
};

/// Wide symmetric bounds attached to numeric input widgets by default.
pub const NUMERIC_BOUND: f64 = 999_999.0;

/// Substrings of a parameter name that suggest a filesystem path.
const PATH_NAME_HINTS: &[&str] = &["path", "file", "dir", "folder", "directory"];

/// The fixed category-to-widget table.
pub fn default_widget(category: TypeCategory) -> WidgetKind {
    match category {
        TypeCategory::Integer => WidgetKind::SpinBox,
        TypeCategory::Float => WidgetKind::DoubleSpinBox,
        TypeCategory::Boolean => WidgetKind::CheckBox,
        TypeCategory::String => WidgetKind::LineEdit,
        TypeCategory::Path => WidgetKind::FilePicker,
        TypeCategory::Enum | TypeCategory::Literal => WidgetKind::ComboBox,
        TypeCategory::List => WidgetKind::PlainTextEdit,
        TypeCategory::Dict | TypeCategory::Any => WidgetKind::JsonEditor,
        TypeCategory::Date => WidgetKind::DateEdit,
        TypeCategory::DateTime => WidgetKind::DatetimeEdit,
        TypeCategory::Time => WidgetKind::TimeEdit,
        TypeCategory::Decimal => WidgetKind::LineEdit,
        TypeCategory::Unknown => WidgetKind::LineEdit,
    }
}

/// Default validation per category: numeric categories get bounded inputs,
/// everything else starts empty.
pub fn default_validation(category: TypeCategory) -> ParamValidation {
    match category {
        TypeCategory::Integer | TypeCategory::Float => ParamValidation {
            min: Some(-NUMERIC_BOUND),
            max: Some(NUMERIC_BOUND),
            regex: None,
        },
        _ => ParamValidation::default(),
    }
}

/// Facts gathered by the module pre-scan: enum classes with their member
/// values, and dataclass-like record type names. Keyed by bare class name
/// (module qualification stripped).
#[derive(Debug, Clone, Default)]
pub struct SideTables {
    pub enum_members: HashMap<String, Vec<String>>,
    pub dataclass_names: BTreeSet<String>,
}

impl SideTables {
    pub fn is_empty(&self) -> bool {
        self.enum_members.is_empty() && self.dataclass_names.is_empty()
    }
}

/// True when a parameter name suggests a filesystem path.
fn name_suggests_path(name: &str) -> bool {
    let lower = name.to_lowercase();
    PATH_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Fill in each parameter's widget, options, and validation from its
/// annotation, then apply the heuristic overrides.
///
/// An optional annotation also releases the requiredness of a parameter that
/// has no default, since `None` is an acceptable submission.
pub fn finalize_parameters(params: &mut [ParamSpec], tables: &SideTables) {
    for param in params.iter_mut() {
        let info = annotations::parse_type_annotation(param.annotation.raw.as_deref());

        param.ui.widget = info.widget;
        param.ui.options = info.options.clone();
        param.validation = info.validation.clone();

        if info.is_optional && param.required {
            param.required = false;
        }

        // Side-table promotion, keyed by the unwrapped base type name.
        if let Some(raw) = param.annotation.raw.as_deref() {
            let base = annotations::base_type_name(raw);
            let base = base.rsplit('.').next().unwrap_or(&base);
            if let Some(members) = tables.enum_members.get(base) {
                param.ui.widget = WidgetKind::ComboBox;
                param.ui.options = members.clone();
            } else if tables.dataclass_names.contains(base) {
                param.ui.widget = WidgetKind::JsonEditor;
            }
        }

        // A parameter with an unresolved type but a path-looking name gets
        // the file picker.
        if info.category == TypeCategory::Unknown && name_suggests_path(&param.name) {
            param.ui.widget = WidgetKind::FilePicker;
        }

        // Variadic parameters keep their fixed widgets and carry no
        // validation bounds whatever the inner annotation says.
        match param.kind {
            ParamKind::VarPositional => {
                param.ui.widget = WidgetKind::PlainTextEdit;
                param.ui.options.clear();
                param.validation = ParamValidation::default();
            }
            ParamKind::VarKeyword => {
                param.ui.widget = WidgetKind::JsonEditor;
                param.ui.options.clear();
                param.validation = ParamValidation::default();
            }
            _ => {}
        }
    }
}

/// Result display kind for a return annotation.
pub fn return_spec(raw: Option<&str>) -> ReturnSpec {
    let result_kind = match raw.map(str::trim) {
        None | Some("") => ResultKind::Repr,
        Some("None") => ResultKind::None,
        Some(text) => {
            let info = annotations::parse_type_annotation(Some(text));
            match info.category {
                TypeCategory::String => ResultKind::Text,
                TypeCategory::Path => ResultKind::File,
                TypeCategory::List | TypeCategory::Dict | TypeCategory::Any => ResultKind::Json,
                TypeCategory::Integer
                | TypeCategory::Float
                | TypeCategory::Boolean
                | TypeCategory::Decimal => ResultKind::Text,
                _ => ResultKind::Repr,
            }
        }
    };

    ReturnSpec {
        annotation: crate::models::Annotation {
            raw: raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            resolved: None,
        },
        ui: ReturnUi {
            result_kind,
            options: serde_json::Map::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Annotation;

    fn param(name: &str, kind: ParamKind, annotation: Option<&str>) -> ParamSpec {
        let mut p = ParamSpec::new(name, kind);
        p.annotation = Annotation {
            raw: annotation.map(|s| s.to_string()),
            resolved: None,
        };
        p
    }

    #[test]
    fn test_widget_table() {
        assert_eq!(default_widget(TypeCategory::Integer), WidgetKind::SpinBox);
        assert_eq!(default_widget(TypeCategory::Float), WidgetKind::DoubleSpinBox);
        assert_eq!(default_widget(TypeCategory::Boolean), WidgetKind::CheckBox);
        assert_eq!(default_widget(TypeCategory::Path), WidgetKind::FilePicker);
        assert_eq!(default_widget(TypeCategory::Literal), WidgetKind::ComboBox);
        assert_eq!(default_widget(TypeCategory::List), WidgetKind::PlainTextEdit);
        assert_eq!(default_widget(TypeCategory::Dict), WidgetKind::JsonEditor);
        assert_eq!(default_widget(TypeCategory::Unknown), WidgetKind::LineEdit);
    }

    #[test]
    fn test_annotation_drives_widget_and_bounds() {
        let mut params = vec![param("count", ParamKind::PositionalOrKeyword, Some("int"))];
        finalize_parameters(&mut params, &SideTables::default());
        assert_eq!(params[0].ui.widget, WidgetKind::SpinBox);
        assert_eq!(params[0].validation.min, Some(-NUMERIC_BOUND));
        assert_eq!(params[0].validation.max, Some(NUMERIC_BOUND));
    }

    #[test]
    fn test_path_name_heuristic_on_unknown_types() {
        let mut params = vec![
            param("output_path", ParamKind::PositionalOrKeyword, None),
            param("config_file", ParamKind::PositionalOrKeyword, None),
            param("count", ParamKind::PositionalOrKeyword, None),
        ];
        finalize_parameters(&mut params, &SideTables::default());
        assert_eq!(params[0].ui.widget, WidgetKind::FilePicker);
        assert_eq!(params[1].ui.widget, WidgetKind::FilePicker);
        assert_eq!(params[2].ui.widget, WidgetKind::LineEdit);
    }

    #[test]
    fn test_path_name_does_not_override_known_types() {
        let mut params = vec![param("file_count", ParamKind::PositionalOrKeyword, Some("int"))];
        finalize_parameters(&mut params, &SideTables::default());
        assert_eq!(params[0].ui.widget, WidgetKind::SpinBox);
    }

    #[test]
    fn test_enum_side_table_promotion() {
        let mut tables = SideTables::default();
        tables.enum_members.insert(
            "Color".to_string(),
            vec!["red".to_string(), "green".to_string()],
        );

        let mut params = vec![
            param("color", ParamKind::PositionalOrKeyword, Some("Color")),
            param("maybe", ParamKind::PositionalOrKeyword, Some("Optional[Color]")),
        ];
        finalize_parameters(&mut params, &tables);
        assert_eq!(params[0].ui.widget, WidgetKind::ComboBox);
        assert_eq!(params[0].ui.options, vec!["red", "green"]);
        assert_eq!(params[1].ui.widget, WidgetKind::ComboBox, "lookup unwraps Optional");
        assert_eq!(params[1].ui.options, vec!["red", "green"]);
    }

    #[test]
    fn test_enum_without_side_table_stays_line_edit() {
        let mut params = vec![param("color", ParamKind::PositionalOrKeyword, Some("Color"))];
        finalize_parameters(&mut params, &SideTables::default());
        assert_eq!(params[0].ui.widget, WidgetKind::LineEdit);
        assert!(params[0].ui.options.is_empty());
    }

    #[test]
    fn test_dataclass_side_table_promotion() {
        let mut tables = SideTables::default();
        tables.dataclass_names.insert("Settings".to_string());

        let mut params = vec![param("settings", ParamKind::PositionalOrKeyword, Some("Settings"))];
        finalize_parameters(&mut params, &tables);
        assert_eq!(params[0].ui.widget, WidgetKind::JsonEditor);
    }

    #[test]
    fn test_variadic_widgets_are_fixed() {
        let mut params = vec![
            param("args", ParamKind::VarPositional, Some("int")),
            param("kwargs", ParamKind::VarKeyword, Some("str")),
        ];
        finalize_parameters(&mut params, &SideTables::default());
        assert_eq!(params[0].ui.widget, WidgetKind::PlainTextEdit);
        assert_eq!(params[1].ui.widget, WidgetKind::JsonEditor);
        assert_eq!(
            params[0].validation,
            ParamValidation::default(),
            "*args: int must not inherit numeric bounds"
        );
        assert_eq!(params[1].validation, ParamValidation::default());
    }

    #[test]
    fn test_optional_annotation_releases_requiredness() {
        let mut params = vec![param("name", ParamKind::PositionalOrKeyword, Some("Optional[str]"))];
        assert!(params[0].required);
        finalize_parameters(&mut params, &SideTables::default());
        assert!(!params[0].required);
    }

    #[test]
    fn test_return_spec_kinds() {
        assert_eq!(return_spec(None).ui.result_kind, ResultKind::Repr);
        assert_eq!(return_spec(Some("None")).ui.result_kind, ResultKind::None);
        assert_eq!(return_spec(Some("str")).ui.result_kind, ResultKind::Text);
        assert_eq!(return_spec(Some("Path")).ui.result_kind, ResultKind::File);
        assert_eq!(return_spec(Some("dict")).ui.result_kind, ResultKind::Json);
        assert_eq!(return_spec(Some("list[int]")).ui.result_kind, ResultKind::Json);
        assert_eq!(return_spec(Some("int")).ui.result_kind, ResultKind::Text);
        assert_eq!(return_spec(Some("Widget")).ui.result_kind, ResultKind::Repr);
    }
}
