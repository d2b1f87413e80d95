//! Prompt construction for the reasoning backend.
//!
//! Turns a [`FunctionContext`] plus the user's free-text description into a
//! single formatted text block, and provides the auto-confirmation gate and
//! the human-readable complexity summary shown before a run.

use indexmap::IndexMap;

use crate::models::context::{
    BranchInfo, CallInfo, ExceptionInfo, FunctionContext, Parameter, ParameterKind,
};
use crate::models::context::ImportInfo;

/// Distinct call entries shown before collapsing to `... and K more`.
const MAX_CALL_ENTRIES: usize = 10;

/// Imports shown in the prompt, after filtering.
const MAX_IMPORT_ENTRIES: usize = 5;

/// Significant-line threshold below which a function counts as "short".
const SHORT_FUNCTION_LINES: usize = 10;

/// Common standard-library modules whose imports add no signal for test
/// generation. Typing imports are kept regardless.
const STDLIB_MODULES: &[&str] = &[
    "os",
    "sys",
    "time",
    "datetime",
    "json",
    "csv",
    "re",
    "math",
    "random",
    "collections",
    "itertools",
    "functools",
];

/// Build the analysis prompt for one function.
///
/// Pure and total: absent optional fields are omitted from the output
/// rather than causing an error. Section order is fixed: function source,
/// structural facts, analysis facts, class facts (when present), filtered
/// imports (when any survive filtering), then the user's description
/// verbatim.
pub fn build_prompt(context: &FunctionContext, user_description: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push("## Function Code:".into());
    parts.push("```python".into());
    parts.push(context.source_code.clone());
    parts.push("```".into());
    parts.push(String::new());

    parts.push("## Function Context:".into());
    parts.push(format!("- Function name: {}", context.signature.name));
    parts.push(format!(
        "- Parameters: {}",
        format_parameters(&context.signature.parameters)
    ));
    parts.push(format!(
        "- Return type: {}",
        context.signature.return_type.as_deref().unwrap_or("None")
    ));
    if let Some(docstring) = &context.documentation.docstring {
        parts.push(format!("- Docstring: {docstring}"));
    }
    parts.push(format!("- Module path: {}", context.module_path));
    if context.signature.is_async {
        parts.push("- Async function: Yes".into());
    }
    if !context.signature.decorators.is_empty() {
        parts.push(format!(
            "- Decorators: {}",
            context.signature.decorators.join(", ")
        ));
    }
    parts.push(String::new());

    parts.push("## Code Analysis:".into());
    parts.push(format!(
        "- Branches: {}",
        format_branches(&context.body_analysis.branches)
    ));
    parts.push(format!(
        "- Exceptions: {}",
        format_exceptions(&context.body_analysis.exceptions)
    ));
    parts.push(format!(
        "- External calls: {}",
        format_calls(&context.body_analysis.external_calls)
    ));
    parts.push(format!(
        "- Cyclomatic complexity: {}",
        context.body_analysis.complexity
    ));
    parts.push(String::new());

    if let Some(class_context) = &context.class_context {
        parts.push("## Class Context:".into());
        parts.push(format!("- Class: {}", class_context.class_name));
        if !class_context.base_classes.is_empty() {
            parts.push(format!(
                "- Base classes: {}",
                class_context.base_classes.join(", ")
            ));
        }
        if !class_context.other_methods.is_empty() {
            parts.push(format!(
                "- Other methods: {}",
                class_context.other_methods.join(", ")
            ));
        }
        if !class_context.class_attributes.is_empty() {
            parts.push(format!(
                "- Attributes: {}",
                class_context.class_attributes.join(", ")
            ));
        }
        if class_context.is_dataclass {
            parts.push("- Type: Dataclass".into());
        }
        parts.push(String::new());
    }

    let relevant = filter_relevant_imports(&context.imports);
    if !relevant.is_empty() {
        parts.push("## Relevant Imports:".into());
        for imp in relevant {
            if imp.is_wildcard() {
                match &imp.alias {
                    Some(alias) => parts.push(format!("- import {} as {alias}", imp.module)),
                    None => parts.push(format!("- import {}", imp.module)),
                }
            } else {
                parts.push(format!(
                    "- from {} import {}",
                    imp.module,
                    imp.imported_names.join(", ")
                ));
            }
        }
        parts.push(String::new());
    }

    parts.push("## User's Description:".into());
    parts.push(format!("\"{user_description}\""));

    parts.join("\n")
}

/// `name[: type][ = default]`, with `*`/`**` markers for variadics.
fn format_parameters(parameters: &[Parameter]) -> String {
    if parameters.is_empty() {
        return "none".into();
    }

    parameters
        .iter()
        .map(|p| {
            let mut s = p.name.clone();
            if let Some(ty) = &p.ty {
                s.push_str(&format!(": {ty}"));
            }
            if let Some(default) = &p.default_value {
                s.push_str(&format!(" = {default}"));
            }
            match p.kind {
                ParameterKind::VarPositional => format!("*{s}"),
                ParameterKind::VarKeyword => format!("**{s}"),
                _ => s,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_branches(branches: &[BranchInfo]) -> String {
    if branches.is_empty() {
        return "none".into();
    }

    let details = branches
        .iter()
        .map(|b| {
            let kind = serde_variant_name(b);
            format!("{kind}({}) at line {}", b.condition, b.line_number)
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!("{} branch(es) - {details}", branches.len())
}

/// Lowercase wire name of the branch kind (`if`, `elif`, `else`, `match`).
fn serde_variant_name(branch: &BranchInfo) -> &'static str {
    use crate::models::context::BranchKind::*;
    match branch.kind {
        If => "if",
        Elif => "elif",
        Else => "else",
        Match => "match",
    }
}

fn format_exceptions(exceptions: &[ExceptionInfo]) -> String {
    if exceptions.is_empty() {
        return "none".into();
    }

    let details = exceptions
        .iter()
        .map(|e| {
            let kind = match e.kind {
                crate::models::context::ExceptionKind::Raise => "raise",
                crate::models::context::ExceptionKind::TryExcept => "try-except",
            };
            let class = e.exception_class.as_deref().unwrap_or("unknown");
            format!("{kind}({class}) at line {}", e.line_number)
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!("{} exception(s) - {details}", exceptions.len())
}

/// Group calls by qualified name in first-seen order, annotate repeats as
/// `name (Nx)`, and cap the displayed set at [`MAX_CALL_ENTRIES`].
fn format_calls(calls: &[CallInfo]) -> String {
    if calls.is_empty() {
        return "none".into();
    }

    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for call in calls {
        *counts.entry(call.qualified_name()).or_insert(0) += 1;
    }

    let distinct = counts.len();
    let mut entries: Vec<String> = counts
        .iter()
        .take(MAX_CALL_ENTRIES)
        .map(|(name, count)| {
            if *count > 1 {
                format!("{name} ({count}x)")
            } else {
                name.clone()
            }
        })
        .collect();

    if distinct > MAX_CALL_ENTRIES {
        entries.push(format!("... and {} more", distinct - MAX_CALL_ENTRIES));
    }

    entries.join(", ")
}

/// Keep typing imports unconditionally; otherwise keep only imports whose
/// top-level module is outside the stdlib allow-list. Capped at
/// [`MAX_IMPORT_ENTRIES`], source order preserved.
fn filter_relevant_imports(imports: &[ImportInfo]) -> Vec<&ImportInfo> {
    imports
        .iter()
        .filter(|imp| {
            if imp.module == "typing" || imp.module.starts_with("typing.") {
                return true;
            }
            let top_level = imp.module.split('.').next().unwrap_or(&imp.module);
            !STDLIB_MODULES.contains(&top_level)
        })
        .take(MAX_IMPORT_ENTRIES)
        .collect()
}

/// Conservative gate for skipping human confirmation.
///
/// True iff the function is short (fewer than 10 significant lines),
/// branch-free (complexity 1), and free of exception handling. Blank lines,
/// `#` comments, and triple-quote markers do not count as significant.
pub fn should_auto_confirm(context: &FunctionContext) -> bool {
    let code_lines = context
        .source_code
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty()
                && !trimmed.starts_with('#')
                && !trimmed.starts_with("\"\"\"")
                && !trimmed.starts_with("'''")
        })
        .count();

    code_lines < SHORT_FUNCTION_LINES
        && context.body_analysis.complexity == 1
        && context.body_analysis.exceptions.is_empty()
}

/// One-line complexity summary for user display.
///
/// Bucketed by complexity (<=5 low, 6-10 moderate, >10 high), followed by
/// branch and exception counts when non-zero and an external-calls flag
/// when more than five calls are made.
pub fn complexity_summary(context: &FunctionContext) -> String {
    let analysis = &context.body_analysis;
    let mut parts: Vec<String> = Vec::new();

    if analysis.complexity > 10 {
        parts.push("High complexity".into());
    } else if analysis.complexity > 5 {
        parts.push("Moderate complexity".into());
    } else {
        parts.push("Low complexity".into());
    }

    if !analysis.branches.is_empty() {
        parts.push(format!("{} branch(es)", analysis.branches.len()));
    }
    if !analysis.exceptions.is_empty() {
        parts.push(format!("{} exception(s)", analysis.exceptions.len()));
    }
    if analysis.external_calls.len() > 5 {
        parts.push("Multiple external calls".into());
    }

    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::context::{
        BranchKind, ClassContext, DocumentationInfo, ExceptionKind, FunctionBodyAnalysis,
        FunctionSignature,
    };
    use pretty_assertions::assert_eq;

    fn simple_context(source: &str) -> FunctionContext {
        FunctionContext {
            signature: FunctionSignature {
                name: "add".into(),
                parameters: vec![
                    Parameter {
                        name: "a".into(),
                        ty: Some("int".into()),
                        default_value: None,
                        kind: ParameterKind::Positional,
                    },
                    Parameter {
                        name: "b".into(),
                        ty: Some("int".into()),
                        default_value: Some("0".into()),
                        kind: ParameterKind::Keyword,
                    },
                ],
                return_type: Some("int".into()),
                is_async: false,
                is_method: false,
                decorators: vec![],
            },
            source_code: source.into(),
            body_analysis: FunctionBodyAnalysis::trivial(),
            class_context: None,
            imports: vec![],
            documentation: DocumentationInfo::default(),
            file_path: "src/calc.py".into(),
            module_path: "calc".into(),
            line_range: (1, 2),
        }
    }

    #[test]
    fn prompt_has_fixed_section_headers() {
        let context = simple_context("def add(a, b=0):\n    return a + b\n");
        let prompt = build_prompt(&context, "adds two numbers");

        assert!(prompt.contains("## Function Code:"));
        assert!(prompt.contains("## Function Context:"));
        assert!(prompt.contains("## Code Analysis:"));
        assert!(prompt.contains("## User's Description:"));
        assert!(prompt.contains("\"adds two numbers\""));
    }

    #[test]
    fn prompt_omits_class_context_when_absent() {
        let context = simple_context("def add(a, b=0):\n    return a + b\n");
        let prompt = build_prompt(&context, "d");
        assert!(!prompt.contains("## Class Context:"));
    }

    #[test]
    fn prompt_includes_class_context_when_present() {
        let mut context = simple_context("def add(self, a):\n    return a\n");
        context.class_context = Some(ClassContext {
            class_name: "Calculator".into(),
            base_classes: vec!["Base".into()],
            class_attributes: vec!["precision".into()],
            other_methods: vec!["subtract".into()],
            is_dataclass: true,
        });
        let prompt = build_prompt(&context, "d");

        assert!(prompt.contains("## Class Context:"));
        assert!(prompt.contains("- Class: Calculator"));
        assert!(prompt.contains("- Base classes: Base"));
        assert!(prompt.contains("- Other methods: subtract"));
        assert!(prompt.contains("- Attributes: precision"));
        assert!(prompt.contains("- Type: Dataclass"));
    }

    #[test]
    fn parameters_formatted_with_types_defaults_and_variadics() {
        let params = vec![
            Parameter {
                name: "a".into(),
                ty: Some("int".into()),
                default_value: None,
                kind: ParameterKind::Positional,
            },
            Parameter {
                name: "b".into(),
                ty: None,
                default_value: Some("1".into()),
                kind: ParameterKind::Keyword,
            },
            Parameter {
                name: "args".into(),
                ty: None,
                default_value: None,
                kind: ParameterKind::VarPositional,
            },
            Parameter {
                name: "kwargs".into(),
                ty: None,
                default_value: None,
                kind: ParameterKind::VarKeyword,
            },
        ];
        assert_eq!(format_parameters(&params), "a: int, b = 1, *args, **kwargs");
        assert_eq!(format_parameters(&[]), "none");
    }

    #[test]
    fn calls_grouped_counted_and_capped() {
        let mut calls: Vec<CallInfo> = Vec::new();
        // "fetch" appears twice, then 11 more distinct names
        for _ in 0..2 {
            calls.push(CallInfo {
                function_name: "fetch".into(),
                module: Some("requests".into()),
                line_number: 1,
                is_builtin: false,
            });
        }
        for i in 0..11 {
            calls.push(CallInfo {
                function_name: format!("helper_{i}"),
                module: None,
                line_number: 2,
                is_builtin: false,
            });
        }

        let summary = format_calls(&calls);
        assert!(summary.starts_with("requests.fetch (2x)"));
        assert!(summary.contains("... and 2 more"));
    }

    #[test]
    fn import_filter_keeps_typing_and_third_party_only() {
        let imports = vec![
            ImportInfo {
                module: "typing".into(),
                imported_names: vec!["Optional".into()],
                alias: None,
                line_number: 1,
            },
            ImportInfo {
                module: "os.path".into(),
                imported_names: vec!["join".into()],
                alias: None,
                line_number: 2,
            },
            ImportInfo {
                module: "requests".into(),
                imported_names: vec!["get".into()],
                alias: None,
                line_number: 3,
            },
        ];
        let relevant = filter_relevant_imports(&imports);
        let modules: Vec<_> = relevant.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["typing", "requests"]);
    }

    #[test]
    fn auto_confirm_requires_all_three_conditions() {
        let short = "def add(a, b):\n    return a + b\n";
        let context = simple_context(short);
        assert!(should_auto_confirm(&context));

        // One branch flips it off
        let mut branched = simple_context(short);
        branched.body_analysis.branches.push(BranchInfo {
            kind: BranchKind::If,
            condition: "a > 0".into(),
            line_number: 2,
        });
        branched.body_analysis.complexity = 2;
        assert!(!should_auto_confirm(&branched));

        // One exception flips it off
        let mut raising = simple_context(short);
        raising.body_analysis.exceptions.push(ExceptionInfo {
            kind: ExceptionKind::Raise,
            exception_class: Some("ValueError".into()),
            line_number: 2,
            context: "raise ValueError".into(),
        });
        assert!(!should_auto_confirm(&raising));

        // Too many lines flips it off
        let long_source = (0..12)
            .map(|i| format!("    x{i} = {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let long = simple_context(&long_source);
        assert!(!should_auto_confirm(&long));
    }

    #[test]
    fn auto_confirm_ignores_blank_comment_and_docstring_lines() {
        let source = "def add(a, b):\n    \"\"\"\n    # not code\n\n    return a + b\n";
        let context = simple_context(source);
        assert!(should_auto_confirm(&context));
    }

    #[test]
    fn complexity_summary_buckets() {
        let mut context = simple_context("def f(): pass");

        context.body_analysis.complexity = 3;
        assert!(complexity_summary(&context).starts_with("Low complexity"));

        context.body_analysis.complexity = 8;
        assert!(complexity_summary(&context).starts_with("Moderate complexity"));

        context.body_analysis.complexity = 15;
        assert!(complexity_summary(&context).starts_with("High complexity"));
    }

    #[test]
    fn complexity_summary_appends_counts_and_call_flag() {
        let mut context = simple_context("def f(): pass");
        context.body_analysis.complexity = 4;
        context.body_analysis.branches.push(BranchInfo {
            kind: BranchKind::If,
            condition: "x".into(),
            line_number: 1,
        });
        context.body_analysis.exceptions.push(ExceptionInfo {
            kind: ExceptionKind::TryExcept,
            exception_class: None,
            line_number: 2,
            context: "try".into(),
        });
        for i in 0..6 {
            context.body_analysis.external_calls.push(CallInfo {
                function_name: format!("f{i}"),
                module: None,
                line_number: 3,
                is_builtin: false,
            });
        }

        let summary = complexity_summary(&context);
        assert_eq!(
            summary,
            "Low complexity, 1 branch(es), 1 exception(s), Multiple external calls"
        );
    }
}
