//! Structural context model: the machine-readable description of a function.
//!
//! These types mirror what the external structural analyzer emits as JSON.
//! They are passive data: constructed once per analysis request, immutable
//! afterwards, and discarded when the consuming pipeline step completes.

use serde::{Deserialize, Serialize};

/// How a parameter is declared in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Positional,
    Keyword,
    VarPositional,
    VarKeyword,
}

/// A single function parameter, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Declared type annotation, if any.
    #[serde(rename = "type")]
    pub ty: Option<String>,
    /// Default value literal, if any.
    pub default_value: Option<String>,
    pub kind: ParameterKind,
}

/// Function signature facts.
///
/// For methods the receiver parameter has already been stripped by the
/// supplying analyzer; `parameters` holds only the declared arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub is_method: bool,
    pub decorators: Vec<String>,
}

/// Kind of conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchKind {
    If,
    Elif,
    Else,
    Match,
}

/// A conditional branch in the function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchInfo {
    #[serde(rename = "type")]
    pub kind: BranchKind,
    pub condition: String,
    pub line_number: u32,
}

/// Kind of exception site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionKind {
    #[serde(rename = "raise")]
    Raise,
    #[serde(rename = "try-except")]
    TryExcept,
}

/// An exception raise or handler in the function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionInfo {
    #[serde(rename = "type")]
    pub kind: ExceptionKind,
    pub exception_class: Option<String>,
    pub line_number: u32,
    pub context: String,
}

/// A call made from the function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallInfo {
    pub function_name: String,
    pub module: Option<String>,
    pub line_number: u32,
    pub is_builtin: bool,
}

impl CallInfo {
    /// Display key for grouping: `module.name` when the module is known.
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}.{}", self.function_name),
            None => self.function_name.clone(),
        }
    }
}

/// Control-flow facts for a function body.
///
/// `complexity` is a cyclomatic-style approximation and is always at least 1;
/// a value of 1 means the body has no conditional paths. The minimum
/// acceptable approximation is `1 + branches.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionBodyAnalysis {
    pub branches: Vec<BranchInfo>,
    pub exceptions: Vec<ExceptionInfo>,
    pub external_calls: Vec<CallInfo>,
    pub complexity: u32,
}

impl FunctionBodyAnalysis {
    /// Body with no branches, exceptions, or calls.
    pub fn trivial() -> Self {
        Self {
            branches: Vec::new(),
            exceptions: Vec::new(),
            external_calls: Vec::new(),
            complexity: 1,
        }
    }
}

/// Surrounding class facts, present only for methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassContext {
    pub class_name: String,
    pub base_classes: Vec<String>,
    pub class_attributes: Vec<String>,
    pub other_methods: Vec<String>,
    pub is_dataclass: bool,
}

/// An import statement in the source module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportInfo {
    pub module: String,
    /// Imported names in source order. A single `"*"` entry means a
    /// wildcard import.
    pub imported_names: Vec<String>,
    pub alias: Option<String>,
    pub line_number: u32,
}

impl ImportInfo {
    /// Whether this is a wildcard (`import module` / `from module import *`).
    pub fn is_wildcard(&self) -> bool {
        self.imported_names.first().is_some_and(|n| n == "*")
    }
}

/// An inline or block comment attached to the function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub line_number: u32,
    pub is_block_comment: bool,
}

/// Docstring and inline comments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentationInfo {
    pub docstring: Option<String>,
    pub inline_comments: Vec<Comment>,
}

/// Complete structural context for one function.
///
/// This is the unit handed to the prompt formatter and to the reasoning
/// backend. The line range is 1-based and inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionContext {
    pub signature: FunctionSignature,
    pub source_code: String,
    pub body_analysis: FunctionBodyAnalysis,
    pub class_context: Option<ClassContext>,
    pub imports: Vec<ImportInfo>,
    pub documentation: DocumentationInfo,
    pub file_path: String,
    pub module_path: String,
    pub line_range: (u32, u32),
}
