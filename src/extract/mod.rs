//! Structural extraction of declarations from JavaScript source lines.
//!
//! Extraction works line by line without a grammar: each significant line is
//! classified (see [`crate::scan::classify`]), the construct's body is
//! located with delimiter matching, and nested bodies are extracted
//! recursively over explicit line ranges. Bodies themselves are discarded;
//! only single-line headers survive, closed with synthesized delimiters.

mod extractor;
mod properties;
mod prototype;

use std::ops::AddAssign;

use serde::Serialize;
use thiserror::Error;

use crate::comments::{CommentBlock, CommentPool};
use crate::scan::classify;

pub use prototype::link_prototypes;

/// Source range of a construct and its synthesized header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderBlock {
    /// First line of the construct, zero-indexed.
    pub start_line: usize,
    /// Last line of the construct, inclusive.
    pub end_line: usize,
    /// Single-line header text, e.g. `function foo(a, b) {`.
    pub declaration: String,
}

/// A function, method or prototype assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDeclaration {
    pub comment: Option<CommentBlock>,
    pub header: HeaderBlock,
    /// A class body `constructor(...)`.
    pub is_constructor: bool,
    /// Set by [`link_prototypes`] when a prototype assignment targets this
    /// function.
    pub has_prototype: bool,
    /// Header of the form `Receiver.prototype.member = ...`.
    pub is_prototype_assignment: bool,
    /// Loose tags that preceded the declaration.
    pub tags: Vec<String>,
}

impl FunctionDeclaration {
    /// Declared name, if the header has one.
    pub fn name(&self) -> Option<&str> {
        classify::declared_name(&self.header.declaration)
    }
}

/// A class declaration or class expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDeclaration {
    pub comment: Option<CommentBlock>,
    pub header: HeaderBlock,
    /// Methods found inside the class body.
    pub functions: Vec<FunctionDeclaration>,
    /// The class `extends` another; a stubbed constructor must call `super()`.
    pub is_child: bool,
    pub tags: Vec<String>,
    /// Bound name of the class. Empty for anonymous classes.
    pub name: String,
    /// `Name.member = function ...` assignments found after the class.
    pub member_functions: Vec<FunctionDeclaration>,
    /// Other `Name.member = ...` assignments found after the class.
    pub member_properties: Vec<VarDeclaration>,
}

impl ClassDeclaration {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

/// Value of an object literal property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Scalar text with any trailing comma removed.
    Scalar(String),
    /// Function header closed with synthesized delimiters.
    Function(String),
    /// Nested object literal.
    Object(Vec<PropertyDeclaration>),
    /// Array literal; its elements are not extracted.
    Array,
}

/// One `key: value` entry of an object literal. A shorthand entry has no
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDeclaration {
    pub comment: Option<CommentBlock>,
    pub key: String,
    pub value: Option<PropertyValue>,
}

/// A `var`/`let`/`const` declaration (or class member assignment) with a
/// structured body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarDeclaration {
    pub comment: Option<CommentBlock>,
    pub header: HeaderBlock,
    /// Methods declared in the body, e.g. `foo() {`.
    pub functions: Vec<FunctionDeclaration>,
    /// `key: value` entries of the body.
    pub properties: Vec<PropertyDeclaration>,
    pub tags: Vec<String>,
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub class_declarations: Vec<ClassDeclaration>,
    pub var_declarations: Vec<VarDeclaration>,
    pub loose_functions: Vec<FunctionDeclaration>,
    /// Documentation comments no declaration claimed.
    pub leftover_comments: Vec<CommentBlock>,
    /// The file wraps its content in a `define(...)` module call.
    pub in_closure: bool,
    /// The module's `return` statement, closed and terminated, unless the
    /// module returns a class.
    pub closure_return: Option<String>,
}

/// Errors during extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A delimiter opened on `line` (zero-indexed) is never closed.
    #[error("unterminated block starting at line {}", .line + 1)]
    UnterminatedBlock { line: usize },
}

/// Extract declarations from a file's lines.
///
/// # Errors
///
/// [`ExtractError::UnterminatedBlock`] aborts the whole file: no partial
/// result is returned.
///
/// ```
/// let lines = ["class Foo {", "  bar() { return 1; }", "}"];
/// let result = jsstub::extract::extract(&lines).unwrap();
///
/// assert_eq!(result.class_declarations[0].name, "Foo");
/// assert_eq!(result.class_declarations[0].functions.len(), 1);
/// ```
pub fn extract<S: AsRef<str>>(lines: &[S]) -> Result<ExtractionResult, ExtractError> {
    let lines: Vec<&str> = lines.iter().map(|line| line.as_ref()).collect();
    let mut pool = CommentPool::collect(&lines);

    let scope = extractor::Extractor::new(&lines, &mut pool).extract_top_level()?;

    let mut loose_functions = scope.functions;
    link_prototypes(&mut loose_functions);

    Ok(ExtractionResult {
        class_declarations: scope.classes,
        var_declarations: scope.vars,
        loose_functions,
        leftover_comments: pool.into_blocks(),
        in_closure: scope.in_closure,
        closure_return: scope.closure_return,
    })
}

/// Split source text into lines, dropping `\r` from CRLF endings.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Extract declarations from source text.
pub fn extract_source(text: &str) -> Result<ExtractionResult, ExtractError> {
    extract(&split_lines(text))
}

/// Declaration counts for one file, or totals over many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub classes: usize,
    pub class_functions: usize,
    pub vars: usize,
    pub var_functions: usize,
    pub var_properties: usize,
    pub loose_functions: usize,
}

impl ProcessSummary {
    /// Count the declarations of an extraction.
    pub fn of(result: &ExtractionResult) -> Self {
        Self {
            classes: result.class_declarations.len(),
            class_functions: result.class_declarations.iter().map(|c| c.functions.len()).sum(),
            vars: result.var_declarations.len(),
            var_functions: result.var_declarations.iter().map(|v| v.functions.len()).sum(),
            var_properties: result.var_declarations.iter().map(|v| v.properties.len()).sum(),
            loose_functions: result.loose_functions.len(),
        }
    }

    /// Check if nothing worth stubbing was found.
    pub fn is_empty(&self) -> bool {
        self.class_functions + self.var_functions + self.var_properties + self.loose_functions == 0
    }
}

impl AddAssign for ProcessSummary {
    fn add_assign(&mut self, other: Self) {
        self.classes += other.classes;
        self.class_functions += other.class_functions;
        self.vars += other.vars;
        self.var_functions += other.var_functions;
        self.var_properties += other.var_properties;
        self.loose_functions += other.loose_functions;
    }
}
