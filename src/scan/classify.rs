//! Header classification.
//!
//! Each line the extractor looks at is matched against a short table of
//! patterns keyed by leading keyword and shape. The table is ordered by rule
//! priority; the remaining predicates cover the shapes met inside class and
//! object bodies.

use once_cell::sync::Lazy;
use regex::Regex;

/// Top-level shape of a trimmed line, in rule priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// `class Foo {`, `export default class extends Bar {`
    Class,
    /// `var Foo = class {`, `return class Foo {`
    ClassExpression,
    /// `var`, `let` or `const` declaration.
    Variable,
    /// `function foo() {`
    Function,
    /// `Foo.prototype.bar = function() {`
    PrototypeAssignment,
    /// Anything else.
    Other,
}

impl HeaderKind {
    /// Class declaration or class expression.
    pub fn is_class(self) -> bool {
        matches!(self, HeaderKind::Class | HeaderKind::ClassExpression)
    }
}

static HEADER_RULES: Lazy<Vec<(HeaderKind, Regex)>> = Lazy::new(|| {
    [
        (HeaderKind::Class, r"^(?:export\s+(?:default\s+)?)?class\b"),
        (
            HeaderKind::ClassExpression,
            r"^(?:export\s+)?(?:(?:var|let|const)\s+)?[\w$.]+\s*=\s*class\b|^return\s+class\b",
        ),
        (HeaderKind::Variable, r"^(?:export\s+)?(?:var|let|const)\s"),
        (
            HeaderKind::Function,
            r"^(?:export\s+(?:default\s+)?)?(?:async\s+)?function\b",
        ),
        (HeaderKind::PrototypeAssignment, r"\.prototype\."),
    ]
    .into_iter()
    .map(|(kind, pattern)| {
        let regex = Regex::new(pattern).expect("header rule regex is invalid");
        (kind, regex)
    })
    .collect()
});

static CONTROL_FLOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|while|for|catch|switch)\s*\(.*\)\s*\{")
        .expect("CONTROL_FLOW regex is invalid")
});

static METHOD_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w$]+\s*\(.*\)\s*\{").expect("METHOD_HEADER regex is invalid"));

static PROPERTY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:"[^"]*"|'[^']*'|[\w$]+)\s*:"#).expect("PROPERTY_HEADER regex is invalid")
});

static FUNCTION_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\b").expect("FUNCTION_KEYWORD regex is invalid"));

static ARROW_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=>\s*\{\s*$").expect("ARROW_BODY regex is invalid"));

static CLOSURE_CALLBACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\]\s*,\s*(?:async\s+)?function\b").expect("CLOSURE_CALLBACK regex is invalid")
});

static EXTENDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bextends\b").expect("EXTENDS regex is invalid"));

static RETURN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^return(?:[^\w$]|$)").expect("RETURN regex is invalid"));

static CLASS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([\w$]+)").expect("CLASS_NAME regex is invalid"));

static ASSIGNMENT_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?(?:(?:var|let|const)\s+)?([\w$.]+)\s*=[^=>]")
        .expect("ASSIGNMENT_TARGET regex is invalid")
});

static NAME_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(?:export\s+(?:default\s+)?)?(?:async\s+)?function\s*\*?\s*([\w$]+)",
        r"^(?:export\s+)?(?:(?:var|let|const)\s+)?([\w$.]+)\s*=",
        r#"^["']?([\w$]+)["']?\s*:"#,
        r"^(?:(?:static|async|get|set)\s+|\*\s*)*([\w$]+)\s*\(",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("name rule regex is invalid"))
    .collect()
});

/// Classify a trimmed line against the top-level header table.
pub fn classify_header(line: &str) -> HeaderKind {
    HEADER_RULES
        .iter()
        .find(|(_, regex)| regex.is_match(line))
        .map_or(HeaderKind::Other, |(kind, _)| *kind)
}

/// Control-flow header shaped like a call followed by a brace.
///
/// `if`, `while`, `for`, `catch` and `switch` headers look exactly like a
/// method header (`name(...) {`) and must never become functions.
pub fn is_control_flow_header(line: &str) -> bool {
    CONTROL_FLOW.is_match(line)
}

/// Call-shaped header followed by a brace: `name(...) {`.
pub fn is_method_header(line: &str) -> bool {
    METHOD_HEADER.is_match(line)
}

/// Object property header: `key: value`, with an optionally quoted key.
pub fn is_property_header(line: &str) -> bool {
    PROPERTY_HEADER.is_match(line)
}

/// Line contains the `function` keyword.
pub fn has_function_keyword(line: &str) -> bool {
    FUNCTION_KEYWORD.is_match(line)
}

/// Header whose body is an arrow-function block.
pub fn opens_arrow_body(line: &str) -> bool {
    ARROW_BODY.is_match(line)
}

/// Opens a module-definition call: `define(`.
pub fn is_closure_open(line: &str) -> bool {
    line.starts_with("define(")
}

/// Line that wraps file content rather than declaring anything: a
/// `define(` call, its callback after a dependency list, or an immediately
/// invoked function.
pub fn is_scope_wrapper(line: &str) -> bool {
    line.contains("define(")
        || line.starts_with("function")
        || line.starts_with("(function")
        || CLOSURE_CALLBACK.is_match(line)
}

/// A `return` statement.
pub fn is_return(line: &str) -> bool {
    RETURN.is_match(line)
}

/// Class header that extends a superclass.
pub fn is_child_class(header: &str) -> bool {
    EXTENDS.is_match(header)
}

/// A standalone annotation line, e.g. `@private`.
pub fn is_lone_tag(line: &str) -> bool {
    line.starts_with('@') && line.split_whitespace().count() == 1
}

/// Name bound by a class header.
///
/// An assignment target wins over the class's own name, since that is the
/// binding later code refers to. `class extends Base {` has no name.
pub fn class_name(header: &str) -> Option<&str> {
    if let Some(target) = ASSIGNMENT_TARGET.captures(header).and_then(|c| c.get(1)) {
        return Some(target.as_str());
    }

    CLASS_NAME
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| *name != "extends")
}

/// Name declared by a function, variable, property or method header.
pub fn declared_name(header: &str) -> Option<&str> {
    NAME_RULES
        .iter()
        .find_map(|regex| regex.captures(header).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
        .filter(|name| *name != "function")
}

/// Receiver of a prototype assignment: the text before the first `.`.
pub fn prototype_receiver(header: &str) -> Option<&str> {
    if !header.contains(".prototype.") {
        return None;
    }
    header.split('.').next().map(str::trim).filter(|s| !s.is_empty())
}
