//! Stub printing.
//!
//! Turns an [`ExtractionResult`] back into source text: every kept
//! declaration is written as its documentation comment followed by its
//! header, closed with an empty body. The keep/drop policy lives here, not in
//! the extractor.

use crate::comments::CommentBlock;
use crate::extract::{
    ClassDeclaration, ExtractionResult, FunctionDeclaration, PropertyDeclaration, PropertyValue, VarDeclaration,
};
use crate::scan::closing_string;

/// Options for rendering a stub.
#[derive(Debug, Clone, Default)]
pub struct PrintOptions {
    /// Re-wrap files that were `define(...)` modules in a function closure
    /// that returns the module's value.
    pub wrap_closure: bool,
}

impl PrintOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap_closure(mut self, wrap: bool) -> Self {
        self.wrap_closure = wrap;
        self
    }
}

/// Check a comment for an annotation tag. No comment means no tag.
fn tagged(comment: &Option<CommentBlock>, tag: &str) -> bool {
    comment.as_ref().is_some_and(|c| c.has_tag(tag))
}

/// Functions are kept unless private or underscore-prefixed.
fn should_print_function(function: &FunctionDeclaration) -> bool {
    !tagged(&function.comment, "@private") && !function.header.declaration.starts_with('_')
}

/// Loose functions are kept only when they look like part of a class: a
/// prototype owner, a prototype assignment, or a `@classdesc` constructor.
fn should_print_loose_function(function: &FunctionDeclaration) -> bool {
    let class_like =
        function.has_prototype || function.is_prototype_assignment || tagged(&function.comment, "@classdesc");
    class_like && should_print_function(function)
}

/// Render the stub text for one file.
///
/// `lines` must be the lines the result was extracted from; comments are
/// copied from them. Returns an empty string when nothing is kept.
///
/// ```
/// use jsstub::extract::extract;
/// use jsstub::printer::{render_stub, PrintOptions};
///
/// let lines = ["class Foo {", "  bar() { return 1; }", "}"];
/// let result = extract(&lines).unwrap();
/// let stub = render_stub(&lines, &result, &PrintOptions::default());
///
/// assert_eq!(stub, "class Foo {\nbar() {}\n}\n");
/// ```
pub fn render_stub<S: AsRef<str>>(lines: &[S], result: &ExtractionResult, options: &PrintOptions) -> String {
    let mut writer = StubWriter {
        lines,
        options,
        out: String::new(),
    };
    writer.write_result(result);
    writer.out
}

struct StubWriter<'a, S> {
    lines: &'a [S],
    options: &'a PrintOptions,
    out: String,
}

impl<S: AsRef<str>> StubWriter<'_, S> {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn wraps_closure(&self, result: &ExtractionResult) -> bool {
        self.options.wrap_closure && result.in_closure
    }

    fn write_result(&mut self, result: &ExtractionResult) {
        for comment in &result.leftover_comments {
            self.comment(Some(comment));
        }

        let wrap = self.wraps_closure(result);
        if wrap {
            self.line("(function(result){");
        }

        for class in &result.class_declarations {
            if !tagged(&class.comment, "@private") {
                self.class(class);
            }
        }

        for var in &result.var_declarations {
            if !tagged(&var.comment, "@private") {
                self.var(var);
            }
        }

        for function in &result.loose_functions {
            if should_print_loose_function(function) {
                self.function(function);
            }
        }

        if wrap {
            if let Some(statement) = &result.closure_return {
                self.line(statement);
            }
            self.line("});");
        }
    }

    fn comment(&mut self, comment: Option<&CommentBlock>) {
        let Some(comment) = comment else {
            return;
        };
        let lines = self.lines;
        for text in comment.source_lines(lines) {
            self.line(text);
        }
    }

    fn tags(&mut self, tags: &[String]) {
        for tag in tags {
            self.line(tag);
        }
    }

    fn class(&mut self, class: &ClassDeclaration) {
        self.comment(class.comment.as_ref());
        self.tags(&class.tags);

        let mut header = class.header.declaration.as_str();
        if !self.options.wrap_closure && header.starts_with("return") {
            if let Some(start) = header.find("class") {
                header = &header[start..];
            }
        }
        self.line(header);

        for function in class.functions.iter().filter(|f| should_print_function(f)) {
            if function.is_constructor {
                self.constructor(function, class.is_child);
            } else {
                self.function(function);
            }
        }

        self.line(if header.contains('=') { "};" } else { "}" });

        for function in class.member_functions.iter().filter(|f| should_print_function(f)) {
            self.function(function);
        }
        for member in class.member_properties.iter().filter(|m| !tagged(&m.comment, "@private")) {
            self.var(member);
        }
    }

    fn constructor(&mut self, function: &FunctionDeclaration, is_child: bool) {
        self.comment(function.comment.as_ref());
        self.tags(&function.tags);

        let body = if is_child { "super();}" } else { "}" };
        self.line(&format!("{}{body}", function.header.declaration));
    }

    fn function(&mut self, function: &FunctionDeclaration) {
        self.comment(function.comment.as_ref());
        self.tags(&function.tags);

        let mut text = format!("{}{}", function.header.declaration, closing_string(&function.header.declaration));
        if function.is_prototype_assignment {
            text.push(';');
        }
        self.line(&text);
    }

    fn var(&mut self, var: &VarDeclaration) {
        self.comment(var.comment.as_ref());
        self.tags(&var.tags);

        let header = var.header.declaration.as_str();
        let closing = closing_string(header);
        if closing.is_empty() {
            // Single-statement assignment, e.g. `Foo.VERSION = '1.0';`
            if header.ends_with(';') {
                self.line(header);
            } else {
                self.line(&format!("{header};"));
            }
            return;
        }
        self.line(header);

        let functions: Vec<_> = var.functions.iter().filter(|f| should_print_function(f)).collect();
        let properties: Vec<_> = var.properties.iter().filter(|p| !tagged(&p.comment, "@private")).collect();

        for (index, function) in functions.iter().enumerate() {
            self.function(function);
            let more = index + 1 < functions.len() || !properties.is_empty();
            if more && !function.header.declaration.ends_with(',') {
                self.line(",");
            }
        }

        self.properties(&properties);
        self.line(&format!("{closing};"));
    }

    fn properties(&mut self, properties: &[&PropertyDeclaration]) {
        for (index, property) in properties.iter().enumerate() {
            self.comment(property.comment.as_ref());
            let comma = if index + 1 < properties.len() { "," } else { "" };

            match &property.value {
                None => self.line(&format!("{}{comma}", property.key)),
                Some(PropertyValue::Object(nested)) => {
                    self.line(&format!("{} : {{", property.key));
                    let nested: Vec<_> = nested.iter().filter(|p| !tagged(&p.comment, "@private")).collect();
                    self.properties(&nested);
                    self.line(&format!("}}{comma}"));
                }
                Some(PropertyValue::Array) => self.line(&format!("{} : []{comma}", property.key)),
                Some(PropertyValue::Scalar(value) | PropertyValue::Function(value)) => {
                    self.line(&format!("{} : {value}{comma}", property.key));
                }
            }
        }
    }
}
