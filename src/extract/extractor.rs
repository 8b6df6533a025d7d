//! The line-oriented extraction loop.

use std::mem;
use std::ops::Range;

use tracing::{debug, trace};

use super::{ClassDeclaration, ExtractError, FunctionDeclaration, HeaderBlock, VarDeclaration};
use crate::comments::{CommentBlock, CommentPool};
use crate::scan::classify::{self, HeaderKind};
use crate::scan::delimiters::{closing_string, find_block, unclosed_opener, Block, Delimiter};

/// Declarations found at the top level of a file.
#[derive(Debug, Default)]
pub(super) struct Scope {
    pub classes: Vec<ClassDeclaration>,
    pub vars: Vec<VarDeclaration>,
    pub functions: Vec<FunctionDeclaration>,
    pub in_closure: bool,
    pub closure_return: Option<String>,
}

/// What a `var`/`let`/`const` line turns into.
#[derive(Debug, PartialEq, Eq)]
enum VarShape {
    /// Single-statement declaration, nothing to extract.
    Skip,
    /// A function expression, treated as a loose function.
    Function,
    /// A structured body to extract members from.
    Body,
}

/// Extraction state for one file.
///
/// Holds the file's lines and the comment pool every nested extraction
/// claims from. All traversal is over explicit line ranges; results are
/// returned by value.
pub(super) struct Extractor<'src, 'pool> {
    pub(super) lines: &'src [&'src str],
    pool: &'pool mut CommentPool,
}

impl<'src, 'pool> Extractor<'src, 'pool> {
    pub fn new(lines: &'src [&'src str], pool: &'pool mut CommentPool) -> Self {
        Self { lines, pool }
    }

    /// Run the top-level rules over the whole file.
    pub fn extract_top_level(mut self) -> Result<Scope, ExtractError> {
        let mut scope = Scope::default();
        let mut loose_tags = Vec::new();
        let mut returns_class = false;
        let mut index = 0;

        while let Some(current) = self.next_significant(index, self.lines.len(), &mut loose_tags) {
            index = current + 1;
            let line = self.lines[current].trim();
            let kind = classify::classify_header(line);

            if classify::is_closure_open(line) {
                scope.in_closure = true;
            }
            if scope.in_closure && !returns_class && classify::is_return(line) {
                if kind.is_class() {
                    returns_class = true;
                    scope.closure_return = None;
                } else {
                    let statement = line.trim_end_matches(';');
                    scope.closure_return = Some(format!("{statement}{};", closing_string(statement)));
                }
            }

            match kind {
                HeaderKind::Class | HeaderKind::ClassExpression => {
                    let class = self.extract_class(current, &mut loose_tags)?;
                    index = class.header.end_line + 1;
                    scope.classes.push(class);
                    continue;
                }
                HeaderKind::Variable => {
                    match self.var_shape(current) {
                        VarShape::Skip => {}
                        VarShape::Function => {
                            let function = self.extract_function(current, &mut loose_tags)?;
                            index = function.header.end_line + 1;
                            scope.functions.push(function);
                        }
                        VarShape::Body => {
                            let var = self.extract_var(current, &mut loose_tags)?;
                            index = var.header.end_line + 1;
                            scope.vars.push(var);
                        }
                    }
                    continue;
                }
                HeaderKind::Function | HeaderKind::PrototypeAssignment => {
                    if !classify::is_control_flow_header(line) {
                        let function = self.extract_function(current, &mut loose_tags)?;
                        index = function.header.end_line + 1;
                        scope.functions.push(function);
                    }
                    continue;
                }
                HeaderKind::Other => {}
            }

            let owner = scope
                .classes
                .iter()
                .position(|class| !class.is_anonymous() && is_member_of(line, &class.name));
            if let Some(owner) = owner {
                if classify::has_function_keyword(line) {
                    let function = self.extract_function(current, &mut loose_tags)?;
                    index = function.header.end_line + 1;
                    scope.classes[owner].member_functions.push(function);
                } else {
                    let member = self.extract_var(current, &mut loose_tags)?;
                    index = member.header.end_line + 1;
                    scope.classes[owner].member_properties.push(member);
                }
                continue;
            }

            if line.ends_with('{') && !classify::is_scope_wrapper(line) {
                trace!(line = current, "skipping block");
                index = self.skip_block(current)? + 1;
            }
        }

        Ok(scope)
    }

    /// First line at or after `index`, before `end`, that can start a
    /// construct.
    ///
    /// Blank lines and comments are passed over. Lone `@tag` lines are pushed
    /// onto `loose_tags` for the next declaration.
    pub(super) fn next_significant(&self, mut index: usize, end: usize, loose_tags: &mut Vec<String>) -> Option<usize> {
        while index < end {
            let line = self.lines[index].trim();

            if line.is_empty() || line.starts_with("//") {
                index += 1;
            } else if line.starts_with("/*") {
                index = self.comment_end(index) + 1;
            } else if classify::is_lone_tag(line) {
                loose_tags.push(line.to_string());
                index += 1;
            } else {
                return Some(index);
            }
        }

        None
    }

    fn comment_end(&self, start: usize) -> usize {
        self.lines
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, line)| line.contains("*/"))
            .map_or(self.lines.len(), |(index, _)| index)
    }

    /// Claim the doc comment for a declaration on `line`.
    pub(super) fn take_comment(&mut self, line: usize, loose_tags: &[String]) -> Option<CommentBlock> {
        self.pool.take_matching(line, loose_tags.len())
    }

    /// Last line of the construct starting on `line`, chaining through
    /// continuations like `} else {` and `}, function() {`.
    pub(super) fn skip_block(&self, line: usize) -> Result<usize, ExtractError> {
        let mut cursor = line;

        while let Some(block) = find_block(self.lines, cursor)? {
            let close = block.close;
            if close.line <= cursor {
                return Ok(close.line.max(line));
            }

            let rest = self.lines[close.line].get(close.column + 1..).unwrap_or("");
            if unclosed_opener(rest).is_none() {
                return Ok(close.line);
            }
            cursor = close.line;
        }

        Ok(cursor)
    }

    /// Body of a function or class header.
    ///
    /// A parameter list spanning several lines is stepped over, so the body
    /// is the brace that follows it.
    pub(super) fn body_block(&self, line: usize) -> Result<Option<Block>, ExtractError> {
        let mut block = find_block(self.lines, line)?;

        while let Some(params) = block.filter(|b| b.delimiter == Delimiter::Paren && b.close.line > b.open.line) {
            match find_block(self.lines, params.close.line)? {
                Some(body) if body.close.line > params.close.line => block = Some(body),
                _ => break,
            }
        }

        Ok(block)
    }

    /// Header and extent of the function starting on `line`.
    ///
    /// A header without a brace is joined with the following line. The header
    /// is cut after its first `{` unless the line already closes everything
    /// it opens past that brace.
    pub(super) fn function_header(&self, line: usize) -> Result<HeaderBlock, ExtractError> {
        let mut declaration = self.lines[line].trim().to_string();
        if !declaration.contains('{') && !declaration.ends_with(';') {
            if let Some(next) = self.lines.get(line + 1) {
                declaration.push_str(next.trim());
            }
        }

        if !closing_string(&declaration).starts_with('}') {
            if let Some(brace) = declaration.find('{') {
                declaration.truncate(brace + 1);
            }
        }

        let end_line = self.body_block(line)?.map_or(line, |b| b.close.line);

        Ok(HeaderBlock {
            start_line: line,
            end_line,
            declaration,
        })
    }

    /// A free-standing function, a function expression bound to a name, or a
    /// prototype assignment.
    fn extract_function(&mut self, line: usize, loose_tags: &mut Vec<String>) -> Result<FunctionDeclaration, ExtractError> {
        let comment = self.take_comment(line, loose_tags);
        let header = self.function_header(line)?;
        trace!(line, declaration = %header.declaration, "function");

        Ok(FunctionDeclaration {
            comment,
            is_constructor: false,
            has_prototype: false,
            is_prototype_assignment: header.declaration.contains(".prototype."),
            tags: mem::take(loose_tags),
            header,
        })
    }

    fn extract_class(&mut self, line: usize, loose_tags: &mut Vec<String>) -> Result<ClassDeclaration, ExtractError> {
        let comment = self.take_comment(line, loose_tags);
        let tags = mem::take(loose_tags);

        let mut declaration = self.lines[line].trim().to_string();
        if !declaration.contains('{') && !declaration.ends_with(';') {
            if let Some(next) = self.lines.get(line + 1) {
                declaration.push_str(next.trim());
            }
        }

        let block = self.body_block(line)?;
        let end_line = block.map_or(line, |b| b.close.line);
        let functions = match block {
            Some(body) => self.extract_functions(body.inner_lines())?,
            None => Vec::new(),
        };

        let name = match classify::class_name(&declaration) {
            Some(name) => name.to_string(),
            None => {
                debug!(line, header = %declaration, "class header has no resolvable name");
                String::new()
            }
        };
        debug!(line, name = %name, methods = functions.len(), "class");

        Ok(ClassDeclaration {
            comment,
            is_child: classify::is_child_class(&declaration),
            header: HeaderBlock {
                start_line: line,
                end_line,
                declaration,
            },
            functions,
            tags,
            name,
            member_functions: Vec::new(),
            member_properties: Vec::new(),
        })
    }

    fn var_shape(&self, line: usize) -> VarShape {
        let header = self.lines[line].trim();
        let next = self.lines.get(line + 1).map_or("", |next| next.trim());

        let continues = if header.ends_with('{') || header.ends_with('[') {
            true
        } else if header.ends_with(';') || header.ends_with(',') {
            false
        } else {
            next.starts_with('{') || next.starts_with('[')
        };

        if !continues || !header.contains('=') {
            VarShape::Skip
        } else if classify::has_function_keyword(header) {
            VarShape::Function
        } else {
            VarShape::Body
        }
    }

    /// A variable or class member assignment and the members of its body.
    ///
    /// Arrow-function bodies are opaque: nothing inside is extracted.
    fn extract_var(&mut self, line: usize, loose_tags: &mut Vec<String>) -> Result<VarDeclaration, ExtractError> {
        let comment = self.take_comment(line, loose_tags);
        let tags = mem::take(loose_tags);

        let mut declaration = self.lines[line].trim().to_string();
        if !declaration.ends_with(['{', '[', ';', ',']) {
            if let Some(next) = self.lines.get(line + 1).filter(|next| next.trim_start().starts_with(['{', '['])) {
                declaration.push_str(next.trim());
            }
        }

        let block = find_block(self.lines, line)?;
        let end_line = block.map_or(line, |b| b.close.line);

        let (functions, properties) = match block {
            Some(body) if !classify::opens_arrow_body(&declaration) => {
                let functions = self.extract_functions(body.inner_lines())?;
                let properties = self.extract_properties(body.inner_lines())?;
                (functions, properties)
            }
            _ => (Vec::new(), Vec::new()),
        };
        debug!(line, functions = functions.len(), properties = properties.len(), "var");

        Ok(VarDeclaration {
            comment,
            header: HeaderBlock {
                start_line: line,
                end_line,
                declaration,
            },
            functions,
            properties,
            tags,
        })
    }

    /// Method headers inside a class or object body.
    ///
    /// Control-flow blocks, `key: function` properties and every other
    /// brace-ending line are skipped whole.
    pub(super) fn extract_functions(&mut self, range: Range<usize>) -> Result<Vec<FunctionDeclaration>, ExtractError> {
        let mut functions = Vec::new();
        let mut loose_tags = Vec::new();
        let mut index = range.start;

        while let Some(current) = self.next_significant(index, range.end, &mut loose_tags) {
            index = current + 1;
            let line = self.lines[current].trim();

            if !classify::is_method_header(line) {
                if line.ends_with('{') {
                    index = self.skip_block(current)? + 1;
                }
                continue;
            }

            if classify::is_control_flow_header(line) || classify::is_property_header(line) {
                index = self.skip_block(current)? + 1;
                continue;
            }

            let comment = self.take_comment(current, &loose_tags);
            let header = self.function_header(current)?;
            index = header.end_line + 1;

            functions.push(FunctionDeclaration {
                comment,
                is_constructor: classify::declared_name(&header.declaration) == Some("constructor"),
                has_prototype: false,
                is_prototype_assignment: header.declaration.contains(".prototype."),
                tags: mem::take(&mut loose_tags),
                header,
            });
        }

        Ok(functions)
    }
}

/// `Name.member` access on a line.
fn is_member_of(line: &str, name: &str) -> bool {
    line.strip_prefix(name).is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> Scope {
        let mut pool = CommentPool::collect(lines);
        Extractor::new(lines, &mut pool).extract_top_level().unwrap()
    }

    #[test]
    fn test_terminated_class_expression_keeps_its_own_line() {
        let lines = ["module.exports = class Base;", "function make() {}"];
        let scope = run(&lines);

        assert_eq!(scope.classes.len(), 1);
        assert_eq!(scope.classes[0].header.declaration, "module.exports = class Base;");
        assert_eq!(scope.classes[0].header.end_line, 0);
        assert_eq!(scope.functions.len(), 1);
    }

    #[test]
    fn test_class_with_methods() {
        let lines = [
            "class Foo extends Bar {",
            "  constructor(a) {",
            "    super(a);",
            "  }",
            "",
            "  baz(x) {",
            "    if (x) {",
            "      return 1;",
            "    }",
            "  }",
            "}",
        ];
        let scope = run(&lines);

        assert_eq!(scope.classes.len(), 1);
        let class = &scope.classes[0];
        assert_eq!(class.name, "Foo");
        assert!(class.is_child);
        assert_eq!(class.header.end_line, 10);

        let headers: Vec<_> = class.functions.iter().map(|f| f.header.declaration.as_str()).collect();
        assert_eq!(headers, vec!["constructor(a) {", "baz(x) {"]);
        assert!(class.functions[0].is_constructor);
        assert!(!class.functions[1].is_constructor);
    }

    #[test]
    fn test_control_flow_in_class_body_is_skipped() {
        let lines = ["class A {", "  static {", "    if (ready()) {", "    }", "  }", "  run() {}", "}"];
        let scope = run(&lines);

        let headers: Vec<_> = scope.classes[0]
            .functions
            .iter()
            .map(|f| f.header.declaration.as_str())
            .collect();
        assert_eq!(headers, vec!["run() {"]);
    }

    #[test]
    fn test_skipped_block_chains_else() {
        let lines = [
            "if (a) {",
            "  function inner() {}",
            "} else {",
            "  function other() {}",
            "}",
            "function after() {}",
        ];
        let scope = run(&lines);

        assert_eq!(scope.functions.len(), 1);
        assert_eq!(scope.functions[0].header.declaration, "function after() {");
    }

    #[test]
    fn test_var_shapes() {
        let lines = [
            "var a = 1;",
            "var b = function(x) {",
            "  return x;",
            "};",
            "var c = {",
            "  d: 1",
            "};",
            "var e = foo(1,",
            "  2);",
        ];
        let scope = run(&lines);

        assert_eq!(scope.vars.len(), 1);
        assert_eq!(scope.vars[0].header.declaration, "var c = {");
        assert_eq!(scope.vars[0].header.end_line, 6);
        assert_eq!(scope.functions.len(), 1);
        assert_eq!(scope.functions[0].header.declaration, "var b = function(x) {");
        assert_eq!(scope.functions[0].header.end_line, 3);
    }

    #[test]
    fn test_var_brace_on_next_line() {
        let lines = ["var config =", "{", "  a: 1", "};"];
        let scope = run(&lines);

        assert_eq!(scope.vars.len(), 1);
        assert_eq!(scope.vars[0].header.declaration, "var config ={");
        assert_eq!(scope.vars[0].properties.len(), 1);
    }

    #[test]
    fn test_arrow_var_body_is_opaque() {
        let lines = ["const handler = (e) => {", "  const inner = {", "    a: 1", "  };", "};"];
        let scope = run(&lines);

        assert_eq!(scope.vars.len(), 1);
        assert!(scope.vars[0].functions.is_empty());
        assert!(scope.vars[0].properties.is_empty());
        assert_eq!(scope.vars[0].header.end_line, 4);
    }

    #[test]
    fn test_multi_line_parameters() {
        let lines = ["function f(a,", "    b) {", "  return a + b;", "}", "function g() {}"];
        let scope = run(&lines);

        assert_eq!(scope.functions.len(), 2);
        assert_eq!(scope.functions[0].header.declaration, "function f(a,b) {");
        assert_eq!(scope.functions[0].header.end_line, 3);
    }

    #[test]
    fn test_class_member_continuation() {
        let lines = [
            "class Foo {",
            "}",
            "Foo.create = function(opts) {",
            "  return new Foo(opts);",
            "};",
            "Foo.defaults = {",
            "  size: 3",
            "};",
            "Foo.VERSION = '1.0';",
        ];
        let scope = run(&lines);
        let class = &scope.classes[0];

        assert_eq!(class.member_functions.len(), 1);
        assert_eq!(class.member_functions[0].header.declaration, "Foo.create = function(opts) {");
        assert_eq!(class.member_properties.len(), 2);
        assert_eq!(class.member_properties[0].properties.len(), 1);
        assert_eq!(class.member_properties[1].header.declaration, "Foo.VERSION = '1.0';");
        assert!(scope.functions.is_empty());
    }

    #[test]
    fn test_anonymous_class_gets_no_members() {
        let lines = ["export default class {", "}", ".x = 1;"];
        let scope = run(&lines);
        assert!(scope.classes[0].is_anonymous());
        assert!(scope.classes[0].member_properties.is_empty());
    }

    #[test]
    fn test_closure_return() {
        let lines = [
            "define(['dep'], function(dep) {",
            "  function helper() {",
            "    return 1;",
            "  }",
            "  return {",
            "    helper: helper",
            "  };",
            "});",
        ];
        let scope = run(&lines);

        assert!(scope.in_closure);
        assert_eq!(scope.closure_return.as_deref(), Some("return {};"));
        assert_eq!(scope.functions.len(), 1);
    }

    #[test]
    fn test_closure_returning_class() {
        let lines = ["define([], function() {", "  return class Foo {", "  };", "});"];
        let scope = run(&lines);

        assert!(scope.in_closure);
        assert!(scope.closure_return.is_none());
        assert_eq!(scope.classes[0].name, "Foo");
    }

    #[test]
    fn test_return_outside_closure_is_ignored() {
        let scope = run(&["return x;"]);
        assert!(!scope.in_closure);
        assert!(scope.closure_return.is_none());
    }

    #[test]
    fn test_loose_tags_attach_to_next_declaration() {
        let lines = ["/** Doc. */", "@abstract", "function f() {}"];
        let scope = run(&lines);

        let function = &scope.functions[0];
        assert_eq!(function.tags, vec!["@abstract"]);
        assert!(function.comment.is_some());
    }

    #[test]
    fn test_reserved_header_is_not_a_function() {
        let lines = ["for (var i = 0; i < n; i++) {", "  Foo.prototype.x = function() {};", "}"];
        let scope = run(&lines);
        assert!(scope.functions.is_empty());
    }

    #[test]
    fn test_unterminated_nested_block_fails() {
        let lines = ["var x = {", "  a: function() {", "};"];
        let mut pool = CommentPool::collect(&lines);
        let err = Extractor::new(&lines, &mut pool).extract_top_level().unwrap_err();
        assert!(matches!(err, ExtractError::UnterminatedBlock { .. }));
    }
}
