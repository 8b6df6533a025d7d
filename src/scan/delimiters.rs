//! Delimiter matching and closing-string synthesis.
//!
//! The matcher is comment and string aware but deliberately shallow: quotes
//! are never escaped, so `"a\"b"` ends the literal at the backslash-quote.
//! String state is line scoped, block comments persist across lines.

use smallvec::SmallVec;
use tracing::trace;

use crate::extract::ExtractError;

/// A nestable delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `{` / `}`
    Brace,
    /// `[` / `]`
    Bracket,
    /// `(` / `)`
    Paren,
}

impl Delimiter {
    /// Opening byte of the pair.
    pub fn open(self) -> u8 {
        match self {
            Delimiter::Brace => b'{',
            Delimiter::Bracket => b'[',
            Delimiter::Paren => b'(',
        }
    }

    /// Closing byte of the pair.
    pub fn close(self) -> u8 {
        match self {
            Delimiter::Brace => b'}',
            Delimiter::Bracket => b']',
            Delimiter::Paren => b')',
        }
    }

    /// The pair opened by `byte`, if any.
    pub fn from_open(byte: u8) -> Option<Self> {
        match byte {
            b'{' => Some(Delimiter::Brace),
            b'[' => Some(Delimiter::Bracket),
            b'(' => Some(Delimiter::Paren),
            _ => None,
        }
    }

    fn from_close(byte: u8) -> Option<Self> {
        match byte {
            b'}' => Some(Delimiter::Brace),
            b']' => Some(Delimiter::Bracket),
            b')' => Some(Delimiter::Paren),
            _ => None,
        }
    }
}

/// Zero-indexed line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A matched delimiter pair spanning one or more lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub open: Position,
    pub close: Position,
    pub delimiter: Delimiter,
}

impl Block {
    /// Lines strictly between the opening and closing lines.
    pub fn inner_lines(&self) -> std::ops::Range<usize> {
        (self.open.line + 1)..self.close.line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    Str(u8),
}

/// Per-byte lexical state.
#[derive(Debug)]
struct Lexer {
    mode: Mode,
    prev: u8,
}

impl Lexer {
    fn new() -> Self {
        Self {
            mode: Mode::Code,
            prev: 0,
        }
    }

    /// Line comments and string literals end with the line.
    fn start_line(&mut self) {
        if self.mode != Mode::BlockComment {
            self.mode = Mode::Code;
        }
        self.prev = 0;
    }

    /// Feed one byte. Returns true when the byte is code.
    fn step(&mut self, byte: u8) -> bool {
        let prev = self.prev;
        self.prev = byte;

        match self.mode {
            Mode::BlockComment => {
                if prev == b'*' && byte == b'/' {
                    self.mode = Mode::Code;
                    self.prev = 0;
                }
                false
            }
            Mode::LineComment => false,
            Mode::Str(quote) => {
                if byte == quote {
                    self.mode = Mode::Code;
                }
                false
            }
            Mode::Code => match byte {
                b'"' | b'\'' => {
                    self.mode = Mode::Str(byte);
                    false
                }
                b'/' if prev == b'/' => {
                    self.mode = Mode::LineComment;
                    false
                }
                b'*' if prev == b'/' => {
                    self.mode = Mode::BlockComment;
                    self.prev = 0;
                    false
                }
                _ => true,
            },
        }
    }
}

/// Find where the delimiter opened at `start` is closed.
///
/// Scans forward across lines from `start`, which must point at the opening
/// byte of `delimiter`; a start that is not an opener resolves to itself.
/// Delimiters inside string literals and comments are ignored.
///
/// # Errors
///
/// [`ExtractError::UnterminatedBlock`] when the document ends with the
/// nesting depth still positive.
pub fn match_delimiter<S: AsRef<str>>(
    lines: &[S],
    start: Position,
    delimiter: Delimiter,
) -> Result<Position, ExtractError> {
    let starts_on_opener = lines
        .get(start.line)
        .and_then(|line| line.as_ref().as_bytes().get(start.column))
        .is_some_and(|&b| b == delimiter.open());
    if !starts_on_opener {
        return Ok(start);
    }

    let (open, close) = (delimiter.open(), delimiter.close());
    let mut lexer = Lexer::new();
    let mut depth: usize = 0;

    for (line_index, line) in lines.iter().enumerate().skip(start.line) {
        lexer.start_line();
        let first_column = if line_index == start.line { start.column } else { 0 };

        for (column, &byte) in line.as_ref().as_bytes().iter().enumerate().skip(first_column) {
            if !lexer.step(byte) {
                continue;
            }
            if byte == open {
                depth += 1;
                trace!(depth, line = line_index, column, "depth increments");
            } else if byte == close {
                depth = depth.saturating_sub(1);
                trace!(depth, line = line_index, column, "depth decrements");
                if depth == 0 {
                    return Ok(Position::new(line_index, column));
                }
            }
        }
    }

    Err(ExtractError::UnterminatedBlock { line: start.line })
}

/// Closing tokens needed to balance the delimiters `line` leaves open.
///
/// Comments and strings are not considered. Any closer pops the stack
/// regardless of its kind, so `([)]` yields an empty string rather than an
/// error.
///
/// ```
/// use jsstub::scan::closing_string;
///
/// assert_eq!(closing_string("foo(function() {"), "})");
/// assert_eq!(closing_string("a[0] = {b: [1, 2]}"), "");
/// ```
pub fn closing_string(line: &str) -> String {
    let mut stack: SmallVec<[Delimiter; 16]> = SmallVec::new();

    for byte in line.bytes() {
        if let Some(delimiter) = Delimiter::from_open(byte) {
            stack.push(delimiter);
        } else if Delimiter::from_close(byte).is_some() {
            stack.pop();
        }
    }

    stack.iter().rev().map(|d| d.close() as char).collect()
}

/// The outermost delimiter `line` opens and leaves unclosed.
///
/// Lexically aware, so a brace inside a trailing comment or string literal
/// does not count. Closers pop permissively, as in [`closing_string`].
pub fn unclosed_opener(line: &str) -> Option<(usize, Delimiter)> {
    let mut lexer = Lexer::new();
    let mut stack: SmallVec<[(usize, Delimiter); 16]> = SmallVec::new();

    for (column, byte) in line.bytes().enumerate() {
        if !lexer.step(byte) {
            continue;
        }
        if let Some(delimiter) = Delimiter::from_open(byte) {
            stack.push((column, delimiter));
        } else if Delimiter::from_close(byte).is_some() {
            stack.pop();
        }
    }

    stack.first().copied()
}

fn line_at<S: AsRef<str>>(lines: &[S], index: usize) -> Option<&str> {
    lines.get(index).map(|line| line.as_ref())
}

/// Locate and match the body opened by the header on `line`.
///
/// The body is the outermost delimiter the header leaves unclosed. A header
/// that leaves nothing open may still be followed by a line starting with
/// `{` (the brace-on-next-line style). Anything else is a single-line
/// construct and yields `None`.
pub fn find_block<S: AsRef<str>>(lines: &[S], line: usize) -> Result<Option<Block>, ExtractError> {
    let Some(header) = line_at(lines, line) else {
        return Ok(None);
    };

    let open = match unclosed_opener(header) {
        Some((column, delimiter)) => Some((Position::new(line, column), delimiter)),
        None if !header.trim_end().ends_with(';') => line_at(lines, line + 1)
            .filter(|next| next.trim_start().starts_with('{'))
            .and_then(|next| next.find('{'))
            .map(|column| (Position::new(line + 1, column), Delimiter::Brace)),
        None => None,
    };

    let Some((open, delimiter)) = open else {
        return Ok(None);
    };

    let close = match_delimiter(lines, open, delimiter)?;
    Ok(Some(Block {
        open,
        close,
        delimiter,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced(line: &str) -> bool {
        let mut depth = 0i32;
        for byte in line.bytes() {
            if Delimiter::from_open(byte).is_some() {
                depth += 1;
            } else if Delimiter::from_close(byte).is_some() {
                depth -= 1;
            }
        }
        depth == 0
    }

    #[test]
    fn test_match_single_line() {
        let lines = ["foo() { return 1; }"];
        let end = match_delimiter(&lines, Position::new(0, 6), Delimiter::Brace).unwrap();
        assert_eq!(end, Position::new(0, 18));
    }

    #[test]
    fn test_match_nested_multi_line() {
        let lines = ["class Foo {", "  bar() {", "    return { a: 1 };", "  }", "}"];
        let end = match_delimiter(&lines, Position::new(0, 10), Delimiter::Brace).unwrap();
        assert_eq!(end, Position::new(4, 0));
    }

    #[test]
    fn test_match_ignores_string_literals() {
        let lines = ["x = {", "  a: \"}\",", "  b: '{'", "};"];
        let end = match_delimiter(&lines, Position::new(0, 4), Delimiter::Brace).unwrap();
        assert_eq!(end, Position::new(3, 0));
    }

    #[test]
    fn test_match_ignores_mixed_quotes() {
        let lines = ["x = {", "  a: \"it's }\",", "};"];
        let end = match_delimiter(&lines, Position::new(0, 4), Delimiter::Brace).unwrap();
        assert_eq!(end, Position::new(2, 0));
    }

    #[test]
    fn test_match_ignores_comments() {
        let lines = [
            "function f() {",
            "  // } not this one",
            "  /* nor }",
            "     this } */",
            "}",
        ];
        let end = match_delimiter(&lines, Position::new(0, 13), Delimiter::Brace).unwrap();
        assert_eq!(end, Position::new(4, 0));
    }

    #[test]
    fn test_line_comment_ends_with_line() {
        let lines = ["f() { // {", "}"];
        let end = match_delimiter(&lines, Position::new(0, 4), Delimiter::Brace).unwrap();
        assert_eq!(end, Position::new(1, 0));
    }

    #[test]
    fn test_match_brackets() {
        let lines = ["var a = [", "  [1, 2],", "  { b: [3] }", "];"];
        let end = match_delimiter(&lines, Position::new(0, 8), Delimiter::Bracket).unwrap();
        assert_eq!(end, Position::new(3, 0));
    }

    #[test]
    fn test_unterminated_block() {
        let lines = ["class Foo {", "  bar() {", "  }"];
        let err = match_delimiter(&lines, Position::new(0, 10), Delimiter::Brace).unwrap_err();
        assert!(matches!(err, ExtractError::UnterminatedBlock { line: 0 }));
    }

    #[test]
    fn test_start_not_on_opener_resolves_to_itself() {
        let lines = ["no braces here"];
        let end = match_delimiter(&lines, Position::new(0, 3), Delimiter::Brace).unwrap();
        assert_eq!(end, Position::new(0, 3));
    }

    #[test]
    fn test_closing_string() {
        assert_eq!(closing_string("function foo() {"), "}");
        assert_eq!(closing_string("define(['a'], function(a) {"), "})");
        assert_eq!(closing_string("x = [{"), "}]");
        assert_eq!(closing_string("bar() { return 1; }"), "");
        assert_eq!(closing_string(""), "");
    }

    #[test]
    fn test_closing_string_is_permissive_on_mismatch() {
        assert_eq!(closing_string("([)]"), "");
        assert_eq!(closing_string("(]{"), "}");
    }

    #[test]
    fn test_closing_string_balances_truncated_lines() {
        let samples = [
            "Foo.prototype.bar = function(a, b) {",
            "var x = foo({ a: [1, {",
            "return new Promise((resolve) => {",
            "if (a[0] && (b",
        ];
        for line in samples {
            let closed = format!("{}{}", line, closing_string(line));
            assert!(balanced(&closed), "not balanced: {closed}");
        }
    }

    #[test]
    fn test_unclosed_opener() {
        assert_eq!(unclosed_opener("class Foo {"), Some((10, Delimiter::Brace)));
        assert_eq!(unclosed_opener("var x = foo({"), Some((11, Delimiter::Paren)));
        assert_eq!(unclosed_opener("var x = { a: {"), Some((8, Delimiter::Brace)));
        assert_eq!(unclosed_opener("bar() { return 1; }"), None);
        assert_eq!(unclosed_opener("x = 1; // {"), None);
        assert_eq!(unclosed_opener("x = '{';"), None);
    }

    #[test]
    fn test_find_block_brace_on_next_line() {
        let lines = ["function foo()", "{", "  return 1;", "}"];
        let block = find_block(&lines, 0).unwrap().unwrap();
        assert_eq!(block.open, Position::new(1, 0));
        assert_eq!(block.close, Position::new(3, 0));
        assert_eq!(block.inner_lines(), 2..3);
    }

    #[test]
    fn test_find_block_single_line() {
        let lines = ["var x = 1;", "{"];
        assert!(find_block(&lines, 0).unwrap().is_none());

        let lines = ["function foo() { return 1; }"];
        assert!(find_block(&lines, 0).unwrap().is_none());
    }
}
