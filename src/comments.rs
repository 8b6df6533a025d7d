//! Documentation comment collection and matching.
//!
//! All `/** ... */` blocks of a file are collected once, up front, into a
//! [`CommentPool`]. Extraction then claims blocks out of the pool as it meets
//! the declarations they precede; whatever is left afterwards belongs to the
//! file as a whole.

use serde::Serialize;

/// A documentation comment and the annotation tags found inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentBlock {
    /// First line of the block (the `/**` line), zero-indexed.
    pub start_line: usize,
    /// Last line of the block (the `*/` line), inclusive.
    pub end_line: usize,
    /// Tag lines in order of appearance, e.g. `@param {string} name`.
    pub tags: Vec<String>,
}

impl CommentBlock {
    /// Check whether any tag line starts with the annotation `tag`.
    ///
    /// ```
    /// use jsstub::comments::CommentBlock;
    ///
    /// let block = CommentBlock {
    ///     start_line: 0,
    ///     end_line: 2,
    ///     tags: vec!["@private".into(), "@param {int} x".into()],
    /// };
    /// assert!(block.has_tag("@private"));
    /// assert!(block.has_tag("@param"));
    /// assert!(!block.has_tag("@classdesc"));
    /// ```
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .iter()
            .any(|t| t.split_whitespace().next() == Some(tag))
    }

    /// The comment's source lines, trimmed.
    pub fn source_lines<'a, S: AsRef<str>>(&self, lines: &'a [S]) -> impl Iterator<Item = &'a str> {
        let end = (self.end_line + 1).min(lines.len());
        let start = self.start_line.min(end);
        lines[start..end].iter().map(|line| line.as_ref().trim())
    }
}

/// Scan the comment block opening on `start` and collect its tags.
///
/// The block ends on the first line containing `*/`. A block that is never
/// closed runs to the end of the document.
pub fn scan_comment_block<S: AsRef<str>>(lines: &[S], start: usize) -> CommentBlock {
    let mut tags = Vec::new();
    let mut end_line = lines.len().saturating_sub(1).max(start);

    for (index, line) in lines.iter().enumerate().skip(start) {
        let line = line.as_ref().trim();
        let (text, closes) = match line.find("*/") {
            Some(pos) => (&line[..pos], true),
            None => (line, false),
        };

        let text = text.trim_start_matches("/**").trim_start_matches('*').trim();
        if text.starts_with('@') {
            tags.push(text.to_string());
        }

        if closes {
            end_line = index;
            break;
        }
    }

    CommentBlock {
        start_line: start,
        end_line,
        tags,
    }
}

/// The pool of unclaimed documentation comments for one file.
#[derive(Debug, Default)]
pub struct CommentPool {
    blocks: Vec<CommentBlock>,
}

impl CommentPool {
    /// Collect every documentation comment block in the document.
    pub fn collect<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut blocks = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            if lines[index].as_ref().trim_start().starts_with("/**") {
                let block = scan_comment_block(lines, index);
                index = block.end_line + 1;
                blocks.push(block);
            } else {
                index += 1;
            }
        }

        Self { blocks }
    }

    /// Claim the comment that documents a declaration starting on
    /// `declaration_line`.
    ///
    /// `loose_tags` standalone tag lines sit between the comment and the
    /// declaration. A block matches when
    /// `(declaration_line - end_line) - (loose_tags + 1)` is 0 or 1, i.e. at
    /// most one blank line separates it from the tags and declaration. The
    /// first match is removed from the pool and returned.
    pub fn take_matching(&mut self, declaration_line: usize, loose_tags: usize) -> Option<CommentBlock> {
        let index = self.blocks.iter().position(|block| {
            let gap = declaration_line as i64 - block.end_line as i64 - (loose_tags as i64 + 1);
            gap == 0 || gap == 1
        })?;

        Some(self.blocks.remove(index))
    }

    /// Number of unclaimed blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if every block has been claimed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Unclaimed blocks in source order.
    pub fn iter(&self) -> impl Iterator<Item = &CommentBlock> {
        self.blocks.iter()
    }

    /// Consume the pool, yielding the unclaimed blocks.
    pub fn into_blocks(self) -> Vec<CommentBlock> {
        self.blocks
    }
}
