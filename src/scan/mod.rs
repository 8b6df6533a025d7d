//! Lexical primitives shared by the extractor.
//!
//! Nothing here builds a token stream. [`delimiters`] walks raw bytes with a
//! four-mode lexical state (code, line comment, block comment, string
//! literal) to balance nested delimiters across lines, and [`classify`]
//! recognizes header shapes with a small pattern table.

pub mod classify;
pub mod delimiters;

pub use classify::{classify_header, is_control_flow_header, HeaderKind};
pub use delimiters::{closing_string, find_block, match_delimiter, Block, Delimiter, Position};
