//! Object literal properties.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::extractor::Extractor;
use super::{ExtractError, PropertyDeclaration, PropertyValue};
use crate::scan::delimiters::{closing_string, find_block};

static SHORTHAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\.\.\.)?[\w$]+$").expect("SHORTHAND regex is invalid"));

impl Extractor<'_, '_> {
    /// `key: value` entries of an object body.
    ///
    /// Lines containing `=>` are skipped with their bodies. Each value is
    /// classified by its first token; nested object literals recurse over
    /// their own line range.
    pub(super) fn extract_properties(&mut self, range: Range<usize>) -> Result<Vec<PropertyDeclaration>, ExtractError> {
        let mut properties = Vec::new();
        let mut loose_tags = Vec::new();
        let mut index = range.start;

        while let Some(current) = self.next_significant(index, range.end, &mut loose_tags) {
            index = current + 1;
            let line = self.lines[current].trim();

            if line.contains("=>") {
                index = self.skip_block(current)? + 1;
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let comment = self.take_comment(current, &loose_tags);
                loose_tags.clear();

                let (value, end_line) = self.property_value(current, value.trim())?;
                index = end_line + 1;
                trace!(line = current, key = key.trim(), "property");

                properties.push(PropertyDeclaration {
                    comment,
                    key: key.trim().to_string(),
                    value: Some(value),
                });
            } else if line.contains('{') {
                index = self.skip_block(current)? + 1;
            } else {
                let key = line.trim_end_matches(',').trim();
                if !SHORTHAND.is_match(key) {
                    continue;
                }

                let comment = self.take_comment(current, &loose_tags);
                loose_tags.clear();
                properties.push(PropertyDeclaration {
                    comment,
                    key: key.to_string(),
                    value: None,
                });
            }
        }

        Ok(properties)
    }

    /// Classify the value of the property on `line` and find where it ends.
    fn property_value(&mut self, line: usize, value: &str) -> Result<(PropertyValue, usize), ExtractError> {
        if value.starts_with("function") || value.starts_with("async function") {
            let end_line = self.body_block(line)?.map_or(line, |b| b.close.line);
            let mut header = value.to_string();
            if !closing_string(&header).starts_with('}') {
                if let Some(brace) = header.find('{') {
                    header.truncate(brace + 1);
                }
            }
            let closing = closing_string(&header);
            header.push_str(&closing);

            return Ok((PropertyValue::Function(header), end_line));
        }

        let block = find_block(self.lines, line)?;
        let scalar = value.strip_suffix(',').unwrap_or(value);

        Ok(match block {
            Some(body) if value.starts_with('{') => {
                let nested = self.extract_properties(body.inner_lines())?;
                (PropertyValue::Object(nested), body.close.line)
            }
            Some(body) if value.starts_with('[') => (PropertyValue::Array, body.close.line),
            Some(body) => {
                let closed = format!("{scalar}{}", closing_string(scalar));
                (PropertyValue::Scalar(closed), body.close.line)
            }
            // A literal that opens and closes on one line keeps its text.
            None if value.starts_with('[') => (PropertyValue::Array, line),
            None => (PropertyValue::Scalar(scalar.to_string()), line),
        })
    }
}
