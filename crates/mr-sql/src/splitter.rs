//! Statement splitting for migration scripts
//!
//! Two conventions are supported:
//!
//! * [`StatementDelimiter::Semicolon`] (default): the script is tokenized with
//!   the sqlparser DuckDB tokenizer and split on top-level `;` tokens, so
//!   semicolons inside string literals, quoted identifiers and comments never
//!   split a statement.
//! * [`StatementDelimiter::Marker`]: the script is split literally on a
//!   dedicated marker string. Nothing about the SQL is interpreted.
//!
//! Segments that hold only whitespace (and, for semicolon splitting, only
//! comments) are dropped.
//!
//! The sqlparser tokenizer is close to DuckDB's lexer but not identical:
//!
//! * backslash escapes in `E'...'` strings are not recognised, so
//!   `E'a\';b'` ends the literal early and the script fails with
//!   [`SqlError::Tokenize`];
//! * block comments do not nest, so `/* a /* b */ ; */` is cut at the inner
//!   `*/` and the trailing `*/` becomes a statement of its own.
//!
//! Scripts that rely on either should use a [`StatementDelimiter::Marker`].

use crate::error::{SqlError, SqlResult};
use sqlparser::dialect::DuckDbDialect;
use sqlparser::tokenizer::{Location, Token, Tokenizer};
use std::fmt;

/// How a script is cut into statements
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatementDelimiter {
    /// SQL-aware split on top-level semicolons
    #[default]
    Semicolon,
    /// Literal split on a marker string
    Marker(String),
}

impl StatementDelimiter {
    /// Build from the optional `delimiter` config value.
    ///
    /// `None` and `";"` select [`StatementDelimiter::Semicolon`].
    pub fn from_config(value: Option<&str>) -> Self {
        match value {
            None => Self::Semicolon,
            Some(v) if v.trim() == ";" => Self::Semicolon,
            Some(v) => Self::Marker(v.to_string()),
        }
    }
}

impl fmt::Display for StatementDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementDelimiter::Semicolon => write!(f, "';' (SQL-aware)"),
            StatementDelimiter::Marker(marker) => write!(f, "'{}'", marker),
        }
    }
}

/// A single executable statement cut from a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// Statement text, trimmed, without the delimiter
    pub sql: String,
    /// 1-based line in the script where the statement starts
    pub line: usize,
}

impl SqlStatement {
    fn new(sql: &str, line: usize) -> Self {
        Self {
            sql: sql.trim().to_string(),
            line,
        }
    }
}

/// Split script content into non-empty statements, in script order.
pub fn split_statements(
    content: &str,
    delimiter: &StatementDelimiter,
) -> SqlResult<Vec<SqlStatement>> {
    match delimiter {
        StatementDelimiter::Semicolon => split_on_semicolons(content),
        StatementDelimiter::Marker(marker) => Ok(split_on_marker(content, marker)),
    }
}

fn split_on_semicolons(content: &str) -> SqlResult<Vec<SqlStatement>> {
    let dialect = DuckDbDialect {};
    let tokens = Tokenizer::new(&dialect, content)
        .tokenize_with_location()
        .map_err(|e| SqlError::Tokenize {
            message: e.message,
            line: e.location.line as usize,
            column: e.location.column as usize,
        })?;

    let lines = LineIndex::new(content);
    let mut statements = Vec::new();
    let mut segment_start = 0;
    let mut first_token: Option<Location> = None;

    for tok in &tokens {
        match &tok.token {
            Token::SemiColon => {
                let end = lines.byte_offset(content, tok.span.start);
                if let Some(start) = first_token.take() {
                    statements.push(SqlStatement::new(
                        &content[segment_start..end],
                        start.line as usize,
                    ));
                }
                segment_start = end + 1;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => {
                if first_token.is_none() {
                    first_token = Some(tok.span.start);
                }
            }
        }
    }

    if let Some(start) = first_token {
        statements.push(SqlStatement::new(
            &content[segment_start..],
            start.line as usize,
        ));
    }

    Ok(statements)
}

fn split_on_marker(content: &str, marker: &str) -> Vec<SqlStatement> {
    let mut statements = Vec::new();
    let mut offset = 0;

    for segment in content.split(marker) {
        if !segment.trim().is_empty() {
            let leading = segment.len() - segment.trim_start().len();
            let line = content[..offset + leading].matches('\n').count() + 1;
            statements.push(SqlStatement::new(segment, line));
        }
        offset += segment.len() + marker.len();
    }

    statements
}

/// Byte offsets of line starts, for mapping tokenizer locations back into the source.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// Tokenizer locations are 1-based and count columns in chars.
    fn byte_offset(&self, content: &str, location: Location) -> usize {
        let line = (location.line as usize).saturating_sub(1);
        let Some(&line_start) = self.starts.get(line) else {
            return content.len();
        };
        let column = (location.column as usize).saturating_sub(1);
        content[line_start..]
            .char_indices()
            .nth(column)
            .map(|(i, _)| line_start + i)
            .unwrap_or(content.len())
    }
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod tests;
