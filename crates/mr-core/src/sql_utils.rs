//! SQL identifier validation and quoting utilities
//!
//! Database and table names cannot be passed as bind parameters, so every
//! identifier that ends up inside dynamic SQL is first checked against a
//! strict allow-list and then quoted.

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use std::sync::OnceLock;

/// Longest identifier accepted by [`validate_identifier`].
pub const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();
static CATALOG_RE: OnceLock<Regex> = OnceLock::new();

fn identifier_re() -> &'static Regex {
    IDENTIFIER_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

fn catalog_re() -> &'static Regex {
    CATALOG_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_-]*$").expect("valid regex"))
}

/// Check that `value` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// `kind` names the identifier in the error message (e.g. "database").
///
/// # Examples
/// ```
/// use mr_core::sql_utils::validate_identifier;
/// assert!(validate_identifier("table", "versions").is_ok());
/// assert!(validate_identifier("table", "versions; DROP TABLE t").is_err());
/// ```
pub fn validate_identifier(kind: &'static str, value: &str) -> CoreResult<()> {
    check_pattern(
        kind,
        value,
        identifier_re(),
        "only ASCII letters, digits and '_' are allowed, and it must not start with a digit",
    )
}

/// Check a database (catalog) name.
///
/// DuckDB names a file-backed catalog after the file stem, so names such as
/// `my-app` or `2024` are accepted. Quotes, dots, whitespace and `;` are not.
///
/// # Examples
/// ```
/// use mr_core::sql_utils::validate_catalog_name;
/// assert!(validate_catalog_name("my-app").is_ok());
/// assert!(validate_catalog_name("my app").is_err());
/// ```
pub fn validate_catalog_name(value: &str) -> CoreResult<()> {
    check_pattern(
        "database",
        value,
        catalog_re(),
        "only ASCII letters, digits, '_' and '-' are allowed, and it must not start with '-'",
    )
}

fn check_pattern(
    kind: &'static str,
    value: &str,
    pattern: &Regex,
    pattern_reason: &str,
) -> CoreResult<()> {
    let reject = |reason: &str| CoreError::InvalidIdentifier {
        kind,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(reject("must not be empty"));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(reject(&format!(
            "longer than {} characters",
            MAX_IDENTIFIER_LEN
        )));
    }
    if !pattern.is_match(value) {
        return Err(reject(pattern_reason));
    }
    Ok(())
}

/// Validate a potentially schema-qualified name, component by component.
pub fn validate_qualified(kind: &'static str, name: &str) -> CoreResult<()> {
    if name.split('.').count() > 2 {
        return Err(CoreError::InvalidIdentifier {
            kind,
            value: name.to_string(),
            reason: "expected 'table' or 'schema.table'".to_string(),
        });
    }
    name.split('.')
        .try_for_each(|part| validate_identifier(kind, part))
}

/// Quote a SQL identifier to prevent injection.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use mr_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("versions"), r#""versions""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Split a potentially schema-qualified table name into (schema, table).
///
/// Uses the last `.` as the separator. If no `.` is present, returns
/// `("main", name)` as the default schema.
///
/// # Examples
/// ```
/// use mr_core::sql_utils::split_qualified_name;
/// assert_eq!(split_qualified_name("versions"), ("main", "versions"));
/// assert_eq!(split_qualified_name("meta.versions"), ("meta", "versions"));
/// ```
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    if let Some(pos) = name.rfind('.') {
        (&name[..pos], &name[pos + 1..])
    } else {
        ("main", name)
    }
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
