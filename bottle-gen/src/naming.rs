//! # Naming Module
//!
//! Naming strategies translate raw database identifiers (table and column
//! names) into the identifiers used by generated code.
//!
//! Every strategy goes through the single [`NamingStrategy`] capability. The
//! [`DefaultNamingStrategy`] is just one implementation; plain closures work
//! as well, so call sites never need to know which strategy is in use.

// ============================================================================
// External Crate Imports
// ============================================================================

use heck::ToSnakeCase;
use std::sync::Arc;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{Error, Result};

/// Closure-based strategy used by the config for table, model, file and JSON
/// tag naming overrides.
pub type NameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Words rendered fully upper-case when they form a whole segment of an
/// identifier (`user_id` becomes `UserID`).
const COMMON_INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID", "IP", "JSON",
    "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS", "TTL", "UDP", "UI", "UID",
    "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

// ============================================================================
// NamingStrategy Trait
// ============================================================================

/// Maps a raw database identifier to a target source identifier.
///
/// Implemented by [`DefaultNamingStrategy`] and by any
/// `Fn(&str) -> String + Send + Sync` closure.
pub trait NamingStrategy: Send + Sync {
    /// Returns the struct name for a raw identifier (`users` -> `User`).
    fn schema_name(&self, raw: &str) -> String;

    /// Returns the struct field name for a column.
    ///
    /// Field names are always resolved with singular-table semantics: the
    /// identifier is case-converted but never singularized.
    fn field_name(&self, raw: &str) -> String {
        self.schema_name(raw)
    }

    /// Returns the column name a struct field maps back to.
    fn column_name(&self, field: &str) -> String {
        field.to_snake_case()
    }
}

impl<F> NamingStrategy for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn schema_name(&self, raw: &str) -> String {
        self(raw)
    }
}

// ============================================================================
// Default Strategy
// ============================================================================

/// Case-converting strategy with optional table prefix and pluralization
/// handling.
///
/// * the table prefix is trimmed before conversion
/// * unless `singular_table` is set, table names are singularized before
///   they become struct names
/// * each `_`-separated segment is capitalized; common initialisms are
///   upper-cased
#[derive(Debug, Clone, Default)]
pub struct DefaultNamingStrategy {
    pub table_prefix: String,
    pub singular_table: bool,
}

impl DefaultNamingStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn singular_table(mut self, singular: bool) -> Self {
        self.singular_table = singular;
        self
    }

    fn trim_prefix<'a>(&self, raw: &'a str) -> &'a str {
        raw.strip_prefix(self.table_prefix.as_str()).unwrap_or(raw)
    }
}

impl NamingStrategy for DefaultNamingStrategy {
    fn schema_name(&self, raw: &str) -> String {
        let name = self.trim_prefix(raw);
        if self.singular_table {
            return to_schema_name(name);
        }
        to_schema_name(&pluralizer::pluralize(name, 1, false))
    }

    /// Column names carry no table prefix, so nothing is trimmed here.
    fn field_name(&self, raw: &str) -> String {
        to_schema_name(raw)
    }
}

/// Converts `snake_case`, `camelCase` or already capitalized identifiers to
/// struct style. Words are split by `heck`; common initialisms are upper-cased
/// (`userId` and `user_id` both become `UserID`).
pub fn to_schema_name(name: &str) -> String {
    let snake = name.to_snake_case();
    let mut out = String::with_capacity(snake.len());
    for word in snake.split('_').filter(|w| !w.is_empty()) {
        let upper = word.to_ascii_uppercase();
        if COMMON_INITIALISMS.contains(&upper.as_str()) {
            out.push_str(&upper);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

// ============================================================================
// Identifier Validation
// ============================================================================

/// Checks an explicitly supplied struct or field name.
///
/// The name must be non-empty, made of word characters (`[A-Za-z0-9_]`) and
/// start with an upper-case ASCII letter.
///
/// # Example
///
/// ```rust
/// use bottle_gen::naming::check_struct_name;
///
/// assert!(check_struct_name("MyField").is_ok());
/// assert!(check_struct_name("myField").is_err());
/// assert!(check_struct_name("My-Field").is_err());
/// ```
pub fn check_struct_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(name, "name cannot be empty"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::validation(name, "name cannot contain invalid characters"));
    }
    if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
        return Err(Error::validation(name, "name must start with a capital letter"));
    }
    Ok(())
}
