//! # Types Module
//!
//! Maps database column types to the Rust types written into generated
//! models. A built-in table covers the common SQL types of PostgreSQL, MySQL
//! and SQLite; projects override single type names through a [`DataTypeMap`].

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{collections::HashMap, fmt, sync::Arc};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::column::ColumnType;

/// Custom mapping for one database type name.
pub type DataTypeFn = Arc<dyn Fn(&ColumnType) -> String + Send + Sync>;

/// Per-project overrides, keyed by lower-case database type name
/// (e.g. `"int"`, `"varchar"`, `"tinyint"`).
pub type DataTypeMap = HashMap<String, DataTypeFn>;

// ============================================================================
// TypeMapper
// ============================================================================

/// Maps a column's SQL type to the Rust type used in the generated model.
///
/// Overrides registered through [`crate::ConfigBuilder::with_data_type_map`]
/// win over the built-in table in [`default_rust_type`].
#[derive(Clone, Default)]
pub struct TypeMapper {
    overrides: DataTypeMap,
}

impl TypeMapper {
    pub fn new(overrides: DataTypeMap) -> Self {
        let overrides = overrides.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect();
        Self { overrides }
    }

    /// Returns the Rust type for `column`, before any nullability or sign policy
    /// is applied.
    pub fn map(&self, column: &ColumnType) -> String {
        let type_name = column.database_type_name.to_ascii_lowercase();
        match self.overrides.get(&type_name) {
            Some(mapping) => mapping(column),
            None => default_rust_type(&type_name, column.column_type.as_deref()),
        }
    }
}

impl fmt::Debug for TypeMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.overrides.keys().collect();
        keys.sort();
        f.debug_struct("TypeMapper").field("overrides", &keys).finish()
    }
}

// ============================================================================
// Default Type Table
// ============================================================================

/// Maps SQL types to their corresponding Rust types.
///
/// `type_name` is the lower-case database type name; `column_type` is the full
/// native type when the driver reports one (`tinyint(1)`, `int unsigned`).
/// Unknown types fall back to `String`.
pub fn default_rust_type(type_name: &str, column_type: Option<&str>) -> String {
    let ty = match type_name {
        "bool" | "boolean" => "bool",
        "tinyint" => {
            if column_type.is_some_and(|t| t.to_ascii_lowercase().starts_with("tinyint(1)")) {
                "bool"
            } else {
                "i8"
            }
        }
        "smallint" | "int2" | "smallserial" => "i16",
        "mediumint" | "int" | "integer" | "int4" | "serial" => "i32",
        "bigint" | "int8" | "bigserial" => "i64",
        "float" | "real" | "float4" => "f32",
        "double" | "double precision" | "float8" | "decimal" | "numeric" => "f64",
        "date" => "chrono::NaiveDate",
        "time" => "chrono::NaiveTime",
        "datetime" | "timestamp" | "timestamp without time zone" => "chrono::NaiveDateTime",
        "timestamptz" | "timestamp with time zone" => "chrono::DateTime<chrono::Utc>",
        "uuid" => "uuid::Uuid",
        "json" | "jsonb" => "serde_json::Value",
        "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" | "bytea" => "Vec<u8>",
        _ => "String",
    };
    ty.to_string()
}

/// Returns the unsigned form of a signed integer type (`i32` -> `u32`), or
/// `None` when `ty` is not one.
pub fn unsigned_form(ty: &str) -> Option<String> {
    match ty {
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => Some(format!("u{}", &ty[1..])),
        _ => None,
    }
}
