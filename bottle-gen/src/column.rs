//! # Column Module
//!
//! Introspected column metadata and its conversion into a [`Field`].
//!
//! A [`Column`] is immutable once the schema reader hands it over. Conversion
//! goes through a [`BoundColumn`], which borrows the configured type mapper and
//! JSON tag strategy for the duration of the conversion instead of storing
//! them on the column.

use serde::Serialize;

use crate::{
    field::{tag_key, Field, TagMap},
    naming::NameFn,
    soft_delete::SOFT_DELETE_TIME_TYPE,
    types::{unsigned_form, TypeMapper},
};

// ============================================================================
// Raw Metadata
// ============================================================================

/// Raw type information reported by the schema reader for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnType {
    /// The column name in the database.
    pub name: String,
    /// The database type name (`INT`, `VARCHAR`, `timestamptz`).
    pub database_type_name: String,
    /// The full native type, when the driver reports it (`int unsigned`, `varchar(64)`).
    pub column_type: Option<String>,
    pub nullable: bool,
    /// Default value expression, if the column has one.
    pub default_value: Option<String>,
    /// `false` for unsigned numeric columns.
    pub signed: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub comment: Option<String>,
}

impl ColumnType {
    pub fn new(name: impl Into<String>, database_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_type_name: database_type_name.into(),
            column_type: None,
            nullable: false,
            default_value: None,
            signed: true,
            primary_key: false,
            auto_increment: false,
            comment: None,
        }
    }

    pub fn with_column_type(mut self, column_type: Option<String>) -> Self {
        if let Some(ty) = &column_type {
            if ty.to_ascii_lowercase().contains("unsigned") {
                self.signed = false;
            }
        }
        self.column_type = column_type;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    pub fn primary_key(mut self, auto_increment: bool) -> Self {
        self.primary_key = true;
        self.auto_increment = auto_increment;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }
}

/// An index the column takes part in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub primary: bool,
    /// 1-based position of the column inside the index.
    pub priority: u32,
}

// ============================================================================
// Column
// ============================================================================

/// One column of an introspected table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub table_name: String,
    pub column_type: ColumnType,
    pub indexes: Vec<Index>,
}

impl Column {
    pub fn new(table_name: impl Into<String>, column_type: ColumnType) -> Self {
        Self { table_name: table_name.into(), column_type, indexes: Vec::new() }
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn name(&self) -> &str {
        &self.column_type.name
    }

    /// Binds the lookup functions used to resolve this column's type and JSON tag.
    pub fn bind<'a>(&'a self, types: &'a TypeMapper, json_tag: Option<&'a NameFn>) -> BoundColumn<'a> {
        BoundColumn { column: self, types, json_tag }
    }
}

/// Nullability, sign and soft-delete policy applied by [`BoundColumn::to_field`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldPolicy<'a> {
    pub nullable: bool,
    pub coverable: bool,
    pub signable: bool,
    pub with_index_tag: bool,
    pub soft_delete_time_column: Option<&'a str>,
}

/// A column together with the type mapper and JSON tag strategy it is
/// converted with.
#[derive(Clone, Copy)]
pub struct BoundColumn<'a> {
    column: &'a Column,
    types: &'a TypeMapper,
    json_tag: Option<&'a NameFn>,
}

impl<'a> BoundColumn<'a> {
    pub fn column(&self) -> &'a Column {
        self.column
    }

    /// The mapped Rust type before any policy is applied.
    pub fn data_type(&self) -> String {
        self.types.map(&self.column.column_type)
    }

    pub fn json_tag(&self) -> String {
        let name = self.column.name();
        match self.json_tag {
            Some(ns) => ns(name),
            None => name.to_string(),
        }
    }

    /// Converts the column into a [`Field`].
    ///
    /// The soft-delete time column always becomes
    /// [`SOFT_DELETE_TIME_TYPE`]. Otherwise the type is wrapped in `Option`
    /// when the column has a default and `coverable` is set, or when it is
    /// nullable and `nullable` is set.
    pub fn to_field(&self, policy: &FieldPolicy<'_>) -> Field {
        let col = &self.column.column_type;

        let mut ty = self.data_type();
        if policy.signable && !col.signed {
            if let Some(unsigned) = unsigned_form(&ty) {
                ty = unsigned;
            }
        }

        if policy.soft_delete_time_column == Some(col.name.as_str()) {
            ty = SOFT_DELETE_TIME_TYPE.to_string();
        } else if (policy.coverable && col.has_default()) || (policy.nullable && col.nullable) {
            if !ty.starts_with("Option<") {
                ty = format!("Option<{}>", ty);
            }
        }

        let mut field = Field::new(col.name.clone(), ty);
        field.column_name = col.name.clone();
        field.comment = col.comment.clone().unwrap_or_default();
        field.tags = self.build_column_tag(policy.with_index_tag);
        field.struct_tags.set(tag_key::JSON, self.json_tag());
        field
    }

    fn build_column_tag(&self, with_index_tag: bool) -> TagMap {
        let col = &self.column.column_type;
        let mut tags = TagMap::new();
        tags.set(tag_key::COLUMN, col.name.clone());
        if let Some(column_type) = &col.column_type {
            tags.set(tag_key::TYPE, column_type.clone());
        }

        if col.primary_key {
            tags.set(tag_key::PRIMARY_KEY, "");
            if col.auto_increment {
                tags.set(tag_key::AUTO_INCREMENT, "true");
            }
        } else if !col.nullable {
            tags.set(tag_key::NOT_NULL, "");
        }

        if with_index_tag {
            for idx in self.column.indexes.iter().filter(|idx| !idx.primary) {
                let key = if idx.unique { tag_key::UNIQUE_INDEX } else { tag_key::INDEX };
                tags.append(key, format!("{},priority:{}", idx.name, idx.priority));
            }
        }

        if let Some(default) = col.default_value.as_deref().filter(|_| !col.primary_key) {
            tags.set(tag_key::DEFAULT, default);
        }
        if let Some(comment) = col.comment.as_deref().filter(|c| !c.is_empty()) {
            tags.set(tag_key::COMMENT, format!("'{}'", comment.replace('\'', "\\'")));
        }
        tags
    }
}
