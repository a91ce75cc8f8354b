//! # Field Module
//!
//! The generation model: [`Field`] is one attribute of a generated struct,
//! derived from a database column or synthesized from a relationship.
//! Fields are created fresh for every generation run and handed to the
//! renderer in a stable order.

// ============================================================================
// External Crate Imports
// ============================================================================

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

// ============================================================================
// Tag Keys
// ============================================================================

/// Column tag keys understood by the renderer.
pub mod tag_key {
    pub const COLUMN: &str = "column";
    pub const TYPE: &str = "type";
    pub const PRIMARY_KEY: &str = "primaryKey";
    pub const AUTO_INCREMENT: &str = "autoIncrement";
    pub const NOT_NULL: &str = "not null";
    pub const DEFAULT: &str = "default";
    pub const COMMENT: &str = "comment";
    pub const INDEX: &str = "index";
    pub const UNIQUE_INDEX: &str = "uniqueIndex";
    pub const SOFT_DELETE: &str = "softDelete";
    pub const DELETED_AT_FIELD: &str = "DeletedAtField";

    /// Struct tag holding the serialized field name.
    pub const JSON: &str = "json";
}

// ============================================================================
// TagMap
// ============================================================================

/// Ordered multimap of tag annotations.
///
/// Keys keep their first insertion position; a key may carry several values
/// (e.g. one `index` entry per index the column belongs to). An empty value
/// renders as the bare key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagMap(IndexMap<String, Vec<String>>);

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), vec![value.into()]);
        self
    }

    /// Adds `value` to the values already stored under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Removes `key` while keeping the relative order of the other keys.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// First value stored under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = TagMap::new();
        for (k, v) in iter {
            tags.append(k, v);
        }
        tags
    }
}

/// Renders as `key:value;key;key:value`.
impl fmt::Display for TagMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, values) in &self.0 {
            for value in values {
                if !first {
                    f.write_str(";")?;
                }
                first = false;
                if value.is_empty() {
                    f.write_str(key)?;
                } else {
                    write!(f, "{}:{}", key, value)?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Relations
// ============================================================================

/// Kind of association between two generated models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    HasOne,
    HasMany,
    BelongsTo,
    ManyToMany,
}

impl RelationshipKind {
    /// Wraps the target model type in the container used for this kind.
    ///
    /// To-many relations become `Vec<T>`; to-one relations are `T`, or
    /// `Option<T>` when `optional` is set.
    pub fn field_type(&self, model_type: &str, optional: bool) -> String {
        match self {
            RelationshipKind::HasMany | RelationshipKind::ManyToMany => format!("Vec<{}>", model_type),
            RelationshipKind::HasOne | RelationshipKind::BelongsTo if optional => format!("Option<{}>", model_type),
            RelationshipKind::HasOne | RelationshipKind::BelongsTo => model_type.to_string(),
        }
    }
}

/// Describes a foreign-key based association carried by a field.
///
/// The target model is referenced by name only. Relation graphs may contain
/// cycles, so children are resolved through a lookup table rather than by
/// holding the target model itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub kind: RelationshipKind,
    pub field_name: String,
    pub field_type: String,
    /// Name of the target model, used as the lookup key during expansion.
    pub model: Option<String>,
    pub child_relations: Vec<Relation>,
}

impl Relation {
    pub fn new(kind: RelationshipKind, field_name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            kind,
            field_name: field_name.into(),
            field_type: field_type.into(),
            model: None,
            child_relations: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Appends relations after the existing children.
    pub fn append_child_relation(&mut self, relations: impl IntoIterator<Item = Relation>) {
        self.child_relations.extend(relations);
    }
}

// ============================================================================
// Field
// ============================================================================

/// One attribute of a generated model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Target-language identifier.
    pub name: String,
    /// Target-language type expression.
    #[serde(rename = "type")]
    pub ty: String,
    /// Original database column name; empty for synthesized fields.
    pub column_name: String,
    pub comment: String,
    /// Column annotations (`column`, `type`, `softDelete`, ...).
    pub tags: TagMap,
    /// Struct tags such as `json`.
    pub struct_tags: TagMap,
    pub relation: Option<Relation>,
    #[serde(skip)]
    explicit_name: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), ty: ty.into(), ..Default::default() }
    }

    /// Sets a user-supplied name.
    ///
    /// Explicit names bypass the naming strategy's case conversion and are
    /// validated with [`crate::naming::check_struct_name`] before the field is
    /// emitted.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.explicit_name = true;
    }

    pub fn has_explicit_name(&self) -> bool {
        self.explicit_name
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn json_tag(&self) -> Option<&str> {
        self.struct_tags.first(tag_key::JSON)
    }
}
