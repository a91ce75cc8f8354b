//! # Field Options
//!
//! Options customize the derived fields of a model. They come in three kinds:
//!
//! * **filter** options decide whether a field is kept
//! * **modify** options transform a field
//! * **create** options synthesize a new field (e.g. a relation) that has no
//!   backing column
//!
//! Options run in registration order. Global options (from the config) run
//! before per-model options.
//!
//! # Example
//!
//! ```rust,ignore
//! use bottle_gen::options::{field_ignore, field_rename, field_relate, RelateConfig};
//! use bottle_gen::RelationshipKind;
//!
//! builder.with_opts([
//!     field_ignore(&["password_hash"]),
//!     field_rename("email_addr", "Email"),
//!     field_relate(RelationshipKind::HasMany, "Posts", "model::Post", RelateConfig::default()),
//! ]);
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use heck::ToSnakeCase;
use std::{fmt, sync::Arc};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    field::{tag_key, Field, Relation, RelationshipKind, TagMap},
    Result,
};

type FilterFn = dyn Fn(&Field) -> Result<bool> + Send + Sync;
type ModifyFn = dyn Fn(Field) -> Result<Field> + Send + Sync;
type CreateFn = dyn Fn() -> Result<Field> + Send + Sync;

// ============================================================================
// FieldOpt
// ============================================================================

/// A filter, modify or create option.
///
/// Each option carries a name that is reported when it fails. Returning an
/// error from an option aborts the whole generation run.
#[derive(Clone)]
pub enum FieldOpt {
    Filter { name: String, op: Arc<FilterFn> },
    Modify { name: String, op: Arc<ModifyFn> },
    Create { name: String, op: Arc<CreateFn> },
}

impl FieldOpt {
    /// Keeps the field when `op` returns `true`.
    pub fn filter<F>(name: impl Into<String>, op: F) -> Self
    where
        F: Fn(&Field) -> Result<bool> + Send + Sync + 'static,
    {
        FieldOpt::Filter { name: name.into(), op: Arc::new(op) }
    }

    pub fn modify<F>(name: impl Into<String>, op: F) -> Self
    where
        F: Fn(Field) -> Result<Field> + Send + Sync + 'static,
    {
        FieldOpt::Modify { name: name.into(), op: Arc::new(op) }
    }

    pub fn create<F>(name: impl Into<String>, op: F) -> Self
    where
        F: Fn() -> Result<Field> + Send + Sync + 'static,
    {
        FieldOpt::Create { name: name.into(), op: Arc::new(op) }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldOpt::Filter { name, .. } | FieldOpt::Modify { name, .. } | FieldOpt::Create { name, .. } => name,
        }
    }
}

impl fmt::Debug for FieldOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            FieldOpt::Filter { .. } => "Filter",
            FieldOpt::Modify { .. } => "Modify",
            FieldOpt::Create { .. } => "Create",
        };
        write!(f, "FieldOpt::{}({})", kind, self.name())
    }
}

/// Options of one model, split by kind with registration order preserved.
#[derive(Debug, Clone, Default)]
pub struct FieldOpts {
    pub filters: Vec<FieldOpt>,
    pub modifiers: Vec<FieldOpt>,
    pub creators: Vec<FieldOpt>,
}

impl FieldOpts {
    pub fn split<'a>(opts: impl IntoIterator<Item = &'a FieldOpt>) -> Self {
        let mut split = FieldOpts::default();
        for opt in opts {
            match opt {
                FieldOpt::Filter { .. } => split.filters.push(opt.clone()),
                FieldOpt::Modify { .. } => split.modifiers.push(opt.clone()),
                FieldOpt::Create { .. } => split.creators.push(opt.clone()),
            }
        }
        split
    }
}

// ============================================================================
// Filter Options
// ============================================================================

/// Drops the fields backed by any of `columns`.
pub fn field_ignore(columns: &[&str]) -> FieldOpt {
    let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    FieldOpt::filter(format!("field_ignore({})", columns.join(",")), move |f: &Field| {
        Ok(!columns.iter().any(|c| *c == f.column_name))
    })
}

/// Drops the fields whose column name matches `pred`.
pub fn field_ignore_matching<P>(pred: P) -> FieldOpt
where
    P: Fn(&str) -> bool + Send + Sync + 'static,
{
    FieldOpt::filter("field_ignore_matching", move |f: &Field| Ok(!pred(&f.column_name)))
}

// ============================================================================
// Modify Options
// ============================================================================

/// Modifies the field backed by `column` only.
fn on_column<F>(label: String, column: &str, op: F) -> FieldOpt
where
    F: Fn(&mut Field) + Send + Sync + 'static,
{
    let column = column.to_string();
    FieldOpt::modify(label, move |mut f: Field| {
        if f.column_name == column {
            op(&mut f);
        }
        Ok(f)
    })
}

/// Gives the field backed by `column` an explicit struct field name.
///
/// The name is validated before the model is emitted.
pub fn field_rename(column: &str, new_name: &str) -> FieldOpt {
    let new_name = new_name.to_string();
    on_column(format!("field_rename({})", column), column, move |f| f.rename(new_name.clone()))
}

pub fn field_type(column: &str, ty: &str) -> FieldOpt {
    let ty = ty.to_string();
    on_column(format!("field_type({})", column), column, move |f| f.ty = ty.clone())
}

pub fn field_comment(column: &str, comment: &str) -> FieldOpt {
    let comment = comment.to_string();
    on_column(format!("field_comment({})", column), column, move |f| f.comment = comment.clone())
}

pub fn field_json_tag(column: &str, json_tag: &str) -> FieldOpt {
    let json_tag = json_tag.to_string();
    on_column(format!("field_json_tag({})", column), column, move |f| {
        f.struct_tags.set(tag_key::JSON, json_tag.clone());
    })
}

/// Recomputes every field's JSON tag from its column name.
pub fn field_json_tag_with_ns<N>(ns: N) -> FieldOpt
where
    N: Fn(&str) -> String + Send + Sync + 'static,
{
    FieldOpt::modify("field_json_tag_with_ns", move |mut f: Field| {
        let tag = ns(&f.column_name);
        f.struct_tags.set(tag_key::JSON, tag);
        Ok(f)
    })
}

/// Edits the column tags of the field backed by `column`.
pub fn field_column_tag<F>(column: &str, edit: F) -> FieldOpt
where
    F: Fn(&mut TagMap) + Send + Sync + 'static,
{
    on_column(format!("field_column_tag({})", column), column, move |f| edit(&mut f.tags))
}

/// Adds a struct tag to the field backed by `column`.
pub fn field_new_tag(column: &str, key: &str, value: &str) -> FieldOpt {
    let (key, value) = (key.to_string(), value.to_string());
    on_column(format!("field_new_tag({})", column), column, move |f| {
        f.struct_tags.append(key.clone(), value.clone());
    })
}

pub fn field_trim_prefix(prefix: &str) -> FieldOpt {
    let prefix = prefix.to_string();
    FieldOpt::modify(format!("field_trim_prefix({})", prefix), move |mut f: Field| {
        if let Some(rest) = f.name.strip_prefix(prefix.as_str()) {
            f.name = rest.to_string();
        }
        Ok(f)
    })
}

pub fn field_trim_suffix(suffix: &str) -> FieldOpt {
    let suffix = suffix.to_string();
    FieldOpt::modify(format!("field_trim_suffix({})", suffix), move |mut f: Field| {
        if let Some(rest) = f.name.strip_suffix(suffix.as_str()) {
            f.name = rest.to_string();
        }
        Ok(f)
    })
}

pub fn field_add_prefix(prefix: &str) -> FieldOpt {
    let prefix = prefix.to_string();
    FieldOpt::modify(format!("field_add_prefix({})", prefix), move |mut f: Field| {
        f.name = format!("{}{}", prefix, f.name);
        Ok(f)
    })
}

pub fn field_add_suffix(suffix: &str) -> FieldOpt {
    let suffix = suffix.to_string();
    FieldOpt::modify(format!("field_add_suffix({})", suffix), move |mut f: Field| {
        f.name.push_str(&suffix);
        Ok(f)
    })
}

// ============================================================================
// Create Options
// ============================================================================

/// Adds a field that has no backing column.
pub fn field_new(name: &str, ty: &str, struct_tags: TagMap) -> FieldOpt {
    let (name, ty) = (name.to_string(), ty.to_string());
    FieldOpt::create(format!("field_new({})", name), move || {
        let mut field = Field::new("", ty.clone());
        field.rename(name.clone());
        field.struct_tags = struct_tags.clone();
        Ok(field)
    })
}

/// Settings for [`field_relate`].
#[derive(Debug, Clone, Default)]
pub struct RelateConfig {
    /// Generate to-one relations as `Option<T>`.
    pub optional: bool,
    /// JSON tag; defaults to the snake_case field name.
    pub json_tag: Option<String>,
    /// Column tags carried by the relation field (e.g. `foreignKey`).
    pub tags: TagMap,
}

/// Adds a relation field pointing at `model_type`.
///
/// `model_type` may be qualified with the model package (`model::Post`); the
/// qualifier is stripped when the field is derived. The last path segment is
/// the lookup key used to expand the target's own relationships.
pub fn field_relate(kind: RelationshipKind, field_name: &str, model_type: &str, config: RelateConfig) -> FieldOpt {
    let field_name = field_name.to_string();
    let model_type = model_type.to_string();
    FieldOpt::create(format!("field_relate({})", field_name), move || {
        let model = model_type.rsplit("::").next().unwrap_or(&model_type).to_string();
        let ty = kind.field_type(&model_type, config.optional);
        let json_tag = config.json_tag.clone().unwrap_or_else(|| field_name.to_snake_case());

        let mut field = Field::new("", ty.clone());
        field.rename(field_name.clone());
        field.tags = config.tags.clone();
        field.struct_tags.set(tag_key::JSON, json_tag);
        Ok(field.with_relation(Relation::new(kind, field_name.clone(), ty).with_model(model)))
    })
}
