//! # Generate Module
//!
//! The field derivation pipeline: turns the columns of one table into the
//! ordered field list of the generated model.
//!
//! For every column, in order:
//!
//! 1. bind the type mapper and JSON tag strategy
//! 2. convert to a [`Field`] (nullable / coverable / signable / soft-delete time policy)
//! 3. run the filter chain; the first rejection drops the field
//! 4. drop the `type` tag unless type tags are enabled
//! 5. turn the soft-delete flag column into the flag field
//! 6. run the modify chain
//! 7. apply the naming strategy to the field name
//!
//! Fields produced by create options (relations, extra fields) follow the
//! column fields in registration order.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::collections::HashMap;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    column::{Column, FieldPolicy},
    config::Config,
    field::{tag_key, Field},
    naming::{check_struct_name, NamingStrategy},
    options::{FieldOpt, FieldOpts},
    registry::{expand_relations, RelationResolver, MAX_RELATION_DEPTH},
    soft_delete::apply_flag,
    Error, Result,
};

// ============================================================================
// NameTable
// ============================================================================

/// Struct field names of a table's columns, resolved in one pass before any
/// field is converted.
///
/// Cross references between fields (the soft-delete flag naming its time
/// field) read from this table, so they do not depend on conversion order or
/// on whether the referenced field survives the filter chain.
#[derive(Debug, Default)]
pub struct NameTable {
    names: HashMap<String, String>,
}

impl NameTable {
    pub fn build<'a>(
        naming: &dyn NamingStrategy,
        columns: &'a [Column],
        extra: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let names = columns
            .iter()
            .map(Column::name)
            .chain(extra)
            .map(|column| (column.to_string(), naming.field_name(column)))
            .collect();
        Self { names }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.names.get(column).map(String::as_str)
    }
}

// ============================================================================
// FieldDeriver
// ============================================================================

/// Derives the fields of one model.
pub struct FieldDeriver<'a> {
    config: &'a Config,
    resolver: &'a dyn RelationResolver,
    opts: FieldOpts,
}

impl<'a> FieldDeriver<'a> {
    /// Creates a deriver running the config's global options.
    pub fn new(config: &'a Config, resolver: &'a dyn RelationResolver) -> Self {
        Self { config, resolver, opts: FieldOpts::split(config.opts()) }
    }

    /// Appends model-specific options after the global ones.
    pub fn with_model_opts(mut self, opts: &[FieldOpt]) -> Self {
        let model = FieldOpts::split(opts);
        self.opts.filters.extend(model.filters);
        self.opts.modifiers.extend(model.modifiers);
        self.opts.creators.extend(model.creators);
        self
    }

    /// Converts `columns` into fields, then appends created fields.
    ///
    /// Output order is the input column order followed by create options in
    /// registration order.
    ///
    /// # Errors
    ///
    /// * [`Error::Option`] when an option fails
    /// * [`Error::Validation`] when an explicitly supplied field name is invalid
    pub fn derive(&self, columns: &[Column]) -> Result<Vec<Field>> {
        let config = self.config;
        let naming = config.naming_strategy();
        let soft_delete = &config.soft_delete;

        let policy = FieldPolicy {
            nullable: config.field_nullable,
            coverable: config.field_coverable,
            signable: config.field_signable,
            with_index_tag: config.field_with_index_tag,
            soft_delete_time_column: soft_delete.time_column(),
        };

        let names = NameTable::build(naming, columns, soft_delete.time_column());
        let deleted_at_field = soft_delete.time_column().and_then(|column| names.get(column));
        let flag_column = soft_delete.flag_column();

        let mut fields = Vec::with_capacity(columns.len() + self.opts.creators.len());
        for col in columns {
            let bound = col.bind(config.type_mapper(), config.field_json_tag_ns());
            let mut field = bound.to_field(&policy);

            if !self.filter_field(&field)? {
                log::debug!("field {}.{} filtered out", col.table_name, col.name());
                continue;
            }

            if col.column_type.column_type.is_some() && !config.field_with_type_tag {
                field.tags.remove(tag_key::TYPE);
            }

            if flag_column == Some(col.name()) {
                apply_flag(&mut field, deleted_at_field);
            }

            let mut field = self.modify_field(field)?;
            if field.has_explicit_name() {
                check_struct_name(&field.name)?;
            } else {
                field.name = naming.field_name(&field.name);
            }

            fields.push(field);
        }

        if let (Some(flag), Some(time)) = (flag_column, soft_delete.time_column()) {
            let has_flag = fields.iter().any(|f| f.column_name == flag);
            let has_time = fields.iter().any(|f| f.column_name == time);
            if has_flag && !has_time {
                log::warn!(
                    "soft delete flag {:?} references time field {:?}, which is not part of the model",
                    flag,
                    deleted_at_field.unwrap_or(time)
                );
            }
        }

        for opt in &self.opts.creators {
            fields.push(self.create_field(opt)?);
        }

        Ok(fields)
    }

    fn filter_field(&self, field: &Field) -> Result<bool> {
        for opt in &self.opts.filters {
            if let FieldOpt::Filter { name, op } = opt {
                if !op(field).map_err(|err| option_error(name, err))? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn modify_field(&self, mut field: Field) -> Result<Field> {
        for opt in &self.opts.modifiers {
            if let FieldOpt::Modify { name, op } = opt {
                field = op(field).map_err(|err| option_error(name, err))?;
            }
        }
        Ok(field)
    }

    fn create_field(&self, opt: &FieldOpt) -> Result<Field> {
        let FieldOpt::Create { name, op } = opt else {
            return Err(Error::option(opt.name(), "not a create option"));
        };
        let mut field = op().map_err(|err| option_error(name, err))?;
        check_struct_name(&field.name)?;

        if let Some(relation) = field.relation.as_mut() {
            if let Some(model) = relation.model.as_deref() {
                match expand_relations(self.resolver, model, MAX_RELATION_DEPTH) {
                    Some(children) => relation.append_child_relation(children),
                    None => log::debug!("relation target {} is not registered", model),
                }
            }

            let qualifier = format!("{}::", self.config.model_pkg_path);
            relation.field_type = relation.field_type.replace(&qualifier, "");
            field.ty = field.ty.replace(&qualifier, "");
        }

        Ok(field)
    }
}

/// Keeps validation and option errors, wraps anything else as an option error.
fn option_error(option: &str, err: Error) -> Error {
    match err {
        Error::Validation { .. } | Error::Option { .. } => err,
        other => Error::option(option, other),
    }
}
