//! # Soft Delete Module
//!
//! Soft deletion marks rows as deleted instead of removing them. Three
//! layouts are supported:
//!
//! * **time only**: a timestamp column (e.g. `deleted_at`) generated as
//!   [`SOFT_DELETE_TIME_TYPE`]
//! * **flag only**: a 0/1 column (e.g. `is_delete`) generated as
//!   [`SOFT_DELETE_FLAG_TYPE`]
//! * **mixed**: both; the flag field names its paired time field through the
//!   `DeletedAtField` tag

use crate::field::{tag_key, Field};

/// Type generated for the soft-delete timestamp column.
pub const SOFT_DELETE_TIME_TYPE: &str = "soft_delete::DeletedAt";

/// Type generated for the soft-delete flag column.
pub const SOFT_DELETE_FLAG_TYPE: &str = "soft_delete::DeleteFlag";

/// Import path the generated models need when soft delete is enabled.
pub const SOFT_DELETE_IMPORT: &str = "soft_delete";

/// Which columns carry soft-delete state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SoftDeletePolicy {
    #[default]
    None,
    TimeOnly { time_column: String },
    FlagOnly { flag_column: String },
    Mixed { flag_column: String, time_column: String },
}

impl SoftDeletePolicy {
    /// Resolves the policy from the configured column names.
    ///
    /// Names are trimmed; blank names count as unset.
    pub fn resolve(flag_column: Option<&str>, time_column: Option<&str>) -> Self {
        let flag = flag_column.map(str::trim).filter(|s| !s.is_empty());
        let time = time_column.map(str::trim).filter(|s| !s.is_empty());
        match (flag, time) {
            (None, None) => SoftDeletePolicy::None,
            (None, Some(time)) => SoftDeletePolicy::TimeOnly { time_column: time.to_string() },
            (Some(flag), None) => SoftDeletePolicy::FlagOnly { flag_column: flag.to_string() },
            (Some(flag), Some(time)) => {
                SoftDeletePolicy::Mixed { flag_column: flag.to_string(), time_column: time.to_string() }
            }
        }
    }

    pub fn flag_column(&self) -> Option<&str> {
        match self {
            SoftDeletePolicy::FlagOnly { flag_column } | SoftDeletePolicy::Mixed { flag_column, .. } => {
                Some(flag_column.as_str())
            }
            _ => None,
        }
    }

    pub fn time_column(&self) -> Option<&str> {
        match self {
            SoftDeletePolicy::TimeOnly { time_column } | SoftDeletePolicy::Mixed { time_column, .. } => {
                Some(time_column.as_str())
            }
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, SoftDeletePolicy::None)
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, SoftDeletePolicy::Mixed { .. })
    }
}

/// Turns `field` into the soft-delete flag field.
///
/// `deleted_at_field` is the struct field name of the paired time column in
/// mixed mode.
pub fn apply_flag(field: &mut Field, deleted_at_field: Option<&str>) {
    field.ty = SOFT_DELETE_FLAG_TYPE.to_string();
    field.tags.set(tag_key::SOFT_DELETE, "flag");
    if let Some(name) = deleted_at_field {
        field.tags.set(tag_key::DELETED_AT_FIELD, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_all_states() {
        assert_eq!(SoftDeletePolicy::resolve(None, None), SoftDeletePolicy::None);
        assert_eq!(SoftDeletePolicy::resolve(Some("  "), Some("")), SoftDeletePolicy::None);
        assert_eq!(
            SoftDeletePolicy::resolve(None, Some("deleted_at")),
            SoftDeletePolicy::TimeOnly { time_column: "deleted_at".into() }
        );
        assert_eq!(
            SoftDeletePolicy::resolve(Some(" is_delete "), None),
            SoftDeletePolicy::FlagOnly { flag_column: "is_delete".into() }
        );

        let mixed = SoftDeletePolicy::resolve(Some("is_delete"), Some("update_time"));
        assert!(mixed.is_mixed());
        assert_eq!(mixed.flag_column(), Some("is_delete"));
        assert_eq!(mixed.time_column(), Some("update_time"));
    }

    #[test]
    fn flag_field_tags() {
        let mut field = Field::new("is_delete", "i8");
        apply_flag(&mut field, Some("UpdateTime"));
        assert_eq!(field.ty, SOFT_DELETE_FLAG_TYPE);
        assert_eq!(field.tags.first(tag_key::SOFT_DELETE), Some("flag"));
        assert_eq!(field.tags.first(tag_key::DELETED_AT_FIELD), Some("UpdateTime"));
    }
}
