//! # Config Module
//!
//! Generation settings. A [`ConfigBuilder`] accumulates settings during setup;
//! [`ConfigBuilder::revise`] normalizes paths, fills in defaults and returns an
//! immutable [`Config`] that the rest of the pipeline reads.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut builder = ConfigBuilder::new();
//! builder.out_path = "./dal/query".into();
//! builder.field_nullable = true;
//! builder
//!     .with_soft_delete_flag("is_delete")
//!     .with_soft_delete_at("update_time")
//!     .with_opts([field_ignore(&["password"])]);
//! let config = builder.revise()?;
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use serde::Serialize;
use std::{
    fmt, io, ops,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    naming::{NameFn, NamingStrategy},
    options::FieldOpt,
    schema::{PlaceholderReader, SchemaReader},
    soft_delete::{SoftDeletePolicy, SOFT_DELETE_IMPORT},
    types::{DataTypeMap, TypeMapper},
    Error, Result,
};

/// Package the generated models live in when none is configured.
pub const DEFAULT_MODEL_PKG: &str = "model";

/// Output directory used when none is configured.
pub const DEFAULT_OUT_PATH: &str = "./query";

/// File name of the generated query code.
pub const DEFAULT_OUT_FILE: &str = "gen.rs";

// ============================================================================
// GenerateMode
// ============================================================================

/// Bit set of independent generation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GenerateMode(u8);

impl GenerateMode {
    /// Create a default query object in the generated code.
    pub const WITH_DEFAULT_QUERY: Self = Self(1);
    /// Generate code without a context parameter.
    pub const WITHOUT_CONTEXT: Self = Self(1 << 1);
    /// Generate an exported query interface.
    pub const WITH_QUERY_INTERFACE: Self = Self(1 << 2);
    /// Generate generic code.
    pub const WITH_GENERIC: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` when every flag of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` when any flag of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl ops::BitOr for GenerateMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for GenerateMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ============================================================================
// ConfigBuilder
// ============================================================================

/// Mutable generation settings, used during setup only.
///
/// Setters take `&mut self`; the builder is consumed by [`revise`](Self::revise),
/// so nothing can change once generation starts.
#[derive(Default)]
pub struct ConfigBuilder {
    /// Directory of the generated query code.
    pub out_path: String,
    /// Query code file name; defaults to `gen.rs` inside `out_path`.
    pub out_file: String,
    /// Package of the generated model code.
    pub model_pkg_path: String,
    pub with_unit_test: bool,

    /// Generate `Option<T>` for nullable columns.
    pub field_nullable: bool,
    /// Generate `Option<T>` for columns with a default value, so that an
    /// unset value can be told apart from the zero value.
    pub field_coverable: bool,
    /// Generate unsigned types for unsigned integer columns.
    pub field_signable: bool,
    pub field_with_index_tag: bool,
    pub field_with_type_tag: bool,

    pub mode: GenerateMode,

    soft_delete_flag_column: String,
    soft_delete_time_column: String,
    import_pkg_paths: Vec<String>,

    table_name_ns: Option<NameFn>,
    model_name_ns: Option<NameFn>,
    file_name_ns: Option<NameFn>,
    field_json_tag_ns: Option<NameFn>,
    data_type_map: DataTypeMap,

    opts: Vec<FieldOpt>,
    reader: Option<Arc<dyn SchemaReader>>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends global field options, applied to every generated model.
    pub fn with_opts(&mut self, opts: impl IntoIterator<Item = FieldOpt>) -> &mut Self {
        self.opts.extend(opts);
        self
    }

    /// Sets the schema reader; its naming strategy names every struct and field.
    pub fn with_schema_reader(&mut self, reader: Arc<dyn SchemaReader>) -> &mut Self {
        self.reader = Some(reader);
        self
    }

    /// Table name naming strategy, only used when syncing tables from the database.
    pub fn with_table_name_strategy<F>(&mut self, ns: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.table_name_ns = Some(Arc::new(ns));
        self
    }

    pub fn with_model_name_strategy<F>(&mut self, ns: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.model_name_ns = Some(Arc::new(ns));
        self
    }

    pub fn with_file_name_strategy<F>(&mut self, ns: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.file_name_ns = Some(Arc::new(ns));
        self
    }

    /// Replaces the data type overrides.
    pub fn with_data_type_map(&mut self, map: DataTypeMap) -> &mut Self {
        self.data_type_map = map;
        self
    }

    pub fn with_json_tag_name_strategy<F>(&mut self, ns: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.field_json_tag_ns = Some(Arc::new(ns));
        self
    }

    /// Column holding the 0/1 delete flag (e.g. `is_delete`).
    ///
    /// Combine with [`with_soft_delete_at`](Self::with_soft_delete_at) for
    /// mixed mode.
    pub fn with_soft_delete_flag(&mut self, column: &str) -> &mut Self {
        self.soft_delete_flag_column = column.trim().to_string();
        self
    }

    /// Column holding the delete time (e.g. `deleted_at`, `update_time`).
    pub fn with_soft_delete_at(&mut self, column: &str) -> &mut Self {
        self.soft_delete_time_column = column.trim().to_string();
        self
    }

    /// Adds the soft-delete import when any soft-delete column is configured.
    pub fn check_soft_delete_plugin(&mut self) -> &mut Self {
        let enabled = !self.soft_delete_flag_column.is_empty() || !self.soft_delete_time_column.is_empty();
        if enabled && !self.import_pkg_paths.iter().any(|p| p == SOFT_DELETE_IMPORT) {
            self.with_import_pkg_path([SOFT_DELETE_IMPORT]);
        }
        self
    }

    /// Adds import paths to the generated code.
    ///
    /// Paths are trimmed, surrounding quotes and `use ...;` wrappers are
    /// dropped, and blank entries are skipped.
    pub fn with_import_pkg_path<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            let path = path.as_ref().trim();
            let path = path.strip_prefix("use ").unwrap_or(path).trim_end_matches(';').trim().trim_matches('"');
            if !path.is_empty() {
                self.import_pkg_paths.push(path.to_string());
            }
        }
        self
    }

    pub fn with_mode(&mut self, mode: GenerateMode) -> &mut Self {
        self.mode |= mode;
        self
    }

    /// Finalizes the configuration.
    ///
    /// * defaults the model package to [`DEFAULT_MODEL_PKG`]
    /// * makes `out_path` absolute (an empty path becomes [`DEFAULT_OUT_PATH`])
    /// * defaults `out_file` to `<out_path>/gen.rs`, and joins a bare file
    ///   name onto `out_path`
    /// * derives the query package name from the last `out_path` component
    /// * binds a [`PlaceholderReader`] when no schema reader was set
    ///
    /// # Errors
    ///
    /// Returns [`Error::Path`] when `out_path` cannot be made absolute.
    pub fn revise(mut self) -> Result<Config> {
        let model_pkg_path = match self.model_pkg_path.trim() {
            "" => DEFAULT_MODEL_PKG.to_string(),
            pkg => pkg.to_string(),
        };

        // An empty path means `./query`, never the current directory itself.
        let raw_out_path = match self.out_path.trim() {
            "" => DEFAULT_OUT_PATH,
            path => path,
        };
        let out_path =
            absolutize(Path::new(raw_out_path)).map_err(|source| Error::Path { path: raw_out_path.into(), source })?;

        let out_file = match self.out_file.trim() {
            "" => out_path.join(DEFAULT_OUT_FILE),
            file if !file.contains(std::path::MAIN_SEPARATOR) && !file.contains('/') => out_path.join(file),
            file => PathBuf::from(file),
        };

        let query_pkg_name = out_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "query".to_string());

        self.check_soft_delete_plugin();
        let soft_delete =
            SoftDeletePolicy::resolve(Some(self.soft_delete_flag_column.as_str()), Some(self.soft_delete_time_column.as_str()));
        if let SoftDeletePolicy::FlagOnly { flag_column } = &soft_delete {
            log::warn!(
                "soft delete flag column {:?} is set without a time column; the generated model relies on the soft delete plugin",
                flag_column
            );
        }

        let reader = self.reader.unwrap_or_else(|| Arc::new(PlaceholderReader::default()) as Arc<dyn SchemaReader>);

        log::debug!("config revised: out_file={}, query_pkg={}", out_file.display(), query_pkg_name);

        Ok(Config {
            out_path,
            out_file,
            query_pkg_name,
            model_pkg_path,
            with_unit_test: self.with_unit_test,
            field_nullable: self.field_nullable,
            field_coverable: self.field_coverable,
            field_signable: self.field_signable,
            field_with_index_tag: self.field_with_index_tag,
            field_with_type_tag: self.field_with_type_tag,
            mode: self.mode,
            soft_delete,
            import_pkg_paths: self.import_pkg_paths,
            table_name_ns: self.table_name_ns,
            model_name_ns: self.model_name_ns,
            file_name_ns: self.file_name_ns,
            field_json_tag_ns: self.field_json_tag_ns,
            type_mapper: TypeMapper::new(self.data_type_map),
            opts: self.opts,
            reader,
        })
    }
}

/// Makes `path` absolute against the current directory and removes `.` and
/// `..` components.
fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() { path.to_path_buf() } else { std::env::current_dir()?.join(path) };
    let mut cleaned = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    Ok(cleaned)
}

// ============================================================================
// Config
// ============================================================================

/// Finalized, read-only generation settings.
pub struct Config {
    pub out_path: PathBuf,
    pub out_file: PathBuf,
    /// Package name of the generated query code, taken from `out_path`.
    pub query_pkg_name: String,
    pub model_pkg_path: String,
    pub with_unit_test: bool,

    pub field_nullable: bool,
    pub field_coverable: bool,
    pub field_signable: bool,
    pub field_with_index_tag: bool,
    pub field_with_type_tag: bool,

    pub mode: GenerateMode,
    pub soft_delete: SoftDeletePolicy,
    pub import_pkg_paths: Vec<String>,

    table_name_ns: Option<NameFn>,
    model_name_ns: Option<NameFn>,
    file_name_ns: Option<NameFn>,
    field_json_tag_ns: Option<NameFn>,
    type_mapper: TypeMapper,

    opts: Vec<FieldOpt>,
    reader: Arc<dyn SchemaReader>,
}

impl Config {
    /// Reports whether any flag of `mode` is enabled.
    pub fn judge_mode(&self, mode: GenerateMode) -> bool {
        self.mode.intersects(mode)
    }

    pub fn reader(&self) -> &dyn SchemaReader {
        self.reader.as_ref()
    }

    pub fn naming_strategy(&self) -> &dyn NamingStrategy {
        self.reader.naming_strategy()
    }

    pub fn type_mapper(&self) -> &TypeMapper {
        &self.type_mapper
    }

    pub fn field_json_tag_ns(&self) -> Option<&NameFn> {
        self.field_json_tag_ns.as_ref()
    }

    /// Global field options in registration order.
    pub fn opts(&self) -> &[FieldOpt] {
        &self.opts
    }

    /// Target table name for a database table.
    pub fn table_name(&self, table: &str) -> String {
        match &self.table_name_ns {
            Some(ns) => ns(table),
            None => table.to_string(),
        }
    }

    /// Struct name for a database table.
    pub fn model_name(&self, table: &str) -> String {
        match &self.model_name_ns {
            Some(ns) => ns(table),
            None => self.naming_strategy().schema_name(table),
        }
    }

    /// File name (without extension) of the generated model for a table.
    pub fn file_name(&self, table: &str) -> String {
        match &self.file_name_ns {
            Some(ns) => ns(table),
            None => table.to_ascii_lowercase(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("out_path", &self.out_path)
            .field("out_file", &self.out_file)
            .field("query_pkg_name", &self.query_pkg_name)
            .field("model_pkg_path", &self.model_pkg_path)
            .field("mode", &self.mode)
            .field("soft_delete", &self.soft_delete)
            .field("import_pkg_paths", &self.import_pkg_paths)
            .field("type_mapper", &self.type_mapper)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_mode_flags_combine() {
        let mode = GenerateMode::WITH_DEFAULT_QUERY | GenerateMode::WITH_GENERIC;
        assert!(mode.contains(GenerateMode::WITH_GENERIC));
        assert!(!mode.contains(GenerateMode::WITHOUT_CONTEXT));
        assert!(mode.intersects(GenerateMode::WITHOUT_CONTEXT | GenerateMode::WITH_DEFAULT_QUERY));
        assert_eq!(mode.bits(), 0b1001);
        assert!(!GenerateMode::empty().intersects(mode));
    }

    #[test]
    fn absolutize_cleans_components() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new("./a/../b/./c")).unwrap(), cwd.join("b").join("c"));
    }

    #[test]
    fn import_paths_are_normalized() {
        let mut builder = ConfigBuilder::new();
        builder.with_import_pkg_path(["  \"serde\" ", "use chrono::NaiveDateTime;", " "]);
        assert_eq!(builder.import_pkg_paths, ["serde", "chrono::NaiveDateTime"]);
    }

    #[test]
    fn soft_delete_plugin_import_added_once() {
        let mut builder = ConfigBuilder::new();
        builder.with_soft_delete_at("deleted_at");
        builder.check_soft_delete_plugin().check_soft_delete_plugin();
        assert_eq!(builder.import_pkg_paths, [SOFT_DELETE_IMPORT]);

        let mut builder = ConfigBuilder::new();
        builder.check_soft_delete_plugin();
        assert!(builder.import_pkg_paths.is_empty());
    }
}
