//! # Schema Module
//!
//! Reads table and column metadata from a live database. The core only sees
//! the [`SchemaReader`] trait: a reader lists tables, returns the columns of a
//! table, and supplies the naming strategy used to turn raw identifiers into
//! struct and field names.
//!
//! [`SqlxSchemaReader`] introspects PostgreSQL, MySQL and SQLite through an
//! `sqlx` `AnyPool`. [`PlaceholderReader`] is bound when no reader is
//! configured, so naming lookups always have a strategy to use.

// ============================================================================
// External Crate Imports
// ============================================================================

use futures::future::BoxFuture;
use sqlx::{any::AnyRow, AnyPool, Row};
use std::{collections::HashMap, sync::Arc};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    column::{Column, ColumnType, Index},
    naming::{DefaultNamingStrategy, NamingStrategy},
    Result,
};

// ============================================================================
// SchemaReader Trait
// ============================================================================

/// Source of table metadata.
pub trait SchemaReader: Send + Sync {
    /// The authoritative mapping from raw identifiers to target identifiers.
    fn naming_strategy(&self) -> &dyn NamingStrategy;

    /// Lists the tables of the current schema.
    fn get_tables(&self) -> BoxFuture<'_, Result<Vec<String>>>;

    /// Returns the columns of `table` in ordinal order.
    fn get_table_columns<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Vec<Column>>>;
}

/// Reader bound when the configuration has no database.
///
/// Reports no tables and no columns; naming goes through the default strategy.
#[derive(Debug, Default)]
pub struct PlaceholderReader {
    naming: DefaultNamingStrategy,
}

impl SchemaReader for PlaceholderReader {
    fn naming_strategy(&self) -> &dyn NamingStrategy {
        &self.naming
    }

    fn get_tables(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn get_table_columns<'a>(&'a self, _table: &'a str) -> BoxFuture<'a, Result<Vec<Column>>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

// ============================================================================
// Database Driver Enum
// ============================================================================

/// Database drivers supported by [`SqlxSchemaReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drivers {
    Postgres,
    MySQL,
    SQLite,
}

impl Drivers {
    /// Detects the driver from a connection URL.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres") {
            Drivers::Postgres
        } else if url.starts_with("mysql") || url.starts_with("mariadb") {
            Drivers::MySQL
        } else {
            Drivers::SQLite
        }
    }
}

// ============================================================================
// SqlxSchemaReader
// ============================================================================

/// Schema reader backed by an `sqlx` connection pool.
#[derive(Clone)]
pub struct SqlxSchemaReader {
    pool: AnyPool,
    driver: Drivers,
    naming: Arc<dyn NamingStrategy>,
}

impl SqlxSchemaReader {
    /// Connects to the database at `url`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let reader = SqlxSchemaReader::connect("sqlite::memory:").await?;
    /// let columns = reader.get_table_columns("users").await?;
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = sqlx::any::AnyPoolOptions::new().max_connections(1).connect(url).await?;
        Ok(Self::new(pool, Drivers::from_url(url)))
    }

    pub fn new(pool: AnyPool, driver: Drivers) -> Self {
        Self { pool, driver, naming: Arc::new(DefaultNamingStrategy::default()) }
    }

    /// Replaces the naming strategy used for struct and field names.
    pub fn with_naming_strategy(mut self, naming: Arc<dyn NamingStrategy>) -> Self {
        self.naming = naming;
        self
    }

    pub fn driver(&self) -> Drivers {
        self.driver
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    async fn fetch_by_table(&self, query: &str, table: &str) -> Result<Vec<AnyRow>> {
        let rows = match self.driver {
            Drivers::SQLite => sqlx::query(query).fetch_all(&self.pool).await?,
            _ => sqlx::query(query).bind(table.to_string()).fetch_all(&self.pool).await?,
        };
        Ok(rows)
    }

    async fn read_tables(&self) -> Result<Vec<String>> {
        let query = match self.driver {
            Drivers::Postgres => {
                "SELECT table_name::TEXT FROM information_schema.tables WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name"
            }
            Drivers::MySQL => {
                "SELECT CAST(TABLE_NAME AS CHAR) FROM information_schema.tables WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' ORDER BY TABLE_NAME"
            }
            Drivers::SQLite => {
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
        };

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            tables.push(row.try_get::<String, _>(0)?);
        }
        Ok(tables)
    }

    async fn read_columns(&self, table: &str) -> Result<Vec<Column>> {
        let mut indexes = self.read_indexes(table).await?;
        let columns = match self.driver {
            Drivers::SQLite => self.read_sqlite_columns(table).await?,
            Drivers::Postgres => self.read_postgres_columns(table).await?,
            Drivers::MySQL => self.read_mysql_columns(table).await?,
        };

        let columns = columns
            .into_iter()
            .map(|column_type| {
                let column_indexes = indexes.remove(&column_type.name).unwrap_or_default();
                let mut column = Column::new(table, column_type);
                column.indexes = column_indexes;
                column
            })
            .collect::<Vec<_>>();

        log::debug!("read {} columns from table {}", columns.len(), table);
        Ok(columns)
    }

    async fn read_sqlite_columns(&self, table: &str) -> Result<Vec<ColumnType>> {
        let query = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let rows = self.fetch_by_table(&query, table).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let declared: String = row.try_get("type")?;
            let not_null: i64 = row.try_get("notnull")?;
            let default: Option<String> = row.try_get("dflt_value")?;
            let pk: i64 = row.try_get("pk")?;

            let type_name = declared.split('(').next().unwrap_or_default().trim().to_string();
            let mut column = ColumnType::new(name, type_name.clone())
                .with_column_type(Some(declared.to_ascii_lowercase()))
                .nullable(not_null == 0 && pk == 0);
            if pk > 0 {
                column = column.primary_key(type_name.eq_ignore_ascii_case("integer"));
            }
            if let Some(default) = default {
                column = column.with_default(default);
            }
            columns.push(column);
        }
        Ok(columns)
    }

    async fn read_postgres_columns(&self, table: &str) -> Result<Vec<ColumnType>> {
        let query = "SELECT c.column_name::TEXT, c.data_type::TEXT, c.is_nullable::TEXT, c.column_default::TEXT, \
                     c.is_identity::TEXT, \
                     pg_catalog.col_description(format('%s.%s', c.table_schema, c.table_name)::regclass::oid, c.ordinal_position)::TEXT \
                     FROM information_schema.columns c \
                     WHERE c.table_name = $1 AND c.table_schema = 'public' ORDER BY c.ordinal_position";
        let rows = self.fetch_by_table(query, table).await?;
        let primary: Vec<String> = self
            .fetch_by_table(
                "SELECT a.attname::TEXT FROM pg_index ix \
                 JOIN pg_class t ON t.oid = ix.indrelid \
                 JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
                 WHERE ix.indisprimary AND t.relname = $1",
                table,
            )
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>(0))
            .collect::<Result<_, _>>()?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get(0)?;
            let data_type: String = row.try_get(1)?;
            let is_nullable: String = row.try_get(2)?;
            let default: Option<String> = row.try_get(3)?;
            let is_identity: Option<String> = row.try_get(4)?;
            let comment: Option<String> = row.try_get(5)?;

            let serial = default.as_deref().is_some_and(|d| d.starts_with("nextval("));
            let auto_increment = serial || is_identity.as_deref() == Some("YES");

            let mut column = ColumnType::new(name.clone(), data_type.clone())
                .with_column_type(Some(data_type))
                .nullable(is_nullable == "YES");
            if primary.contains(&name) {
                column = column.primary_key(auto_increment);
            }
            if let Some(default) = default.filter(|_| !serial) {
                column = column.with_default(default);
            }
            if let Some(comment) = comment {
                column = column.with_comment(comment);
            }
            columns.push(column);
        }
        Ok(columns)
    }

    async fn read_mysql_columns(&self, table: &str) -> Result<Vec<ColumnType>> {
        let query = "SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR), CAST(COLUMN_TYPE AS CHAR), \
                     CAST(IS_NULLABLE AS CHAR), CAST(COLUMN_DEFAULT AS CHAR), CAST(COLUMN_KEY AS CHAR), \
                     CAST(EXTRA AS CHAR), CAST(COLUMN_COMMENT AS CHAR) \
                     FROM information_schema.columns \
                     WHERE table_schema = DATABASE() AND table_name = ? ORDER BY ORDINAL_POSITION";
        let rows = self.fetch_by_table(query, table).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get(0)?;
            let data_type: String = row.try_get(1)?;
            let column_type: String = row.try_get(2)?;
            let is_nullable: String = row.try_get(3)?;
            let default: Option<String> = row.try_get(4)?;
            let key: String = row.try_get(5)?;
            let extra: String = row.try_get(6)?;
            let comment: String = row.try_get(7)?;

            let mut column = ColumnType::new(name, data_type)
                .with_column_type(Some(column_type))
                .nullable(is_nullable == "YES");
            if key == "PRI" {
                column = column.primary_key(extra.contains("auto_increment"));
            }
            if let Some(default) = default {
                column = column.with_default(default);
            }
            if !comment.is_empty() {
                column = column.with_comment(comment);
            }
            columns.push(column);
        }
        Ok(columns)
    }

    /// Returns the indexes of `table`, grouped by column name.
    async fn read_indexes(&self, table: &str) -> Result<HashMap<String, Vec<Index>>> {
        let mut by_column: HashMap<String, Vec<Index>> = HashMap::new();

        match self.driver {
            Drivers::SQLite => {
                let list = format!("PRAGMA index_list(\"{}\")", table.replace('"', "\"\""));
                for row in self.fetch_by_table(&list, table).await? {
                    let name: String = row.try_get("name")?;
                    let unique: i64 = row.try_get("unique")?;
                    let origin: String = row.try_get("origin")?;

                    let info = format!("PRAGMA index_info(\"{}\")", name.replace('"', "\"\""));
                    for col in self.fetch_by_table(&info, table).await? {
                        let seqno: i64 = col.try_get("seqno")?;
                        let column: Option<String> = col.try_get("name")?;
                        let Some(column) = column else { continue };
                        by_column.entry(column).or_default().push(Index {
                            name: name.clone(),
                            unique: unique != 0,
                            primary: origin == "pk",
                            priority: u32::try_from(seqno + 1).unwrap_or(1),
                        });
                    }
                }
            }
            Drivers::Postgres => {
                let query = "SELECT i.relname::TEXT, a.attname::TEXT, ix.indisunique, ix.indisprimary, \
                             array_position(ix.indkey::INT2[], a.attnum)::INT8 \
                             FROM pg_class t \
                             JOIN pg_index ix ON t.oid = ix.indrelid \
                             JOIN pg_class i ON i.oid = ix.indexrelid \
                             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
                             WHERE t.relname = $1 ORDER BY i.relname";
                for row in self.fetch_by_table(query, table).await? {
                    let name: String = row.try_get(0)?;
                    let column: String = row.try_get(1)?;
                    let unique: bool = row.try_get(2)?;
                    let primary: bool = row.try_get(3)?;
                    let position: Option<i64> = row.try_get(4)?;
                    by_column.entry(column).or_default().push(Index {
                        name,
                        unique,
                        primary,
                        priority: position.and_then(|p| u32::try_from(p).ok()).unwrap_or(1),
                    });
                }
            }
            Drivers::MySQL => {
                let query = "SELECT CAST(INDEX_NAME AS CHAR), CAST(COLUMN_NAME AS CHAR), CAST(NON_UNIQUE AS SIGNED), \
                             CAST(SEQ_IN_INDEX AS SIGNED) FROM information_schema.STATISTICS \
                             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY INDEX_NAME, SEQ_IN_INDEX";
                for row in self.fetch_by_table(query, table).await? {
                    let name: String = row.try_get(0)?;
                    let column: String = row.try_get(1)?;
                    let non_unique: i64 = row.try_get(2)?;
                    let seq: i64 = row.try_get(3)?;
                    by_column.entry(column).or_default().push(Index {
                        primary: name == "PRIMARY",
                        name,
                        unique: non_unique == 0,
                        priority: u32::try_from(seq).unwrap_or(1),
                    });
                }
            }
        }

        Ok(by_column)
    }
}

impl SchemaReader for SqlxSchemaReader {
    fn naming_strategy(&self) -> &dyn NamingStrategy {
        self.naming.as_ref()
    }

    fn get_tables(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(self.read_tables())
    }

    fn get_table_columns<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Vec<Column>>> {
        Box::pin(self.read_columns(table))
    }
}
