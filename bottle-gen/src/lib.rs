//! # Bottle Gen
//!
//! Model generation for Bottle ORM. Bottle Gen reads table metadata from a
//! database and derives the fields of the model structs that map those tables:
//! names, Rust types, ORM tags, JSON tags, soft-delete markers and relations.
//!
//! ## Pipeline
//!
//! 1. [`ConfigBuilder`] collects settings and is finalized into a [`Config`]
//! 2. a [`SchemaReader`] lists tables and their [`Column`]s
//! 3. [`generate::FieldDeriver`] turns columns into [`Field`]s, running the
//!    configured [`FieldOpt`] filter, modify and create chains
//! 4. a [`Renderer`] receives one [`render::ModelMeta`] per model
//!
//! ## Example
//!
//! ```rust,ignore
//! use bottle_gen::{options::field_ignore, ConfigBuilder, Generator, JsonRenderer, SqlxSchemaReader};
//! use std::sync::Arc;
//!
//! let reader = SqlxSchemaReader::connect("sqlite:app.db").await?;
//! let mut builder = ConfigBuilder::new();
//! builder.field_nullable = true;
//! builder.with_schema_reader(Arc::new(reader)).with_soft_delete_at("deleted_at");
//!
//! let mut generator = Generator::new(builder.revise()?);
//! generator.generate_all_table(&[field_ignore(&["password"])]).await?;
//! generator.execute(&JsonRenderer::new(std::io::stdout()))?;
//! ```

pub mod column;
pub mod config;
pub mod error;
pub mod field;
pub mod generate;
pub mod generator;
pub mod naming;
pub mod options;
pub mod registry;
pub mod render;
pub mod schema;
pub mod soft_delete;
pub mod types;

pub use column::{Column, ColumnType, Index};
pub use config::{Config, ConfigBuilder, GenerateMode};
pub use error::{Error, Result};
pub use field::{Field, Relation, RelationshipKind, TagMap};
pub use generator::Generator;
pub use naming::{DefaultNamingStrategy, NamingStrategy};
pub use options::FieldOpt;
pub use registry::{ModelRegistry, RelationResolver};
pub use render::{JsonRenderer, ModelMeta, Renderer};
pub use schema::{Drivers, SchemaReader, SqlxSchemaReader};
pub use soft_delete::SoftDeletePolicy;
