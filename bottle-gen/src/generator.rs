//! # Generator Module
//!
//! Entry point of the library. A [`Generator`] owns the finalized [`Config`],
//! reads table columns through the configured schema reader, runs the
//! [`FieldDeriver`] and collects one [`ModelMeta`] per model. Each generated
//! model registers its relation fields, so models generated later can expand
//! relations that point to it.
//!
//! # Example
//!
//! ```rust,ignore
//! let reader = SqlxSchemaReader::connect(&url).await?;
//! let mut builder = ConfigBuilder::new();
//! builder.with_schema_reader(Arc::new(reader));
//!
//! let mut generator = Generator::new(builder.revise()?);
//! generator.generate_model("users", &[field_ignore(&["password"])]).await?;
//! generator.execute(&JsonRenderer::new(std::io::stdout()))?;
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use indexmap::IndexMap;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    column::Column,
    config::Config,
    generate::FieldDeriver,
    naming::check_struct_name,
    options::FieldOpt,
    registry::ModelRegistry,
    render::{ModelMeta, Renderer},
    Result,
};

pub struct Generator {
    config: Config,
    registry: ModelRegistry,
    models: IndexMap<String, ModelMeta>,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Self { config, registry: ModelRegistry::new(), models: IndexMap::new() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Registry used to expand relations, for models that are not generated here.
    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    /// Generated models in generation order.
    pub fn models(&self) -> impl Iterator<Item = &ModelMeta> {
        self.models.values()
    }

    pub fn model(&self, model_name: &str) -> Option<&ModelMeta> {
        self.models.get(model_name)
    }

    /// Generates the model of `table`, named by the model name strategy.
    pub async fn generate_model(&mut self, table: &str, opts: &[FieldOpt]) -> Result<&ModelMeta> {
        let model_name = self.config.model_name(table);
        self.generate_model_as(table, &model_name, opts).await
    }

    /// Generates the model of `table` with an explicit struct name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](crate::Error::Validation) when
    /// `model_name` is not a valid struct name; the schema reader is not
    /// queried in that case.
    pub async fn generate_model_as(&mut self, table: &str, model_name: &str, opts: &[FieldOpt]) -> Result<&ModelMeta> {
        check_struct_name(model_name)?;
        let columns = self.config.reader().get_table_columns(table).await?;
        if columns.is_empty() {
            log::warn!("table {} has no columns", table);
        }
        self.generate_model_from_columns(table, model_name, &columns, opts)
    }

    /// Generates a model from columns that were read elsewhere.
    pub fn generate_model_from_columns(
        &mut self,
        table: &str,
        model_name: &str,
        columns: &[Column],
        opts: &[FieldOpt],
    ) -> Result<&ModelMeta> {
        check_struct_name(model_name)?;

        let fields = FieldDeriver::new(&self.config, &self.registry).with_model_opts(opts).derive(columns)?;

        let relations = fields
            .iter()
            .filter_map(|field| field.relation.clone())
            .map(|mut relation| {
                relation.child_relations.clear();
                relation
            })
            .collect();
        self.registry.register(model_name, relations);

        let meta = ModelMeta {
            table_name: self.config.table_name(table),
            model_name: model_name.to_string(),
            file_name: self.config.file_name(table),
            model_pkg: self.config.model_pkg_path.clone(),
            query_pkg_name: self.config.query_pkg_name.clone(),
            out_file: self.config.out_file.display().to_string(),
            imports: self.config.import_pkg_paths.clone(),
            mode: self.config.mode,
            fields,
        };

        log::info!("generated model {} from table {} ({} fields)", model_name, table, meta.fields.len());

        let (index, previous) = self.models.insert_full(model_name.to_string(), meta);
        if previous.is_some() {
            log::warn!("model {} generated more than once, keeping the latest", model_name);
        }
        Ok(&self.models[index])
    }

    /// Generates a model for every table the schema reader reports.
    ///
    /// Returns the generated model names in table order.
    pub async fn generate_all_table(&mut self, opts: &[FieldOpt]) -> Result<Vec<String>> {
        let tables = self.config.reader().get_tables().await?;
        let mut names = Vec::with_capacity(tables.len());
        for table in &tables {
            let meta = self.generate_model(table, opts).await?;
            names.push(meta.model_name.clone());
        }
        Ok(names)
    }

    /// Hands every generated model to `renderer`.
    pub fn execute(&self, renderer: &dyn Renderer) -> Result<()> {
        if self.models.is_empty() {
            log::warn!("nothing to generate");
            return Ok(());
        }
        for model in self.models.values() {
            renderer.render(model, &self.config)?;
        }
        log::info!("generated {} models, query code at {}", self.models.len(), self.config.out_file.display());
        Ok(())
    }
}
