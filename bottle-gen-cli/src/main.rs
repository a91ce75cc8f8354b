use std::{env, io, sync::Arc};

use bottle_gen::{ConfigBuilder, Drivers, Generator, JsonRenderer, SqlxSchemaReader};

fn env_flag(key: &str) -> bool {
	matches!(env::var(key).as_deref(), Ok("1" | "true" | "yes"))
}

fn env_or_empty(key: &str) -> String {
	env::var(key).unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();
	env_logger::init();

	let url = env::var("DATABASE_URL")?;
	log::info!("reading schema from {:?} database", Drivers::from_url(&url));
	let reader = SqlxSchemaReader::connect(&url).await?;

	let mut builder = ConfigBuilder::new();
	builder.out_path = env_or_empty("BOTTLE_GEN_OUT_PATH");
	builder.model_pkg_path = env_or_empty("BOTTLE_GEN_MODEL_PKG");
	builder.field_nullable = env_flag("BOTTLE_GEN_FIELD_NULLABLE");
	builder.field_coverable = env_flag("BOTTLE_GEN_FIELD_COVERABLE");
	builder.field_signable = env_flag("BOTTLE_GEN_FIELD_SIGNABLE");
	builder.field_with_index_tag = env_flag("BOTTLE_GEN_FIELD_WITH_INDEX_TAG");
	builder.field_with_type_tag = env_flag("BOTTLE_GEN_FIELD_WITH_TYPE_TAG");
	builder
		.with_schema_reader(Arc::new(reader))
		.with_soft_delete_flag(&env_or_empty("BOTTLE_GEN_SOFT_DELETE_FLAG"))
		.with_soft_delete_at(&env_or_empty("BOTTLE_GEN_SOFT_DELETE_AT"));

	let mut generator = Generator::new(builder.revise()?);

	let tables = env_or_empty("BOTTLE_GEN_TABLES");
	let tables: Vec<&str> = tables.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
	if tables.is_empty() {
		let models = generator.generate_all_table(&[]).await?;
		log::info!("generated models for all tables: {}", models.join(", "));
	} else {
		for table in tables {
			let model = generator.generate_model(table, &[]).await?;
			log::debug!("table {} -> {}", table, model.model_name);
		}
	}
	log::info!("query package {} at {}", generator.config().query_pkg_name, generator.config().out_file.display());

	generator.execute(&JsonRenderer::new(io::stdout()))?;
	Ok(())
}
