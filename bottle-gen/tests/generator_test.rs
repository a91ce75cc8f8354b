use std::sync::Arc;

use bottle_gen::{
    field::tag_key,
    options::{field_ignore, field_relate, RelateConfig},
    soft_delete::SOFT_DELETE_TIME_TYPE,
    Column, ColumnType, ConfigBuilder, Error, Generator, JsonRenderer, RelationshipKind, SqlxSchemaReader,
};

async fn sqlite_generator(setup: impl FnOnce(&mut ConfigBuilder)) -> Result<Generator, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let reader = SqlxSchemaReader::connect("sqlite::memory:").await?;

    sqlx::query(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email VARCHAR(128) NOT NULL DEFAULT '',
            password TEXT NOT NULL,
            deleted_at DATETIME
        )",
    )
    .execute(reader.pool())
    .await?;
    sqlx::query("CREATE UNIQUE INDEX idx_email ON users (email)").execute(reader.pool()).await?;
    sqlx::query("CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, title TEXT)")
        .execute(reader.pool())
        .await?;

    let mut builder = ConfigBuilder::new();
    builder.with_schema_reader(Arc::new(reader));
    setup(&mut builder);
    Ok(Generator::new(builder.revise()?))
}

#[tokio::test]
async fn test_generate_model_from_database() -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = sqlite_generator(|b| {
        b.field_with_index_tag = true;
        b.with_soft_delete_at("deleted_at");
    })
    .await?;

    let model = generator.generate_model("users", &[field_ignore(&["password"])]).await?;
    assert_eq!(model.model_name, "User");
    assert_eq!(model.table_name, "users");
    assert_eq!(model.file_name, "users");
    assert_eq!(model.imports, ["soft_delete"]);

    let names: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["ID", "Email", "DeletedAt"]);

    let email = model.field("Email").unwrap();
    assert_eq!(email.ty, "String");
    assert_eq!(email.tags.to_string(), "column:email;not null;uniqueIndex:idx_email,priority:1;default:''");
    assert_eq!(model.field("DeletedAt").unwrap().ty, SOFT_DELETE_TIME_TYPE);
    Ok(())
}

#[tokio::test]
async fn test_generate_all_tables() -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = sqlite_generator(|_| {}).await?;

    let names = generator.generate_all_table(&[]).await?;
    assert_eq!(names, ["Post", "User"]);
    assert_eq!(generator.models().count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_invalid_model_name_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = sqlite_generator(|_| {}).await?;

    let err = generator.generate_model_as("users", "user", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert!(generator.model("user").is_none());

    let model = generator.generate_model_as("users", "Account", &[]).await?;
    assert_eq!(model.model_name, "Account");
    Ok(())
}

#[tokio::test]
async fn test_execute_renders_json_lines() -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = sqlite_generator(|_| {}).await?;
    generator.generate_all_table(&[]).await?;

    let renderer = JsonRenderer::new(Vec::new());
    generator.execute(&renderer)?;
    let output = String::from_utf8(renderer.into_inner())?;

    let models: Vec<serde_json::Value> = output.lines().map(serde_json::from_str).collect::<Result<_, _>>()?;
    assert_eq!(models.len(), 2);
    assert_eq!(models[1]["model_name"], "User");
    assert_eq!(models[1]["fields"][1]["type"], "String");
    assert_eq!(models[1]["fields"][1]["tags"]["column"][0], "email");
    assert_eq!(models[1]["query_pkg_name"], "query");
    Ok(())
}

#[test]
fn test_relations_resolve_across_models() -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = Generator::new(ConfigBuilder::new().revise()?);

    let comment_columns = vec![Column::new("comments", ColumnType::new("id", "bigint").primary_key(true))];
    generator.generate_model_from_columns("comments", "Comment", &comment_columns, &[])?;

    let post_columns = vec![Column::new("posts", ColumnType::new("id", "bigint").primary_key(true))];
    let post_opts =
        [field_relate(RelationshipKind::HasMany, "Comments", "model::Comment", RelateConfig::default())];
    generator.generate_model_from_columns("posts", "Post", &post_columns, &post_opts)?;
    assert!(generator.registry().contains("Post"));

    let user_columns = vec![Column::new("users", ColumnType::new("id", "bigint").primary_key(true))];
    let mut tags = bottle_gen::TagMap::new();
    tags.set("foreignKey", "UserID");
    let user_opts = [field_relate(
        RelationshipKind::HasMany,
        "Posts",
        "model::Post",
        RelateConfig { tags, ..Default::default() },
    )];
    let user = generator.generate_model_from_columns("users", "User", &user_columns, &user_opts)?;

    let posts = user.field("Posts").unwrap();
    assert_eq!(posts.ty, "Vec<Post>");
    assert_eq!(posts.tags.first("foreignKey"), Some("UserID"));
    assert!(!posts.tags.contains(tag_key::COLUMN));

    let relation = posts.relation.as_ref().unwrap();
    assert_eq!(relation.child_relations.len(), 1);
    assert_eq!(relation.child_relations[0].field_name, "Comments");
    assert_eq!(relation.child_relations[0].field_type, "Vec<Comment>");
    Ok(())
}

#[test]
fn test_self_referencing_relation_terminates() -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = Generator::new(ConfigBuilder::new().revise()?);
    let columns = vec![Column::new("employees", ColumnType::new("id", "bigint").primary_key(true))];
    let opts = [field_relate(
        RelationshipKind::BelongsTo,
        "Manager",
        "Employee",
        RelateConfig { optional: true, ..Default::default() },
    )];

    generator.generate_model_from_columns("employees", "Employee", &columns, &opts)?;
    let employee = generator.generate_model_from_columns("employees", "Employee", &columns, &opts)?;

    let relation = employee.field("Manager").unwrap().relation.as_ref().unwrap();
    assert_eq!(relation.child_relations.len(), 1);
    assert!(relation.child_relations[0].child_relations.is_empty());
    Ok(())
}
