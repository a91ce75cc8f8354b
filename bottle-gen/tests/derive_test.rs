use bottle_gen::{
    field::tag_key,
    generate::FieldDeriver,
    options::{field_ignore, field_ignore_matching, field_relate, field_rename, field_type, RelateConfig},
    soft_delete::{SOFT_DELETE_FLAG_TYPE, SOFT_DELETE_TIME_TYPE},
    Column, ColumnType, Config, ConfigBuilder, Error, Field, FieldOpt, ModelRegistry, Relation, RelationshipKind,
};

fn config(setup: impl FnOnce(&mut ConfigBuilder)) -> Result<Config, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut builder = ConfigBuilder::new();
    setup(&mut builder);
    Ok(builder.revise()?)
}

fn derive(config: &Config, columns: &[Column], opts: &[FieldOpt]) -> Result<Vec<Field>, Error> {
    let registry = ModelRegistry::new();
    FieldDeriver::new(config, &registry).with_model_opts(opts).derive(columns)
}

fn users_columns() -> Vec<Column> {
    vec![
        Column::new("users", ColumnType::new("id", "int").with_column_type(Some("int(11)".into())).primary_key(true)),
        Column::new("users", ColumnType::new("name", "varchar").with_column_type(Some("varchar(64)".into()))),
        Column::new("users", ColumnType::new("age", "int").with_column_type(Some("int(11)".into())).nullable(true)),
        Column::new("users", ColumnType::new("score", "int").with_column_type(Some("int(11)".into())).with_default("0")),
        Column::new("users", ColumnType::new("password", "varchar").with_column_type(Some("varchar(255)".into()))),
    ]
}

fn field<'a>(fields: &'a [Field], column: &str) -> &'a Field {
    fields.iter().find(|f| f.column_name == column).unwrap()
}

#[test]
fn test_fields_follow_column_order() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|_| {})?;
    let fields = derive(&config, &users_columns(), &[])?;

    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["ID", "Name", "Age", "Score", "Password"]);
    assert_eq!(fields[0].tags.to_string(), "column:id;primaryKey;autoIncrement:true");
    assert_eq!(fields[1].json_tag(), Some("name"));
    Ok(())
}

#[test]
fn test_nullable_policy() -> Result<(), Box<dyn std::error::Error>> {
    let plain = config(|_| {})?;
    let fields = derive(&plain, &users_columns(), &[])?;
    assert_eq!(field(&fields, "age").ty, "i32");

    let nullable = config(|b| b.field_nullable = true)?;
    let fields = derive(&nullable, &users_columns(), &[])?;
    assert_eq!(field(&fields, "age").ty, "Option<i32>");
    assert_eq!(field(&fields, "name").ty, "String");
    Ok(())
}

#[test]
fn test_coverable_policy() -> Result<(), Box<dyn std::error::Error>> {
    let coverable = config(|b| b.field_coverable = true)?;
    let fields = derive(&coverable, &users_columns(), &[])?;
    assert_eq!(field(&fields, "score").ty, "Option<i32>");
    assert_eq!(field(&fields, "age").ty, "i32");

    let both = config(|b| {
        b.field_coverable = true;
        b.field_nullable = true;
    })?;
    let columns =
        vec![Column::new("t", ColumnType::new("rank", "int").nullable(true).with_default("1"))];
    assert_eq!(derive(&both, &columns, &[])?[0].ty, "Option<i32>");
    Ok(())
}

#[test]
fn test_signable_policy() -> Result<(), Box<dyn std::error::Error>> {
    let columns = vec![Column::new(
        "t",
        ColumnType::new("views", "bigint").with_column_type(Some("bigint unsigned".into())),
    )];

    assert_eq!(derive(&config(|_| {})?, &columns, &[])?[0].ty, "i64");
    assert_eq!(derive(&config(|b| b.field_signable = true)?, &columns, &[])?[0].ty, "u64");
    Ok(())
}

#[test]
fn test_type_tag_is_opt_in() -> Result<(), Box<dyn std::error::Error>> {
    let fields = derive(&config(|_| {})?, &users_columns(), &[])?;
    assert!(fields.iter().all(|f| !f.tags.contains(tag_key::TYPE)));

    let fields = derive(&config(|b| b.field_with_type_tag = true)?, &users_columns(), &[])?;
    assert_eq!(field(&fields, "name").tags.first(tag_key::TYPE), Some("varchar(64)"));
    Ok(())
}

#[test]
fn test_filter_in_any_position_drops_field() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|_| {})?;
    let keep_all = FieldOpt::filter("keep_all", |_: &Field| Ok(true));

    let fields = derive(&config, &users_columns(), &[keep_all.clone(), field_ignore(&["password"])])?;
    assert!(fields.iter().all(|f| f.column_name != "password"));

    let fields = derive(&config, &users_columns(), &[field_ignore(&["password"]), keep_all])?;
    assert!(fields.iter().all(|f| f.column_name != "password"));

    let fields = derive(&config, &users_columns(), &[field_ignore_matching(|c| c.starts_with('a'))])?;
    assert_eq!(fields.len(), 4);
    Ok(())
}

#[test]
fn test_modifiers_apply_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|_| {})?;
    let first = FieldOpt::modify("first", |mut f: Field| {
        f.comment = "a".into();
        Ok(f)
    });
    let second = FieldOpt::modify("second", |mut f: Field| {
        f.comment.push('b');
        Ok(f)
    });

    let fields = derive(&config, &users_columns(), &[first.clone(), second.clone()])?;
    assert!(fields.iter().all(|f| f.comment == "ab"));

    let fields = derive(&config, &users_columns(), &[second, first])?;
    assert!(fields.iter().all(|f| f.comment == "a"));
    Ok(())
}

#[test]
fn test_global_options_run_before_model_options() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|b| {
        b.with_opts([field_type("age", "i64")]);
    })?;

    let fields = derive(&config, &users_columns(), &[])?;
    assert_eq!(field(&fields, "age").ty, "i64");

    let fields = derive(&config, &users_columns(), &[field_type("age", "u8")])?;
    assert_eq!(field(&fields, "age").ty, "u8");
    Ok(())
}

fn soft_delete_columns() -> Vec<Column> {
    vec![
        Column::new("orders", ColumnType::new("id", "bigint").primary_key(true)),
        Column::new(
            "orders",
            ColumnType::new("is_delete", "tinyint").with_column_type(Some("tinyint(1)".into())).with_default("0"),
        ),
        Column::new("orders", ColumnType::new("update_time", "datetime").nullable(true)),
    ]
}

#[test]
fn test_soft_delete_mixed_mode() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|b| {
        b.field_nullable = true;
        b.with_soft_delete_flag("is_delete").with_soft_delete_at("update_time");
    })?;
    let fields = derive(&config, &soft_delete_columns(), &[])?;

    let flag = field(&fields, "is_delete");
    assert_eq!(flag.ty, SOFT_DELETE_FLAG_TYPE);
    assert_eq!(flag.tags.first(tag_key::SOFT_DELETE), Some("flag"));
    assert_eq!(flag.tags.first(tag_key::DELETED_AT_FIELD), Some("UpdateTime"));

    let time = field(&fields, "update_time");
    assert_eq!(time.ty, SOFT_DELETE_TIME_TYPE);
    assert_eq!(time.name, "UpdateTime");
    Ok(())
}

#[test]
fn test_soft_delete_reference_survives_filtered_time_field() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|b| {
        b.with_soft_delete_flag("is_delete").with_soft_delete_at("update_time");
    })?;
    let fields = derive(&config, &soft_delete_columns(), &[field_ignore(&["update_time"])])?;

    assert_eq!(fields.len(), 2);
    let flag = field(&fields, "is_delete");
    assert_eq!(flag.tags.first(tag_key::DELETED_AT_FIELD), Some("UpdateTime"));
    Ok(())
}

#[test]
fn test_soft_delete_time_only_and_flag_only() -> Result<(), Box<dyn std::error::Error>> {
    let time_only = config(|b| {
        b.with_soft_delete_at("update_time");
    })?;
    let fields = derive(&time_only, &soft_delete_columns(), &[])?;
    assert_eq!(field(&fields, "update_time").ty, SOFT_DELETE_TIME_TYPE);
    assert_eq!(field(&fields, "is_delete").ty, "bool");

    let flag_only = config(|b| {
        b.with_soft_delete_flag("is_delete");
    })?;
    let fields = derive(&flag_only, &soft_delete_columns(), &[])?;
    let flag = field(&fields, "is_delete");
    assert_eq!(flag.ty, SOFT_DELETE_FLAG_TYPE);
    assert!(!flag.tags.contains(tag_key::DELETED_AT_FIELD));
    Ok(())
}

#[test]
fn test_explicit_names_are_validated() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|_| {})?;

    let fields = derive(&config, &users_columns(), &[field_rename("name", "MyField")])?;
    assert_eq!(field(&fields, "name").name, "MyField");

    for bad in ["myField", "My-Field", ""] {
        let err = derive(&config, &users_columns(), &[field_rename("name", bad)]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "{bad:?} should be rejected");
    }
    Ok(())
}

#[test]
fn test_option_error_aborts_derivation() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|_| {})?;
    let failing = FieldOpt::filter("failing", |f: &Field| {
        if f.column_name == "age" { Err(Error::option("failing", "cannot decide")) } else { Ok(true) }
    });

    let err = derive(&config, &users_columns(), &[failing]).unwrap_err();
    assert!(matches!(err, Error::Option { ref option, .. } if option == "failing"));
    Ok(())
}

#[test]
fn test_created_fields_follow_columns() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|_| {})?;
    let opts = [
        field_relate(RelationshipKind::HasMany, "Posts", "model::Post", RelateConfig::default()),
        field_relate(
            RelationshipKind::BelongsTo,
            "Company",
            "model::Company",
            RelateConfig { optional: true, ..Default::default() },
        ),
    ];
    let fields = derive(&config, &users_columns(), &opts)?;

    assert_eq!(fields.len(), 7);
    assert_eq!(fields[5].name, "Posts");
    assert_eq!(fields[5].ty, "Vec<Post>");
    assert_eq!(fields[5].json_tag(), Some("posts"));
    assert_eq!(fields[6].ty, "Option<Company>");
    assert_eq!(fields[6].relation.as_ref().map(|r| r.field_type.as_str()), Some("Option<Company>"));
    Ok(())
}

#[test]
fn test_relations_expand_after_existing_children() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|_| {})?;
    let mut registry = ModelRegistry::new();
    registry
        .register(
            "Post",
            vec![
                Relation::new(RelationshipKind::HasMany, "Comments", "Vec<Comment>").with_model("Comment"),
                Relation::new(RelationshipKind::BelongsTo, "Author", "User").with_model("User"),
            ],
        )
        .register("Comment", vec![Relation::new(RelationshipKind::BelongsTo, "Post", "Post").with_model("Post")]);

    let create = FieldOpt::create("posts_with_tags", || {
        let mut relation = Relation::new(RelationshipKind::HasMany, "Posts", "Vec<model::Post>").with_model("Post");
        relation.append_child_relation([Relation::new(RelationshipKind::ManyToMany, "Tags", "Vec<Tag>")]);
        let mut field = Field::new("", "Vec<model::Post>");
        field.rename("Posts");
        Ok(field.with_relation(relation))
    });

    let fields = FieldDeriver::new(&config, &registry).with_model_opts(&[create]).derive(&[])?;
    let relation = fields[0].relation.as_ref().unwrap();
    let children: Vec<&str> = relation.child_relations.iter().map(|r| r.field_name.as_str()).collect();
    assert_eq!(children, ["Tags", "Comments", "Author"]);
    // Comment -> Post leads back to the expanded model and stays a leaf.
    let back = &relation.child_relations[1].child_relations[0];
    assert_eq!(back.field_name, "Post");
    assert!(back.child_relations.is_empty());
    assert_eq!(fields[0].ty, "Vec<Post>");
    Ok(())
}

#[test]
fn test_unregistered_relation_target_is_kept() -> Result<(), Box<dyn std::error::Error>> {
    let config = config(|_| {})?;
    let opts = [field_relate(RelationshipKind::HasOne, "Profile", "Profile", RelateConfig::default())];
    let fields = derive(&config, &[], &opts)?;

    assert_eq!(fields.len(), 1);
    assert!(fields[0].relation.as_ref().unwrap().child_relations.is_empty());
    Ok(())
}
