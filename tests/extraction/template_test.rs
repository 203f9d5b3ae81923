use std::sync::Arc;

use sumaris_extraction::database::SqliteDatabase;
use sumaris_extraction::extraction::{
    DaoRuntime, DomainFilter, ExtractionFormat, ExtractionOperator, Filter, FilterCriterion,
    TableNamingStrategy, TemplateError, TemplateRepository,
};
use sumaris_extraction::metadata::SqlType;
use sumaris_extraction::sql::{validate_sql, Dialect};

fn runtime(dialect: Dialect, adagio_schema: Option<&str>) -> DaoRuntime {
    let db = Arc::new(SqliteDatabase::open_in_memory().unwrap());
    DaoRuntime::new(
        db.clone(),
        db,
        Arc::new(TemplateRepository::builtin(dialect)),
        TableNamingStrategy::default(),
    )
    .with_adagio_schema(adagio_schema.map(str::to_string))
}

/// A filter enabling every optional group of every template.
fn full_filter() -> Filter {
    fn c(name: &str, operator: ExtractionOperator) -> FilterCriterion {
        FilterCriterion::new(name, operator)
    }

    Filter::new()
        .criterion(c("PROGRAM_LABEL", ExtractionOperator::In).values(["SIH-OBSMER", "SIH-OBSVENTE"]))
        .criterion(c("PROGRAM_ID", ExtractionOperator::Equals).value("1"))
        .criterion(c("STRATEGY_LABEL", ExtractionOperator::Equals).value("OBSMER-2021"))
        .criterion(c("STRATEGY_ID", ExtractionOperator::In).values(["10", "11"]))
        .criterion(c("LOCATION_ID", ExtractionOperator::In).values(["1"]))
        .criterion(c("STATUS_ID", ExtractionOperator::In).values(["1"]))
        .criterion(c("VESSEL_ID", ExtractionOperator::In).values(["1", "2"]))
        .criterion(c("VESSEL_TYPE_ID", ExtractionOperator::Equals).value("1"))
        .criterion(c("REGISTRATION_CODE", ExtractionOperator::Equals).value("FRA000000001"))
        .criterion(c("START_DATE", ExtractionOperator::GreaterOrEquals).value("2021-01-01"))
        .criterion(c("END_DATE", ExtractionOperator::LessOrEquals).value("2021-12-31"))
}

/// SQL of every sheet of `format`, with the domain filter applied.
fn render_all(runtime: &DaoRuntime, format: ExtractionFormat, filter: &Filter) -> Vec<(String, String)> {
    let context = runtime.create_context(format, filter);
    let domain = DomainFilter::translate(format, filter).unwrap();

    format
        .sheets()
        .iter()
        .map(|sheet| {
            let mut query = runtime
                .render_step(&context, sheet)
                .unwrap_or_else(|e| panic!("{format}/{}: {e}", sheet.name));
            domain.apply(&mut query);
            let sql = query
                .to_sql()
                .unwrap_or_else(|e| panic!("{format}/{}: {e}", sheet.name));
            (sheet.name.to_string(), sql)
        })
        .collect()
}

#[test]
fn test_builtin_templates_are_valid_sql() {
    for dialect in [Dialect::Postgres, Dialect::Sqlite] {
        let runtime = runtime(dialect, None);
        for format in ExtractionFormat::all() {
            for filter in [Filter::default(), full_filter()] {
                for (sheet, sql) in render_all(&runtime, format, &filter) {
                    validate_sql(&sql, dialect)
                        .unwrap_or_else(|e| panic!("{format}/{sheet} ({dialect}): {e}"));
                }
            }
        }
    }
}

#[test]
fn test_adagio_templates_are_valid_sql() {
    let runtime = runtime(Dialect::Postgres, Some("SIH2_ADAGIO_DBA"));
    for format in ExtractionFormat::all() {
        for (sheet, sql) in render_all(&runtime, format, &full_filter()) {
            validate_sql(&sql, Dialect::Postgres)
                .unwrap_or_else(|e| panic!("{format}/{sheet}: {e}"));
        }
    }
}

#[test]
fn test_dialect_groups_select_fragments() {
    let expectations = [
        (Dialect::Sqlite, "DATE(LA.LANDING_DATE_TIME)"),
        (Dialect::Postgres, "CAST(LA.LANDING_DATE_TIME AS DATE)"),
        (Dialect::HsqlDb, "CAST(LA.LANDING_DATE_TIME AS DATE)"),
        (Dialect::Oracle, "TRUNC(LA.LANDING_DATE_TIME)"),
    ];

    for (dialect, fragment) in expectations {
        let sqls = render_all(&runtime(dialect, None), ExtractionFormat::Strat, &Filter::default());
        let (_, monitoring) = &sqls[1];
        assert!(monitoring.contains(fragment), "{dialect}: {monitoring}");
        assert_eq!(monitoring.matches("REALIZED_EFFORT").count(), 1, "{dialect}");
    }
}

#[test]
fn test_domain_filter_enables_groups() {
    let runtime = runtime(Dialect::Sqlite, None);
    let sqls = render_all(&runtime, ExtractionFormat::Program, &full_filter());

    let (_, program) = &sqls[0];
    assert!(program.contains("P.LABEL IN ('SIH-OBSMER', 'SIH-OBSVENTE')"));
    assert!(program.contains("P.ID IN (1)"));
    assert!(program.contains("S.ID IN (10, 11)"));

    let (_, monitoring) = &sqls[2];
    assert!(monitoring.contains("APS.LOCATION_FK IN (1)"));
    assert!(monitoring.contains("AP.END_DATE >= DATETIME('2021-01-01 00:00:00')"));
    assert!(monitoring.contains("AP.START_DATE <= DATETIME('2021-12-31 00:00:00')"));

    let unfiltered = render_all(&runtime, ExtractionFormat::Program, &Filter::default());
    assert!(!unfiltered[0].1.contains("WHERE"));
}

#[test]
fn test_steps_reference_planned_tables() {
    let runtime = runtime(Dialect::Postgres, None);

    let sqls = render_all(&runtime, ExtractionFormat::Vessel, &Filter::default());

    assert!(sqls[0].1.starts_with("CREATE TABLE EXT_VE_"));
    for (sheet, sql) in &sqls[1..] {
        let table = format!("CREATE TABLE EXT_{sheet}_");
        assert!(sql.starts_with(&table), "{sheet}: {sql}");
        assert!(sql.contains("FROM EXT_VE_"), "{sheet}: {sql}");
    }
}

#[test]
fn test_template_metadata() {
    let repository = TemplateRepository::builtin(Dialect::Postgres);

    let strategy = repository.render("program/v1_0/strategy").unwrap();
    assert_eq!(
        strategy.hidden_column_names().into_iter().collect::<Vec<_>>(),
        vec!["PROGRAM_ID", "STRATEGY_ID"]
    );
    assert!(!strategy.has_distinct_option());

    let features = repository.render("vessel/v1_0/features").unwrap();
    assert!(features.has_distinct_option());
}

#[test]
fn test_declared_column_types() {
    let repository = TemplateRepository::builtin(Dialect::Sqlite);
    let mut monitoring = repository.render("program/v1_0/monitoring").unwrap();
    monitoring.set_group("sqlite", true);

    let types = monitoring.column_types();

    assert_eq!(types.get("REALIZED_EFFORT"), Some(&SqlType::Numeric));
    assert_eq!(types.get("EXPECTED_EFFORT"), Some(&SqlType::Numeric));
    assert_eq!(types.get("START_DATE"), Some(&SqlType::Timestamp));
    assert_eq!(types.get("STRATEGY_LABEL"), None);
}

#[test]
fn test_missing_template() {
    let repository = TemplateRepository::builtin(Dialect::Postgres);

    assert!(matches!(
        repository.load("program/v2_0/program"),
        Err(TemplateError::NotFound(_))
    ));
    assert!(matches!(
        repository.load("program/../program/v1_0/program"),
        Err(TemplateError::NotFound(_))
    ));
}

#[test]
fn test_unbound_placeholder() {
    let repository = TemplateRepository::builtin(Dialect::Postgres);
    let query = repository.render("program/v1_0/program").unwrap();

    match query.to_sql() {
        Err(TemplateError::UnboundPlaceholder { query, name }) => {
            assert_eq!(query, "program/v1_0/program");
            assert_eq!(name, "tableName");
        }
        other => panic!("expected an unbound placeholder, got {other:?}"),
    }
}

#[test]
fn test_template_dir_overrides_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program").join("v1_0");
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(
        path.join("program.xml"),
        r#"<query name="program" type="create" table="${tableName}">
             <select alias="PROGRAM_LABEL" type="text">P.LABEL</select>
             <from alias="P">PROGRAM</from>
           </query>"#,
    )
    .unwrap();

    let repository = TemplateRepository::builtin(Dialect::Postgres).with_template_dir(dir.path());

    let mut program = repository.render("program/v1_0/program").unwrap();
    program.bind("tableName", "EXT_PR_1");
    assert_eq!(
        program.to_sql().unwrap(),
        "CREATE TABLE EXT_PR_1 AS SELECT P.LABEL AS PROGRAM_LABEL FROM PROGRAM P"
    );

    // Anything not in the directory still comes from the builtin set.
    assert!(repository.load("program/v1_0/strategy").is_ok());
}
