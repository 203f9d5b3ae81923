use std::sync::Arc;
use std::time::Duration;

use sumaris_extraction::cache::CachedMetadataProvider;
use sumaris_extraction::database::{PersistenceError, QueryExecutor, SqlValue, SqliteDatabase};
use sumaris_extraction::metadata::{SqlType, TableMetadataProvider};
use sumaris_extraction::sql::{AlterTable, Dialect, DropTable, SqlDialect};

const SCHEMA: &str = "
    CREATE TABLE EXT_ST_1 (
        STRATEGY_ID INTEGER NOT NULL,
        STRATEGY_LABEL VARCHAR(40) NOT NULL,
        ANALYTIC_REFERENCE TEXT,
        CREATION_DATE TIMESTAMP
    );
    INSERT INTO EXT_ST_1 VALUES (10, 'OBSMER-2021', 'REF-A', '2021-01-01 00:00:00');
    INSERT INTO EXT_ST_1 VALUES (11, 'OBSMER-2022', NULL, NULL);
";

#[test]
fn test_file_database_persists_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sumaris.db");

    {
        let db = SqliteDatabase::open(&path).unwrap();
        db.execute_batch(SCHEMA).unwrap();
    }

    let db = SqliteDatabase::open(&path).unwrap();
    assert_eq!(db.execute_count("SELECT COUNT(*) FROM EXT_ST_1").unwrap(), 2);
    assert!(db.exists("ext_st_1").unwrap());
}

#[test]
fn test_rows_keep_sqlite_types() {
    let db = SqliteDatabase::open_in_memory().unwrap();
    db.execute_batch(SCHEMA).unwrap();

    let rows = db
        .execute_query(
            "SELECT STRATEGY_ID, STRATEGY_LABEL, ANALYTIC_REFERENCE, 1.5, X'CAFE' \
             FROM EXT_ST_1 ORDER BY STRATEGY_ID",
        )
        .unwrap();

    assert_eq!(rows[0][0], SqlValue::Integer(10));
    assert_eq!(rows[0][1].to_display().as_deref(), Some("OBSMER-2021"));
    assert!(rows[1][2].is_null());
    assert_eq!(rows[0][3].to_display().as_deref(), Some("1.5"));
    assert_eq!(rows[0][4].to_display().as_deref(), Some("yv4="));
}

#[test]
fn test_metadata_follows_declared_types() {
    let db = SqliteDatabase::open_in_memory().unwrap();
    db.execute_batch(SCHEMA).unwrap();

    let table = db.get_table("EXT_ST_1").unwrap();

    let types: Vec<SqlType> = table.columns.iter().map(|c| c.sql_type()).collect();
    assert_eq!(
        types,
        vec![
            SqlType::Integer,
            SqlType::Varchar,
            SqlType::LongVarchar,
            SqlType::Timestamp
        ]
    );
    let nullable: Vec<bool> = table.columns.iter().map(|c| c.nullable).collect();
    assert_eq!(nullable, vec![false, false, true, true]);
}

#[test]
fn test_create_table_as_keeps_affinities() {
    let db = SqliteDatabase::open_in_memory().unwrap();
    db.execute_batch(SCHEMA).unwrap();

    db.execute_update(&Dialect::Sqlite.create_table_as(
        "EXT_SM_1",
        "SELECT S.STRATEGY_ID, S.STRATEGY_LABEL, S.CREATION_DATE, COUNT(*) AS N \
         FROM EXT_ST_1 S GROUP BY S.STRATEGY_ID, S.STRATEGY_LABEL, S.CREATION_DATE",
    ))
    .unwrap();

    let table = db.get_table("EXT_SM_1").unwrap();
    assert!(table.columns[0].sql_type().is_numeric());
    assert!(table.columns[1].sql_type().is_text());
    assert_eq!(db.execute_count("SELECT COUNT(*) FROM EXT_SM_1").unwrap(), 2);
}

#[test]
fn test_cache_is_invalidated_after_alter() {
    let db = Arc::new(SqliteDatabase::open_in_memory().unwrap());
    db.execute_batch(SCHEMA).unwrap();
    let cache = CachedMetadataProvider::new(db.clone());

    assert_eq!(cache.get_table("EXT_ST_1").unwrap().columns.len(), 4);
    assert_eq!(cache.get_table("ext_st_1").unwrap().columns.len(), 4);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);

    let statements = AlterTable::new("EXT_ST_1")
        .drop_columns(["STRATEGY_ID".to_string()])
        .rename_to("P_SIH_ST")
        .to_statements(Dialect::Sqlite);
    assert_eq!(statements.len(), 2);
    for sql in &statements {
        db.execute_update(sql).unwrap();
    }

    // Stale until told otherwise.
    assert!(cache.exists("EXT_ST_1").unwrap());
    cache.invalidate("EXT_ST_1");

    assert!(!cache.exists("EXT_ST_1").unwrap());
    assert!(matches!(
        cache.get_table("EXT_ST_1"),
        Err(PersistenceError::TableNotFound(_))
    ));
    let product = cache.get_table("P_SIH_ST").unwrap();
    assert_eq!(
        product.column_names(),
        vec!["STRATEGY_LABEL", "ANALYTIC_REFERENCE", "CREATION_DATE"]
    );
}

#[test]
fn test_drop_table_if_exists() {
    let db = SqliteDatabase::open_in_memory().unwrap();
    db.execute_batch(SCHEMA).unwrap();
    let sql = DropTable::new("EXT_ST_1").if_exists().to_sql(Dialect::Sqlite);

    db.execute_update(&sql).unwrap();
    assert!(!db.exists("EXT_ST_1").unwrap());

    // Dropping again is a no-op.
    db.execute_update(&sql).unwrap();
}

#[test]
fn test_timeout_is_reported() {
    let db = SqliteDatabase::open_in_memory()
        .unwrap()
        .with_timeout(Duration::from_millis(20));

    let err = db
        .execute_query(
            "WITH RECURSIVE N(X) AS (SELECT 1 UNION ALL SELECT X + 1 FROM N) \
             SELECT MAX(X) FROM N",
        )
        .unwrap_err();

    assert!(err.is_timeout(), "{err}");
}
