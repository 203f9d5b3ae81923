//! WHERE clauses evaluated against a real table: the inverse clause must
//! select exactly the rows the normal clause leaves out.

use sumaris_extraction::database::{QueryExecutor, SqliteDatabase};
use sumaris_extraction::extraction::{
    ExtractionOperator, Filter, FilterCriterion, LogicalOperator, PredicateError, WhereClause,
};
use sumaris_extraction::metadata::TableMetadataProvider;
use sumaris_extraction::sql::Dialect;

const TABLE: &str = "EXT_ST_1";

fn database() -> SqliteDatabase {
    let db = SqliteDatabase::open_in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE EXT_ST_1 (
             STRATEGY_ID INTEGER NOT NULL,
             STRATEGY_LABEL TEXT NOT NULL,
             ANALYTIC_REFERENCE TEXT,
             CREATION_DATE TIMESTAMP
         );
         INSERT INTO EXT_ST_1 VALUES
             (1, 'S1', 'A', '2020-01-01 00:00:00'),
             (2, 'S2', 'B', '2020-06-01 00:00:00'),
             (3, 'S3', NULL, '2021-01-01 00:00:00'),
             (4, 'S4', 'A', NULL),
             (5, 'S5', 'C', '2022-01-01 00:00:00'),
             (6, 'S6', NULL, '2022-06-01 00:00:00');",
    )
    .unwrap();
    db
}

fn count(db: &SqliteDatabase, clause: &str) -> i64 {
    let sql = if clause.is_empty() {
        format!("SELECT COUNT(*) FROM {TABLE}")
    } else {
        format!("SELECT COUNT(*) FROM {TABLE} WHERE {clause}")
    };
    db.execute_count(&sql).unwrap()
}

/// Rows matched by the clause and by its inverse.
fn split(db: &SqliteDatabase, filter: &Filter) -> (i64, i64) {
    let table = db.get_table(TABLE).unwrap();
    let normal = WhereClause::new(Dialect::Sqlite, &table, filter).build().unwrap();
    let inverse = WhereClause::new(Dialect::Sqlite, &table, filter)
        .inverse(true)
        .build()
        .unwrap();
    (count(db, &normal), count(db, &inverse))
}

fn criterion(name: &str, op: ExtractionOperator) -> FilterCriterion {
    FilterCriterion::new(name, op)
}

#[test]
fn test_inverse_partitions_rows_on_nullable_text() {
    let db = database();
    let criteria = [
        criterion("ANALYTIC_REFERENCE", ExtractionOperator::Equals).value("A"),
        criterion("ANALYTIC_REFERENCE", ExtractionOperator::NotEquals).value("A"),
        criterion("ANALYTIC_REFERENCE", ExtractionOperator::In).values(["A", "B"]),
        criterion("ANALYTIC_REFERENCE", ExtractionOperator::NotIn).values(["C"]),
        criterion("ANALYTIC_REFERENCE", ExtractionOperator::Between).values(["A", "B"]),
        criterion("ANALYTIC_REFERENCE", ExtractionOperator::NotBetween).values(["B", "C"]),
        criterion("ANALYTIC_REFERENCE", ExtractionOperator::Null),
        criterion("ANALYTIC_REFERENCE", ExtractionOperator::NotNull),
    ];

    for c in criteria {
        let filter = Filter::new().criterion(c.clone());
        let (normal, inverse) = split(&db, &filter);
        assert_eq!(normal + inverse, 6, "{:?} {}", c.operator, c.name);
    }
}

#[test]
fn test_inverse_partitions_rows_on_numbers() {
    let db = database();

    for op in [
        ExtractionOperator::Equals,
        ExtractionOperator::NotEquals,
        ExtractionOperator::Less,
        ExtractionOperator::LessOrEquals,
        ExtractionOperator::Greater,
        ExtractionOperator::GreaterOrEquals,
    ] {
        let filter = Filter::new().criterion(criterion("STRATEGY_ID", op).value("3"));
        let (normal, inverse) = split(&db, &filter);
        assert_eq!(normal + inverse, 6, "{op}");
    }

    let between = Filter::new()
        .criterion(criterion("STRATEGY_ID", ExtractionOperator::Between).values(["2", "4"]));
    assert_eq!(split(&db, &between), (3, 3));
}

#[test]
fn test_inverse_partitions_rows_for_every_join() {
    let db = database();

    for op in LogicalOperator::ALL {
        let filter = Filter::new()
            .operator(op)
            .criterion(criterion("STRATEGY_ID", ExtractionOperator::Greater).value("2"))
            .criterion(criterion("STRATEGY_LABEL", ExtractionOperator::In).values(["S1", "S4"]));
        let (normal, inverse) = split(&db, &filter);
        assert_eq!(normal + inverse, 6, "{op}");
    }

    // Mixed with a nullable column.
    for op in LogicalOperator::ALL {
        let filter = Filter::new()
            .operator(op)
            .criterion(criterion("ANALYTIC_REFERENCE", ExtractionOperator::Equals).value("A"))
            .criterion(criterion("STRATEGY_ID", ExtractionOperator::Greater).value("2"));
        let (normal, inverse) = split(&db, &filter);
        assert_eq!(normal + inverse, 6, "{op}");
    }
}

#[test]
fn test_null_dates_fail_range_criteria() {
    let db = database();

    // Row 4 has no CREATION_DATE: it never matches, so the inverse keeps it.
    for (op, expected) in [
        (ExtractionOperator::GreaterOrEquals, (3, 3)),
        (ExtractionOperator::Greater, (2, 4)),
        (ExtractionOperator::Less, (2, 4)),
        (ExtractionOperator::LessOrEquals, (3, 3)),
    ] {
        let filter = Filter::new().criterion(criterion("CREATION_DATE", op).value("2021-01-01"));
        assert_eq!(split(&db, &filter), expected, "{op}");
    }

    for op in LogicalOperator::ALL {
        let filter = Filter::new()
            .operator(op)
            .criterion(criterion("CREATION_DATE", ExtractionOperator::GreaterOrEquals).value("2021-01-01"))
            .criterion(criterion("ANALYTIC_REFERENCE", ExtractionOperator::Equals).value("A"));
        let (normal, inverse) = split(&db, &filter);
        assert_eq!(normal + inverse, 6, "{op}");
    }
}

#[test]
fn test_negated_joins() {
    let db = database();
    let filter = |op| {
        Filter::new()
            .operator(op)
            .criterion(criterion("STRATEGY_ID", ExtractionOperator::Less).value("3"))
            .criterion(criterion("STRATEGY_LABEL", ExtractionOperator::Equals).value("S1"))
    };

    // NOT (ID < 3 AND LABEL = 'S1') keeps everything but S1.
    assert_eq!(split(&db, &filter(LogicalOperator::AndNot)), (5, 1));
    // NOT (ID < 3 OR LABEL = 'S1') keeps ids 3 to 6.
    assert_eq!(split(&db, &filter(LogicalOperator::OrNot)), (4, 2));
}

#[test]
fn test_dates_compare_as_dates() {
    let db = database();
    let filter = Filter::new().criterion(
        criterion("CREATION_DATE", ExtractionOperator::GreaterOrEquals).value("01/01/2021"),
    );

    let table = db.get_table(TABLE).unwrap();
    let clause = WhereClause::new(Dialect::Sqlite, &table, &filter).build().unwrap();

    assert_eq!(clause, "CREATION_DATE >= DATETIME('2021-01-01 00:00:00')");
    assert_eq!(count(&db, &clause), 3);
}

#[test]
fn test_sheet_scoped_criteria() {
    let db = database();
    let table = db.get_table(TABLE).unwrap();
    let filter = Filter::new()
        .criterion(criterion("STRATEGY_ID", ExtractionOperator::Equals).value("1").sheet("PR"))
        .criterion(criterion("STRATEGY_ID", ExtractionOperator::In).values(["2", "3"]).sheet("ST"));

    let clause = WhereClause::new(Dialect::Sqlite, &table, &filter)
        .sheet(Some("st"))
        .alias(Some("T"))
        .build()
        .unwrap();
    assert_eq!(clause, "T.STRATEGY_ID IN (2, 3)");

    let none = WhereClause::new(Dialect::Sqlite, &table, &filter).build().unwrap();
    assert_eq!(none, "");
}

#[test]
fn test_strict_and_lenient_modes() {
    let db = database();
    let table = db.get_table(TABLE).unwrap();
    let filter = Filter::new()
        .criterion(criterion("VESSEL_ID", ExtractionOperator::Equals).value("1"))
        .criterion(criterion("STRATEGY_ID", ExtractionOperator::Between).values(["1"]));

    assert!(matches!(
        WhereClause::new(Dialect::Sqlite, &table, &filter).build(),
        Err(PredicateError::UnknownColumn { .. })
    ));

    let lenient = WhereClause::new(Dialect::Sqlite, &table, &filter)
        .skip_invalid(true)
        .build()
        .unwrap();
    assert_eq!(lenient, "");
}

#[test]
fn test_escaped_quotes_match_literally() {
    let db = database();
    db.execute_update("INSERT INTO EXT_ST_1 VALUES (7, 'O''BRIEN', NULL, NULL)")
        .unwrap();
    let filter = Filter::new()
        .criterion(criterion("STRATEGY_LABEL", ExtractionOperator::Equals).value("O'BRIEN"))
        .escaped();

    let (normal, inverse) = split(&db, &filter);

    assert_eq!((normal, inverse), (1, 6));
}
