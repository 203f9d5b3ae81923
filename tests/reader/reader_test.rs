use std::collections::BTreeSet;

use sumaris_extraction::database::SqliteDatabase;
use sumaris_extraction::extraction::{
    ExtractionError, ExtractionOperator, Filter, FilterCriterion, PredicateError,
};
use sumaris_extraction::metadata::ColumnMetadata;
use sumaris_extraction::reader::{
    column_ranks, rank_columns, Page, ReadOptions, TableRowsReader, DEFAULT_PAGE_SIZE,
};
use sumaris_extraction::sql::{Dialect, SortDir};

fn database() -> SqliteDatabase {
    let db = SqliteDatabase::open_in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE EXT_VF_1 (
             VESSEL_FEATURES_ID INT,
             VESSEL_ID INT,
             EXTERIOR_MARKING TEXT,
             VESSEL_NAME TEXT,
             LENGTH_OVER_ALL REAL
         );
         INSERT INTO EXT_VF_1 VALUES
             (1, 1, 'BL123', 'Avel', 12.5),
             (2, 2, 'BR456', 'Morgan', 9.8),
             (3, 2, 'BR456', 'Morgane', 9.8),
             (4, 3, 'LR789', 'Ar Men', 15.0),
             (5, 4, 'LR790', 'Belle Ile', 11.25);",
    )
    .unwrap();
    db
}

fn hidden(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

const PREFERRED: &[&str] = &["VESSEL_ID", "EXTERIOR_MARKING", "VESSEL_NAME", "LENGTH_OVER_ALL"];

#[test]
fn test_pages_cover_sorted_rows() {
    let db = database();
    let reader = TableRowsReader::new(&db, &db, Dialect::Sqlite);
    let options = ReadOptions {
        hidden_columns: hidden(&["VESSEL_FEATURES_ID"]),
        preferred_order: PREFERRED,
        ..ReadOptions::default()
    };

    let mut names = Vec::new();
    for offset in (0..5).step_by(2) {
        let page = Page::new(offset, 2).sort("VESSEL_NAME", SortDir::Desc);
        let rows = reader.get_table_rows("EXT_VF_1", &options, &page).unwrap();
        assert_eq!(rows.total, 5);
        assert!(rows.rows.len() <= 2);
        names.extend(rows.rows.into_iter().map(|row| row[2].clone().unwrap()));
    }

    assert_eq!(names, vec!["Morgane", "Morgan", "Belle Ile", "Avel", "Ar Men"]);
}

#[test]
fn test_offset_without_page_size_reads_the_rest() {
    let db = database();
    let reader = TableRowsReader::new(&db, &db, Dialect::Sqlite);
    let options = ReadOptions {
        hidden_columns: hidden(&["VESSEL_FEATURES_ID"]),
        preferred_order: PREFERRED,
        ..ReadOptions::default()
    };

    let rows = reader
        .get_table_rows(
            "EXT_VF_1",
            &options,
            &Page::new(2, 0).sort("VESSEL_NAME", SortDir::Desc),
        )
        .unwrap();

    assert_eq!(rows.total, 5);
    let names: Vec<String> = rows.rows.into_iter().map(|row| row[2].clone().unwrap()).collect();
    assert_eq!(names, vec!["Belle Ile", "Avel", "Ar Men"]);
}

#[test]
fn test_values_are_displayed_as_text() {
    let db = database();
    let reader = TableRowsReader::new(&db, &db, Dialect::Sqlite);
    let options = ReadOptions {
        hidden_columns: hidden(&["VESSEL_FEATURES_ID"]),
        preferred_order: PREFERRED,
        ..ReadOptions::default()
    };

    let rows = reader
        .get_table_rows(
            "EXT_VF_1",
            &options,
            &Page::all().sort("vessel_id", SortDir::Desc),
        )
        .unwrap();

    assert_eq!(
        rows.rows[0],
        vec![
            Some("4".to_string()),
            Some("LR790".to_string()),
            Some("Belle Ile".to_string()),
            Some("11.25".to_string())
        ]
    );
}

#[test]
fn test_distinct_counts_visible_columns() {
    let db = database();
    let reader = TableRowsReader::new(&db, &db, Dialect::Sqlite);
    let options = ReadOptions {
        hidden_columns: hidden(&["VESSEL_FEATURES_ID", "VESSEL_NAME"]),
        distinct: true,
        preferred_order: PREFERRED,
        ..ReadOptions::default()
    };

    let rows = reader
        .get_table_rows("EXT_VF_1", &options, &Page::default())
        .unwrap();

    assert_eq!(rows.column_names(), vec!["VESSEL_ID", "EXTERIOR_MARKING", "LENGTH_OVER_ALL"]);
    assert_eq!(rows.total, 4);
    assert_eq!(rows.rows.len(), 4);

    let all = reader
        .get_table_rows(
            "EXT_VF_1",
            &ReadOptions {
                distinct: false,
                ..options.clone()
            },
            &Page::default(),
        )
        .unwrap();
    assert_eq!(all.total, 5);
}

#[test]
fn test_filter_restricts_count_and_rows() {
    let db = database();
    let reader = TableRowsReader::new(&db, &db, Dialect::Sqlite);
    let filter = Filter::new()
        .criterion(FilterCriterion::new("LENGTH_OVER_ALL", ExtractionOperator::Greater).value("10"))
        .criterion(
            FilterCriterion::new("EXTERIOR_MARKING", ExtractionOperator::In)
                .values(["LR789", "LR790"])
                .sheet("VF"),
        );
    let options = ReadOptions {
        filter: Some(&filter),
        sheet_name: Some("VF"),
        ..ReadOptions::default()
    };

    let rows = reader
        .get_table_rows("EXT_VF_1", &options, &Page::new(0, 1))
        .unwrap();

    assert_eq!(rows.total, 2);
    assert_eq!(rows.rows.len(), 1);

    // Without the sheet, the scoped criterion does not apply.
    let unscoped = ReadOptions {
        sheet_name: None,
        ..options.clone()
    };
    let rows = reader
        .get_table_rows("EXT_VF_1", &unscoped, &Page::default())
        .unwrap();
    assert_eq!(rows.total, 3);
}

#[test]
fn test_read_errors() {
    let db = database();
    let reader = TableRowsReader::new(&db, &db, Dialect::Sqlite);
    let options = ReadOptions {
        hidden_columns: hidden(&["VESSEL_FEATURES_ID"]),
        ..ReadOptions::default()
    };

    // Hidden columns cannot be sorted on.
    assert!(matches!(
        reader.get_table_rows(
            "EXT_VF_1",
            &options,
            &Page::default().sort("VESSEL_FEATURES_ID", SortDir::Asc)
        ),
        Err(ExtractionError::Predicate(PredicateError::UnknownColumn { .. }))
    ));

    assert!(matches!(
        reader.get_table_rows("EXT_VF_2", &options, &Page::default()),
        Err(ExtractionError::Persistence(_))
    ));
}

#[test]
fn test_default_page() {
    let page = Page::default();
    assert_eq!(page.offset, 0);
    assert_eq!(page.size, DEFAULT_PAGE_SIZE);
    assert_eq!(page.sort_column, None);
}

#[test]
fn test_ranks_are_a_permutation() {
    let columns: Vec<ColumnMetadata> = ["E", "D", "C", "B", "A"]
        .iter()
        .map(|name| ColumnMetadata::new(*name, "TEXT", true))
        .collect();

    for preferred in [&[][..], &["A"][..], &["C", "X", "E"][..], &["A", "B", "C", "D", "E"][..]] {
        let mut ranks = column_ranks(&columns, preferred);
        ranks.sort_unstable();
        ranks.dedup();
        assert_eq!(ranks.len(), columns.len(), "{preferred:?}");

        let ranked = rank_columns(&columns, preferred);
        let known: Vec<&str> = ranked
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| preferred.contains(name))
            .collect();
        let expected: Vec<&str> = preferred
            .iter()
            .copied()
            .filter(|name| columns.iter().any(|c| c.name == *name))
            .collect();
        assert_eq!(known, expected, "{preferred:?}");
    }
}
