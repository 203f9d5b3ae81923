#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use sumaris_extraction::extraction::{
    ExtractionError, ExtractionFormat, ExtractionOperator, Filter, FilterCriterion,
};
use sumaris_extraction::metadata::TableMetadataProvider;
use sumaris_extraction::reader::Page;

fn obsmer() -> Filter {
    Filter::new().criterion(
        FilterCriterion::new("PROGRAM_LABEL", ExtractionOperator::Equals).value("SIH-OBSMER"),
    )
}

#[test]
fn test_save_product_renames_run_tables() {
    let db = common::database();
    let service = common::service(&db);

    let product = service
        .save_product(ExtractionFormat::Program, &obsmer(), "sih_2021")
        .unwrap();

    assert_eq!(product.label, "SIH_2021");
    assert_eq!(product.format, ExtractionFormat::Program);
    assert_eq!(product.sheet_names(), vec!["PR", "ST", "SM"]);
    assert_eq!(
        common::tables_with_prefix(&db, "P_"),
        vec!["P_SIH_2021_PR", "P_SIH_2021_SM", "P_SIH_2021_ST"]
    );
    assert!(common::run_tables(&db).is_empty());

    // SQLite drops hidden columns for good.
    let strategy = db.get_table("P_SIH_2021_ST").unwrap();
    assert!(strategy.column("STRATEGY_ID").is_none());
    assert!(strategy.column("STRATEGY_LABEL").is_some());
    assert!(product.tables.iter().all(|t| t.hidden_columns.is_empty()));
}

#[test]
fn test_read_and_delete_product() {
    let db = common::database();
    let service = common::service(&db);
    let product = service
        .save_product(ExtractionFormat::Program, &obsmer(), "SIH")
        .unwrap();

    let programs = service
        .read_product_sheet(&product, "pr", &Page::all())
        .unwrap();
    assert_eq!(programs.total, 1);
    assert_eq!(programs.rows[0][0].as_deref(), Some("SIH-OBSMER"));

    let monitoring = service
        .read_product_sheet(&product, "SM", &Page::new(0, 2))
        .unwrap();
    assert_eq!(monitoring.total, 3);
    assert_eq!(monitoring.rows.len(), 2);
    assert!(!monitoring.column_names().contains(&"LOCATION_ID"));

    assert!(matches!(
        service.read_product_sheet(&product, "VE", &Page::all()),
        Err(ExtractionError::UnknownSheet { .. })
    ));

    service.delete_product(&product);
    assert!(common::tables_with_prefix(&db, "P_").is_empty());
}

#[test]
fn test_save_replaces_existing_product() {
    let db = common::database();
    let service = common::service(&db);

    service
        .save_product(ExtractionFormat::Program, &obsmer(), "SIH")
        .unwrap();
    let product = service
        .save_product(ExtractionFormat::Program, &Filter::default(), "SIH")
        .unwrap();

    let programs = service
        .read_product_sheet(&product, "PR", &Page::all())
        .unwrap();
    assert_eq!(programs.total, 3);
    assert_eq!(common::tables_with_prefix(&db, "P_").len(), 3);

    // No strategy matches: the new product has no ST nor SM sheet, and the
    // old ones are gone too.
    let filter = Filter::new().criterion(
        FilterCriterion::new("ANALYTIC_REFERENCE", ExtractionOperator::Equals).value("NOPE"),
    );
    let product = service
        .save_product(ExtractionFormat::Program, &filter, "SIH")
        .unwrap();

    assert_eq!(product.sheet_names(), vec!["PR"]);
    assert_eq!(common::tables_with_prefix(&db, "P_"), vec!["P_SIH_PR"]);
    assert!(common::run_tables(&db).is_empty());
}

#[test]
fn test_invalid_label_runs_nothing() {
    let db = common::database();
    let service = common::service(&db);

    let err = service
        .save_product(ExtractionFormat::Program, &obsmer(), "2021-sih")
        .unwrap_err();

    assert!(matches!(err, ExtractionError::InvalidProductLabel(_)));
    assert!(common::run_tables(&db).is_empty());
    assert!(common::tables_with_prefix(&db, "P_").is_empty());
}

#[test]
fn test_empty_extraction_saves_nothing() {
    let db = common::database();
    let service = common::service(&db);
    let filter = Filter::new().criterion(
        FilterCriterion::new("VESSEL_ID", ExtractionOperator::Equals).value("42"),
    );

    let err = service
        .save_product(ExtractionFormat::Vessel, &filter, "NONE")
        .unwrap_err();

    assert!(err.is_no_data());
    assert!(common::tables_with_prefix(&db, "P_").is_empty());
}

#[tokio::test]
async fn test_save_product_async() {
    let db = common::database();
    let service = Arc::new(common::service(&db));

    let product = service
        .save_product_async(ExtractionFormat::Vessel, Filter::default(), "fleet".to_string())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(product.table_names(), vec!["P_FLEET_VE", "P_FLEET_VF", "P_FLEET_VR"]);
    let vessels = service
        .read_product_sheet(&product, "VE", &Page::all())
        .unwrap();
    assert_eq!(vessels.total, 3);
    assert!(common::run_tables(&db).is_empty());
}
