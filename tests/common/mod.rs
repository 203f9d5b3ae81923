//! Shared SQLite fixture: a tiny SUMARiS referential with programs,
//! strategies, applied periods, landings and vessels.

#![allow(dead_code)]

use std::sync::Arc;

use sumaris_extraction::config::Settings;
use sumaris_extraction::database::{QueryExecutor, SqliteDatabase};
use sumaris_extraction::extraction::{
    DaoRuntime, ExtractionService, TableNamingStrategy, TemplateRepository,
};
use sumaris_extraction::sql::Dialect;

pub const SCHEMA: &str = r#"
CREATE TABLE STATUS (ID INTEGER PRIMARY KEY, LABEL TEXT NOT NULL);
CREATE TABLE LOCATION (ID INTEGER PRIMARY KEY, LABEL TEXT NOT NULL, NAME TEXT);
CREATE TABLE PROGRAM (
    ID INTEGER PRIMARY KEY, LABEL TEXT NOT NULL, NAME TEXT, DESCRIPTION TEXT,
    STATUS_FK INTEGER NOT NULL, CREATION_DATE TEXT
);
CREATE TABLE STRATEGY (
    ID INTEGER PRIMARY KEY, LABEL TEXT NOT NULL, NAME TEXT, DESCRIPTION TEXT,
    ANALYTIC_REFERENCE TEXT, PROGRAM_FK INTEGER NOT NULL, STATUS_FK INTEGER NOT NULL,
    CREATION_DATE TEXT
);
CREATE TABLE APPLIED_STRATEGY (ID INTEGER PRIMARY KEY, STRATEGY_FK INTEGER, LOCATION_FK INTEGER);
CREATE TABLE APPLIED_PERIOD (
    APPLIED_STRATEGY_FK INTEGER, START_DATE TEXT, END_DATE TEXT, ACQUISITION_NUMBER INTEGER
);
CREATE TABLE LANDING (
    ID INTEGER PRIMARY KEY, PROGRAM_FK INTEGER, VESSEL_FK INTEGER, LOCATION_FK INTEGER,
    LANDING_DATE_TIME TEXT
);
CREATE TABLE VESSEL_TYPE (ID INTEGER PRIMARY KEY, LABEL TEXT NOT NULL, NAME TEXT);
CREATE TABLE VESSEL (
    ID INTEGER PRIMARY KEY, VESSEL_TYPE_FK INTEGER, STATUS_FK INTEGER, PROGRAM_FK INTEGER
);
CREATE TABLE VESSEL_FEATURES (
    ID INTEGER PRIMARY KEY, VESSEL_FK INTEGER, START_DATE TEXT, END_DATE TEXT,
    EXTERIOR_MARKING TEXT, NAME TEXT, LENGTH_OVER_ALL REAL, ADMINISTRATIVE_POWER INTEGER,
    GROSS_TONNAGE_GT REAL, BASE_PORT_LOCATION_FK INTEGER
);
CREATE TABLE VESSEL_REGISTRATION_PERIOD (
    ID INTEGER PRIMARY KEY, VESSEL_FK INTEGER, START_DATE TEXT, END_DATE TEXT,
    REGISTRATION_CODE TEXT, INT_REGISTRATION_CODE TEXT, REGISTRATION_LOCATION_FK INTEGER
);
"#;

pub const DATA: &str = r#"
INSERT INTO STATUS VALUES (0, 'DISABLE'), (1, 'ENABLE');
INSERT INTO LOCATION VALUES (1, 'XBL', 'Boulogne'), (2, 'XBR', 'Brest'), (3, 'XLR', 'La Rochelle');

INSERT INTO PROGRAM VALUES
    (1, 'SIH-OBSMER', 'Obsmer', 'Observations at sea', 1, '2020-01-01 00:00:00'),
    (2, 'SIH-OBSVENTE', 'Obsvente', 'Observations at auction', 1, '2020-02-01 00:00:00'),
    (3, 'ADAP-MER', 'Adap', NULL, 0, '2019-05-01 00:00:00');

INSERT INTO STRATEGY VALUES
    (10, 'OBSMER-2021', 'Obsmer 2021', 'Sampling plan 2021', 'REF-A', 1, 1, '2021-01-01 00:00:00'),
    (11, 'OBSMER-2022', 'Obsmer 2022', NULL, 'REF-B', 1, 1, '2022-01-01 00:00:00'),
    (20, 'OBSVENTE-2021', 'Obsvente 2021', NULL, 'REF-A', 2, 1, '2021-01-01 00:00:00');

INSERT INTO APPLIED_STRATEGY VALUES (100, 10, 1), (101, 10, 2), (102, 11, 1), (200, 20, 3);
INSERT INTO APPLIED_PERIOD VALUES
    (100, '2021-01-01 00:00:00', '2021-12-31 00:00:00', 12),
    (101, '2021-01-01 00:00:00', '2021-12-31 00:00:00', 6),
    (102, '2022-01-01 00:00:00', '2022-12-31 00:00:00', 10),
    (200, '2021-01-01 00:00:00', '2021-06-30 00:00:00', 4);

INSERT INTO LANDING VALUES
    (1, 1, 1, 1, '2021-03-10 08:00:00'),
    (2, 1, 2, 1, '2021-05-02 10:30:00'),
    (3, 1, 2, 2, '2021-07-01 06:00:00'),
    (4, 2, 3, 3, '2021-02-01 12:00:00');

INSERT INTO VESSEL_TYPE VALUES (1, 'FV', 'Fishing vessel'), (2, 'SV', 'Scientific vessel');
INSERT INTO VESSEL VALUES (1, 1, 1, 1), (2, 1, 1, 1), (3, 2, 0, 2);

INSERT INTO VESSEL_FEATURES VALUES
    (1, 1, '2020-01-01 00:00:00', NULL, 'BL123', 'Avel', 12.5, 150, 20.5, 1),
    (2, 2, '2020-01-01 00:00:00', '2020-12-31 00:00:00', 'BR456', 'Morgan', 9.8, 90, 8.0, 2),
    (3, 2, '2021-01-01 00:00:00', NULL, 'BR456', 'Morgane', 9.8, 95, 8.0, 2);

INSERT INTO VESSEL_REGISTRATION_PERIOD VALUES
    (1, 1, '2020-01-01 00:00:00', NULL, 'FRA000000001', 'XBL123', 1),
    (2, 2, '2020-01-01 00:00:00', NULL, 'FRA000000002', NULL, 2);
"#;

/// In-memory database with the fixture schema and data.
pub fn database() -> Arc<SqliteDatabase> {
    let db = SqliteDatabase::open_in_memory().unwrap();
    db.execute_batch(SCHEMA).unwrap();
    db.execute_batch(DATA).unwrap();
    Arc::new(db)
}

pub fn settings() -> Settings {
    Settings::from_toml("[database]\ndialect = \"sqlite\"\n").unwrap()
}

/// Service over `db`, with the metadata cache on.
pub fn service(db: &Arc<SqliteDatabase>) -> ExtractionService {
    ExtractionService::new(&settings(), db.clone(), db.clone()).unwrap()
}

pub fn runtime(executor: Arc<dyn QueryExecutor>, db: &Arc<SqliteDatabase>) -> DaoRuntime {
    DaoRuntime::new(
        executor,
        db.clone(),
        Arc::new(TemplateRepository::builtin(Dialect::Sqlite)),
        TableNamingStrategy::default(),
    )
}

/// Tables whose name starts with `prefix`, sorted.
pub fn tables_with_prefix(db: &SqliteDatabase, prefix: &str) -> Vec<String> {
    let sql = format!(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND substr(name, 1, {}) = '{}' ORDER BY name",
        prefix.len(),
        prefix
    );
    db.execute_query(&sql)
        .unwrap()
        .into_iter()
        .filter_map(|row| row.first().and_then(|v| v.to_display()))
        .collect()
}

/// Transient extraction tables still in the database.
pub fn run_tables(db: &SqliteDatabase) -> Vec<String> {
    tables_with_prefix(db, "EXT_")
}
