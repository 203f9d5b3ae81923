//! Extraction formats and their sheets.
//!
//! Each format is a fixed pipeline: sheets are materialized in declaration
//! order, and a sheet only runs when the sheet it reads from produced rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ExtractionError;
use super::template::template_id;

/// One step of a format pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSpec {
    /// Sheet name (`PR`, `ST`...), also part of the physical table name.
    pub name: &'static str,
    /// Template query name under `{label}/v{version}/`.
    pub query: &'static str,
    /// Placeholder other steps use to reference this sheet's table.
    pub table_placeholder: &'static str,
    /// Sheet whose table this step reads.
    pub depends_on: Option<&'static str>,
    /// Preferred display order of known columns.
    pub columns: &'static [&'static str],
}

const PROGRAM_SHEETS: &[SheetSpec] = &[
    SheetSpec {
        name: "PR",
        query: "program",
        table_placeholder: "programTableName",
        depends_on: None,
        columns: &[
            "PROGRAM_LABEL",
            "PROGRAM_NAME",
            "PROGRAM_DESCRIPTION",
            "STATUS_LABEL",
            "CREATION_DATE",
        ],
    },
    STRATEGY_SHEET_FROM_PROGRAM,
    MONITORING_SHEET,
];

const STRATEGY_SHEET_FROM_PROGRAM: SheetSpec = SheetSpec {
    depends_on: Some("PR"),
    ..STRATEGY_SHEET
};

const STRATEGY_SHEET: SheetSpec = SheetSpec {
    name: "ST",
    query: "strategy",
    table_placeholder: "strategyTableName",
    depends_on: None,
    columns: &[
        "PROGRAM_LABEL",
        "STRATEGY_LABEL",
        "STRATEGY_NAME",
        "STRATEGY_DESCRIPTION",
        "ANALYTIC_REFERENCE",
        "CREATION_DATE",
    ],
};

const MONITORING_SHEET: SheetSpec = SheetSpec {
    name: "SM",
    query: "monitoring",
    table_placeholder: "monitoringTableName",
    depends_on: Some("ST"),
    columns: &[
        "PROGRAM_LABEL",
        "STRATEGY_LABEL",
        "LOCATION_LABEL",
        "LOCATION_NAME",
        "START_DATE",
        "END_DATE",
        "EXPECTED_EFFORT",
        "REALIZED_EFFORT",
    ],
};

const STRAT_SHEETS: &[SheetSpec] = &[STRATEGY_SHEET, MONITORING_SHEET];

const VESSEL_SHEETS: &[SheetSpec] = &[
    SheetSpec {
        name: "VE",
        query: "vessel",
        table_placeholder: "vesselTableName",
        depends_on: None,
        columns: &[
            "VESSEL_ID",
            "PROGRAM_LABEL",
            "VESSEL_TYPE_LABEL",
            "STATUS_LABEL",
        ],
    },
    SheetSpec {
        name: "VF",
        query: "features",
        table_placeholder: "featuresTableName",
        depends_on: Some("VE"),
        columns: &[
            "VESSEL_ID",
            "START_DATE",
            "END_DATE",
            "EXTERIOR_MARKING",
            "VESSEL_NAME",
            "LENGTH_OVER_ALL",
            "ADMINISTRATIVE_POWER",
            "GROSS_TONNAGE_GT",
            "BASE_PORT_LOCATION_LABEL",
        ],
    },
    SheetSpec {
        name: "VR",
        query: "registration",
        table_placeholder: "registrationTableName",
        depends_on: Some("VE"),
        columns: &[
            "VESSEL_ID",
            "START_DATE",
            "END_DATE",
            "REGISTRATION_CODE",
            "INT_REGISTRATION_CODE",
            "REGISTRATION_LOCATION_LABEL",
        ],
    },
];

/// Builtin extraction formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtractionFormat {
    /// Programs, their strategies and the strategies monitoring.
    Program,
    /// Strategies and their monitoring.
    Strat,
    /// Vessels, features and registration periods.
    Vessel,
}

impl ExtractionFormat {
    pub fn all() -> [ExtractionFormat; 3] {
        [
            ExtractionFormat::Program,
            ExtractionFormat::Strat,
            ExtractionFormat::Vessel,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtractionFormat::Program => "PROGRAM",
            ExtractionFormat::Strat => "STRAT",
            ExtractionFormat::Vessel => "VESSEL",
        }
    }

    pub fn version(&self) -> &'static str {
        "1.0"
    }

    /// Sheets in pipeline order.
    pub fn sheets(&self) -> &'static [SheetSpec] {
        match self {
            ExtractionFormat::Program => PROGRAM_SHEETS,
            ExtractionFormat::Strat => STRAT_SHEETS,
            ExtractionFormat::Vessel => VESSEL_SHEETS,
        }
    }

    pub fn sheet_names(&self) -> Vec<&'static str> {
        self.sheets().iter().map(|sheet| sheet.name).collect()
    }

    /// Sheet by name, ignoring case.
    pub fn sheet(&self, name: &str) -> Option<&'static SheetSpec> {
        self.sheets()
            .iter()
            .find(|sheet| sheet.name.eq_ignore_ascii_case(name))
    }

    /// First sheet of the pipeline, the one that must produce rows.
    pub fn first_sheet(&self) -> &'static SheetSpec {
        &self.sheets()[0]
    }

    /// Template id of a step.
    pub fn template_id(&self, sheet: &SheetSpec) -> String {
        template_id(self.label(), self.version(), sheet.query)
    }
}

impl fmt::Display for ExtractionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExtractionFormat {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|format| format.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExtractionError::UnknownFormat(s.to_string()))
    }
}
