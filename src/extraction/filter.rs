//! Generic filter to domain filter translation.
//!
//! A few well-known criterion names map onto template groups, so the query
//! itself fetches less. Anything not translated here is still enforced by
//! the cleanup pass that runs after every step.
//!
//! Only unscoped criteria and criteria scoped to the first sheet of the
//! format are translated: restricting the root sheet restricts every sheet
//! derived from it.

use chrono::NaiveDateTime;

use super::criterion::{ExtractionOperator, Filter, FilterCriterion, LogicalOperator};
use super::error::{PredicateError, PredicateResult};
use super::format::ExtractionFormat;
use super::predicate::parse_date_value;
use super::template::QueryBuilder;
use crate::sql::SqlDialect;

/// Criterion names understood by the translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionName {
    ProgramLabel,
    ProgramId,
    StrategyLabel,
    StrategyId,
    LocationId,
    StatusId,
    VesselId,
    RegistrationCode,
    VesselTypeId,
    StartDate,
    EndDate,
}

impl CriterionName {
    pub fn parse(name: &str) -> Option<Self> {
        let name = match name.trim().to_uppercase().as_str() {
            "PROGRAM_LABEL" | "PROJECT" => CriterionName::ProgramLabel,
            "PROGRAM_ID" => CriterionName::ProgramId,
            "STRATEGY_LABEL" => CriterionName::StrategyLabel,
            "STRATEGY_ID" => CriterionName::StrategyId,
            "LOCATION_ID" => CriterionName::LocationId,
            "STATUS_ID" => CriterionName::StatusId,
            "VESSEL_ID" => CriterionName::VesselId,
            "REGISTRATION_CODE" => CriterionName::RegistrationCode,
            "VESSEL_TYPE_ID" => CriterionName::VesselTypeId,
            "START_DATE" => CriterionName::StartDate,
            "END_DATE" => CriterionName::EndDate,
            _ => return None,
        };
        Some(name)
    }
}

/// Filter of the PROGRAM and STRAT formats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramFilter {
    pub program_labels: Vec<String>,
    pub program_ids: Vec<i64>,
    pub strategy_labels: Vec<String>,
    pub strategy_ids: Vec<i64>,
    pub location_ids: Vec<i64>,
    pub status_ids: Vec<i64>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

/// Filter of the VESSEL format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VesselFilter {
    pub vessel_ids: Vec<i64>,
    pub registration_codes: Vec<String>,
    pub vessel_type_ids: Vec<i64>,
    pub status_ids: Vec<i64>,
    pub program_labels: Vec<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

/// Typed filter of one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainFilter {
    Program(ProgramFilter),
    Vessel(VesselFilter),
}

impl DomainFilter {
    /// Translate the generic filter for `format`.
    ///
    /// OR-joined or negated filters cannot restrict the queries and are left
    /// entirely to the cleanup pass.
    pub fn translate(format: ExtractionFormat, filter: &Filter) -> PredicateResult<Self> {
        let mut program = ProgramFilter::default();
        let mut vessel = VesselFilter::default();

        if filter.operator == LogicalOperator::And {
            let root = format.first_sheet().name;
            for criterion in filter.criteria_for(Some(root)) {
                let Some(name) = CriterionName::parse(&criterion.name) else {
                    continue;
                };
                match format {
                    ExtractionFormat::Program | ExtractionFormat::Strat => {
                        program.collect(name, criterion)?
                    }
                    ExtractionFormat::Vessel => vessel.collect(name, criterion)?,
                }
            }
        }

        Ok(match format {
            ExtractionFormat::Program | ExtractionFormat::Strat => DomainFilter::Program(program),
            ExtractionFormat::Vessel => DomainFilter::Vessel(vessel),
        })
    }

    /// Enable and bind the template groups of every restriction.
    pub fn apply(&self, query: &mut QueryBuilder) {
        match self {
            DomainFilter::Program(filter) => {
                bind_texts(query, "programLabels", &filter.program_labels);
                bind_ids(query, "programIds", &filter.program_ids);
                bind_texts(query, "strategyLabels", &filter.strategy_labels);
                bind_ids(query, "strategyIds", &filter.strategy_ids);
                bind_ids(query, "locationIds", &filter.location_ids);
                bind_ids(query, "statusIds", &filter.status_ids);
                bind_date(query, "startDate", filter.start_date);
                bind_date(query, "endDate", filter.end_date);
            }
            DomainFilter::Vessel(filter) => {
                bind_ids(query, "vesselIds", &filter.vessel_ids);
                bind_texts(query, "registrationCodes", &filter.registration_codes);
                bind_ids(query, "vesselTypeIds", &filter.vessel_type_ids);
                bind_ids(query, "statusIds", &filter.status_ids);
                bind_texts(query, "programLabels", &filter.program_labels);
                bind_date(query, "startDate", filter.start_date);
                bind_date(query, "endDate", filter.end_date);
            }
        }
    }
}

impl ProgramFilter {
    fn collect(&mut self, name: CriterionName, criterion: &FilterCriterion) -> PredicateResult<()> {
        match name {
            CriterionName::ProgramLabel => self.program_labels.extend(texts(criterion)),
            CriterionName::ProgramId => self.program_ids.extend(ids(criterion)?),
            CriterionName::StrategyLabel => self.strategy_labels.extend(texts(criterion)),
            CriterionName::StrategyId => self.strategy_ids.extend(ids(criterion)?),
            CriterionName::LocationId => self.location_ids.extend(ids(criterion)?),
            CriterionName::StatusId => self.status_ids.extend(ids(criterion)?),
            CriterionName::StartDate => {
                if let Some(date) = lower_bound(criterion)? {
                    self.start_date = Some(date);
                }
            }
            CriterionName::EndDate => {
                if let Some(date) = upper_bound(criterion)? {
                    self.end_date = Some(date);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl VesselFilter {
    fn collect(&mut self, name: CriterionName, criterion: &FilterCriterion) -> PredicateResult<()> {
        match name {
            CriterionName::VesselId => self.vessel_ids.extend(ids(criterion)?),
            CriterionName::RegistrationCode => self.registration_codes.extend(texts(criterion)),
            CriterionName::VesselTypeId => self.vessel_type_ids.extend(ids(criterion)?),
            CriterionName::StatusId => self.status_ids.extend(ids(criterion)?),
            CriterionName::ProgramLabel => self.program_labels.extend(texts(criterion)),
            CriterionName::StartDate => {
                if let Some(date) = lower_bound(criterion)? {
                    self.start_date = Some(date);
                }
            }
            CriterionName::EndDate => {
                if let Some(date) = upper_bound(criterion)? {
                    self.end_date = Some(date);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Values of an `=` or `IN` criterion; nothing for any other operator.
fn texts(criterion: &FilterCriterion) -> Vec<String> {
    match criterion.operator {
        ExtractionOperator::Equals => criterion.value.iter().cloned().collect(),
        ExtractionOperator::In => criterion.values.clone(),
        _ => Vec::new(),
    }
}

fn ids(criterion: &FilterCriterion) -> PredicateResult<Vec<i64>> {
    texts(criterion)
        .iter()
        .map(|value| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|_| PredicateError::InvalidValue {
                    column: criterion.name.clone(),
                    value: value.clone(),
                    expected: "an integer",
                })
        })
        .collect()
}

fn date_of(criterion: &FilterCriterion) -> PredicateResult<Option<NaiveDateTime>> {
    let Some(value) = criterion.value.as_deref() else {
        return Ok(None);
    };
    parse_date_value(value)
        .map(Some)
        .ok_or_else(|| PredicateError::InvalidValue {
            column: criterion.name.clone(),
            value: value.to_string(),
            expected: "a date",
        })
}

fn lower_bound(criterion: &FilterCriterion) -> PredicateResult<Option<NaiveDateTime>> {
    match criterion.operator {
        ExtractionOperator::Equals | ExtractionOperator::GreaterOrEquals => date_of(criterion),
        _ => Ok(None),
    }
}

fn upper_bound(criterion: &FilterCriterion) -> PredicateResult<Option<NaiveDateTime>> {
    match criterion.operator {
        ExtractionOperator::Equals | ExtractionOperator::LessOrEquals => date_of(criterion),
        _ => Ok(None),
    }
}

fn bind_texts(query: &mut QueryBuilder, group: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    let sql = values
        .iter()
        .map(|value| format!("'{value}'"))
        .collect::<Vec<_>>()
        .join(", ");
    query.set_group(group, true).bind(group, sql);
}

fn bind_ids(query: &mut QueryBuilder, group: &str, values: &[i64]) {
    if values.is_empty() {
        return;
    }
    let sql = values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    query.set_group(group, true).bind(group, sql);
}

fn bind_date(query: &mut QueryBuilder, group: &str, value: Option<NaiveDateTime>) {
    if let Some(date) = value {
        let literal = query.dialect().format_date_literal(&date);
        query.set_group(group, true).bind(group, literal);
    }
}
