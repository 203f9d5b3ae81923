//! XML query template engine.
//!
//! A template describes one SQL query as a tree of fragments:
//!
//! ```xml
//! <query name="strategy" type="create" table="${tableName}">
//!   <select alias="STRATEGY_ID" type="hidden">S.ID</select>
//!   <select alias="STRATEGY_LABEL" type="text">S.LABEL</select>
//!   <from alias="P">${programTableName}</from>
//!   <from join="true">INNER JOIN STRATEGY S ON S.PROGRAM_FK = P.PROGRAM_ID</from>
//!   <where>
//!     <where operator="AND" group="strategyLabels">S.LABEL IN (${strategyLabels})</where>
//!   </where>
//! </query>
//! ```
//!
//! Every fragment may carry a `group` condition (`name`, `!name`, `a|b`).
//! Rendering prunes fragments whose group is disabled, then substitutes the
//! `${name}` placeholders left in the enabled text. A placeholder that is
//! still unbound at that point is an authoring error.
//!
//! `type="hidden"` columns are materialized but never shown;
//! `option="DISTINCT"` asks readers to de-duplicate rows.

mod parser;
mod repository;

pub use parser::parse_template;
pub use repository::{template_id, TemplateRepository};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::error::{TemplateError, TemplateResult};
use crate::metadata::SqlType;
use crate::sql::{Dialect, SortDir, SqlDialect};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Condition attached to a fragment.
///
/// Satisfied when any of its terms is: `name` requires the group enabled,
/// `!name` requires it disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCondition {
    terms: Vec<(bool, String)>,
}

impl GroupCondition {
    pub fn parse(group: &str) -> Option<Self> {
        let terms: Vec<(bool, String)> = group
            .split('|')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| match term.strip_prefix('!') {
                Some(name) => (false, name.trim().to_string()),
                None => (true, term.to_string()),
            })
            .collect();
        (!terms.is_empty()).then_some(Self { terms })
    }

    pub fn is_satisfied(&self, enabled: &HashSet<String>) -> bool {
        self.terms
            .iter()
            .any(|(expected, name)| enabled.contains(name) == *expected)
    }
}

fn is_active(group: &Option<GroupCondition>, enabled: &HashSet<String>) -> bool {
    group
        .as_ref()
        .map(|condition| condition.is_satisfied(enabled))
        .unwrap_or(true)
}

/// What the rendered statement does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// Plain SELECT.
    Select,
    /// Materialize the SELECT into `table` (usually `${tableName}`).
    Create { table: String },
}

/// Role of a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Date,
    /// Materialized for later steps, excluded from results.
    Hidden,
}

impl ColumnKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Some(ColumnKind::Text),
            "number" => Some(ColumnKind::Number),
            "date" => Some(ColumnKind::Date),
            "hidden" => Some(ColumnKind::Hidden),
            _ => None,
        }
    }

    /// Type a `number` or `date` column is compared as, whatever the
    /// database reports for it.
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            ColumnKind::Number => Some(SqlType::Numeric),
            ColumnKind::Date => Some(SqlType::Timestamp),
            ColumnKind::Text | ColumnKind::Hidden => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKeyword {
    And,
    Or,
}

impl JoinKeyword {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "AND" => Some(JoinKeyword::And),
            "OR" => Some(JoinKeyword::Or),
            _ => None,
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            JoinKeyword::And => "AND",
            JoinKeyword::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub alias: String,
    pub expression: String,
    pub kind: ColumnKind,
    pub group: Option<GroupCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromItem {
    pub text: String,
    pub alias: Option<String>,
    /// Appended as-is (`INNER JOIN ...`) instead of comma-separated.
    pub join: bool,
    pub group: Option<GroupCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    pub text: String,
    pub group: Option<GroupCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub text: String,
    pub direction: SortDir,
    pub group: Option<GroupCondition>,
}

/// A `<where>` element: its own text followed by nested conditions, each
/// joined with the keyword it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereNode {
    pub operator: JoinKeyword,
    pub group: Option<GroupCondition>,
    pub text: String,
    pub children: Vec<WhereNode>,
}

impl WhereNode {
    fn render(&self, enabled: &HashSet<String>, nested: bool) -> Option<String> {
        let mut sql = String::new();
        let mut parts = 0;

        if !self.text.is_empty() {
            sql.push_str(&self.text);
            parts += 1;
        }
        for child in &self.children {
            if !is_active(&child.group, enabled) {
                continue;
            }
            if let Some(child_sql) = child.render(enabled, true) {
                if parts > 0 {
                    sql.push(' ');
                    sql.push_str(child.operator.as_sql());
                    sql.push(' ');
                }
                sql.push_str(&child_sql);
                parts += 1;
            }
        }

        match parts {
            0 => None,
            1 => Some(sql),
            _ if nested => Some(format!("({sql})")),
            _ => Some(sql),
        }
    }
}

/// A parsed query template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub id: String,
    pub name: String,
    pub kind: QueryKind,
    pub distinct: bool,
    pub selects: Vec<SelectItem>,
    pub from: Vec<FromItem>,
    pub filter: Option<WhereNode>,
    pub group_by: Vec<TextItem>,
    pub order_by: Vec<OrderItem>,
}

/// Mutable rendering state over a shared template.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    template: Arc<QueryTemplate>,
    dialect: Dialect,
    groups: HashSet<String>,
    bindings: HashMap<String, String>,
}

impl QueryBuilder {
    pub fn new(template: Arc<QueryTemplate>, dialect: Dialect) -> Self {
        Self {
            template,
            dialect,
            groups: HashSet::new(),
            bindings: HashMap::new(),
        }
    }

    pub fn template(&self) -> &QueryTemplate {
        &self.template
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Bind `${name}` to raw SQL text.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    pub fn set_group(&mut self, name: impl Into<String>, enabled: bool) -> &mut Self {
        let name = name.into();
        if enabled {
            self.groups.insert(name);
        } else {
            self.groups.remove(&name);
        }
        self
    }

    pub fn is_group_enabled(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    /// Aliases of the enabled hidden columns.
    pub fn hidden_column_names(&self) -> BTreeSet<String> {
        self.template
            .selects
            .iter()
            .filter(|item| item.kind == ColumnKind::Hidden && is_active(&item.group, &self.groups))
            .map(|item| item.alias.clone())
            .collect()
    }

    /// Declared types of the enabled `number` and `date` columns.
    pub fn column_types(&self) -> BTreeMap<String, SqlType> {
        self.template
            .selects
            .iter()
            .filter(|item| is_active(&item.group, &self.groups))
            .filter_map(|item| item.kind.sql_type().map(|ty| (item.alias.clone(), ty)))
            .collect()
    }

    pub fn has_distinct_option(&self) -> bool {
        self.template.distinct
    }

    /// Render the final statement.
    pub fn to_sql(&self) -> TemplateResult<String> {
        let select = self.substitute(&self.select_sql())?;

        match &self.template.kind {
            QueryKind::Select => Ok(select),
            QueryKind::Create { table } => {
                let table = self.substitute(table)?;
                Ok(self.dialect.create_table_as(&table, &select))
            }
        }
    }

    /// SELECT text of the enabled fragments, placeholders untouched.
    fn select_sql(&self) -> String {
        let enabled = &self.groups;
        let mut sql = String::from("SELECT ");

        let columns: Vec<String> = self
            .template
            .selects
            .iter()
            .filter(|item| is_active(&item.group, enabled))
            .map(|item| format!("{} AS {}", item.expression, item.alias))
            .collect();
        sql.push_str(&columns.join(", "));

        sql.push_str(" FROM ");
        let mut first = true;
        for item in self
            .template
            .from
            .iter()
            .filter(|item| is_active(&item.group, enabled))
        {
            if item.join {
                sql.push(' ');
            } else if !first {
                sql.push_str(", ");
            }
            sql.push_str(&item.text);
            if let Some(alias) = &item.alias {
                sql.push(' ');
                sql.push_str(alias);
            }
            first = false;
        }

        if let Some(filter) = &self.template.filter {
            if is_active(&filter.group, enabled) {
                if let Some(where_sql) = filter.render(enabled, false) {
                    sql.push_str(" WHERE ");
                    sql.push_str(&where_sql);
                }
            }
        }

        let group_by: Vec<&str> = self
            .template
            .group_by
            .iter()
            .filter(|item| is_active(&item.group, enabled))
            .map(|item| item.text.as_str())
            .collect();
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }

        let order_by: Vec<String> = self
            .template
            .order_by
            .iter()
            .filter(|item| is_active(&item.group, enabled))
            .map(|item| match item.direction {
                SortDir::Asc => format!("{} ASC", item.text),
                SortDir::Desc => format!("{} DESC", item.text),
            })
            .collect();
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }

        sql
    }

    fn substitute(&self, text: &str) -> TemplateResult<String> {
        if let Some(unbound) = PLACEHOLDER
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .find(|name| !self.bindings.contains_key(name))
        {
            return Err(TemplateError::UnboundPlaceholder {
                query: self.template.id.clone(),
                name: unbound,
            });
        }

        Ok(PLACEHOLDER
            .replace_all(text, |caps: &Captures<'_>| {
                self.bindings
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned())
    }
}
