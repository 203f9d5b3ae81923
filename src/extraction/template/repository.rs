//! Template lookup and parse cache.
//!
//! Templates are addressed by `{label}/v{version}/{query}` (version dots
//! become underscores: `program/v1_0/strategy`). A configured template
//! directory takes precedence over the templates compiled into the crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::{parse_template, QueryBuilder, QueryTemplate};
use crate::extraction::error::{TemplateError, TemplateResult};
use crate::sql::Dialect;

macro_rules! builtin {
    ($id:literal) => {
        ($id, include_str!(concat!("../../../templates/", $id, ".xml")))
    };
}

static BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    builtin!("program/v1_0/program"),
    builtin!("program/v1_0/strategy"),
    builtin!("program/v1_0/monitoring"),
    builtin!("strat/v1_0/strategy"),
    builtin!("strat/v1_0/monitoring"),
    builtin!("vessel/v1_0/vessel"),
    builtin!("vessel/v1_0/features"),
    builtin!("vessel/v1_0/registration"),
];

/// Template id of `query` in format `label`, version `version`.
pub fn template_id(label: &str, version: &str, query: &str) -> String {
    format!(
        "{}/v{}/{}",
        label.to_lowercase(),
        version.replace('.', "_"),
        query
    )
}

/// Loads, parses and caches query templates.
#[derive(Debug)]
pub struct TemplateRepository {
    dialect: Dialect,
    template_dir: Option<PathBuf>,
    cache: DashMap<String, Arc<QueryTemplate>>,
}

impl TemplateRepository {
    /// Repository over the builtin templates only.
    pub fn builtin(dialect: Dialect) -> Self {
        Self {
            dialect,
            template_dir: None,
            cache: DashMap::new(),
        }
    }

    /// Look up `{dir}/{id}.xml` before the builtin templates.
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Ids of the builtin templates.
    pub fn builtin_ids() -> impl Iterator<Item = &'static str> {
        BUILTIN_TEMPLATES.iter().map(|(id, _)| *id)
    }

    /// Parsed template, from cache when already loaded.
    pub fn load(&self, id: &str) -> TemplateResult<Arc<QueryTemplate>> {
        if let Some(template) = self.cache.get(id) {
            return Ok(Arc::clone(&template));
        }

        let xml = self.read_source(id)?;
        let template = Arc::new(parse_template(id, &xml)?);
        debug!(template = %id, "parsed query template");
        self.cache.insert(id.to_string(), Arc::clone(&template));
        Ok(template)
    }

    /// Fresh builder over the template, for this repository's dialect.
    pub fn render(&self, id: &str) -> TemplateResult<QueryBuilder> {
        Ok(QueryBuilder::new(self.load(id)?, self.dialect))
    }

    fn read_source(&self, id: &str) -> TemplateResult<String> {
        if id.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(TemplateError::NotFound(id.to_string()));
        }

        if let Some(dir) = &self.template_dir {
            let path = file_path(dir, id);
            if path.is_file() {
                return Ok(std::fs::read_to_string(path)?);
            }
        }

        BUILTIN_TEMPLATES
            .iter()
            .find(|(builtin_id, _)| *builtin_id == id)
            .map(|(_, xml)| xml.to_string())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }
}

fn file_path(dir: &Path, id: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    path.extend(id.split('/'));
    path.set_extension("xml");
    path
}
