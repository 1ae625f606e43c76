//! Record extraction: container fragments → flat field maps

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::query::parse_selector;
use super::{LocateQuery, RecordSpec, Transform};
use crate::error::ExtractError;
use crate::fetch::PageContent;

/// One extracted record: field name → value (or fallback)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledField {
    name: String,
    queries: Vec<LocateQuery>,
    fallback: String,
    transform: Option<Transform>,
    required: bool,
}

impl CompiledField {
    /// First query that yields a non-empty value
    fn lookup(&self, fragment: ElementRef<'_>) -> Option<String> {
        self.queries.iter().find_map(|query| {
            let raw = query.evaluate(fragment)?;
            let value = match self.transform {
                Some(transform) => transform.apply(&raw)?,
                None => raw,
            };
            (!value.is_empty()).then_some(value)
        })
    }
}

/// A validated [`RecordSpec`], ready to run against pages
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    container: Selector,
    fields: Vec<CompiledField>,
    columns: Vec<String>,
}

impl RecordExtractor {
    /// Compile every selector and check the schema's shape
    pub fn new(spec: &RecordSpec) -> Result<Self, ExtractError> {
        if spec.fields.is_empty() {
            return Err(ExtractError::EmptySchema);
        }

        let mut seen = HashSet::new();
        for field in &spec.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ExtractError::DuplicateField(field.name.clone()));
            }
        }
        for gate in &spec.required {
            if !seen.contains(gate.as_str()) {
                return Err(ExtractError::UnknownGateField(gate.clone()));
            }
        }

        let container = parse_selector(&spec.container)?;
        let fields = spec
            .fields
            .iter()
            .map(|field| -> Result<CompiledField, ExtractError> {
                let queries = std::iter::once(&field.locate)
                    .chain(&field.alternatives)
                    .map(|q| LocateQuery::parse(q))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledField {
                    name: field.name.clone(),
                    queries,
                    fallback: field.fallback.clone(),
                    transform: field.transform,
                    required: spec.required.contains(&field.name),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            container,
            fields,
            columns: spec.column_order(),
        })
    }

    /// Field names in declaration order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn extract(&self, page: &PageContent) -> Vec<Record> {
        self.extract_markup(page.markup())
    }

    pub fn extract_markup(&self, markup: &str) -> Vec<Record> {
        let document = Html::parse_document(markup);
        let mut records = Vec::new();

        for (index, fragment) in document.select(&self.container).enumerate() {
            match self.extract_fragment(fragment) {
                Some(record) => records.push(record),
                None => debug!("Dropped record {}: missing required field", index),
            }
        }

        debug!("Extracted {} records", records.len());
        records
    }

    /// `None` when a gate field is missing
    fn extract_fragment(&self, fragment: ElementRef<'_>) -> Option<Record> {
        let mut values = HashMap::with_capacity(self.fields.len());

        for field in &self.fields {
            let value = match field.lookup(fragment) {
                Some(value) => value,
                None if field.required => {
                    debug!("Required field '{}' not found", field.name);
                    return None;
                }
                None => field.fallback.clone(),
            };
            values.insert(field.name.clone(), value);
        }

        Some(Record { values })
    }
}

/// Validate `spec` and extract every record on `page`
pub fn extract(page: &PageContent, spec: &RecordSpec) -> Result<Vec<Record>, ExtractError> {
    Ok(RecordExtractor::new(spec)?.extract(page))
}
