//! Selector schemas as configuration data

use serde::{Deserialize, Serialize};

use super::Transform;

/// How to pull one field out of a record fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Output column name
    pub name: String,
    /// Primary locate query
    pub locate: String,
    /// Tried in order when `locate` misses (COALESCE)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    /// Value used when every query misses
    #[serde(default)]
    pub fallback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, locate: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locate: locate.into(),
            alternatives: Vec::new(),
            fallback: String::new(),
            transform: None,
        }
    }

    #[must_use]
    pub fn or_locate(mut self, query: impl Into<String>) -> Self {
        self.alternatives.push(query.into());
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Where records live and what each one contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// CSS selector matching one element per record
    pub container: String,
    pub fields: Vec<FieldSpec>,
    /// Gate fields: a record missing any of these is dropped
    #[serde(default)]
    pub required: Vec<String>,
}

impl RecordSpec {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Field names in declaration order
    pub fn column_order(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}
