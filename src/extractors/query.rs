//! Locate queries: a CSS selector plus an accessor
//!
//! Syntax: `<selector>[::text | ::html | ::attr(<name>)]`. Text is the
//! default. An empty selector (e.g. `::attr(data-id)`) reads from the
//! fragment element itself.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// What to read from the matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Concatenated descendant text, trimmed
    Text,
    /// Outer HTML
    Html,
    Attr(String),
}

/// A compiled, fragment-scoped lookup
#[derive(Debug, Clone)]
pub struct LocateQuery {
    source: String,
    selector: Option<Selector>,
    accessor: Accessor,
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn split_accessor(input: &str) -> (&str, Accessor) {
    if let Some(pos) = input.rfind("::text") {
        (&input[..pos], Accessor::Text)
    } else if let Some(pos) = input.rfind("::html") {
        (&input[..pos], Accessor::Html)
    } else if let Some(pos) = input.rfind("::attr(") {
        let attr_start = pos + 7;
        match input[attr_start..].find(')') {
            Some(attr_end) => {
                let name = input[attr_start..attr_start + attr_end].trim().to_string();
                (&input[..pos], Accessor::Attr(name))
            }
            None => (input, Accessor::Text),
        }
    } else {
        (input, Accessor::Text)
    }
}

impl LocateQuery {
    pub fn parse(query: &str) -> Result<Self, ExtractError> {
        let (selector, accessor) = split_accessor(query.trim());
        if let Accessor::Attr(name) = &accessor {
            if name.is_empty() {
                return Err(ExtractError::InvalidSelector {
                    selector: query.to_string(),
                    reason: "empty attribute name".to_string(),
                });
            }
        }

        let selector = selector.trim();
        let selector = if selector.is_empty() {
            None
        } else {
            Some(parse_selector(selector)?)
        };

        Ok(Self {
            source: query.to_string(),
            selector,
            accessor,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// Evaluate against one fragment. Only descendants of `fragment` are
    /// searched; the first match in document order wins. `None` means the
    /// element or attribute was not there.
    pub fn evaluate(&self, fragment: ElementRef<'_>) -> Option<String> {
        let element = match &self.selector {
            Some(selector) => fragment.select(selector).next()?,
            None => fragment,
        };

        match &self.accessor {
            Accessor::Text => Some(element.text().collect::<String>().trim().to_string()),
            Accessor::Html => Some(element.html()),
            Accessor::Attr(name) => element.value().attr(name).map(String::from),
        }
    }
}

/// Normalization applied to a value that was actually found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Trim,
    CollapseWhitespace,
    Lowercase,
    Uppercase,
    /// Keep digits and the first decimal separator: "4.1 ★" -> "4.1"
    ParseNumber,
}

impl Transform {
    /// `None` when nothing usable is left, which counts as a miss
    pub fn apply(self, value: &str) -> Option<String> {
        match self {
            Transform::Trim => Some(value.trim().to_string()),
            Transform::CollapseWhitespace => {
                Some(WHITESPACE.replace_all(value.trim(), " ").into_owned())
            }
            Transform::Lowercase => Some(value.to_lowercase()),
            Transform::Uppercase => Some(value.to_uppercase()),
            Transform::ParseNumber => {
                let mut result = String::new();
                let mut has_decimal = false;
                for c in value.chars() {
                    if c.is_ascii_digit() {
                        result.push(c);
                    } else if (c == '.' || c == ',') && !has_decimal && !result.is_empty() {
                        result.push('.');
                        has_decimal = true;
                    }
                }
                let result = result.trim_end_matches('.').to_string();
                if result.is_empty() {
                    None
                } else {
                    Some(result)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(doc: &'a Html, selector: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(selector).unwrap()).next().unwrap()
    }

    #[test]
    fn test_parse_accessors() {
        let q = LocateQuery::parse("a.title").unwrap();
        assert_eq!(q.accessor(), &Accessor::Text);

        let q = LocateQuery::parse("img.logo::attr(src)").unwrap();
        assert_eq!(q.accessor(), &Accessor::Attr("src".to_string()));

        let q = LocateQuery::parse("div.snippet::html").unwrap();
        assert_eq!(q.accessor(), &Accessor::Html);

        let q = LocateQuery::parse("span.name::text").unwrap();
        assert_eq!(q.accessor(), &Accessor::Text);
        assert_eq!(q.source(), "span.name::text");
    }

    #[test]
    fn test_invalid_queries() {
        assert!(matches!(
            LocateQuery::parse("div[[").unwrap_err(),
            ExtractError::InvalidSelector { .. }
        ));
        assert!(LocateQuery::parse("img::attr()").is_err());
    }

    #[test]
    fn test_evaluate_is_fragment_scoped() {
        let doc = Html::parse_document(
            r#"
            <span class="name">Outside</span>
            <div class="card" data-id="7">
                <span class="name">  Inside  </span>
                <span class="name">Second</span>
                <img class="logo" src="/logo.png">
            </div>
            "#,
        );
        let card = first(&doc, "div.card");

        assert_eq!(
            LocateQuery::parse("span.name").unwrap().evaluate(card),
            Some("Inside".to_string())
        );
        assert_eq!(
            LocateQuery::parse("img.logo::attr(src)").unwrap().evaluate(card),
            Some("/logo.png".to_string())
        );
        assert_eq!(
            LocateQuery::parse("::attr(data-id)").unwrap().evaluate(card),
            Some("7".to_string())
        );
        assert_eq!(LocateQuery::parse("img.logo::attr(alt)").unwrap().evaluate(card), None);
        assert_eq!(LocateQuery::parse("a.missing").unwrap().evaluate(card), None);
    }

    #[test]
    fn test_transforms() {
        assert_eq!(Transform::ParseNumber.apply("4.1 ★"), Some("4.1".to_string()));
        assert_eq!(Transform::ParseNumber.apply("12,99 €"), Some("12.99".to_string()));
        assert_eq!(Transform::ParseNumber.apply("30d+"), Some("30".to_string()));
        assert_eq!(Transform::ParseNumber.apply("n/a"), None);
        assert_eq!(
            Transform::CollapseWhitespace.apply("  Remote \n\t work "),
            Some("Remote work".to_string())
        );
        assert_eq!(Transform::Lowercase.apply("Pune"), Some("pune".to_string()));
    }
}
