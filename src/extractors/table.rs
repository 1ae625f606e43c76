//! Table location: find a table by the text of an anchor near it
//! (typically its `<caption>`) and read it as a grid of cell text.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::query::parse_selector;
use crate::error::ExtractError;
use crate::fetch::PageContent;

/// Predicate over an anchor's trimmed text
#[derive(Debug, Clone)]
pub enum TextMatch {
    Exact(String),
    Contains(String),
    Pattern(Regex),
}

impl TextMatch {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatch::Exact(expected) => text == expected,
            TextMatch::Contains(needle) => text.contains(needle.as_str()),
            TextMatch::Pattern(re) => re.is_match(text),
        }
    }
}

/// Rows of trimmed cell text, in document order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableGrid {
    pub rows: Vec<Vec<String>>,
}

impl From<Vec<Vec<String>>> for TableGrid {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }
}

/// Where to look for a table and how to recognise it
#[derive(Debug, Clone)]
pub struct TableQuery {
    anchor: Selector,
    matcher: TextMatch,
    container: Selector,
}

impl TableQuery {
    pub fn new(anchor: &str, matcher: TextMatch, container: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            anchor: parse_selector(anchor)?,
            matcher,
            container: parse_selector(container)?,
        })
    }

    /// The table whose `<caption>` reads exactly `text`
    pub fn caption_equals(text: impl Into<String>) -> Result<Self, ExtractError> {
        Self::new("caption", TextMatch::Exact(text.into()), "table")
    }

    /// Narrow the enclosing-table classification, e.g. `table.wikitable`
    pub fn with_container(mut self, container: &str) -> Result<Self, ExtractError> {
        self.container = parse_selector(container)?;
        Ok(self)
    }
}

/// Locate the table described by `query`. `None` means the page has no
/// matching anchor, or the anchor is not inside a matching container.
pub fn locate_table(page: &PageContent, query: &TableQuery) -> Option<TableGrid> {
    locate_table_in(page.markup(), query)
}

pub fn locate_table_in(markup: &str, query: &TableQuery) -> Option<TableGrid> {
    let document = Html::parse_document(markup);

    let Some(anchor) = document
        .select(&query.anchor)
        .find(|el| query.matcher.matches(el.text().collect::<String>().trim()))
    else {
        debug!("No anchor text matched");
        return None;
    };

    let Some(table) = anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| query.container.matches(el))
    else {
        debug!("Anchor matched but has no enclosing table container");
        return None;
    };

    Some(read_grid(table))
}

fn is_table(el: &ElementRef<'_>) -> bool {
    el.value().name() == "table"
}

/// Number of `<table>` elements strictly between `row` and `container`
fn table_depth(row: ElementRef<'_>, container: ElementRef<'_>) -> usize {
    row.ancestors()
        .take_while(|node| node.id() != container.id())
        .filter_map(ElementRef::wrap)
        .filter(is_table)
        .count()
}

fn read_grid(container: ElementRef<'_>) -> TableGrid {
    let Ok(row_selector) = Selector::parse("tr") else {
        return TableGrid::default();
    };

    // Rows of nested tables belong to those tables, not this one
    let own_depth = usize::from(!is_table(&container));

    let rows = container
        .select(&row_selector)
        .filter(|row| table_depth(*row, container) == own_depth)
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "th" | "td"))
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect()
        })
        .collect();

    TableGrid { rows }
}
