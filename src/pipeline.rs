//! One-shot runs: fetch → extract → assemble → (write)
//!
//! Every run is all-or-nothing: either a complete [`Tabular`] comes back
//! (and is written, for the `export_*` variants) or a single [`Error`].

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::extractors::{locate_table, RecordExtractor, TableQuery};
use crate::fetch::{fetcher_for, FetchConfig, FetchMode, Fetcher};
use crate::sink::{self, OutputFormat};
use crate::tabular::Tabular;

pub struct Pipeline {
    fetcher: Box<dyn Fetcher>,
}

impl Pipeline {
    pub fn new(fetcher: impl Fetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
        }
    }

    pub fn for_mode(mode: &FetchMode, config: &FetchConfig) -> Self {
        Self {
            fetcher: fetcher_for(mode, config),
        }
    }

    /// Records on `url`, one row each, columns in schema order
    pub fn scrape_records(&self, url: &str, extractor: &RecordExtractor) -> Result<Tabular> {
        let page = self.fetcher.fetch(url)?;
        let records = extractor.extract(&page);
        info!("{} records extracted from {}", records.len(), page.url());
        Ok(Tabular::from_records(&records, extractor.columns())?)
    }

    /// The table matching `query`, or `None` if the page has no such table
    pub fn scrape_table(&self, url: &str, query: &TableQuery) -> Result<Option<Tabular>> {
        let page = self.fetcher.fetch(url)?;
        match locate_table(&page, query) {
            Some(grid) => Ok(Some(Tabular::from_grid(grid)?)),
            None => {
                info!("No matching table on {}", page.url());
                Ok(None)
            }
        }
    }

    /// [`Self::scrape_records`], then write. Zero records still writes the header.
    pub fn export_records(
        &self,
        url: &str,
        extractor: &RecordExtractor,
        destination: &Path,
        format: OutputFormat,
    ) -> Result<Tabular> {
        let tabular = self.scrape_records(url, extractor)?;
        sink::write(&tabular, destination, format)?;
        Ok(tabular)
    }

    /// [`Self::scrape_table`], then write if found. Nothing is written on `None`.
    pub fn export_table(
        &self,
        url: &str,
        query: &TableQuery,
        destination: &Path,
        format: OutputFormat,
    ) -> Result<Option<Tabular>> {
        let Some(tabular) = self.scrape_table(url, query)? else {
            return Ok(None);
        };
        sink::write(&tabular, destination, format)?;
        Ok(Some(tabular))
    }
}
