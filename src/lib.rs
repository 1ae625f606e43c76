//! Structured web extraction into delimited tables
//!
//! Pipeline stages:
//! - fetch: static GET or headless-browser render
//! - extract: records via a selector schema, or one caption-anchored table
//! - assemble: uniform named columns
//! - sink: atomic CSV/TSV write

pub mod error;
pub mod extractors;
pub mod fetch;
pub mod pipeline;
pub mod presets;
pub mod sink;
pub mod tabular;

pub use error::{AssemblyError, Error, ExtractError, FetchError, FetchErrorKind, Result, SinkError};
pub use extractors::*;
pub use fetch::{fetch, FetchConfig, FetchMode, Fetcher, PageContent, ReadinessCondition};
pub use pipeline::Pipeline;
pub use sink::{write, OutputFormat};
pub use tabular::Tabular;
