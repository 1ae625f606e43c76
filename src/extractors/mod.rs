//! HTML extraction
//!
//! - `query`: locate queries (`selector::text`, `selector::attr(x)`) and value transforms
//! - `schema`: declarative record schemas, loadable from JSON
//! - `records`: container fragments → records, with fallback and gate fields
//! - `table`: caption-anchored table → grid of cell text

mod query;
mod records;
mod schema;
mod table;

pub use query::*;
pub use records::*;
pub use schema::*;
pub use table::*;
