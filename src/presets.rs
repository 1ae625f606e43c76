//! Ready-made targets: job-board search results and the help-page table

use crate::error::ExtractError;
use crate::extractors::{FieldSpec, RecordSpec, TableQuery, Transform};
use crate::fetch::ReadinessCondition;

pub const JOB_BOARD_BASE: &str = "https://www.glassdoor.co.in/Job";

/// Output columns of the job-listing schema, in order
pub const JOB_COLUMNS: [&str; 8] = [
    "title",
    "employer",
    "location",
    "description",
    "skills",
    "posting_age",
    "rating",
    "logo_link",
];

/// Present once client-side rendering has produced job cards
pub const JOB_READY_SELECTOR: &str = ".JobCard_jobTitle___7I6y";

const JOB_SNIPPET: &str = "div.JobCard_jobDescriptionSnippet__yWW8q";

/// One record per job card. Title and employer gate inclusion; everything
/// else falls back to an empty string.
pub fn job_listing_schema() -> RecordSpec {
    RecordSpec {
        container: r#"li[data-test="jobListing"]"#.to_string(),
        fields: vec![
            FieldSpec::new("title", "a.JobCard_jobTitle___7I6y"),
            FieldSpec::new("employer", "span.EmployerProfile_compactEmployerName__LE242"),
            FieldSpec::new("location", "div.JobCard_location__rCz3x"),
            FieldSpec::new("description", format!("{} > div:nth-of-type(1)", JOB_SNIPPET))
                .with_transform(Transform::CollapseWhitespace),
            FieldSpec::new("skills", format!("{} > div:nth-of-type(2)", JOB_SNIPPET))
                .with_transform(Transform::CollapseWhitespace),
            FieldSpec::new("posting_age", "div.JobCard_listingAge__Ny_nG"),
            FieldSpec::new("rating", "div.EmployerProfile_ratingContainer__ul0Ef"),
            FieldSpec::new("logo_link", "img.EmployerLogo_logo__qwcMW.logo::attr(src)"),
        ],
        required: vec!["title".to_string(), "employer".to_string()],
    }
}

pub fn job_ready_condition() -> ReadinessCondition {
    ReadinessCondition::element(JOB_READY_SELECTOR)
}

/// Search-results URL for a keyword phrase, e.g. "work from home accountant"
pub fn job_search_url(term: &str) -> String {
    let slug = term
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    format!("{}/{}-jobs-SRCH_KO0,{}.htm", JOB_BOARD_BASE, slug, slug.len())
}

pub const HELP_TABLE_URL: &str = "https://en.wikipedia.org/wiki/Help:Table";
pub const HELP_TABLE_CAPTION: &str = "Overview of basic table markup";

/// The markup overview table on the wiki help page
pub fn help_table_query() -> Result<TableQuery, ExtractError> {
    TableQuery::caption_equals(HELP_TABLE_CAPTION)?.with_container("table.wikitable")
}
