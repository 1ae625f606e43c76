use std::path::Path;

use page_tabulator::fetch::parse_target_url;
use page_tabulator::presets::{self, JOB_COLUMNS};
use page_tabulator::{
    Error, FetchError, FetchErrorKind, Fetcher, OutputFormat, PageContent, Pipeline,
    RecordExtractor, TableQuery,
};

/// Serves one fixture file for every URL
struct FixtureFetcher {
    markup: String,
}

impl FixtureFetcher {
    fn load(name: &str) -> Self {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name);
        Self {
            markup: std::fs::read_to_string(path).unwrap(),
        }
    }
}

impl Fetcher for FixtureFetcher {
    fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        Ok(PageContent::new(parse_target_url(url)?, self.markup.clone()))
    }
}

struct DownFetcher;

impl Fetcher for DownFetcher {
    fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        Err(FetchError::BadStatus {
            url: url.to_string(),
            status: 503,
        })
    }
}

fn job_extractor() -> RecordExtractor {
    RecordExtractor::new(&presets::job_listing_schema()).unwrap()
}

#[test]
fn job_cards_without_title_are_dropped() {
    let pipeline = Pipeline::new(FixtureFetcher::load("job_cards.html"));
    let url = presets::job_search_url("work from home accountant");

    let tabular = pipeline.scrape_records(&url, &job_extractor()).unwrap();

    assert_eq!(tabular.columns(), JOB_COLUMNS);
    assert_eq!(tabular.len(), 1);
    assert_eq!(tabular.value(0, "title"), Some("Remote Accountant"));
    assert_eq!(tabular.value(0, "employer"), Some("Acme Ledger Services"));
    assert_eq!(tabular.value(0, "location"), Some("Bengaluru"));
    assert_eq!(
        tabular.value(0, "description"),
        Some("Prepare monthly reconciliations and ledgers.")
    );
    assert_eq!(tabular.value(0, "skills"), Some("Skills: Tally, GST, Excel"));
    assert_eq!(tabular.value(0, "posting_age"), Some("3d"));
    assert_eq!(tabular.value(0, "rating"), Some("4.1"));
    assert_eq!(
        tabular.value(0, "logo_link"),
        Some("https://media.example.com/sqll/1234/acme.png")
    );
}

#[test]
fn job_export_writes_header_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("final_list.csv");
    let pipeline = Pipeline::new(FixtureFetcher::load("job_cards.html"));

    pipeline
        .export_records(
            "https://jobs.example.com/search",
            &job_extractor(),
            &path,
            OutputFormat::Csv,
        )
        .unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some(JOB_COLUMNS.join(",").as_str()));
    assert!(lines.next().unwrap().starts_with("Remote Accountant,Acme Ledger Services,Bengaluru,"));
    assert_eq!(lines.next(), None);
}

#[test]
fn empty_result_still_writes_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.tsv");
    let pipeline = Pipeline::new(FixtureFetcher::load("help_table.html"));

    let tabular = pipeline
        .export_records(
            "https://jobs.example.com/search",
            &job_extractor(),
            &path,
            OutputFormat::Tsv,
        )
        .unwrap();

    assert!(tabular.is_empty());
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, format!("{}\n", JOB_COLUMNS.join("\t")));
}

#[test]
fn caption_table_is_assembled_with_padding() {
    let pipeline = Pipeline::new(FixtureFetcher::load("help_table.html"));

    let tabular = pipeline
        .scrape_table(presets::HELP_TABLE_URL, &presets::help_table_query().unwrap())
        .unwrap()
        .expect("table should be found");

    assert_eq!(tabular.columns(), ["Markup", "Meaning", "Required"]);
    assert_eq!(tabular.len(), 2);
    assert_eq!(tabular.rows()[0], ["{|", "table start", "required"]);
    assert_eq!(tabular.rows()[1], ["|}", "table end", ""]);
}

#[test]
fn table_export_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    let pipeline = Pipeline::new(FixtureFetcher::load("help_table.html"));

    let found = pipeline
        .export_table(
            presets::HELP_TABLE_URL,
            &presets::help_table_query().unwrap(),
            &path,
            OutputFormat::Csv,
        )
        .unwrap();

    assert!(found.is_some());
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "Markup,Meaning,Required\n{|,table start,required\n|},table end,\n"
    );
}

#[test]
fn missing_table_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    let pipeline = Pipeline::new(FixtureFetcher::load("job_cards.html"));

    let found = pipeline
        .export_table(
            presets::HELP_TABLE_URL,
            &TableQuery::caption_equals("Overview of basic table markup").unwrap(),
            &path,
            OutputFormat::Csv,
        )
        .unwrap();

    assert!(found.is_none());
    assert!(!path.exists());
}

#[test]
fn unwritable_destination_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("table.csv");
    let pipeline = Pipeline::new(FixtureFetcher::load("help_table.html"));

    let err = pipeline
        .export_table(
            presets::HELP_TABLE_URL,
            &presets::help_table_query().unwrap(),
            &path,
            OutputFormat::Csv,
        )
        .unwrap_err();

    assert!(matches!(err, Error::Sink(_)));
    assert!(!path.exists());
}

#[test]
fn fetch_failure_ends_run_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.csv");
    let pipeline = Pipeline::new(DownFetcher);

    let err = pipeline
        .export_records(
            "https://jobs.example.com/search",
            &job_extractor(),
            &path,
            OutputFormat::Csv,
        )
        .unwrap_err();

    match err {
        Error::Fetch(e) => assert_eq!(e.kind(), FetchErrorKind::BadStatus),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!path.exists());
}

#[test]
fn invalid_url_is_rejected() {
    let pipeline = Pipeline::new(FixtureFetcher::load("help_table.html"));

    let err = pipeline
        .scrape_table("ftp://example.com/table", &presets::help_table_query().unwrap())
        .unwrap_err();

    assert!(matches!(err, Error::Fetch(FetchError::InvalidUrl { .. })));
}
