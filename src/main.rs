use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use page_tabulator::fetch::{FetchConfig, FetchMode, ReadinessCondition, DEFAULT_USER_AGENT};
use page_tabulator::presets;
use page_tabulator::{OutputFormat, Pipeline, RecordExtractor, RecordSpec, TableQuery, TextMatch};

#[derive(Parser)]
#[command(name = "page-tabulator", about = "Scrape web pages into CSV/TSV tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (default: from the output extension, else csv)
    #[arg(long, global = true, value_enum)]
    format: Option<Format>,

    #[arg(long, global = true, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Per-request network timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    request_timeout: u64,

    /// Chrome/Chromium binary for rendered fetches (auto-detected if unset)
    #[arg(long, global = true, env = "CHROME_PATH")]
    chrome: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long, global = true)]
    headful: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Job listings for a search phrase (rendered by default)
    Jobs {
        /// Search phrase, e.g. "work from home accountant"
        term: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Plain GET instead of a browser render
        #[arg(long = "static")]
        static_fetch: bool,
        /// Seconds to wait for job cards to render
        #[arg(long, default_value_t = 20)]
        timeout: u64,
        /// Override the readiness selector
        #[arg(long, default_value = presets::JOB_READY_SELECTOR)]
        ready: String,
    },
    /// Records from any page using a JSON selector schema
    Records {
        url: String,
        /// JSON file with {"container", "fields", "required"}
        #[arg(long)]
        schema: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// The table whose caption matches exactly
    Table {
        #[arg(default_value = presets::HELP_TABLE_URL)]
        url: String,
        #[arg(long, default_value = presets::HELP_TABLE_CAPTION)]
        caption: String,
        /// Selector the enclosing table must match
        #[arg(long, default_value = "table.wikitable")]
        container: String,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Render in a headless browser and wait for this selector
    #[arg(long = "render", value_name = "SELECTOR")]
    ready: Option<String>,
    /// Seconds to wait for the readiness selector
    #[arg(long, default_value_t = 20)]
    timeout: u64,
}

impl RenderArgs {
    fn mode(&self) -> FetchMode {
        match &self.ready {
            Some(selector) => FetchMode::Rendered {
                ready: ReadinessCondition::element(selector),
                timeout: Duration::from_secs(self.timeout),
            },
            None => FetchMode::Static,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Tsv,
}

fn output_format(explicit: Option<Format>, path: &Path) -> OutputFormat {
    match explicit {
        Some(Format::Csv) => OutputFormat::Csv,
        Some(Format::Tsv) => OutputFormat::Tsv,
        None => OutputFormat::from_path(path).unwrap_or_default(),
    }
}

fn load_schema(path: &Path) -> anyhow::Result<RecordExtractor> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    let spec = RecordSpec::from_json(&json)
        .with_context(|| format!("Failed to parse schema {}", path.display()))?;
    Ok(RecordExtractor::new(&spec)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let config = FetchConfig {
        user_agent: cli.user_agent.clone(),
        request_timeout: Duration::from_secs(cli.request_timeout),
        chrome_executable: cli.chrome.clone(),
        headless: !cli.headful,
    };

    match cli.command {
        Commands::Jobs {
            term,
            output,
            static_fetch,
            timeout,
            ready,
        } => {
            let mode = if static_fetch {
                FetchMode::Static
            } else {
                FetchMode::Rendered {
                    ready: ReadinessCondition::element(ready),
                    timeout: Duration::from_secs(timeout),
                }
            };
            let extractor = RecordExtractor::new(&presets::job_listing_schema())?;
            let url = presets::job_search_url(&term);

            let tabular = Pipeline::for_mode(&mode, &config)
                .export_records(&url, &extractor, &output, output_format(cli.format, &output))
                .with_context(|| format!("Job scrape failed for {}", url))?;
            println!("Saved {} jobs to {}", tabular.len(), output.display());
        }
        Commands::Records {
            url,
            schema,
            output,
            render,
        } => {
            let extractor = load_schema(&schema)?;
            let tabular = Pipeline::for_mode(&render.mode(), &config)
                .export_records(&url, &extractor, &output, output_format(cli.format, &output))
                .with_context(|| format!("Record scrape failed for {}", url))?;
            println!("Saved {} records to {}", tabular.len(), output.display());
        }
        Commands::Table {
            url,
            caption,
            container,
            output,
            render,
        } => {
            let query = TableQuery::new("caption", TextMatch::Exact(caption), &container)?;
            let found = Pipeline::for_mode(&render.mode(), &config)
                .export_table(&url, &query, &output, output_format(cli.format, &output))
                .with_context(|| format!("Table scrape failed for {}", url))?;
            match found {
                Some(tabular) => println!(
                    "Saved {} rows x {} columns to {}",
                    tabular.len(),
                    tabular.columns().len(),
                    output.display()
                ),
                None => println!("Table data not found"),
            }
        }
    }

    tracing::debug!("Done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_flag_takes_ready_selector() {
        let cli = Cli::try_parse_from([
            "page-tabulator",
            "records",
            "https://example.com/jobs",
            "--schema",
            "cards.json",
            "-o",
            "out.csv",
            "--render",
            "li.card",
            "--timeout",
            "5",
        ])
        .unwrap();

        let Commands::Records { render, .. } = cli.command else {
            panic!("expected records subcommand");
        };
        match render.mode() {
            FetchMode::Rendered { ready, timeout } => {
                assert_eq!(ready, ReadinessCondition::element("li.card"));
                assert_eq!(timeout, Duration::from_secs(5));
            }
            FetchMode::Static => panic!("expected rendered mode"),
        }
    }

    #[test]
    fn test_table_defaults_to_static_help_table() {
        let cli = Cli::try_parse_from(["page-tabulator", "table", "-o", "table.tsv"]).unwrap();

        let Commands::Table { url, caption, render, output, .. } = cli.command else {
            panic!("expected table subcommand");
        };
        assert_eq!(url, presets::HELP_TABLE_URL);
        assert_eq!(caption, presets::HELP_TABLE_CAPTION);
        assert!(matches!(render.mode(), FetchMode::Static));
        assert_eq!(output_format(cli.format, &output), OutputFormat::Tsv);
    }
}
