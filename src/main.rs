// src/main.rs
mod edinet;
mod index;
mod storage;
mod utils;

use clap::{Parser, Subcommand};
use edinet::client::EdinetClient;
use edinet::models::Company;
use index::builder::{BuildOptions, IndexBuilder, WindowSpec};
use index::resolver::{IndexResolver, Resolution};
use std::time::Duration;
use storage::SnapshotStore;
use utils::dates::{parse_year_list, WindowTemplate};
use utils::AppError;

/// Command Line Interface for the annual securities report index
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build per-year snapshot files by scanning the EDINET document list
    Build {
        /// Target fiscal years: "2024", "2021-2023" or "2020,2022-2024"
        #[arg(long)]
        years: String,

        /// Company master list (JSON array of {code, name, market})
        #[arg(long)]
        companies: String,

        /// Month-day window applied per year (filing season by default)
        #[arg(long, default_value = "06-01..09-30")]
        window: String,

        /// Absolute window start (YYYY-MM-DD, overrides --window; requires --to)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Absolute window end (YYYY-MM-DD, overrides --window; requires --from)
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Minimum spacing between upstream calls, in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Attempts per date before the year is failed
        #[arg(long, default_value = "3")]
        retries: u32,

        /// Regenerate years whose snapshot file already exists
        #[arg(long)]
        force: bool,

        /// Abandon remaining years after the first failure
        #[arg(long)]
        stop_on_failure: bool,

        /// Accepted for compatibility; the builder always captures
        /// amendments, lookup filters them
        #[arg(long)]
        include_amendments: bool,

        /// Directory for the snapshot files
        #[arg(short, long, default_value = "./index")]
        output_dir: String,
    },

    /// Resolve one company and year against the built snapshots
    Lookup {
        /// 4-character securities code, e.g. "7203"
        #[arg(long)]
        code: String,

        /// Target fiscal year
        #[arg(long)]
        year: u16,

        /// Also return amended reports (訂正有価証券報告書)
        #[arg(long)]
        include_amendments: bool,

        /// Directory holding the snapshot files
        #[arg(short, long, default_value = "./index")]
        index_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::debug!("Starting with args: {:?}", cli);

    match cli.command {
        Commands::Build {
            years,
            companies,
            window,
            from,
            to,
            interval_ms,
            retries,
            force,
            stop_on_failure,
            include_amendments,
            output_dir,
        } => {
            if include_amendments {
                tracing::info!(
                    "--include-amendments noted; amendments are always captured at build time"
                );
            }
            run_build(
                &years,
                &companies,
                &window,
                from.as_deref(),
                to.as_deref(),
                interval_ms,
                retries,
                force,
                stop_on_failure,
                &output_dir,
            )
            .await
        }
        Commands::Lookup {
            code,
            year,
            include_amendments,
            index_dir,
        } => run_lookup(&code, year, include_amendments, &index_dir).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_build(
    years: &str,
    companies_path: &str,
    window: &str,
    from: Option<&str>,
    to: Option<&str>,
    interval_ms: u64,
    retries: u32,
    force: bool,
    stop_on_failure: bool,
    output_dir: &str,
) -> Result<(), AppError> {
    let years = parse_year_list(years).map_err(AppError::Config)?;
    let companies = load_companies(companies_path)?;
    tracing::info!(
        "Building {} year(s) for {} companies",
        years.len(),
        companies.len()
    );

    let window = match (from, to) {
        (Some(from), Some(to)) => WindowSpec::Absolute {
            from: from.to_string(),
            to: to.to_string(),
        },
        _ => WindowSpec::Template(WindowTemplate::parse(window).map_err(AppError::Config)?),
    };

    let api_key = std::env::var("EDINET_API_KEY").ok();
    if api_key.is_none() {
        tracing::warn!("EDINET_API_KEY not set, calling the API anonymously");
    }

    let client = EdinetClient::new(api_key, Duration::from_millis(interval_ms), retries)?;
    let builder = IndexBuilder::new(&client, &companies);
    let store = SnapshotStore::new(output_dir)?;
    let options = BuildOptions {
        force,
        stop_on_failure,
    };

    let report = builder.build_years(&store, &years, &window, &options).await;

    tracing::info!(
        "Build finished. Built: {:?}, skipped: {:?}, failed: {}",
        report.built,
        report.skipped,
        report.failed.len()
    );
    for (year, error) in &report.failed {
        tracing::error!("  {} failed: {}", year, error);
    }

    if report.any_failed() {
        let failed_years: Vec<String> =
            report.failed.iter().map(|(y, _)| y.to_string()).collect();
        return Err(AppError::Build(format!(
            "{} year(s) failed: {}",
            report.failed.len(),
            failed_years.join(", ")
        )));
    }

    Ok(())
}

async fn run_lookup(
    code: &str,
    year: u16,
    include_amendments: bool,
    index_dir: &str,
) -> Result<(), AppError> {
    let store = SnapshotStore::new(index_dir)?;
    let resolver = IndexResolver::new(store.source_map()?);

    let company = Company {
        code: code.to_string(),
        name: String::new(),
        market: String::new(),
    };

    match resolver.resolve(&company, year, include_amendments).await {
        Resolution::NotIndexed => {
            let mut available = resolver.registered_years();
            available.sort_unstable();
            println!("{} {}: 未収録 (year not indexed)", code, year);
            println!("  indexed years: {:?}", available);
        }
        Resolution::Indexed(filings) if filings.is_empty() => {
            println!("{} {}: なし (indexed, no matching reports)", code, year);
        }
        Resolution::Indexed(filings) => {
            println!("{} {}: {} report(s)", code, year, filings.len());
            for filing in filings {
                println!(
                    "  {}  {}  {}",
                    filing.doc_id,
                    filing.submit_date().unwrap_or("----------"),
                    filing.doc_description.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

/// Reads the company master list (an externally produced JSON export).
fn load_companies(path: &str) -> Result<Vec<Company>, AppError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Cannot read company list {}: {}", path, e)))?;
    let companies: Vec<Company> = serde_json::from_str(&raw)
        .map_err(|e| AppError::Config(format!("Invalid company list {}: {}", path, e)))?;

    if companies.is_empty() {
        return Err(AppError::Config(format!("Company list {} is empty", path)));
    }
    for company in &companies {
        if company.code.len() != 4 {
            tracing::warn!(
                "Company {} has a non-4-character code: {}",
                company.name,
                company.code
            );
        }
    }

    Ok(companies)
}
