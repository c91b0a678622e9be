//! Engage CLI - Command-line shell for the Brut engagement engine
//!
//! Commands:
//! - dashboard: Filter the table and print every dashboard view
//! - validate: Check a table for malformed rows
//! - dimensions: List platforms, regions, themes and the date span
//! - generate: Write a synthetic engagement table
//! - schema: Print the input column contract

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

use brut_engagement::encoder::SnapshotEncoder;
use brut_engagement::generator::SyntheticGenerator;
use brut_engagement::schema::{RecordAdapter, REQUIRED_COLUMNS};
use brut_engagement::source::{write_records, Dataset};
use brut_engagement::types::{Dashboard, DashboardView};
use brut_engagement::{
    DashboardEngine, DatasetCache, EngineConfig, FilterSpec, ViewOptions, ENGINE_VERSION,
};

/// Engage - Filtering and aggregation engine for engagement dashboards
#[derive(Parser)]
#[command(name = "engage")]
#[command(author = "Brut Data Team")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Aggregate social media engagement data into dashboard views", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter the table and print every dashboard view
    Dashboard {
        /// Input CSV path (defaults to ENGAGE_DATA_PATH)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Number of themes in the top themes table
        #[arg(long)]
        top_themes: Option<usize>,

        /// Number of rows in the recent posts table
        #[arg(long)]
        rows: Option<usize>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check a table for malformed rows
    Validate {
        /// Input CSV path (defaults to ENGAGE_DATA_PATH)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List platforms, regions, themes and the date span
    Dimensions {
        /// Input CSV path (defaults to ENGAGE_DATA_PATH)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic engagement table
    Generate {
        /// Output CSV path (defaults to ENGAGE_DATA_PATH)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of records
        #[arg(long)]
        records: Option<usize>,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Days covered by the table, ending today
        #[arg(long, default_value = "180")]
        days: i64,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the input column contract
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

/// Selection flags. Omitted category flags select every value.
#[derive(Args)]
struct FilterArgs {
    /// First day included (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Platform to include (repeatable)
    #[arg(long = "platform")]
    platforms: Vec<String>,

    /// Region to include (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Content theme to include (repeatable)
    #[arg(long = "theme")]
    themes: Vec<String>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable tables
    Text,
    /// Compact JSON snapshot
    Json,
    /// Pretty-printed JSON snapshot
    JsonPretty,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => return report_error(EngageCliError::Config(e)),
    };

    let env_filter =
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(e),
    }
}

fn report_error(e: EngageCliError) -> ExitCode {
    eprintln!(
        "{}",
        serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
    );
    ExitCode::FAILURE
}

fn run(cli: Cli, config: &EngineConfig) -> Result<(), EngageCliError> {
    match cli.command {
        Commands::Dashboard {
            input,
            filter,
            top_themes,
            rows,
            format,
        } => {
            let defaults = config.view_options();
            let options = ViewOptions {
                top_themes: top_themes.unwrap_or(defaults.top_themes),
                display_rows: rows.unwrap_or(defaults.display_rows),
            };
            cmd_dashboard(config, input.as_deref(), &filter, options, format)
        }

        Commands::Validate { input, json } => {
            cmd_validate(input.as_deref().unwrap_or(&config.data_path), json)
        }

        Commands::Dimensions { input, json } => cmd_dimensions(config, input.as_deref(), json),

        Commands::Generate {
            output,
            records,
            seed,
            days,
            force,
        } => {
            let generator = SyntheticGenerator::new()
                .with_records(records.unwrap_or(config.synthetic_records))
                .with_seed(seed.unwrap_or(config.synthetic_seed))
                .with_window_days(days);
            cmd_generate(output.as_deref().unwrap_or(&config.data_path), &generator, force)
        }

        Commands::Schema { json_schema } => {
            cmd_schema(json_schema);
            Ok(())
        }
    }
}

fn load(config: &EngineConfig, input: Option<&Path>) -> Result<Arc<Dataset>, EngageCliError> {
    let path = input.unwrap_or(&config.data_path);
    Ok(DatasetCache::global().load(path, &config.load_options())?)
}

fn cmd_dashboard(
    config: &EngineConfig,
    input: Option<&Path>,
    args: &FilterArgs,
    options: ViewOptions,
    format: OutputFormat,
) -> Result<(), EngageCliError> {
    let dataset = load(config, input)?;
    let engine = DashboardEngine::with_options(dataset, options);

    let filter = build_filter(&engine, args);
    let view = engine.render(&filter);

    match format {
        OutputFormat::Text => print_view(&view),
        OutputFormat::Json => {
            let payload = SnapshotEncoder::new().encode(&view, engine.dataset());
            println!("{}", serde_json::to_string(&payload)?);
        }
        OutputFormat::JsonPretty => {
            let json = SnapshotEncoder::new().encode_to_json(&view, engine.dataset())?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Start from the full selection and narrow it with whatever flags were given
fn build_filter(engine: &DashboardEngine, args: &FilterArgs) -> FilterSpec {
    let mut filter = engine
        .default_filter()
        .unwrap_or_else(|| FilterSpec::new(NaiveDate::MIN, NaiveDate::MAX));

    if let Some(from) = args.from {
        filter.date_from = from;
    }
    if let Some(to) = args.to {
        filter.date_to = to;
    }
    if !args.platforms.is_empty() {
        filter = filter.with_platforms(args.platforms.iter().cloned());
    }
    if !args.regions.is_empty() {
        filter = filter.with_regions(args.regions.iter().cloned());
    }
    if !args.themes.is_empty() {
        filter = filter.with_themes(args.themes.iter().cloned());
    }
    filter
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), EngageCliError> {
    let file = fs::File::open(input)?;
    let table = RecordAdapter::parse_csv(std::io::BufReader::new(file))?;
    let report = table.report;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total rows:    {}", report.total_rows);
        println!("Valid rows:    {}", report.accepted_rows);
        println!("Invalid rows:  {}", report.rejected_rows());

        if !report.is_clean() {
            println!("\nErrors:");
            for rejection in &report.rejections {
                println!("  - line {}: {}", rejection.line, rejection.error);
            }
        }
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(EngageCliError::ValidationFailed(report.rejected_rows()))
    }
}

fn cmd_dimensions(
    config: &EngineConfig,
    input: Option<&Path>,
    json: bool,
) -> Result<(), EngageCliError> {
    let dataset = load(config, input)?;
    let dimensions = dataset.dimensions();

    if json {
        println!("{}", serde_json::to_string_pretty(dimensions)?);
        return Ok(());
    }

    println!("Dimensions");
    println!("==========");
    match dimensions.date_range() {
        Some((first, last)) => println!("Dates:     {first} .. {last}"),
        None => println!("Dates:     (no records)"),
    }
    println!("Platforms: {}", dimensions.platforms.join(", "));
    println!("Regions:   {}", dimensions.regions.join(", "));
    println!("Themes:    {}", dimensions.themes.join(", "));
    Ok(())
}

fn cmd_generate(
    output: &Path,
    generator: &SyntheticGenerator,
    force: bool,
) -> Result<(), EngageCliError> {
    if output.exists() && !force {
        return Err(EngageCliError::OutputExists(output.to_path_buf()));
    }

    let records = generator.generate();
    write_records(output, &records)?;
    DatasetCache::global().invalidate(output);

    println!(
        "Generated {} records of synthetic engagement data",
        records.len()
    );
    println!("Saved to {}", output.display());
    Ok(())
}

fn cmd_schema(json_schema: bool) {
    if json_schema {
        println!("{}", get_input_json_schema());
        return;
    }

    println!("Input Schema: engagement table (CSV with header row)");
    println!();
    println!("Required columns (any order, extra columns ignored):");
    println!("  - timestamp      date-time, e.g. 2024-01-15 09:10:00 or 2024-01-15T09:10:00Z");
    println!("  - platform       non-empty text (open set)");
    println!("  - region         non-empty text (open set)");
    println!("  - content_theme  non-empty text (open set)");
    println!("  - views          non-negative integer");
    println!("  - likes          non-negative integer");
    println!("  - shares         non-negative integer");
    println!("  - comments       non-negative integer");
    println!();
    println!("Derived: engagement_rate = (likes + comments + shares) / views * 100");
    println!("         rounded to 2 decimals, 0 when views is 0");
}

// Helper functions

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {value:?}: {e}"))
}

fn print_view(view: &DashboardView) {
    match view {
        DashboardView::Empty { message, .. } => println!("{message}"),
        DashboardView::Ready(dashboard) => print_dashboard(dashboard),
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    let kpis = &dashboard.kpis;
    println!("PERFORMANCE STATS");
    println!("=================");
    println!("Total views:     {}", kpis.total_views);
    println!("Avg likes:       {}", kpis.avg_likes);
    println!("Avg engagement:  {:.2}%", kpis.avg_engagement);
    println!("Total posts:     {}", kpis.total_posts);

    println!("\nPLATFORMS");
    println!(
        "{:<14} {:>6} {:>12} {:>10} {:>10} {:>10} {:>8}",
        "platform", "posts", "views", "likes", "comments", "shares", "eng %"
    );
    for row in &dashboard.platforms {
        println!(
            "{:<14} {:>6} {:>12} {:>10} {:>10} {:>10} {:>8.2}",
            row.platform,
            row.posts,
            row.views,
            row.likes,
            row.comments,
            row.shares,
            row.engagement_rate
        );
    }

    println!("\nTOP THEMES");
    println!("{:<16} {:>6} {:>12} {:>8}", "theme", "posts", "views", "eng %");
    for row in &dashboard.top_themes {
        println!(
            "{:<16} {:>6} {:>12} {:>8.2}",
            row.content_theme, row.posts, row.views, row.engagement_rate
        );
    }

    println!("\nDAILY");
    println!(
        "{:<10} {:>6} {:>12} {:>10} {:>10} {:>10} {:>8}",
        "date", "posts", "views", "likes", "comments", "shares", "eng %"
    );
    for row in &dashboard.daily {
        println!(
            "{:<10} {:>6} {:>12} {:>10} {:>10} {:>10} {:>8.2}",
            row.date.to_string(),
            row.posts,
            row.views,
            row.likes,
            row.comments,
            row.shares,
            row.engagement_rate
        );
    }

    println!("\nRECENT POSTS");
    println!(
        "{:<16} {:<10} {:<8} {:<14} {:>10} {:>8} {:>8} {:>8} {:>8}",
        "timestamp", "platform", "region", "theme", "views", "likes", "shares", "comments", "eng %"
    );
    for row in &dashboard.recent_posts {
        println!(
            "{:<16} {:<10} {:<8} {:<14} {:>10} {:>8} {:>8} {:>8} {:>8.2}",
            row.timestamp,
            row.platform,
            row.region,
            row.content_theme,
            row.views,
            row.likes,
            row.shares,
            row.comments,
            row.engagement_rate
        );
    }
}

fn get_input_json_schema() -> String {
    let count = serde_json::json!({ "type": "integer", "minimum": 0 });
    let category = serde_json::json!({ "type": "string", "minLength": 1 });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "engagement_record",
        "description": "One row of the engagement table",
        "type": "object",
        "required": REQUIRED_COLUMNS,
        "properties": {
            "timestamp": { "type": "string", "format": "date-time" },
            "platform": category,
            "region": category,
            "content_theme": category,
            "views": count,
            "likes": count,
            "shares": count,
            "comments": count
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum EngageCliError {
    Io(std::io::Error),
    Compute(brut_engagement::ComputeError),
    Config(brut_engagement::ConfigError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    OutputExists(PathBuf),
}

impl From<std::io::Error> for EngageCliError {
    fn from(e: std::io::Error) -> Self {
        EngageCliError::Io(e)
    }
}

impl From<brut_engagement::ComputeError> for EngageCliError {
    fn from(e: brut_engagement::ComputeError) -> Self {
        EngageCliError::Compute(e)
    }
}

impl From<serde_json::Error> for EngageCliError {
    fn from(e: serde_json::Error) -> Self {
        EngageCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EngageCliError> for CliError {
    fn from(e: EngageCliError) -> Self {
        match e {
            EngageCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EngageCliError::Compute(brut_engagement::ComputeError::MissingColumn(columns)) => {
                CliError {
                    code: "MISSING_COLUMN".to_string(),
                    message: format!("Missing required column(s): {columns}"),
                    hint: Some("Run 'engage schema' to see the expected columns".to_string()),
                }
            }
            EngageCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the input is a CSV engagement table".to_string()),
            },
            EngageCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check ENGAGE_* environment variables and .env".to_string()),
            },
            EngageCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EngageCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} rows failed validation"),
                hint: Some("Fix or remove the listed rows and retry".to_string()),
            },
            EngageCliError::OutputExists(path) => CliError {
                code: "OUTPUT_EXISTS".to_string(),
                message: format!("{} already exists", path.display()),
                hint: Some("Pass --force to overwrite".to_string()),
            },
        }
    }
}
