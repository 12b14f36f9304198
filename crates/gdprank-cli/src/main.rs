use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gdprank::parser::parse_gdp_page;
use gdprank::scraper::WebScraper;
use gdprank::types::{DEFAULT_KEYWORDS, ExtractOptions, GdpMatch, GdpTable, RankPolicy};
use gdprank::utils::{RecordFilter, TableStats};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "gdprank")]
#[command(about = "Extracts country rankings by nominal GDP from an HTML table", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct ExtractArgs {
    #[arg(
        short = 'k',
        long = "keyword",
        help = "Caption keyword used to select the table (repeatable)"
    )]
    keywords: Vec<String>,

    #[arg(
        long = "rank",
        value_parser = parse_rank_policy,
        default_value = "ordinal",
        help = "Rank source: 'ordinal' (row position) or 'column' (table's Rank column)"
    )]
    rank_policy: RankPolicy,

    #[arg(
        long = "gdp-match",
        value_parser = parse_gdp_match,
        default_value = "strict",
        help = "GDP header match: 'strict' (needs 'million' or '$') or 'loose'"
    )]
    gdp_match: GdpMatch,

    #[arg(
        long,
        help = "Maximum number of rows to print",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    limit: Option<u16>,

    #[arg(
        long,
        help = "Number of rows to skip from the beginning",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    offset: Option<u16>,

    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text",
        help = "Output format"
    )]
    format: OutputFormat,

    #[arg(long, help = "Print row statistics after the text output")]
    stats: bool,
}

impl ExtractArgs {
    fn options(&self) -> ExtractOptions {
        let keywords = if self.keywords.is_empty() {
            DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
        } else {
            self.keywords.iter().map(|k| k.to_lowercase()).collect()
        };

        ExtractOptions {
            keywords,
            rank_policy: self.rank_policy,
            gdp_match: self.gdp_match,
        }
    }

    fn filter(&self) -> RecordFilter {
        RecordFilter {
            offset: self.offset.map(usize::from),
            limit: self.limit.map(usize::from),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page over HTTP and extract the GDP table
    Fetch {
        #[arg(default_value = gdprank::DEFAULT_URL, help = "URL of the page listing countries by GDP")]
        url: String,

        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Extract the GDP table from a saved HTML file
    Parse {
        #[arg(help = "Path to an HTML file")]
        path: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },
}

fn parse_rank_policy(s: &str) -> Result<RankPolicy, String> {
    RankPolicy::from_str(s).map_err(|e| e.to_string())
}

fn parse_gdp_match(s: &str) -> Result<GdpMatch, String> {
    GdpMatch::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn validated_filter(extract: &ExtractArgs) -> RecordFilter {
    extract.filter().validate().unwrap_or_else(|e| {
        log::error!("Invalid args: {e}");
        process::exit(1);
    })
}

fn print_table(mut table: GdpTable, filter: RecordFilter, extract: &ExtractArgs) {
    let stats = TableStats::from_records(&table.records);
    table.records = filter.apply(table.records);

    match extract.format {
        OutputFormat::Json => serialize_json(&table),
        OutputFormat::Text => {
            if table.records.is_empty() {
                println!("No rows to display.");
            } else {
                print!("{}", table);
            }
            if extract.stats {
                print!("{}", stats);
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Fetch { url, extract } => {
            let filter = validated_filter(&extract);

            let scraper = WebScraper::new().unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let table = scraper
                .fetch_gdp_table(&url, &extract.options())
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error extracting GDP table from {}: {}", url, e);
                    process::exit(1);
                });

            print_table(table, filter, &extract);
        }

        Commands::Parse { path, extract } => {
            let filter = validated_filter(&extract);

            log::info!("Reading {}...", path.display());

            let html = std::fs::read_to_string(&path).unwrap_or_else(|e| {
                log::error!("Error reading {}: {}", path.display(), e);
                process::exit(1);
            });

            let table = parse_gdp_page(&html, &extract.options()).unwrap_or_else(|e| {
                log::error!("Error extracting GDP table from {}: {}", path.display(), e);
                process::exit(1);
            });

            print_table(table, filter, &extract);
        }
    }
}
