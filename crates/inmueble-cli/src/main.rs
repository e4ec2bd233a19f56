use std::fs;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use inmueble::format::listing_body;
use inmueble::types::{PropertyRecord, ScrapeOutcome};
use inmueble::{FetchConfig, WebScraper, parse_property_html};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "inmueble")]
#[command(about = "A real-estate listing scraper", long_about = None)]
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
    /// Marketplace-ready listing body
    Listing,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch listing pages and extract a property record from each
    Scrape {
        #[arg(required = true, help = "URLs of the listing pages to scrape")]
        urls: Vec<String>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(
            long,
            help = "Maximum number of pages fetched at the same time",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        concurrency: Option<u16>,

        #[arg(
            long,
            value_name = "SECS",
            help = "Per-request timeout in seconds",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        timeout: Option<u64>,

        #[arg(long, help = "Year used to convert a building's age into its construction year")]
        reference_year: Option<i32>,

        #[arg(long, help = "Include failed URLs as {url, error} objects in JSON output")]
        include_failures: bool,
    },
    /// Extract a property record from a saved HTML page
    Parse {
        #[arg(help = "Path to the saved listing page")]
        file: String,

        #[arg(long, help = "URL the page was saved from")]
        url: String,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(long, help = "Year used to convert a building's age into its construction year")]
        reference_year: Option<i32>,
    },
}

fn validate_urls(urls: &[String]) -> Result<(), String> {
    match urls
        .iter()
        .find(|url| !(url.starts_with("http://") || url.starts_with("https://")))
    {
        Some(url) => Err(format!("Not an http(s) URL: {url}")),
        None => Ok(()),
    }
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

fn print_records(records: &[PropertyRecord], format: &OutputFormat) {
    match format {
        OutputFormat::Json => serialize_json(&records),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No listings to display.");
            }
            for record in records {
                println!("{}", record);
            }
        }
        OutputFormat::Listing => {
            let bodies: Vec<String> = records.iter().map(listing_body).collect();
            println!("{}", bodies.join("\n\n────────────────────────────────\n\n"));
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Scrape {
            urls,
            format,
            concurrency,
            timeout,
            reference_year,
            include_failures,
        } => {
            validate_urls(&urls).unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });

            let mut config = FetchConfig::default();
            if let Some(limit) = concurrency {
                config = config.with_concurrency_limit(limit.into());
            }
            if let Some(secs) = timeout {
                config = config.with_timeout(Duration::from_secs(secs));
            }
            if let Some(year) = reference_year {
                config = config.with_reference_year(year);
            }

            let scraper = WebScraper::with_config(config).unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let outcomes = scraper.scrape_all(&urls).await;
            for outcome in &outcomes {
                if let ScrapeOutcome::Failure { url, error } = outcome {
                    log::error!("Error scraping {}: {}", url, error);
                }
            }

            if include_failures && matches!(format, OutputFormat::Json) {
                serialize_json(&outcomes);
            } else {
                if include_failures {
                    log::warn!("Failures are only included in JSON output");
                }
                let records: Vec<PropertyRecord> = outcomes
                    .into_iter()
                    .filter_map(ScrapeOutcome::into_record)
                    .collect();
                print_records(&records, &format);
            }
        }

        Commands::Parse {
            file,
            url,
            format,
            reference_year,
        } => {
            let config = FetchConfig::default();
            let config = match reference_year {
                Some(year) => config.with_reference_year(year),
                None => config,
            }
            .validate()
            .unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });

            log::info!("Parsing {} as {}...", file, url);
            let html = fs::read_to_string(&file).unwrap_or_else(|e| {
                log::error!("Error reading {}: {}", file, e);
                process::exit(1);
            });

            let record = parse_property_html(&html, &url, config.reference_year);
            print_records(&[record], &format);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_urls() {
        let urls = vec![
            "https://century21mexico.com/propiedad/1".to_string(),
            "http://example.com/2".to_string(),
        ];
        assert!(validate_urls(&urls).is_ok());

        let urls = vec!["ftp://example.com/1".to_string()];
        assert_eq!(
            validate_urls(&urls),
            Err("Not an http(s) URL: ftp://example.com/1".to_string())
        );
    }

    #[test]
    fn test_cli_parses_scrape_arguments() {
        let cli = Cli::try_parse_from([
            "inmueble",
            "-l",
            "debug",
            "scrape",
            "https://example.com/1",
            "https://example.com/2",
            "-o",
            "json",
            "--concurrency",
            "4",
        ])
        .unwrap();

        let Commands::Scrape {
            urls, concurrency, ..
        } = cli.command
        else {
            panic!("Expected scrape command");
        };
        assert_eq!(urls.len(), 2);
        assert_eq!(concurrency, Some(4));
    }

    #[test]
    fn test_cli_rejects_zero_concurrency() {
        let result = Cli::try_parse_from([
            "inmueble",
            "scrape",
            "https://example.com/1",
            "--concurrency",
            "0",
        ]);
        assert!(result.is_err());
    }
}
