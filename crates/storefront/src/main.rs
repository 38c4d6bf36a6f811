//! Storefront - Entry point
//!
//! Runs the HTTP service, or scrapes a single listing with `--scrape`.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

use storefront::config::StorefrontConfig;
use storefront::telemetry::{init_logging, LogConfig};
use storefront::StartupError;

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
    /// Listing to scrape once instead of serving.
    scrape: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;
        let mut scrape = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = Some(PathBuf::from(require_value(&arg, args.next())));
                }
                "--scrape" => {
                    scrape = Some(require_value(&arg, args.next()));
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("storefront {}", storefront::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config, scrape }
    }
}

fn require_value(flag: &str, value: Option<String>) -> String {
    value.unwrap_or_else(|| {
        eprintln!("Missing value for {flag}");
        eprintln!("Use --help for usage information");
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r"Storefront - App listing scraper

USAGE:
    storefront [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
        --scrape <URL>     Scrape one listing, print its JSON and exit
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    STOREFRONT__SERVER__HTTP_ADDR            Bind address (default: 0.0.0.0:8080)
    STOREFRONT__SERVER__REQUEST_TIMEOUT_MS   Per-request timeout (default: 35000)
    STOREFRONT__SERVER__ERROR_STATUS         semantic | legacy (default: semantic)
    STOREFRONT__SERVER__INDEX_PAGE           HTML file served at /
    STOREFRONT__SCRAPER__REQUEST_TIMEOUT_MS  Upstream timeout (default: 30000)
    STOREFRONT__SCRAPER__USER_AGENT          Upstream User-Agent
    STOREFRONT__LOGGING__LEVEL               Log filter (default: info)
    STOREFRONT__LOGGING__FORMAT              json | pretty (default: json)

EXAMPLES:
    # Serve on port 9000
    STOREFRONT__SERVER__HTTP_ADDR=0.0.0.0:9000 storefront

    # Scrape once
    storefront --scrape https://instagram.en.aptoide.com/app
"
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match storefront::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not configured yet.
            let _ = init_logging(&LogConfig::default());
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = storefront::init_telemetry(&config) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = match args.scrape {
        Some(url) => scrape(&config, &url).await,
        None => serve(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "storefront failed");
            ExitCode::FAILURE
        }
    }
}

async fn scrape(config: &StorefrontConfig, url: &str) -> Result<(), StartupError> {
    let scraper = storefront::build_scraper(config)?;
    let json = storefront::scrape_once(&scraper, url).await?;
    println!("{json}");
    Ok(())
}

async fn serve(config: &StorefrontConfig) -> Result<(), StartupError> {
    let scraper = storefront::build_scraper(config)?;
    let server = storefront::build_server(config, scraper)?;

    info!(
        version = storefront::VERSION,
        addr = %config.server.http_addr,
        error_status = ?config.server.error_status,
        "starting storefront"
    );

    server.run().await?;
    Ok(())
}
