//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `page_carbon` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::Semaphore;

use page_carbon::cache::ResultCache;
use page_carbon::config::{DB_PATH, DEFAULT_MAX_CONCURRENCY, DEFAULT_QUERY_PORT, RESULT_CACHE_TTL};
use page_carbon::estimator::{GridIntensityOptions, SegmentIntensity};
use page_carbon::hosting::GreenHostingResolver;
use page_carbon::initialization::{init_client, init_logger_with};
use page_carbon::recorder::ResourceRecorder;
use page_carbon::server::{start_query_server, QueryState};
use page_carbon::{
    estimate_page, run_schedule, Config, EstimationOptions, LogFormat, LogLevel, ModelParams,
    RunMode,
};

#[derive(Parser)]
#[command(name = "page_carbon", version, about = "Estimates the CO2 emissions of loading web pages")]
struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    log_format: LogFormat,

    /// SQLite database path
    #[arg(long, default_value = DB_PATH)]
    db_path: PathBuf,

    /// Browser binary used for page instrumentation
    #[arg(long)]
    browser_path: Option<PathBuf>,

    /// Maximum concurrent browser sessions
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Measure a single URL and print the report as JSON
    Measure {
        /// The page to measure
        url: String,

        /// Fraction of bytes a returning visitor loads from cache, in [0, 1]
        #[arg(long)]
        data_cache_ratio: Option<f64>,

        /// Fraction of visits that are return visits, in [0, 1]
        #[arg(long)]
        return_visitor_ratio: Option<f64>,

        /// Explicit hosting factor in [0, 1]; skips the registry lookup
        #[arg(long)]
        green_hosting_factor: Option<f64>,

        /// ISO Alpha-3 country override for the device segment
        #[arg(long)]
        device_country: Option<String>,

        /// ISO Alpha-3 country override for the data-center segment
        #[arg(long)]
        data_center_country: Option<String>,

        /// ISO Alpha-3 country override for the network segment
        #[arg(long)]
        network_country: Option<String>,
    },

    /// Run the batch scheduler: cadence-gated, or manual with --project/--user
    Schedule {
        /// Project id for a manual run (requires --user)
        #[arg(long, requires = "user")]
        project: Option<i64>,

        /// User id for a manual run (requires --project)
        #[arg(long, requires = "project")]
        user: Option<String>,
    },

    /// Serve the HTTP query endpoint
    Serve {
        /// Port to listen on (127.0.0.1)
        #[arg(long, default_value_t = DEFAULT_QUERY_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    let config = Config {
        db_path: cli.db_path.clone(),
        log_level: cli.log_level.clone(),
        log_format: cli.log_format.clone(),
        browser_path: cli.browser_path.clone(),
        max_concurrency: cli.max_concurrency,
    };

    match cli.command {
        Command::Measure {
            url,
            data_cache_ratio,
            return_visitor_ratio,
            green_hosting_factor,
            device_country,
            data_center_country,
            network_country,
        } => {
            let options = EstimationOptions {
                data_cache_ratio,
                return_visitor_ratio,
                green_hosting_factor,
                grid_intensity: GridIntensityOptions {
                    device: device_country.map(SegmentIntensity::Country),
                    data_center: data_center_country.map(SegmentIntensity::Country),
                    network: network_country.map(SegmentIntensity::Country),
                },
            };

            let recorder = ResourceRecorder::new(&config);
            let resolver =
                GreenHostingResolver::new(init_client().context("Failed to initialize HTTP client")?);
            let model = ModelParams::swd_v4();

            match estimate_page(&recorder, &resolver, &model, None, &url, &options).await {
                Ok(report) => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report)
                            .context("Failed to serialize report")?
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("page_carbon error: {:#}", e);
                    process::exit(1);
                }
            }
        }

        Command::Schedule { project, user } => {
            let mode = match (project, user) {
                (Some(project_id), Some(user_id)) => RunMode::Manual {
                    project_id,
                    user_id,
                },
                _ => RunMode::Scheduled,
            };

            match run_schedule(&config, mode).await {
                Ok(summary) => {
                    println!(
                        "Reported {} URL{} ({} skipped) across {} batch{} in {:.1}s",
                        summary.reported,
                        if summary.reported == 1 { "" } else { "s" },
                        summary.skipped,
                        summary.batches,
                        if summary.batches == 1 { "" } else { "es" },
                        summary.elapsed_seconds
                    );
                    println!("Results saved in {}", config.db_path.display());
                    Ok(())
                }
                Err(e) => {
                    eprintln!("page_carbon error: {:#}", e);
                    process::exit(1);
                }
            }
        }

        Command::Serve { port } => {
            let client = init_client().context("Failed to initialize HTTP client")?;
            let state = QueryState {
                recorder: Arc::new(ResourceRecorder::new(&config)),
                resolver: Arc::new(GreenHostingResolver::new(client)),
                model: Arc::new(ModelParams::swd_v4()),
                cache: Arc::new(ResultCache::with_system_clock(RESULT_CACHE_TTL)),
                sessions: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            };

            if let Err(e) = start_query_server(port, state).await {
                eprintln!("page_carbon error: {:#}", e);
                process::exit(1);
            }
            Ok(())
        }
    }
}
