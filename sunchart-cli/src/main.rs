//! Sunchart CLI — chart daily sunrise or sunset times for a place.
//!
//! Commands:
//! - `chart` — fetch one day at a time over a date range and plot local times
//! - `zones` — list the time zone identifiers accepted by `--tz`
//! - `config` — print the default configuration as TOML

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use sunchart_core::chart::{ChartRenderer, CsvChart, TextChart};
use sunchart_core::dates::DateRange;
use sunchart_core::geocode::{Geocoder, NominatimGeocoder};
use sunchart_core::pipeline::{Pipeline, PipelineOptions, PipelineOutput, RunParams};
use sunchart_core::timezone::{zone_names, TimeZoneConverter};
use sunchart_core::{Coordinates, FailurePolicy, SolarEvent, SunchartConfig, SunriseSunsetClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sunchart",
    about = "Sunchart — daily sunrise/sunset times over a date range"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and chart sunrise (or sunset) times.
    Chart(ChartArgs),
    /// List accepted time zone identifiers.
    Zones {
        /// Only show zones containing this text (case-insensitive).
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print the default configuration as TOML.
    Config,
}

#[derive(Args)]
struct ChartArgs {
    /// Start date (MM-DD-YYYY or MM/DD/YYYY).
    #[arg(long)]
    start: String,

    /// End date (MM-DD-YYYY or MM/DD/YYYY).
    #[arg(long)]
    end: String,

    /// Address to geocode, e.g. "Porto Alegre, Brazil".
    #[arg(long, required_unless_present = "lat", conflicts_with_all = ["lat", "lng"])]
    address: Option<String>,

    /// Latitude in decimal degrees (use with --lng instead of --address).
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude in decimal degrees.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,

    /// IANA time zone for the chart.
    #[arg(long = "tz", default_value = "America/Sao_Paulo")]
    zone: String,

    /// Which event to chart: sunrise or sunset. Defaults to the config value.
    #[arg(long)]
    event: Option<SolarEvent>,

    /// Maximum concurrent requests. Defaults to the config value.
    #[arg(long)]
    workers: Option<usize>,

    /// Failure policy: strict (any failed day aborts) or partial.
    #[arg(long)]
    policy: Option<FailurePolicy>,

    /// Also write rows as CSV to this path.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Plot width in columns (clamped to 4..=400).
    #[arg(long, default_value_t = 48)]
    width: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Chart(args) => {
            if let Err(err) = run_chart(args) {
                eprintln!("{}", friendly_error(&err));
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Zones { filter } => run_zones(filter.as_deref()),
        Commands::Config => {
            print!("{}", SunchartConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn friendly_error(err: &anyhow::Error) -> String {
    format!("Ops... it seems like you are typing something wrong ☹\n{err:#}\nLet's try one more time 😊")
}

fn load_config(args: &ChartArgs) -> Result<SunchartConfig> {
    let mut config = match &args.config {
        Some(path) => SunchartConfig::from_file(path)?,
        None => SunchartConfig::default(),
    };
    if let Some(event) = args.event {
        config.output.event = event;
    }
    if let Some(workers) = args.workers {
        config.pool.workers = workers;
    }
    if let Some(policy) = args.policy {
        config.pool.failure_policy = policy;
    }
    config.validate()?;
    Ok(config)
}

fn run_chart(args: ChartArgs) -> Result<()> {
    let config = load_config(&args)?;

    // Dates and zone are checked before anything touches the network.
    let range = DateRange::parse(&args.start, &args.end)?;
    let zone = TimeZoneConverter::new(&args.zone)?;

    let coordinates = match (&args.address, args.lat, args.lng) {
        (Some(address), _, _) => {
            let geocoder = NominatimGeocoder::new(&config.geocoder)?;
            geocoder.geocode(address)?
        }
        (None, Some(lat), Some(lng)) => Coordinates::new(lat, lng)?,
        _ => anyhow::bail!("either --address or both --lat and --lng are required"),
    };

    let params = RunParams {
        range,
        coordinates,
        zone,
    };
    info!(
        start = %range.start(),
        end = %range.end(),
        days = range.len(),
        %coordinates,
        zone = zone.name(),
        "starting download"
    );

    let fetcher = SunriseSunsetClient::from_config(&config.provider);
    let pipeline = Arc::new(Pipeline::new(fetcher, PipelineOptions::from_config(&config))?);
    let output = wait_for(pipeline.spawn(params)?, &config)?;

    for failure in &output.failures {
        warn!(date = %failure.date, error = %failure.cause, "day missing from chart");
    }

    let title = match config.output.event {
        SolarEvent::Sunrise => format!("Sunrise times ({})", zone.name()),
        SolarEvent::Sunset => format!("Sunset times ({})", zone.name()),
    };
    let stdout = std::io::stdout();
    let mut chart = TextChart::new(stdout.lock())
        .with_title(title)
        .with_width(args.width);
    chart.render(&output.rows)?;

    if let Some(path) = &args.csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        CsvChart::new(BufWriter::new(file)).render(&output.rows)?;
        println!("CSV saved to: {}", path.display());
    }

    if !output.is_complete() {
        println!(
            "WARNING: {} day(s) could not be downloaded and are missing from the chart",
            output.failures.len()
        );
    }
    Ok(())
}

/// Wait for the background run, reporting progress on every poll interval.
fn wait_for(
    mut handle: sunchart_core::PipelineHandle,
    config: &SunchartConfig,
) -> Result<PipelineOutput> {
    let started = Instant::now();
    loop {
        if let Some(result) = handle.wait_timeout(config.output.poll_interval()) {
            return Ok(result?);
        }
        info!(elapsed_secs = started.elapsed().as_secs(), "still downloading");
    }
}

fn run_zones(filter: Option<&str>) -> Result<()> {
    let needle = filter.map(|f| f.to_ascii_lowercase());
    let mut count = 0usize;
    for name in zone_names() {
        if let Some(needle) = &needle {
            if !name.to_ascii_lowercase().contains(needle.as_str()) {
                continue;
            }
        }
        println!("{name}");
        count += 1;
    }
    if count == 0 {
        println!("No zones match.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_coordinates_with_negative_values() {
        let cli = Cli::try_parse_from([
            "sunchart", "chart", "--start", "01-01-2020", "--end", "01-31-2020",
            "--lat", "-30.03", "--lng", "-51.23", "--tz", "UTC", "--policy", "partial",
        ])
        .unwrap();
        let Commands::Chart(args) = cli.command else {
            panic!("expected chart command");
        };
        assert_eq!(args.lat, Some(-30.03));
        assert_eq!(args.lng, Some(-51.23));
        assert_eq!(args.policy, Some(FailurePolicy::Partial));
        assert!(args.address.is_none());
    }

    #[test]
    fn address_and_coordinates_conflict() {
        let result = Cli::try_parse_from([
            "sunchart", "chart", "--start", "01-01-2020", "--end", "01-31-2020",
            "--address", "Porto Alegre", "--lat", "1", "--lng", "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn location_is_required() {
        let result = Cli::try_parse_from([
            "sunchart", "chart", "--start", "01-01-2020", "--end", "01-31-2020",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "sunchart", "chart", "--start", "01-01-2020", "--end", "01-02-2020",
            "--address", "Berlin", "--workers", "2", "--event", "sunset",
        ])
        .unwrap();
        let Commands::Chart(args) = cli.command else {
            panic!("expected chart command");
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.pool.workers, 2);
        assert_eq!(config.output.event, SolarEvent::Sunset);
    }

    #[test]
    fn zero_workers_rejected_by_validation() {
        let cli = Cli::try_parse_from([
            "sunchart", "chart", "--start", "01-01-2020", "--end", "01-02-2020",
            "--address", "Berlin", "--workers", "0",
        ])
        .unwrap();
        let Commands::Chart(args) = cli.command else {
            panic!("expected chart command");
        };
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn bad_date_fails_before_geocoding() {
        let cli = Cli::try_parse_from([
            "sunchart", "chart", "--start", "13-40-2020", "--end", "01-02-2020",
            "--address", "Berlin",
        ])
        .unwrap();
        let Commands::Chart(args) = cli.command else {
            panic!("expected chart command");
        };
        let err = run_chart(args).unwrap_err();
        assert!(friendly_error(&err).contains("wrong start date format"));
    }
}
