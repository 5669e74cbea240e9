//! Command-line front end for the environmental flare-risk pipeline.

use chrono::Local;
use clap::{Parser, Subcommand};
use flare_risk::{
    analyze_environmental_risk, flare_index, EnvironmentalDataFetcher, FlareConfig,
    SignalAssessment,
};
use log::info;
use serde::Serialize;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "flare-risk")]
#[command(about = "Estimate environmental flare risk from local weather")]
struct Args {
    /// Latitude in degrees (overrides FLARE_LATITUDE)
    #[arg(long, global = true, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude in degrees (overrides FLARE_LONGITUDE)
    #[arg(long, global = true, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// OpenWeatherMap API key (overrides OPENWEATHER_API_KEY)
    #[arg(long, global = true)]
    openweather_key: Option<String>,

    /// KMA service key (overrides KMA_SERVICE_KEY)
    #[arg(long, global = true)]
    kma_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one day's environmental reading
    Fetch {
        /// Date as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Analyze environmental risk over recent days
    Analyze {
        /// Number of days ending today (at most 31)
        #[arg(long, default_value = "3")]
        days: u32,
    },
    /// Compute the composite flare index
    Index {
        /// Symptom risk score (0-100)
        #[arg(long)]
        symptom: f64,

        /// Lifestyle risk score (0-100)
        #[arg(long)]
        lifestyle: f64,

        /// Number of days of environmental data ending today (at most 31)
        #[arg(long, default_value = "3")]
        days: u32,
    },
}

fn load_config(args: &Args) -> Result<FlareConfig, Box<dyn std::error::Error>> {
    let mut config = FlareConfig::from_env()?;
    if let Some(lat) = args.lat {
        config.latitude = lat;
    }
    if let Some(lon) = args.lon {
        config.longitude = lon;
    }
    if let Some(ref key) = args.openweather_key {
        config.openweather_api_key = Some(key.clone());
    }
    if let Some(ref key) = args.kma_key {
        config.kma_service_key = Some(key.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if config.is_synthetic_only() {
        info!("No weather credentials configured, running on synthetic data");
    }

    let fetcher = EnvironmentalDataFetcher::from_config(&config);
    let now = Local::now().naive_local();

    match args.command {
        Command::Fetch { date } => {
            let date = date.unwrap_or_else(|| now.date().format("%Y-%m-%d").to_string());
            let reading = fetcher.fetch_at(&date, now).await;
            print_json(&reading)?;
        }
        Command::Analyze { days } => {
            let readings = fetcher.fetch_recent(days, now).await;
            print_json(&analyze_environmental_risk(&readings))?;
        }
        Command::Index {
            symptom,
            lifestyle,
            days,
        } => {
            let readings = fetcher.fetch_recent(days, now).await;
            let environment = analyze_environmental_risk(&readings);
            let index = flare_index::aggregate(
                &SignalAssessment::from_score(symptom),
                &SignalAssessment::from(&environment),
                &SignalAssessment::from_score(lifestyle),
            );
            print_json(&index)?;
        }
    }

    Ok(())
}
