//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod lookup;
pub mod watch;

use crate::config::Config;
use crate::coord::projection::ScreenPoint;
use crate::coord::Coordinate;
use crate::error::{Error, Result};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Tap a map, get a place name
#[derive(Parser)]
#[command(name = "geotap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Geocode a single tap and print each label update
    Lookup(lookup::LookupArgs),

    /// Read taps from stdin and keep the label up to date
    Watch(watch::WatchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

/// Options shared by the commands that talk to a geocoder
#[derive(Args, Debug, Default)]
pub struct GeocoderArgs {
    /// Geocoding backend (mapbox or nominatim)
    #[arg(long, short = 'b')]
    pub backend: Option<String>,

    /// Result type filter (poi, address, place, ...)
    #[arg(long, short = 't')]
    pub r#type: Option<String>,

    /// Label output format: text or json
    #[arg(long, short = 'f', default_value = "text")]
    pub format: String,
}

impl GeocoderArgs {
    /// Apply command line overrides to a loaded config
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(backend) = &self.backend {
            config.set("geocoder.backend", backend)?;
        }
        if let Some(result_type) = &self.r#type {
            config.set("geocoder.result_type", result_type)?;
        }
        Ok(())
    }
}

/// Initialize logging on stderr so stdout only carries label output
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Coordinate under a screen tap in the configured viewport
pub fn tap_coordinate(config: &Config, x: f64, y: f64) -> Result<Coordinate> {
    let projection = config.projection()?;
    let point = ScreenPoint::new(x, y);
    if !projection.contains(point) {
        warn!(x, y, "Tap lies outside the {}x{} viewport", projection.width(), projection.height());
    }
    let coordinate = projection.from_screen_location(point);
    coordinate.validate()?;
    Ok(coordinate)
}

/// Coordinate under the drop pin of the configured viewport
pub fn pin_coordinate(config: &Config) -> Result<Coordinate> {
    let projection = config.projection()?;
    Ok(projection.pin_coordinate(f64::from(config.map.pin_height)))
}

/// Parse the label format option
pub fn parse_format(format: &str) -> Result<crate::display::LabelFormat> {
    format.parse().map_err(Error::Config)
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Lookup(args) => lookup::run(args).await,
        Commands::Watch(args) => watch::run(args).await,
        Commands::Config(args) => config::run(args),
    }
}
