//! Lookup command handler
//!
//! Geocodes one tap and prints every label update until the request ends.

use crate::cli::{init_logging, parse_format, pin_coordinate, tap_coordinate, GeocoderArgs};
use crate::config::Config;
use crate::coord::Coordinate;
use crate::display::{DisplayState, WriterLabel};
use crate::error::Result;
use crate::flow::GeocodeFlow;
use crate::geo::get_backend;
use clap::Args;

/// Lookup command arguments
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Latitude of the tap
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the tap
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Screen x of the tap in the configured viewport
    #[arg(long, requires = "y", conflicts_with_all = ["lat", "lng", "pin"])]
    pub x: Option<f64>,

    /// Screen y of the tap in the configured viewport
    #[arg(long, requires = "x", conflicts_with_all = ["lat", "lng", "pin"])]
    pub y: Option<f64>,

    /// Use the point under the drop pin (default when no tap is given)
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub pin: bool,

    #[command(flatten)]
    pub geocoder: GeocoderArgs,
}

impl LookupArgs {
    /// Coordinate this lookup is about
    fn target(&self, config: &Config) -> Result<Coordinate> {
        match (self.lat, self.lng, self.x, self.y) {
            (Some(lat), Some(lng), _, _) => Coordinate::checked(lat, lng),
            (_, _, Some(x), Some(y)) => tap_coordinate(config, x, y),
            _ => pin_coordinate(config),
        }
    }
}

/// Run the lookup command
pub async fn run(args: LookupArgs) -> Result<()> {
    init_logging();

    let mut config = Config::load()?;
    args.geocoder.apply(&mut config)?;

    let format = parse_format(&args.geocoder.format)?;
    let coordinate = args.target(&config)?;
    let backend = get_backend(&config)?;

    let label = WriterLabel::new(std::io::stdout(), format);
    let mut flow = GeocodeFlow::new(backend, label, format!("Tapped {}", coordinate))
        .with_result_type(config.result_type()?);

    flow.submit(coordinate)?;
    flow.settle().await;

    if matches!(flow.state(), DisplayState::Error(_)) {
        std::process::exit(1);
    }

    Ok(())
}
