//! geotap: tap a map, get a place name
//!
//! A library and CLI tool that turns a map tap into a human readable place
//! name through a single-flight reverse geocoding request, keeping one text
//! label in sync while doing so.
//!
//! ## Features
//!
//! - Web-Mercator viewport projection (screen tap or drop pin to coordinate)
//! - Mapbox and Nominatim reverse geocoding backends
//! - Request flow with an explicit, cancellable handle per tap and a
//!   configurable policy for responses that arrive after a newer tap
//! - CLI for one-shot lookups and interactive tap streams
//!
//! ## Quick Start
//!
//! ```no_run
//! use geotap::coord::Coordinate;
//! use geotap::display::MemoryLabel;
//! use geotap::flow::GeocodeFlow;
//! use geotap::geo::nominatim::NominatimBackend;
//! use std::time::Duration;
//!
//! # async fn example() -> geotap::Result<()> {
//! let backend = NominatimBackend::new("https://nominatim.openstreetmap.org", Duration::from_secs(10))?;
//! let mut flow = GeocodeFlow::new(backend, MemoryLabel::default(), "Tap the map");
//!
//! flow.submit(Coordinate::new(38.907298, -77.043478))?;
//! assert_eq!(flow.text(), "Geocoding...");
//!
//! flow.settle().await;
//! println!("{}", flow.text());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod display;
pub mod error;
pub mod flow;
pub mod geo;

// Re-export commonly used types
pub use config::Config;
pub use coord::Coordinate;
pub use display::{DisplayState, Label};
pub use error::{Error, Result};
pub use flow::{GeocodeFlow, StalePolicy};
