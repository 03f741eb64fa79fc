//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "geocoder.backend")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long, conflicts_with_all = ["key", "reset", "keys"])]
    pub path: bool,

    /// List the keys that can be read and set
    #[arg(long, conflicts_with_all = ["key", "reset"])]
    pub keys: bool,

    /// Reset config to defaults
    #[arg(long, conflicts_with = "key")]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    if args.path {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }

    if args.keys {
        for key in Config::available_keys() {
            println!("{}", key);
        }
        return Ok(());
    }

    if args.reset {
        Config::default().save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;

    let Some(key) = args.key else {
        show_all_config(&config);
        return Ok(());
    };

    match args.value {
        Some(value) => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} = {}", key, config.get(&key).unwrap_or(value));
        }
        None => match config.get(&key) {
            Some(value) => println!("{}", value),
            None => {
                return Err(Error::Config(format!(
                    "Unknown config key: {} (available: {})",
                    key,
                    Config::available_keys().join(", ")
                )));
            }
        },
    }

    Ok(())
}

/// Display all configuration values
fn show_all_config(config: &Config) {
    println!("[geocoder]");
    println!("backend = \"{}\"", config.geocoder.backend);
    println!("result_type = \"{}\"", config.geocoder.result_type);
    println!("timeout_secs = {}", config.geocoder.timeout_secs);
    println!("mapbox_url = \"{}\"", config.geocoder.mapbox_url);
    println!("nominatim_url = \"{}\"", config.geocoder.nominatim_url);
    println!();

    println!("[map]");
    println!("center_lat = {}", config.map.center_lat);
    println!("center_lng = {}", config.map.center_lng);
    println!("zoom = {}", config.map.zoom);
    println!("width = {}", config.map.width);
    println!("height = {}", config.map.height);
    println!("pin_height = {}", config.map.pin_height);
    println!();

    println!("[flow]");
    println!("stale_policy = \"{}\"", config.flow.stale_policy);
    println!("instructions = \"{}\"", config.flow.instructions);
    println!();

    println!("[api_keys]");
    if !config.api_keys.mapbox.is_empty() {
        println!("mapbox = \"***\" # configured");
    } else if config.mapbox_token().is_some() {
        println!("mapbox = \"\" # using MAPBOX_ACCESS_TOKEN");
    } else {
        println!("mapbox = \"\" # not configured");
    }
}
