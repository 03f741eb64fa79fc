//! Watch command handler
//!
//! Reads taps from stdin, one per line, and prints the label as it
//! changes. This task owns the flow; lookups run in the background and
//! their results are applied here.
//!
//! Input lines:
//! - `lat,lng` - tap at a coordinate
//! - `tap X Y` - tap at a screen point of the configured viewport
//! - `pin` - tap under the drop pin
//! - `cancel` - abort the running lookup
//! - `quit` - stop reading (pending lookups still finish)

use crate::cli::{init_logging, parse_format, pin_coordinate, tap_coordinate, GeocoderArgs};
use crate::config::Config;
use crate::coord::Coordinate;
use crate::display::{Label, WriterLabel};
use crate::error::{Error, Result};
use crate::flow::{GeocodeFlow, StalePolicy};
use crate::geo::{get_backend, GeoBackend};
use clap::Args;
use std::io::ErrorKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Watch command arguments
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Handling of responses to superseded taps: discard or apply
    #[arg(long)]
    pub stale_policy: Option<String>,

    #[command(flatten)]
    pub geocoder: GeocoderArgs,
}

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum WatchCommand {
    At(Coordinate),
    Tap { x: f64, y: f64 },
    Pin,
    Cancel,
    Quit,
}

impl WatchCommand {
    /// Parse an input line; blank lines and `#` comments yield None
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let command = match words.next().map(str::to_lowercase).as_deref() {
            Some("pin") => Self::Pin,
            Some("cancel") => Self::Cancel,
            Some("quit") | Some("exit") => Self::Quit,
            Some("tap") => {
                let mut number = |name: &str| -> Result<f64> {
                    let word = words.next().ok_or_else(|| {
                        Error::InvalidCoordinates(format!("tap: missing {}", name))
                    })?;
                    word.parse().map_err(|_| {
                        Error::InvalidCoordinates(format!("tap: invalid {}: {}", name, word))
                    })
                };
                let x = number("x")?;
                let y = number("y")?;
                Self::Tap { x, y }
            }
            _ => Self::At(line.parse()?),
        };

        Ok(Some(command))
    }
}

/// Run the watch command
pub async fn run(args: WatchArgs) -> Result<()> {
    init_logging();

    let mut config = Config::load()?;
    args.geocoder.apply(&mut config)?;
    if let Some(policy) = &args.stale_policy {
        config.set("flow.stale_policy", policy)?;
    }

    let format = parse_format(&args.geocoder.format)?;
    let policy: StalePolicy = config.stale_policy()?;
    let backend = get_backend(&config)?;

    info!(backend = %config.geocoder.backend, %policy, "Watching stdin for taps");

    let label = WriterLabel::new(std::io::stdout(), format);
    let mut flow = GeocodeFlow::new(backend, label, config.flow.instructions.clone())
        .with_result_type(config.result_type()?)
        .with_stale_policy(policy);

    drive(BufReader::new(tokio::io::stdin()), &mut flow, &config).await
}

/// Feed taps from `input` into the flow until EOF or `quit`
///
/// Completions are applied between lines as they arrive; pending lookups
/// are settled before returning. Unparseable lines are logged and skipped.
pub async fn drive<R, B, L>(input: R, flow: &mut GeocodeFlow<B, L>, config: &Config) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    B: GeoBackend + 'static,
    L: Label,
{
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        warn!("Ignoring input: {}", e);
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                let command = match WatchCommand::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("Ignoring input: {}", e);
                        continue;
                    }
                };

                let coordinate = match command {
                    WatchCommand::Quit => break,
                    WatchCommand::Cancel => {
                        flow.cancel();
                        continue;
                    }
                    WatchCommand::At(coordinate) => Ok(coordinate),
                    WatchCommand::Tap { x, y } => tap_coordinate(config, x, y),
                    WatchCommand::Pin => pin_coordinate(config),
                };

                if let Err(e) = coordinate.and_then(|coordinate| flow.submit(coordinate)) {
                    warn!("Ignoring tap: {}", e);
                }
            }
            Some(_) = flow.next_completion(), if !flow.is_idle() => {}
        }
    }

    flow.settle().await;
    Ok(())
}
