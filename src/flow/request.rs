//! Request bookkeeping for the geocode flow
//!
//! Identifiers, the handle of a running lookup, and what a lookup sends
//! back over the result channel.

use crate::constants::messages::{LOOKUP_LOST, NO_RESULTS};
use crate::coord::Coordinate;
use crate::display::DisplayState;
use crate::error::{Error, Result};
use crate::geo::PlaceFeature;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Monotonic id of a submitted request; later submissions get larger ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a lookup ended
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// First candidate of a non-empty result
    Found(PlaceFeature),
    /// The service answered with no candidates
    Empty,
    /// Transport or service failure, as human readable text
    Failed(String),
}

impl GeocodeOutcome {
    /// Collapse a backend result: first candidate wins
    pub fn from_result(result: Result<Vec<PlaceFeature>>) -> Self {
        match result {
            Ok(features) => match features.into_iter().next() {
                Some(first) => Self::Found(first),
                None => Self::Empty,
            },
            Err(err) => Self::Failed(failure_reason(&err)),
        }
    }

    /// State the label should show for this outcome
    pub fn display_state(&self) -> DisplayState {
        match self {
            Self::Found(feature) => DisplayState::Success(feature.place_name.clone()),
            Self::Empty => DisplayState::Idle(NO_RESULTS.to_string()),
            Self::Failed(reason) => DisplayState::Error(reason.clone()),
        }
    }
}

/// Geocoding errors already carry a readable message; the rest keep their
/// category prefix.
fn failure_reason(err: &Error) -> String {
    match err {
        Error::Geocoding(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Sent by a background lookup when it finishes
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub request: RequestId,
    pub coordinate: Coordinate,
    pub outcome: GeocodeOutcome,
}

/// Sending half given to a background lookup
///
/// Exactly one completion is sent per request. If the lookup never reports
/// (it panicked or was aborted), dropping the sender reports a failure so
/// the request still ends.
#[derive(Debug)]
pub(crate) struct CompletionSender {
    tx: mpsc::UnboundedSender<Completion>,
    request: RequestId,
    coordinate: Coordinate,
    sent: bool,
}

impl CompletionSender {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Completion>,
        request: RequestId,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            tx,
            request,
            coordinate,
            sent: false,
        }
    }

    pub(crate) fn send(mut self, outcome: GeocodeOutcome) {
        self.deliver(outcome);
    }

    fn deliver(&mut self, outcome: GeocodeOutcome) {
        if self.sent {
            return;
        }
        self.sent = true;
        // Only fails once the flow is gone
        let _ = self.tx.send(Completion {
            request: self.request,
            coordinate: self.coordinate,
            outcome,
        });
    }
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        self.deliver(GeocodeOutcome::Failed(LOOKUP_LOST.to_string()));
    }
}

/// A running lookup, owned by the flow
#[derive(Debug)]
pub struct RequestHandle {
    id: RequestId,
    coordinate: Coordinate,
    task: JoinHandle<()>,
}

impl RequestHandle {
    pub(crate) fn new(id: RequestId, coordinate: Coordinate, task: JoinHandle<()>) -> Self {
        Self {
            id,
            coordinate,
            task,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Stop the lookup; a completion it already sent is still in the channel
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// What to do with a response whose tap has been superseded by a newer one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Abort older lookups and drop their responses; the newest tap decides
    #[default]
    Discard,
    /// Let every lookup finish and show each response; the last to complete decides
    Apply,
}

impl fmt::Display for StalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discard => write!(f, "discard"),
            Self::Apply => write!(f, "apply"),
        }
    }
}

impl FromStr for StalePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "apply" => Ok(Self::Apply),
            _ => Err(format!("Unknown stale policy: {}", s)),
        }
    }
}
