//! Display state and the label it is rendered on
//!
//! Exactly one `DisplayState` is shown at a time. The state lives in
//! `Display`, which is owned by the UI side of the request flow; a `Label`
//! is whatever the host renders text on.

pub mod label;

use crate::constants::messages::{ERROR_PREFIX, IN_PROGRESS};
use crate::flow::RequestId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub use label::{Label, LabelFormat, MemoryLabel, WriterLabel};

/// What the label currently says
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum DisplayState {
    /// Informational message (instructions, "No results.", ...)
    Idle(String),
    /// A request is in flight
    InProgress,
    /// Place name of the first candidate
    Success(String),
    /// Failure reason, shown with an "Error: " prefix
    Error(String),
}

impl DisplayState {
    /// Single-line label text for this state
    pub fn text(&self) -> String {
        match self {
            Self::Idle(message) => message.clone(),
            Self::InProgress => IN_PROGRESS.to_string(),
            Self::Success(place_name) => place_name.clone(),
            Self::Error(message) => format!("{}{}", ERROR_PREFIX, message),
        }
    }
}

/// One state transition as delivered to a label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelUpdate {
    #[serde(flatten)]
    pub state: DisplayState,

    /// Request that caused the transition, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestId>,

    pub text: String,

    pub at: DateTime<Utc>,
}

impl LabelUpdate {
    pub fn new(state: DisplayState, request: Option<RequestId>) -> Self {
        let text = state.text();
        Self {
            state,
            request,
            text,
            at: Utc::now(),
        }
    }
}

/// Owns the current state and pushes every transition to the label
#[derive(Debug)]
pub struct Display<L: Label> {
    state: DisplayState,
    label: L,
}

impl<L: Label> Display<L> {
    /// Create a display showing `initial` and render it right away
    pub fn new(label: L, initial: DisplayState) -> Self {
        let mut display = Self {
            state: initial.clone(),
            label,
        };
        display.set(initial, None);
        display
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn text(&self) -> String {
        self.state.text()
    }

    pub fn label(&self) -> &L {
        &self.label
    }

    /// Overwrite the state and render it
    pub fn set(&mut self, state: DisplayState, request: Option<RequestId>) {
        match &state {
            DisplayState::Idle(message) => debug!("Message: {}", message),
            DisplayState::InProgress => debug!("Message: {}", IN_PROGRESS),
            DisplayState::Success(place_name) => debug!("Place name: {}", place_name),
            DisplayState::Error(message) => error!("Error: {}", message),
        }

        let update = LabelUpdate::new(state, request);
        self.label.show(&update);
        self.state = update.state;
    }
}
