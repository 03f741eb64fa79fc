//! Geocode request flow
//!
//! Turns a tap coordinate into a label update:
//!
//! 1. `submit` shows "Geocoding..." right away and moves the marker;
//! 2. a background task asks the geocoder and sends a `Completion` back;
//! 3. the owner of the flow receives completions (`next_completion`,
//!    `poll_completions`, `settle`) and applies the final state.
//!
//! The flow is meant to be owned by the single task that owns the UI.
//! Background tasks never touch the display; they only send on the channel.
//! A request that is no longer tracked (superseded under
//! `StalePolicy::Discard`, or cancelled) cannot change the label.

pub mod request;

use crate::constants::messages::CANCELLED;
use crate::coord::Coordinate;
use crate::display::{Display, DisplayState, Label};
use crate::error::Result;
use crate::geo::{GeoBackend, GeocodeQuery, ResultType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use request::CompletionSender;
pub use request::{Completion, GeocodeOutcome, RequestHandle, RequestId, StalePolicy};

/// The in-flight annotation: where the latest tap landed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub request: RequestId,
}

/// Single-flight reverse geocoding bound to one label
pub struct GeocodeFlow<B: GeoBackend + 'static, L: Label> {
    backend: Arc<B>,
    result_type: ResultType,
    policy: StalePolicy,
    display: Display<L>,
    marker: Option<Marker>,
    next_id: u64,
    in_flight: BTreeMap<RequestId, RequestHandle>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<B: GeoBackend + 'static, L: Label> GeocodeFlow<B, L> {
    /// Create a flow; the label immediately shows `instructions`
    pub fn new(backend: B, label: L, instructions: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend: Arc::new(backend),
            result_type: ResultType::default(),
            policy: StalePolicy::default(),
            display: Display::new(label, DisplayState::Idle(instructions.into())),
            marker: None,
            next_id: 0,
            in_flight: BTreeMap::new(),
            tx,
            rx,
        }
    }

    /// Set the feature type requested from the geocoder
    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    /// Set how responses to superseded taps are handled
    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> &DisplayState {
        self.display.state()
    }

    /// Current label text
    pub fn text(&self) -> String {
        self.display.text()
    }

    pub fn label(&self) -> &L {
        self.display.label()
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn stale_policy(&self) -> StalePolicy {
        self.policy
    }

    /// Number of lookups whose result may still be shown
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Lookups whose result may still be shown, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &RequestHandle> {
        self.in_flight.values()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Id of the most recent submission
    pub fn latest(&self) -> Option<RequestId> {
        self.next_id.checked_sub(1).map(RequestId)
    }

    /// Start geocoding `coordinate`
    ///
    /// The label shows "Geocoding..." before this returns. Must be called
    /// from within a Tokio runtime.
    pub fn submit(&mut self, coordinate: Coordinate) -> Result<RequestId> {
        coordinate.validate()?;

        let id = RequestId(self.next_id);
        self.next_id += 1;

        if self.policy == StalePolicy::Discard {
            for handle in std::mem::take(&mut self.in_flight).into_values() {
                debug!(
                    request = %handle.id(),
                    coordinate = %handle.coordinate(),
                    "Aborting superseded request"
                );
                handle.abort();
            }
        }

        info!(request = %id, %coordinate, types = %self.result_type, "Submitting geocode request");

        self.display.set(DisplayState::InProgress, Some(id));
        self.marker = Some(Marker {
            coordinate,
            request: id,
        });

        let backend = Arc::clone(&self.backend);
        let sender = CompletionSender::new(self.tx.clone(), id, coordinate);
        let query = GeocodeQuery::new(coordinate, self.result_type);
        let task = tokio::spawn(async move {
            let outcome = GeocodeOutcome::from_result(backend.reverse_geocode(&query).await);
            sender.send(outcome);
        });

        self.in_flight
            .insert(id, RequestHandle::new(id, coordinate, task));
        Ok(id)
    }

    /// Apply a completion to the label
    ///
    /// Returns false, leaving the label alone, when the request is no
    /// longer tracked.
    pub fn apply(&mut self, completion: &Completion) -> bool {
        if self.in_flight.remove(&completion.request).is_none() {
            debug!(request = %completion.request, "Dropping stale response");
            return false;
        }

        debug!(request = %completion.request, outcome = ?completion.outcome, "Request completed");
        self.display
            .set(completion.outcome.display_state(), Some(completion.request));
        true
    }

    /// Wait for the next completion that changes the label and apply it
    ///
    /// Returns None once nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        while !self.in_flight.is_empty() {
            let completion = self.rx.recv().await?;
            if self.apply(&completion) {
                return Some(completion);
            }
        }
        None
    }

    /// Apply every completion that has already arrived, without waiting
    ///
    /// Returns how many changed the label.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if self.apply(&completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply completions until nothing is in flight
    pub async fn settle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    /// Abort every in-flight lookup
    ///
    /// Shows "Cancelled." if anything was running; returns whether it was.
    pub fn cancel(&mut self) -> bool {
        if self.in_flight.is_empty() {
            return false;
        }

        for handle in std::mem::take(&mut self.in_flight).into_values() {
            debug!(
                request = %handle.id(),
                coordinate = %handle.coordinate(),
                "Cancelling request"
            );
            handle.abort();
        }

        info!("Geocoding cancelled");
        self.display.set(DisplayState::Idle(CANCELLED.to_string()), None);
        true
    }
}

impl<B: GeoBackend + 'static, L: Label> Drop for GeocodeFlow<B, L> {
    fn drop(&mut self) {
        for handle in self.in_flight.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemoryLabel;
    use crate::error::Error;
    use crate::geo::nominatim::NominatimBackend;
    use crate::geo::test_support::{dead_url, spawn_server};
    use crate::geo::PlaceFeature;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    type Reply = Result<Vec<PlaceFeature>>;

    /// Backend whose answers the test releases by hand, keyed by coordinate
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
        queries: Mutex<Vec<GeocodeQuery>>,
    }

    impl ScriptedBackend {
        fn reply_later(&self, coordinate: Coordinate) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies.lock().unwrap().insert(coordinate.to_string(), rx);
            tx
        }

        fn queries(&self) -> Vec<GeocodeQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl GeoBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn reverse_geocode(&self, query: &GeocodeQuery) -> Result<Vec<PlaceFeature>> {
            self.queries.lock().unwrap().push(*query);
            let pending = {
                let mut replies = self.replies.lock().unwrap();
                replies.remove(&query.coordinate.to_string())
            };
            match pending {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(Error::Geocoding("reply dropped".into()))),
                None => Ok(Vec::new()),
            }
        }
    }

    /// Backend that crashes on every lookup
    struct PanickingBackend;

    impl GeoBackend for PanickingBackend {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn reverse_geocode(&self, _query: &GeocodeQuery) -> Result<Vec<PlaceFeature>> {
            panic!("geocoder blew up");
        }
    }

    const INSTRUCTIONS: &str = "Tap the map";

    fn flow() -> GeocodeFlow<ScriptedBackend, MemoryLabel> {
        GeocodeFlow::new(ScriptedBackend::default(), MemoryLabel::default(), INSTRUCTIONS)
    }

    fn dupont() -> Coordinate {
        Coordinate::new(38.9096, -77.0434)
    }

    fn capitol() -> Coordinate {
        Coordinate::new(38.8899, -77.0091)
    }

    fn places(names: &[&str]) -> Reply {
        Ok(names.iter().map(|name| PlaceFeature::new(*name)).collect())
    }

    #[test]
    fn test_starts_idle_with_instructions() {
        let flow = flow();
        assert_eq!(flow.state(), &DisplayState::Idle(INSTRUCTIONS.into()));
        assert_eq!(flow.label().text(), INSTRUCTIONS);
        assert!(flow.is_idle());
        assert_eq!(flow.latest(), None);
    }

    #[tokio::test]
    async fn test_in_progress_before_response() {
        let mut flow = flow();
        let _reply = flow.backend().reply_later(dupont());

        let id = flow.submit(dupont()).unwrap();

        assert_eq!(flow.state(), &DisplayState::InProgress);
        assert_eq!(flow.label().text(), "Geocoding...");
        assert_eq!(flow.in_flight(), 1);
        assert_eq!(flow.latest(), Some(id));
        assert_eq!(flow.marker(), Some(&Marker { coordinate: dupont(), request: id }));
    }

    #[tokio::test]
    async fn test_success_shows_first_candidate() {
        let mut flow = flow();
        let reply = flow.backend().reply_later(dupont());
        let id = flow.submit(dupont()).unwrap();

        reply.send(places(&["Dupont Circle", "Washington"])).unwrap();
        let completion = flow.next_completion().await.unwrap();

        assert_eq!(completion.request, id);
        assert_eq!(flow.state(), &DisplayState::Success("Dupont Circle".into()));
        assert_eq!(
            flow.label().history(),
            [INSTRUCTIONS, "Geocoding...", "Dupont Circle"]
        );
        assert!(flow.is_idle());
    }

    #[tokio::test]
    async fn test_empty_result_shows_no_results() {
        let mut flow = flow();
        let reply = flow.backend().reply_later(dupont());
        flow.submit(dupont()).unwrap();

        reply.send(places(&[])).unwrap();
        flow.settle().await;

        assert_eq!(flow.state(), &DisplayState::Idle("No results.".into()));
        assert_eq!(flow.text(), "No results.");
    }

    #[tokio::test]
    async fn test_failure_shows_error() {
        let mut flow = flow();
        let reply = flow.backend().reply_later(dupont());
        flow.submit(dupont()).unwrap();

        reply.send(Err(Error::Geocoding("timed out".into()))).unwrap();
        flow.settle().await;

        assert_eq!(flow.text(), "Error: timed out");
        assert!(flow.is_idle());

        // The flow keeps accepting taps after a failure
        let reply = flow.backend().reply_later(capitol());
        flow.submit(capitol()).unwrap();
        reply.send(places(&["US Capitol"])).unwrap();
        flow.settle().await;
        assert_eq!(flow.text(), "US Capitol");
    }

    #[tokio::test]
    async fn test_query_carries_result_type() {
        let mut flow = flow().with_result_type(ResultType::Address);
        flow.submit(dupont()).unwrap();
        flow.settle().await;

        let queries = flow.backend().queries();
        assert_eq!(queries, vec![GeocodeQuery::new(dupont(), ResultType::Address)]);
    }

    #[tokio::test]
    async fn test_invalid_coordinate_is_rejected() {
        let mut flow = flow();
        assert!(flow.submit(Coordinate::new(120.0, 0.0)).is_err());
        assert_eq!(flow.text(), INSTRUCTIONS);
        assert!(flow.marker().is_none());
    }

    #[tokio::test]
    async fn test_discard_drops_superseded_response() {
        let mut flow = flow();
        let first = flow.backend().reply_later(dupont());
        let second = flow.backend().reply_later(capitol());

        flow.submit(dupont()).unwrap();
        let latest = flow.submit(capitol()).unwrap();
        assert_eq!(flow.in_flight(), 1);
        assert_eq!(flow.marker().unwrap().coordinate, capitol());

        second.send(places(&["US Capitol"])).unwrap();
        let completion = flow.next_completion().await.unwrap();
        assert_eq!(completion.request, latest);

        // The aborted task may or may not have dropped its receiver yet
        let _ = first.send(places(&["Dupont Circle"]));
        assert_eq!(flow.poll_completions(), 0);
        assert!(flow.next_completion().await.is_none());
        assert_eq!(flow.text(), "US Capitol");
    }

    #[tokio::test]
    async fn test_discard_ignores_completion_already_queued() {
        let mut flow = flow();
        let old = flow.submit(dupont()).unwrap();
        flow.submit(capitol()).unwrap();

        let stale = Completion {
            request: old,
            coordinate: dupont(),
            outcome: GeocodeOutcome::Found(PlaceFeature::new("Dupont Circle")),
        };
        assert!(!flow.apply(&stale));
        assert_eq!(flow.state(), &DisplayState::InProgress);
    }

    #[tokio::test]
    async fn test_apply_policy_last_completion_wins() {
        let mut flow = flow().with_stale_policy(StalePolicy::Apply);
        let first = flow.backend().reply_later(dupont());
        let second = flow.backend().reply_later(capitol());

        let first_id = flow.submit(dupont()).unwrap();
        let second_id = flow.submit(capitol()).unwrap();
        assert_eq!(flow.in_flight(), 2);

        second.send(places(&["US Capitol"])).unwrap();
        assert_eq!(flow.next_completion().await.unwrap().request, second_id);
        assert_eq!(flow.text(), "US Capitol");

        first.send(places(&["Dupont Circle"])).unwrap();
        assert_eq!(flow.next_completion().await.unwrap().request, first_id);
        assert_eq!(flow.text(), "Dupont Circle");

        assert_eq!(
            flow.label().history(),
            [INSTRUCTIONS, "Geocoding...", "Geocoding...", "US Capitol", "Dupont Circle"]
        );
    }

    #[tokio::test]
    async fn test_poll_completions() {
        let mut flow = flow();
        let reply = flow.backend().reply_later(dupont());
        flow.submit(dupont()).unwrap();
        assert_eq!(flow.poll_completions(), 0);

        reply.send(places(&["Dupont Circle"])).unwrap();
        let applied = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let applied = flow.poll_completions();
                if applied > 0 {
                    break applied;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(applied, 1);
        assert_eq!(flow.text(), "Dupont Circle");
    }

    #[tokio::test]
    async fn test_cancel() {
        let mut flow = flow();
        assert!(!flow.cancel());

        let reply = flow.backend().reply_later(dupont());
        flow.submit(dupont()).unwrap();
        assert!(flow.cancel());

        assert_eq!(flow.text(), "Cancelled.");
        assert!(flow.is_idle());
        let _ = reply.send(places(&["Dupont Circle"]));
        assert!(flow.next_completion().await.is_none());
        assert_eq!(flow.text(), "Cancelled.");
    }

    #[tokio::test]
    async fn test_crashed_lookup_ends_with_error() {
        let mut flow = GeocodeFlow::new(PanickingBackend, MemoryLabel::default(), INSTRUCTIONS);
        flow.submit(dupont()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), flow.settle())
            .await
            .expect("settle should return once the lookup crashed");

        assert!(flow.is_idle());
        assert_eq!(
            flow.state(),
            &DisplayState::Error("Geocoding task ended without a result".into())
        );
        assert_eq!(flow.text(), "Error: Geocoding task ended without a result");
    }

    #[tokio::test]
    async fn test_pending_tracks_handles() {
        let mut flow = flow().with_stale_policy(StalePolicy::Apply);
        let first = flow.backend().reply_later(dupont());
        let _second = flow.backend().reply_later(capitol());

        let first_id = flow.submit(dupont()).unwrap();
        let second_id = flow.submit(capitol()).unwrap();

        let pending: Vec<(RequestId, Coordinate)> =
            flow.pending().map(|h| (h.id(), h.coordinate())).collect();
        assert_eq!(pending, vec![(first_id, dupont()), (second_id, capitol())]);

        first.send(places(&["Dupont Circle"])).unwrap();
        flow.next_completion().await.unwrap();
        let pending: Vec<RequestId> = flow.pending().map(RequestHandle::id).collect();
        assert_eq!(pending, vec![second_id]);
    }

    #[tokio::test]
    async fn test_next_completion_when_idle() {
        let mut flow = flow();
        assert!(flow.next_completion().await.is_none());
    }

    #[tokio::test]
    async fn test_with_nominatim_server() {
        let base = spawn_server(Router::new().route(
            "/reverse",
            get(|| async {
                Json(serde_json::json!({
                    "lat": "38.9096", "lon": "-77.0434",
                    "display_name": "Dupont Circle, Washington, DC"
                }))
            }),
        ))
        .await;

        let backend = NominatimBackend::new(&base, Duration::from_secs(5)).unwrap();
        let mut flow = GeocodeFlow::new(backend, MemoryLabel::default(), INSTRUCTIONS);
        flow.submit(dupont()).unwrap();
        flow.settle().await;

        assert_eq!(flow.text(), "Dupont Circle, Washington, DC");
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_fatal() {
        let backend = NominatimBackend::new(&dead_url().await, Duration::from_secs(5)).unwrap();
        let mut flow = GeocodeFlow::new(backend, MemoryLabel::default(), INSTRUCTIONS);
        flow.submit(dupont()).unwrap();
        flow.settle().await;

        assert!(
            flow.text().starts_with("Error: Nominatim request failed"),
            "{}",
            flow.text()
        );
    }
}
