use crate::notice::{Notice, NoticeSink};
use crate::record::{Coordinate, NearbyQuery, NearbyResult, RadiusKm};
use crate::token::RequestTokens;
use crate::traits::{LocationSource, SightingsApi};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What became of a `query_nearby` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// No location yet; nothing was sent.
    Rejected,
    /// The response replaced the displayed list.
    Displayed(usize),
    /// The request failed; the previous list is still shown.
    Failed,
    /// A newer query was issued (or the view was torn down) before this
    /// response arrived, so it was dropped.
    Stale,
}

#[derive(Debug, Clone, Default)]
struct GeoState {
    location: Option<Coordinate>,
    radius: Option<RadiusKm>,
    results: Vec<NearbyResult>,
}

/// Location capture and "sightings near me" for one view.
pub struct GeoProximityClient {
    api: Arc<dyn SightingsApi>,
    location_source: Arc<dyn LocationSource>,
    notices: Arc<dyn NoticeSink>,
    tokens: RequestTokens,
    location_requested: AtomicBool,
    state: Mutex<GeoState>,
}

impl GeoProximityClient {
    pub fn new(
        api: Arc<dyn SightingsApi>,
        location_source: Arc<dyn LocationSource>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            api,
            location_source,
            notices,
            tokens: RequestTokens::default(),
            location_requested: AtomicBool::new(false),
            state: Mutex::new(GeoState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, GeoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the location source for a position, once per view.
    ///
    /// Failure is not an error for the user: location only enables the
    /// proximity search, so it is logged and otherwise ignored.
    pub async fn acquire_location(&self) {
        if self.location_requested.swap(true, Ordering::SeqCst) {
            debug!("Location already requested for this view");
            return;
        }

        match self.location_source.current_position().await {
            Ok(coordinate) => {
                if !self.tokens.is_mounted() {
                    return;
                }
                let mut state = self.state();
                if state.location.is_none() {
                    debug!("Acquired location {}", coordinate);
                    state.location = Some(coordinate);
                }
            }
            Err(e) => debug!("Location unavailable: {}", e),
        }
    }

    /// Explicit user choice of search centre; replaces any acquired position
    pub fn select_location(&self, coordinate: Coordinate) {
        self.state().location = Some(coordinate);
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.state().location
    }

    pub fn radius(&self) -> Option<RadiusKm> {
        self.state().radius
    }

    pub fn results(&self) -> Vec<NearbyResult> {
        self.state().results.clone()
    }

    /// Search for sightings within `radius` of the current location.
    ///
    /// The newest call always wins: a response is applied only if no other
    /// query was issued after it.
    pub async fn query_nearby(&self, radius: RadiusKm) -> QueryOutcome {
        let Some(center) = self.location() else {
            self.notices.notify(Notice::info("Please enable location first"));
            return QueryOutcome::Rejected;
        };

        let token = self.tokens.issue();
        let query = NearbyQuery::new(center, radius);
        debug!("Searching {} around {} ({:?})", radius, center, token);
        let response = self.api.nearby(&query).await;

        let (notice, outcome) = {
            let mut state = self.state();
            if !self.tokens.is_current(token) {
                debug!("Dropping stale nearby response for {} ({:?})", radius, token);
                return QueryOutcome::Stale;
            }

            match response {
                Ok(response) => {
                    let count = response.count;
                    state.radius = Some(radius);
                    state.results = response.sightings;
                    info!("{} sightings within {}", count, radius);
                    if count == 0 {
                        (
                            Notice::info(format!("No sightings found within {}", radius)),
                            QueryOutcome::Displayed(0),
                        )
                    } else {
                        (
                            Notice::success(format!("Found {} sightings within {}!", count, radius)),
                            QueryOutcome::Displayed(count),
                        )
                    }
                }
                Err(e) => {
                    warn!("Nearby search failed: {}", e);
                    (
                        Notice::failure("Failed to search nearby sightings"),
                        QueryOutcome::Failed,
                    )
                }
            }
        };

        self.notices.notify(notice);
        outcome
    }

    /// Stop applying responses; called when the owning view goes away
    pub fn teardown(&self) {
        self.tokens.teardown();
    }
}
