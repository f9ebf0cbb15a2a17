use crate::error::ScoreError;
use crate::notice::{Notice, NoticeSink};
use crate::record::{Rating, RatingCreate, Sighting};
use crate::session::SessionContext;
use crate::token::RequestTokens;
use crate::traits::SightingsApi;
use log::{debug, info, warn};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const MAX_SCORE: u8 = 5;

/// Mean score of `ratings`; 0.0 when there are none.
pub fn average(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: u32 = ratings.iter().map(|r| u32::from(r.score)).sum();
    f64::from(total) / ratings.len() as f64
}

/// One decimal place, as shown next to the stars
pub fn display_average(average: f64) -> String {
    format!("{:.1}", average)
}

/// Number of filled stars for an average
pub fn star_count(average: f64) -> u8 {
    average.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}

pub fn render_stars(filled: u8) -> String {
    let filled = filled.min(MAX_SCORE);
    let mut stars = "★".repeat(filled as usize);
    stars.push_str(&"☆".repeat((MAX_SCORE - filled) as usize));
    stars
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub count: usize,
    pub average: f64,
    pub display: String,
    pub stars: u8,
}

impl RatingSummary {
    pub fn of(ratings: &[Rating]) -> Self {
        let average = average(ratings);
        Self {
            count: ratings.len(),
            average,
            display: display_average(average),
            stars: star_count(average),
        }
    }
}

impl fmt::Display for RatingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.count == 1 { "rating" } else { "ratings" };
        write!(
            f,
            "{} {} ({} {})",
            render_stars(self.stars),
            self.display,
            self.count,
            noun
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingPhase {
    /// No score chosen (score 0)
    Idle,
    /// A score in 1..=5 is chosen
    Ready,
    /// A submission is in flight
    Submitting,
}

/// The rating input controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingControls {
    pub score: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// Score unset; nothing was sent.
    Rejected,
    /// Another submission is still in flight.
    Busy,
    Failed,
    /// The view was torn down while the request was in flight.
    Discarded,
}

#[derive(Debug)]
struct RatingState {
    phase: RatingPhase,
    controls: RatingControls,
    item: Option<Sighting>,
}

/// Ratings display and submission for one sighting.
///
/// The displayed list only ever comes from the server: after a rating is
/// accepted the whole sighting is fetched again, nothing is appended
/// locally.
pub struct RatingAggregator {
    item_id: String,
    api: Arc<dyn SightingsApi>,
    session: SessionContext,
    notices: Arc<dyn NoticeSink>,
    tokens: RequestTokens,
    state: Mutex<RatingState>,
}

impl RatingAggregator {
    pub fn new(
        item_id: impl Into<String>,
        api: Arc<dyn SightingsApi>,
        session: SessionContext,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            api,
            session,
            notices,
            tokens: RequestTokens::default(),
            state: Mutex::new(RatingState {
                phase: RatingPhase::Idle,
                controls: RatingControls::default(),
                item: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, RatingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> RatingPhase {
        self.state().phase
    }

    pub fn controls(&self) -> RatingControls {
        self.state().controls.clone()
    }

    pub fn item(&self) -> Option<Sighting> {
        self.state().item.clone()
    }

    pub fn ratings(&self) -> Vec<Rating> {
        self.state()
            .item
            .as_ref()
            .map(|item| item.ratings.clone())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> RatingSummary {
        let state = self.state();
        let ratings = state.item.as_ref().map(|item| item.ratings.as_slice()).unwrap_or(&[]);
        RatingSummary::of(ratings)
    }

    /// Pick a score; 0 clears it. Ignored while a submission is in flight.
    pub fn select_score(&self, score: u8) -> Result<RatingPhase, ScoreError> {
        if score > MAX_SCORE {
            return Err(ScoreError::OutOfRange(score));
        }
        let mut state = self.state();
        if state.phase == RatingPhase::Submitting {
            debug!("Ignoring score change while submitting");
            return Ok(state.phase);
        }
        state.controls.score = score;
        state.phase = if score == 0 {
            RatingPhase::Idle
        } else {
            RatingPhase::Ready
        };
        Ok(state.phase)
    }

    pub fn set_comment(&self, comment: impl Into<String>) {
        let mut state = self.state();
        if state.phase != RatingPhase::Submitting {
            state.controls.comment = comment.into();
        }
    }

    /// Fetch the sighting and its ratings. Returns whether the view changed.
    pub async fn refresh(&self) -> bool {
        let token = self.tokens.issue();
        let fetched = self.api.get_sighting(&self.item_id).await;

        let failed = {
            let mut state = self.state();
            if !self.tokens.is_current(token) {
                return false;
            }
            match fetched {
                Ok(item) => {
                    debug!("Loaded {} ratings for {}", item.ratings.len(), self.item_id);
                    state.item = Some(item);
                    false
                }
                Err(e) => {
                    warn!("Could not load sighting {}: {}", self.item_id, e);
                    true
                }
            }
        };

        if failed {
            self.notices.notify(Notice::failure("Failed to load sighting"));
        }
        !failed
    }

    /// Submit the selected score and comment.
    pub async fn submit(&self) -> SubmitOutcome {
        let request = {
            let mut state = self.state();
            let phase = state.phase;
            match phase {
                RatingPhase::Submitting => {
                    debug!("Submission for {} already in flight", self.item_id);
                    return SubmitOutcome::Busy;
                }
                RatingPhase::Idle => None,
                RatingPhase::Ready => {
                    state.phase = RatingPhase::Submitting;
                    // sent as typed; only an untouched comment box is omitted
                    let comment = &state.controls.comment;
                    Some(RatingCreate {
                        user_id: self.session.rating_user_id(),
                        score: state.controls.score,
                        comment: (!comment.is_empty()).then(|| comment.clone()),
                    })
                }
            }
        };
        let Some(request) = request else {
            self.notices.notify(Notice::info("Please select a rating"));
            return SubmitOutcome::Rejected;
        };

        debug!("Rating {} with {} stars", self.item_id, request.score);
        let result = self.api.rate_sighting(&self.item_id, &request).await;

        if !self.tokens.is_mounted() {
            return SubmitOutcome::Discarded;
        }

        {
            let mut state = self.state();
            match &result {
                Ok(_) => {
                    state.phase = RatingPhase::Idle;
                    state.controls = RatingControls::default();
                }
                Err(_) => state.phase = RatingPhase::Ready,
            }
        }

        match result {
            Ok(_) => {
                info!("Rated {} with {} stars", self.item_id, request.score);
                self.notices.notify(Notice::success("Rating submitted!"));
                self.refresh().await;
                SubmitOutcome::Submitted
            }
            Err(e) => {
                warn!("Rating {} failed: {}", self.item_id, e);
                self.notices.notify(Notice::failure("Failed to submit rating"));
                SubmitOutcome::Failed
            }
        }
    }

    pub fn teardown(&self) {
        self.tokens.teardown();
    }
}
