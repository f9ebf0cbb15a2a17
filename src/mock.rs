use crate::error::ApiError;
use crate::notice::{Notice, NoticeSink};
use crate::record::{
    AiAnalysis, Categories, Location, NearbyQuery, NearbyResponse, RadiusKm, Rating, RatingCreate,
    Sighting, SightingCreate, SightingFilter, Stats,
};
use crate::traits::SightingsApi;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

type Canned = (Duration, Result<NearbyResponse, u16>);

/// In-memory stand-in for the sightings backend. Counts every call.
#[derive(Default)]
pub struct MockApi {
    calls: AtomicUsize,
    sightings: Mutex<HashMap<String, Sighting>>,
    nearby: Mutex<HashMap<u32, Canned>>,
    nearby_queries: Mutex<Vec<NearbyQuery>>,
    rate_requests: Mutex<Vec<RatingCreate>>,
    reports: Mutex<Vec<SightingCreate>>,
    rate_delay: Mutex<Duration>,
    fail_rate: AtomicBool,
    fail_get: AtomicBool,
    fail_analyze: AtomicBool,
    fail_create: AtomicBool,
}

fn server_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        detail: "mock failure".to_string(),
    }
}

pub fn sample_sighting(id: &str) -> Sighting {
    Sighting {
        id: id.to_string(),
        title: format!("Sighting {}", id),
        description: "Footsteps in an empty corridor".to_string(),
        category: "Ghost/Spirit".to_string(),
        location: Location {
            latitude: 51.5,
            longitude: -0.12,
            address: None,
        },
        ..Sighting::default()
    }
}

fn analysis() -> AiAnalysis {
    AiAnalysis {
        credibility_score: 72,
        analysis_summary: "Consistent witness accounts".to_string(),
        similar_cases: vec!["Enfield, 1977".to_string()],
        suggested_investigation_steps: vec!["Record EVP overnight".to_string()],
        timestamp: Utc::now(),
    }
}

pub fn rating(user_id: &str, score: u8) -> Rating {
    Rating {
        user_id: user_id.to_string(),
        score,
        comment: None,
        timestamp: Utc::now(),
    }
}

impl MockApi {
    pub fn with_sighting(sighting: Sighting) -> Self {
        let api = Self::default();
        api.put_sighting(sighting);
        api
    }

    pub fn put_sighting(&self, sighting: Sighting) {
        self.sightings
            .lock()
            .unwrap()
            .insert(sighting.id.clone(), sighting);
    }

    pub fn set_nearby(&self, radius: RadiusKm, delay: Duration, response: Result<NearbyResponse, u16>) {
        self.nearby.lock().unwrap().insert(radius.km(), (delay, response));
    }

    pub fn set_rate_delay(&self, delay: Duration) {
        *self.rate_delay.lock().unwrap() = delay;
    }

    pub fn fail_rate(&self, fail: bool) {
        self.fail_rate.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_analyze(&self, fail: bool) {
        self.fail_analyze.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn nearby_queries(&self) -> Vec<NearbyQuery> {
        self.nearby_queries.lock().unwrap().clone()
    }

    pub fn rate_requests(&self) -> Vec<RatingCreate> {
        self.rate_requests.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<SightingCreate> {
        self.reports.lock().unwrap().clone()
    }

    fn lookup(&self, id: &str) -> Result<Sighting, ApiError> {
        self.sightings
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| server_error(404))
    }
}

#[async_trait]
impl SightingsApi for MockApi {
    async fn list_sightings(&self, filter: &SightingFilter) -> Result<Vec<Sighting>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut sightings: Vec<Sighting> = self
            .sightings
            .lock()
            .unwrap()
            .values()
            .filter(|s| filter.category.as_ref().is_none_or(|c| &s.category == c))
            .cloned()
            .collect();
        sightings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sightings)
    }

    async fn get_sighting(&self, id: &str) -> Result<Sighting, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(server_error(503));
        }
        self.lookup(id)
    }

    async fn create_sighting(&self, report: &SightingCreate) -> Result<Sighting, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut reports = self.reports.lock().unwrap();
        reports.push(report.clone());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(server_error(500));
        }

        let created = Sighting {
            id: format!("new-{}", reports.len()),
            title: report.title.clone(),
            description: report.description.clone(),
            category: report.category.clone(),
            location: report.location.clone(),
            date_occurred: report.date_occurred,
            witness_count: i64::from(report.witness_count),
            ai_analysis: Some(analysis()),
            ..Sighting::default()
        };
        self.put_sighting(created.clone());
        Ok(created)
    }

    async fn rate_sighting(&self, id: &str, request: &RatingCreate) -> Result<Sighting, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rate_requests.lock().unwrap().push(request.clone());
        let delay = *self.rate_delay.lock().unwrap();
        sleep(delay).await;
        if self.fail_rate.load(Ordering::SeqCst) {
            return Err(server_error(500));
        }

        let mut sightings = self.sightings.lock().unwrap();
        let sighting = sightings.get_mut(id).ok_or_else(|| server_error(404))?;
        sighting.ratings.push(Rating {
            user_id: request.user_id.clone(),
            score: request.score,
            comment: request.comment.clone(),
            timestamp: Utc::now(),
        });
        Ok(sighting.clone())
    }

    async fn nearby(&self, query: &NearbyQuery) -> Result<NearbyResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.nearby_queries.lock().unwrap().push(query.clone());
        let canned = self
            .nearby
            .lock()
            .unwrap()
            .get(&(query.radius_km as u32))
            .cloned();

        match canned {
            Some((delay, response)) => {
                sleep(delay).await;
                response.map_err(server_error)
            }
            None => Ok(NearbyResponse::default()),
        }
    }

    async fn analyze(&self, id: &str) -> Result<Sighting, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_analyze.load(Ordering::SeqCst) {
            return Err(server_error(502));
        }
        let mut sightings = self.sightings.lock().unwrap();
        let sighting = sightings.get_mut(id).ok_or_else(|| server_error(404))?;
        sighting.ai_analysis = Some(analysis());
        Ok(sighting.clone())
    }

    async fn categories(&self) -> Result<Categories, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Categories {
            categories: vec!["Ghost/Spirit".to_string(), "UFO/UAP".to_string()],
            ..Categories::default()
        })
    }

    async fn stats(&self) -> Result<Stats, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let total = self.sightings.lock().unwrap().len() as u64;
        Ok(Stats {
            total_sightings: total,
            ..Stats::default()
        })
    }
}

/// Notice sink that keeps everything it is shown
#[derive(Default)]
pub struct RecordingNotices {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotices {
    pub fn all(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl NoticeSink for RecordingNotices {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
